use super::model::SourceError;
use crate::event::dto::RawEventRecord;
use crate::event::model::{Category, City, RawEvent};
use crate::http::REST_CLIENT;
use reqwest::Url;
use scraper::{ElementRef, Html, Selector};
use serde::Deserialize;
use tracing::{debug, info};

/// A calendar page scraped with CSS selectors.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HtmlListing {
    pub name: String,
    pub city: City,
    pub url: String,
    pub item_selector: String,
    pub title_selector: String,
    pub date_selector: String,
    /// Attribute holding a machine-readable date, e.g. `datetime` on `<time>`; text otherwise.
    pub date_attribute: Option<String>,
    pub venue_selector: Option<String>,
    pub description_selector: Option<String>,
    pub link_selector: Option<String>,
    pub image_selector: Option<String>,
    pub category: Option<Category>,
    /// For single-venue calendars that never print their own name.
    pub default_venue: Option<String>,
    pub neighborhood: Option<String>,
}

impl HtmlListing {
    #[tracing::instrument(skip(self), fields(source = %self.name))]
    pub async fn fetch(&self) -> Result<Vec<RawEvent>, SourceError> {
        let page_html = REST_CLIENT
            .get(&self.url)
            .send()
            .await?
            .error_for_status()?
            .text()
            .await?;

        let records = self.parse(&page_html)?;

        info!("Scraped {} listings", records.len());

        Ok(records
            .into_iter()
            .filter_map(|record| record.to_model(self.city, &self.name))
            .collect())
    }

    pub fn parse(&self, page_html: &str) -> Result<Vec<RawEventRecord>, SourceError> {
        let document = Html::parse_document(page_html);
        let item_selector = selector(&self.item_selector)?;
        let title_selector = selector(&self.title_selector)?;
        let date_selector = selector(&self.date_selector)?;
        let venue_selector = optional_selector(&self.venue_selector)?;
        let description_selector = optional_selector(&self.description_selector)?;
        let link_selector = optional_selector(&self.link_selector)?;
        let image_selector = optional_selector(&self.image_selector)?;
        let base_url = Url::parse(&self.url).ok();

        let records = document
            .select(&item_selector)
            .filter_map(|element| {
                let title = first_text(element, &title_selector)?;
                let start_at = match &self.date_attribute {
                    Some(attribute) => element
                        .select(&date_selector)
                        .next()
                        .and_then(|date| date.value().attr(attribute))
                        .map(str::to_string),
                    None => first_text(element, &date_selector),
                };

                let Some(start_at) = start_at else {
                    debug!("Skipping '{}' without a date", title);
                    return None;
                };

                Some(RawEventRecord {
                    title,
                    start_at,
                    venue_name: venue_selector
                        .as_ref()
                        .and_then(|venue| first_text(element, venue))
                        .or_else(|| self.default_venue.clone()),
                    neighborhood: self.neighborhood.clone(),
                    description: description_selector.as_ref().and_then(|description| {
                        element
                            .select(description)
                            .next()
                            .map(|node| voca_rs::strip::strip_tags(&node.inner_html()))
                            .map(|text| collapse_whitespace(&text))
                    }),
                    source_url: link_selector.as_ref().and_then(|link| {
                        first_attr(element, link, "href").map(|href| absolutize(&base_url, &href))
                    }),
                    image: image_selector.as_ref().and_then(|image| {
                        first_attr(element, image, "src").map(|src| absolutize(&base_url, &src))
                    }),
                    category: self.category.map(|category| category.to_string()),
                    ..Default::default()
                })
            })
            .collect();

        Ok(records)
    }
}

fn selector(value: &str) -> Result<Selector, SourceError> {
    Selector::parse(value).map_err(|_| SourceError::Selector(value.to_string()))
}

fn optional_selector(value: &Option<String>) -> Result<Option<Selector>, SourceError> {
    value.as_deref().map(selector).transpose()
}

fn first_text(element: ElementRef, selector: &Selector) -> Option<String> {
    element
        .select(selector)
        .next()
        .map(|node| collapse_whitespace(&node.text().collect::<String>()))
        .filter(|text| !text.is_empty())
}

fn first_attr(element: ElementRef, selector: &Selector, attribute: &str) -> Option<String> {
    element
        .select(selector)
        .next()
        .and_then(|node| node.value().attr(attribute))
        .map(str::to_string)
}

fn absolutize(base_url: &Option<Url>, href: &str) -> String {
    base_url
        .as_ref()
        .and_then(|base| base.join(href).ok())
        .map(|url| url.to_string())
        .unwrap_or_else(|| href.to_string())
}

fn collapse_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}
