use super::model::{Category, City, RawEvent};
use chrono::{DateTime, NaiveDate, NaiveDateTime, NaiveTime};
use serde::Deserialize;
use serde_either::SingleOrVec;
use std::str::FromStr;
use tracing::warn;

const LOCAL_FORMATS: [&str; 3] = ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%dT%H:%M", "%Y-%m-%d %H:%M:%S"];

/// Loosely typed candidate as sources hand it over.
///
/// Static lists and scraped pages only agree on a handful of fields, so everything besides
/// the title and the start time is optional here and gets defaulted in [`Self::to_model`].
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct RawEventRecord {
    pub title: String,
    pub start_at: String,
    pub end_at: Option<String>,
    pub venue_name: Option<String>,
    pub address: Option<String>,
    pub neighborhood: Option<String>,
    pub lat: Option<f64>,
    pub lng: Option<f64>,
    pub tags: Option<SingleOrVec<String>>,
    pub category: Option<String>,
    pub price_label: Option<String>,
    pub price_amount: Option<f64>,
    pub is_outdoor: bool,
    pub description: Option<String>,
    pub source_url: Option<String>,
    pub ticket_url: Option<String>,
    pub image: Option<String>,
    pub recurring: bool,
    pub recurrence_pattern: Option<String>,
}

impl RawEventRecord {
    /// Returns `None` for records that must not reach deduplication (no title or no valid date)
    #[tracing::instrument(skip(self), fields(title = %self.title, start_at = %self.start_at))]
    pub fn to_model(self, city: City, source_name: &str) -> Option<RawEvent> {
        let title = self.title.trim();

        if title.is_empty() {
            warn!("Dropping record without title");
            return None;
        }

        let Some(start_at) = parse_local_timestamp(&self.start_at) else {
            warn!("Dropping record with unparseable start");
            return None;
        };

        let mut event = RawEvent::new(title, start_at, city);

        event.end_at = self.end_at.as_deref().and_then(parse_local_timestamp);
        event.venue_name = clean(self.venue_name);
        event.address = clean(self.address);
        event.neighborhood = clean(self.neighborhood);
        event.lat = self.lat;
        event.lng = self.lng;
        event.tags = match self.tags {
            None => Vec::new(),
            Some(SingleOrVec::Single(tag)) => vec![tag],
            Some(SingleOrVec::Vec(tags)) => tags,
        }
        .into_iter()
        .map(|tag| tag.trim().to_lowercase())
        .filter(|tag| !tag.is_empty())
        .fold(Vec::new(), |mut tags, tag| {
            if !tags.contains(&tag) {
                tags.push(tag);
            }
            tags
        });
        event.category = self
            .category
            .as_deref()
            .map(|category| {
                Category::from_str(category.trim()).unwrap_or_else(|_| {
                    warn!("Unknown category '{}', using 'other'", category);
                    Category::Other
                })
            })
            .unwrap_or_default();
        event.price_label = clean(self.price_label);
        event.price_amount = self.price_amount;
        event.is_outdoor = self.is_outdoor;
        event.description = self.description.unwrap_or_default().trim().to_string();
        event.source_name = Some(source_name.to_string());
        event.source_url = clean(self.source_url);
        event.ticket_url = clean(self.ticket_url);
        event.image = clean(self.image);
        event.recurring = self.recurring;
        event.recurrence_pattern = clean(self.recurrence_pattern);

        Some(event)
    }
}

fn clean(value: Option<String>) -> Option<String> {
    value
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty())
}

/// Parses a start/end value keeping the local wall-clock time.
///
/// Offsets are accepted but discarded: listings are always published in the metro's own time.
pub fn parse_local_timestamp(value: &str) -> Option<NaiveDateTime> {
    let value = value.trim();

    if value.is_empty() {
        return None;
    }

    if let Ok(with_offset) = DateTime::parse_from_rfc3339(value) {
        return Some(with_offset.naive_local());
    }

    LOCAL_FORMATS
        .iter()
        .find_map(|format| NaiveDateTime::parse_from_str(value, format).ok())
        .or_else(|| {
            NaiveDate::parse_from_str(value, "%Y-%m-%d")
                .ok()
                .map(|date| date.and_time(NaiveTime::MIN))
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test_log::test]
    fn should_keep_local_time_when_offset_is_present() {
        let parsed = parse_local_timestamp("2026-03-05T20:00:00-06:00").unwrap();

        assert_eq!(parsed.to_string(), "2026-03-05 20:00:00");
    }

    #[test_log::test]
    fn should_accept_dates_without_time() {
        let parsed = parse_local_timestamp("2026-03-05").unwrap();

        assert_eq!(parsed.to_string(), "2026-03-05 00:00:00");
    }

    #[test_log::test]
    fn should_reject_garbage_dates() {
        assert_eq!(parse_local_timestamp("next friday"), None);
        assert_eq!(parse_local_timestamp(""), None);
    }

    #[test_log::test]
    fn should_drop_records_with_invalid_start() {
        let record = RawEventRecord {
            title: "Jazz Night".to_string(),
            start_at: "TBA".to_string(),
            ..Default::default()
        };

        assert!(record.to_model(City::NewOrleans, "static").is_none());
    }

    #[test_log::test]
    fn should_deserialize_record_with_single_tag_and_unknown_category() {
        let record = serde_json::from_str::<RawEventRecord>(
            r##"{
                "title": "  Sunset Yoga ",
                "startAt": "2026-03-08T18:30",
                "venueName": "South Pointe Park",
                "tags": "Outdoors",
                "category": "mindfulness",
                "isOutdoor": true
            }"##,
        )
        .unwrap();

        let event = record.to_model(City::Miami, "instagram").unwrap();

        assert_eq!(event.title, "Sunset Yoga");
        assert_eq!(event.tags, vec!["outdoors".to_string()]);
        assert_eq!(event.category, Category::Other);
        assert_eq!(event.source_name.as_deref(), Some("instagram"));
        assert!(event.is_outdoor);
    }
}
