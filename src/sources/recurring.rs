use crate::event::model::{Category, City, RawEvent, LOCAL_FAVORITE_TAG};
use chrono::{Datelike, Days, NaiveDate, NaiveTime, Weekday};
use serde::Deserialize;

const DEFAULT_WEEKS: u32 = 6;

fn default_weeks() -> u32 {
    DEFAULT_WEEKS
}

/// A weekly happening that no site lists reliably, so it is generated instead.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RecurringTemplate {
    pub title: String,
    pub weekday: Weekday,
    pub time: NaiveTime,
    pub duration_minutes: Option<u32>,
    pub venue_name: Option<String>,
    pub address: Option<String>,
    pub neighborhood: Option<String>,
    pub lat: Option<f64>,
    pub lng: Option<f64>,
    #[serde(default)]
    pub category: Category,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub description: String,
    pub price_label: Option<String>,
    pub price_amount: Option<f64>,
    #[serde(default)]
    pub is_outdoor: bool,
    pub source_url: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RecurringSource {
    pub name: String,
    pub city: City,
    #[serde(default = "default_weeks")]
    pub weeks: u32,
    pub templates: Vec<RecurringTemplate>,
}

impl RecurringSource {
    /// Occurrences for `weeks` weeks, starting with the first matching weekday on or after `today`.
    pub fn generate(&self, today: NaiveDate) -> Vec<RawEvent> {
        self.templates
            .iter()
            .flat_map(|template| {
                let first = next_weekday(today, template.weekday);

                (0..self.weeks)
                    .filter_map(move |week| first.checked_add_days(Days::new(7 * u64::from(week))))
                    .map(move |date| self.occurrence(template, date))
            })
            .collect()
    }

    fn occurrence(&self, template: &RecurringTemplate, date: NaiveDate) -> RawEvent {
        let start_at = date.and_time(template.time);
        let mut event = RawEvent::new(&template.title, start_at, self.city);

        event.end_at = template
            .duration_minutes
            .map(|minutes| start_at + chrono::Duration::minutes(i64::from(minutes)));
        event.venue_name = template.venue_name.clone();
        event.address = template.address.clone();
        event.neighborhood = template.neighborhood.clone();
        event.lat = template.lat;
        event.lng = template.lng;
        event.category = template.category;
        event.tags = template.tags.clone();
        event.description = template.description.clone();
        event.price_label = template.price_label.clone();
        event.price_amount = template.price_amount;
        event.is_outdoor = template.is_outdoor;
        event.source_name = Some(self.name.clone());
        event.source_url = template.source_url.clone();
        event.recurring = true;
        event.recurrence_pattern = Some(format!("Every {}", weekday_name(template.weekday)));

        event
    }

    pub fn builtin(weeks: u32) -> Vec<RecurringSource> {
        vec![
            RecurringSource {
                name: "recurring-miami".to_string(),
                city: City::Miami,
                weeks,
                templates: vec![
                    template(
                        "Sunset Yoga",
                        Weekday::Sun,
                        (18, 0),
                        ("South Pointe Park", "South Beach"),
                        (25.7684, -80.1340),
                        Category::Wellness,
                        &["yoga", "sunset", "free"],
                        "Free community yoga on the lawn by the pier. Bring a mat.",
                        true,
                    ),
                    template(
                        "Pinball & Pints",
                        Weekday::Tue,
                        (20, 0),
                        ("Gramps", "Wynwood"),
                        (25.8018, -80.1990),
                        Category::Nightlife,
                        &["games", "bar", LOCAL_FAVORITE_TAG],
                        "Free-play pinball night in the back room.",
                        false,
                    ),
                    template(
                        "Live Salsa Night",
                        Weekday::Fri,
                        (21, 0),
                        ("Ball & Chain", "Little Havana"),
                        (25.7655, -80.2190),
                        Category::Music,
                        &["salsa", "dancing", "live-music"],
                        "House band and a packed dance floor on Calle Ocho.",
                        false,
                    ),
                ],
            },
            RecurringSource {
                name: "recurring-new-orleans".to_string(),
                city: City::NewOrleans,
                weeks,
                templates: vec![
                    template(
                        "Rebirth Brass Band",
                        Weekday::Tue,
                        (23, 0),
                        ("Maple Leaf Bar", "Carrollton"),
                        (29.9410, -90.1309),
                        Category::Music,
                        &["brass", "live-music", LOCAL_FAVORITE_TAG],
                        "The Tuesday night institution.",
                        false,
                    ),
                    template(
                        "Frenchmen Art Market",
                        Weekday::Sat,
                        (19, 0),
                        ("Frenchmen Art Market", "Marigny"),
                        (29.9636, -90.0577),
                        Category::Art,
                        &["market", "local-artists"],
                        "Night market of local makers between the music clubs.",
                        true,
                    ),
                ],
            },
        ]
    }
}

#[allow(clippy::too_many_arguments)]
fn template(
    title: &str,
    weekday: Weekday,
    (hour, minute): (u32, u32),
    (venue, neighborhood): (&str, &str),
    (lat, lng): (f64, f64),
    category: Category,
    tags: &[&str],
    description: &str,
    is_outdoor: bool,
) -> RecurringTemplate {
    RecurringTemplate {
        title: title.to_string(),
        weekday,
        time: NaiveTime::from_hms_opt(hour, minute, 0).unwrap_or(NaiveTime::MIN),
        duration_minutes: None,
        venue_name: Some(venue.to_string()),
        address: None,
        neighborhood: Some(neighborhood.to_string()),
        lat: Some(lat),
        lng: Some(lng),
        category,
        tags: tags.iter().map(|tag| tag.to_string()).collect(),
        description: description.to_string(),
        price_label: None,
        price_amount: None,
        is_outdoor,
        source_url: None,
    }
}

fn next_weekday(from: NaiveDate, weekday: Weekday) -> NaiveDate {
    let offset = (7 + weekday.num_days_from_monday() - from.weekday().num_days_from_monday()) % 7;

    from + Days::new(u64::from(offset))
}

fn weekday_name(weekday: Weekday) -> &'static str {
    match weekday {
        Weekday::Mon => "Monday",
        Weekday::Tue => "Tuesday",
        Weekday::Wed => "Wednesday",
        Weekday::Thu => "Thursday",
        Weekday::Fri => "Friday",
        Weekday::Sat => "Saturday",
        Weekday::Sun => "Sunday",
    }
}
