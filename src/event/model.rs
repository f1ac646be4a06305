use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};

pub const LOCAL_FAVORITE_TAG: &str = "local-favorite";
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%dT%H:%M:%S";

#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    PartialOrd,
    Ord,
    Serialize,
    Deserialize,
    strum::Display,
    strum::EnumString,
    strum::IntoStaticStr,
    strum::EnumIter,
)]
#[serde(rename_all = "kebab-case")]
#[strum(serialize_all = "kebab-case")]
pub enum City {
    Miami,
    NewOrleans,
}

impl City {
    pub fn timezone(&self) -> &'static str {
        match self {
            City::Miami => "America/New_York",
            City::NewOrleans => "America/Chicago",
        }
    }

    /// Literal metro name, used as the identity fallback when an event has no place at all.
    pub fn metro_name(&self) -> &'static str {
        match self {
            City::Miami => "Miami",
            City::NewOrleans => "New Orleans",
        }
    }

    /// Venues whose listings are always flagged as editor picks.
    pub fn notable_venues(&self) -> &'static [&'static str] {
        match self {
            City::Miami => &[
                "gramps",
                "the anderson",
                "ball & chain",
                "club space",
                "do not sit on the furniture",
                "las rosas",
                "lagniappe",
                "the citadel",
            ],
            City::NewOrleans => &[
                "tipitina",
                "preservation hall",
                "snug harbor",
                "d.b.a.",
                "maple leaf",
                "spotted cat",
                "blue nile",
                "hi-ho lounge",
            ],
        }
    }
}

#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Default,
    Serialize,
    Deserialize,
    strum::Display,
    strum::EnumString,
    strum::IntoStaticStr,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
pub enum Category {
    Music,
    Nightlife,
    Food,
    Art,
    Culture,
    Comedy,
    Film,
    Wellness,
    Outdoors,
    Sports,
    Community,
    Family,
    #[default]
    Other,
}

/// A candidate listing as produced by one source, before deduplication.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawEvent {
    pub title: String,
    pub start_at: NaiveDateTime,
    pub end_at: Option<NaiveDateTime>,
    pub venue_name: Option<String>,
    pub address: Option<String>,
    pub neighborhood: Option<String>,
    pub lat: Option<f64>,
    pub lng: Option<f64>,
    pub city: City,
    pub tags: Vec<String>,
    pub category: Category,
    pub price_label: Option<String>,
    pub price_amount: Option<f64>,
    pub is_outdoor: bool,
    pub description: String,
    pub source_name: Option<String>,
    pub source_url: Option<String>,
    pub ticket_url: Option<String>,
    pub image: Option<String>,
    pub recurring: bool,
    pub recurrence_pattern: Option<String>,
}

impl RawEvent {
    /// Minimal candidate; sources fill in the rest field by field.
    pub fn new(title: &str, start_at: NaiveDateTime, city: City) -> Self {
        Self {
            title: title.to_string(),
            start_at,
            end_at: None,
            venue_name: None,
            address: None,
            neighborhood: None,
            lat: None,
            lng: None,
            city,
            tags: Vec::new(),
            category: Category::default(),
            price_label: None,
            price_amount: None,
            is_outdoor: false,
            description: String::new(),
            source_name: None,
            source_url: None,
            ticket_url: None,
            image: None,
            recurring: false,
            recurrence_pattern: None,
        }
    }

    pub fn date(&self) -> NaiveDate {
        self.start_at.date()
    }

    pub fn start_at_string(&self) -> String {
        self.start_at.format(TIMESTAMP_FORMAT).to_string()
    }

    /// Scraped `0,0` pairs are as good as missing.
    pub fn has_coordinates(&self) -> bool {
        matches!((self.lat, self.lng), (Some(lat), Some(lng)) if lat != 0.0 && lng != 0.0)
    }

    pub fn venue(&self) -> Option<&str> {
        non_empty(&self.venue_name)
    }

    pub fn neighborhood(&self) -> Option<&str> {
        non_empty(&self.neighborhood)
    }

    pub fn venue_or_neighborhood(&self) -> &str {
        self.venue().or_else(|| self.neighborhood()).unwrap_or("")
    }

    pub fn is_priced(&self) -> bool {
        if let Some(amount) = self.price_amount {
            return amount > 0.0;
        }

        non_empty(&self.price_label)
            .map(|label| !label.eq_ignore_ascii_case("free"))
            .unwrap_or(false)
    }
}

pub(crate) fn non_empty(value: &Option<String>) -> Option<&str> {
    value
        .as_deref()
        .map(str::trim)
        .filter(|value| !value.is_empty())
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EventSource {
    pub name: String,
    pub url: Option<String>,
}

/// Canonical event as published in the snapshot files.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IRLEvent {
    pub id: String,
    pub title: String,
    pub start_at: NaiveDateTime,
    pub end_at: Option<NaiveDateTime>,
    pub timezone: String,
    pub city: City,
    pub venue_id: Option<String>,
    pub venue_name: Option<String>,
    pub address: Option<String>,
    pub neighborhood: Option<String>,
    pub lat: Option<f64>,
    pub lng: Option<f64>,
    pub category: Category,
    pub tags: Vec<String>,
    pub price_label: Option<String>,
    pub price_amount: Option<f64>,
    pub is_outdoor: bool,
    pub description: String,
    pub short_why: String,
    pub editorial_why: String,
    pub editor_pick: bool,
    pub series_id: Option<String>,
    pub series_name: Option<String>,
    pub recurring: bool,
    pub recurrence_pattern: Option<String>,
    pub ticket_url: Option<String>,
    pub image: Option<String>,
    pub source: Option<EventSource>,
}
