use crate::event::model::RawEvent;
use crate::text::{normalize, stable_hash};
use crate::venues::model::VenueDirectory;
use itertools::Itertools;
use lazy_static::lazy_static;
use regex::Regex;
use std::collections::BTreeSet;

pub const STRONG_TITLE_SIMILARITY: f64 = 0.7;
pub const VENUE_TITLE_SIMILARITY: f64 = 0.3;
const MIN_ARTIST_LENGTH: usize = 5;
const MIN_WORD_LENGTH: usize = 3;

const STOP_WORDS: [&str; 5] = ["the", "at", "and", "for", "with"];
const BILLING_WORDS: [&str; 4] = ["presents", "featuring", "feat", "live"];

lazy_static! {
    static ref VENUE_CLAUSE: Regex =
        Regex::new(r"(?i)^(.*\S)(?:\s+(?:at|presents)\s+|\s*@\s*)\S.*$")
            .expect("Failed to create venue clause regex");
    static ref TRAILING_LIVE: Regex =
        Regex::new(r"(?i)\s+live$").expect("Failed to create trailing live regex");
}

/// Significant words of a title: lowercase, no punctuation, no short or stop words.
pub fn significant_words(title: &str, extra_stop_words: &[&str]) -> BTreeSet<String> {
    normalize(title)
        .split_whitespace()
        .filter(|word| word.chars().count() >= MIN_WORD_LENGTH)
        .filter(|word| !STOP_WORDS.contains(word) && !extra_stop_words.contains(word))
        .map(str::to_string)
        .collect()
}

/// Jaccard index over significant words, ignoring billing words such as "presents" or "live".
pub fn title_similarity(a: &str, b: &str) -> f64 {
    let a = significant_words(a, &BILLING_WORDS);
    let b = significant_words(b, &BILLING_WORDS);

    if a.is_empty() || b.is_empty() {
        return 0.0;
    }

    let intersection = a.intersection(&b).count();
    let union = a.union(&b).count();

    intersection as f64 / union as f64
}

pub fn normalize_venue(name: &str) -> String {
    normalize(name)
}

/// Exact-match identity: same significant words, same calendar day, same place.
pub fn identity_key(event: &RawEvent) -> String {
    let words = significant_words(&event.title, &[]).into_iter().join(" ");
    let place = event
        .venue()
        .or_else(|| event.neighborhood())
        .map(normalize_venue)
        .filter(|place| !place.is_empty())
        .unwrap_or_else(|| event.city.metro_name().to_lowercase());

    stable_hash(&format!("{}|{}|{}", words, event.date(), place))
}

/// Loose venue equivalence; containment deliberately accepts abbreviated names.
pub fn venues_equivalent(a: &RawEvent, b: &RawEvent, directory: &VenueDirectory) -> bool {
    let (Some(venue_a), Some(venue_b)) = (a.venue(), b.venue()) else {
        return false;
    };

    let venue_a = venue_a.to_lowercase();
    let venue_b = venue_b.to_lowercase();

    if venue_a == venue_b || venue_a.contains(&venue_b) || venue_b.contains(&venue_a) {
        return true;
    }

    match (
        directory.resolve(&venue_a, a.city),
        directory.resolve(&venue_b, b.city),
    ) {
        (Some(resolved_a), Some(resolved_b)) => resolved_a.id == resolved_b.id,
        _ => false,
    }
}

/// Title with its last "at/@/live at/presents ..." clause removed, normalized.
pub fn extract_artist(title: &str) -> String {
    let Some(captures) = VENUE_CLAUSE.captures(title) else {
        return normalize(title);
    };
    let artist = captures.get(1).map_or(title, |artist| artist.as_str());

    normalize(&TRAILING_LIVE.replace(artist, ""))
}

fn same_neighborhood(a: &RawEvent, b: &RawEvent) -> bool {
    match (a.neighborhood(), b.neighborhood()) {
        (Some(a), Some(b)) => a == b,
        _ => false,
    }
}

fn artists_match(a: &RawEvent, b: &RawEvent) -> bool {
    let artist_a = extract_artist(&a.title);
    let artist_b = extract_artist(&b.title);

    if artist_a.chars().count() <= MIN_ARTIST_LENGTH || artist_b.chars().count() <= MIN_ARTIST_LENGTH {
        return false;
    }

    artist_a == artist_b || artist_a.contains(&artist_b) || artist_b.contains(&artist_a)
}

/// Whether two candidates describe the same real-world occurrence.
///
/// Candidates on different calendar days are never duplicates.
pub fn are_duplicates(a: &RawEvent, b: &RawEvent, directory: &VenueDirectory) -> bool {
    if a.date() != b.date() {
        return false;
    }

    let similarity = title_similarity(&a.title, &b.title);

    if similarity >= STRONG_TITLE_SIMILARITY {
        return true;
    }

    let same_venue = venues_equivalent(a, b, directory);

    if same_venue && similarity >= VENUE_TITLE_SIMILARITY {
        return true;
    }

    if same_venue && a.start_at == b.start_at {
        return true;
    }

    (same_venue || same_neighborhood(a, b)) && artists_match(a, b)
}
