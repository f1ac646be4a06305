use crate::event::model::{Category, RawEvent};
use rand::seq::SliceRandom;
use rand::Rng;
use serde::{Deserialize, Serialize};

/// Copy shown next to an event; either written by the editorial agent or filled from templates.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EditorialCopy {
    pub short_why: String,
    pub editorial_why: String,
}

pub fn short_why_templates(category: Category) -> &'static [&'static str] {
    match category {
        Category::Music => &[
            "Live sound in a room that loves it.",
            "The kind of set you talk about on the way home.",
            "Good speakers, better crowd.",
        ],
        Category::Nightlife => &[
            "Your late-night plan, sorted.",
            "A dance floor worth staying up for.",
            "Where the night actually happens.",
        ],
        Category::Food => &[
            "Come hungry.",
            "A plate worth crossing town for.",
            "Local flavor, no reservation stress.",
        ],
        Category::Art => &[
            "Fresh work from artists worth knowing.",
            "Slow down and look closer.",
            "An opening with real energy.",
        ],
        Category::Culture => &[
            "A slice of the city's character.",
            "Local tradition, still going strong.",
        ],
        Category::Comedy => &[
            "Guaranteed laughs, low commitment.",
            "Stand-up that earns the two-drink minimum.",
        ],
        Category::Film => &[
            "A screening with a crowd that cares.",
            "Big screen, good company.",
        ],
        Category::Wellness => &[
            "Reset your week.",
            "Move, breathe, feel better.",
        ],
        Category::Outdoors => &[
            "Get outside while the weather's right.",
            "Fresh air and a good view.",
        ],
        Category::Sports => &[
            "Bring your loudest voice.",
            "Game day energy.",
        ],
        Category::Community => &[
            "Meet your neighbors.",
            "Show up for the neighborhood.",
        ],
        Category::Family => &[
            "Fun for every age.",
            "An easy win for the whole crew.",
        ],
        Category::Other => &[
            "Something different this week.",
            "Worth putting on the calendar.",
        ],
    }
}

pub fn pick_short_why<R: Rng>(category: Category, rng: &mut R) -> String {
    short_why_templates(category)
        .choose(rng)
        .copied()
        .unwrap_or("Worth putting on the calendar.")
        .to_string()
}

/// Raw description plus venue and price context sentences.
pub fn default_editorial_why(event: &RawEvent) -> String {
    let mut sentences = Vec::new();

    if !event.description.trim().is_empty() {
        sentences.push(event.description.trim().to_string());
    }

    match (event.venue(), event.neighborhood()) {
        (Some(venue), Some(neighborhood)) => {
            sentences.push(format!("Happening at {} in {}.", venue, neighborhood))
        }
        (Some(venue), None) => sentences.push(format!("Happening at {}.", venue)),
        (None, Some(neighborhood)) => sentences.push(format!("Happening in {}.", neighborhood)),
        (None, None) => {}
    }

    match event.price_label.as_deref() {
        Some(label) if label.eq_ignore_ascii_case("free") => {
            sentences.push("Free to attend.".to_string())
        }
        Some(label) => sentences.push(format!("Tickets: {}.", label.trim_end_matches('.'))),
        None => {}
    }

    sentences.join(" ")
}
