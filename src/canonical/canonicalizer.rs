use super::editorial::{default_editorial_why, pick_short_why, EditorialCopy};
use crate::event::model::{EventSource, IRLEvent, RawEvent, LOCAL_FAVORITE_TAG};
use crate::text::stable_hash;
use crate::venues::model::VenueDirectory;
use rand::rngs::StdRng;
use rand::SeedableRng;
use tracing::trace;

pub const MAX_TAGS_WITH_VIBES: usize = 6;

/// Turns merged candidates into publishable events.
///
/// Template copy is drawn from a generator seeded by the run seed and the event id, so the
/// pick for one event does not depend on which other events are in the run.
pub struct Canonicalizer<'a> {
    directory: &'a VenueDirectory,
    seed: u64,
}

impl<'a> Canonicalizer<'a> {
    pub fn new(directory: &'a VenueDirectory, seed: u64) -> Self {
        Self { directory, seed }
    }

    #[tracing::instrument(skip_all, fields(title = %merged.title))]
    pub fn canonicalize(&self, merged: RawEvent, copy: Option<EditorialCopy>) -> IRLEvent {
        let id = event_id(&merged);
        let series_id = merged.recurring.then(|| series_id(&merged));
        let series_name = merged.recurring.then(|| merged.title.clone());

        let mut event = merged;
        let venue_id = self.resolve_venue(&mut event);

        event.price_label = price_label(&event);

        let ticket_url = event
            .ticket_url
            .clone()
            .or_else(|| event.is_priced().then(|| event.source_url.clone()).flatten());
        let editor_pick = is_editor_pick(&event);
        let copy = copy.unwrap_or_else(|| EditorialCopy {
            short_why: pick_short_why(event.category, &mut copy_rng(self.seed, &id)),
            editorial_why: default_editorial_why(&event),
        });
        let source = event.source_name.clone().map(|name| EventSource {
            name,
            url: event.source_url.clone(),
        });

        IRLEvent {
            id,
            title: event.title,
            start_at: event.start_at,
            end_at: event.end_at,
            timezone: event.city.timezone().to_string(),
            city: event.city,
            venue_id,
            venue_name: event.venue_name,
            address: event.address,
            neighborhood: event.neighborhood,
            lat: event.lat,
            lng: event.lng,
            category: event.category,
            tags: event.tags,
            price_label: event.price_label,
            price_amount: event.price_amount,
            is_outdoor: event.is_outdoor,
            description: event.description,
            short_why: copy.short_why,
            editorial_why: copy.editorial_why,
            editor_pick,
            series_id,
            series_name,
            recurring: event.recurring,
            recurrence_pattern: event.recurrence_pattern,
            ticket_url,
            image: event.image,
            source,
        }
    }

    /// Directory values override scraped ones; returns the venue id if there is a venue at all.
    fn resolve_venue(&self, event: &mut RawEvent) -> Option<String> {
        let venue = event.venue()?.to_string();

        let Some(entry) = self.directory.resolve(&venue, event.city) else {
            trace!("Venue '{}' not in directory", venue);
            return Some(stable_hash(&venue.to_lowercase()));
        };

        trace!("Venue '{}' resolved to '{}'", venue, entry.name);

        event.venue_name = Some(entry.name.clone());
        event.address = entry.address.clone().or(event.address.take());
        event.neighborhood = entry.neighborhood.clone().or(event.neighborhood.take());
        event.lat = Some(entry.lat);
        event.lng = Some(entry.lng);

        if event.image.is_none() {
            event.image = entry.image.clone();
        }

        let room = MAX_TAGS_WITH_VIBES.saturating_sub(event.tags.len());
        let vibes: Vec<String> = entry
            .vibe_tags
            .iter()
            .filter(|tag| !event.tags.contains(*tag))
            .take(room)
            .cloned()
            .collect();
        event.tags.extend(vibes);

        Some(entry.id.clone())
    }
}

fn copy_rng(seed: u64, id: &str) -> StdRng {
    let id_bits = u64::from_str_radix(id, 16).unwrap_or_default();

    StdRng::seed_from_u64(seed ^ id_bits)
}

/// Stable across runs for unchanged title, start and place.
pub fn event_id(event: &RawEvent) -> String {
    stable_hash(&format!(
        "{}|{}|{}",
        event.title,
        event.start_at_string(),
        event.venue_or_neighborhood()
    ))
}

/// Shared by every occurrence of a recurring event, hence no date.
pub fn series_id(event: &RawEvent) -> String {
    stable_hash(&format!("{}|{}", event.title, event.venue_or_neighborhood()))
}

pub fn price_label(event: &RawEvent) -> Option<String> {
    if let Some(label) = event.price_label.as_deref().filter(|l| !l.trim().is_empty()) {
        return Some(label.trim().to_string());
    }

    event.price_amount.map(|amount| {
        if amount <= 0.0 {
            "Free".to_string()
        } else if amount.fract() == 0.0 {
            format!("${:.0}", amount)
        } else {
            format!("${:.2}", amount)
        }
    })
}

fn is_editor_pick(event: &RawEvent) -> bool {
    if event.tags.iter().any(|tag| tag == LOCAL_FAVORITE_TAG) {
        return true;
    }

    let title = event.title.to_lowercase();
    let venue = event.venue().unwrap_or_default().to_lowercase();

    event
        .city
        .notable_venues()
        .iter()
        .any(|notable| title.contains(notable) || venue.contains(notable))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::canonical::editorial::short_why_templates;
    use crate::event::model::{Category, City, TIMESTAMP_FORMAT};
    use crate::venues::model::VenueEntry;
    use chrono::NaiveDateTime;

    fn candidate(title: &str, start_at: &str, venue: Option<&str>) -> RawEvent {
        let mut event = RawEvent::new(
            title,
            NaiveDateTime::parse_from_str(start_at, TIMESTAMP_FORMAT).unwrap(),
            City::Miami,
        );
        event.venue_name = venue.map(str::to_string);
        event
    }

    fn directory() -> VenueDirectory {
        VenueDirectory::new(vec![VenueEntry {
            id: "south-pointe-park".to_string(),
            name: "South Pointe Park".to_string(),
            aliases: vec![],
            address: Some("1 Washington Ave, Miami Beach".to_string()),
            neighborhood: Some("South Beach".to_string()),
            lat: 25.7684,
            lng: -80.1340,
            vibe_tags: vec!["waterfront".to_string(), "sunset".to_string(), "outdoors".to_string()],
            image: Some("https://img.example/south-pointe.jpg".to_string()),
            city: Some(City::Miami),
        }])
    }

    #[test_log::test]
    fn directory_should_override_scraped_coordinates() {
        let directory = directory();
        let mut merged = candidate("Sunset Yoga", "2026-05-03T18:00:00", Some("south pointe park"));
        merged.lat = Some(0.0);
        merged.lng = Some(0.0);
        merged.address = Some("somewhere on the beach".to_string());

        let event = Canonicalizer::new(&directory, 1).canonicalize(merged, None);

        assert_eq!((event.lat, event.lng), (Some(25.7684), Some(-80.1340)));
        assert_eq!(event.venue_name.as_deref(), Some("South Pointe Park"));
        assert_eq!(event.address.as_deref(), Some("1 Washington Ave, Miami Beach"));
        assert_eq!(event.neighborhood.as_deref(), Some("South Beach"));
        assert_eq!(event.venue_id.as_deref(), Some("south-pointe-park"));
        assert_eq!(event.image.as_deref(), Some("https://img.example/south-pointe.jpg"));
    }

    #[test_log::test]
    fn vibe_tags_should_fill_up_to_six_tags() {
        let directory = directory();
        let mut merged = candidate("Sunset Yoga", "2026-05-03T18:00:00", Some("South Pointe Park"));
        merged.tags = ["yoga", "free", "sunset", "beach", "morning"]
            .iter()
            .map(|t| t.to_string())
            .collect();

        let event = Canonicalizer::new(&directory, 1).canonicalize(merged, None);

        assert_eq!(event.tags.len(), 6);
        assert_eq!(event.tags.last().map(String::as_str), Some("waterfront"));
    }

    #[test_log::test]
    fn canonicalizing_twice_should_give_identical_ids() {
        let directory = directory();
        let mut merged = candidate("Sunset Yoga", "2026-05-03T18:00:00", Some("South Pointe Park"));
        merged.recurring = true;

        let first = Canonicalizer::new(&directory, 1).canonicalize(merged.clone(), None);
        let second = Canonicalizer::new(&directory, 99).canonicalize(merged, None);

        assert_eq!(first.id, second.id);
        assert_eq!(first.venue_id, second.venue_id);
        assert_eq!(first.series_id, second.series_id);
        assert!(first.series_id.is_some());
    }

    #[test_log::test]
    fn recurring_occurrences_should_share_series_but_not_id() {
        let directory = directory();
        let canonicalizer = Canonicalizer::new(&directory, 1);
        let mut this_week = candidate("Sunset Yoga", "2026-05-03T18:00:00", Some("South Pointe Park"));
        this_week.recurring = true;
        let mut next_week = this_week.clone();
        next_week.start_at = NaiveDateTime::parse_from_str("2026-05-10T18:00:00", TIMESTAMP_FORMAT).unwrap();

        let first = canonicalizer.canonicalize(this_week, None);
        let second = canonicalizer.canonicalize(next_week, None);

        assert_eq!(first.series_id, second.series_id);
        assert_eq!(first.series_name.as_deref(), Some("Sunset Yoga"));
        assert_ne!(first.id, second.id);
    }

    #[test_log::test]
    fn unknown_venue_should_get_hashed_id() {
        let event = Canonicalizer::new(&VenueDirectory::default(), 1)
            .canonicalize(candidate("Open Mic", "2026-05-03T20:00:00", Some("Corner Bar")), None);

        assert_eq!(event.venue_id, Some(stable_hash("corner bar")));
        assert_eq!(event.series_id, None);
    }

    #[test_log::test]
    fn no_venue_should_mean_no_venue_id() {
        let event = Canonicalizer::new(&VenueDirectory::default(), 1)
            .canonicalize(candidate("Art Walk", "2026-05-03T20:00:00", None), None);

        assert_eq!(event.venue_id, None);
    }

    #[test_log::test]
    fn default_copy_should_come_from_templates_and_given_copy_should_win() {
        let directory = VenueDirectory::default();
        let canonicalizer = Canonicalizer::new(&directory, 3);
        let mut merged = candidate("Open Mic", "2026-05-03T20:00:00", Some("Corner Bar"));
        merged.category = Category::Comedy;

        let templated = canonicalizer.canonicalize(merged.clone(), None);
        let written = canonicalizer.canonicalize(
            merged,
            Some(EditorialCopy {
                short_why: "Sharp new voices.".to_string(),
                editorial_why: "The best open mic in town.".to_string(),
            }),
        );

        assert!(short_why_templates(Category::Comedy).contains(&templated.short_why.as_str()));
        assert_eq!(templated.editorial_why, "Happening at Corner Bar.");
        assert_eq!(written.short_why, "Sharp new voices.");
        assert_eq!(written.editorial_why, "The best open mic in town.");
    }

    #[test_log::test]
    fn editor_pick_should_follow_tag_or_notable_venue() {
        let directory = VenueDirectory::default();
        let canonicalizer = Canonicalizer::new(&directory, 1);
        let mut tagged = candidate("Open Mic", "2026-05-03T20:00:00", Some("Corner Bar"));
        tagged.tags = vec![LOCAL_FAVORITE_TAG.to_string()];

        assert!(canonicalizer.canonicalize(tagged, None).editor_pick);
        assert!(canonicalizer
            .canonicalize(candidate("Pinball Night", "2026-05-03T20:00:00", Some("Gramps")), None)
            .editor_pick);
        assert!(!canonicalizer
            .canonicalize(candidate("Open Mic", "2026-05-03T20:00:00", Some("Corner Bar")), None)
            .editor_pick);
    }

    #[test_log::test]
    fn priced_events_should_fall_back_to_source_url_for_tickets() {
        let directory = VenueDirectory::default();
        let canonicalizer = Canonicalizer::new(&directory, 1);
        let mut priced = candidate("Jazz Night", "2026-05-03T20:00:00", Some("Corner Bar"));
        priced.price_amount = Some(12.5);
        priced.source_url = Some("https://tickets.example/jazz".to_string());
        let mut free = priced.clone();
        free.price_amount = Some(0.0);
        let mut explicit = priced.clone();
        explicit.ticket_url = Some("https://box-office.example".to_string());

        let priced = canonicalizer.canonicalize(priced, None);
        let free = canonicalizer.canonicalize(free, None);
        let explicit = canonicalizer.canonicalize(explicit, None);

        assert_eq!(priced.ticket_url.as_deref(), Some("https://tickets.example/jazz"));
        assert_eq!(priced.price_label.as_deref(), Some("$12.50"));
        assert_eq!(free.ticket_url, None);
        assert_eq!(free.price_label.as_deref(), Some("Free"));
        assert_eq!(explicit.ticket_url.as_deref(), Some("https://box-office.example"));
    }

    #[test_log::test]
    fn source_should_carry_name_and_url() {
        let mut merged = candidate("Jazz Night", "2026-05-03T20:00:00", None);
        merged.source_name = Some("agenda".to_string());
        merged.source_url = Some("https://agenda.example/jazz".to_string());

        let event = Canonicalizer::new(&VenueDirectory::default(), 1).canonicalize(merged, None);

        assert_eq!(event.timezone, "America/New_York");
        assert_eq!(
            event.source,
            Some(EventSource {
                name: "agenda".to_string(),
                url: Some("https://agenda.example/jazz".to_string()),
            })
        );
    }

    #[test_log::test]
    fn template_pick_should_not_depend_on_other_events() {
        let directory = VenueDirectory::default();
        let canonicalizer = Canonicalizer::new(&directory, 3);
        let mut merged = candidate("Open Mic", "2026-05-03T20:00:00", Some("Corner Bar"));
        merged.category = Category::Comedy;

        let alone = canonicalizer.canonicalize(merged.clone(), None);
        for title in ["Late Show", "Improv Jam", "Roast Battle"] {
            let mut other = merged.clone();
            other.title = title.to_string();
            canonicalizer.canonicalize(other, None);
        }
        let after_others = canonicalizer.canonicalize(merged.clone(), None);
        let fresh = Canonicalizer::new(&directory, 3).canonicalize(merged, None);

        assert_eq!(after_others.short_why, alone.short_why);
        assert_eq!(fresh.short_why, alone.short_why);
    }
}
