use irlfeed::config::model::{Config, DebugConfig};
use chrono::NaiveDateTime;
use irlfeed::event::model::{City, IRLEvent, RawEvent, TIMESTAMP_FORMAT};
use irlfeed::venues::model::VenueDirectory;
use irlfeed::persistence::delta::DeltaReport;
use irlfeed::pipeline;
use std::fs;
use std::path::Path;

fn config(root: &Path) -> Config {
    Config {
        debug_config: DebugConfig {
            event_limit: None,
            skip_enrichment: true,
        },
        output_dir: root.join("out"),
        venues_path: root.join("venues.json"),
        sources_path: root.join("sources.json"),
        cache_dir: root.join("cache"),
        cache_ttl: chrono::Duration::days(1),
        editorial_seed: Some(3),
        recurring_weeks: 2,
        geocoder: None,
        llm: None,
    }
}

fn write_inputs(root: &Path) {
    fs::write(
        root.join("venues.json"),
        r#"[{"id": "las-rosas", "name": "Las Rosas", "lat": 25.81, "lng": -80.21, "city": "miami"}]"#,
    )
    .unwrap();
    fs::write(
        root.join("listings.json"),
        r#"[
            {"title": "Rooftop Cumbia", "startAt": "2099-11-07T21:00:00", "venueName": "Las Rosas", "lat": 0, "lng": 0},
            {"title": "Rooftop Cumbia!", "startAt": "2099-11-07T21:00:00", "venueName": "las rosas", "description": "Longer copy"},
            {"title": "Broken", "startAt": "whenever"}
        ]"#,
    )
    .unwrap();
    fs::write(
        root.join("sources.json"),
        format!(
            r#"[{{"kind": "static", "name": "instagram", "city": "miami", "path": "{}"}}]"#,
            root.join("listings.json").display()
        ),
    )
    .unwrap();
}

fn read_events(path: &Path) -> Vec<IRLEvent> {
    serde_json::from_str(&fs::read_to_string(path).unwrap()).unwrap()
}

#[test_log::test(tokio::test)]
async fn full_run_should_write_snapshots_and_delta() {
    let dir = tempfile::tempdir().unwrap();
    write_inputs(dir.path());
    let config = config(dir.path());

    let summary = pipeline::run(&config).await.unwrap();

    let combined = read_events(&config.output_dir.join("events.json"));
    let cumbia: Vec<&IRLEvent> = combined.iter().filter(|e| e.title.starts_with("Rooftop")).collect();
    assert_eq!(cumbia.len(), 1);
    assert_eq!(cumbia[0].description, "Longer copy");
    assert_eq!((cumbia[0].lat, cumbia[0].lng), (Some(25.81), Some(-80.21)));
    assert_eq!(summary.events, combined.len());
    assert_eq!(summary.delta.added, combined.len());

    let miami = read_events(&config.output_dir.join("events-miami.json"));
    let new_orleans = read_events(&config.output_dir.join("events-new-orleans.json"));
    assert_eq!(miami.len() + new_orleans.len(), combined.len());
}

#[test_log::test(tokio::test)]
async fn second_run_on_unchanged_input_should_report_no_changes() {
    let dir = tempfile::tempdir().unwrap();
    write_inputs(dir.path());
    let config = config(dir.path());

    pipeline::run(&config).await.unwrap();
    let summary = pipeline::run(&config).await.unwrap();

    let delta: DeltaReport =
        serde_json::from_str(&fs::read_to_string(config.output_dir.join("delta.json")).unwrap()).unwrap();
    assert_eq!(summary.delta.added, 0);
    assert!(delta.added.is_empty());
    assert!(delta.removed.is_empty());
    assert!(delta.modified.is_empty());
}

fn listing(title: &str, start_at: &str, venue: &str) -> RawEvent {
    let mut event = RawEvent::new(
        title,
        NaiveDateTime::parse_from_str(start_at, TIMESTAMP_FORMAT).unwrap(),
        City::Miami,
    );
    event.venue_name = Some(venue.to_string());
    event
}

#[test_log::test]
fn new_listing_should_leave_copy_of_existing_events_unchanged() {
    let directory = VenueDirectory::default();
    let existing = vec![
        listing("Rooftop Cumbia", "2099-11-07T21:00:00", "Las Rosas"),
        listing("Sunset Yoga", "2099-11-08T18:00:00", "South Pointe Park"),
        listing("Open Mic", "2099-11-09T20:00:00", "Corner Bar"),
        listing("Gallery Walk", "2099-11-10T19:00:00", "Wynwood Walls"),
    ];
    let mut with_newcomer = vec![listing("Salsa Social", "2099-11-06T20:00:00", "Ball & Chain")];
    with_newcomer.extend(existing.clone());
    let now = NaiveDateTime::parse_from_str("2099-01-01T00:00:00", TIMESTAMP_FORMAT).unwrap();

    let before = pipeline::build_events(existing, &directory, 1);
    let after = pipeline::build_events(with_newcomer, &directory, 1);
    let delta = DeltaReport::compare(&before, &after, now, chrono::Utc::now());

    assert_eq!(delta.added.len(), 1);
    assert!(delta.modified.is_empty(), "modified: {:?}", delta.modified);
    assert!(delta.removed.is_empty());
}
