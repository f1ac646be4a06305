use super::editorial::EditorialWriter;
use super::location::LocationVerifier;
use super::model::LocationQuery;
use crate::event::model::IRLEvent;
use futures::{stream, StreamExt};
use std::collections::HashSet;
use std::sync::Arc;
use tracing::{info, instrument, trace, warn};

const EDITORIAL_CONCURRENCY: usize = 4;

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct EnrichmentSummary {
    pub relocated: usize,
    pub unverified: usize,
    pub copy_written: usize,
    pub failures: usize,
}

/// Applies whichever collaborators are configured; with none it leaves events untouched.
#[derive(Default)]
pub struct Enricher {
    location: Option<Arc<dyn LocationVerifier>>,
    editorial: Option<Arc<dyn EditorialWriter>>,
    /// Venue ids whose coordinates come from the directory and are never overwritten.
    directory_venues: HashSet<String>,
}

impl Enricher {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_location_verifier(mut self, verifier: Arc<dyn LocationVerifier>) -> Self {
        self.location = Some(verifier);
        self
    }

    pub fn with_directory_venues<I, S>(mut self, venue_ids: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.directory_venues = venue_ids.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_editorial_writer(mut self, writer: Arc<dyn EditorialWriter>) -> Self {
        self.editorial = Some(writer);
        self
    }

    #[instrument(skip_all, fields(events = events.len()))]
    pub async fn enrich(&self, events: &mut [IRLEvent]) -> EnrichmentSummary {
        let mut summary = EnrichmentSummary::default();

        if let Some(verifier) = &self.location {
            self.verify_locations(verifier.as_ref(), events, &mut summary)
                .await;
        }

        if let Some(writer) = &self.editorial {
            self.write_copy(writer.as_ref(), events, &mut summary).await;
        }

        info!(
            relocated = summary.relocated,
            unverified = summary.unverified,
            copy_written = summary.copy_written,
            failures = summary.failures,
            "Enrichment finished"
        );

        summary
    }

    async fn verify_locations(
        &self,
        verifier: &dyn LocationVerifier,
        events: &mut [IRLEvent],
        summary: &mut EnrichmentSummary,
    ) {
        for event in events.iter_mut() {
            if event.venue_name.is_none() && event.address.is_none() {
                continue;
            }

            if event
                .venue_id
                .as_ref()
                .is_some_and(|id| self.directory_venues.contains(id))
            {
                trace!("'{}' has directory coordinates", event.title);
                continue;
            }

            let query = LocationQuery {
                venue_name: event.venue_name.clone(),
                address: event.address.clone(),
                lat: event.lat,
                lng: event.lng,
                city: event.city,
            };

            match verifier.verify(&query).await {
                Ok(verdict) if verdict.confidence.is_trusted() => {
                    event.lat = Some(verdict.lat);
                    event.lng = Some(verdict.lng);
                    summary.relocated += 1;
                }
                Ok(verdict) => {
                    info!(
                        "Keeping coordinates of '{}' ({}: {})",
                        event.title, verdict.confidence, verdict.reasoning
                    );
                    summary.unverified += 1;
                }
                Err(err) => {
                    warn!("Location verification failed for '{}': {}", event.title, err);
                    summary.failures += 1;
                }
            }
        }
    }

    async fn write_copy(
        &self,
        writer: &dyn EditorialWriter,
        events: &mut [IRLEvent],
        summary: &mut EnrichmentSummary,
    ) {
        let copies: Vec<_> = stream::iter(events.iter())
            .map(|event| writer.write(event))
            .buffered(EDITORIAL_CONCURRENCY)
            .collect()
            .await;

        for (event, copy) in events.iter_mut().zip(copies) {
            match copy {
                Ok(copy) => {
                    event.short_why = copy.short_why;
                    event.editorial_why = copy.editorial_why;
                    summary.copy_written += 1;
                }
                Err(err) => {
                    warn!("Editorial copy failed for '{}': {}", event.title, err);
                    summary.failures += 1;
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::canonical::canonicalizer::Canonicalizer;
    use crate::canonical::editorial::EditorialCopy;
    use crate::enrichment::cache::{JsonFileCache, KeyValueStore};
    use crate::enrichment::editorial::CachedEditorialWriter;
    use crate::enrichment::model::{Confidence, EnrichmentError, LocationVerdict};
    use crate::event::model::{City, RawEvent, TIMESTAMP_FORMAT};
    use crate::venues::model::VenueDirectory;
    use async_trait::async_trait;
    use chrono::{Duration, NaiveDateTime};
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct FixedVerifier(Confidence);

    #[async_trait]
    impl LocationVerifier for FixedVerifier {
        async fn verify(&self, _: &LocationQuery) -> Result<LocationVerdict, EnrichmentError> {
            Ok(LocationVerdict {
                lat: 29.9,
                lng: -90.1,
                confidence: self.0,
                reasoning: "fixed".to_string(),
            })
        }
    }

    struct FailingVerifier;

    #[async_trait]
    impl LocationVerifier for FailingVerifier {
        async fn verify(&self, _: &LocationQuery) -> Result<LocationVerdict, EnrichmentError> {
            Err(EnrichmentError::InvalidResponse("timeout".to_string()))
        }
    }

    #[derive(Default)]
    struct CountingWriter {
        calls: AtomicUsize,
    }

    #[async_trait]
    impl EditorialWriter for Arc<CountingWriter> {
        async fn write(&self, event: &IRLEvent) -> Result<EditorialCopy, EnrichmentError> {
            self.calls.fetch_add(1, Ordering::SeqCst);

            if event.title.contains("Broken") {
                return Err(EnrichmentError::InvalidResponse("no JSON".to_string()));
            }

            Ok(EditorialCopy {
                short_why: format!("Go to {}.", event.title),
                editorial_why: "Written copy.".to_string(),
            })
        }
    }

    fn events(titles: &[&str]) -> Vec<IRLEvent> {
        let directory = VenueDirectory::default();
        let canonicalizer = Canonicalizer::new(&directory, 5);

        titles
            .iter()
            .map(|title| {
                let mut raw = RawEvent::new(
                    title,
                    NaiveDateTime::parse_from_str("2026-03-05T20:00:00", TIMESTAMP_FORMAT).unwrap(),
                    City::NewOrleans,
                );
                raw.venue_name = Some("Snug Harbor".to_string());
                raw.lat = Some(29.0);
                raw.lng = Some(-90.0);
                canonicalizer.canonicalize(raw, None)
            })
            .collect()
    }

    #[test_log::test(tokio::test)]
    async fn trusted_verdict_should_replace_coordinates() {
        let mut events = events(&["Jazz Night"]);
        let enricher = Enricher::new().with_location_verifier(Arc::new(FixedVerifier(Confidence::High)));

        let summary = enricher.enrich(&mut events).await;

        assert_eq!((events[0].lat, events[0].lng), (Some(29.9), Some(-90.1)));
        assert_eq!(summary.relocated, 1);
    }

    #[test_log::test(tokio::test)]
    async fn unverified_or_failed_lookups_should_keep_coordinates() {
        let mut events = events(&["Jazz Night"]);

        Enricher::new()
            .with_location_verifier(Arc::new(FixedVerifier(Confidence::Unverified)))
            .enrich(&mut events)
            .await;
        let summary = Enricher::new()
            .with_location_verifier(Arc::new(FailingVerifier))
            .enrich(&mut events)
            .await;

        assert_eq!((events[0].lat, events[0].lng), (Some(29.0), Some(-90.0)));
        assert_eq!(summary.failures, 1);
    }

    #[test_log::test(tokio::test)]
    async fn failed_copy_should_keep_template_defaults() {
        let mut events = events(&["Jazz Night", "Broken Listing"]);
        let template_copy = events[1].editorial_why.clone();
        let writer = Arc::new(CountingWriter::default());

        let summary = Enricher::new()
            .with_editorial_writer(Arc::new(writer.clone()))
            .enrich(&mut events)
            .await;

        assert_eq!(events[0].short_why, "Go to Jazz Night.");
        assert_eq!(events[1].editorial_why, template_copy);
        assert_eq!(summary.copy_written, 1);
        assert_eq!(summary.failures, 1);
    }

    #[test_log::test(tokio::test)]
    async fn cached_copy_should_match_fresh_copy_and_skip_the_writer() {
        let dir = tempfile::tempdir().unwrap();
        let store: Arc<dyn KeyValueStore> =
            Arc::new(JsonFileCache::empty(&dir.path().join("editorial.json"), 1, Duration::days(7)));
        let writer = Arc::new(CountingWriter::default());
        let enricher = Enricher::new().with_editorial_writer(Arc::new(CachedEditorialWriter::new(
            writer.clone(),
            store.clone(),
        )));

        let mut cold = events(&["Jazz Night"]);
        enricher.enrich(&mut cold).await;
        let mut warm = events(&["Jazz Night"]);
        enricher.enrich(&mut warm).await;

        assert_eq!(cold, warm);
        assert_eq!(writer.calls.load(Ordering::SeqCst), 1);
    }

    #[test_log::test(tokio::test)]
    async fn directory_venues_should_keep_their_coordinates() {
        let mut events = events(&["Jazz Night"]);
        let venue_id = events[0].venue_id.clone().unwrap();
        let enricher = Enricher::new()
            .with_location_verifier(Arc::new(FixedVerifier(Confidence::Medium)))
            .with_directory_venues([venue_id]);

        let summary = enricher.enrich(&mut events).await;

        assert_eq!((events[0].lat, events[0].lng), (Some(29.0), Some(-90.0)));
        assert_eq!(summary.relocated, 0);
    }
}
