use crate::canonical::canonicalizer::Canonicalizer;
use crate::config::model::Config;
use crate::dedup::merge::Deduplicator;
use crate::enrichment::cache::{JsonFileCache, KeyValueStore};
use crate::enrichment::editorial::{CachedEditorialWriter, ChatEditorialWriter};
use crate::enrichment::enricher::Enricher;
use crate::enrichment::location::{CachedLocationVerifier, NominatimVerifier};
use crate::event::model::{IRLEvent, RawEvent};
use crate::persistence::delta::{DeltaCounts, DeltaReport, DELTA_FILE};
use crate::persistence::snapshot::{read_snapshot, write_json, write_snapshots, COMBINED_FILE};
use crate::persistence::PersistenceError;
use crate::sources::fetch_all;
use crate::sources::model::{load_registry, SourceError};
use crate::venues::model::{VenueDirectory, VenueError};
use chrono::{Local, Utc};
use std::sync::Arc;
use thiserror::Error;
use tracing::{debug, info, instrument, warn};

const CACHE_VERSION: u32 = 1;
const GEOCODE_CACHE_FILE: &str = "geocode.json";
const EDITORIAL_CACHE_FILE: &str = "editorial.json";
const DEFAULT_EDITORIAL_SEED: u64 = 0;

#[derive(Debug, Error)]
pub enum PipelineError {
    #[error(transparent)]
    Venues(#[from] VenueError),
    #[error(transparent)]
    Sources(#[from] SourceError),
    #[error(transparent)]
    Persistence(#[from] PersistenceError),
}

#[derive(Debug)]
pub struct RunSummary {
    pub candidates: usize,
    pub events: usize,
    pub delta: DeltaCounts,
}

/// Deduplicates a pooled run and canonicalizes every surviving event.
pub fn build_events(
    candidates: Vec<RawEvent>,
    directory: &VenueDirectory,
    editorial_seed: u64,
) -> Vec<IRLEvent> {
    let merged = Deduplicator::new(directory).merge(candidates);
    let canonicalizer = Canonicalizer::new(directory, editorial_seed);

    merged
        .into_iter()
        .map(|event| canonicalizer.canonicalize(event, None))
        .collect()
}

/// One full batch. Nothing is written until every stage has finished.
#[instrument(skip_all)]
pub async fn run(config: &Config) -> Result<RunSummary, PipelineError> {
    let directory = VenueDirectory::load(&config.venues_path).await?;
    let sources = load_registry(&config.sources_path, config.recurring_weeks).await?;
    let today = Local::now().date_naive();

    let candidates = fetch_all(&sources, today, config.debug_config.event_limit).await;
    let candidate_count = candidates.len();
    info!("Pooled {} candidates from {} sources", candidate_count, sources.len());

    let editorial_seed = config.editorial_seed.unwrap_or(DEFAULT_EDITORIAL_SEED);
    debug!("Editorial seed is {}", editorial_seed);

    let mut events = build_events(candidates, &directory, editorial_seed);
    info!("{} candidates became {} events", candidate_count, events.len());

    if config.debug_config.skip_enrichment {
        warn!("Skipping enrichment");
    } else {
        enrich(config, &directory, &mut events).await;
    }

    let combined_path = config.output_dir.join(COMBINED_FILE);
    let previous = read_snapshot(&combined_path).await?;
    let delta = DeltaReport::compare(&previous, &events, Local::now().naive_local(), Utc::now());

    write_snapshots(&config.output_dir, &events).await?;
    write_json(&config.output_dir.join(DELTA_FILE), &delta).await?;

    info!(
        added = delta.counts.added,
        removed = delta.counts.removed,
        modified = delta.counts.modified,
        "Snapshot written"
    );

    Ok(RunSummary {
        candidates: candidate_count,
        events: events.len(),
        delta: delta.counts,
    })
}

async fn enrich(config: &Config, directory: &VenueDirectory, events: &mut [IRLEvent]) {
    let mut enricher = Enricher::new().with_directory_venues(directory.ids());
    let mut stores: Vec<Arc<dyn KeyValueStore>> = Vec::new();

    if let Some(geocoder) = &config.geocoder {
        let store: Arc<dyn KeyValueStore> = Arc::new(
            JsonFileCache::load(
                &config.cache_dir.join(GEOCODE_CACHE_FILE),
                CACHE_VERSION,
                config.cache_ttl,
            )
            .await,
        );
        let verifier = NominatimVerifier::new(&geocoder.base_url, geocoder.interval);

        enricher = enricher.with_location_verifier(Arc::new(CachedLocationVerifier::new(
            verifier,
            store.clone(),
        )));
        stores.push(store);
    }

    if let Some(llm) = &config.llm {
        let store: Arc<dyn KeyValueStore> = Arc::new(
            JsonFileCache::load(
                &config.cache_dir.join(EDITORIAL_CACHE_FILE),
                CACHE_VERSION,
                config.cache_ttl,
            )
            .await,
        );
        let writer = ChatEditorialWriter::new(&llm.base_url, &llm.model, llm.api_key.clone());

        enricher = enricher.with_editorial_writer(Arc::new(CachedEditorialWriter::new(
            writer,
            store.clone(),
        )));
        stores.push(store);
    }

    if stores.is_empty() {
        info!("No enrichment configured");
        return;
    }

    enricher.enrich(events).await;

    for store in stores {
        if let Err(err) = store.flush().await {
            warn!("Failed flushing enrichment cache: {}", err);
        }
    }
}
