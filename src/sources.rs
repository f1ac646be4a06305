//! Source adapters. Each one turns a listing into candidate events and holds no state between runs.

pub mod html;
pub mod model;
pub mod recurring;
pub mod static_list;

use crate::event::model::RawEvent;
use chrono::NaiveDate;
use futures::future;
use model::Source;
use tracing::{error, info};

/// Runs every source concurrently and pools the candidates; a failing source contributes nothing.
#[tracing::instrument(skip(sources), fields(sources = sources.len()))]
pub async fn fetch_all(sources: &[Source], today: NaiveDate, limit: Option<usize>) -> Vec<RawEvent> {
    let results = future::join_all(sources.iter().map(|source| source.fetch(today))).await;

    let mut candidates = Vec::new();

    for (source, result) in sources.iter().zip(results) {
        match result {
            Ok(mut events) => {
                if let Some(limit) = limit {
                    events.truncate(limit);
                }
                info!("Source '{}' produced {} candidates", source.name(), events.len());
                candidates.append(&mut events);
            }
            Err(err) => {
                error!("Source '{}' failed: {}", source.name(), err);
            }
        }
    }

    candidates
}
