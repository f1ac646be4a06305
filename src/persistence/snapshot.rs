use super::PersistenceError;
use crate::event::model::{City, IRLEvent};
use serde::Serialize;
use std::io;
use std::path::{Path, PathBuf};
use strum::IntoEnumIterator;
use tracing::{info, instrument};

pub const COMBINED_FILE: &str = "events.json";

pub fn city_file(city: City) -> String {
    format!("events-{}.json", city)
}

/// Missing snapshot means first run: nothing to compare against.
#[instrument]
pub async fn read_snapshot(path: &Path) -> Result<Vec<IRLEvent>, PersistenceError> {
    let json = match tokio::fs::read_to_string(path).await {
        Ok(json) => json,
        Err(err) if err.kind() == io::ErrorKind::NotFound => {
            info!("No previous snapshot");
            return Ok(Vec::new());
        }
        Err(source) => {
            return Err(PersistenceError::Io {
                path: path.to_path_buf(),
                source,
            })
        }
    };

    serde_json::from_str(&json).map_err(|source| PersistenceError::Serialization {
        path: path.to_path_buf(),
        source,
    })
}

/// Writes one file per metro and a combined one, ordered by start then id.
#[instrument(skip(events), fields(events = events.len()))]
pub async fn write_snapshots(
    dir: &Path,
    events: &[IRLEvent],
) -> Result<Vec<PathBuf>, PersistenceError> {
    tokio::fs::create_dir_all(dir)
        .await
        .map_err(|source| PersistenceError::Io {
            path: dir.to_path_buf(),
            source,
        })?;

    let mut ordered: Vec<&IRLEvent> = events.iter().collect();
    ordered.sort_by(|a, b| a.start_at.cmp(&b.start_at).then_with(|| a.id.cmp(&b.id)));

    let mut written = Vec::new();

    for city in City::iter() {
        let city_events: Vec<&IRLEvent> = ordered
            .iter()
            .copied()
            .filter(|event| event.city == city)
            .collect();
        let path = dir.join(city_file(city));

        write_json(&path, &city_events).await?;
        info!("Wrote {} events for {}", city_events.len(), city);
        written.push(path);
    }

    let path = dir.join(COMBINED_FILE);
    write_json(&path, &ordered).await?;
    written.push(path);

    Ok(written)
}

/// Pretty JSON (two-space indent) with a trailing newline, so snapshots diff cleanly.
pub async fn write_json<T: Serialize + ?Sized>(
    path: &Path,
    value: &T,
) -> Result<(), PersistenceError> {
    let mut json =
        serde_json::to_string_pretty(value).map_err(|source| PersistenceError::Serialization {
            path: path.to_path_buf(),
            source,
        })?;
    json.push('\n');

    tokio::fs::write(path, json)
        .await
        .map_err(|source| PersistenceError::Io {
            path: path.to_path_buf(),
            source,
        })
}
