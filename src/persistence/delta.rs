use crate::event::model::IRLEvent;
use chrono::{DateTime, NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

pub const DELTA_FILE: &str = "delta.json";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeltaCounts {
    pub previous: usize,
    pub current: usize,
    pub added: usize,
    pub removed: usize,
    pub modified: usize,
    pub expired: usize,
}

/// What changed between two snapshots, by event id.
///
/// Past events dropping out of the feed are counted as expired, not removed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeltaReport {
    pub generated_at: DateTime<Utc>,
    pub added: Vec<String>,
    pub removed: Vec<String>,
    pub modified: Vec<String>,
    pub counts: DeltaCounts,
}

impl DeltaReport {
    /// `now` is the metro-local wall clock the start times are compared against.
    pub fn compare(
        previous: &[IRLEvent],
        current: &[IRLEvent],
        now: NaiveDateTime,
        generated_at: DateTime<Utc>,
    ) -> Self {
        let previous_by_id: BTreeMap<&str, &IRLEvent> =
            previous.iter().map(|event| (event.id.as_str(), event)).collect();
        let current_by_id: BTreeMap<&str, &IRLEvent> =
            current.iter().map(|event| (event.id.as_str(), event)).collect();

        let added: Vec<String> = current_by_id
            .keys()
            .filter(|id| !previous_by_id.contains_key(*id))
            .map(|id| id.to_string())
            .collect();

        let (removed, expired): (Vec<&IRLEvent>, Vec<&IRLEvent>) = previous_by_id
            .iter()
            .filter(|(id, _)| !current_by_id.contains_key(*id))
            .map(|(_, event)| *event)
            .partition(|event| event.start_at > now);

        let modified: Vec<String> = current_by_id
            .iter()
            .filter(|(id, event)| {
                previous_by_id
                    .get(*id)
                    .map_or(false, |before| before != *event)
            })
            .map(|(id, _)| id.to_string())
            .collect();

        let removed: Vec<String> = removed.iter().map(|event| event.id.clone()).collect();

        Self {
            generated_at,
            counts: DeltaCounts {
                previous: previous_by_id.len(),
                current: current_by_id.len(),
                added: added.len(),
                removed: removed.len(),
                modified: modified.len(),
                expired: expired.len(),
            },
            added,
            removed,
            modified,
        }
    }
}
