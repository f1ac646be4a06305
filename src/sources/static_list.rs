use super::model::SourceError;
use crate::event::dto::RawEventRecord;
use crate::event::model::{City, RawEvent};
use serde::Deserialize;
use std::path::PathBuf;
use tracing::info;

/// Hand-curated list (e.g. transcribed from social media posts) kept as a JSON file.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StaticList {
    pub name: String,
    pub city: City,
    pub path: PathBuf,
}

impl StaticList {
    #[tracing::instrument(skip(self), fields(source = %self.name))]
    pub async fn load(&self) -> Result<Vec<RawEvent>, SourceError> {
        let json = tokio::fs::read_to_string(&self.path).await?;
        let records = serde_json::from_str::<Vec<RawEventRecord>>(&json)?;
        let total = records.len();

        let events: Vec<RawEvent> = records
            .into_iter()
            .filter_map(|record| record.to_model(self.city, &self.name))
            .collect();

        info!("Loaded {} of {} listed events", events.len(), total);

        Ok(events)
    }
}
