use super::html::HtmlListing;
use super::recurring::RecurringSource;
use super::static_list::StaticList;
use crate::event::model::RawEvent;
use chrono::NaiveDate;
use serde::Deserialize;
use std::io;
use std::path::Path;
use thiserror::Error;
use tracing::{info, warn};

#[derive(Debug, Error)]
pub enum SourceError {
    #[error("Request failed: {0}")]
    Request(#[from] reqwest_middleware::Error),
    #[error("Failed reading response: {0}")]
    Response(#[from] reqwest::Error),
    #[error("Failed reading file: {0}")]
    Io(#[from] io::Error),
    #[error("Invalid JSON: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("Invalid selector '{0}'")]
    Selector(String),
}

/// Registry entry; the `kind` field picks the adapter.
#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum Source {
    Recurring(RecurringSource),
    Html(HtmlListing),
    Static(StaticList),
}

impl Source {
    pub fn name(&self) -> &str {
        match self {
            Source::Recurring(source) => &source.name,
            Source::Html(source) => &source.name,
            Source::Static(source) => &source.name,
        }
    }

    pub async fn fetch(&self, today: NaiveDate) -> Result<Vec<RawEvent>, SourceError> {
        match self {
            Source::Recurring(source) => Ok(source.generate(today)),
            Source::Html(source) => source.fetch().await,
            Source::Static(source) => source.load().await,
        }
    }
}

/// Built-in recurring templates plus whatever the registry file lists.
#[tracing::instrument]
pub async fn load_registry(path: &Path, recurring_weeks: u32) -> Result<Vec<Source>, SourceError> {
    let mut sources: Vec<Source> = RecurringSource::builtin(recurring_weeks)
        .into_iter()
        .map(Source::Recurring)
        .collect();

    match tokio::fs::read_to_string(path).await {
        Ok(json) => {
            let mut configured = serde_json::from_str::<Vec<Source>>(&json)?;
            info!("Loaded {} configured sources", configured.len());
            sources.append(&mut configured);
        }
        Err(err) if err.kind() == io::ErrorKind::NotFound => {
            warn!("No source registry found, using built-in sources only");
        }
        Err(err) => return Err(err.into()),
    }

    Ok(sources)
}
