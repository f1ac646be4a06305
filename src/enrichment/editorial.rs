use super::cache::KeyValueStore;
use super::model::EnrichmentError;
use crate::canonical::editorial::EditorialCopy;
use crate::event::model::IRLEvent;
use crate::http::REST_CLIENT;
use async_trait::async_trait;
use lazy_static::lazy_static;
use regex::Regex;
use serde::Serialize;
use serde_json::{json, Value};
use std::sync::Arc;
use tracing::{debug, instrument};

const SYSTEM_PROMPT: &str = "You write copy for a local events guide. \
Answer only with a JSON object with two string fields: \
\"shortWhy\" (one punchy sentence, at most 12 words) and \
\"editorialWhy\" (two or three sentences on why this event is worth going to). \
Do not invent facts that are not in the listing.";

lazy_static! {
    static ref CODE_FENCE: Regex =
        Regex::new(r"(?s)^\s*```(?:json)?\s*(.*?)\s*```\s*$").expect("Failed to create code fence regex");
}

#[async_trait]
pub trait EditorialWriter: Send + Sync {
    async fn write(&self, event: &IRLEvent) -> Result<EditorialCopy, EnrichmentError>;
}

#[derive(Debug, Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: String,
}

/// Editorial copy from any OpenAI-compatible chat completions endpoint.
pub struct ChatEditorialWriter {
    base_url: String,
    model: String,
    api_key: Option<String>,
}

impl ChatEditorialWriter {
    pub fn new(base_url: &str, model: &str, api_key: Option<String>) -> Self {
        Self {
            base_url: base_url.to_string(),
            model: model.to_string(),
            api_key,
        }
    }

    fn endpoint(&self) -> String {
        let base = self.base_url.trim_end_matches('/');

        if base.ends_with("/chat/completions") {
            base.to_string()
        } else if base.ends_with("/v1") {
            format!("{}/chat/completions", base)
        } else {
            format!("{}/v1/chat/completions", base)
        }
    }

    fn listing(event: &IRLEvent) -> String {
        let mut lines = vec![
            format!("Title: {}", event.title),
            format!("Category: {}", event.category),
            format!("When: {}", event.start_at.format("%A %B %-d, %-I:%M %p")),
        ];

        if let Some(venue) = &event.venue_name {
            lines.push(format!("Venue: {}", venue));
        }
        if let Some(neighborhood) = &event.neighborhood {
            lines.push(format!("Neighborhood: {}", neighborhood));
        }
        if let Some(price) = &event.price_label {
            lines.push(format!("Price: {}", price));
        }
        if !event.description.is_empty() {
            lines.push(format!("Description: {}", event.description));
        }

        lines.join("\n")
    }
}

#[async_trait]
impl EditorialWriter for ChatEditorialWriter {
    #[instrument(skip_all, fields(title = %event.title))]
    async fn write(&self, event: &IRLEvent) -> Result<EditorialCopy, EnrichmentError> {
        let messages = vec![
            ChatMessage {
                role: "system",
                content: SYSTEM_PROMPT.to_string(),
            },
            ChatMessage {
                role: "user",
                content: Self::listing(event),
            },
        ];
        let body = json!({
            "model": self.model,
            "messages": messages,
            "temperature": 0.7,
            "max_tokens": 300,
        });

        let mut request = REST_CLIENT
            .post(self.endpoint())
            .header("Content-Type", "application/json")
            .body(body.to_string());

        if let Some(key) = &self.api_key {
            request = request.header("Authorization", format!("Bearer {}", key));
        }

        let json_response = request.send().await?.error_for_status()?.text().await?;
        let response = serde_json::from_str::<Value>(&json_response)?;
        let content = response["choices"]
            .get(0)
            .and_then(|choice| choice["message"]["content"].as_str())
            .ok_or_else(|| EnrichmentError::InvalidResponse("No completion content".to_string()))?;

        debug!("Got editorial copy");

        parse_copy(content)
    }
}

/// Models like to wrap JSON in markdown fences; accept both.
fn parse_copy(content: &str) -> Result<EditorialCopy, EnrichmentError> {
    let unfenced = CODE_FENCE
        .captures(content)
        .and_then(|captures| captures.get(1))
        .map(|inner| inner.as_str())
        .unwrap_or(content);

    let copy = serde_json::from_str::<EditorialCopy>(unfenced.trim())?;

    if copy.short_why.trim().is_empty() || copy.editorial_why.trim().is_empty() {
        return Err(EnrichmentError::InvalidResponse(
            "Empty editorial copy".to_string(),
        ));
    }

    Ok(copy)
}

/// Writes copy once per (title, category, venue); later occurrences reuse it.
pub struct CachedEditorialWriter<W> {
    inner: W,
    store: Arc<dyn KeyValueStore>,
}

impl<W: EditorialWriter> CachedEditorialWriter<W> {
    pub fn new(inner: W, store: Arc<dyn KeyValueStore>) -> Self {
        Self { inner, store }
    }

    pub fn cache_key(event: &IRLEvent) -> String {
        format!(
            "{}|{}|{}",
            event.title.trim().to_lowercase(),
            event.category,
            event.venue_name.as_deref().unwrap_or_default().trim().to_lowercase()
        )
    }
}

#[async_trait]
impl<W: EditorialWriter> EditorialWriter for CachedEditorialWriter<W> {
    async fn write(&self, event: &IRLEvent) -> Result<EditorialCopy, EnrichmentError> {
        let key = Self::cache_key(event);

        if let Some(copy) = self
            .store
            .get(&key)
            .and_then(|value| serde_json::from_value::<EditorialCopy>(value).ok())
        {
            return Ok(copy);
        }

        let copy = self.inner.write(event).await?;
        self.store.set(&key, serde_json::to_value(&copy)?);

        Ok(copy)
    }
}
