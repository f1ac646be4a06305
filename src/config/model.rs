use std::path::PathBuf;
use std::time::Duration;

#[derive(Debug, Clone)]
pub struct Config {
    pub debug_config: DebugConfig,
    pub output_dir: PathBuf,
    pub venues_path: PathBuf,
    pub sources_path: PathBuf,
    pub cache_dir: PathBuf,
    pub cache_ttl: chrono::Duration,
    pub editorial_seed: Option<u64>,
    pub recurring_weeks: u32,
    pub geocoder: Option<GeocoderConfig>,
    pub llm: Option<LlmConfig>,
}

#[derive(Debug, Clone)]
pub struct DebugConfig {
    pub event_limit: Option<usize>,
    pub skip_enrichment: bool,
}

#[derive(Debug, Clone)]
pub struct GeocoderConfig {
    pub base_url: String,
    pub interval: Duration,
}

#[derive(Clone)]
pub struct LlmConfig {
    pub base_url: String,
    pub model: String,
    pub api_key: Option<String>,
}

impl std::fmt::Debug for LlmConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LlmConfig")
            .field("base_url", &self.base_url)
            .field("model", &self.model)
            .field("api_key", &self.api_key.as_ref().map(|_| "<redacted>"))
            .finish()
    }
}
