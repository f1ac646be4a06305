use crate::config::model::{Config, DebugConfig, GeocoderConfig, LlmConfig};
use std::env;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

const DEFAULT_GEOCODE_INTERVAL_MS: u64 = 1100;
const DEFAULT_CACHE_TTL_DAYS: i64 = 30;
const DEFAULT_RECURRING_WEEKS: u32 = 6;
const DEFAULT_LLM_MODEL: &str = "gpt-4o-mini";

pub fn load_config() -> Config {
    let geocoder = load_optional_string("NOMINATIM_URL").map(|base_url| GeocoderConfig {
        base_url,
        interval: Duration::from_millis(
            load_number_config("GEOCODE_INTERVAL_MS").unwrap_or(DEFAULT_GEOCODE_INTERVAL_MS),
        ),
    });
    let llm = load_optional_string("LLM_BASE_URL").map(|base_url| LlmConfig {
        base_url,
        model: load_optional_string("LLM_MODEL").unwrap_or_else(|| DEFAULT_LLM_MODEL.to_string()),
        api_key: load_optional_string("LLM_API_KEY"),
    });

    Config {
        debug_config: DebugConfig {
            event_limit: load_number_config("DEBUG_EVENT_LIMIT"),
            skip_enrichment: load_bool_config("DEBUG_SKIP_ENRICHMENT", false),
        },
        output_dir: load_path_config("OUTPUT_DIR", "out"),
        venues_path: load_path_config("VENUES_PATH", "data/venues.json"),
        sources_path: load_path_config("SOURCES_PATH", "data/sources.json"),
        cache_dir: load_path_config("CACHE_DIR", ".cache"),
        cache_ttl: chrono::Duration::days(
            load_number_config("CACHE_TTL_DAYS").unwrap_or(DEFAULT_CACHE_TTL_DAYS),
        ),
        editorial_seed: load_number_config("EDITORIAL_SEED"),
        recurring_weeks: load_number_config("RECURRING_WEEKS").unwrap_or(DEFAULT_RECURRING_WEEKS),
        geocoder,
        llm,
    }
}

fn load_optional_string(name: &str) -> Option<String> {
    env::var(name)
        .ok()
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty())
}

fn load_path_config(name: &str, default: &str) -> PathBuf {
    PathBuf::from(load_optional_string(name).unwrap_or_else(|| default.to_string()))
}

fn load_bool_config(name: &str, default: bool) -> bool {
    env::var(name)
        .unwrap_or_else(|_| default.to_string())
        .parse()
        .unwrap_or_else(|_| {
            panic!(
                "Invalid config '{}'. Expected either 'true' or 'false'",
                name
            )
        })
}

fn load_number_config<T: FromStr>(name: &str) -> Option<T> {
    load_optional_string(name).map(|value| {
        value
            .parse()
            .unwrap_or_else(|_| panic!("Invalid config '{}'. Expected a number.", name))
    })
}
