use super::dto::VenueEntryResponse;
use crate::event::model::City;
use crate::text::normalize;
use std::collections::HashMap;
use std::io;
use std::path::Path;
use thiserror::Error;
use tracing::{info, warn};

const MIN_CONTAINMENT_LENGTH: usize = 4;

/// Curated venue, authoritative over whatever sources scraped for it.
#[derive(Debug, Clone, PartialEq)]
pub struct VenueEntry {
    pub id: String,
    pub name: String,
    pub aliases: Vec<String>,
    pub address: Option<String>,
    pub neighborhood: Option<String>,
    pub lat: f64,
    pub lng: f64,
    pub vibe_tags: Vec<String>,
    pub image: Option<String>,
    pub city: Option<City>,
}

#[derive(Debug, Error)]
pub enum VenueError {
    #[error("Failed reading venue directory: {0}")]
    Io(#[from] io::Error),
    #[error("Invalid venue directory: {0}")]
    Parse(#[from] serde_json::Error),
}

#[derive(Debug, Default)]
pub struct VenueDirectory {
    entries: Vec<VenueEntry>,
    index: HashMap<String, Vec<usize>>,
}

impl VenueDirectory {
    pub fn new(entries: Vec<VenueEntry>) -> Self {
        let mut index: HashMap<String, Vec<usize>> = HashMap::new();

        for (position, entry) in entries.iter().enumerate() {
            for name in std::iter::once(&entry.name).chain(entry.aliases.iter()) {
                let key = lookup_key(name);

                if key.is_empty() {
                    continue;
                }

                let positions = index.entry(key).or_default();
                if !positions.contains(&position) {
                    positions.push(position);
                }
            }
        }

        Self { entries, index }
    }

    /// A missing file is an empty directory; a malformed one is an error.
    #[tracing::instrument]
    pub async fn load(path: &Path) -> Result<Self, VenueError> {
        let json = match tokio::fs::read_to_string(path).await {
            Ok(json) => json,
            Err(err) if err.kind() == io::ErrorKind::NotFound => {
                warn!("Venue directory not found, continuing without it");
                return Ok(Self::default());
            }
            Err(err) => return Err(err.into()),
        };

        let entries = serde_json::from_str::<Vec<VenueEntryResponse>>(&json)?
            .into_iter()
            .map(VenueEntryResponse::to_model)
            .collect::<Vec<_>>();

        info!("Loaded {} venues", entries.len());

        Ok(Self::new(entries))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn ids(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|entry| entry.id.as_str())
    }

    /// Case, punctuation and leading-"the" insensitive lookup, falling back to name containment.
    pub fn resolve(&self, name: &str, city: City) -> Option<&VenueEntry> {
        let key = lookup_key(name);

        if key.is_empty() {
            return None;
        }

        if let Some(entry) = self.in_city(self.index.get(&key), city) {
            return Some(entry);
        }

        if key.len() < MIN_CONTAINMENT_LENGTH {
            return None;
        }

        self.index
            .iter()
            .filter(|(candidate, _)| {
                candidate.len() >= MIN_CONTAINMENT_LENGTH
                    && (key.contains(candidate.as_str()) || candidate.contains(key.as_str()))
            })
            .filter_map(|(candidate, positions)| {
                self.in_city(Some(positions), city)
                    .map(|entry| (candidate, entry))
            })
            .max_by(|(a, _), (b, _)| a.len().cmp(&b.len()).then_with(|| b.cmp(a)))
            .map(|(_, entry)| entry)
    }

    fn in_city(&self, positions: Option<&Vec<usize>>, city: City) -> Option<&VenueEntry> {
        positions?
            .iter()
            .map(|&position| &self.entries[position])
            .find(|entry| entry.city.map_or(true, |entry_city| entry_city == city))
    }
}

fn lookup_key(name: &str) -> String {
    let normalized = normalize(name);

    match normalized.strip_prefix("the ") {
        Some(rest) => rest.to_string(),
        None => normalized,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn entry(id: &str, name: &str, aliases: &[&str], city: Option<City>) -> VenueEntry {
        VenueEntry {
            id: id.to_string(),
            name: name.to_string(),
            aliases: aliases.iter().map(|a| a.to_string()).collect(),
            address: Some("1 Main St".to_string()),
            neighborhood: None,
            lat: 25.8,
            lng: -80.2,
            vibe_tags: vec![],
            image: None,
            city,
        }
    }

    fn directory() -> VenueDirectory {
        VenueDirectory::new(vec![
            entry("gramps", "Gramps", &["Gramps Wynwood"], Some(City::Miami)),
            entry("lagniappe", "Lagniappe House", &[], Some(City::Miami)),
            entry("spotted-cat", "The Spotted Cat Music Club", &["Spotted Cat"], Some(City::NewOrleans)),
        ])
    }

    #[test_log::test]
    fn should_resolve_ignoring_case_punctuation_and_article() {
        let directory = directory();

        assert_eq!(directory.resolve("GRAMPS", City::Miami).unwrap().id, "gramps");
        assert_eq!(directory.resolve("the spotted cat!", City::NewOrleans).unwrap().id, "spotted-cat");
    }

    #[test_log::test]
    fn should_resolve_abbreviated_names_by_containment() {
        let directory = directory();

        assert_eq!(directory.resolve("Lagniappe", City::Miami).unwrap().id, "lagniappe");
        assert_eq!(directory.resolve("Gramps (back patio)", City::Miami).unwrap().id, "gramps");
    }

    #[test_log::test]
    fn should_not_resolve_across_cities() {
        assert!(directory().resolve("Gramps", City::NewOrleans).is_none());
    }

    #[test_log::test]
    fn should_not_resolve_short_fragments() {
        assert!(directory().resolve("Cat", City::NewOrleans).is_none());
        assert!(directory().resolve("", City::Miami).is_none());
    }

    #[test_log::test(tokio::test)]
    async fn missing_file_should_load_as_empty_directory() {
        let directory = VenueDirectory::load(Path::new("/definitely/not/here/venues.json"))
            .await
            .unwrap();

        assert!(directory.is_empty());
    }

    #[test_log::test(tokio::test)]
    async fn malformed_file_should_fail_loading() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, "{{ not json").unwrap();

        let result = VenueDirectory::load(file.path()).await;

        assert!(matches!(result, Err(VenueError::Parse(_))));
    }
}
