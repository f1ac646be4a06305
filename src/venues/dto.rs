use super::model::VenueEntry;
use crate::event::model::City;
use crate::text::stable_hash;
use serde::Deserialize;
use serde_either::SingleOrVec;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VenueEntryResponse {
    pub id: Option<String>,
    pub name: String,
    #[serde(default)]
    pub aliases: Vec<String>,
    pub address: Option<String>,
    pub neighborhood: Option<String>,
    pub lat: f64,
    pub lng: f64,
    pub vibe_tags: Option<SingleOrVec<String>>,
    pub image: Option<String>,
    pub city: Option<City>,
}

impl VenueEntryResponse {
    pub fn to_model(self) -> VenueEntry {
        let id = self
            .id
            .filter(|id| !id.trim().is_empty())
            .unwrap_or_else(|| stable_hash(&self.name.trim().to_lowercase()));

        VenueEntry {
            id,
            name: self.name.trim().to_string(),
            aliases: self.aliases,
            address: self.address,
            neighborhood: self.neighborhood,
            lat: self.lat,
            lng: self.lng,
            vibe_tags: match self.vibe_tags {
                None => Vec::new(),
                Some(SingleOrVec::Single(tag)) => vec![tag],
                Some(SingleOrVec::Vec(tags)) => tags,
            },
            image: self.image,
            city: self.city,
        }
    }
}
