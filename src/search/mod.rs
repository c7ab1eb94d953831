//! Free-text place search (geocoding)
//!
//! Unlike tile fetches, search failures are returned to the caller so the
//! host can show them.

pub mod nominatim;

pub use nominatim::NominatimSearch;

use crate::core::geo::LonLat;
use crate::Result;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// A search hit
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Place {
    pub display_name: String,
    pub lon: f64,
    pub lat: f64,
}

impl Place {
    pub fn coordinates(&self) -> LonLat {
        LonLat::new(self.lon, self.lat)
    }
}

/// Resolves a free-text query to an ordered list of places
#[async_trait]
pub trait PlaceSearch: Send + Sync {
    async fn search(&self, query: &str) -> Result<Vec<Place>>;
}

/// The most recent result list, addressable by display name
#[derive(Debug, Clone, Default)]
pub struct PlaceResults {
    places: Vec<Place>,
}

impl PlaceResults {
    pub fn new(places: Vec<Place>) -> Self {
        Self { places }
    }

    /// Replaces the list with a new search's results
    pub fn replace(&mut self, places: Vec<Place>) {
        self.places = places;
    }

    /// Display names in result order
    pub fn names(&self) -> Vec<&str> {
        self.places.iter().map(|place| place.display_name.as_str()).collect()
    }

    pub fn has_place(&self, name: &str) -> bool {
        self.get(name).is_some()
    }

    /// First place with this display name
    pub fn get(&self, name: &str) -> Option<&Place> {
        self.places.iter().find(|place| place.display_name == name)
    }

    pub fn coordinates(&self, name: &str) -> Option<LonLat> {
        self.get(name).map(Place::coordinates)
    }

    pub fn first(&self) -> Option<&Place> {
        self.places.first()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Place> {
        self.places.iter()
    }

    pub fn len(&self) -> usize {
        self.places.len()
    }

    pub fn is_empty(&self) -> bool {
        self.places.is_empty()
    }
}
