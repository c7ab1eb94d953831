use super::{Place, PlaceSearch};
use crate::core::config::EngineConfig;
use crate::{MapError, Result};
use async_trait::async_trait;
use serde::Deserialize;
use std::time::Duration;

/// Public OpenStreetMap geocoder
pub const NOMINATIM_ENDPOINT: &str = "https://nominatim.openstreetmap.org/search";

/// Place search against a Nominatim instance
pub struct NominatimSearch {
    client: reqwest::Client,
    endpoint: String,
}

impl NominatimSearch {
    pub fn new(user_agent: &str) -> Result<Self> {
        Self::with_endpoint(NOMINATIM_ENDPOINT, user_agent)
    }

    pub fn with_endpoint(endpoint: impl Into<String>, user_agent: &str) -> Result<Self> {
        let client = reqwest::Client::builder()
            .user_agent(user_agent)
            .timeout(Duration::from_secs(15))
            .build()?;
        Ok(Self {
            client,
            endpoint: endpoint.into(),
        })
    }

    pub fn from_config(config: &EngineConfig) -> Result<Self> {
        Self::new(&config.tiles.user_agent)
    }
}

#[async_trait]
impl PlaceSearch for NominatimSearch {
    async fn search(&self, query: &str) -> Result<Vec<Place>> {
        let query = query.trim();
        if query.is_empty() {
            return Ok(Vec::new());
        }

        log::debug!("searching places for {:?}", query);
        let response = self
            .client
            .get(&self.endpoint)
            .query(&[("format", "json"), ("q", query)])
            .send()
            .await
            .and_then(|response| response.error_for_status())
            .map_err(|e| MapError::Search(e.to_string()))?;
        let body = response
            .text()
            .await
            .map_err(|e| MapError::Search(e.to_string()))?;

        let places = parse_places(&body)?;
        log::debug!("{} places found for {:?}", places.len(), query);
        Ok(places)
    }
}

#[derive(Deserialize)]
struct RawPlace {
    display_name: String,
    lat: Coordinate,
    lon: Coordinate,
}

/// Nominatim sends coordinates as strings; accept plain numbers too
#[derive(Deserialize)]
#[serde(untagged)]
enum Coordinate {
    Text(String),
    Number(f64),
}

impl Coordinate {
    fn value(&self) -> Result<f64> {
        let value = match self {
            Coordinate::Number(value) => *value,
            Coordinate::Text(text) => text
                .trim()
                .parse()
                .map_err(|_| MapError::Search(format!("invalid coordinate {:?}", text)))?,
        };
        if !value.is_finite() {
            return Err(MapError::Search(format!("non-finite coordinate {}", value)));
        }
        Ok(value)
    }
}

/// Parses a Nominatim `format=json` response body
pub fn parse_places(body: &str) -> Result<Vec<Place>> {
    let raw: Vec<RawPlace> =
        serde_json::from_str(body).map_err(|e| MapError::Search(e.to_string()))?;

    raw.into_iter()
        .map(|place| {
            Ok(Place {
                lon: place.lon.value()?,
                lat: place.lat.value()?,
                display_name: place.display_name,
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_string_coordinates() {
        let body = r#"[
            {"place_id": 1, "display_name": "Belfort, Territoire de Belfort, France",
             "lat": "47.6379", "lon": "6.8628", "type": "city"},
            {"display_name": "Belfort, Ohio", "lat": "40.1", "lon": "-81.2"}
        ]"#;
        let places = parse_places(body).unwrap();
        assert_eq!(places.len(), 2);
        assert_eq!(places[0].display_name, "Belfort, Territoire de Belfort, France");
        assert_eq!(places[0].lon, 6.8628);
        assert_eq!(places[0].lat, 47.6379);
        assert_eq!(places[1].lon, -81.2);
    }

    #[test]
    fn test_parse_numeric_coordinates() {
        let places = parse_places(r#"[{"display_name": "X", "lat": 1.5, "lon": 2.5}]"#).unwrap();
        assert_eq!(places[0].coordinates().lon, 2.5);
    }

    #[test]
    fn test_parse_empty_array() {
        assert!(parse_places("[]").unwrap().is_empty());
    }

    #[test]
    fn test_malformed_body_is_search_error() {
        assert!(matches!(parse_places("<html>"), Err(MapError::Search(_))));
        assert!(matches!(
            parse_places(r#"[{"display_name": "X", "lat": "north", "lon": "1"}]"#),
            Err(MapError::Search(_))
        ));
    }

    #[test]
    fn test_non_finite_coordinates_rejected() {
        for body in [
            r#"[{"display_name": "X", "lat": "NaN", "lon": "nan"}]"#,
            r#"[{"display_name": "X", "lat": "1.0", "lon": "inf"}]"#,
            r#"[{"display_name": "X", "lat": "-infinity", "lon": "2.0"}]"#,
        ] {
            assert!(matches!(parse_places(body), Err(MapError::Search(_))), "{}", body);
        }
    }

    #[tokio::test]
    async fn test_blank_query_makes_no_request() {
        // Unroutable endpoint: any request would fail
        let search = NominatimSearch::with_endpoint("http://127.0.0.1:9/search", "tileview-test").unwrap();
        assert!(search.search("   ").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_transport_failure_is_search_error() {
        let search = NominatimSearch::with_endpoint("http://127.0.0.1:9/search", "tileview-test").unwrap();
        assert!(matches!(search.search("Belfort").await, Err(MapError::Search(_))));
    }
}
