use std::time::Duration;

use reqwest::header::{CACHE_CONTROL, CONTENT_TYPE, PRAGMA};

use crate::{
    config::RemoteConfig,
    error::MapError,
    geofile::{
        feature::GeoFeature,
        geojson::{feature_to_string, parse_feature_collection, ParsedCollection},
    },
};

/// Authoritative feature collection behind a backend. Implementations only talk to the
/// network; they never touch the cache or the renderer.
pub trait RemoteFeatureSource: Send + Sync {
    /// Read the whole collection, bypassing intermediary caches. Features without a usable
    /// geometry are already filtered out of the result.
    fn fetch_all(&self) -> Result<ParsedCollection, MapError>;

    /// Send one new feature for persistence. An error means the feature may not be stored.
    fn submit(&self, feature: &GeoFeature) -> Result<(), MapError>;
}

pub struct HttpFeatureSource {
    client: reqwest::blocking::Client,
    read_url: String,
    write_url: String,
}

impl HttpFeatureSource {
    pub fn new(config: &RemoteConfig) -> Result<Self, MapError> {
        let client = reqwest::blocking::Client::builder()
            .user_agent("fra-map")
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;
        Ok(Self {
            client,
            read_url: config.read_url.clone(),
            write_url: config.write_url.clone(),
        })
    }
}

impl RemoteFeatureSource for HttpFeatureSource {
    fn fetch_all(&self) -> Result<ParsedCollection, MapError> {
        log::debug!("Fetching features from {}", self.read_url);
        let response = self
            .client
            .get(&self.read_url)
            .header(CACHE_CONTROL, "no-cache, no-store")
            .header(PRAGMA, "no-cache")
            .send()?
            .error_for_status()?;
        let contents = response.text()?;
        parse_feature_collection(&contents)
    }

    fn submit(&self, feature: &GeoFeature) -> Result<(), MapError> {
        log::debug!("Submitting feature {} to {}", feature.id, self.write_url);
        self.client
            .post(&self.write_url)
            .header(CONTENT_TYPE, "application/json")
            .body(feature_to_string(feature))
            .send()?
            .error_for_status()?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use mockito::{Matcher, Server};
    use serde_json::json;

    use crate::{
        config::RemoteConfig,
        error::MapError,
        geofile::feature::GeoFeature,
        view::placement::{optimistic_feature, CandidateMarker},
    };

    use super::{HttpFeatureSource, RemoteFeatureSource};

    const THREE_FEATURES_ONE_WITHOUT_GEOMETRY: &str = r#"{"type": "FeatureCollection", "features": [
        {"type": "Feature", "geometry": {"type": "Point", "coordinates": [78.1, 20.1]}, "properties": {"Name": "Asha"}},
        {"type": "Feature", "geometry": {"type": "None"}, "properties": {"Name": "Birsa"}},
        {"type": "Feature", "id": "claim-7", "geometry": {"type": "Point", "coordinates": [78.3, 20.3]}, "properties": {"Name": "Chandu"}}
    ]}"#;

    fn source_for(base_url: &str) -> HttpFeatureSource {
        HttpFeatureSource::new(&RemoteConfig {
            read_url: format!("{}/geojson", base_url),
            write_url: format!("{}/save", base_url),
            timeout_secs: 2,
        })
        .unwrap()
    }

    /// Nothing listens on port 9 (discard) on a test machine, the connection is refused.
    fn unreachable_source() -> HttpFeatureSource {
        source_for("http://127.0.0.1:9")
    }

    #[test]
    fn test_fetch_all_parses_and_filters_body() {
        let mut server = Server::new();
        let mock = server
            .mock("GET", "/geojson")
            .match_header("cache-control", "no-cache, no-store")
            .match_header("pragma", "no-cache")
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(THREE_FEATURES_ONE_WITHOUT_GEOMETRY)
            .create();

        let parsed = source_for(&server.url()).fetch_all().unwrap();
        mock.assert();
        assert_eq!(2, parsed.collection.len());
        assert_eq!(1, parsed.dropped);
        let names: Vec<String> = parsed
            .collection
            .iter()
            .filter_map(|feature| feature.properties.holder_name())
            .collect();
        assert_eq!(vec!["Asha", "Chandu"], names);
    }

    #[test]
    fn test_fetch_all_error_status_is_network_error() {
        let mut server = Server::new();
        let mock = server
            .mock("GET", "/geojson")
            .with_status(500)
            .with_body("internal error")
            .create();

        assert!(matches!(
            source_for(&server.url()).fetch_all(),
            Err(MapError::Network(_))
        ));
        mock.assert();
    }

    #[test]
    fn test_fetch_all_non_json_body_is_parse_error() {
        let mut server = Server::new();
        let mock = server
            .mock("GET", "/geojson")
            .with_status(200)
            .with_body("<html>maintenance</html>")
            .create();

        assert!(matches!(
            source_for(&server.url()).fetch_all(),
            Err(MapError::Parse(_))
        ));
        mock.assert();
    }

    #[test]
    fn test_submit_posts_feature_as_json() {
        let mut server = Server::new();
        let mock = server
            .mock("POST", "/save")
            .match_header("content-type", "application/json")
            .match_body(Matcher::PartialJson(json!({
                "type": "Feature",
                "geometry": {"type": "Point", "coordinates": [81.63, 21.25]},
                "properties": {"Name": "New", "Status": "Pending"}
            })))
            .with_status(201)
            .create();

        let candidate = CandidateMarker::new(21.25, 81.63).unwrap();
        source_for(&server.url())
            .submit(&optimistic_feature(&candidate))
            .unwrap();
        mock.assert();
    }

    #[test]
    fn test_submit_error_status_is_network_error() {
        let mut server = Server::new();
        let mock = server.mock("POST", "/save").with_status(500).create();

        let feature = GeoFeature::from(geo::Point::new(78.0, 20.0));
        assert!(matches!(
            source_for(&server.url()).submit(&feature),
            Err(MapError::Network(_))
        ));
        mock.assert();
    }

    #[test]
    fn test_fetch_all_transport_failure_is_network_error() {
        assert!(matches!(
            unreachable_source().fetch_all(),
            Err(MapError::Network(_))
        ));
    }

    #[test]
    fn test_submit_transport_failure_is_network_error() {
        let feature = GeoFeature::from(geo::Point::new(78.0, 20.0));
        assert!(matches!(
            unreachable_source().submit(&feature),
            Err(MapError::Network(_))
        ));
    }
}
