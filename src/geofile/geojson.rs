use std::{fs, io, path::Path};

use crate::error::MapError;

use super::feature::{FeatureCollection, GeoFeature};

/// Geometry type some backends emit for rows without a location.
const NONE_GEOMETRY_SENTINEL: &str = "None";

/// A decoded collection together with the number of features that were filtered out.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ParsedCollection {
    pub collection: FeatureCollection,
    pub dropped: usize,
}

/// Decode a GeoJSON FeatureCollection, dropping features whose geometry is missing, is the
/// "None" sentinel, or is not a recognized GeoJSON geometry.
///
/// The document is walked as plain JSON first, since a single sentinel geometry would make
/// the whole document invalid GeoJSON. A document without a `features` array decodes to an
/// empty collection; only text that is not JSON at all is an error.
pub fn parse_feature_collection(contents: &str) -> Result<ParsedCollection, MapError> {
    let mut document: serde_json::Value = serde_json::from_str(contents)?;
    let raw_features = match document.get_mut("features").map(serde_json::Value::take) {
        Some(serde_json::Value::Array(features)) => features,
        _ => return Ok(ParsedCollection::default()),
    };
    let num_features = raw_features.len();
    let collection: FeatureCollection = raw_features
        .into_iter()
        .filter(has_usable_geometry)
        .filter_map(|raw_feature| {
            let feature = match serde_json::from_value::<geojson::Feature>(raw_feature) {
                Ok(feature) => feature,
                Err(err) => {
                    log::debug!("Skipping undecodable feature, {}", err);
                    return None;
                }
            };
            match GeoFeature::try_from(feature) {
                Ok(feature) => Some(feature),
                Err(err) => {
                    log::debug!("Skipping feature, {}", err);
                    None
                }
            }
        })
        .collect();
    let dropped = num_features - collection.len();
    if dropped > 0 {
        log::warn!(
            "Out of {} features read, only {} had a usable geometry.",
            num_features,
            collection.len()
        )
    }
    Ok(ParsedCollection {
        collection,
        dropped,
    })
}

fn has_usable_geometry(raw_feature: &serde_json::Value) -> bool {
    match raw_feature.get("geometry") {
        None | Some(serde_json::Value::Null) => false,
        Some(geometry) => {
            geometry.get("type").and_then(|t| t.as_str()) != Some(NONE_GEOMETRY_SENTINEL)
        }
    }
}

pub fn collection_to_geojson(collection: &FeatureCollection) -> geojson::GeoJson {
    let feature_collection: geojson::FeatureCollection = collection
        .iter()
        .map(geojson::Feature::from)
        .collect();
    geojson::GeoJson::from(feature_collection)
}

pub fn collection_to_string(collection: &FeatureCollection) -> String {
    collection_to_geojson(collection).to_string()
}

pub fn feature_to_string(feature: &GeoFeature) -> String {
    geojson::GeoJson::from(geojson::Feature::from(feature)).to_string()
}

pub fn write_geojson(geojson: &geojson::GeoJson, output_filepath: &Path) -> io::Result<()> {
    fs::write(output_filepath, geojson.to_string())
}

#[cfg(test)]
mod tests {
    use rstest::rstest;

    use crate::{error::MapError, geofile::feature::GeoFeature};

    use super::{collection_to_string, parse_feature_collection};

    const FIVE_FEATURES_TWO_WITHOUT_GEOMETRY: &str = r#"{
        "type": "FeatureCollection",
        "features": [
            {"type": "Feature", "geometry": {"type": "Point", "coordinates": [78.1, 20.1]}, "properties": {"Name": "A"}},
            {"type": "Feature", "geometry": null, "properties": {"Name": "B"}},
            {"type": "Feature", "geometry": {"type": "Point", "coordinates": [78.2, 20.2]}, "properties": {"Name": "C"}},
            {"type": "Feature", "geometry": {"type": "None"}, "properties": {"Name": "D"}},
            {"type": "Feature", "geometry": {"type": "Polygon", "coordinates": [[[78.0, 20.0], [78.5, 20.0], [78.5, 20.5], [78.0, 20.0]]]}, "properties": {"Name": "E"}}
        ]
    }"#;

    #[test]
    fn test_parse_filters_missing_and_sentinel_geometries() {
        let parsed = parse_feature_collection(FIVE_FEATURES_TWO_WITHOUT_GEOMETRY).unwrap();
        assert_eq!(3, parsed.collection.len());
        assert_eq!(2, parsed.dropped);
        let names: Vec<String> = parsed
            .collection
            .iter()
            .filter_map(|feature| feature.properties.holder_name())
            .collect();
        assert_eq!(vec!["A", "C", "E"], names);
    }

    #[rstest]
    #[case(r#"{"type": "FeatureCollection"}"#)]
    #[case(r#"{}"#)]
    #[case(r#"{"features": "not a list"}"#)]
    #[case(r#"{"features": null}"#)]
    #[case(r#"[{"features": []}]"#)]
    fn test_parse_without_features_is_empty(#[case] contents: &str) {
        let parsed = parse_feature_collection(contents).unwrap();
        assert!(parsed.collection.is_empty());
        assert_eq!(0, parsed.dropped);
    }

    #[test]
    fn test_parse_unrecognized_geometry_type_is_dropped() {
        let contents = r#"{"features": [
            {"type": "Feature", "geometry": {"type": "Circle", "coordinates": [1.0, 2.0]}, "properties": {}}
        ]}"#;
        let parsed = parse_feature_collection(contents).unwrap();
        assert!(parsed.collection.is_empty());
        assert_eq!(1, parsed.dropped);
    }

    #[test]
    fn test_parse_invalid_json_is_parse_error() {
        assert!(matches!(
            parse_feature_collection("{not json"),
            Err(MapError::Parse(_))
        ));
    }

    #[test]
    fn test_serialized_collection_decodes_to_same_features() {
        let parsed = parse_feature_collection(FIVE_FEATURES_TWO_WITHOUT_GEOMETRY).unwrap();
        let reparsed = parse_feature_collection(&collection_to_string(&parsed.collection)).unwrap();
        assert_eq!(parsed.collection, reparsed.collection);
        assert_eq!(0, reparsed.dropped);
    }

    #[test]
    fn test_optimistic_feature_serializes_without_id() {
        let feature = GeoFeature::from(geo::Point::new(78.9, 20.5));
        let contents = super::feature_to_string(&feature);
        let value: serde_json::Value = serde_json::from_str(&contents).unwrap();
        assert!(value.get("id").is_none());
        assert_eq!("Point", value["geometry"]["type"]);
    }
}
