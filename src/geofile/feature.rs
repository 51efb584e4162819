use std::{
    collections::{hash_map::DefaultHasher, BTreeMap},
    fmt,
    hash::{Hash, Hasher},
};

use geo::{Centroid, CoordsIter};

/// Geohash length used for the location part of structural feature ids. Nine characters is
/// roughly a 5m cell, fine enough to tell neighbouring claims apart.
const STRUCTURAL_ID_GEOHASH_LENGTH: usize = 9;

/// Attribute names used by the claims backend.
pub mod attribute {
    pub const NAME: &str = "Name";
    pub const LAND_AREA: &str = "LandArea";
    pub const DISTRICT: &str = "District";
    pub const STATE: &str = "State";
    pub const STATUS: &str = "Status";
}

/// Stable identity of a feature, assigned when the feature enters the system.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum FeatureId {
    /// Id provided by the server in the GeoJSON `id` member.
    Server(String),
    /// Derived from the geometry: geohash of the representative point plus a hash of all coordinates.
    Structural(String),
}

impl FeatureId {
    pub fn structural(geometry: &geo::Geometry) -> Self {
        let mut hasher = DefaultHasher::new();
        geometry_kind(geometry).hash(&mut hasher);
        for coord in geometry.coords_iter() {
            coord.x.to_bits().hash(&mut hasher);
            coord.y.to_bits().hash(&mut hasher);
        }
        let anchor = geometry
            .centroid()
            .or_else(|| geometry.coords_iter().next().map(geo::Point::from));
        let location = anchor
            .and_then(|point| {
                geohash::encode(
                    geohash::Coord {
                        x: point.x(),
                        y: point.y(),
                    },
                    STRUCTURAL_ID_GEOHASH_LENGTH,
                )
                .ok()
            })
            .unwrap_or_else(|| "unlocated".to_string());
        FeatureId::Structural(format!("{}-{:016x}", location, hasher.finish()))
    }

    pub fn as_str(&self) -> &str {
        match self {
            FeatureId::Server(id) | FeatureId::Structural(id) => id,
        }
    }
}

impl fmt::Display for FeatureId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Attribute value. Booleans and nested JSON are kept as their text rendering.
#[derive(Debug, Clone, PartialEq)]
pub enum PropertyValue {
    Text(String),
    Number(f64),
    Null,
}

impl PropertyValue {
    /// Text used for display. Empty strings and nulls count as absent.
    pub fn as_text(&self) -> Option<String> {
        match self {
            PropertyValue::Text(text) if text.is_empty() => None,
            PropertyValue::Text(text) => Some(text.clone()),
            PropertyValue::Number(number) if number.fract() == 0.0 && number.abs() < 1e15 => {
                Some(format!("{:.0}", number))
            }
            PropertyValue::Number(number) => Some(number.to_string()),
            PropertyValue::Null => None,
        }
    }
}

impl From<serde_json::Value> for PropertyValue {
    fn from(value: serde_json::Value) -> Self {
        use serde_json::Value;
        match value {
            Value::Null => PropertyValue::Null,
            Value::String(text) => PropertyValue::Text(text),
            Value::Number(number) => number
                .as_f64()
                .map(PropertyValue::Number)
                .unwrap_or_else(|| PropertyValue::Text(number.to_string())),
            Value::Bool(flag) => PropertyValue::Text(flag.to_string()),
            nested => PropertyValue::Text(nested.to_string()),
        }
    }
}

impl From<&PropertyValue> for serde_json::Value {
    fn from(value: &PropertyValue) -> Self {
        match value {
            PropertyValue::Text(text) => serde_json::Value::String(text.clone()),
            PropertyValue::Number(number) => serde_json::Number::from_f64(*number)
                .map(serde_json::Value::Number)
                .unwrap_or(serde_json::Value::Null),
            PropertyValue::Null => serde_json::Value::Null,
        }
    }
}

/// Open attribute bag of a feature, with accessors for the attributes the map displays.
/// No attribute is required.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct FeatureProperties(BTreeMap<String, PropertyValue>);

impl FeatureProperties {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, key: &str) -> Option<&PropertyValue> {
        self.0.get(key)
    }

    pub fn insert(&mut self, key: impl Into<String>, value: PropertyValue) {
        self.0.insert(key.into(), value);
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &PropertyValue)> {
        self.0.iter()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn text(&self, key: &str) -> Option<String> {
        self.get(key).and_then(PropertyValue::as_text)
    }

    pub fn holder_name(&self) -> Option<String> {
        self.text(attribute::NAME)
    }

    pub fn land_area(&self) -> Option<String> {
        self.text(attribute::LAND_AREA)
    }

    pub fn district(&self) -> Option<String> {
        self.text(attribute::DISTRICT)
    }

    pub fn state(&self) -> Option<String> {
        self.text(attribute::STATE)
    }

    pub fn status(&self) -> Option<String> {
        self.text(attribute::STATUS)
    }
}

impl From<geojson::JsonObject> for FeatureProperties {
    fn from(object: geojson::JsonObject) -> Self {
        Self(
            object
                .into_iter()
                .map(|(key, value)| (key, PropertyValue::from(value)))
                .collect(),
        )
    }
}

impl From<&FeatureProperties> for geojson::JsonObject {
    fn from(properties: &FeatureProperties) -> Self {
        properties
            .iter()
            .map(|(key, value)| (key.clone(), serde_json::Value::from(value)))
            .collect()
    }
}

impl<K: Into<String>> FromIterator<(K, PropertyValue)> for FeatureProperties {
    fn from_iter<I: IntoIterator<Item = (K, PropertyValue)>>(iter: I) -> Self {
        Self(iter.into_iter().map(|(key, value)| (key.into(), value)).collect())
    }
}

/// A single claim's geospatial record.
#[derive(Debug, Clone, PartialEq)]
pub struct GeoFeature {
    pub id: FeatureId,
    pub geometry: geo::Geometry,
    pub properties: FeatureProperties,
}

impl GeoFeature {
    /// Create a feature without a server id; its id is derived from the geometry.
    pub fn new(geometry: geo::Geometry, properties: FeatureProperties) -> Self {
        Self {
            id: FeatureId::structural(&geometry),
            geometry,
            properties,
        }
    }

    /// The point location, for point features only.
    pub fn point(&self) -> Option<geo::Point> {
        match &self.geometry {
            geo::Geometry::Point(point) => Some(*point),
            _ => None,
        }
    }
}

impl From<geo::Point> for GeoFeature {
    fn from(value: geo::Point) -> Self {
        Self::new(geo::Geometry::Point(value), FeatureProperties::new())
    }
}

/// Why a GeoJSON feature was kept out of a collection.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum RejectedGeometry {
    #[error("feature has no geometry")]
    Missing,
    #[error("unsupported geometry: {0}")]
    Unsupported(String),
}

impl TryFrom<geojson::Feature> for GeoFeature {
    type Error = RejectedGeometry;

    fn try_from(feature: geojson::Feature) -> Result<Self, Self::Error> {
        let geometry = feature.geometry.ok_or(RejectedGeometry::Missing)?;
        let geometry = geo::Geometry::<f64>::try_from(geometry)
            .map_err(|err| RejectedGeometry::Unsupported(err.to_string()))?;
        let properties = feature
            .properties
            .map(FeatureProperties::from)
            .unwrap_or_default();
        let id = match feature.id {
            Some(geojson::feature::Id::String(id)) => FeatureId::Server(id),
            Some(geojson::feature::Id::Number(id)) => FeatureId::Server(id.to_string()),
            None => FeatureId::structural(&geometry),
        };
        Ok(Self {
            id,
            geometry,
            properties,
        })
    }
}

impl From<&GeoFeature> for geojson::Feature {
    fn from(feature: &GeoFeature) -> Self {
        // Structural ids are recomputed on ingestion, only server ids go over the wire.
        let id = match &feature.id {
            FeatureId::Server(id) => Some(geojson::feature::Id::String(id.clone())),
            FeatureId::Structural(_) => None,
        };
        geojson::Feature {
            bbox: None,
            geometry: Some(geojson::Geometry::new(geojson::Value::from(
                &feature.geometry,
            ))),
            id,
            properties: Some(geojson::JsonObject::from(&feature.properties)),
            foreign_members: None,
        }
    }
}

/// Name of the geometry variant, as used by GeoJSON.
pub fn geometry_kind(geometry: &geo::Geometry) -> &'static str {
    match geometry {
        geo::Geometry::Point(_) => "Point",
        geo::Geometry::Line(_) => "Line",
        geo::Geometry::LineString(_) => "LineString",
        geo::Geometry::Polygon(_) => "Polygon",
        geo::Geometry::MultiPoint(_) => "MultiPoint",
        geo::Geometry::MultiLineString(_) => "MultiLineString",
        geo::Geometry::MultiPolygon(_) => "MultiPolygon",
        geo::Geometry::GeometryCollection(_) => "GeometryCollection",
        geo::Geometry::Rect(_) => "Rect",
        geo::Geometry::Triangle(_) => "Triangle",
    }
}

/// One consistent snapshot of features. Every element carries a recognized geometry, features
/// without one are filtered out before a collection is built.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct FeatureCollection {
    pub features: Vec<GeoFeature>,
}

impl FeatureCollection {
    pub fn new(features: Vec<GeoFeature>) -> Self {
        Self { features }
    }

    pub fn len(&self) -> usize {
        self.features.len()
    }

    pub fn is_empty(&self) -> bool {
        self.features.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, GeoFeature> {
        self.features.iter()
    }
}

impl From<Vec<GeoFeature>> for FeatureCollection {
    fn from(features: Vec<GeoFeature>) -> Self {
        Self::new(features)
    }
}

impl FromIterator<GeoFeature> for FeatureCollection {
    fn from_iter<I: IntoIterator<Item = GeoFeature>>(iter: I) -> Self {
        Self::new(iter.into_iter().collect())
    }
}
