use crate::{
    error::MapError,
    geofile::feature::{FeatureCollection, GeoFeature},
};

use super::basemap::BasemapKind;

/// Centre (x = longitude, y = latitude) and zoom level of the visible map.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Viewport {
    pub center: geo::Point,
    pub zoom: u8,
}

/// Capabilities the map view needs from a concrete map. Implementations own one persistent
/// marker layer and at most one candidate marker.
pub trait MapRenderer {
    /// Whatever the implementation renders into.
    type Container;

    /// Create the map on the default viewport with its basemaps and an empty marker layer.
    fn initialize(container: Self::Container) -> Result<Self, MapError>
    where
        Self: Sized;

    /// Clear the marker layer and refill it from `collection`. Idempotent.
    fn set_features(&mut self, collection: &FeatureCollection);

    /// Append one feature, keeping the existing markers.
    fn add_feature(&mut self, feature: &GeoFeature);

    /// Replace any candidate with one at `position`, open its popup and centre on it.
    fn show_candidate(&mut self, position: geo::Point);

    /// No-op when there is no candidate.
    fn remove_candidate(&mut self);

    /// Switch the background. Returns false when no basemap of `kind` is installed.
    fn select_basemap(&mut self, kind: BasemapKind) -> bool;

    /// Release the map. Safe to call more than once; later calls to any method do nothing.
    fn teardown(&mut self);
}
