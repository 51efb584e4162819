use crate::geofile::feature::{FeatureId, GeoFeature};

use super::popup::{popup_content, PopupContent};

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MarkerStyle {
    pub radius: f64,
    pub fill_color: &'static str,
    pub stroke_color: &'static str,
    pub weight: f64,
    pub opacity: f64,
    pub fill_opacity: f64,
}

pub const CLAIM_MARKER_STYLE: MarkerStyle = MarkerStyle {
    radius: 6.0,
    fill_color: "blue",
    stroke_color: "#333",
    weight: 1.0,
    opacity: 1.0,
    fill_opacity: 0.7,
};

/// Larger and red, so a candidate never looks like a stored claim.
pub const CANDIDATE_MARKER_STYLE: MarkerStyle = MarkerStyle {
    radius: 8.0,
    fill_color: "red",
    stroke_color: "#900",
    weight: 2.0,
    opacity: 1.0,
    fill_opacity: 0.9,
};

pub const CANDIDATE_POPUP_TEXT: &str = "Preview Location (not saved yet)";

/// A rendered claim. Points are drawn as circles, other geometries as read-only outlines.
#[derive(Debug, Clone, PartialEq)]
pub struct Marker {
    pub feature_id: FeatureId,
    pub geometry: geo::Geometry,
    pub style: MarkerStyle,
    pub popup: PopupContent,
}

impl Marker {
    pub fn is_circle(&self) -> bool {
        matches!(self.geometry, geo::Geometry::Point(_))
    }
}

impl From<&GeoFeature> for Marker {
    fn from(feature: &GeoFeature) -> Self {
        Self {
            feature_id: feature.id.clone(),
            geometry: feature.geometry.clone(),
            style: CLAIM_MARKER_STYLE,
            popup: popup_content(feature),
        }
    }
}

/// The provisional marker of a location that has not been committed.
#[derive(Debug, Clone, PartialEq)]
pub struct CandidatePin {
    pub position: geo::Point,
    pub style: MarkerStyle,
    pub popup_text: &'static str,
    pub popup_open: bool,
}

impl CandidatePin {
    pub fn new(position: geo::Point) -> Self {
        Self {
            position,
            style: CANDIDATE_MARKER_STYLE,
            popup_text: CANDIDATE_POPUP_TEXT,
            popup_open: true,
        }
    }
}

/// The single live layer of claim markers. It is cleared and refilled, never replaced.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct MarkerLayer {
    markers: Vec<Marker>,
}

impl MarkerLayer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn clear(&mut self) {
        self.markers.clear();
    }

    pub fn push(&mut self, marker: Marker) {
        self.markers.push(marker);
    }

    pub fn extend(&mut self, markers: impl IntoIterator<Item = Marker>) {
        self.markers.extend(markers);
    }

    pub fn markers(&self) -> &[Marker] {
        &self.markers
    }

    pub fn len(&self) -> usize {
        self.markers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.markers.is_empty()
    }

    #[cfg(test)]
    pub fn contains_point(&self, point: &geo::Point) -> bool {
        self.markers
            .iter()
            .any(|marker| marker.geometry == geo::Geometry::Point(*point))
    }
}
