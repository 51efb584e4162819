use crate::{
    geofile::feature::{attribute, FeatureProperties, GeoFeature, PropertyValue},
    map::renderer::MapRenderer,
};

const PLACEHOLDER_NAME: &str = "New";
const PENDING_STATUS: &str = "Pending";

/// A proposed, never persisted location. At most one exists at a time.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CandidateMarker {
    pub position: geo::Point,
}

impl CandidateMarker {
    /// Returns `None` for coordinates that are not finite or lie outside WGS84 bounds.
    pub fn new(lat: f64, lng: f64) -> Option<Self> {
        let valid = lat.is_finite()
            && lng.is_finite()
            && (-90.0..=90.0).contains(&lat)
            && (-180.0..=180.0).contains(&lng);
        valid.then(|| Self {
            position: geo::Point::new(lng, lat),
        })
    }

    pub fn lat(&self) -> f64 {
        self.position.y()
    }

    pub fn lng(&self) -> f64 {
        self.position.x()
    }
}

/// Feature committed for a candidate before the server has confirmed it.
pub fn optimistic_feature(candidate: &CandidateMarker) -> GeoFeature {
    let properties: FeatureProperties = [
        (attribute::NAME, PropertyValue::Text(PLACEHOLDER_NAME.to_string())),
        (attribute::STATUS, PropertyValue::Text(PENDING_STATUS.to_string())),
    ]
    .into_iter()
    .collect();
    GeoFeature::new(geo::Geometry::Point(candidate.position), properties)
}

/// Turns candidate locations into committed features. The only writer of new features into
/// the renderer's layer.
#[derive(Debug, Default)]
pub struct PlacementWorkflow {
    candidate: Option<CandidateMarker>,
}

impl PlacementWorkflow {
    pub fn new() -> Self {
        Self::default()
    }

    #[cfg(test)]
    pub fn candidate(&self) -> Option<&CandidateMarker> {
        self.candidate.as_ref()
    }

    /// Show a candidate, superseding the current one. Purely visual.
    pub fn show_candidate<R: MapRenderer>(&mut self, renderer: &mut R, lat: f64, lng: f64) {
        let Some(candidate) = CandidateMarker::new(lat, lng) else {
            log::warn!("Ignoring candidate location with invalid coordinates {}, {}", lat, lng);
            return;
        };
        log::info!("Showing candidate location {:.5}, {:.5}", lat, lng);
        renderer.show_candidate(candidate.position);
        self.candidate = Some(candidate);
    }

    /// Commit the current candidate: paint the optimistic feature, remove the candidate and
    /// hand the feature back for submission. Without a candidate this does nothing.
    pub fn finalize<R: MapRenderer>(&mut self, renderer: &mut R) -> Option<GeoFeature> {
        let candidate = self.candidate.take()?;
        let feature = optimistic_feature(&candidate);
        renderer.add_feature(&feature);
        renderer.remove_candidate();
        log::info!(
            "Optimistically added {:.5}, {:.5} to the map",
            candidate.lat(),
            candidate.lng()
        );
        Some(feature)
    }

    /// Drop the candidate without committing it.
    pub fn discard<R: MapRenderer>(&mut self, renderer: &mut R) {
        if self.candidate.take().is_some() {
            renderer.remove_candidate();
        }
    }
}
