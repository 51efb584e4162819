use std::path::PathBuf;

use rayon::prelude::*;
use serde_json::json;

use crate::{
    error::MapError,
    geofile::{
        feature::{FeatureCollection, GeoFeature},
        geojson::write_geojson,
    },
};

use super::{
    basemap::{BasemapKind, BasemapSet},
    marker_layer::{CandidatePin, Marker, MarkerLayer, MarkerStyle},
    renderer::{MapRenderer, Viewport},
};

/// Where and how a [`GeoJsonLayerRenderer`] draws.
#[derive(Debug, Clone)]
pub struct MapContainer {
    /// File that receives the full layer state after every change.
    pub export_path: PathBuf,
    pub viewport: Viewport,
    /// Zoom used when centring on a candidate.
    pub candidate_zoom: u8,
}

/// Map adapter that keeps the marker layer in memory and mirrors it, styles and popups
/// included, to a GeoJSON file any GIS viewer can display.
pub struct GeoJsonLayerRenderer {
    export_path: PathBuf,
    viewport: Viewport,
    candidate_zoom: u8,
    basemaps: BasemapSet,
    layer: MarkerLayer,
    candidate: Option<CandidatePin>,
    torn_down: bool,
}

#[cfg(test)]
impl GeoJsonLayerRenderer {
    pub fn layer(&self) -> &MarkerLayer {
        &self.layer
    }

    pub fn candidate(&self) -> Option<&CandidatePin> {
        self.candidate.as_ref()
    }

    pub fn viewport(&self) -> Viewport {
        self.viewport
    }

    pub fn basemaps(&self) -> &BasemapSet {
        &self.basemaps
    }

    pub fn is_torn_down(&self) -> bool {
        self.torn_down
    }
}

impl GeoJsonLayerRenderer {
    fn to_geojson(&self) -> geojson::GeoJson {
        let mut features: Vec<geojson::Feature> =
            self.layer.markers().iter().map(marker_to_geojson).collect();
        if let Some(candidate) = &self.candidate {
            features.push(candidate_to_geojson(candidate));
        }
        let mut foreign_members = geojson::JsonObject::new();
        foreign_members.insert(
            "viewport".to_string(),
            json!({
                "center": [self.viewport.center.y(), self.viewport.center.x()],
                "zoom": self.viewport.zoom,
            }),
        );
        if let Some(basemap) = self.basemaps.active() {
            foreign_members.insert(
                "basemap".to_string(),
                json!({
                    "name": basemap.name,
                    "tiles": basemap.tile_urls,
                    "attribution": basemap.attribution,
                    "maxZoom": basemap.max_zoom,
                }),
            );
        }
        geojson::GeoJson::from(geojson::FeatureCollection {
            bbox: None,
            features,
            foreign_members: Some(foreign_members),
        })
    }

    fn flush(&self) {
        if let Err(err) = write_geojson(&self.to_geojson(), &self.export_path) {
            log::warn!(
                "Could not write map layer to {:?}: {}",
                self.export_path,
                err
            );
        }
    }
}

impl MapRenderer for GeoJsonLayerRenderer {
    type Container = MapContainer;

    fn initialize(container: MapContainer) -> Result<Self, MapError> {
        if let Some(parent) = container.export_path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let renderer = Self {
            export_path: container.export_path,
            viewport: container.viewport,
            candidate_zoom: container.candidate_zoom,
            basemaps: BasemapSet::default(),
            layer: MarkerLayer::new(),
            candidate: None,
            torn_down: false,
        };
        write_geojson(&renderer.to_geojson(), &renderer.export_path)?;
        log::info!("Map initialized, rendering to {:?}", renderer.export_path);
        Ok(renderer)
    }

    fn set_features(&mut self, collection: &FeatureCollection) {
        if self.torn_down {
            return;
        }
        let markers: Vec<Marker> = collection.features.par_iter().map(Marker::from).collect();
        self.layer.clear();
        self.layer.extend(markers);
        log::debug!("Rendered {} markers", self.layer.len());
        self.flush();
    }

    fn add_feature(&mut self, feature: &GeoFeature) {
        if self.torn_down {
            return;
        }
        self.layer.push(Marker::from(feature));
        self.flush();
    }

    fn show_candidate(&mut self, position: geo::Point) {
        if self.torn_down {
            return;
        }
        self.candidate = Some(CandidatePin::new(position));
        self.viewport = Viewport {
            center: position,
            zoom: self.candidate_zoom,
        };
        self.flush();
    }

    fn remove_candidate(&mut self) {
        if self.torn_down || self.candidate.take().is_none() {
            return;
        }
        self.flush();
    }

    fn select_basemap(&mut self, kind: BasemapKind) -> bool {
        if self.torn_down || !self.basemaps.select(kind) {
            return false;
        }
        if let Some(basemap) = self.basemaps.active() {
            log::info!("Switched basemap to {}", basemap.name);
        }
        self.flush();
        true
    }

    fn teardown(&mut self) {
        if self.torn_down {
            return;
        }
        self.layer.clear();
        self.candidate = None;
        self.torn_down = true;
        log::debug!("Map torn down");
    }
}

fn style_properties(style: &MarkerStyle) -> geojson::JsonObject {
    let mut properties = geojson::JsonObject::new();
    properties.insert("radius".to_string(), json!(style.radius));
    properties.insert("fillColor".to_string(), json!(style.fill_color));
    properties.insert("color".to_string(), json!(style.stroke_color));
    properties.insert("weight".to_string(), json!(style.weight));
    properties.insert("opacity".to_string(), json!(style.opacity));
    properties.insert("fillOpacity".to_string(), json!(style.fill_opacity));
    properties
}

fn marker_to_geojson(marker: &Marker) -> geojson::Feature {
    let mut properties = style_properties(&marker.style);
    properties.insert("role".to_string(), json!("claim"));
    let shape = if marker.is_circle() { "circle" } else { "outline" };
    properties.insert("shape".to_string(), json!(shape));
    properties.insert("featureId".to_string(), json!(marker.feature_id.as_str()));
    properties.insert("status".to_string(), json!(marker.popup.status_class.name()));
    properties.insert("popup".to_string(), json!(marker.popup.to_string()));
    geojson::Feature {
        bbox: None,
        geometry: Some(geojson::Geometry::new(geojson::Value::from(
            &marker.geometry,
        ))),
        id: None,
        properties: Some(properties),
        foreign_members: None,
    }
}

fn candidate_to_geojson(candidate: &CandidatePin) -> geojson::Feature {
    let mut properties = style_properties(&candidate.style);
    properties.insert("role".to_string(), json!("candidate"));
    properties.insert("popup".to_string(), json!(candidate.popup_text));
    properties.insert("popupOpen".to_string(), json!(candidate.popup_open));
    geojson::Feature {
        bbox: None,
        geometry: Some(geojson::Geometry::new(geojson::Value::from(
            &candidate.position,
        ))),
        id: None,
        properties: Some(properties),
        foreign_members: None,
    }
}

#[cfg(test)]
mod tests {
    use std::path::Path;

    use testdir::testdir;

    use crate::{
        geofile::{
            feature::{FeatureCollection, FeatureProperties, GeoFeature},
            geojson::parse_feature_collection,
        },
        map::{
            basemap::{BasemapKind, IMAGERY_BASEMAP, STREET_BASEMAP},
            marker_layer::CANDIDATE_MARKER_STYLE,
            renderer::{MapRenderer, Viewport},
        },
    };

    use super::{GeoJsonLayerRenderer, MapContainer};

    fn initialize(export_path: &Path) -> GeoJsonLayerRenderer {
        GeoJsonLayerRenderer::initialize(MapContainer {
            export_path: export_path.to_path_buf(),
            viewport: Viewport {
                center: geo::Point::new(78.9629, 20.5937),
                zoom: 5,
            },
            candidate_zoom: 12,
        })
        .unwrap()
    }

    fn three_claims() -> FeatureCollection {
        FeatureCollection::new(vec![
            GeoFeature::from(geo::Point::new(78.1, 20.1)),
            GeoFeature::from(geo::Point::new(78.2, 20.2)),
            GeoFeature::from(geo::Point::new(78.3, 20.3)),
        ])
    }

    fn exported(export_path: &Path) -> serde_json::Value {
        serde_json::from_str(&std::fs::read_to_string(export_path).unwrap()).unwrap()
    }

    fn exported_feature_count(export_path: &Path) -> usize {
        let contents = std::fs::read_to_string(export_path).unwrap();
        parse_feature_collection(&contents).unwrap().collection.len()
    }

    #[test]
    fn test_initialize_installs_basemaps_and_empty_layer() {
        let export_path = testdir!().join("map_layer.geojson");
        let renderer = initialize(&export_path);
        assert_eq!(2, renderer.basemaps().layers().len());
        assert!(renderer.layer().is_empty());
        assert!(renderer.candidate().is_none());
        assert_eq!(0, exported_feature_count(&export_path));
    }

    #[test]
    fn test_set_features_is_idempotent() {
        let export_path = testdir!().join("map_layer.geojson");
        let mut renderer = initialize(&export_path);
        let claims = three_claims();
        renderer.set_features(&claims);
        let first = renderer.layer().clone();
        renderer.set_features(&claims);
        assert_eq!(first, *renderer.layer());
        assert_eq!(3, renderer.layer().len());
        assert_eq!(3, exported_feature_count(&export_path));
    }

    #[test]
    fn test_set_features_replaces_previous_markers() {
        let mut renderer = initialize(&testdir!().join("map_layer.geojson"));
        renderer.set_features(&three_claims());
        renderer.set_features(&FeatureCollection::new(vec![GeoFeature::from(
            geo::Point::new(80.0, 22.0),
        )]));
        assert_eq!(1, renderer.layer().len());
        assert!(renderer.layer().contains_point(&geo::Point::new(80.0, 22.0)));
    }

    #[test]
    fn test_add_feature_keeps_existing_markers() {
        let mut renderer = initialize(&testdir!().join("map_layer.geojson"));
        renderer.set_features(&three_claims());
        renderer.add_feature(&GeoFeature::from(geo::Point::new(80.0, 22.0)));
        assert_eq!(4, renderer.layer().len());
    }

    #[test]
    fn test_polygon_is_rendered_as_outline() {
        let export_path = testdir!().join("map_layer.geojson");
        let mut renderer = initialize(&export_path);
        let polygon = geo::Polygon::new(
            vec![(78.0, 20.0), (78.5, 20.0), (78.5, 20.5), (78.0, 20.0)].into(),
            vec![],
        );
        renderer.set_features(&FeatureCollection::new(vec![GeoFeature::new(
            geo::Geometry::Polygon(polygon),
            FeatureProperties::new(),
        )]));
        assert_eq!(1, renderer.layer().len());
        assert!(!renderer.layer().markers()[0].is_circle());
        assert_eq!("outline", exported(&export_path)["features"][0]["properties"]["shape"]);
    }

    #[test]
    fn test_show_candidate_supersedes_previous_one() {
        let export_path = testdir!().join("map_layer.geojson");
        let mut renderer = initialize(&export_path);
        renderer.show_candidate(geo::Point::new(78.0, 20.0));
        renderer.show_candidate(geo::Point::new(81.63, 21.25));

        let candidate = renderer.candidate().unwrap();
        assert_eq!(geo::Point::new(81.63, 21.25), candidate.position);
        assert_eq!(CANDIDATE_MARKER_STYLE, candidate.style);
        assert!(candidate.popup_open);
        assert_eq!(
            Viewport {
                center: geo::Point::new(81.63, 21.25),
                zoom: 12
            },
            renderer.viewport()
        );
        assert!(renderer.layer().is_empty());
        assert_eq!(1, exported_feature_count(&export_path));
    }

    #[test]
    fn test_remove_candidate_without_candidate_is_noop() {
        let mut renderer = initialize(&testdir!().join("map_layer.geojson"));
        renderer.remove_candidate();
        renderer.show_candidate(geo::Point::new(78.0, 20.0));
        renderer.remove_candidate();
        renderer.remove_candidate();
        assert!(renderer.candidate().is_none());
    }

    #[test]
    fn test_teardown_is_repeatable_and_final() {
        let mut renderer = initialize(&testdir!().join("map_layer.geojson"));
        renderer.set_features(&three_claims());
        renderer.teardown();
        renderer.teardown();
        renderer.set_features(&three_claims());
        renderer.show_candidate(geo::Point::new(78.0, 20.0));
        assert!(renderer.is_torn_down());
        assert!(renderer.layer().is_empty());
        assert!(renderer.candidate().is_none());
    }

    #[test]
    fn test_select_basemap_is_exported() {
        let export_path = testdir!().join("map_layer.geojson");
        let mut renderer = initialize(&export_path);
        assert_eq!(IMAGERY_BASEMAP, exported(&export_path)["basemap"]["name"]);

        assert!(renderer.select_basemap(BasemapKind::Street));
        assert_eq!(STREET_BASEMAP, renderer.basemaps().active().unwrap().name);
        assert_eq!(STREET_BASEMAP, exported(&export_path)["basemap"]["name"]);
    }

    #[test]
    fn test_select_basemap_after_teardown_is_ignored() {
        let mut renderer = initialize(&testdir!().join("map_layer.geojson"));
        renderer.teardown();
        assert!(!renderer.select_basemap(BasemapKind::Street));
        assert_eq!(IMAGERY_BASEMAP, renderer.basemaps().active().unwrap().name);
    }
}
