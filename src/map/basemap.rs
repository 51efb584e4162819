use std::str::FromStr;

use anyhow::anyhow;
use serde::Deserialize;

#[derive(Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum BasemapKind {
    Street,
    Imagery,
}

impl FromStr for BasemapKind {
    type Err = anyhow::Error;

    fn from_str(name: &str) -> anyhow::Result<Self> {
        match name.trim().to_lowercase().as_str() {
            "street" | "osm" => Ok(BasemapKind::Street),
            "imagery" | "satellite" => Ok(BasemapKind::Imagery),
            _ => Err(anyhow!("Unknown basemap '{}'", name.trim())),
        }
    }
}

/// A selectable background made of one or more tile layers drawn in order.
#[derive(Debug, Clone, PartialEq)]
pub struct BasemapLayer {
    pub name: &'static str,
    pub kind: BasemapKind,
    pub tile_urls: Vec<&'static str>,
    pub attribution: &'static str,
    pub max_zoom: u8,
}

pub const STREET_BASEMAP: &str = "OpenStreetMap";
pub const IMAGERY_BASEMAP: &str = "Esri Satellite Hybrid";

pub fn default_basemaps() -> Vec<BasemapLayer> {
    vec![
        BasemapLayer {
            name: STREET_BASEMAP,
            kind: BasemapKind::Street,
            tile_urls: vec!["https://{s}.tile.openstreetmap.org/{z}/{x}/{y}.png"],
            attribution: "© OpenStreetMap contributors",
            max_zoom: 19,
        },
        BasemapLayer {
            name: IMAGERY_BASEMAP,
            kind: BasemapKind::Imagery,
            // Imagery with boundary and place labels on top.
            tile_urls: vec![
                "https://server.arcgisonline.com/ArcGIS/rest/services/World_Imagery/MapServer/tile/{z}/{y}/{x}",
                "https://server.arcgisonline.com/ArcGIS/rest/services/Reference/World_Boundaries_and_Places/MapServer/tile/{z}/{y}/{x}",
            ],
            attribution: "Imagery © Esri, Labels © Esri",
            max_zoom: 19,
        },
    ]
}

/// Installed basemaps, exactly one of which is active.
#[derive(Debug, Clone, PartialEq)]
pub struct BasemapSet {
    layers: Vec<BasemapLayer>,
    active: usize,
}

impl BasemapSet {
    /// The set starts on the imagery basemap when one is installed.
    pub fn new(layers: Vec<BasemapLayer>) -> Self {
        let active = layers
            .iter()
            .position(|layer| layer.kind == BasemapKind::Imagery)
            .unwrap_or(0);
        Self { layers, active }
    }

    #[cfg(test)]
    pub fn layers(&self) -> &[BasemapLayer] {
        &self.layers
    }

    pub fn active(&self) -> Option<&BasemapLayer> {
        self.layers.get(self.active)
    }

    /// Switch to the first installed basemap of `kind`. Returns false if there is none.
    pub fn select(&mut self, kind: BasemapKind) -> bool {
        match self.layers.iter().position(|layer| layer.kind == kind) {
            Some(index) => {
                self.active = index;
                true
            }
            None => false,
        }
    }
}

impl Default for BasemapSet {
    fn default() -> Self {
        Self::new(default_basemaps())
    }
}
