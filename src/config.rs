use std::{fs::read_to_string, path::Path, path::PathBuf};

use anyhow::anyhow;
use serde::Deserialize;

use crate::map::basemap::BasemapKind;

#[derive(Deserialize, Debug, Clone, PartialEq)]
pub struct RemoteConfig {
    #[serde(default = "default_read_url")]
    pub read_url: String,
    #[serde(default = "default_write_url")]
    pub write_url: String,
    /// Applied to every request so an in-flight refresh always resolves.
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

impl Default for RemoteConfig {
    fn default() -> Self {
        Self {
            read_url: default_read_url(),
            write_url: default_write_url(),
            timeout_secs: default_timeout_secs(),
        }
    }
}

#[derive(Deserialize, Debug, Clone, PartialEq)]
pub struct ViewportConfig {
    pub center_lat: f64,
    pub center_lng: f64,
    pub zoom: u8,
}

impl Default for ViewportConfig {
    fn default() -> Self {
        // Centre of India.
        Self {
            center_lat: 20.5937,
            center_lng: 78.9629,
            zoom: 5,
        }
    }
}

#[derive(Deserialize, Debug)]
pub struct Config {
    #[serde(default)]
    pub remote: RemoteConfig,
    pub data_dir: PathBuf,
    #[serde(default = "default_cache_key")]
    pub cache_key: String,
    #[serde(default)]
    pub viewport: ViewportConfig,
    #[serde(default = "default_candidate_zoom")]
    pub candidate_zoom: u8,
    /// "lat,lng" shown as a candidate location right after startup.
    #[serde(default)]
    pub initial_coordinates: Option<String>,
    /// Starting background, `street` or `imagery`. Imagery when unset.
    #[serde(default)]
    pub basemap: Option<BasemapKind>,
}

impl Config {
    pub fn load(config_filepath: &Path) -> anyhow::Result<Self> {
        if !config_filepath.exists() {
            return Err(anyhow!("Config file {:?} not found", config_filepath));
        }
        let config_contents = read_to_string(config_filepath)?;
        Self::from_yaml_str(&config_contents)
    }

    pub fn from_yaml_str(contents: &str) -> anyhow::Result<Self> {
        Ok(serde_yaml::from_str(contents)?)
    }

    pub fn snapshot_dir(&self) -> PathBuf {
        self.data_dir.join("cache")
    }

    pub fn layer_export_path(&self) -> PathBuf {
        self.data_dir.join("map_layer.geojson")
    }
}

fn default_read_url() -> String {
    "http://localhost:8000/geojson".to_string()
}

fn default_write_url() -> String {
    "http://localhost:8000/save".to_string()
}

fn default_timeout_secs() -> u64 {
    15
}

fn default_cache_key() -> String {
    "geojson".to_string()
}

fn default_candidate_zoom() -> u8 {
    12
}
