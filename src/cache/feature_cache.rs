use crate::{
    error::MapError,
    geofile::{
        feature::FeatureCollection,
        geojson::{collection_to_string, parse_feature_collection},
    },
};

use super::snapshot_store::SnapshotStore;

/// Durable mirror of the most recently fetched collection. Holds a single slot which is
/// overwritten wholesale on every store.
pub struct FeatureCache {
    store: Box<dyn SnapshotStore>,
    key: String,
}

impl FeatureCache {
    pub fn new(store: Box<dyn SnapshotStore>, key: &str) -> Self {
        Self {
            store,
            key: key.to_string(),
        }
    }

    /// Read the snapshot. Missing, unreadable and corrupt snapshots are all a cache miss.
    pub fn load(&self) -> Option<FeatureCollection> {
        let contents = match self.store.get_item(&self.key) {
            Ok(Some(contents)) if !contents.trim().is_empty() => contents,
            Ok(_) => {
                log::debug!("No cached snapshot under '{}'", self.key);
                return None;
            }
            Err(err) => {
                log::warn!("Could not read cached snapshot: {}", err);
                return None;
            }
        };
        match parse_feature_collection(&contents) {
            Ok(parsed) => {
                log::info!(
                    "Loaded {} features from cached snapshot",
                    parsed.collection.len()
                );
                Some(parsed.collection)
            }
            Err(err) => {
                log::warn!("Failed to parse cached snapshot, ignoring it: {}", err);
                None
            }
        }
    }

    pub fn store(&mut self, collection: &FeatureCollection) -> Result<(), MapError> {
        self.store
            .set_item(&self.key, &collection_to_string(collection))
    }
}
