pub mod feature_cache;
pub mod snapshot_store;
