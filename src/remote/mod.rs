pub mod feature_source;
