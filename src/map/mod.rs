pub mod basemap;
pub mod geojson_renderer;
pub mod marker_layer;
pub mod popup;
pub mod renderer;
