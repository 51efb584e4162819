pub mod events;
pub mod map_view;
pub mod placement;
pub mod tasks;
