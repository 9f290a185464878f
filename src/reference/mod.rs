// Reference data module - offline geographic lookups
// Maidenhead locator decoding used to place contacts on the map

pub mod grid_location;

pub use grid_location::{grid_to_latlon, grid_to_point, to_point_wkt};
