//! Geographic primitives and the two coordinate reference systems the map pipeline works in.

mod bounds;
mod crs;
mod frame;
mod gps;

pub use crate::bounds::GPSBounds;
pub use crate::crs::Crs;
pub use crate::frame::MetricFrame;
pub use crate::gps::LonLat;

