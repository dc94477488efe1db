//! How the map looks. Lengths are in typographic points (1/72 inch) unless noted otherwise.

pub const DEFAULT_DPI: f64 = 500.0;
pub const POINTS_PER_INCH: f64 = 72.0;

/// The printed width of the whole figure.
pub const FIGURE_WIDTH_INCHES: f64 = 16.5;
/// Map width divided by map height, in degrees.
pub const MAP_ASPECT: f64 = 1.57;
/// Extra degrees of context around the route on every side.
pub const MARGIN_DEGREES: f64 = 0.1;

pub const WATER_COLOR: &str = "#8aa6a3";
pub const ROUTE_COLOR: &str = "#3b2f25";
pub const STEP_COLOR: &str = "#9e5741";
pub const FOREST_COLOR: &str = "#6a845e";
pub const GRASS_COLOR: &str = "#adb88f";
pub const NATURE_ALPHA: f64 = 0.5;

pub const ROUTE_WIDTH: f64 = 3.0;
/// Area of a point-of-interest marker, in square points.
pub const MARKER_AREA: f64 = 130.0;
pub const MARKER_EDGE_WIDTH: f64 = 3.0;

/// From deep shadow to sunlit peaks.
pub const BEIGE_RAMP: [&str; 5] = ["#7f6a53", "#a89070", "#c8b28a", "#e0cfac", "#f3e7d3"];

/// Light comes from the northwest, 45 degrees above the horizon.
pub const LIGHT_AZIMUTH_DEGREES: f64 = 315.0;
pub const LIGHT_ALTITUDE_DEGREES: f64 = 45.0;
pub const VERTICAL_EXAGGERATION: f64 = 1.5;
