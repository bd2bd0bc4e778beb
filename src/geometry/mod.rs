//! Geometry primitives.
//!
//! This module provides the fundamental geometric types used by the plane
//! fill and airwire builders:
//! - [`Point`] / [`PointF`] - 2D points with integer (scaled) and
//!   floating-point (unscaled) coordinates
//! - [`Polygon`] - closed polygon (single contour)
//! - [`ExPolygon`] - polygon with holes (exterior + interior contours)
//!
//! ## Coordinate System
//!
//! All board geometry uses scaled integer coordinates to avoid
//! floating-point precision issues. Coordinates are scaled by
//! `SCALING_FACTOR` (1,000,000), so 1 unit = 1 nanometer.
//!
//! - Use `scale()` to convert from mm to internal units
//! - Use `unscale()` to convert from internal units to mm

mod expolygon;
mod point;
mod polygon;

pub use expolygon::{ExPolygon, ExPolygons};
pub use point::{Point, PointF, Points};
pub use polygon::{Polygon, Polygons};
