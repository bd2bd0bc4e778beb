//! 2D point types.
//!
//! [`Point`] uses scaled integer coordinates (nanometers), [`PointF`] uses
//! unscaled floating-point millimeters. All board geometry is expressed in
//! integer coordinates; the floating-point type only exists at the boundary
//! to the clipping and triangulation backends.

use crate::{scale, unscale, Coord, CoordF};
use serde::{Deserialize, Serialize};
use std::ops::{Add, AddAssign, Neg, Sub, SubAssign};

/// A 2D point with scaled integer coordinates (1 unit = 1 nanometer).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Point {
    pub x: Coord,
    pub y: Coord,
}

/// A list of points.
pub type Points = Vec<Point>;

impl Point {
    /// Create a new point from integer nanometer coordinates.
    #[inline]
    pub const fn new(x: Coord, y: Coord) -> Self {
        Point { x, y }
    }

    /// The origin (0, 0).
    #[inline]
    pub const fn zero() -> Self {
        Point { x: 0, y: 0 }
    }

    /// Create a point from millimeter coordinates.
    #[inline]
    pub fn from_mm(x: CoordF, y: CoordF) -> Self {
        Point {
            x: scale(x),
            y: scale(y),
        }
    }

    /// Convert to an unscaled floating-point point (millimeters).
    #[inline]
    pub fn to_f(self) -> PointF {
        PointF {
            x: unscale(self.x),
            y: unscale(self.y),
        }
    }

    /// Squared Euclidean distance to another point.
    ///
    /// Computed in i128 so that board-scale nanometer coordinates cannot
    /// overflow.
    #[inline]
    pub fn distance_sq(self, other: Point) -> i128 {
        let dx = (other.x - self.x) as i128;
        let dy = (other.y - self.y) as i128;
        dx * dx + dy * dy
    }

    /// Euclidean distance to another point, in nanometers.
    #[inline]
    pub fn distance(self, other: Point) -> CoordF {
        (self.distance_sq(other) as CoordF).sqrt()
    }
}

impl Add for Point {
    type Output = Point;

    #[inline]
    fn add(self, rhs: Point) -> Point {
        Point::new(self.x + rhs.x, self.y + rhs.y)
    }
}

impl AddAssign for Point {
    #[inline]
    fn add_assign(&mut self, rhs: Point) {
        self.x += rhs.x;
        self.y += rhs.y;
    }
}

impl Sub for Point {
    type Output = Point;

    #[inline]
    fn sub(self, rhs: Point) -> Point {
        Point::new(self.x - rhs.x, self.y - rhs.y)
    }
}

impl SubAssign for Point {
    #[inline]
    fn sub_assign(&mut self, rhs: Point) {
        self.x -= rhs.x;
        self.y -= rhs.y;
    }
}

impl Neg for Point {
    type Output = Point;

    #[inline]
    fn neg(self) -> Point {
        Point::new(-self.x, -self.y)
    }
}

/// A 2D point with unscaled floating-point coordinates (millimeters).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PointF {
    pub x: CoordF,
    pub y: CoordF,
}

impl PointF {
    /// Create a new floating-point point.
    #[inline]
    pub const fn new(x: CoordF, y: CoordF) -> Self {
        PointF { x, y }
    }

    /// Convert to a scaled integer point.
    #[inline]
    pub fn to_scaled(self) -> Point {
        Point::from_mm(self.x, self.y)
    }
}
