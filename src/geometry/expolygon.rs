//! Polygon-with-holes type.
//!
//! An [`ExPolygon`] is one filled region: an outer contour plus zero or more
//! hole contours. The plane fill produces one `ExPolygon` per disjoint copper
//! fragment, so a fragment's holes stay attached to the fragment they belong
//! to instead of floating as separate polygons.

use crate::geometry::{Point, Polygon};
use crate::CoordF;
use serde::{Deserialize, Serialize};

/// A polygon with holes (exterior contour + interior contours).
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ExPolygon {
    /// Outer boundary.
    pub contour: Polygon,
    /// Interior holes.
    pub holes: Vec<Polygon>,
}

/// A list of ExPolygons.
pub type ExPolygons = Vec<ExPolygon>;

impl ExPolygon {
    /// Create an ExPolygon with no holes.
    pub fn from_contour(contour: Polygon) -> Self {
        ExPolygon {
            contour,
            holes: Vec::new(),
        }
    }

    /// Create an ExPolygon with holes.
    pub fn with_holes(contour: Polygon, holes: Vec<Polygon>) -> Self {
        ExPolygon { contour, holes }
    }

    /// Whether the contour is missing or degenerate.
    pub fn is_empty(&self) -> bool {
        !self.contour.is_valid()
    }

    /// Net area in square millimeters (contour minus holes).
    pub fn area(&self) -> CoordF {
        let holes: CoordF = self.holes.iter().map(|h| h.area().abs()).sum();
        self.contour.area().abs() - holes
    }

    /// Whether the filled region contains the given point: inside the
    /// contour and not inside any hole.
    pub fn contains_point(&self, p: Point) -> bool {
        self.contour.contains_point(p) && !self.holes.iter().any(|h| h.contains_point(p))
    }
}
