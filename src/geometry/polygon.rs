//! Closed polygon type and curved-outline flattening.
//!
//! Board geometry stores no arcs: every curved copper outline (via barrels,
//! trace end caps) is flattened to line segments when constructed, with the
//! maximum deviation bounded by [`crate::MAX_ARC_TOLERANCE`]. That constant
//! is shared with the offset stages of the plane fill so all curved edges on
//! a board are approximated consistently.

use crate::geometry::Point;
use crate::{Coord, CoordF, MAX_ARC_TOLERANCE, SCALING_FACTOR};
use serde::{Deserialize, Serialize};

/// A closed polygon, stored as an open vertex list (the closing edge from the
/// last vertex back to the first is implicit).
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Polygon {
    points: Vec<Point>,
}

/// A list of polygons.
pub type Polygons = Vec<Polygon>;

impl Polygon {
    /// Create an empty polygon.
    pub fn new() -> Self {
        Polygon { points: Vec::new() }
    }

    /// Create a polygon from a vertex list.
    ///
    /// A trailing vertex equal to the first is dropped; closure is implicit.
    pub fn from_points(mut points: Vec<Point>) -> Self {
        if points.len() > 1 && points.first() == points.last() {
            points.pop();
        }
        Polygon { points }
    }

    /// The vertex list (without the implicit closing vertex).
    #[inline]
    pub fn points(&self) -> &[Point] {
        &self.points
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.points.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// Whether the polygon encloses a non-zero area.
    ///
    /// Degenerate polygons (fewer than 3 vertices, or all vertices collinear)
    /// are rejected by the fill pipeline rather than handed to the clipping
    /// backend.
    pub fn is_valid(&self) -> bool {
        self.points.len() >= 3 && self.doubled_area() != 0
    }

    /// Twice the signed area, in squared nanometers (shoelace formula).
    /// Positive for counter-clockwise orientation.
    pub fn doubled_area(&self) -> i128 {
        let n = self.points.len();
        if n < 3 {
            return 0;
        }
        let mut sum: i128 = 0;
        for i in 0..n {
            let p1 = self.points[i];
            let p2 = self.points[(i + 1) % n];
            sum += p1.x as i128 * p2.y as i128 - p2.x as i128 * p1.y as i128;
        }
        sum
    }

    /// Signed area in square millimeters.
    pub fn area(&self) -> CoordF {
        (self.doubled_area() as CoordF) / (2.0 * SCALING_FACTOR * SCALING_FACTOR)
    }

    /// Reverse the vertex order (flips orientation).
    pub fn reverse(&mut self) {
        self.points.reverse();
    }

    /// Return a copy translated by the given offset.
    pub fn translated(&self, offset: Point) -> Polygon {
        Polygon {
            points: self.points.iter().map(|&p| p + offset).collect(),
        }
    }

    /// Even-odd point-in-polygon test using exact integer arithmetic.
    ///
    /// Points exactly on the boundary may be classified either way.
    pub fn contains_point(&self, p: Point) -> bool {
        let n = self.points.len();
        if n < 3 {
            return false;
        }
        let mut inside = false;
        for i in 0..n {
            let p1 = self.points[i];
            let p2 = self.points[(i + 1) % n];
            if (p1.y > p.y) != (p2.y > p.y) {
                let dx = (p2.x - p1.x) as i128;
                let dy = (p2.y - p1.y) as i128;
                let lhs = (p.y - p1.y) as i128 * dx;
                let rhs = (p.x - p1.x) as i128 * dy;
                let to_left = if dy > 0 { rhs < lhs } else { rhs > lhs };
                if to_left {
                    inside = !inside;
                }
            }
        }
        inside
    }

    /// Construct a flattened circle with the given center and diameter.
    ///
    /// The segment count is chosen so the inscribed polygon deviates from the
    /// true circle by at most [`MAX_ARC_TOLERANCE`].
    pub fn circle(center: Point, diameter: Coord) -> Polygon {
        let radius = (diameter / 2).max(1);
        let n = arc_segment_count(radius);
        let r = radius as CoordF;
        let points = (0..n)
            .map(|i| {
                let angle = (i as CoordF) * std::f64::consts::TAU / (n as CoordF);
                Point::new(
                    center.x + (r * angle.cos()).round() as Coord,
                    center.y + (r * angle.sin()).round() as Coord,
                )
            })
            .collect();
        Polygon { points }
    }

    /// Construct the outline of a stroked line segment: a rectangle with
    /// semicircular end caps (an obround). Used for trace copper and for
    /// outline strokes of board polygons.
    ///
    /// A zero-length segment degenerates to a circle.
    pub fn thick_segment(start: Point, end: Point, width: Coord) -> Polygon {
        if start == end {
            return Polygon::circle(start, width);
        }
        let half = (width / 2).max(1);
        let r = half as CoordF;
        let dir = ((end.y - start.y) as CoordF).atan2((end.x - start.x) as CoordF);
        let cap_segments = (arc_segment_count(half) / 2).max(2);

        let mut points = Vec::with_capacity(2 * (cap_segments + 1));
        // End cap: from dir - 90° to dir + 90°.
        for i in 0..=cap_segments {
            let angle = dir - std::f64::consts::FRAC_PI_2
                + (i as CoordF) * std::f64::consts::PI / (cap_segments as CoordF);
            points.push(Point::new(
                end.x + (r * angle.cos()).round() as Coord,
                end.y + (r * angle.sin()).round() as Coord,
            ));
        }
        // Start cap: from dir + 90° to dir + 270°.
        for i in 0..=cap_segments {
            let angle = dir + std::f64::consts::FRAC_PI_2
                + (i as CoordF) * std::f64::consts::PI / (cap_segments as CoordF);
            points.push(Point::new(
                start.x + (r * angle.cos()).round() as Coord,
                start.y + (r * angle.sin()).round() as Coord,
            ));
        }
        Polygon::from_points(points)
    }
}

/// Number of segments needed to flatten a full circle of the given radius
/// while keeping the sagitta below [`MAX_ARC_TOLERANCE`].
fn arc_segment_count(radius: Coord) -> usize {
    if radius <= MAX_ARC_TOLERANCE {
        return 8;
    }
    let ratio = 1.0 - (MAX_ARC_TOLERANCE as CoordF) / (radius as CoordF);
    let max_step = 2.0 * ratio.acos();
    ((std::f64::consts::TAU / max_step).ceil() as usize).max(8)
}
