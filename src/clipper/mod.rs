//! Polygon boolean and offset operations.
//!
//! This module wraps the geo-clipper library and provides the polygon set
//! operations the plane fill pipeline is built from:
//! - Boolean operations (union, intersection, difference)
//! - Offset operations (grow, shrink)
//! - Morphological opening (shrink-then-grow), used for minimum-width
//!   enforcement
//!
//! All public functions operate on the crate's scaled integer types and
//! convert to geo's floating-point types at the boundary. The conversion
//! factor handed to clipper is chosen so clipper's internal integer grid is
//! exactly the nanometer grid, so no precision is lost crossing the boundary.

use crate::geometry::{ExPolygon, ExPolygons, Point, Polygon};
use crate::{unscale, Coord, CoordF, MAX_ARC_TOLERANCE, SCALING_FACTOR};
use geo::{Coord as GeoCoord, LineString, MultiPolygon, Polygon as GeoPolygon};
use geo_clipper::{Clipper, EndType, JoinType};

/// Clipper integerization factor: 1 clipper unit = 1 nanometer.
const CLIPPER_FACTOR: CoordF = SCALING_FACTOR;

/// Round-join arc tolerance for offset operations, in millimeters.
fn round_join() -> JoinType {
    JoinType::Round(unscale(MAX_ARC_TOLERANCE))
}

// ============================================================================
// Conversions
// ============================================================================

/// Convert a contour to a geo ring, closing it and normalizing to
/// counter-clockwise orientation for outer rings (clipper's non-zero fill
/// rule is sensitive to ring orientation).
fn contour_to_ring(poly: &Polygon, outer: bool) -> LineString<f64> {
    let mut points: Vec<Point> = poly.points().to_vec();
    let ccw = poly.doubled_area() >= 0;
    if ccw != outer {
        points.reverse();
    }
    let mut ring: Vec<GeoCoord<f64>> = points
        .iter()
        .map(|p| GeoCoord {
            x: unscale(p.x),
            y: unscale(p.y),
        })
        .collect();
    if let (Some(first), Some(last)) = (ring.first(), ring.last()) {
        if first != last {
            ring.push(*first);
        }
    }
    LineString::new(ring)
}

/// Convert our Polygon to geo's Polygon type (no holes).
fn polygon_to_geo(poly: &Polygon) -> GeoPolygon<f64> {
    GeoPolygon::new(contour_to_ring(poly, true), vec![])
}

/// Convert our ExPolygon to geo's Polygon type (with holes).
fn expolygon_to_geo(expoly: &ExPolygon) -> GeoPolygon<f64> {
    let holes = expoly
        .holes
        .iter()
        .map(|h| contour_to_ring(h, false))
        .collect();
    GeoPolygon::new(contour_to_ring(&expoly.contour, true), holes)
}

/// Convert a geo ring back to our Polygon type.
fn ring_to_polygon(ring: &LineString<f64>) -> Polygon {
    let points: Vec<Point> = ring.coords().map(|c| Point::from_mm(c.x, c.y)).collect();
    // from_points drops the closing vertex.
    Polygon::from_points(points)
}

/// Convert geo's Polygon to our ExPolygon type (with holes).
fn geo_to_expolygon(geo_poly: &GeoPolygon<f64>) -> ExPolygon {
    let contour = ring_to_polygon(geo_poly.exterior());
    let holes = geo_poly.interiors().iter().map(ring_to_polygon).collect();
    ExPolygon::with_holes(contour, holes)
}

/// Convert geo's MultiPolygon to our ExPolygons type.
fn geo_multi_to_expolygons(multi: &MultiPolygon<f64>) -> ExPolygons {
    multi
        .0
        .iter()
        .map(geo_to_expolygon)
        .filter(|e| !e.is_empty())
        .collect()
}

/// Convert our Polygons to geo's MultiPolygon.
fn polygons_to_geo_multi(polys: &[Polygon]) -> MultiPolygon<f64> {
    MultiPolygon::new(polys.iter().map(polygon_to_geo).collect())
}

/// Convert our ExPolygons to geo's MultiPolygon.
fn expolygons_to_geo_multi(expolys: &[ExPolygon]) -> MultiPolygon<f64> {
    MultiPolygon::new(expolys.iter().map(expolygon_to_geo).collect())
}

// ============================================================================
// Boolean Operations
// ============================================================================

/// Merge a set of potentially overlapping or self-intersecting contours into
/// disjoint filled regions.
pub fn union_polygons(polygons: &[Polygon]) -> ExPolygons {
    if polygons.is_empty() {
        return vec![];
    }
    let subject = polygons_to_geo_multi(polygons);
    let empty = MultiPolygon::<f64>::new(vec![]);
    let result = subject.union(&empty, CLIPPER_FACTOR);
    geo_multi_to_expolygons(&result)
}

/// Compute the intersection of two sets of polygons.
pub fn intersection(subject: &[ExPolygon], clip: &[ExPolygon]) -> ExPolygons {
    if subject.is_empty() || clip.is_empty() {
        return vec![];
    }
    let subject_geo = expolygons_to_geo_multi(subject);
    let clip_geo = expolygons_to_geo_multi(clip);
    let result = subject_geo.intersection(&clip_geo, CLIPPER_FACTOR);
    geo_multi_to_expolygons(&result)
}

/// Compute the difference of two sets of polygons (subject - clip).
///
/// The clip set is applied in one batched pass; subtracting obstacles
/// one-by-one can give different (but both valid) results, so the pipeline
/// always collects all cutouts first and subtracts once.
pub fn difference(subject: &[ExPolygon], clip: &[ExPolygon]) -> ExPolygons {
    if subject.is_empty() {
        return vec![];
    }
    if clip.is_empty() {
        return subject.to_vec();
    }
    let subject_geo = expolygons_to_geo_multi(subject);
    let clip_geo = expolygons_to_geo_multi(clip);
    let result = subject_geo.difference(&clip_geo, CLIPPER_FACTOR);
    geo_multi_to_expolygons(&result)
}

/// Check whether two polygon sets overlap.
pub fn overlaps(a: &[ExPolygon], b: &[ExPolygon]) -> bool {
    !intersection(a, b).is_empty()
}

// ============================================================================
// Offset Operations
// ============================================================================

/// Offset multiple ExPolygons by a given distance in nanometers.
///
/// Positive delta inflates (grows) the polygons, negative delta deflates
/// (shrinks) them. Corners are rounded with the crate-wide arc tolerance.
pub fn offset_expolygons(expolygons: &[ExPolygon], delta: Coord) -> ExPolygons {
    if expolygons.is_empty() {
        return vec![];
    }
    let geo_multi = expolygons_to_geo_multi(expolygons);
    let result = geo_multi.offset(
        unscale(delta),
        round_join(),
        EndType::ClosedPolygon,
        CLIPPER_FACTOR,
    );
    geo_multi_to_expolygons(&result)
}

/// Shrink (inset) ExPolygons by a given distance in nanometers.
pub fn shrink(expolygons: &[ExPolygon], distance: Coord) -> ExPolygons {
    offset_expolygons(expolygons, -distance.abs())
}

/// Grow (outset) ExPolygons by a given distance in nanometers.
pub fn grow(expolygons: &[ExPolygon], distance: Coord) -> ExPolygons {
    offset_expolygons(expolygons, distance.abs())
}

/// Morphological opening: shrink then grow by the same amount.
///
/// Removes every region narrower than twice the distance while leaving wider
/// regions (up to corner rounding) unchanged. The plane fill uses this with
/// half the minimum trace width to eliminate slivers that would violate the
/// minimum-width rule.
pub fn opening(expolygons: &[ExPolygon], distance: Coord) -> ExPolygons {
    if expolygons.is_empty() || distance <= 0 {
        return expolygons.to_vec();
    }
    let shrunk = shrink(expolygons, distance);
    if shrunk.is_empty() {
        return vec![];
    }
    grow(&shrunk, distance)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rect(x0: Coord, y0: Coord, x1: Coord, y1: Coord) -> Polygon {
        Polygon::from_points(vec![
            Point::new(x0, y0),
            Point::new(x1, y0),
            Point::new(x1, y1),
            Point::new(x0, y1),
        ])
    }

    fn ex_rect(x0: Coord, y0: Coord, x1: Coord, y1: Coord) -> ExPolygon {
        ExPolygon::from_contour(rect(x0, y0, x1, y1))
    }

    fn total_area(expolys: &[ExPolygon]) -> CoordF {
        expolys.iter().map(|e| e.area()).sum()
    }

    #[test]
    fn test_union_merges_overlapping() {
        let result = union_polygons(&[
            rect(0, 0, 2_000_000, 2_000_000),
            rect(1_000_000, 0, 3_000_000, 2_000_000),
        ]);
        assert_eq!(result.len(), 1);
        assert!((total_area(&result) - 6.0).abs() < 1e-6);
    }

    #[test]
    fn test_union_keeps_disjoint() {
        let result = union_polygons(&[
            rect(0, 0, 1_000_000, 1_000_000),
            rect(5_000_000, 0, 6_000_000, 1_000_000),
        ]);
        assert_eq!(result.len(), 2);
    }

    #[test]
    fn test_difference_punches_hole() {
        let subject = vec![ex_rect(0, 0, 10_000_000, 10_000_000)];
        let clip = vec![ex_rect(4_000_000, 4_000_000, 6_000_000, 6_000_000)];
        let result = difference(&subject, &clip);
        assert_eq!(result.len(), 1);
        assert_eq!(result[0].holes.len(), 1);
        assert!((total_area(&result) - 96.0).abs() < 1e-6);
    }

    #[test]
    fn test_difference_splits_region() {
        let subject = vec![ex_rect(0, 0, 10_000_000, 10_000_000)];
        // Full-height vertical cut splits the square in two.
        let clip = vec![ex_rect(4_000_000, -1_000_000, 6_000_000, 11_000_000)];
        let result = difference(&subject, &clip);
        assert_eq!(result.len(), 2);
        assert!((total_area(&result) - 80.0).abs() < 1e-6);
    }

    #[test]
    fn test_intersection() {
        let a = vec![ex_rect(0, 0, 2_000_000, 2_000_000)];
        let b = vec![ex_rect(1_000_000, 1_000_000, 3_000_000, 3_000_000)];
        let result = intersection(&a, &b);
        assert_eq!(result.len(), 1);
        assert!((total_area(&result) - 1.0).abs() < 1e-6);
        assert!(overlaps(&a, &b));
        assert!(!overlaps(&a, &[ex_rect(5_000_000, 0, 6_000_000, 1_000_000)]));
    }

    #[test]
    fn test_shrink_grow() {
        let subject = vec![ex_rect(0, 0, 10_000_000, 10_000_000)];
        let shrunk = shrink(&subject, 1_000_000);
        assert_eq!(shrunk.len(), 1);
        assert!((total_area(&shrunk) - 64.0).abs() < 1e-3);
        let grown = grow(&subject, 1_000_000);
        // Rounded corners keep the grown area slightly below the full
        // 12x12 square.
        assert!(total_area(&grown) > 140.0);
        assert!(total_area(&grown) < 144.0);
    }

    #[test]
    fn test_opening_removes_sliver() {
        // A wide region connected to a 0.4mm-wide sliver; opening by 0.5mm
        // (per side) must keep the wide part and delete the sliver.
        let subject = union_polygons(&[
            rect(0, 0, 5_000_000, 5_000_000),
            rect(5_000_000, 2_000_000, 12_000_000, 2_400_000),
        ]);
        let result = opening(&subject, 500_000);
        assert_eq!(result.len(), 1);
        for e in &result {
            assert!(!e.contains_point(Point::new(11_000_000, 2_200_000)));
            assert!(e.contains_point(Point::new(2_500_000, 2_500_000)));
        }
    }

    #[test]
    fn test_opening_eliminates_too_narrow_region() {
        let subject = vec![ex_rect(0, 0, 10_000_000, 400_000)];
        let result = opening(&subject, 500_000);
        assert!(result.is_empty());
    }
}
