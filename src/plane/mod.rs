//! Plane fill fragment builder.
//!
//! Computes the filled copper areas ("fragments") of every plane on a board.
//! For each plane the pipeline runs five stages:
//!
//! 1. Seed from the user-drawn plane outline
//! 2. Clip to the board outline, inset by the plane's clearance
//! 3. Subtract all obstacles (other-net pads, vias, traces,
//!    previously-built planes and non-plated holes, each expanded by the
//!    applicable clearance) in one batched difference pass
//! 4. Enforce the minimum trace width with a morphological opening
//! 5. Extract one fragment per disjoint region and, unless the plane keeps
//!    orphans, drop fragments with no electrical connection to the net
//!
//! Planes are processed in a deterministic order: greater priority first,
//! ties broken by plane id. Each plane subtracts the already-built fragments
//! of earlier (higher-precedence) planes, so overlapping planes never
//! produce overlapping copper and the result is independent of the order in
//! which planes appear in the snapshot.
//!
//! The builder carries an abort flag so a long build superseded by a newer
//! edit can be cancelled; an aborted run reports `finished = false` and
//! [`PlaneBuildResult::apply_to`] refuses to apply its partial results.

use crate::board::{BoardSnapshot, Plane, PlaneId};
use crate::clipper;
use crate::geometry::{ExPolygon, ExPolygons, Point, Polygon};
use log::{debug, warn};
use std::collections::BTreeMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Instant;

/// Result of a plane build run.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PlaneBuildResult {
    /// Computed fragments per plane, keyed by plane id.
    pub fragments: BTreeMap<PlaneId, ExPolygons>,
    /// False if the run was aborted before all planes were built.
    pub finished: bool,
}

impl PlaneBuildResult {
    /// Store the computed fragments back onto the given planes.
    ///
    /// All-or-nothing: an unfinished (aborted) result leaves every plane
    /// untouched. Returns whether the result was applied.
    pub fn apply_to(&self, planes: &mut [Plane]) -> bool {
        if !self.finished {
            return false;
        }
        for plane in planes.iter_mut() {
            if let Some(fragments) = self.fragments.get(&plane.id) {
                plane.fragments = fragments.clone();
            }
        }
        true
    }
}

/// Builds the fill fragments of all planes of a board snapshot.
#[derive(Debug, Default)]
pub struct PlaneFragmentsBuilder {
    abort: AtomicBool,
}

impl PlaneFragmentsBuilder {
    pub fn new() -> Self {
        PlaneFragmentsBuilder {
            abort: AtomicBool::new(false),
        }
    }

    /// Request cancellation of a run in progress. Safe to call from another
    /// thread when the builder is shared (e.g. behind an `Arc`).
    pub fn abort(&self) {
        self.abort.store(true, Ordering::Relaxed);
    }

    /// Build the fragments of every plane in the snapshot.
    ///
    /// Pure with respect to the snapshot; the result must be applied by the
    /// caller. Running twice on the same snapshot produces identical
    /// results.
    ///
    /// # Panics
    ///
    /// Panics if a plane carries a non-positive minimum width or a negative
    /// clearance; those are caller bugs, not data conditions.
    pub fn run(&self, board: &BoardSnapshot) -> PlaneBuildResult {
        let start = Instant::now();
        debug!("Start calculating areas of {} plane(s)...", board.planes.len());

        // Merged board area; the even-odd style fill rule of the union lets
        // outline polygons describe boards with internal cutouts.
        let board_area = clipper::union_polygons(&board.outline);

        // Fill order: greater priority first, ties broken by id. The order
        // must be a strict total order over all planes, otherwise planes
        // with equal priority would fill in snapshot order and the result
        // would depend on it.
        let mut order: Vec<&Plane> = board.planes.iter().collect();
        order.sort_by(|a, b| {
            b.priority
                .cmp(&a.priority)
                .then_with(|| b.id.cmp(&a.id))
        });

        let mut result = PlaneBuildResult::default();
        let mut aborted = false;
        for (pos, &plane) in order.iter().enumerate() {
            if self.abort.load(Ordering::Relaxed) {
                aborted = true;
                break;
            }
            assert!(
                plane.min_width > 0,
                "plane {:?} has a non-positive minimum width",
                plane.id
            );
            assert!(
                plane.min_clearance >= 0,
                "plane {:?} has a negative clearance",
                plane.id
            );
            let fragments =
                build_plane(plane, &order[..pos], board, &board_area, &result.fragments);
            result.fragments.insert(plane.id, fragments);
        }

        if aborted {
            debug!(
                "Aborted calculating plane areas after {:?}.",
                start.elapsed()
            );
        } else {
            result.finished = true;
            debug!("Calculated plane areas in {:?}.", start.elapsed());
        }
        result
    }
}

/// Build the fragments of a single plane, subtracting the already-built
/// fragments of all higher-precedence planes.
fn build_plane(
    plane: &Plane,
    built_before: &[&Plane],
    board: &BoardSnapshot,
    board_area: &ExPolygons,
    built: &BTreeMap<PlaneId, ExPolygons>,
) -> ExPolygons {
    if !plane.outline.is_valid() {
        return vec![];
    }

    let mut removed: ExPolygons = Vec::new();
    let mut connected: ExPolygons = Vec::new();

    // Higher-precedence planes of other nets on the same layer: their
    // already-built fragments, expanded by the larger of both planes'
    // clearances.
    for other in built_before {
        if other.layer == plane.layer && other.net != plane.net {
            if let Some(fragments) = built.get(&other.id) {
                let clearance = plane.min_clearance.max(other.min_clearance);
                removed.extend(clipper::grow(fragments, clearance));
            }
        }
    }

    // Vias exist on every layer. Same-net vias always connect solid,
    // regardless of the plane's connect style: vias are not soldered, so
    // thermal relief would serve no purpose.
    for via in &board.vias {
        if via.diameter <= 0 {
            warn!("Skipping via with degenerate diameter at {:?}", via.position);
            continue;
        }
        if via.net == Some(plane.net) {
            let circle = Polygon::circle(via.position, via.diameter);
            connected.push(ExPolygon::from_contour(circle));
        } else {
            let cutout =
                Polygon::circle(via.position, via.diameter + 2 * plane.min_clearance);
            removed.push(ExPolygon::from_contour(cutout));
        }
    }

    // Non-plated holes go through every layer and carry no net; every
    // plane keeps clear of them.
    for hole in &board.holes {
        if hole.diameter <= 0 {
            warn!("Skipping hole with degenerate diameter at {:?}", hole.start);
            continue;
        }
        let cutout = Polygon::thick_segment(
            hole.start,
            hole.end,
            hole.diameter + 2 * plane.min_clearance,
        );
        removed.push(ExPolygon::from_contour(cutout));
    }

    // Traces on the plane's layer, stroked to their copper outline.
    for trace in &board.traces {
        if trace.layer != plane.layer {
            continue;
        }
        let width = trace.width.max(1);
        if trace.net == Some(plane.net) {
            let stroke = Polygon::thick_segment(trace.start, trace.end, width);
            connected.push(ExPolygon::from_contour(stroke));
        } else {
            let stroke = Polygon::thick_segment(
                trace.start,
                trace.end,
                width + 2 * plane.min_clearance,
            );
            removed.push(ExPolygon::from_contour(stroke));
        }
    }

    // Pads whose copper occupies this layer. Different-net pads are
    // subtracted with the larger of the plane clearance and the pad's own
    // clearance rule. Thermal-relief spoke geometry would be inserted here
    // for same-net pads once implemented; until then every connect style
    // fills solid.
    for pad in &board.pads {
        if !pad.scope.includes(plane.layer) {
            continue;
        }
        let shapes: ExPolygons = pad
            .copper
            .iter()
            .filter(|outline| {
                if outline.is_valid() {
                    true
                } else {
                    warn!("Skipping degenerate pad outline at {:?}", pad.position);
                    false
                }
            })
            .map(|outline| ExPolygon::from_contour(outline.clone()))
            .collect();
        if shapes.is_empty() {
            continue;
        }
        if pad.net == Some(plane.net) {
            connected.extend(shapes);
        } else {
            let clearance = plane.min_clearance.max(pad.clearance);
            removed.extend(clipper::grow(&shapes, clearance));
        }
    }

    // Stage 1: seed from the plane outline; the union resolves concave and
    // self-intersecting outlines into filled regions.
    let seed = clipper::union_polygons(&[plane.outline.clone()]);

    // Stage 2: clip to the board area, inset by the clearance so the fill
    // keeps its distance from the board edge too.
    let board_clip = clipper::shrink(board_area, plane.min_clearance);
    let mut fragments = clipper::intersection(&seed, &board_clip);

    // Stage 3: one batched subtraction of all cutouts.
    fragments = clipper::difference(&fragments, &removed);

    // Stage 4: minimum width. Shrinking by half the minimum width deletes
    // every region narrower than it; growing back restores the survivors.
    fragments = clipper::opening(&fragments, plane.min_width / 2);

    // Stage 5: orphan removal. A fragment that touches no same-net copper
    // is a floating island and usually unwanted.
    if !plane.keep_orphans {
        fragments.retain(|fragment| clipper::overlaps(std::slice::from_ref(fragment), &connected));
    }

    canonicalize(&mut fragments);
    fragments
}

/// Rotate every contour so its lexicographically smallest vertex comes
/// first and sort fragments by that vertex, so repeated builds produce
/// byte-identical output regardless of clipper-internal ordering.
fn canonicalize(fragments: &mut ExPolygons) {
    for fragment in fragments.iter_mut() {
        fragment.contour = rotate_to_min(&fragment.contour);
        for hole in fragment.holes.iter_mut() {
            *hole = rotate_to_min(hole);
        }
        fragment
            .holes
            .sort_by_key(|h| h.points().first().copied().unwrap_or(Point::zero()));
    }
    fragments.sort_by_key(|f| f.contour.points().first().copied().unwrap_or(Point::zero()));
}

fn rotate_to_min(polygon: &Polygon) -> Polygon {
    let points = polygon.points();
    if points.is_empty() {
        return polygon.clone();
    }
    let min_index = points
        .iter()
        .enumerate()
        .min_by_key(|(_, p)| **p)
        .map(|(i, _)| i)
        .unwrap_or(0);
    let mut rotated = points.to_vec();
    rotated.rotate_left(min_index);
    Polygon::from_points(rotated)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::board::{ConnectStyle, Hole, Layer, LayerScope, NetId, Pad, Trace, Via};
    use crate::Coord;

    const MM: Coord = 1_000_000;

    fn rect(x0: Coord, y0: Coord, x1: Coord, y1: Coord) -> Polygon {
        Polygon::from_points(vec![
            Point::new(x0, y0),
            Point::new(x1, y0),
            Point::new(x1, y1),
            Point::new(x0, y1),
        ])
    }

    fn plane(id: u64, net: u32, outline: Polygon) -> Plane {
        Plane {
            id: PlaneId(id),
            layer: Layer::Top,
            net: NetId(net),
            outline,
            min_width: 200_000,      // 0.2mm
            min_clearance: 200_000,  // 0.2mm
            priority: 0,
            connect_style: ConnectStyle::Solid,
            keep_orphans: true,
            fragments: vec![],
        }
    }

    fn board_20x20() -> BoardSnapshot {
        BoardSnapshot {
            outline: vec![rect(0, 0, 20 * MM, 20 * MM)],
            ..Default::default()
        }
    }

    fn pad_at(net: u32, x: Coord, y: Coord) -> Pad {
        Pad {
            net: Some(NetId(net)),
            position: Point::new(x, y),
            scope: LayerScope::All,
            copper: vec![rect(x - MM / 2, y - MM / 2, x + MM / 2, y + MM / 2)],
            clearance: 200_000,
        }
    }

    fn fragments_of(result: &PlaneBuildResult, id: u64) -> &ExPolygons {
        result.fragments.get(&PlaneId(id)).unwrap()
    }

    fn contains(fragments: &[ExPolygon], p: Point) -> bool {
        fragments.iter().any(|f| f.contains_point(p))
    }

    #[test]
    fn test_empty_outline_yields_no_fragments() {
        let mut board = board_20x20();
        board.planes.push(plane(1, 1, Polygon::new()));
        let result = PlaneFragmentsBuilder::new().run(&board);
        assert!(result.finished);
        assert!(fragments_of(&result, 1).is_empty());
    }

    #[test]
    fn test_fill_contained_in_board_outline() {
        let mut board = board_20x20();
        // Plane outline extends far past the board edge.
        board.planes.push(plane(1, 1, rect(-10 * MM, -10 * MM, 30 * MM, 30 * MM)));
        let result = PlaneFragmentsBuilder::new().run(&board);
        let fragments = fragments_of(&result, 1);
        assert_eq!(fragments.len(), 1);
        for fragment in fragments {
            for p in fragment.contour.points() {
                assert!(p.x >= 0 && p.x <= 20 * MM, "x out of board: {}", p.x);
                assert!(p.y >= 0 && p.y <= 20 * MM, "y out of board: {}", p.y);
            }
        }
        // Board-edge clearance: the fill stays min_clearance away from the
        // outline.
        assert!(!contains(fragments, Point::new(100_000, 10 * MM)));
        assert!(contains(fragments, Point::new(MM, 10 * MM)));
    }

    #[test]
    fn test_other_net_via_subtracted_with_clearance() {
        let mut board = board_20x20();
        board.planes.push(plane(1, 1, rect(0, 0, 20 * MM, 20 * MM)));
        board.vias.push(Via {
            net: Some(NetId(2)),
            position: Point::new(10 * MM, 10 * MM),
            diameter: MM,
        });
        let result = PlaneFragmentsBuilder::new().run(&board);
        let fragments = fragments_of(&result, 1);
        // Via center and a point inside the clearance ring are cut out.
        assert!(!contains(fragments, Point::new(10 * MM, 10 * MM)));
        assert!(!contains(fragments, Point::new(10 * MM + 600_000, 10 * MM)));
        // Just outside the expanded cutout the fill remains.
        assert!(contains(fragments, Point::new(10 * MM + 900_000, 10 * MM)));
    }

    #[test]
    fn test_same_net_via_not_subtracted() {
        let mut board = board_20x20();
        board.planes.push(plane(1, 1, rect(0, 0, 20 * MM, 20 * MM)));
        board.vias.push(Via {
            net: Some(NetId(1)),
            position: Point::new(10 * MM, 10 * MM),
            diameter: MM,
        });
        let result = PlaneFragmentsBuilder::new().run(&board);
        assert!(contains(fragments_of(&result, 1), Point::new(10 * MM, 10 * MM)));
    }

    #[test]
    fn test_hole_subtracted_regardless_of_net() {
        // Holes carry no net, so even a same-net plane must keep clear.
        let mut board = board_20x20();
        board.planes.push(plane(1, 1, rect(0, 0, 20 * MM, 20 * MM)));
        board.holes.push(Hole {
            start: Point::new(10 * MM, 10 * MM),
            end: Point::new(10 * MM, 10 * MM),
            diameter: MM,
        });
        let result = PlaneFragmentsBuilder::new().run(&board);
        let fragments = fragments_of(&result, 1);
        // Drill center and the clearance ring are cut out.
        assert!(!contains(fragments, Point::new(10 * MM, 10 * MM)));
        assert!(!contains(fragments, Point::new(10 * MM + 600_000, 10 * MM)));
        assert!(contains(fragments, Point::new(10 * MM + 900_000, 10 * MM)));
    }

    #[test]
    fn test_slot_hole_cuts_along_its_path() {
        let mut board = board_20x20();
        board.planes.push(plane(1, 1, rect(0, 0, 20 * MM, 20 * MM)));
        board.holes.push(Hole {
            start: Point::new(5 * MM, 10 * MM),
            end: Point::new(8 * MM, 10 * MM),
            diameter: MM,
        });
        let result = PlaneFragmentsBuilder::new().run(&board);
        let fragments = fragments_of(&result, 1);
        // The whole slot path is cut out, not just the endpoints.
        assert!(!contains(fragments, Point::new(6_500_000, 10 * MM)));
        assert!(!contains(fragments, Point::new(6_500_000, 10 * MM + 600_000)));
        assert!(contains(fragments, Point::new(6_500_000, 10 * MM + 900_000)));
    }

    #[test]
    fn test_pad_clearance_dominates_plane_clearance() {
        // 1x1mm pad of another net at the board center. With a pad-specific
        // clearance of 1mm the cutout edge sits 1.5mm from the center; the
        // plane's own 0.2mm clearance alone would put it at 0.7mm.
        let mut board = board_20x20();
        board.planes.push(plane(1, 1, rect(0, 0, 20 * MM, 20 * MM)));
        let mut pad = pad_at(2, 10 * MM, 10 * MM);
        pad.clearance = MM;
        board.pads.push(pad);
        let result = PlaneFragmentsBuilder::new().run(&board);
        let fragments = fragments_of(&result, 1);
        assert!(!contains(fragments, Point::new(10 * MM + 1_200_000, 10 * MM)));
        assert!(contains(fragments, Point::new(10 * MM + 1_800_000, 10 * MM)));

        // A pad clearance below the plane's is overridden by it.
        board.pads[0].clearance = 0;
        let result = PlaneFragmentsBuilder::new().run(&board);
        let fragments = fragments_of(&result, 1);
        assert!(contains(fragments, Point::new(10 * MM + 1_200_000, 10 * MM)));
        assert!(!contains(fragments, Point::new(10 * MM + 600_000, 10 * MM)));
    }

    #[test]
    fn test_smt_pad_only_obstructs_its_layer() {
        let mut board = board_20x20();
        board.planes.push(plane(1, 1, rect(0, 0, 20 * MM, 20 * MM)));
        let mut bottom_plane = plane(2, 1, rect(0, 0, 20 * MM, 20 * MM));
        bottom_plane.layer = Layer::Bottom;
        board.planes.push(bottom_plane);
        let mut pad = pad_at(2, 10 * MM, 10 * MM);
        pad.scope = LayerScope::Single(Layer::Bottom);
        board.pads.push(pad);
        let result = PlaneFragmentsBuilder::new().run(&board);
        // Top plane is untouched, bottom plane has the cutout.
        assert!(contains(fragments_of(&result, 1), Point::new(10 * MM, 10 * MM)));
        assert!(!contains(fragments_of(&result, 2), Point::new(10 * MM, 10 * MM)));
    }

    #[test]
    fn test_min_width_splits_or_keeps_corridor() {
        // Two 8x8mm squares joined by a 0.3mm-wide corridor.
        let outline = vec![
            rect(0, 0, 8 * MM, 8 * MM),
            rect(8 * MM, 4 * MM - 150_000, 12 * MM, 4 * MM + 150_000),
            rect(12 * MM, 0, 20 * MM, 8 * MM),
        ];
        let mut board = BoardSnapshot {
            outline: vec![rect(-MM, -MM, 21 * MM, 9 * MM)],
            ..Default::default()
        };
        let merged = crate::clipper::union_polygons(&outline);
        assert_eq!(merged.len(), 1);
        let mut p = plane(1, 1, merged[0].contour.clone());
        p.min_clearance = 0;
        p.min_width = MM; // corridor narrower than 1mm -> removed
        board.planes.push(p.clone());
        let result = PlaneFragmentsBuilder::new().run(&board);
        let fragments = fragments_of(&result, 1);
        assert_eq!(fragments.len(), 2);
        assert!(!contains(fragments, Point::new(10 * MM, 4 * MM)));

        // With a minimum width below the corridor width it stays connected.
        board.planes[0].min_width = 200_000;
        let result = PlaneFragmentsBuilder::new().run(&board);
        assert_eq!(fragments_of(&result, 1).len(), 1);
    }

    #[test]
    fn test_orphan_removal() {
        // A different-net trace cuts the plane into two regions; only the
        // left one contains a pad of the plane's net.
        let mut board = board_20x20();
        let mut p = plane(1, 1, rect(0, 0, 20 * MM, 20 * MM));
        p.keep_orphans = true;
        board.planes.push(p);
        board.traces.push(Trace {
            net: Some(NetId(2)),
            layer: Layer::Top,
            start: Point::new(10 * MM, -2 * MM),
            end: Point::new(10 * MM, 22 * MM),
            width: MM,
        });
        board.pads.push(pad_at(1, 5 * MM, 10 * MM));

        let result = PlaneFragmentsBuilder::new().run(&board);
        assert_eq!(fragments_of(&result, 1).len(), 2);

        board.planes[0].keep_orphans = false;
        let result = PlaneFragmentsBuilder::new().run(&board);
        let fragments = fragments_of(&result, 1);
        assert_eq!(fragments.len(), 1);
        assert!(contains(fragments, Point::new(5 * MM, 10 * MM)));
        assert!(!contains(fragments, Point::new(15 * MM, 10 * MM)));
    }

    #[test]
    fn test_idempotence() {
        let mut board = board_20x20();
        board.planes.push(plane(1, 1, rect(0, 0, 20 * MM, 20 * MM)));
        board.vias.push(Via {
            net: Some(NetId(2)),
            position: Point::new(7 * MM, 7 * MM),
            diameter: MM,
        });
        board.pads.push(pad_at(1, 14 * MM, 14 * MM));
        let builder = PlaneFragmentsBuilder::new();
        let first = builder.run(&board);
        let second = builder.run(&board);
        assert_eq!(first, second);
    }

    #[test]
    fn test_priority_order_is_deterministic() {
        let mut board = board_20x20();
        let mut low = plane(1, 1, rect(0, 0, 12 * MM, 20 * MM));
        low.priority = 0;
        let mut high = plane(2, 2, rect(8 * MM, 0, 20 * MM, 20 * MM));
        high.priority = 5;
        board.planes.push(low.clone());
        board.planes.push(high.clone());

        let result = PlaneFragmentsBuilder::new().run(&board);
        // The higher-priority plane owns the overlap region.
        assert!(contains(fragments_of(&result, 2), Point::new(10 * MM, 10 * MM)));
        assert!(!contains(fragments_of(&result, 1), Point::new(10 * MM, 10 * MM)));

        // Reversing the snapshot order changes nothing.
        board.planes.reverse();
        let reversed = PlaneFragmentsBuilder::new().run(&board);
        assert_eq!(result, reversed);
    }

    #[test]
    fn test_equal_priority_tiebreak_by_id() {
        let mut board = board_20x20();
        board.planes.push(plane(1, 1, rect(0, 0, 12 * MM, 20 * MM)));
        board.planes.push(plane(2, 2, rect(8 * MM, 0, 20 * MM, 20 * MM)));
        let result = PlaneFragmentsBuilder::new().run(&board);
        board.planes.reverse();
        let reversed = PlaneFragmentsBuilder::new().run(&board);
        assert_eq!(result, reversed);
        // Exactly one of the two owns the overlap.
        let in_one = contains(fragments_of(&result, 1), Point::new(10 * MM, 10 * MM));
        let in_two = contains(fragments_of(&result, 2), Point::new(10 * MM, 10 * MM));
        assert!(in_one != in_two);
    }

    #[test]
    fn test_abort_yields_unfinished_result() {
        let mut board = board_20x20();
        board.planes.push(plane(1, 1, rect(0, 0, 20 * MM, 20 * MM)));
        let builder = PlaneFragmentsBuilder::new();
        builder.abort();
        let result = builder.run(&board);
        assert!(!result.finished);
        let mut planes = board.planes.clone();
        assert!(!result.apply_to(&mut planes));
        assert!(planes[0].fragments.is_empty());
    }

    #[test]
    fn test_apply_to_stores_fragments() {
        let mut board = board_20x20();
        board.planes.push(plane(1, 1, rect(0, 0, 20 * MM, 20 * MM)));
        let result = PlaneFragmentsBuilder::new().run(&board);
        let mut planes = board.planes.clone();
        assert!(result.apply_to(&mut planes));
        assert!(!planes[0].fragments.is_empty());
    }
}
