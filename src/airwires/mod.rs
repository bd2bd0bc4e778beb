//! Airwire (ratsnest) builder.
//!
//! Computes, for one net, the minimal set of straight segments connecting
//! every point of the net that is not already connected by real copper. The
//! result is what the editor draws as the "ratsnest" of unrouted
//! connections.
//!
//! # Algorithm
//!
//! 1. Collect the net's anchors: pads, vias and net points, each with a
//!    position and the layers it occupies.
//! 2. Collect mandatory edges for copper that already connects anchors:
//!    one edge per trace segment, plus an edge for every anchor pair covered
//!    by the same filled plane fragment.
//! 3. Generate candidate edges from a Delaunay triangulation of the anchor
//!    positions (the Delaunay edge set is a small superset of the minimum
//!    spanning tree of the complete graph), weighted by squared distance.
//! 4. Run Kruskal's algorithm over mandatory-then-candidate edges with a
//!    union-find structure. Mandatory merges are free; every candidate edge
//!    that merges two components becomes an output airwire.
//!
//! The edge ordering uses anchor ids as a secondary sort key, so equal-weight
//! edges are processed identically on every run and the output is
//! bit-for-bit reproducible.

use crate::board::{BoardSnapshot, Layer, LayerScope, NetId};
use crate::geometry::Point;
use crate::Result;
use log::{debug, warn};
use petgraph::unionfind::UnionFind;
use spade::{DelaunayTriangulation, HasPosition, Point2, Triangulation};

/// What an anchor is on the board.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AnchorKind {
    Pad,
    Via,
    NetPoint,
}

/// A point of the net that can terminate a connection.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Anchor {
    pub kind: AnchorKind,
    pub position: Point,
    /// Layers the anchor occupies; a plane fragment can only join anchors
    /// whose scope includes the plane's layer.
    pub scope: LayerScope,
}

/// An edge of the connection graph between two anchors (by index).
#[derive(Debug, Clone, Copy)]
struct Edge {
    a: usize,
    b: usize,
    /// Squared distance for candidate edges; zero for mandatory ones.
    weight: i128,
    /// Mandatory edges represent existing copper; they sort before every
    /// candidate and never produce an airwire.
    connected: bool,
}

/// Triangulation vertex; positions only, anchors are recovered through the
/// insertion-order mapping kept by the builder.
struct TriVertex {
    position: Point2<f64>,
}

impl HasPosition for TriVertex {
    type Scalar = f64;

    fn position(&self) -> Point2<f64> {
        self.position
    }
}

/// Computes the airwires of one net over a board snapshot.
pub struct AirWiresBuilder<'a> {
    board: &'a BoardSnapshot,
    net: NetId,
}

impl<'a> AirWiresBuilder<'a> {
    pub fn new(board: &'a BoardSnapshot, net: NetId) -> Self {
        AirWiresBuilder { board, net }
    }

    /// Build the airwire list: one (start, end) pair per missing
    /// connection. Nets with fewer than two anchors yield an empty list.
    pub fn build(&self) -> Result<Vec<(Point, Point)>> {
        let anchors = self.collect_anchors();
        let n = anchors.len();
        if n < 2 {
            return Ok(Vec::new());
        }

        let mut edges = Vec::new();
        self.collect_trace_edges(&anchors, &mut edges);
        self.collect_plane_edges(&anchors, &mut edges);
        collect_candidate_edges(&anchors, &mut edges)?;

        // Kruskal: mandatory edges first, then candidates by ascending
        // squared distance; ids break ties deterministically.
        edges.sort_by_key(|e| (!e.connected, e.weight, e.a, e.b));
        let mut components = UnionFind::<usize>::new(n);
        let mut airwires = Vec::new();
        let mut merges = 0usize;
        for edge in &edges {
            if merges + 1 >= n {
                break;
            }
            if components.union(edge.a, edge.b) {
                merges += 1;
                if !edge.connected {
                    airwires.push((anchors[edge.a].position, anchors[edge.b].position));
                }
            }
        }

        debug!(
            "Built {} airwire(s) for net {:?} over {} anchor(s).",
            airwires.len(),
            self.net,
            n
        );
        Ok(airwires)
    }

    /// Gather every pad, via and net point of the net, in a stable order.
    fn collect_anchors(&self) -> Vec<Anchor> {
        let mut anchors = Vec::new();
        for pad in &self.board.pads {
            if pad.net == Some(self.net) {
                anchors.push(Anchor {
                    kind: AnchorKind::Pad,
                    position: pad.position,
                    scope: pad.scope,
                });
            }
        }
        for via in &self.board.vias {
            if via.net == Some(self.net) {
                anchors.push(Anchor {
                    kind: AnchorKind::Via,
                    position: via.position,
                    scope: LayerScope::All,
                });
            }
        }
        for net_point in &self.board.net_points {
            if net_point.net == self.net {
                anchors.push(Anchor {
                    kind: AnchorKind::NetPoint,
                    position: net_point.position,
                    scope: LayerScope::Single(net_point.layer),
                });
            }
        }
        anchors
    }

    /// One mandatory edge per trace segment of the net. Trace endpoints
    /// always terminate on an anchor (pad, via or net point); an endpoint
    /// without one indicates inconsistent input and the edge is skipped.
    fn collect_trace_edges(&self, anchors: &[Anchor], edges: &mut Vec<Edge>) {
        for trace in &self.board.traces {
            if trace.net != Some(self.net) {
                continue;
            }
            let a = find_anchor(anchors, trace.start, trace.layer);
            let b = find_anchor(anchors, trace.end, trace.layer);
            match (a, b) {
                (Some(a), Some(b)) if a != b => edges.push(Edge {
                    a,
                    b,
                    weight: 0,
                    connected: true,
                }),
                (Some(_), Some(_)) => {}
                _ => warn!(
                    "Trace of net {:?} from {:?} to {:?} has a dangling endpoint, ignoring it.",
                    self.net, trace.start, trace.end
                ),
            }
        }
    }

    /// Plane fragments electrically join every anchor they cover: for each
    /// fragment, all pairs of covered anchors become mandatory edges.
    fn collect_plane_edges(&self, anchors: &[Anchor], edges: &mut Vec<Edge>) {
        for plane in self.board.planes_of_net(self.net) {
            let on_layer: Vec<usize> = (0..anchors.len())
                .filter(|&i| anchors[i].scope.includes(plane.layer))
                .collect();
            if on_layer.len() < 2 {
                continue;
            }
            for fragment in &plane.fragments {
                let covered: Vec<usize> = on_layer
                    .iter()
                    .copied()
                    .filter(|&i| fragment.contains_point(anchors[i].position))
                    .collect();
                for (k, &a) in covered.iter().enumerate() {
                    for &b in &covered[k + 1..] {
                        edges.push(Edge {
                            a,
                            b,
                            weight: 0,
                            connected: true,
                        });
                    }
                }
            }
        }
    }
}

/// Locate the anchor at the given position whose scope covers the layer.
fn find_anchor(anchors: &[Anchor], position: Point, layer: Layer) -> Option<usize> {
    anchors
        .iter()
        .position(|a| a.position == position && a.scope.includes(layer))
}

/// Candidate edges: Delaunay triangulation for three or more anchors, the
/// single pair for exactly two. Weights are squared distances.
fn collect_candidate_edges(anchors: &[Anchor], edges: &mut Vec<Edge>) -> Result<()> {
    if anchors.len() == 2 {
        edges.push(Edge {
            a: 0,
            b: 1,
            weight: anchors[0].position.distance_sq(anchors[1].position),
            connected: false,
        });
        return Ok(());
    }

    let mut triangulation: DelaunayTriangulation<TriVertex> = DelaunayTriangulation::new();
    // Anchor id per triangulation vertex, in insertion order. Spade merges
    // vertices at identical positions, so co-located anchors share a vertex
    // and get an explicit zero-weight edge instead.
    let mut vertex_anchor: Vec<usize> = Vec::with_capacity(anchors.len());
    for (i, anchor) in anchors.iter().enumerate() {
        let before = triangulation.num_vertices();
        let handle = triangulation.insert(TriVertex {
            position: Point2::new(anchor.position.x as f64, anchor.position.y as f64),
        })?;
        if triangulation.num_vertices() > before {
            vertex_anchor.push(i);
        } else {
            edges.push(Edge {
                a: vertex_anchor[handle.index()],
                b: i,
                weight: 0,
                connected: false,
            });
        }
    }

    for edge in triangulation.undirected_edges() {
        let [va, vb] = edge.vertices();
        let a = vertex_anchor[va.fix().index()];
        let b = vertex_anchor[vb.fix().index()];
        edges.push(Edge {
            a,
            b,
            weight: anchors[a].position.distance_sq(anchors[b].position),
            connected: false,
        });
    }
    Ok(())
}
