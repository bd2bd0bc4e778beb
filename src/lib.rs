//! # copperfill
//!
//! Copper plane fill and airwire computation for PCB boards.
//!
//! This library implements the two board-level geometry algorithms of a PCB
//! editor that are independent of any GUI:
//!
//! - **Plane fill** ([`plane::PlaneFragmentsBuilder`]): given the planes of a
//!   board and all copper obstacles (pads, vias, traces, other planes),
//!   compute the filled polygon fragments of every copper pour, honoring
//!   clearances, minimum width and plane priorities.
//! - **Airwires** ([`airwires::AirWiresBuilder`]): given one net, compute the
//!   minimum set of straight "ratsnest" segments connecting all points of the
//!   net that are not yet connected by real copper (Delaunay triangulation +
//!   minimum spanning forest).
//!
//! Both algorithms are pure, synchronous computations over an immutable
//! [`board::BoardSnapshot`]; they perform no I/O. The surrounding application
//! is expected to snapshot its board state, run the builders (possibly on a
//! worker thread), and apply the results back.
//!
//! ## Example
//!
//! ```rust,ignore
//! use copperfill::{BoardSnapshot, PlaneFragmentsBuilder, AirWiresBuilder};
//!
//! let snapshot: BoardSnapshot = board.snapshot();
//! let result = PlaneFragmentsBuilder::new().run(&snapshot);
//! result.apply_to(&mut board.planes);
//!
//! let airwires = AirWiresBuilder::new(&snapshot, net_id).build()?;
//! ```

pub mod airwires;
pub mod board;
pub mod clipper;
pub mod geometry;
pub mod plane;

// Re-export commonly used types
pub use airwires::{AirWiresBuilder, Anchor, AnchorKind};
pub use board::{
    BoardSnapshot, ConnectStyle, Hole, Layer, LayerScope, NetId, NetPoint, Pad, Plane, PlaneId,
    Trace, Via,
};
pub use geometry::{ExPolygon, ExPolygons, Point, PointF, Polygon, Polygons};
pub use plane::{PlaneBuildResult, PlaneFragmentsBuilder};

/// Coordinate type used throughout the library.
/// Using i64 for integer coordinates (scaled by SCALING_FACTOR) to avoid
/// floating-point issues in board geometry.
pub type Coord = i64;

/// Floating-point coordinate type for unscaled values.
pub type CoordF = f64;

/// Scaling factor: coordinates are stored as integers scaled by this factor.
/// 1 unit = 1 nanometer, so 1mm = 1_000_000 units.
pub const SCALING_FACTOR: f64 = 1_000_000.0;

/// Maximum arc-flattening deviation in nanometers (0.005 mm).
///
/// Used whenever curved geometry (via circles, trace end caps, round offset
/// joins) is approximated by line segments. This value is a compatibility
/// constant: changing it changes the computed fill of every existing board,
/// so it must not be modified without versioning the change.
pub const MAX_ARC_TOLERANCE: Coord = 5_000;

/// Scale a floating-point millimeter coordinate to integer nanometers.
#[inline]
pub fn scale(v: CoordF) -> Coord {
    (v * SCALING_FACTOR).round() as Coord
}

/// Unscale an integer nanometer coordinate to floating-point millimeters.
#[inline]
pub fn unscale(v: Coord) -> CoordF {
    v as CoordF / SCALING_FACTOR
}

/// Result type used throughout the library.
pub type Result<T> = std::result::Result<T, Error>;

/// Error type for build operations.
///
/// Degenerate geometry (empty outlines, zero-area obstacles, nets with fewer
/// than two anchors) is never an error; those cases produce empty results.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("Invalid geometry: {0}")]
    Geometry(String),

    #[error("Triangulation error: {0}")]
    Triangulation(#[from] spade::InsertionError),
}

/// Version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
