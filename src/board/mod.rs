//! Board input data model.
//!
//! The builders never read a live board; the surrounding application copies
//! the geometry they need into a [`BoardSnapshot`] and hands that over. This
//! keeps both algorithms pure and makes the single-writer/many-readers
//! discipline trivial: a snapshot taken on the UI thread can be processed on
//! a worker thread while editing continues, and a superseded build's result
//! is simply dropped.
//!
//! All lengths and positions are scaled integers (nanometers).

use crate::geometry::{ExPolygons, Point, Polygon};
use crate::Coord;
use serde::{Deserialize, Serialize};

/// A copper layer of the board.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Layer {
    Top,
    Inner(u8),
    Bottom,
}

/// The copper layers an object occupies.
///
/// Through-hole objects (vias, THT pads) occupy every layer; surface objects
/// occupy exactly one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum LayerScope {
    /// All copper layers (through-hole).
    All,
    /// A single copper layer.
    Single(Layer),
}

impl LayerScope {
    /// Whether this scope covers the given layer.
    #[inline]
    pub fn includes(self, layer: Layer) -> bool {
        match self {
            LayerScope::All => true,
            LayerScope::Single(l) => l == layer,
        }
    }
}

/// Opaque net identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct NetId(pub u32);

/// Stable unique plane identifier.
///
/// Also the tie-break key for the fill order of planes with equal priority,
/// so it must be stable across runs and platforms (not derived from
/// creation order or addresses).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct PlaneId(pub u64);

/// How a plane connects to same-net pads.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum ConnectStyle {
    /// Pads are embedded in the fill without relief.
    #[default]
    Solid,
    /// Thermal relief spokes.
    ///
    /// Spoke geometry is not generated yet; planes with this style currently
    /// fill solid. Same-net vias always connect solid regardless of the
    /// style, since vias are not soldered and heat dissipation through them
    /// is unproblematic or even desired.
    Thermal,
}

/// A user-defined copper pour region on one layer, belonging to one net.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Plane {
    pub id: PlaneId,
    pub layer: Layer,
    pub net: NetId,
    /// User-drawn boundary. May be concave or self-intersecting; the fill
    /// rule of the clipping backend resolves it.
    pub outline: Polygon,
    /// Minimum trace width of the fill; regions narrower than this are
    /// removed. Must be positive.
    pub min_width: Coord,
    /// Minimum clearance to other nets and to the board edge. Must be
    /// non-negative.
    pub min_clearance: Coord,
    /// Fill precedence: planes with greater priority are filled first and
    /// take the overlapping area for themselves.
    pub priority: i32,
    pub connect_style: ConnectStyle,
    /// Keep fill islands that have no electrical connection to the net.
    pub keep_orphans: bool,
    /// Computed fill fragments, produced by the plane build. Each fragment
    /// is one disjoint filled region with its holes attached.
    #[serde(default)]
    pub fragments: ExPolygons,
}

impl Plane {
    /// Drop the computed fragments, e.g. while the plane is being edited
    /// interactively and the stored fill no longer matches the outline.
    pub fn clear_fragments(&mut self) {
        self.fragments.clear();
    }
}

/// A footprint pad.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Pad {
    /// Net the pad is connected to, if any.
    pub net: Option<NetId>,
    /// Pad center, the anchor position for airwires.
    pub position: Point,
    /// Layers the pad copper occupies: `All` for through-hole pads,
    /// `Single` for SMT pads.
    pub scope: LayerScope,
    /// Copper outline(s) of the pad, already transformed to board
    /// coordinates.
    pub copper: Vec<Polygon>,
    /// Pad-specific clearance requirement from the design rules; the fill
    /// honors the larger of this and the plane's own clearance.
    pub clearance: Coord,
}

/// A via.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Via {
    pub net: Option<NetId>,
    pub position: Point,
    /// Outer copper diameter; the via is a circle of this size on every
    /// layer.
    pub diameter: Coord,
}

/// A non-plated drill (NPTH) through the board, from a board or footprint
/// hole. The drill path is a segment; a zero-length path is a round drill,
/// a longer one a milled slot.
///
/// Holes carry no net and go through every layer, so every plane keeps
/// clear of them regardless of its net.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Hole {
    pub start: Point,
    pub end: Point,
    /// Drill diameter.
    pub diameter: Coord,
}

/// A routed trace segment on one layer.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Trace {
    pub net: Option<NetId>,
    pub layer: Layer,
    pub start: Point,
    pub end: Point,
    pub width: Coord,
}

/// An internal trace junction ("net point") that can terminate connections.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct NetPoint {
    pub net: NetId,
    pub layer: Layer,
    pub position: Point,
}

/// Immutable snapshot of everything the builders read from a board.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BoardSnapshot {
    /// Physical board outline polygon(s). The fill never extends past this.
    pub outline: Vec<Polygon>,
    pub planes: Vec<Plane>,
    pub pads: Vec<Pad>,
    pub vias: Vec<Via>,
    pub holes: Vec<Hole>,
    pub traces: Vec<Trace>,
    pub net_points: Vec<NetPoint>,
}

impl BoardSnapshot {
    /// Planes belonging to the given net.
    pub fn planes_of_net(&self, net: NetId) -> impl Iterator<Item = &Plane> {
        self.planes.iter().filter(move |p| p.net == net)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_layer_scope() {
        assert!(LayerScope::All.includes(Layer::Top));
        assert!(LayerScope::All.includes(Layer::Inner(3)));
        assert!(LayerScope::Single(Layer::Bottom).includes(Layer::Bottom));
        assert!(!LayerScope::Single(Layer::Bottom).includes(Layer::Top));
        assert!(!LayerScope::Single(Layer::Inner(1)).includes(Layer::Inner(2)));
    }

    #[test]
    fn test_clear_fragments() {
        let mut plane = Plane {
            id: PlaneId(1),
            layer: Layer::Top,
            net: NetId(1),
            outline: Polygon::from_points(vec![
                Point::new(0, 0),
                Point::new(1_000_000, 0),
                Point::new(1_000_000, 1_000_000),
            ]),
            min_width: 200_000,
            min_clearance: 200_000,
            priority: 0,
            connect_style: ConnectStyle::Solid,
            keep_orphans: false,
            fragments: vec![crate::geometry::ExPolygon::default()],
        };
        plane.clear_fragments();
        assert!(plane.fragments.is_empty());
    }
}
