//! Junction topology: incidence ordering, classification and radius.
//!
//! A junction exists for every node of degree ≥ 2.  Its radius is the
//! distance each incident ribbon is cut back from the node so that
//! neighbouring ribbons do not overlap before the patch takes over:
//!
//! ```text
//! r = max( max_i hw_i,  max_{adjacent a,b with gap θ < π} max(hw_a, hw_b) / tan(θ/2) )
//!     + clearance,  capped at max_junction_radius
//! ```
//!
//! The cap never drops below the widest half-width.
//!
//! A seamless pass-through (two arms of equal half-width continuing within
//! `straight_tolerance` of straight) gets radius 0: both ribbons run up to
//! the node and meet frame to frame.

use std::collections::BTreeSet;
use std::f64::consts::PI;

use rb_core::geom::{ccw_gap, wrap_angle};
use rb_core::{BuildConfig, JunctionId, NodeId, SegmentId};

use crate::model::{NetworkModel, SegmentEnd};

/// Topological class of a junction, by degree.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum JunctionKind {
    PassThrough,
    Tee,
    Cross,
    MultiWay(usize),
}

impl JunctionKind {
    pub fn from_degree(degree: usize) -> Option<JunctionKind> {
        match degree {
            0 | 1 => None,
            2 => Some(JunctionKind::PassThrough),
            3 => Some(JunctionKind::Tee),
            4 => Some(JunctionKind::Cross),
            n => Some(JunctionKind::MultiWay(n)),
        }
    }
}

/// One segment end meeting at a junction.
#[derive(Copy, Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Incidence {
    pub segment: SegmentId,
    pub end: SegmentEnd,
    /// Outgoing direction from the node, radians in `(-π, π]`.
    pub angle: f64,
    pub half_width: f64,
}

/// Topology and sizing at a node of degree ≥ 2.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Junction {
    pub id: JunctionId,
    pub node: NodeId,
    /// Sorted counter-clockwise by `angle`.
    pub incidences: Vec<Incidence>,
    pub kind: JunctionKind,
    pub radius: f64,
    /// Drawn from a model-wide counter whenever the junction appears or is
    /// recomputed with a different result, so a junction that disappears and
    /// comes back never repeats an earlier version.
    pub version: u64,
}

impl Junction {
    #[inline]
    pub fn degree(&self) -> usize {
        self.incidences.len()
    }

    /// Degree-2 junction whose two roads continue almost straight through.
    pub fn is_straight(&self, tolerance: f64) -> bool {
        match self.incidences.as_slice() {
            [a, b] => (wrap_angle(b.angle - a.angle).abs() - PI).abs() <= tolerance,
            _ => false,
        }
    }

    /// Straight pass-through whose two arms have the same half-width, so the
    /// ribbons can meet at the node without a trim.
    pub fn is_seamless(&self, tolerance: f64) -> bool {
        seamless(&self.incidences, tolerance)
    }

    pub fn incidence(&self, segment: SegmentId, end: SegmentEnd) -> Option<&Incidence> {
        self.incidences.iter().find(|i| i.segment == segment && i.end == end)
    }

    /// Same topology and sizing, ignoring `version`.
    fn same_shape(&self, other: &Junction) -> bool {
        self.node == other.node
            && self.incidences == other.incidences
            && self.kind == other.kind
            && self.radius == other.radius
    }
}

/// Radius that keeps every angularly adjacent pair of ribbons apart.
pub fn junction_radius(incidences: &[Incidence], config: &BuildConfig) -> f64 {
    if seamless(incidences, config.straight_tolerance) {
        return 0.0;
    }
    let widest = incidences.iter().map(|i| i.half_width).fold(0.0, f64::max);
    let mut r = widest;

    let n = incidences.len();
    for k in 0..n {
        let a = &incidences[k];
        let b = &incidences[(k + 1) % n];
        // Degree 2 visits both gaps: a → b, then b → a.
        let gap = ccw_gap(a.angle, b.angle);
        if n >= 2 && gap < PI {
            let tan = (gap * 0.5).tan();
            let needed = if tan > 1e-9 {
                a.half_width.max(b.half_width) / tan
            } else {
                f64::INFINITY
            };
            r = r.max(needed);
        }
    }

    (r + config.junction_clearance).min(config.max_junction_radius.max(widest))
}

fn seamless(incidences: &[Incidence], tolerance: f64) -> bool {
    match incidences {
        [a, b] => {
            (wrap_angle(b.angle - a.angle).abs() - PI).abs() <= tolerance
                && (a.half_width - b.half_width).abs() <= 1e-9
        }
        _ => false,
    }
}

/// Compute the junction at `node` from the current segments, or `None` when
/// the node is missing or has degree < 2.  The result has version 0.
pub fn compute_junction(model: &NetworkModel, node: NodeId) -> Option<Junction> {
    let n = model.node(node)?;
    let kind = JunctionKind::from_degree(n.degree())?;

    let mut incidences: Vec<Incidence> = n
        .segments
        .iter()
        .filter_map(|&sid| {
            let seg = model.segment(sid)?;
            let end = seg.end_at(node)?;
            let dir = seg.outgoing_dir(end);
            Some(Incidence {
                segment: sid,
                end,
                angle: wrap_angle(dir.y.atan2(dir.x)),
                half_width: seg.half_width_at(end),
            })
        })
        .collect();

    incidences.sort_by(|a, b| {
        a.angle
            .total_cmp(&b.angle)
            .then(a.segment.cmp(&b.segment))
            .then(a.end.cmp(&b.end))
    });

    let radius = junction_radius(&incidences, model.config());
    Some(Junction {
        id: JunctionId::of(node),
        node,
        incidences,
        kind,
        radius,
        version: 0,
    })
}

impl NetworkModel {
    /// Recompute the junctions at `nodes`.  Returns the nodes whose junction
    /// appeared, disappeared, or changed shape.
    pub(crate) fn refresh_junctions<I>(&mut self, nodes: I) -> BTreeSet<NodeId>
    where
        I: IntoIterator<Item = NodeId>,
    {
        let mut changed = BTreeSet::new();
        for node in nodes {
            let id = JunctionId::of(node);
            let fresh = compute_junction(self, node);
            match (self.junctions.get(&id), fresh) {
                (None, None) => {}
                (Some(_), None) => {
                    self.junctions.remove(&id);
                    changed.insert(node);
                }
                (None, Some(mut j)) => {
                    j.version = self.tick_junction_clock();
                    self.junctions.insert(id, j);
                    changed.insert(node);
                }
                (Some(old), Some(mut j)) => {
                    if !old.same_shape(&j) {
                        j.version = self.tick_junction_clock();
                        self.junctions.insert(id, j);
                        changed.insert(node);
                    }
                }
            }
        }
        changed
    }

    fn tick_junction_clock(&mut self) -> u64 {
        self.junction_clock += 1;
        self.junction_clock
    }

    /// Recompute every junction from scratch.  Returns how many changed.
    pub fn rebuild_junctions(&mut self) -> usize {
        let mut all: BTreeSet<NodeId> = self.nodes().map(|n| n.id).collect();
        all.extend(self.junctions.keys().map(|j| j.node()));
        self.refresh_junctions(all).len()
    }
}
