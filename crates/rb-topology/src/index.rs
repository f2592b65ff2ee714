//! R-tree entries for node snapping and piece-pair candidate search.

use rstar::{PointDistance, RTree, RTreeObject, AABB};

use rb_core::{DVec2, NodeId, SegmentId};
use rb_network::NetworkModel;

// ── Nodes ─────────────────────────────────────────────────────────────────────

/// A node position in the local plane.
#[derive(Clone)]
pub(crate) struct NodeEntry {
    pub point: [f64; 2],
    pub id: NodeId,
}

impl RTreeObject for NodeEntry {
    type Envelope = AABB<[f64; 2]>;
    fn envelope(&self) -> Self::Envelope {
        AABB::from_point(self.point)
    }
}

impl PointDistance for NodeEntry {
    fn distance_2(&self, point: &[f64; 2]) -> f64 {
        let dx = self.point[0] - point[0];
        let dy = self.point[1] - point[1];
        dx * dx + dy * dy
    }
}

pub(crate) fn node_tree(model: &NetworkModel) -> RTree<NodeEntry> {
    RTree::bulk_load(
        model
            .nodes()
            .map(|n| NodeEntry { point: [n.pos.x, n.pos.y], id: n.id })
            .collect(),
    )
}

/// Nodes within `eps` of `p`, ascending by ID.
pub(crate) fn nodes_near(tree: &RTree<NodeEntry>, p: DVec2, eps: f64) -> Vec<NodeId> {
    let mut out: Vec<NodeId> = tree
        .locate_within_distance([p.x, p.y], eps * eps)
        .map(|e| e.id)
        .collect();
    out.sort_unstable();
    out
}

// ── Pieces ────────────────────────────────────────────────────────────────────

/// One straight piece of a segment's control polygon.  The envelope is
/// padded by the snap tolerance so near misses are still candidates.
#[derive(Clone)]
pub(crate) struct PieceEntry {
    pub segment: SegmentId,
    pub piece: usize,
    pub a: DVec2,
    pub b: DVec2,
    pad: f64,
}

impl RTreeObject for PieceEntry {
    type Envelope = AABB<[f64; 2]>;
    fn envelope(&self) -> Self::Envelope {
        let lo = self.a.min(self.b) - DVec2::splat(self.pad);
        let hi = self.a.max(self.b) + DVec2::splat(self.pad);
        AABB::from_corners([lo.x, lo.y], [hi.x, hi.y])
    }
}

pub(crate) fn piece_tree(model: &NetworkModel, pad: f64) -> RTree<PieceEntry> {
    let mut entries = Vec::new();
    for seg in model.segments() {
        for (i, w) in seg.points.windows(2).enumerate() {
            entries.push(PieceEntry {
                segment: seg.id,
                piece: i,
                a: w[0].pos,
                b: w[1].pos,
                pad,
            });
        }
    }
    RTree::bulk_load(entries)
}
