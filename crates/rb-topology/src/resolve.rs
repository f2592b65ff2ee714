//! Topology resolution over a [`NetworkModel`], in four phases:
//!
//! 1. **Snap**: nodes closer than the snap tolerance merge into the lowest
//!    ID among them.
//! 2. **Split** (repeated until stable): proper crossings, T-contacts and
//!    collinear overlaps cut the segments involved at a shared node.
//! 3. **Dedupe**: segments joining the same two nodes along the same path
//!    collapse onto the lowest ID.
//! 4. **Junctions**: every junction is recomputed.
//!
//! Every mutation goes through the model's edit API, so the invalidation
//! sets it returns are collected into the report as-is.  Running the
//! resolver twice is a no-op the second time.

use std::collections::BTreeMap;

use rstar::{RTree, AABB};
use rustc_hash::{FxHashMap, FxHashSet};
use tracing::{debug, warn};

use rb_core::geom::{closest_on_piece, intersect_pieces, PieceHit};
use rb_core::{DVec2, DVec3, NodeId, SegmentId};
use rb_network::{Cut, EditError, Invalidation, NetworkModel, Segment, Tags};

use crate::error::TopologyResult;
use crate::index::{node_tree, nodes_near, piece_tree, NodeEntry, PieceEntry};

/// Upper bound on split rounds.  One round resolves everything in practice;
/// the rest catch crossings introduced by pinning cut points onto nodes.
const MAX_ROUNDS: usize = 8;

/// What a resolution pass changed.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct TopologyReport {
    pub nodes_merged: usize,
    pub crossings: usize,
    pub t_junctions: usize,
    pub overlaps: usize,
    /// Crossings left alone because the two roads are at different grades.
    pub grade_separated: usize,
    /// New segments created by splitting.
    pub segments_created: usize,
    pub duplicates_removed: usize,
    pub junctions_changed: usize,
    pub rounds: usize,
    pub invalidated: Invalidation,
}

impl TopologyReport {
    /// `true` when the pass made no change to the network.
    pub fn is_noop(&self) -> bool {
        self.nodes_merged == 0
            && self.segments_created == 0
            && self.duplicates_removed == 0
            && self.junctions_changed == 0
            && self.invalidated.is_empty()
    }
}

/// Run all four phases on `model`.
pub fn resolve(model: &mut NetworkModel) -> TopologyResult<TopologyReport> {
    let mut report = TopologyReport::default();

    snap(model, &mut report)?;

    for _ in 0..MAX_ROUNDS {
        report.rounds += 1;
        if !split_round(model, &mut report)? {
            break;
        }
    }

    dedupe(model, &mut report)?;
    report.junctions_changed = model.rebuild_junctions();

    debug!(
        merged = report.nodes_merged,
        crossings = report.crossings,
        t_junctions = report.t_junctions,
        overlaps = report.overlaps,
        duplicates = report.duplicates_removed,
        rounds = report.rounds,
        "topology resolved"
    );
    Ok(report)
}

// ── Phase 1: snap ─────────────────────────────────────────────────────────────

fn snap(model: &mut NetworkModel, report: &mut TopologyReport) -> TopologyResult<()> {
    let eps = model.config().snap_tolerance;
    let tree = node_tree(model);
    let ids: Vec<NodeId> = model.nodes().map(|n| n.id).collect();
    let mut gone: FxHashSet<NodeId> = FxHashSet::default();

    for id in ids {
        if gone.contains(&id) {
            continue;
        }
        let Some(node) = model.node(id) else { continue };
        let near: Vec<NodeId> = nodes_near(&tree, node.xy(), eps).into_iter().filter(|&o| o > id).collect();
        for other in near {
            if gone.contains(&other) {
                continue;
            }
            report.invalidated.extend(model.merge_nodes(id, other)?);
            gone.insert(other);
            report.nodes_merged += 1;
        }
    }
    Ok(())
}

// ── Phase 2: split ────────────────────────────────────────────────────────────

/// Node lookup for cut points: existing nodes first, then nodes created
/// earlier in the same round.
struct CutNodes<'a> {
    tree: &'a RTree<NodeEntry>,
    created: Vec<(DVec2, NodeId)>,
    eps: f64,
}

impl CutNodes<'_> {
    fn find_or_create(&mut self, model: &mut NetworkModel, at: DVec2, z: f64) -> NodeId {
        if let Some(&id) = nodes_near(self.tree, at, self.eps).first() {
            return id;
        }
        if let Some(&(_, id)) = self.created.iter().find(|(p, _)| p.distance(at) <= self.eps) {
            return id;
        }
        let id = model.add_node(DVec3::new(at.x, at.y, z), Tags::new());
        self.created.push((at, id));
        id
    }
}

/// Pending cuts, one list per segment, without repeating a node.
#[derive(Default)]
struct CutPlan(BTreeMap<SegmentId, Vec<Cut>>);

impl CutPlan {
    fn push(&mut self, segment: SegmentId, piece: usize, t: f64, node: NodeId) -> bool {
        let cuts = self.0.entry(segment).or_default();
        if cuts.iter().any(|c| c.node == node) {
            return false;
        }
        cuts.push(Cut { piece, t, node });
        true
    }
}

fn near_endpoint(p: DVec2, seg: &Segment, eps: f64) -> bool {
    p.distance(seg.points[0].pos) <= eps || p.distance(seg.points[seg.points.len() - 1].pos) <= eps
}

#[inline]
fn z_at(z: &[f64], piece: usize, t: f64) -> f64 {
    z[piece] + (z[piece + 1] - z[piece]) * t
}

fn envelope(a: DVec2, b: DVec2, pad: f64) -> AABB<[f64; 2]> {
    let lo = a.min(b) - DVec2::splat(pad);
    let hi = a.max(b) + DVec2::splat(pad);
    AABB::from_corners([lo.x, lo.y], [hi.x, hi.y])
}

/// One detection-and-split round.  Returns `true` if anything was cut.
fn split_round(model: &mut NetworkModel, report: &mut TopologyReport) -> TopologyResult<bool> {
    let eps = model.config().snap_tolerance;
    let grade = model.config().grade_separation;

    let snapshot: Vec<Segment> = model.segments().cloned().collect();
    let by_id: FxHashMap<SegmentId, usize> =
        snapshot.iter().enumerate().map(|(i, s)| (s.id, i)).collect();
    let elevations: Vec<Vec<f64>> = snapshot.iter().map(Segment::resolved_elevations).collect();

    let pieces: RTree<PieceEntry> = piece_tree(model, eps);
    let tree = node_tree(model);
    let mut nodes = CutNodes { tree: &tree, created: Vec::new(), eps };
    let mut plan = CutPlan::default();

    for (si, seg) in snapshot.iter().enumerate() {
        // ── Crossings and overlaps, each unordered pair once ─────────────
        for (i, w) in seg.points.windows(2).enumerate() {
            let (p0, p1) = (w[0].pos, w[1].pos);
            for cand in pieces.locate_in_envelope_intersecting(&envelope(p0, p1, eps)) {
                if cand.segment <= seg.id {
                    continue;
                }
                let ti = by_id[&cand.segment];
                let other = &snapshot[ti];
                let (j, q0, q1) = (cand.piece, cand.a, cand.b);

                match intersect_pieces(p0, p1, q0, q1, 0.0) {
                    PieceHit::Point { t, u } => {
                        let x = p0 + (p1 - p0) * t;
                        if near_endpoint(x, seg, eps) || near_endpoint(x, other, eps) {
                            continue;
                        }
                        let (zs, zt) = (z_at(&elevations[si], i, t), z_at(&elevations[ti], j, u));
                        if (zs - zt).abs() > grade {
                            report.grade_separated += 1;
                            continue;
                        }
                        let node = nodes.find_or_create(model, x, 0.5 * (zs + zt));
                        let a = plan.push(seg.id, i, t, node);
                        let b = plan.push(other.id, j, u, node);
                        if a || b {
                            report.crossings += 1;
                        }
                    }
                    PieceHit::Collinear => {
                        // Interior control points of one lying on the other's
                        // piece.  Segment endpoints are T-contacts, below.
                        let mut cut_any = false;
                        let sides = [
                            (seg, si, i, p0, p1, other, ti, j, [q0, q1]),
                            (other, ti, j, q0, q1, seg, si, i, [p0, p1]),
                        ];
                        for (host, hi, hp, h0, h1, guest, gi, gp, guest_pts) in sides {
                            for (k, g) in guest_pts.into_iter().enumerate() {
                                let g_idx = gp + k;
                                if g_idx == 0 || g_idx + 1 == guest.points.len() {
                                    continue;
                                }
                                let (t, d) = closest_on_piece(g, h0, h1);
                                if d > eps || near_endpoint(g, host, eps) {
                                    continue;
                                }
                                let zg = elevations[gi][g_idx];
                                if (z_at(&elevations[hi], hp, t) - zg).abs() > grade {
                                    continue;
                                }
                                let node = nodes.find_or_create(model, g, zg);
                                cut_any |= plan.push(host.id, hp, t, node);
                                cut_any |= plan.push(guest.id, gp, k as f64, node);
                            }
                        }
                        if cut_any {
                            report.overlaps += 1;
                        }
                    }
                    PieceHit::None => {}
                }
            }
        }

        // ── T-contacts: this segment's endpoints on other segments ───────
        for node_id in [seg.start, seg.end] {
            let Some(node) = model.node(node_id) else { continue };
            let (at, z) = (node.xy(), node.pos.z);
            for cand in pieces.locate_in_envelope_intersecting(&envelope(at, at, eps)) {
                if cand.segment == seg.id {
                    continue;
                }
                let ti = by_id[&cand.segment];
                let other = &snapshot[ti];
                if other.end_at(node_id).is_some() || near_endpoint(at, other, eps) {
                    continue;
                }
                let (u, d) = closest_on_piece(at, cand.a, cand.b);
                if d > eps {
                    continue;
                }
                if (z_at(&elevations[ti], cand.piece, u) - z).abs() > grade {
                    report.grade_separated += 1;
                    continue;
                }
                if plan.push(other.id, cand.piece, u, node_id) {
                    report.t_junctions += 1;
                }
            }
        }
    }

    let mut any = false;
    for (segment, cuts) in plan.0 {
        match model.split_segment(segment, &cuts) {
            Ok((ids, inv)) => {
                any = true;
                report.segments_created += ids.len().saturating_sub(1);
                report.invalidated.extend(inv);
            }
            Err(EditError::Degenerate(e)) => {
                warn!(%segment, error = %e, "split rejected; leaving segment whole");
            }
            Err(other) => return Err(other.into()),
        }
    }
    Ok(any)
}

// ── Phase 3: dedupe ───────────────────────────────────────────────────────────

/// Same node pair and matching control polylines, in either direction.
fn same_path(a: &Segment, b: &Segment, eps: f64) -> bool {
    if a.points.len() != b.points.len() {
        return false;
    }
    let close = |x: DVec2, y: DVec2| x.distance(y) <= eps;
    if a.start == b.start && a.end == b.end {
        a.points.iter().zip(&b.points).all(|(p, q)| close(p.pos, q.pos))
    } else if a.start == b.end && a.end == b.start {
        a.points.iter().zip(b.points.iter().rev()).all(|(p, q)| close(p.pos, q.pos))
    } else {
        false
    }
}

fn dedupe(model: &mut NetworkModel, report: &mut TopologyReport) -> TopologyResult<()> {
    let eps = model.config().snap_tolerance;
    let mut groups: BTreeMap<(NodeId, NodeId), Vec<SegmentId>> = BTreeMap::new();
    for seg in model.segments() {
        let key = (seg.start.min(seg.end), seg.start.max(seg.end));
        groups.entry(key).or_default().push(seg.id);
    }

    for ids in groups.into_values().filter(|g| g.len() > 1) {
        let mut survivors: Vec<SegmentId> = Vec::new();
        for id in ids {
            let duplicate = {
                let Some(seg) = model.segment(id) else { continue };
                survivors
                    .iter()
                    .filter_map(|s| model.segment(*s))
                    .any(|keep| same_path(keep, seg, eps))
            };
            if duplicate {
                report.invalidated.extend(model.delete_segment(id)?);
                report.duplicates_removed += 1;
            } else {
                survivors.push(id);
            }
        }
    }
    Ok(())
}
