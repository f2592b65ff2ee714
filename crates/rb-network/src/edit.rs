//! Edit API: every mutation of a [`NetworkModel`] after construction.
//!
//! Each operation validates first and mutates second, so an `Err` leaves the
//! model untouched.  On success it returns the [`Invalidation`]: the set of
//! mesh regions whose inputs may have changed.  The set is conservative: it
//! always covers the touched segments, the junctions at their endpoints, and,
//! when a junction's shape changes, every ribbon trimmed by it together with
//! the junctions at those ribbons' far ends.
//!
//! [`Edit`] is the same API as plain values, for hosts that queue edits while
//! a build pass is running.

use std::collections::BTreeSet;

use rb_core::geom::{cumulative_lengths, fill_by_arc_length};
use rb_core::{DVec3, DegenerateGeometryError, JunctionId, NodeId, RegionId, SegmentId};

use crate::error::{EditError, EditResult};
use crate::model::{ControlPoint, NetworkModel, Node, RoadClass, Segment, SegmentEnd, Tags};

/// Mesh regions affected by an edit.
pub type Invalidation = BTreeSet<RegionId>;

/// Closer than this, two consecutive control points are the same point.
const POINT_EPS: f64 = 1e-9;

// ── Inputs ────────────────────────────────────────────────────────────────────

/// Everything needed to create a segment.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct SegmentSpec {
    pub start: NodeId,
    pub end: NodeId,
    /// Control points strictly between the two nodes.
    pub interior: Vec<ControlPoint>,
    pub class: RoadClass,
    pub tags: Tags,
    pub source_way: Option<i64>,
}

impl SegmentSpec {
    pub fn new(start: NodeId, end: NodeId, class: RoadClass) -> Self {
        Self {
            start,
            end,
            interior: Vec::new(),
            class,
            tags: Tags::new(),
            source_way: None,
        }
    }

    pub fn with_interior(mut self, interior: Vec<ControlPoint>) -> Self {
        self.interior = interior;
        self
    }

    pub fn with_tags(mut self, tags: Tags) -> Self {
        self.tags = tags;
        self
    }
}

/// A split position along a segment's control polygon: parameter `t` on the
/// piece between `points[piece]` and `points[piece + 1]`.  The node must
/// already exist and sit at that position.
#[derive(Copy, Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Cut {
    pub piece: usize,
    pub t: f64,
    pub node: NodeId,
}

/// A queued edit.  [`Edit::apply`] dispatches to the matching method.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Edit {
    AddNode { pos: DVec3, tags: Tags },
    MoveNode { node: NodeId, pos: DVec3 },
    DeleteNode(NodeId),
    AddSegment(SegmentSpec),
    DeleteSegment(SegmentId),
    RetargetSegment { segment: SegmentId, end: SegmentEnd, node: NodeId },
    SetSegmentClass { segment: SegmentId, class: RoadClass },
    SetControlPoints { segment: SegmentId, points: Vec<ControlPoint> },
    SplitSegment { segment: SegmentId, cuts: Vec<Cut> },
    MergeNodes { keep: NodeId, merge: NodeId },
}

impl Edit {
    pub fn apply(self, model: &mut NetworkModel) -> EditResult<Invalidation> {
        match self {
            Edit::AddNode { pos, tags } => {
                model.add_node(pos, tags);
                Ok(Invalidation::new())
            }
            Edit::MoveNode { node, pos } => model.move_node(node, pos),
            Edit::DeleteNode(node) => model.delete_node(node),
            Edit::AddSegment(spec) => model.add_segment(spec).map(|(_, inv)| inv),
            Edit::DeleteSegment(seg) => model.delete_segment(seg),
            Edit::RetargetSegment { segment, end, node } => {
                model.retarget_segment(segment, end, node)
            }
            Edit::SetSegmentClass { segment, class } => model.set_segment_class(segment, class),
            Edit::SetControlPoints { segment, points } => {
                model.set_control_points(segment, points)
            }
            Edit::SplitSegment { segment, cuts } => {
                model.split_segment(segment, &cuts).map(|(_, inv)| inv)
            }
            Edit::MergeNodes { keep, merge } => model.merge_nodes(keep, merge),
        }
    }
}

// ── Operations ────────────────────────────────────────────────────────────────

impl NetworkModel {
    /// Add an unconnected node.  Nodes carry no mesh region, so nothing is
    /// invalidated.
    pub fn add_node(&mut self, pos: DVec3, tags: Tags) -> NodeId {
        self.push_node(pos, tags, None)
    }

    pub(crate) fn push_node(&mut self, pos: DVec3, tags: Tags, source: Option<i64>) -> NodeId {
        let id = NodeId(self.nodes.len() as u32);
        self.nodes.push(Some(Node {
            id,
            pos,
            tags,
            version: 0,
            segments: Vec::new(),
            source,
        }));
        id
    }

    /// Move a node; its incident segments follow.
    pub fn move_node(&mut self, node: NodeId, pos: DVec3) -> EditResult<Invalidation> {
        let incident = self.try_node(node)?.segments.clone();

        // Validate every incident segment against the new position first.
        let mut reshaped = Vec::with_capacity(incident.len());
        for &sid in &incident {
            let seg = self.try_segment(sid)?;
            let mut points = seg.points.clone();
            let idx = if seg.start == node { 0 } else { points.len() - 1 };
            points[idx].pos = pos.truncate();
            points[idx].elevation = Some(pos.z);
            let points = self.prepare_points_with(sid, seg.start, seg.end, points, &seg.class, Some((node, pos)))?;
            reshaped.push((sid, points));
        }

        let n = self.node_mut(node)?;
        n.pos = pos;
        n.version += 1;

        let mut nodes = BTreeSet::from([node]);
        let mut segments = BTreeSet::new();
        for (sid, points) in reshaped {
            let seg = self.segment_mut(sid)?;
            seg.points = points;
            seg.version += 1;
            nodes.insert(seg.start);
            nodes.insert(seg.end);
            segments.insert(sid);
        }
        Ok(self.settle(segments, nodes))
    }

    /// Delete a node and, first, every segment attached to it.
    pub fn delete_node(&mut self, node: NodeId) -> EditResult<Invalidation> {
        let incident = self.try_node(node)?.segments.clone();
        let mut nodes = BTreeSet::from([node]);
        let mut segments = BTreeSet::new();
        for sid in incident {
            if let Some(seg) = self.remove_segment(sid) {
                nodes.insert(seg.start);
                nodes.insert(seg.end);
                segments.insert(sid);
            }
        }
        self.nodes[node.index()] = None;
        Ok(self.settle(segments, nodes))
    }

    /// Create a segment between two existing nodes.
    pub fn add_segment(&mut self, spec: SegmentSpec) -> EditResult<(SegmentId, Invalidation)> {
        let id = SegmentId(self.segments.len() as u32);
        let mut points = Vec::with_capacity(spec.interior.len() + 2);
        points.push(ControlPoint::new(self.try_node(spec.start)?.xy()));
        points.extend(spec.interior.iter().copied());
        points.push(ControlPoint::new(self.try_node(spec.end)?.xy()));
        let points = self.prepare_points(id, spec.start, spec.end, points, &spec.class)?;

        self.segments.push(Some(Segment {
            id,
            start: spec.start,
            end: spec.end,
            points,
            class: spec.class,
            tags: spec.tags,
            version: 0,
            source_way: spec.source_way,
        }));
        self.attach(id, spec.start)?;
        self.attach(id, spec.end)?;

        let inv = self.settle(BTreeSet::from([id]), BTreeSet::from([spec.start, spec.end]));
        Ok((id, inv))
    }

    pub fn delete_segment(&mut self, segment: SegmentId) -> EditResult<Invalidation> {
        self.try_segment(segment)?;
        let mut nodes = BTreeSet::new();
        if let Some(seg) = self.remove_segment(segment) {
            nodes.insert(seg.start);
            nodes.insert(seg.end);
        }
        Ok(self.settle(BTreeSet::from([segment]), nodes))
    }

    /// Re-attach one end of a segment to a different node.  The end control
    /// point moves onto the new node.
    pub fn retarget_segment(
        &mut self,
        segment: SegmentId,
        end: SegmentEnd,
        node: NodeId,
    ) -> EditResult<Invalidation> {
        let seg = self.try_segment(segment)?;
        let (start, stop) = match end {
            SegmentEnd::Start => (node, seg.end),
            SegmentEnd::End => (seg.start, node),
        };
        let points = seg.points.clone();
        self.reshape(segment, start, stop, points)
    }

    pub fn set_segment_class(&mut self, segment: SegmentId, class: RoadClass) -> EditResult<Invalidation> {
        let seg = self.try_segment(segment)?;
        let width = class.declared_width();
        if !(width > 0.0) {
            return Err(DegenerateGeometryError::NonPositiveWidth { segment, width }.into());
        }
        let (start, end) = (seg.start, seg.end);
        let seg = self.segment_mut(segment)?;
        seg.class = class;
        seg.version += 1;
        Ok(self.settle(BTreeSet::from([segment]), BTreeSet::from([start, end])))
    }

    /// Replace the whole control path.  The first and last points are pinned
    /// to the segment's nodes.
    pub fn set_control_points(
        &mut self,
        segment: SegmentId,
        points: Vec<ControlPoint>,
    ) -> EditResult<Invalidation> {
        let seg = self.try_segment(segment)?;
        let (start, end) = (seg.start, seg.end);
        self.reshape(segment, start, end, points)
    }

    /// Split a segment at the given cuts.  The first surviving piece keeps
    /// the segment's ID; the others get fresh IDs with the same class and
    /// tags.  Pieces that would start and end on the same node are dropped.
    pub fn split_segment(
        &mut self,
        segment: SegmentId,
        cuts: &[Cut],
    ) -> EditResult<(Vec<SegmentId>, Invalidation)> {
        let seg = self.try_segment(segment)?.clone();
        let invalid = |reason: String| EditError::InvalidSplit { segment, reason };

        let mut cuts = cuts.to_vec();
        cuts.sort_by(|a, b| a.piece.cmp(&b.piece).then(a.t.total_cmp(&b.t)));
        for c in &cuts {
            if c.piece + 1 >= seg.points.len() || !(0.0..=1.0).contains(&c.t) {
                return Err(invalid(format!("cut {c:?} outside the control polygon")));
            }
            self.try_node(c.node)?;
        }

        // Widths are resolved at the cut so both halves keep the same taper.
        let xy = seg.xy();
        let s = cumulative_lengths(&xy);
        let any_width = seg.points.iter().any(|p| p.width.is_some());
        let widths: Vec<Option<f64>> = seg.points.iter().map(|p| p.width).collect();
        let resolved = fill_by_arc_length(&s, &widths, seg.class.declared_width());

        let mut parts: Vec<(NodeId, NodeId, Vec<ControlPoint>)> = Vec::new();
        let mut current = vec![seg.points[0]];
        let mut current_start = seg.start;
        let mut next_cut = 0;
        for piece in 0..seg.points.len() - 1 {
            while next_cut < cuts.len() && cuts[next_cut].piece == piece {
                let c = cuts[next_cut];
                next_cut += 1;
                let node = self.try_node(c.node)?;
                let mut cp = ControlPoint::new(node.xy()).with_elevation(node.pos.z);
                if any_width {
                    cp.width = Some(resolved[piece] + (resolved[piece + 1] - resolved[piece]) * c.t);
                }
                current.push(cp);
                parts.push((current_start, c.node, std::mem::replace(&mut current, vec![cp])));
                current_start = c.node;
            }
            current.push(seg.points[piece + 1]);
        }
        parts.push((current_start, seg.end, current));
        parts.retain(|(a, b, _)| a != b);

        // Validate every piece before touching the model.
        let mut prepared = Vec::with_capacity(parts.len());
        for (i, (a, b, points)) in parts.into_iter().enumerate() {
            let id = if i == 0 { segment } else { SegmentId::INVALID };
            prepared.push((a, b, self.prepare_points(id, a, b, points, &seg.class)?));
        }

        let mut nodes: BTreeSet<NodeId> = BTreeSet::from([seg.start, seg.end]);
        let mut touched = BTreeSet::from([segment]);
        let mut ids = Vec::with_capacity(prepared.len());
        let mut iter = prepared.into_iter();

        match iter.next() {
            Some((a, b, points)) => {
                self.detach(segment, seg.start);
                self.detach(segment, seg.end);
                let s = self.segment_mut(segment)?;
                s.start = a;
                s.end = b;
                s.points = points;
                s.version += 1;
                self.attach(segment, a)?;
                self.attach(segment, b)?;
                nodes.extend([a, b]);
                ids.push(segment);
            }
            None => {
                self.remove_segment(segment);
            }
        }
        for (a, b, points) in iter {
            let id = SegmentId(self.segments.len() as u32);
            self.segments.push(Some(Segment {
                id,
                start: a,
                end: b,
                points,
                class: seg.class.clone(),
                tags: seg.tags.clone(),
                version: 0,
                source_way: seg.source_way,
            }));
            self.attach(id, a)?;
            self.attach(id, b)?;
            nodes.extend([a, b]);
            touched.insert(id);
            ids.push(id);
        }

        Ok((ids, self.settle(touched, nodes)))
    }

    /// Fold `merge` into `keep`: every segment on `merge` is re-attached to
    /// `keep` and `merge` is deleted.  Segments that would collapse onto
    /// `keep` are deleted instead.
    pub fn merge_nodes(&mut self, keep: NodeId, merge: NodeId) -> EditResult<Invalidation> {
        self.try_node(keep)?;
        let incident = self.try_node(merge)?.segments.clone();
        if keep == merge {
            return Ok(Invalidation::new());
        }

        let mut plans = Vec::with_capacity(incident.len());
        for sid in incident {
            let seg = self.try_segment(sid)?;
            let (a, b) = if seg.start == merge { (keep, seg.end) } else { (seg.start, keep) };
            let plan = self.prepare_points(sid, a, b, seg.points.clone(), &seg.class).ok();
            plans.push((sid, seg.start, seg.end, a, b, plan));
        }

        let mut nodes = BTreeSet::from([keep, merge]);
        let mut segments = BTreeSet::new();
        for (sid, old_a, old_b, a, b, plan) in plans {
            segments.insert(sid);
            nodes.extend([old_a, old_b]);
            match plan {
                Some(points) => {
                    self.detach(sid, merge);
                    let s = self.segment_mut(sid)?;
                    s.start = a;
                    s.end = b;
                    s.points = points;
                    s.version += 1;
                    self.attach(sid, keep)?;
                }
                None => {
                    self.remove_segment(sid);
                }
            }
        }
        self.nodes[merge.index()] = None;
        Ok(self.settle(segments, nodes))
    }

    // ── Internals ─────────────────────────────────────────────────────────

    fn reshape(
        &mut self,
        segment: SegmentId,
        start: NodeId,
        end: NodeId,
        points: Vec<ControlPoint>,
    ) -> EditResult<Invalidation> {
        let seg = self.try_segment(segment)?;
        let (old_start, old_end) = (seg.start, seg.end);
        let points = self.prepare_points(segment, start, end, points, &seg.class)?;

        self.detach(segment, old_start);
        self.detach(segment, old_end);
        let s = self.segment_mut(segment)?;
        s.start = start;
        s.end = end;
        s.points = points;
        s.version += 1;
        self.attach(segment, start)?;
        self.attach(segment, end)?;

        Ok(self.settle(
            BTreeSet::from([segment]),
            BTreeSet::from([old_start, old_end, start, end]),
        ))
    }

    fn prepare_points(
        &self,
        id: SegmentId,
        start: NodeId,
        end: NodeId,
        points: Vec<ControlPoint>,
        class: &RoadClass,
    ) -> EditResult<Vec<ControlPoint>> {
        self.prepare_points_with(id, start, end, points, class, None)
    }

    /// Validate and normalise a control path: endpoints pinned to the nodes
    /// (optionally with one node at a pending position), repeated points
    /// removed.
    fn prepare_points_with(
        &self,
        id: SegmentId,
        start: NodeId,
        end: NodeId,
        points: Vec<ControlPoint>,
        class: &RoadClass,
        pending: Option<(NodeId, DVec3)>,
    ) -> EditResult<Vec<ControlPoint>> {
        if points.len() < 2 {
            return Err(DegenerateGeometryError::TooFewPoints { segment: id, got: points.len() }.into());
        }
        if start == end {
            return Err(DegenerateGeometryError::SelfLoop { segment: id, node: start }.into());
        }
        let pos_of = |n: NodeId| -> EditResult<DVec3> {
            match pending {
                Some((p, pos)) if p == n => Ok(pos),
                _ => Ok(self.try_node(n)?.pos),
            }
        };
        let (a, b) = (pos_of(start)?, pos_of(end)?);

        let width = class.declared_width();
        if !(width > 0.0) {
            return Err(DegenerateGeometryError::NonPositiveWidth { segment: id, width }.into());
        }
        if let Some(w) = points.iter().filter_map(|p| p.width).find(|w| !(*w > 0.0)) {
            return Err(DegenerateGeometryError::NonPositiveWidth { segment: id, width: w }.into());
        }
        if a.truncate().distance(b.truncate()) <= POINT_EPS {
            return Err(DegenerateGeometryError::ZeroLength { segment: id }.into());
        }

        let last = points.len() - 1;
        let mut out: Vec<ControlPoint> = Vec::with_capacity(points.len());
        for (i, mut p) in points.into_iter().enumerate() {
            if i == 0 {
                p.pos = a.truncate();
                p.elevation = Some(a.z);
            } else if i == last {
                p.pos = b.truncate();
                p.elevation = Some(b.z);
                // The end point replaces an interior point sitting on it.
                while out.len() > 1 && out[out.len() - 1].pos.distance(p.pos) <= POINT_EPS {
                    out.pop();
                }
            } else if out[out.len() - 1].pos.distance(p.pos) <= POINT_EPS
                || p.pos.distance(b.truncate()) <= POINT_EPS
            {
                continue;
            }
            out.push(p);
        }
        Ok(out)
    }

    fn attach(&mut self, segment: SegmentId, node: NodeId) -> EditResult<()> {
        let n = self.node_mut(node)?;
        if !n.segments.contains(&segment) {
            n.segments.push(segment);
        }
        Ok(())
    }

    fn detach(&mut self, segment: SegmentId, node: NodeId) {
        if let Some(Some(n)) = self.nodes.get_mut(node.index()) {
            n.segments.retain(|&s| s != segment);
        }
    }

    fn remove_segment(&mut self, segment: SegmentId) -> Option<Segment> {
        let seg = self.segments.get_mut(segment.index())?.take()?;
        self.detach(segment, seg.start);
        self.detach(segment, seg.end);
        Some(seg)
    }

    /// Refresh junctions at `nodes` and collect the invalidated regions.
    fn settle(&mut self, segments: BTreeSet<SegmentId>, nodes: BTreeSet<NodeId>) -> Invalidation {
        let mut out: Invalidation = segments.iter().map(|&s| RegionId::Segment(s)).collect();
        let has_junction = |m: &NetworkModel, n: NodeId| m.junctions.contains_key(&JunctionId::of(n));

        for &n in &nodes {
            if has_junction(self, n) {
                out.insert(RegionId::Junction(JunctionId::of(n)));
            }
        }

        let changed = self.refresh_junctions(nodes.iter().copied());
        for &n in &changed {
            out.insert(RegionId::Junction(JunctionId::of(n)));
            let Some(node) = self.node(n) else { continue };
            for &s in &node.segments {
                out.insert(RegionId::Segment(s));
                if let Some(seg) = self.segment(s) {
                    let far = seg.other(n);
                    if has_junction(self, far) {
                        out.insert(RegionId::Junction(JunctionId::of(far)));
                    }
                }
            }
        }

        for &n in &nodes {
            if has_junction(self, n) {
                out.insert(RegionId::Junction(JunctionId::of(n)));
            }
        }
        out
    }
}
