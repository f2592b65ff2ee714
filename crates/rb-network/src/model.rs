//! The authoritative road network: node and segment arenas plus the derived
//! junction table.
//!
//! # Storage
//!
//! Nodes and segments live in `Vec<Option<_>>` arenas indexed by their typed
//! ID.  IDs are allocated sequentially and never reused; a deleted entity
//! leaves a `None` hole.  Junctions are keyed by [`JunctionId`] (numerically
//! the owning node) in a `BTreeMap`, so iteration is always in ID order.
//!
//! Every mutation goes through the edit API in [`crate::edit`], which keeps
//! the three tables consistent and reports the affected mesh regions.

use std::collections::BTreeMap;

use rb_core::geom::cumulative_lengths;
use rb_core::{BuildConfig, CoreError, DVec2, DVec3, JunctionId, NodeId, SegmentId};

use crate::junction::Junction;

/// Free-form key/value tags carried through from the source data.
pub type Tags = BTreeMap<String, String>;

// ── Node ──────────────────────────────────────────────────────────────────────

/// A point where segments meet or terminate.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Node {
    pub id: NodeId,
    /// Local position; `z` is elevation.
    pub pos: DVec3,
    pub tags: Tags,
    /// Bumped on every change to this node.
    pub version: u64,
    /// Incident segments, in the order they were attached.
    pub segments: Vec<SegmentId>,
    /// OSM node id this node was imported from, if any.
    pub source: Option<i64>,
}

impl Node {
    #[inline]
    pub fn degree(&self) -> usize {
        self.segments.len()
    }

    #[inline]
    pub fn xy(&self) -> DVec2 {
        self.pos.truncate()
    }
}

// ── ControlPoint / RoadClass ──────────────────────────────────────────────────

/// One point of a segment's control path, with optional per-point overrides.
#[derive(Copy, Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ControlPoint {
    pub pos: DVec2,
    pub elevation: Option<f64>,
    /// Full road width at this point.
    pub width: Option<f64>,
}

impl ControlPoint {
    pub fn new(pos: DVec2) -> Self {
        Self { pos, elevation: None, width: None }
    }

    pub fn with_elevation(mut self, z: f64) -> Self {
        self.elevation = Some(z);
        self
    }

    pub fn with_width(mut self, w: f64) -> Self {
        self.width = Some(w);
        self
    }
}

/// Raised sidewalks outside the carriageway, left and right of the
/// segment's direction.  A width of 0 means no sidewalk on that side.
#[derive(Copy, Clone, Debug, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Sidewalks {
    pub left: f64,
    pub right: f64,
    /// Curb height above the carriageway edge.
    pub curb_height: f64,
}

impl Sidewalks {
    pub fn both(width: f64, curb_height: f64) -> Self {
        Sidewalks { left: width, right: width, curb_height }
    }

    pub fn is_empty(&self) -> bool {
        !(self.left > 0.0) && !(self.right > 0.0)
    }
}

/// Cross-section description of a road.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct RoadClass {
    pub lane_width: f64,
    /// Both directions together.
    pub lanes: u32,
    pub shoulder_width: f64,
    /// Traffic runs one way, so no centre line is painted.
    pub oneway: bool,
    pub sidewalks: Sidewalks,
    pub surface: Option<String>,
    /// Explicit carriageway width (OSM `width`), overriding the lane
    /// arithmetic.  Sidewalks are outside it.
    pub width_override: Option<f64>,
}

impl RoadClass {
    pub fn new(lanes: u32, lane_width: f64) -> Self {
        Self {
            lane_width,
            lanes,
            shoulder_width: 0.0,
            oneway: false,
            sidewalks: Sidewalks::default(),
            surface: None,
            width_override: None,
        }
    }

    pub fn with_shoulders(mut self, shoulder_width: f64) -> Self {
        self.shoulder_width = shoulder_width;
        self
    }

    pub fn with_sidewalks(mut self, sidewalks: Sidewalks) -> Self {
        self.sidewalks = sidewalks;
        self
    }

    pub fn one_way(mut self) -> Self {
        self.oneway = true;
        self
    }

    /// Carriageway width: `lanes·lane_width + 2·shoulder_width`, unless
    /// overridden.
    pub fn declared_width(&self) -> f64 {
        self.width_override
            .unwrap_or(self.lanes as f64 * self.lane_width + 2.0 * self.shoulder_width)
    }
}

// ── Segment ───────────────────────────────────────────────────────────────────

/// Which end of a segment touches a node.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum SegmentEnd {
    Start,
    End,
}

impl SegmentEnd {
    pub fn opposite(self) -> SegmentEnd {
        match self {
            SegmentEnd::Start => SegmentEnd::End,
            SegmentEnd::End => SegmentEnd::Start,
        }
    }
}

/// A road section between two nodes.
///
/// `points[0]` and `points[last]` always sit exactly on the start and end
/// node (position and elevation); the edit API maintains this.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Segment {
    pub id: SegmentId,
    pub start: NodeId,
    pub end: NodeId,
    pub points: Vec<ControlPoint>,
    pub class: RoadClass,
    pub tags: Tags,
    pub version: u64,
    /// OSM way id this segment was cut from, if any.
    pub source_way: Option<i64>,
}

impl Segment {
    #[inline]
    pub fn node_at(&self, end: SegmentEnd) -> NodeId {
        match end {
            SegmentEnd::Start => self.start,
            SegmentEnd::End => self.end,
        }
    }

    /// The end of this segment attached to `node`, if any.
    pub fn end_at(&self, node: NodeId) -> Option<SegmentEnd> {
        if self.start == node {
            Some(SegmentEnd::Start)
        } else if self.end == node {
            Some(SegmentEnd::End)
        } else {
            None
        }
    }

    /// The node at the far end from `node`.
    pub fn other(&self, node: NodeId) -> NodeId {
        if self.start == node { self.end } else { self.start }
    }

    pub fn xy(&self) -> Vec<DVec2> {
        self.points.iter().map(|p| p.pos).collect()
    }

    /// Length of the straight control polygon.
    pub fn polyline_length(&self) -> f64 {
        self.points.windows(2).map(|w| w[0].pos.distance(w[1].pos)).sum()
    }

    /// Unit direction leaving the node at `end`, along the first control
    /// piece.
    pub fn outgoing_dir(&self, end: SegmentEnd) -> DVec2 {
        let n = self.points.len();
        let (a, b) = match end {
            SegmentEnd::Start => (self.points[0].pos, self.points[1].pos),
            SegmentEnd::End => (self.points[n - 1].pos, self.points[n - 2].pos),
        };
        (b - a).normalize_or_zero()
    }

    /// Half of the road width at the given end.
    pub fn half_width_at(&self, end: SegmentEnd) -> f64 {
        let p = match end {
            SegmentEnd::Start => self.points[0],
            SegmentEnd::End => self.points[self.points.len() - 1],
        };
        0.5 * p.width.unwrap_or_else(|| self.class.declared_width())
    }

    /// Elevation at every control point, gaps filled by polyline arc length.
    pub fn resolved_elevations(&self) -> Vec<f64> {
        let s = cumulative_lengths(&self.xy());
        let z: Vec<Option<f64>> = self.points.iter().map(|p| p.elevation).collect();
        rb_core::geom::fill_by_arc_length(&s, &z, 0.0)
    }
}

// ── NetworkModel ──────────────────────────────────────────────────────────────

/// Arena-backed road network.
///
/// Cloning is a deep copy; the pipeline keeps the model behind an `Arc` and
/// clones only when edits arrive while a snapshot is still shared.
#[derive(Clone, Debug, PartialEq)]
pub struct NetworkModel {
    pub(crate) nodes: Vec<Option<Node>>,
    pub(crate) segments: Vec<Option<Segment>>,
    pub(crate) junctions: BTreeMap<JunctionId, Junction>,
    /// Source of junction versions; never reused, even across removal.
    pub(crate) junction_clock: u64,
    pub(crate) config: BuildConfig,
}

impl Default for NetworkModel {
    fn default() -> Self {
        Self::new(BuildConfig::default())
    }
}

impl NetworkModel {
    pub fn new(config: BuildConfig) -> Self {
        Self {
            nodes: Vec::new(),
            segments: Vec::new(),
            junctions: BTreeMap::new(),
            junction_clock: 0,
            config,
        }
    }

    /// Configuration used for junction sizing and default road classes.
    pub fn config(&self) -> &BuildConfig {
        &self.config
    }

    /// Replace the configuration and recompute every junction.
    pub fn set_config(&mut self, config: BuildConfig) {
        self.config = config;
        self.rebuild_junctions();
    }

    // ── Lookup ────────────────────────────────────────────────────────────

    pub fn node(&self, id: NodeId) -> Option<&Node> {
        self.nodes.get(id.index()).and_then(Option::as_ref)
    }

    pub fn segment(&self, id: SegmentId) -> Option<&Segment> {
        self.segments.get(id.index()).and_then(Option::as_ref)
    }

    pub fn junction(&self, id: JunctionId) -> Option<&Junction> {
        self.junctions.get(&id)
    }

    pub fn try_node(&self, id: NodeId) -> Result<&Node, CoreError> {
        self.node(id).ok_or(CoreError::NodeNotFound(id))
    }

    pub fn try_segment(&self, id: SegmentId) -> Result<&Segment, CoreError> {
        self.segment(id).ok_or(CoreError::SegmentNotFound(id))
    }

    pub(crate) fn node_mut(&mut self, id: NodeId) -> Result<&mut Node, CoreError> {
        self.nodes
            .get_mut(id.index())
            .and_then(Option::as_mut)
            .ok_or(CoreError::NodeNotFound(id))
    }

    pub(crate) fn segment_mut(&mut self, id: SegmentId) -> Result<&mut Segment, CoreError> {
        self.segments
            .get_mut(id.index())
            .and_then(Option::as_mut)
            .ok_or(CoreError::SegmentNotFound(id))
    }

    // ── Iteration (always ascending ID) ───────────────────────────────────

    pub fn nodes(&self) -> impl Iterator<Item = &Node> + '_ {
        self.nodes.iter().flatten()
    }

    pub fn segments(&self) -> impl Iterator<Item = &Segment> + '_ {
        self.segments.iter().flatten()
    }

    pub fn junctions(&self) -> impl Iterator<Item = &Junction> + '_ {
        self.junctions.values()
    }

    pub fn node_count(&self) -> usize {
        self.nodes().count()
    }

    pub fn segment_count(&self) -> usize {
        self.segments().count()
    }

    pub fn junction_count(&self) -> usize {
        self.junctions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes().next().is_none()
    }

    /// Distance the ribbon is cut back at `node`: the junction radius, or 0
    /// at a dead end.
    pub fn trim_at(&self, node: NodeId) -> f64 {
        self.junction(JunctionId::of(node)).map_or(0.0, |j| j.radius)
    }

    /// Every segment endpoint sits exactly on its node, and node incidence
    /// lists agree with segment endpoints.
    pub fn check_consistency(&self) -> Result<(), String> {
        for seg in self.segments() {
            for end in [SegmentEnd::Start, SegmentEnd::End] {
                let node = self
                    .node(seg.node_at(end))
                    .ok_or_else(|| format!("{} references missing {}", seg.id, seg.node_at(end)))?;
                let cp = match end {
                    SegmentEnd::Start => seg.points[0],
                    SegmentEnd::End => seg.points[seg.points.len() - 1],
                };
                if cp.pos != node.xy() || cp.elevation != Some(node.pos.z) {
                    return Err(format!("{} {:?} is off {}", seg.id, end, node.id));
                }
                if !node.segments.contains(&seg.id) {
                    return Err(format!("{} does not list {}", node.id, seg.id));
                }
            }
        }
        for node in self.nodes() {
            for s in &node.segments {
                if self.segment(*s).and_then(|seg| seg.end_at(node.id)).is_none() {
                    return Err(format!("{} lists unrelated {}", node.id, s));
                }
            }
            let has_junction = self.junctions.contains_key(&JunctionId::of(node.id));
            if has_junction != (node.degree() >= 2) {
                return Err(format!("{} degree {} vs junction {}", node.id, node.degree(), has_junction));
            }
        }
        Ok(())
    }
}
