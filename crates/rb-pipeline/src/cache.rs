//! Derived-geometry caches keyed by entity version and trims.
//!
//! A ribbon depends on its segment and the two trims; a patch depends on its
//! junction, its effective radius and every incident arm: which segment end
//! it is and the key of its ribbon.
//! Anything whose key is unchanged is reused as-is, which is what makes an
//! incremental pass produce the same regions as a full rebuild.

use std::collections::BTreeMap;
use std::sync::Arc;

use rb_core::{DegenerateGeometryError, JunctionId, NodeId, SegmentId};
use rb_corridor::{Ribbon, Trims};
use rb_junction::{JunctionGeometryError, JunctionPatch};
use rb_network::{NetworkModel, Segment, SegmentEnd};

/// Inputs of one ribbon.  Trims are compared bit for bit.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub struct RibbonKey {
    pub version: u64,
    start_trim: u64,
    end_trim: u64,
}

impl RibbonKey {
    pub fn new(version: u64, trims: Trims) -> Self {
        RibbonKey { version, start_trim: trims.start.to_bits(), end_trim: trims.end.to_bits() }
    }
}

/// One incident arm of a patch.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub struct ArmKey {
    pub segment: SegmentId,
    pub end: SegmentEnd,
    pub ribbon: RibbonKey,
}

/// Inputs of one patch.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PatchKey {
    pub version: u64,
    radius: u64,
    /// In incidence order.
    pub arms: Vec<ArmKey>,
}

impl PatchKey {
    pub fn new(version: u64, radius: f64, arms: Vec<ArmKey>) -> Self {
        PatchKey { version, radius: radius.to_bits(), arms }
    }
}

#[derive(Clone, Debug)]
pub(crate) struct RibbonEntry {
    pub key: RibbonKey,
    pub ribbon: Result<Arc<Ribbon>, DegenerateGeometryError>,
}

#[derive(Clone, Debug)]
pub(crate) struct PatchEntry {
    pub key: PatchKey,
    pub patch: Result<Arc<JunctionPatch>, JunctionGeometryError>,
}

#[derive(Clone, Debug, Default)]
pub(crate) struct Caches {
    pub ribbons: BTreeMap<SegmentId, RibbonEntry>,
    pub patches: BTreeMap<JunctionId, PatchEntry>,
}

impl Caches {
    pub fn ribbon(&self, id: SegmentId) -> Option<&Ribbon> {
        self.ribbons.get(&id)?.ribbon.as_deref().ok()
    }
}

// ── Radius overrides ──────────────────────────────────────────────────────────

/// A grown radius for one junction, valid while the junction keeps the
/// version it was grown at.
#[derive(Copy, Clone, Debug, PartialEq)]
pub(crate) struct RadiusOverride {
    pub version: u64,
    pub radius: f64,
}

pub(crate) type Overrides = BTreeMap<JunctionId, RadiusOverride>;

/// `true` if `id` carries an override matching its current version.
pub(crate) fn has_override(model: &NetworkModel, overrides: &Overrides, id: JunctionId) -> bool {
    match (model.junction(id), overrides.get(&id)) {
        (Some(j), Some(o)) => o.version == j.version,
        _ => false,
    }
}

/// Effective trim radius at `node`: the override if current, else the
/// junction's own radius, 0 at dead ends.
pub(crate) fn radius_at(model: &NetworkModel, overrides: &Overrides, node: NodeId) -> f64 {
    let id = JunctionId::of(node);
    match model.junction(id) {
        Some(j) => match overrides.get(&id) {
            Some(o) if o.version == j.version => o.radius,
            _ => j.radius,
        },
        None => 0.0,
    }
}

pub(crate) fn trims_for(model: &NetworkModel, overrides: &Overrides, seg: &Segment) -> Trims {
    Trims::new(radius_at(model, overrides, seg.start), radius_at(model, overrides, seg.end))
}
