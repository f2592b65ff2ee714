//! Patch construction.
//!
//! The boundary ring is assembled from the end frames of the incident
//! ribbons in counter-clockwise incidence order.  Looking outward from the
//! node, a ribbon that *starts* at the junction has its left edge on the
//! counter-clockwise side, so its frame vertices (stored left → right) are
//! reversed; a ribbon that *ends* here is already in ring order.

use rb_core::geom::{orient, ring_area, ring_is_simple};
use rb_core::{BuildConfig, DVec2, DVec3, JunctionId, SegmentId};
use rb_corridor::Ribbon;
use rb_network::{Junction, NetworkModel, SegmentEnd};

use crate::error::{JunctionGeometryError, JunctionResult};

/// Minimum doubled triangle area for a fan triangle to count as CCW.
const MIN_ORIENT: f64 = 1e-12;

/// How the gap at a junction is filled.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum PatchKind {
    /// Untrimmed straight pass-through: the two end frames meet at the node
    /// and only the wedge left open between them is filled.  Exactly
    /// collinear ends leave no triangles at all.
    Seam,
    /// Degree 2 with a bend: strip zipped between the two end frames.
    Bridge,
    /// Degree ≥ 3: triangle fan from a centre vertex.
    Fan,
}

/// Where one incidence's vertices sit in the boundary ring.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct BoundaryRun {
    pub segment: SegmentId,
    pub end: SegmentEnd,
    pub first: usize,
    pub len: usize,
}

/// Triangulated surface filling one junction.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct JunctionPatch {
    pub junction: JunctionId,
    /// Junction version the patch was built from.
    pub version: u64,
    pub kind: PatchKind,
    /// The first `boundary_len` vertices are the ring; a fan appends its
    /// centre.
    pub vertices: Vec<DVec3>,
    pub boundary_len: usize,
    pub runs: Vec<BoundaryRun>,
    /// Counter-clockwise from above.
    pub triangles: Vec<[u32; 3]>,
}

impl JunctionPatch {
    pub fn boundary(&self) -> &[DVec3] {
        &self.vertices[..self.boundary_len]
    }
}

/// A ribbon's end-frame vertices in ring order for the junction at `end`.
pub fn boundary_run(ribbon: &Ribbon, end: SegmentEnd) -> Vec<DVec3> {
    let mut run = ribbon.end_vertices(end);
    if end == SegmentEnd::Start {
        run.reverse();
    }
    run
}

/// Build the patch for `junction` centred on `centre`, pulling each
/// incident ribbon from `ribbon`.
pub fn build_patch<'r, F>(
    junction: &Junction,
    centre: DVec2,
    ribbon: F,
    config: &BuildConfig,
) -> JunctionResult<JunctionPatch>
where
    F: Fn(SegmentId) -> Option<&'r Ribbon>,
{
    let id = junction.id;
    if junction.degree() < 2 {
        return Err(JunctionGeometryError::TooFewIncidences { junction: id, degree: junction.degree() });
    }

    let mut vertices: Vec<DVec3> = Vec::new();
    let mut runs = Vec::with_capacity(junction.degree());
    for inc in &junction.incidences {
        let r = ribbon(inc.segment)
            .ok_or(JunctionGeometryError::MissingRibbon { junction: id, segment: inc.segment })?;
        let run = boundary_run(r, inc.end);
        runs.push(BoundaryRun { segment: inc.segment, end: inc.end, first: vertices.len(), len: run.len() });
        vertices.extend(run);
    }
    let boundary_len = vertices.len();

    let (kind, triangles) = if junction.is_seamless(config.straight_tolerance) {
        (PatchKind::Seam, seam(&vertices, runs[0], runs[1]))
    } else if junction.degree() == 2 {
        let ring: Vec<DVec2> = vertices.iter().map(|v| v.truncate()).collect();
        if !ring_is_simple(&ring) || ring_area(&ring) <= 0.0 {
            return Err(JunctionGeometryError::NotSimple { junction: id });
        }
        (PatchKind::Bridge, zip_strip(&vertices, runs[0], runs[1]))
    } else {
        let z = vertices.iter().map(|v| v.z).sum::<f64>() / boundary_len as f64;
        vertices.push(DVec3::new(centre.x, centre.y, z));
        (PatchKind::Fan, fan(id, &vertices, boundary_len)?)
    };

    Ok(JunctionPatch { junction: id, version: junction.version, kind, vertices, boundary_len, runs, triangles })
}

/// [`build_patch`] centred on the junction's node in `model`.
pub fn patch_for<'r, F>(model: &NetworkModel, junction: &Junction, ribbon: F) -> JunctionResult<JunctionPatch>
where
    F: Fn(SegmentId) -> Option<&'r Ribbon>,
{
    let centre = model.node(junction.node).map_or(DVec2::ZERO, |n| n.xy());
    build_patch(junction, centre, ribbon, model.config())
}

fn fan(id: JunctionId, vertices: &[DVec3], n: usize) -> JunctionResult<Vec<[u32; 3]>> {
    let c = n as u32;
    let centre = vertices[n].truncate();
    let mut out = Vec::with_capacity(n);
    for i in 0..n {
        let j = (i + 1) % n;
        if orient(centre, vertices[i].truncate(), vertices[j].truncate()) <= MIN_ORIENT {
            return Err(JunctionGeometryError::NotStarShaped { junction: id, triangle: i });
        }
        out.push([c, i as u32, j as u32]);
    }
    Ok(out)
}

/// Join two end frames that cross at the node.  On one side of the node the
/// ribbons overlap and the zipped triangles come out clockwise or flat; only
/// the counter-clockwise ones, which cover the open side, are kept.
fn seam(vertices: &[DVec3], a: BoundaryRun, b: BoundaryRun) -> Vec<[u32; 3]> {
    zip_strip(vertices, a, b)
        .into_iter()
        .filter(|t| {
            let [p, q, r] = t.map(|i| vertices[i as usize].truncate());
            orient(p, q, r) > MIN_ORIENT
        })
        .collect()
}

/// Fractional arc length at each vertex of a chain.
fn progress(chain: &[DVec3]) -> Vec<f64> {
    let mut acc = vec![0.0; chain.len()];
    for i in 1..chain.len() {
        acc[i] = acc[i - 1] + chain[i].truncate().distance(chain[i - 1].truncate());
    }
    let total = acc.last().copied().unwrap_or(0.0);
    if total > 0.0 {
        acc.iter_mut().for_each(|a| *a /= total);
    }
    acc
}

/// Strip between two boundary runs, advancing whichever side lags in
/// fractional arc length.  The ring runs `a` forward then `b` forward, so
/// `a[0]` faces `b[last]`.
fn zip_strip(vertices: &[DVec3], a: BoundaryRun, b: BoundaryRun) -> Vec<[u32; 3]> {
    let left: Vec<u32> = (a.first..a.first + a.len).map(|i| i as u32).collect();
    let right: Vec<u32> = (b.first..b.first + b.len).rev().map(|i| i as u32).collect();
    let lp = progress(&left.iter().map(|&i| vertices[i as usize]).collect::<Vec<_>>());
    let rp = progress(&right.iter().map(|&i| vertices[i as usize]).collect::<Vec<_>>());

    let (m, n) = (left.len(), right.len());
    let mut out = Vec::with_capacity(m + n);
    let (mut i, mut j) = (0, 0);
    while i + 1 < m || j + 1 < n {
        let advance_left = j + 1 == n || (i + 1 < m && lp[i + 1] <= rp[j + 1]);
        if advance_left {
            out.push([left[i], left[i + 1], right[j]]);
            i += 1;
        } else {
            out.push([left[i], right[j + 1], right[j]]);
            j += 1;
        }
    }
    out
}
