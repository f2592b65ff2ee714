//! Ribbon and patch triangulation into per-region vertex data.

use rb_core::geom::triangle_normal;
use rb_core::{BuildConfig, DVec3};
use rb_corridor::{Frame, LaneMark, MarkStyle, Ribbon, Side, Sidewalk};
use rb_junction::JunctionPatch;

/// What a vertex's triangles are: the renderer picks a material per value.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[repr(u8)]
pub enum Surface {
    #[default]
    Road = 0,
    Curb = 1,
    Sidewalk = 2,
    Marking = 3,
}

impl Surface {
    pub fn name(self) -> &'static str {
        match self {
            Surface::Road => "road",
            Surface::Curb => "curb",
            Surface::Sidewalk => "sidewalk",
            Surface::Marking => "marking",
        }
    }
}

/// Vertex and index data for one region, indices local to the region.
#[derive(Clone, Debug, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct RegionMesh {
    pub positions: Vec<[f32; 3]>,
    pub normals: Vec<[f32; 3]>,
    pub uvs: Vec<[f32; 2]>,
    /// One per vertex.  A triangle never mixes surfaces.
    pub surfaces: Vec<Surface>,
    pub indices: Vec<u32>,
}

impl RegionMesh {
    #[inline]
    pub fn vertex_count(&self) -> usize {
        self.positions.len()
    }

    #[inline]
    pub fn triangle_count(&self) -> usize {
        self.indices.len() / 3
    }

    /// Triangles whose vertices are `surface`.
    pub fn triangles_of(&self, surface: Surface) -> impl Iterator<Item = [u32; 3]> + '_ {
        self.indices
            .chunks_exact(3)
            .map(|t| [t[0], t[1], t[2]])
            .filter(move |t| self.surfaces.get(t[0] as usize) == Some(&surface))
    }
}

/// Accumulates vertices and triangles in `f64` before conversion.
#[derive(Default)]
struct Builder {
    points: Vec<DVec3>,
    uvs: Vec<[f32; 2]>,
    surfaces: Vec<Surface>,
    indices: Vec<u32>,
}

impl Builder {
    /// Quads between consecutive `(first, second, v)` rows.  Seen from the
    /// side the quad faces, `first` is on the left.
    fn strip(&mut self, rows: impl IntoIterator<Item = (DVec3, DVec3, f32)>, u: [f32; 2], surface: Surface) {
        let base = self.points.len() as u32;
        let mut n = 0u32;
        for (a, b, v) in rows {
            self.points.extend([a, b]);
            self.uvs.extend([[u[0], v], [u[1], v]]);
            self.surfaces.extend([surface; 2]);
            n += 1;
        }
        for k in 0..n.saturating_sub(1) {
            let a = base + 2 * k;
            let (b, c, d) = (a + 1, a + 2, a + 3);
            self.indices.extend_from_slice(&[a, b, c, b, d, c]);
        }
    }

    fn finish(self) -> RegionMesh {
        let normals = vertex_normals(&self.points, &self.indices);
        RegionMesh {
            positions: self.points.iter().map(|p| p.as_vec3().to_array()).collect(),
            normals,
            uvs: self.uvs,
            surfaces: self.surfaces,
            indices: self.indices,
        }
    }
}

/// Area-weighted vertex normals; vertices with no non-degenerate triangle
/// get straight up.
fn vertex_normals(points: &[DVec3], indices: &[u32]) -> Vec<[f32; 3]> {
    let mut acc = vec![DVec3::ZERO; points.len()];
    for t in indices.chunks_exact(3) {
        let [a, b, c] = [t[0] as usize, t[1] as usize, t[2] as usize];
        // Unnormalised cross product: length is twice the area.
        let n = (points[b] - points[a]).cross(points[c] - points[a]);
        if triangle_normal(points[a], points[b], points[c]).is_some() {
            acc[a] += n;
            acc[b] += n;
            acc[c] += n;
        }
    }
    acc.into_iter()
        .map(|n| n.try_normalize().unwrap_or(DVec3::Z).as_vec3().to_array())
        .collect()
}

/// Height of painted marks above the surface they lie on.
const MARK_LIFT: f64 = 0.01;

/// Quad grid over frames × profile offsets, then raised sidewalks and
/// painted lane marks.
///
/// Grid vertex `(f, k)` sits at index `f·P + k`; `k` runs left to right, so
/// `(f,k) (f,k+1) (f+1,k)` is counter-clockwise seen from above.  The grid
/// comes first, so its end rows are the vertices junction patches join.
pub fn emit_ribbon(ribbon: &Ribbon, config: &BuildConfig) -> RegionMesh {
    let p = ribbon.profile.len();
    let mut out = Builder::default();
    for f in &ribbon.frames {
        let v = (f.s * config.uv_scale) as f32;
        for (&o, &u) in ribbon.profile.offsets.iter().zip(&ribbon.profile.lane_u) {
            out.points.push(f.vertex(o));
            out.uvs.push([u as f32, v]);
        }
    }
    out.surfaces.resize(out.points.len(), Surface::Road);
    for f in 0..ribbon.frames.len().saturating_sub(1) {
        for k in 0..p.saturating_sub(1) {
            let a = (f * p + k) as u32;
            let b = a + 1;
            let c = a + p as u32;
            let d = c + 1;
            out.indices.extend_from_slice(&[a, b, c, b, d, c]);
        }
    }

    for walk in &ribbon.profile.sidewalks {
        emit_sidewalk(&mut out, ribbon, walk, config);
    }
    for mark in &ribbon.profile.marks {
        emit_mark(&mut out, ribbon, mark, config);
    }
    out.finish()
}

/// Curb face from the carriageway edge up, then the walking surface out.
fn emit_sidewalk(out: &mut Builder, ribbon: &Ribbon, walk: &Sidewalk, config: &BuildConfig) {
    let sign = walk.side.sign();
    let up = DVec3::Z * walk.curb_height;
    let uv = config.uv_scale as f32;
    let rows = |f: &Frame| {
        let edge = f.vertex(sign);
        (edge, edge + up, edge + up + f.right * (sign * walk.width), (f.s * config.uv_scale) as f32)
    };

    if walk.curb_height > 0.0 {
        let u = [0.0, walk.curb_height as f32 * uv];
        let faces = ribbon.frames.iter().map(rows).map(|(bottom, top, _, v)| match walk.side {
            Side::Right => (bottom, top, v),
            Side::Left => (top, bottom, v),
        });
        out.strip(faces, u, Surface::Curb);
    }
    let u = [0.0, walk.width as f32 * uv];
    let tops = ribbon.frames.iter().map(rows).map(|(_, inner, outer, v)| match walk.side {
        Side::Right => (inner, outer, v),
        Side::Left => (outer, inner, v),
    });
    out.strip(tops, u, Surface::Sidewalk);
}

fn emit_mark(out: &mut Builder, ribbon: &Ribbon, mark: &LaneMark, config: &BuildConfig) {
    let half = 0.5 * config.mark_width;
    let lift = DVec3::Z * MARK_LIFT;
    let row = |f: &Frame| {
        // Kept inside the carriageway when the mark sits on an edge.
        let centre = (mark.offset * f.half_width).max(half - f.half_width).min(f.half_width - half);
        let at = f.center + lift;
        (at + f.right * (centre - half), at + f.right * (centre + half), (f.s * config.uv_scale) as f32)
    };

    match mark.style {
        MarkStyle::Solid => out.strip(ribbon.frames.iter().map(row), [0.0, 1.0], Surface::Marking),
        MarkStyle::Dashed => {
            for (s0, s1) in dashes(ribbon, config) {
                let inner = ribbon.frames.iter().filter(|f| f.s > s0 && f.s < s1).copied();
                let frames = std::iter::once(ribbon.frame_at_s(s0))
                    .chain(inner)
                    .chain(std::iter::once(ribbon.frame_at_s(s1)));
                out.strip(frames.map(|f| row(&f)), [0.0, 1.0], Surface::Marking);
            }
        }
    }
}

/// Dash intervals along the trimmed ribbon: a whole number of dash periods
/// stretched to fit, each dash centred in its period.
fn dashes(ribbon: &Ribbon, config: &BuildConfig) -> Vec<(f64, f64)> {
    let start = ribbon.frames[0].s;
    let length = ribbon.trimmed_length();
    if !(length >= config.dash_length) {
        return Vec::new();
    }
    let n = (length / (config.dash_length + config.dash_gap)).round().max(1.0);
    let step = length / n;
    let gap = step - config.dash_length;
    (0..n as usize)
        .map(|i| {
            let s0 = start + step * i as f64 + 0.5 * gap;
            (s0, s0 + config.dash_length)
        })
        .collect()
}

/// A patch as-is, texture coordinates from world XY.
pub fn emit_patch(patch: &JunctionPatch, config: &BuildConfig) -> RegionMesh {
    let uvs = patch
        .vertices
        .iter()
        .map(|v| [(v.x * config.uv_scale) as f32, (v.y * config.uv_scale) as f32])
        .collect();
    let out = Builder {
        points: patch.vertices.clone(),
        uvs,
        surfaces: vec![Surface::Road; patch.vertices.len()],
        indices: patch.triangles.iter().flatten().copied().collect(),
    };
    out.finish()
}
