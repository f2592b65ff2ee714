//! Region-partitioned mesh storage.
//!
//! Every region owns a contiguous vertex slot and a contiguous index slot.
//! Slots come from first-fit free lists kept sorted and coalesced.  A
//! region that still fits its slot is rewritten in place; one that grew is
//! moved to a new slot and its old slot freed.  Other regions' slots never
//! move, so a renderer can patch only the ranges that changed.
//!
//! Index entries a region does not use (slack inside its slot, and every
//! free index range) hold degenerate triangles.
//!
//! Attribute arrays are [`Chunked`], so a clone shares storage and a write
//! copies only the chunks it lands in.

use std::collections::BTreeMap;
use std::fmt::Write as _;
use std::ops::Range;

use tracing::trace;

use rb_core::RegionId;

use crate::chunk::Chunked;
use crate::emit::{RegionMesh, Surface};

/// Index value written into unused index entries.
const DEGENERATE: u32 = 0;

/// A region's place in the buffer.  `*_len` is what the region uses;
/// `*_cap` is what it holds.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Slot {
    pub vertex_start: u32,
    pub vertex_len: u32,
    pub vertex_cap: u32,
    pub index_start: u32,
    pub index_len: u32,
    pub index_cap: u32,
}

impl Slot {
    pub fn vertices(&self) -> Range<usize> {
        self.vertex_start as usize..(self.vertex_start + self.vertex_len) as usize
    }

    pub fn indices(&self) -> Range<usize> {
        self.index_start as usize..(self.index_start + self.index_len) as usize
    }
}

/// How a region write landed.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Placement {
    Inserted,
    InPlace,
    Relocated,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
struct FreeRange {
    start: u32,
    size: u32,
}

/// A free list over one growable array.
#[derive(Clone, Debug, Default, PartialEq)]
struct FreeList {
    /// Sorted by start, never adjacent.
    ranges: Vec<FreeRange>,
    /// Current array length.
    total: u32,
}

impl FreeList {
    /// First fit, else grow at the end (absorbing a free tail).
    fn alloc(&mut self, size: u32) -> u32 {
        if size == 0 {
            return 0;
        }
        if let Some(k) = self.ranges.iter().position(|r| r.size >= size) {
            let r = &mut self.ranges[k];
            let start = r.start;
            r.start += size;
            r.size -= size;
            if r.size == 0 {
                self.ranges.remove(k);
            }
            return start;
        }
        let start = match self.ranges.last() {
            Some(tail) if tail.start + tail.size == self.total => {
                let s = tail.start;
                self.ranges.pop();
                s
            }
            _ => self.total,
        };
        self.total = start + size;
        start
    }

    fn free(&mut self, start: u32, size: u32) {
        if size == 0 {
            return;
        }
        let k = self.ranges.partition_point(|r| r.start < start);
        self.ranges.insert(k, FreeRange { start, size });
        // Merge with the successor, then the predecessor.
        if k + 1 < self.ranges.len() && start + size == self.ranges[k + 1].start {
            self.ranges[k].size += self.ranges[k + 1].size;
            self.ranges.remove(k + 1);
        }
        if k > 0 && self.ranges[k - 1].start + self.ranges[k - 1].size == start {
            self.ranges[k - 1].size += self.ranges[k].size;
            self.ranges.remove(k);
        }
    }

    fn free_total(&self) -> u32 {
        self.ranges.iter().map(|r| r.size).sum()
    }
}

/// Positions, normals, UVs, surfaces and triangle indices for the whole
/// network.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct MeshBuffer {
    positions: Chunked<[f32; 3]>,
    normals: Chunked<[f32; 3]>,
    uvs: Chunked<[f32; 2]>,
    surfaces: Chunked<Surface>,
    indices: Chunked<u32>,
    regions: BTreeMap<RegionId, Slot>,
    free_v: FreeList,
    free_i: FreeList,
}

impl MeshBuffer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn positions(&self) -> &Chunked<[f32; 3]> {
        &self.positions
    }

    pub fn normals(&self) -> &Chunked<[f32; 3]> {
        &self.normals
    }

    pub fn uvs(&self) -> &Chunked<[f32; 2]> {
        &self.uvs
    }

    pub fn surfaces(&self) -> &Chunked<Surface> {
        &self.surfaces
    }

    /// Absolute vertex indices, three per triangle.
    pub fn indices(&self) -> &Chunked<u32> {
        &self.indices
    }

    pub fn region(&self, id: RegionId) -> Option<&Slot> {
        self.regions.get(&id)
    }

    /// The region table, ascending by ID.
    pub fn regions(&self) -> impl Iterator<Item = (RegionId, &Slot)> + '_ {
        self.regions.iter().map(|(k, v)| (*k, v))
    }

    pub fn region_count(&self) -> usize {
        self.regions.len()
    }

    pub fn contains(&self, id: RegionId) -> bool {
        self.regions.contains_key(&id)
    }

    /// Triangles across all regions, excluding slack.
    pub fn triangle_count(&self) -> usize {
        self.regions.values().map(|s| s.index_len as usize / 3).sum()
    }

    /// Vertex and index entries currently unused by any region.
    pub fn free_space(&self) -> (u32, u32) {
        (self.free_v.free_total(), self.free_i.free_total())
    }

    /// Write `mesh` as region `id`, in place when it fits.
    pub fn write(&mut self, id: RegionId, mesh: &RegionMesh) -> Placement {
        let (nv, ni) = (mesh.positions.len() as u32, mesh.indices.len() as u32);
        let (slot, placement) = match self.regions.get(&id).copied() {
            Some(old) if nv <= old.vertex_cap && ni <= old.index_cap => {
                (Slot { vertex_len: nv, index_len: ni, ..old }, Placement::InPlace)
            }
            Some(old) => {
                self.release(old);
                (self.allocate(nv, ni), Placement::Relocated)
            }
            None => (self.allocate(nv, ni), Placement::Inserted),
        };
        trace!(region = %id, ?placement, vertices = nv, indices = ni, "mesh region written");

        let v0 = slot.vertex_start as usize;
        self.positions.write(v0, &mesh.positions);
        self.normals.write(v0, &mesh.normals);
        self.uvs.write(v0, &mesh.uvs);
        let ns = mesh.surfaces.len().min(nv as usize);
        self.surfaces.write(v0, &mesh.surfaces[..ns]);
        self.surfaces.fill(v0 + ns..v0 + nv as usize, Surface::Road);

        let i0 = slot.index_start as usize;
        self.indices.write_with(i0, &mesh.indices, |i| i + slot.vertex_start);
        self.indices.fill(i0 + ni as usize..i0 + slot.index_cap as usize, DEGENERATE);

        self.regions.insert(id, slot);
        placement
    }

    /// Drop region `id`, freeing its slots.  Returns `false` if absent.
    pub fn remove(&mut self, id: RegionId) -> bool {
        match self.regions.remove(&id) {
            Some(slot) => {
                self.release(slot);
                true
            }
            None => false,
        }
    }

    /// Copy region `id` back out with region-local indices.
    pub fn region_mesh(&self, id: RegionId) -> Option<RegionMesh> {
        let slot = self.regions.get(&id)?;
        Some(RegionMesh {
            positions: self.positions.range(slot.vertices()).copied().collect(),
            normals: self.normals.range(slot.vertices()).copied().collect(),
            uvs: self.uvs.range(slot.vertices()).copied().collect(),
            surfaces: self.surfaces.range(slot.vertices()).copied().collect(),
            indices: self.indices.range(slot.indices()).map(|i| i - slot.vertex_start).collect(),
        })
    }

    fn allocate(&mut self, nv: u32, ni: u32) -> Slot {
        let vertex_start = self.free_v.alloc(nv);
        let index_start = self.free_i.alloc(ni);
        let (tv, ti) = (self.free_v.total as usize, self.free_i.total as usize);
        self.positions.grow(tv, [0.0; 3]);
        self.normals.grow(tv, [0.0, 0.0, 1.0]);
        self.uvs.grow(tv, [0.0; 2]);
        self.surfaces.grow(tv, Surface::Road);
        self.indices.grow(ti, DEGENERATE);
        Slot { vertex_start, vertex_len: nv, vertex_cap: nv, index_start, index_len: ni, index_cap: ni }
    }

    fn release(&mut self, slot: Slot) {
        let i0 = slot.index_start as usize;
        self.indices.fill(i0..i0 + slot.index_cap as usize, DEGENERATE);
        self.free_v.free(slot.vertex_start, slot.vertex_cap);
        self.free_i.free(slot.index_start, slot.index_cap);
    }

    /// Wavefront OBJ text, one object per region and a `usemtl` line
    /// wherever the surface changes.
    pub fn to_obj(&self) -> String {
        let mut out = String::new();
        // OBJ indices are 1-based and global across objects.
        let mut base = 1u32;
        for (id, slot) in &self.regions {
            let _ = writeln!(out, "o {}", obj_name(*id));
            for p in self.positions.range(slot.vertices()) {
                let _ = writeln!(out, "v {} {} {}", p[0], p[1], p[2]);
            }
            for n in self.normals.range(slot.vertices()) {
                let _ = writeln!(out, "vn {} {} {}", n[0], n[1], n[2]);
            }
            for t in self.uvs.range(slot.vertices()) {
                let _ = writeln!(out, "vt {} {}", t[0], t[1]);
            }
            let tris: Vec<u32> = self.indices.range(slot.indices()).copied().collect();
            let mut current = None;
            for t in tris.chunks_exact(3) {
                let surface = self.surfaces.get(t[0] as usize).copied().unwrap_or_default();
                if current != Some(surface) {
                    let _ = writeln!(out, "usemtl {}", surface.name());
                    current = Some(surface);
                }
                let [a, b, c] = [t[0], t[1], t[2]].map(|i| i - slot.vertex_start + base);
                let _ = writeln!(out, "f {a}/{a}/{a} {b}/{b}/{b} {c}/{c}/{c}");
            }
            base += slot.vertex_len;
        }
        out
    }
}

fn obj_name(id: RegionId) -> String {
    match id {
        RegionId::Segment(s) => format!("segment_{}", s.0),
        RegionId::Junction(j) => format!("junction_{}", j.0),
    }
}
