//! One round of ribbon and patch generation as a small task graph.
//!
//! Ribbon tasks have no inputs besides the snapshot.  A patch task waits
//! on the ribbon tasks of its incident segments (counted down atomically)
//! and reads every other incident ribbon from the cache.  With the
//! `parallel` feature the graph runs inside one `rayon::scope`, spawning
//! each patch the moment its last ribbon lands; without it the same graph
//! runs on the calling thread in the same dependency order.

use std::collections::BTreeMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, OnceLock};

use rustc_hash::FxHashMap;

use rb_core::{BuildConfig, DVec2, DegenerateGeometryError, JunctionId, SegmentId};
use rb_corridor::{build_ribbon, Ribbon, Trims};
use rb_junction::{build_patch, JunctionGeometryError, JunctionPatch};
use rb_mesh::{emit_patch, emit_ribbon, RegionMesh};
use rb_network::{Junction, NetworkModel, Segment};

use crate::cache::{radius_at, trims_for, ArmKey, Caches, Overrides, PatchEntry, PatchKey, RibbonEntry, RibbonKey};

type RibbonResult = Result<(Arc<Ribbon>, RegionMesh), DegenerateGeometryError>;
type PatchResult = Result<(Arc<JunctionPatch>, RegionMesh), JunctionGeometryError>;

// ── Plan ──────────────────────────────────────────────────────────────────────

struct RibbonJob<'a> {
    segment: &'a Segment,
    trims: Trims,
    key: RibbonKey,
}

struct PatchJob<'a> {
    junction: &'a Junction,
    centre: DVec2,
    key: PatchKey,
    /// Ribbon jobs this patch waits on.
    deps: usize,
}

/// Everything whose key differs from the cache.
struct Plan<'a> {
    ribbons: Vec<RibbonJob<'a>>,
    patches: Vec<PatchJob<'a>>,
    job_of: FxHashMap<SegmentId, usize>,
    /// Patch jobs waiting on each ribbon job.
    dependents: Vec<Vec<usize>>,
}

impl<'a> Plan<'a> {
    fn new(model: &'a NetworkModel, overrides: &Overrides, cache: &Caches) -> Self {
        let mut keys: FxHashMap<SegmentId, RibbonKey> = FxHashMap::default();
        let mut ribbons = Vec::new();
        let mut job_of = FxHashMap::default();

        for seg in model.segments() {
            let trims = trims_for(model, overrides, seg);
            let key = RibbonKey::new(seg.version, trims);
            keys.insert(seg.id, key);
            if cache.ribbons.get(&seg.id).map(|e| e.key) != Some(key) {
                job_of.insert(seg.id, ribbons.len());
                ribbons.push(RibbonJob { segment: seg, trims, key });
            }
        }

        let mut patches = Vec::new();
        let mut dependents = vec![Vec::new(); ribbons.len()];
        for j in model.junctions() {
            let radius = radius_at(model, overrides, j.node);
            let arms = j
                .incidences
                .iter()
                .filter_map(|i| {
                    let ribbon = *keys.get(&i.segment)?;
                    Some(ArmKey { segment: i.segment, end: i.end, ribbon })
                })
                .collect();
            let key = PatchKey::new(j.version, radius, arms);
            if cache.patches.get(&j.id).map(|e| &e.key) == Some(&key) {
                continue;
            }
            let p = patches.len();
            let mut deps = 0;
            for inc in &j.incidences {
                if let Some(&r) = job_of.get(&inc.segment) {
                    dependents[r].push(p);
                    deps += 1;
                }
            }
            let centre = model.node(j.node).map_or(DVec2::ZERO, |n| n.xy());
            patches.push(PatchJob { junction: j, centre, key, deps });
        }

        Plan { ribbons, patches, job_of, dependents }
    }
}

// ── Execution ─────────────────────────────────────────────────────────────────

struct Exec<'a> {
    plan: Plan<'a>,
    cache: &'a Caches,
    config: &'a BuildConfig,
    ribbon_out: Vec<OnceLock<RibbonResult>>,
    patch_out: Vec<OnceLock<PatchResult>>,
    pending: Vec<AtomicUsize>,
}

impl<'a> Exec<'a> {
    fn new(plan: Plan<'a>, cache: &'a Caches, config: &'a BuildConfig) -> Self {
        let ribbon_out = (0..plan.ribbons.len()).map(|_| OnceLock::new()).collect();
        let patch_out = (0..plan.patches.len()).map(|_| OnceLock::new()).collect();
        let pending = plan.patches.iter().map(|p| AtomicUsize::new(p.deps)).collect();
        Exec { plan, cache, config, ribbon_out, patch_out, pending }
    }

    fn ribbon(&self, i: usize) {
        let job = &self.plan.ribbons[i];
        let out = build_ribbon(job.segment, job.trims, self.config).map(|r| {
            let mesh = emit_ribbon(&r, self.config);
            (Arc::new(r), mesh)
        });
        let _ = self.ribbon_out[i].set(out);
    }

    /// Ribbon for `segment` from this round if rebuilt, else the cache.
    fn ribbon_of(&self, segment: SegmentId) -> Option<&Ribbon> {
        match self.plan.job_of.get(&segment) {
            Some(&i) => self.ribbon_out[i].get()?.as_ref().ok().map(|(r, _)| r.as_ref()),
            None => self.cache.ribbon(segment),
        }
    }

    fn patch(&self, p: usize) {
        let job = &self.plan.patches[p];
        let out = build_patch(job.junction, job.centre, |s| self.ribbon_of(s), self.config).map(|patch| {
            let mesh = emit_patch(&patch, self.config);
            (Arc::new(patch), mesh)
        });
        let _ = self.patch_out[p].set(out);
    }

    /// Count down the dependents of ribbon job `i`; returns the patches that
    /// just became ready.
    fn ready_after(&self, i: usize) -> impl Iterator<Item = usize> + '_ {
        self.plan.dependents[i]
            .iter()
            .copied()
            .filter(|&p| self.pending[p].fetch_sub(1, Ordering::AcqRel) == 1)
    }

    #[cfg(not(feature = "parallel"))]
    fn run(&self) {
        for (p, job) in self.plan.patches.iter().enumerate() {
            if job.deps == 0 {
                self.patch(p);
            }
        }
        for i in 0..self.plan.ribbons.len() {
            self.ribbon(i);
            for p in self.ready_after(i) {
                self.patch(p);
            }
        }
    }

    #[cfg(feature = "parallel")]
    fn run(&self) {
        rayon::scope(|scope| {
            for i in 0..self.plan.ribbons.len() {
                spawn_ribbon(self, scope, i);
            }
            for (p, job) in self.plan.patches.iter().enumerate() {
                if job.deps == 0 {
                    scope.spawn(move |_| self.patch(p));
                }
            }
        });
    }
}

#[cfg(feature = "parallel")]
fn spawn_ribbon<'s>(exec: &'s Exec<'_>, scope: &rayon::Scope<'s>, i: usize) {
    scope.spawn(move |scope| {
        exec.ribbon(i);
        for p in exec.ready_after(i) {
            scope.spawn(move |_| exec.patch(p));
        }
    });
}

// ── Round output ──────────────────────────────────────────────────────────────

/// Entries rebuilt in one round, with the meshes of the successful ones.
#[derive(Default)]
pub(crate) struct RoundOutput {
    pub ribbons: BTreeMap<SegmentId, (RibbonEntry, Option<RegionMesh>)>,
    pub patches: BTreeMap<JunctionId, (PatchEntry, Option<RegionMesh>)>,
}

impl RoundOutput {
    /// Later rounds replace earlier entries.
    pub fn absorb(&mut self, later: RoundOutput) {
        self.ribbons.extend(later.ribbons);
        self.patches.extend(later.patches);
    }

    /// `cache` with this round's entries applied.
    pub fn over(&self, cache: &Caches) -> Caches {
        let mut merged = cache.clone();
        for (id, (entry, _)) in &self.ribbons {
            merged.ribbons.insert(*id, entry.clone());
        }
        for (id, (entry, _)) in &self.patches {
            merged.patches.insert(*id, entry.clone());
        }
        merged
    }
}

/// Rebuild everything in `model` whose key differs from `cache`.
pub(crate) fn run_round(
    model: &NetworkModel,
    overrides: &Overrides,
    cache: &Caches,
    config: &BuildConfig,
) -> RoundOutput {
    let exec = Exec::new(Plan::new(model, overrides, cache), cache, config);
    exec.run();

    let Exec { plan, ribbon_out, patch_out, .. } = exec;
    let mut out = RoundOutput::default();
    for (job, slot) in plan.ribbons.iter().zip(ribbon_out) {
        // Every job ran, so every slot is set.
        let Some(result) = slot.into_inner() else { continue };
        let (ribbon, mesh) = match result {
            Ok((r, m)) => (Ok(r), Some(m)),
            Err(e) => (Err(e), None),
        };
        out.ribbons.insert(job.segment.id, (RibbonEntry { key: job.key, ribbon }, mesh));
    }
    for (job, slot) in plan.patches.into_iter().zip(patch_out) {
        let Some(result) = slot.into_inner() else { continue };
        let (patch, mesh) = match result {
            Ok((p, m)) => (Ok(p), Some(m)),
            Err(e) => (Err(e), None),
        };
        out.patches.insert(job.junction.id, (PatchEntry { key: job.key, patch }, mesh));
    }
    out
}
