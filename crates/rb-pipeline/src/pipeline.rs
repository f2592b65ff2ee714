//! The `Pipeline` struct: model ownership, edit application and publishing.

use std::sync::Arc;

use tracing::{debug, info, warn};

use rb_core::{BuildConfig, JunctionId, RegionId, SegmentId};
use rb_corridor::Ribbon;
use rb_junction::JunctionPatch;
use rb_mesh::SharedMesh;
use rb_network::{Edit, Invalidation, NetworkModel};
use rb_topology::TopologyReport;

use crate::cache::{Caches, Overrides};
use crate::error::{PipelineError, PipelineResult, RegionError, RegionFailure};
use crate::observer::PipelineObserver;
use crate::pass::{PassOutcome, PassRequest, PassSummary, RegionUpdate};
use crate::queue::EditQueue;

/// Owns the network model and keeps the published mesh in step with it.
///
/// A build is split in three so the expensive middle can run off the host
/// thread:
///
/// 1. [`begin_pass`](Self::begin_pass) applies queued edits, resolves
///    topology if anything changed, and snapshots the model.
/// 2. [`PassRequest::execute`] rebuilds every region whose inputs changed.
/// 3. [`finish_pass`](Self::finish_pass) publishes the results, unless a
///    newer pass was begun in the meantime.
///
/// [`regenerate`](Self::regenerate) does all three in a row.
///
/// Create via [`PipelineBuilder`][crate::PipelineBuilder].
pub struct Pipeline {
    pub(crate) model: Arc<NetworkModel>,
    pub(crate) queue: EditQueue,
    pub(crate) caches: Arc<Caches>,
    pub(crate) overrides: Overrides,
    pub(crate) mesh: SharedMesh,
    /// Generation of the most recent `begin_pass`.
    pub(crate) generation: u64,
    pub(crate) resolve_topology: bool,
    /// Edits were applied since topology was last resolved.
    pub(crate) topology_dirty: bool,
    #[cfg(feature = "parallel")]
    pub(crate) pool: Option<Arc<rayon::ThreadPool>>,
}

impl Pipeline {
    // ── Accessors ─────────────────────────────────────────────────────────

    pub fn model(&self) -> &Arc<NetworkModel> {
        &self.model
    }

    /// Shared handle to the edit queue.
    pub fn queue(&self) -> &EditQueue {
        &self.queue
    }

    /// Shared handle to the published mesh.
    pub fn mesh(&self) -> &SharedMesh {
        &self.mesh
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn config(&self) -> &BuildConfig {
        self.model.config()
    }

    /// The last published ribbon for `segment`, if it was generated.
    pub fn ribbon(&self, segment: SegmentId) -> Option<&Ribbon> {
        self.caches.ribbon(segment)
    }

    /// The last published patch for `junction`, if it was generated.
    pub fn patch(&self, junction: JunctionId) -> Option<&JunctionPatch> {
        self.caches.patches.get(&junction)?.patch.as_deref().ok()
    }

    /// Every region currently left out of the mesh, in region order.
    pub fn failures(&self) -> Vec<RegionFailure> {
        let ribbons = self.caches.ribbons.iter().filter_map(|(id, e)| {
            let error = e.ribbon.as_ref().err()?;
            Some(RegionFailure { region: RegionId::Segment(*id), error: RegionError::from(error.clone()) })
        });
        let patches = self.caches.patches.iter().filter_map(|(id, e)| {
            let error = e.patch.as_ref().err()?;
            Some(RegionFailure { region: RegionId::Junction(*id), error: RegionError::from(error.clone()) })
        });
        ribbons.chain(patches).collect()
    }

    // ── Edits ─────────────────────────────────────────────────────────────

    /// Queue `edit` for the next pass.
    pub fn submit(&self, edit: Edit) {
        self.queue.submit(edit);
    }

    /// Apply `edit` now.  Takes effect in the mesh at the next pass.
    ///
    /// If a pass still holds the current snapshot, the model is copied first
    /// and the running pass keeps seeing the old one.
    pub fn apply_edit(&mut self, edit: Edit) -> PipelineResult<Invalidation> {
        let invalidated = edit.apply(Arc::make_mut(&mut self.model))?;
        self.topology_dirty = true;
        Ok(invalidated)
    }

    /// Resolve topology now, regardless of whether anything changed.
    pub fn resolve_topology(&mut self) -> PipelineResult<TopologyReport> {
        let report = rb_topology::resolve(Arc::make_mut(&mut self.model))?;
        self.topology_dirty = false;
        Ok(report)
    }

    /// Replace the build configuration.  Every cached region is dropped, so
    /// the next pass rebuilds the whole network.
    pub fn set_config(&mut self, config: BuildConfig) -> PipelineResult<()> {
        config.validate()?;
        #[cfg(feature = "parallel")]
        if config.num_threads != self.model.config().num_threads {
            self.pool = crate::builder::thread_pool(&config)?;
        }
        Arc::make_mut(&mut self.model).set_config(config);
        self.caches = Arc::default();
        self.overrides.clear();
        self.topology_dirty = true;
        Ok(())
    }

    // ── Passes ────────────────────────────────────────────────────────────

    /// Apply queued edits and snapshot the model for a new pass.
    ///
    /// Edits that fail validation are dropped and reported; the rest are
    /// applied in submission order.  Beginning a pass supersedes any pass
    /// begun earlier that has not been finished yet.
    pub fn begin_pass<O: PipelineObserver>(&mut self, observer: &mut O) -> PipelineResult<PassRequest> {
        self.generation += 1;
        observer.on_pass_start(self.generation);

        let mut summary = PassSummary::default();
        let edits = self.queue.drain();
        if !edits.is_empty() {
            let model = Arc::make_mut(&mut self.model);
            for edit in edits {
                match edit.clone().apply(model) {
                    Ok(invalidated) => {
                        summary.edits_applied += 1;
                        summary.invalidated.extend(invalidated);
                    }
                    Err(e) => {
                        warn!(?edit, error = %e, "edit rejected");
                        observer.on_edit_rejected(&edit, &e);
                        summary.edits_rejected += 1;
                    }
                }
            }
            self.topology_dirty |= summary.edits_applied > 0;
        }

        if self.resolve_topology && self.topology_dirty {
            let report = self.resolve_topology()?;
            summary.invalidated.extend(report.invalidated.iter().copied());
            summary.topology = Some(report);
        }

        Ok(PassRequest {
            generation: self.generation,
            model: Arc::clone(&self.model),
            caches: Arc::clone(&self.caches),
            overrides: self.overrides.clone(),
            summary,
            #[cfg(feature = "parallel")]
            pool: self.pool.clone(),
        })
    }

    /// Publish `outcome` to the mesh and caches.
    ///
    /// Mesh writes are applied in ascending region order and become visible
    /// to readers in one swap.  Fails with [`PipelineError::Superseded`] and
    /// changes nothing if a newer pass has been begun.
    pub fn finish_pass<O: PipelineObserver>(
        &mut self,
        outcome: PassOutcome,
        observer: &mut O,
    ) -> PipelineResult<PassSummary> {
        if outcome.generation != self.generation {
            debug!(generation = outcome.generation, latest = self.generation, "discarding superseded pass");
            return Err(PipelineError::Superseded { generation: outcome.generation, latest: self.generation });
        }

        let PassOutcome { caches, overrides, updates, mut summary, .. } = outcome;
        self.caches = Arc::new(caches);
        self.overrides = overrides;

        let (written, removed) = self.mesh.update(|buf| {
            let (mut written, mut removed) = (0, 0);
            for (region, update) in updates {
                match update {
                    RegionUpdate::Write(mesh) => {
                        buf.write(region, &mesh);
                        written += 1;
                    }
                    RegionUpdate::Remove => {
                        if buf.remove(region) {
                            removed += 1;
                        }
                    }
                }
            }
            (written, removed)
        });
        summary.regions_written = written;
        summary.regions_removed = removed;

        for failure in &summary.failures {
            warn!(region = %failure.region, error = %failure.error, "region left out of mesh");
            observer.on_region_failed(failure);
        }
        info!(
            generation = summary.generation,
            ribbons = summary.ribbons_built,
            patches = summary.patches_built,
            grown = summary.junctions_grown,
            written,
            removed,
            failed = summary.failures.len(),
            "pass published",
        );
        observer.on_pass_end(&summary);
        Ok(summary)
    }

    /// Begin, execute and finish one pass on the calling thread.
    pub fn regenerate<O: PipelineObserver>(&mut self, observer: &mut O) -> PipelineResult<PassSummary> {
        let request = self.begin_pass(observer)?;
        let outcome = request.execute();
        self.finish_pass(outcome, observer)
    }
}
