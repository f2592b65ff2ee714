//! One build pass: the snapshot it runs on and what it produced.
//!
//! A pass runs in up to two rounds.  Round one rebuilds every ribbon and
//! patch whose key differs from the cache.  Junctions that failed because
//! their ribbons ended too close to the node (fan not star-shaped, or a
//! two-way ring that is not simple) get their radius grown once by
//! `junction_growth_factor`, and round two rebuilds whatever that touched.
//! Anything still failing after that is reported and left out of the mesh.

use std::collections::BTreeMap;
use std::sync::Arc;

use tracing::debug;

use rb_core::{JunctionId, RegionId};
use rb_junction::JunctionGeometryError;
use rb_mesh::RegionMesh;
use rb_network::{Invalidation, NetworkModel};
use rb_topology::TopologyReport;

use crate::cache::{has_override, Caches, Overrides, RadiusOverride};
use crate::error::{RegionError, RegionFailure};
use crate::graph::{run_round, RoundOutput};

/// What one pass did, handed to
/// [`PipelineObserver::on_pass_end`][crate::PipelineObserver::on_pass_end].
#[derive(Clone, Debug, Default, PartialEq)]
pub struct PassSummary {
    pub generation: u64,
    pub edits_applied: usize,
    pub edits_rejected: usize,
    /// Present when topology was resolved before this pass.
    pub topology: Option<TopologyReport>,
    /// Regions named by the applied edits and the topology resolver.
    pub invalidated: Invalidation,
    pub ribbons_built: usize,
    pub patches_built: usize,
    /// Junctions whose radius was grown and retried.
    pub junctions_grown: usize,
    pub regions_written: usize,
    pub regions_removed: usize,
    /// Regions rebuilt this pass that could not be generated.
    pub failures: Vec<RegionFailure>,
}

#[derive(Clone, Debug)]
pub(crate) enum RegionUpdate {
    Write(RegionMesh),
    Remove,
}

/// A pass ready to run on its own snapshot.
///
/// Produced by [`Pipeline::begin_pass`][crate::Pipeline::begin_pass].  It
/// owns everything it reads, so [`execute`](Self::execute) can run on any
/// thread while the host keeps queueing edits.
pub struct PassRequest {
    pub(crate) generation: u64,
    pub(crate) model: Arc<NetworkModel>,
    pub(crate) caches: Arc<Caches>,
    pub(crate) overrides: Overrides,
    pub(crate) summary: PassSummary,
    #[cfg(feature = "parallel")]
    pub(crate) pool: Option<Arc<rayon::ThreadPool>>,
}

/// Results of [`PassRequest::execute`], not yet published.
pub struct PassOutcome {
    pub(crate) generation: u64,
    pub(crate) caches: Caches,
    pub(crate) overrides: Overrides,
    pub(crate) updates: BTreeMap<RegionId, RegionUpdate>,
    pub(crate) summary: PassSummary,
}

impl PassOutcome {
    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// The summary so far.  Region write and removal counts are filled in
    /// when the outcome is published.
    pub fn summary(&self) -> &PassSummary {
        &self.summary
    }
}

fn retryable(error: &JunctionGeometryError) -> bool {
    matches!(
        error,
        JunctionGeometryError::NotStarShaped { .. } | JunctionGeometryError::NotSimple { .. }
    )
}

impl PassRequest {
    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// The snapshot this pass builds from.
    pub fn model(&self) -> &Arc<NetworkModel> {
        &self.model
    }

    /// Build every out-of-date region.
    pub fn execute(&self) -> PassOutcome {
        #[cfg(feature = "parallel")]
        if let Some(pool) = &self.pool {
            return pool.install(|| self.build());
        }
        self.build()
    }

    fn build(&self) -> PassOutcome {
        let model = self.model.as_ref();
        let config = model.config();
        let mut overrides = self.overrides.clone();

        let mut round = run_round(model, &overrides, &self.caches, config);

        let grown: Vec<JunctionId> = round
            .patches
            .iter()
            .filter(|(id, (entry, _))| {
                matches!(&entry.patch, Err(e) if retryable(e)) && !has_override(model, &overrides, **id)
            })
            .map(|(id, _)| *id)
            .collect();
        for &id in &grown {
            if let Some(j) = model.junction(id) {
                let radius = j.radius * config.junction_growth_factor;
                debug!(junction = %id, from = j.radius, to = radius, "growing junction radius");
                overrides.insert(id, RadiusOverride { version: j.version, radius });
            }
        }
        if !grown.is_empty() {
            let base = round.over(&self.caches);
            round.absorb(run_round(model, &overrides, &base, config));
        }
        overrides.retain(|id, o| model.junction(*id).is_some_and(|j| j.version == o.version));

        let mut summary = self.summary.clone();
        summary.generation = self.generation;
        summary.junctions_grown = grown.len();
        summary.ribbons_built = round.ribbons.len();
        summary.patches_built = round.patches.len();

        let (caches, updates) = self.merge(round, &mut summary.failures);
        PassOutcome { generation: self.generation, caches, overrides, updates, summary }
    }

    /// Fold rebuilt entries into the cache, drop entries for entities that no
    /// longer exist, and list the mesh changes in region order.
    fn merge(
        &self,
        round: RoundOutput,
        failures: &mut Vec<RegionFailure>,
    ) -> (Caches, BTreeMap<RegionId, RegionUpdate>) {
        let model = self.model.as_ref();
        let mut caches = Caches::clone(&self.caches);
        let mut updates = BTreeMap::new();

        for (id, (entry, mesh)) in round.ribbons {
            let region = RegionId::Segment(id);
            match (&entry.ribbon, mesh) {
                (Ok(_), Some(mesh)) => {
                    updates.insert(region, RegionUpdate::Write(mesh));
                }
                (Err(e), _) => {
                    failures.push(RegionFailure { region, error: RegionError::from(e.clone()) });
                    updates.insert(region, RegionUpdate::Remove);
                }
                (Ok(_), None) => {}
            }
            caches.ribbons.insert(id, entry);
        }
        for (id, (entry, mesh)) in round.patches {
            let region = RegionId::Junction(id);
            match (&entry.patch, mesh) {
                (Ok(_), Some(mesh)) => {
                    updates.insert(region, RegionUpdate::Write(mesh));
                }
                (Err(e), _) => {
                    failures.push(RegionFailure { region, error: RegionError::from(e.clone()) });
                    updates.insert(region, RegionUpdate::Remove);
                }
                (Ok(_), None) => {}
            }
            caches.patches.insert(id, entry);
        }

        caches.ribbons.retain(|id, _| {
            let live = model.segment(*id).is_some();
            if !live {
                updates.insert(RegionId::Segment(*id), RegionUpdate::Remove);
            }
            live
        });
        caches.patches.retain(|id, _| {
            let live = model.junction(*id).is_some();
            if !live {
                updates.insert(RegionId::Junction(*id), RegionUpdate::Remove);
            }
            live
        });

        failures.sort_by_key(|f| f.region);
        (caches, updates)
    }
}
