//! Fluent builder for constructing a [`Pipeline`].

use std::sync::Arc;

use rb_core::BuildConfig;
use rb_mesh::SharedMesh;
use rb_network::NetworkModel;

use crate::{EditQueue, Pipeline, PipelineResult};

/// Fluent builder for [`Pipeline`].
///
/// # Optional inputs (have defaults)
///
/// | Method                   | Default                          |
/// |--------------------------|----------------------------------|
/// | `.config(c)`             | The model's own configuration    |
/// | `.resolve_topology(b)`   | `true`                           |
/// | `.queue(q)`              | A fresh, unshared `EditQueue`    |
/// | `.mesh(m)`               | A fresh, empty `SharedMesh`      |
///
/// # Example
///
/// ```rust,ignore
/// let model = import_osm_str(&xml, &ImportOptions::default())?.0;
/// let mut pipeline = PipelineBuilder::new(model)
///     .config(config)
///     .build()?;
/// let summary = pipeline.regenerate(&mut NoopObserver)?;
/// let mesh = pipeline.mesh().snapshot();
/// ```
pub struct PipelineBuilder {
    model: NetworkModel,
    config: Option<BuildConfig>,
    resolve_topology: bool,
    queue: Option<EditQueue>,
    mesh: Option<SharedMesh>,
}

impl PipelineBuilder {
    pub fn new(model: NetworkModel) -> Self {
        Self { model, config: None, resolve_topology: true, queue: None, mesh: None }
    }

    /// Replace the model's configuration before the first pass.
    pub fn config(mut self, config: BuildConfig) -> Self {
        self.config = Some(config);
        self
    }

    /// Whether passes resolve topology after edits.  Turn off when the
    /// model is known to be planar and edits keep it so.
    pub fn resolve_topology(mut self, on: bool) -> Self {
        self.resolve_topology = on;
        self
    }

    /// Share an existing edit queue, e.g. one already handed to an editor.
    pub fn queue(mut self, queue: EditQueue) -> Self {
        self.queue = Some(queue);
        self
    }

    /// Publish into an existing mesh handle.
    pub fn mesh(mut self, mesh: SharedMesh) -> Self {
        self.mesh = Some(mesh);
        self
    }

    /// Validate the configuration and return a pipeline with nothing built
    /// yet.
    pub fn build(self) -> PipelineResult<Pipeline> {
        let mut model = self.model;
        if let Some(config) = self.config {
            config.validate()?;
            model.set_config(config);
        } else {
            model.config().validate()?;
        }

        #[cfg(feature = "parallel")]
        let pool = thread_pool(model.config())?;

        Ok(Pipeline {
            model: Arc::new(model),
            queue: self.queue.unwrap_or_default(),
            caches: Arc::default(),
            overrides: Default::default(),
            mesh: self.mesh.unwrap_or_default(),
            generation: 0,
            resolve_topology: self.resolve_topology,
            topology_dirty: true,
            #[cfg(feature = "parallel")]
            pool,
        })
    }
}

/// A dedicated Rayon pool when `num_threads` is set; `None` uses the global
/// pool.
#[cfg(feature = "parallel")]
pub(crate) fn thread_pool(config: &BuildConfig) -> PipelineResult<Option<Arc<rayon::ThreadPool>>> {
    let Some(n) = config.num_threads else { return Ok(None) };
    rayon::ThreadPoolBuilder::new()
        .num_threads(n)
        .build()
        .map(|pool| Some(Arc::new(pool)))
        .map_err(|e| crate::PipelineError::ThreadPool(e.to_string()))
}
