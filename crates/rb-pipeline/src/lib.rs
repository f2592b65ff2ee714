//! `rb-pipeline`: incremental build passes from a road network to a
//! published mesh.
//!
//! # One pass
//!
//! ```text
//! begin_pass:
//!   ① Edits    → drain the EditQueue, apply in order (copy-on-write of
//!                the model if a snapshot is still shared).
//!   ② Topology → resolve if anything changed.
//!   ③ Snapshot → Arc<NetworkModel> + caches + generation number.
//! execute:
//!   ④ Round 1  → rebuild ribbons and patches whose key changed
//!                (task graph, parallel with the `parallel` feature).
//!   ⑤ Round 2  → grow failing junctions once and rebuild what that touched.
//! finish_pass:
//!   ⑥ Publish  → unless superseded: write regions in RegionId order,
//!                swap the mesh, report failures.
//! ```
//!
//! # Crate layout
//!
//! | Module       | Contents                                              |
//! |--------------|-------------------------------------------------------|
//! | [`pipeline`] | `Pipeline`: model ownership, edits, publishing        |
//! | [`builder`]  | `PipelineBuilder`                                     |
//! | [`pass`]     | `PassRequest`, `PassOutcome`, `PassSummary`           |
//! | [`queue`]    | `EditQueue`                                           |
//! | [`observer`] | `PipelineObserver`, `NoopObserver`                    |
//! | [`cache`]    | `RibbonKey`, `ArmKey`, `PatchKey`                     |
//! | [`error`]    | `PipelineError`, `RegionError`, `RegionFailure`       |
//!
//! # Cargo features
//!
//! | Feature    | Effect                                                 |
//! |------------|--------------------------------------------------------|
//! | `parallel` | Runs ribbon and patch tasks on Rayon's thread pool.    |
//!
//! # Quick-start
//!
//! ```rust,ignore
//! use rb_pipeline::{NoopObserver, PipelineBuilder};
//!
//! let mut pipeline = PipelineBuilder::new(model).build()?;
//! pipeline.regenerate(&mut NoopObserver)?;
//!
//! pipeline.submit(Edit::MoveNode { node, pos });
//! let summary = pipeline.regenerate(&mut NoopObserver)?;
//! println!("{} regions rewritten", summary.regions_written);
//! ```

pub mod builder;
pub mod cache;
pub mod error;
mod graph;
pub mod observer;
pub mod pass;
pub mod pipeline;
pub mod queue;


pub use builder::PipelineBuilder;
pub use cache::{ArmKey, PatchKey, RibbonKey};
pub use error::{PipelineError, PipelineResult, RegionError, RegionFailure};
pub use observer::{NoopObserver, PipelineObserver};
pub use pass::{PassOutcome, PassRequest, PassSummary};
pub use pipeline::Pipeline;
pub use queue::EditQueue;
