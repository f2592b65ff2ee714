//! Pass observer hooks.

use rb_network::{Edit, EditError};

use crate::error::RegionFailure;
use crate::pass::PassSummary;

/// Callbacks invoked by [`Pipeline`][crate::Pipeline] around each pass.
///
/// All methods default to no-ops.
///
/// ```rust,ignore
/// struct Log;
///
/// impl PipelineObserver for Log {
///     fn on_region_failed(&mut self, f: &RegionFailure) {
///         eprintln!("{}: {}", f.region, f.error);
///     }
/// }
/// ```
pub trait PipelineObserver {
    /// A pass was requested; queued edits are about to be applied.
    fn on_pass_start(&mut self, _generation: u64) {}

    /// A queued edit failed validation and was dropped.
    fn on_edit_rejected(&mut self, _edit: &Edit, _error: &EditError) {}

    /// A region was left out of the mesh.
    fn on_region_failed(&mut self, _failure: &RegionFailure) {}

    /// Results were published.
    fn on_pass_end(&mut self, _summary: &PassSummary) {}
}

/// A [`PipelineObserver`] that does nothing.
pub struct NoopObserver;

impl PipelineObserver for NoopObserver {}
