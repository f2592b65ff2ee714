//! Shared error types.
//!
//! Sub-crates define their own error enums and wrap these via `#[from]`.
//! [`DegenerateGeometryError`] lives here because it is raised at three
//! different boundaries: import, the edit API, and corridor generation.

use thiserror::Error;

use crate::{NodeId, SegmentId};

/// Lookup and configuration failures common to every `rb-*` crate.
#[derive(Debug, Error)]
pub enum CoreError {
    #[error("node {0} not found")]
    NodeNotFound(NodeId),

    #[error("segment {0} not found")]
    SegmentNotFound(SegmentId),

    #[error("configuration error: {0}")]
    Config(String),
}

/// A segment whose geometry cannot be turned into a ribbon.
///
/// New segments that have not been assigned an ID yet report
/// `SegmentId::INVALID`.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum DegenerateGeometryError {
    #[error("segment {segment} has zero length")]
    ZeroLength { segment: SegmentId },

    #[error("segment {segment} starts and ends at {node}")]
    SelfLoop { segment: SegmentId, node: NodeId },

    #[error("segment {segment} needs at least 2 control points, got {got}")]
    TooFewPoints { segment: SegmentId, got: usize },

    #[error("segment {segment} has non-positive width {width}")]
    NonPositiveWidth { segment: SegmentId, width: f64 },
}

impl DegenerateGeometryError {
    /// The offending segment, for host UIs that highlight the problem.
    pub fn segment(&self) -> SegmentId {
        match self {
            DegenerateGeometryError::ZeroLength { segment }
            | DegenerateGeometryError::SelfLoop { segment, .. }
            | DegenerateGeometryError::TooFewPoints { segment, .. }
            | DegenerateGeometryError::NonPositiveWidth { segment, .. } => *segment,
        }
    }
}

/// Shorthand result type for `rb-core` lookups.
pub type CoreResult<T> = Result<T, CoreError>;
