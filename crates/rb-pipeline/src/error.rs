use thiserror::Error;

use rb_core::{CoreError, DegenerateGeometryError, RegionId};
use rb_junction::JunctionGeometryError;
use rb_network::EditError;
use rb_topology::TopologyError;

/// Why a region could not be generated.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum RegionError {
    #[error(transparent)]
    Degenerate(#[from] DegenerateGeometryError),

    #[error(transparent)]
    Junction(#[from] JunctionGeometryError),
}

/// A region left out of the mesh, and why.
#[derive(Debug, Clone, PartialEq)]
pub struct RegionFailure {
    pub region: RegionId,
    pub error: RegionError,
}

#[derive(Debug, Error)]
pub enum PipelineError {
    /// A newer pass was requested before this one finished; its results were
    /// discarded.
    #[error("pass {generation} superseded by pass {latest}")]
    Superseded { generation: u64, latest: u64 },

    #[error(transparent)]
    Config(#[from] CoreError),

    #[error("edit rejected: {0}")]
    Edit(#[from] EditError),

    #[error("topology resolution failed: {0}")]
    Topology(#[from] TopologyError),

    #[error("thread pool: {0}")]
    ThreadPool(String),
}

pub type PipelineResult<T> = Result<T, PipelineError>;
