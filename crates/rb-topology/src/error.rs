//! Topology error type.

use thiserror::Error;

use rb_network::EditError;

/// Errors produced by `rb-topology`.
///
/// Conflicting input (near-duplicate nodes, overlapping roads) is resolved by
/// policy, never reported.  An error here means an edit the resolver issued
/// was rejected for a reason other than degenerate geometry.
#[derive(Debug, Error)]
pub enum TopologyError {
    #[error("topology edit failed: {0}")]
    Edit(#[from] EditError),
}

pub type TopologyResult<T> = Result<T, TopologyError>;
