//! Network-subsystem error types.

use thiserror::Error;

use rb_core::{CoreError, DegenerateGeometryError, SegmentId};

/// Rejected edits.  The model is unchanged when an edit returns an error.
#[derive(Debug, Error)]
pub enum EditError {
    #[error(transparent)]
    Core(#[from] CoreError),

    #[error(transparent)]
    Degenerate(#[from] DegenerateGeometryError),

    #[error("cannot split {segment}: {reason}")]
    InvalidSplit { segment: SegmentId, reason: String },
}

/// Import failures.  Import is atomic: on error nothing is committed.
#[derive(Debug, Error)]
pub enum ImportError {
    #[error("malformed XML: {0}")]
    Xml(#[from] roxmltree::Error),

    #[error("expected <osm> root element, found <{0}>")]
    UnexpectedRoot(String),

    #[error("<{element}> at {position} has no id")]
    MissingId { element: &'static str, position: String },

    #[error("<{element}> {id}: missing attribute `{attribute}`")]
    MissingAttribute { element: &'static str, id: i64, attribute: &'static str },

    #[error("<{element}> {id}: invalid {attribute} {value:?}")]
    InvalidAttribute {
        element: &'static str,
        id: i64,
        attribute: &'static str,
        value: String,
    },

    #[error("duplicate node id {0}")]
    DuplicateNode(i64),

    #[error("duplicate way id {0}")]
    DuplicateWay(i64),

    #[error("way {way} references unknown node {node}")]
    UnknownNodeRef { way: i64, node: i64 },

    #[error("model rejected imported segment: {0}")]
    Model(EditError),

    #[cfg(feature = "pbf")]
    #[error("OSM PBF error: {0}")]
    Pbf(String),
}

pub type EditResult<T> = Result<T, EditError>;
pub type ImportResult<T> = Result<T, ImportError>;
