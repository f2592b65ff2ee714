//! `rb-topology`: turns an imported or edited road network into a clean
//! planar graph.
//!
//! # Crate layout
//!
//! | Module      | Contents                                                   |
//! |-------------|------------------------------------------------------------|
//! | [`resolve`] | `resolve`, `TopologyReport`                                |
//! | `index`     | R-tree entries for nodes and control-polygon pieces        |
//! | [`error`]   | `TopologyError`, `TopologyResult<T>`                       |
//!
//! After [`resolve`] returns:
//!
//! - no two nodes are within `snap_tolerance` of each other;
//! - no two segments of the same grade cross or overlap except at a shared
//!   node;
//! - no two segments join the same nodes along the same path;
//! - every node of degree ≥ 2 has an up-to-date junction.

pub mod error;
mod index;
pub mod resolve;


pub use error::{TopologyError, TopologyResult};
pub use resolve::{resolve, TopologyReport};
