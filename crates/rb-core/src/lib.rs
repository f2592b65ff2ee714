//! `rb-core`: foundational types for the `roadbuilder` mesh pipeline.
//!
//! This crate is a dependency of every other `rb-*` crate.  It intentionally
//! has no `rb-*` dependencies and minimal external ones (only `glam` and
//! `thiserror`, plus optional `serde`).
//!
//! # What lives here
//!
//! | Module     | Contents                                                  |
//! |------------|-----------------------------------------------------------|
//! | [`ids`]    | `NodeId`, `SegmentId`, `JunctionId`, `RegionId`           |
//! | [`geo`]    | `GeoPoint`, `GeoBounds`, `Projection`, `LocalProjection`  |
//! | [`geom`]   | planar intersection / orientation helpers                 |
//! | [`config`] | `BuildConfig`                                             |
//! | [`error`]  | `CoreError`, `DegenerateGeometryError`                    |
//!
//! # Feature flags
//!
//! | Flag    | Effect                                                     |
//! |---------|------------------------------------------------------------|
//! | `serde` | Adds `Serialize`/`Deserialize` to all public types.        |

pub mod config;
pub mod error;
pub mod geo;
pub mod geom;
pub mod ids;


// ── Re-exports ────────────────────────────────────────────────────────────────

pub use config::BuildConfig;
pub use error::{CoreError, CoreResult, DegenerateGeometryError};
pub use geo::{GeoBounds, GeoPoint, LocalProjection, Projection};
pub use glam::{DVec2, DVec3};
pub use ids::{JunctionId, NodeId, RegionId, SegmentId};
