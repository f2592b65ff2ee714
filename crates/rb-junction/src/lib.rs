//! `rb-junction`: surfaces filling the gap between ribbons at a junction.
//!
//! | Module    | Contents                                                   |
//! |-----------|------------------------------------------------------------|
//! | [`patch`] | `JunctionPatch`, `PatchKind`, `build_patch`, `boundary_run` |
//! | [`error`] | `JunctionGeometryError`                                    |
//!
//! A patch's boundary ring *is* the incident ribbons' end-frame vertices,
//! copied in order, so ribbon and patch share every seam vertex exactly.
//!
//! # Feature flags
//!
//! | Flag    | Effect                                            |
//! |---------|---------------------------------------------------|
//! | `serde` | Derives `Serialize`/`Deserialize` on patch types. |

pub mod error;
pub mod patch;

#[cfg(test)]
mod tests;

pub use error::{JunctionGeometryError, JunctionResult};
pub use patch::{boundary_run, build_patch, patch_for, BoundaryRun, JunctionPatch, PatchKind};
