//! `rb-corridor`: centerline splines and lane-profile ribbons.
//!
//! A ribbon is one segment's road surface between the two junction trims:
//! an ordered list of [`Frame`]s along a centripetal Catmull-Rom curve
//! through the segment's control points, plus a lateral [`Profile`].
//!
//! | Module     | Contents                                              |
//! |------------|-------------------------------------------------------|
//! | [`spline`] | `Centerline`, adaptive `Sample`s                      |
//! | [`profile`]| `Profile`: lanes, sidewalks, lane marks               |
//! | [`ribbon`] | `Frame`, `Trims`, `Ribbon`, `build_ribbon`            |
//!
//! # Feature flags
//!
//! | Flag    | Effect                                                  |
//! |---------|---------------------------------------------------------|
//! | `serde` | Derives `Serialize`/`Deserialize` on frames and ribbons. |

pub mod profile;
pub mod ribbon;
pub mod spline;

#[cfg(test)]
mod tests;

pub use profile::{LaneKind, LaneMark, MarkStyle, Profile, Side, Sidewalk};
pub use ribbon::{build_ribbon, ribbon_for, Frame, Ribbon, Trims};
pub use spline::{Centerline, Sample};

use rb_core::DegenerateGeometryError;

/// Corridor generation fails only on degenerate segment geometry.
pub type CorridorResult<T> = Result<T, DegenerateGeometryError>;
