//! `rb-network`: the road network model, its edit API, and OSM import.
//!
//! # Crate layout
//!
//! | Module       | Contents                                                   |
//! |--------------|------------------------------------------------------------|
//! | [`model`]    | `NetworkModel`, `Node`, `Segment`, `RoadClass`, `Sidewalks` |
//! | [`junction`] | `Junction`, `Incidence`, `JunctionKind`, radius rule       |
//! | [`edit`]     | edit operations, `Edit`, `SegmentSpec`, `Invalidation`     |
//! | [`import`]   | OSM XML import, `ImportOptions`, `ImportReport`            |
//! | [`tags`]     | OSM tag interpretation                                     |
//! | [`pbf`]      | OSM PBF import (feature = `"pbf"` only)                    |
//! | [`error`]    | `EditError`, `ImportError`                                 |
//!
//! # Feature flags
//!
//! | Flag    | Effect                                                       |
//! |---------|--------------------------------------------------------------|
//! | `pbf`   | Enables OSM PBF import via the `osmpbf` crate.               |
//! | `serde` | Derives `Serialize`/`Deserialize` on public types.           |

pub mod edit;
pub mod error;
pub mod import;
pub mod junction;
pub mod model;
pub mod tags;

#[cfg(feature = "pbf")]
pub mod pbf;

#[cfg(test)]
mod tests;

pub use edit::{Cut, Edit, Invalidation, SegmentSpec};
pub use error::{EditError, EditResult, ImportError, ImportResult};
pub use import::{import_osm_into, import_osm_str, import_osm_str_auto, ImportOptions, ImportReport, SkipReason, SkippedWay};
pub use junction::{compute_junction, junction_radius, Incidence, Junction, JunctionKind};
pub use model::{ControlPoint, NetworkModel, Node, RoadClass, Segment, SegmentEnd, Sidewalks, Tags};
