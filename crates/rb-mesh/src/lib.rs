//! `rb-mesh`: render-ready road geometry.
//!
//! | Module     | Contents                                                    |
//! |------------|-------------------------------------------------------------|
//! | [`emit`]   | `RegionMesh`, `Surface`, `emit_ribbon`, `emit_patch`        |
//! | [`buffer`] | `MeshBuffer` with per-region slots, `Slot`, OBJ export      |
//! | [`chunk`]  | `Chunked`: copy-on-write attribute storage                  |
//! | [`shared`] | `SharedMesh`: `Arc<MeshBuffer>` behind a `parking_lot` lock |
//!
//! Positions are `f32` in the local metric frame, `z` up.  Triangles are
//! counter-clockwise seen from the side they face.  Every vertex carries a
//! [`Surface`] so road, curb, sidewalk and lane-mark triangles can be drawn
//! with different materials.
//!
//! # Feature flags
//!
//! | Flag    | Effect                                                   |
//! |---------|----------------------------------------------------------|
//! | `serde` | Derives `Serialize`/`Deserialize` on `RegionMesh`, `Surface`, `Slot`. |

pub mod buffer;
pub mod chunk;
pub mod emit;
pub mod shared;


pub use buffer::{MeshBuffer, Placement, Slot};
pub use chunk::{Chunked, CHUNK_LEN};
pub use emit::{emit_patch, emit_ribbon, RegionMesh, Surface};
pub use shared::SharedMesh;
