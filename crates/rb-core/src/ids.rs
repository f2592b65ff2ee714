//! Strongly typed, zero-cost identifier wrappers.
//!
//! All IDs are `Copy + Ord + Hash` so they can be used as map keys and sorted
//! collection elements without ceremony.  IDs are allocated sequentially and
//! never reused, so a lower ID always means "created earlier".  The topology
//! resolver relies on this for its snapping tie-break.

use std::fmt;

/// Generate a typed ID wrapper around a primitive integer.
macro_rules! typed_id {
    ($(#[$attr:meta])* $vis:vis struct $name:ident($inner:ty);) => {
        $(#[$attr])*
        #[derive(Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Debug)]
        #[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
        $vis struct $name(pub $inner);

        impl $name {
            /// Sentinel meaning "no valid ID", equal to `u32::MAX`.
            pub const INVALID: $name = $name(<$inner>::MAX);

            /// Cast to `usize` for direct use as an arena index.
            #[inline(always)]
            pub fn index(self) -> usize {
                self.0 as usize
            }
        }

        impl Default for $name {
            /// Returns the `INVALID` sentinel so uninitialized IDs are visibly invalid.
            #[inline(always)]
            fn default() -> Self {
                Self::INVALID
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}({})", stringify!($name), self.0)
            }
        }

        impl From<$name> for usize {
            #[inline(always)]
            fn from(id: $name) -> usize {
                id.0 as usize
            }
        }

        impl TryFrom<usize> for $name {
            type Error = std::num::TryFromIntError;
            fn try_from(n: usize) -> Result<$name, Self::Error> {
                <$inner>::try_from(n).map($name)
            }
        }
    };
}

typed_id! {
    /// Index of a road-network node in the model arena.
    pub struct NodeId(u32);
}

typed_id! {
    /// Index of a road segment in the model arena.
    pub struct SegmentId(u32);
}

typed_id! {
    /// Identifier of a junction.  A junction is owned by exactly one node, so
    /// the inner value is that node's index.
    pub struct JunctionId(u32);
}

impl JunctionId {
    /// The junction owned by `node`.
    #[inline]
    pub fn of(node: NodeId) -> JunctionId {
        JunctionId(node.0)
    }

    /// The node owning this junction.
    #[inline]
    pub fn node(self) -> NodeId {
        NodeId(self.0)
    }
}

// ── RegionId ──────────────────────────────────────────────────────────────────

/// A mesh-buffer partition: the unit of incremental regeneration.
///
/// Ordering puts all segment regions before junction regions, which is the
/// order the mesh writer applies them in.
#[derive(Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Debug)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum RegionId {
    Segment(SegmentId),
    Junction(JunctionId),
}

impl RegionId {
    pub fn segment(self) -> Option<SegmentId> {
        match self {
            RegionId::Segment(s) => Some(s),
            RegionId::Junction(_) => None,
        }
    }

    pub fn junction(self) -> Option<JunctionId> {
        match self {
            RegionId::Junction(j) => Some(j),
            RegionId::Segment(_) => None,
        }
    }
}

impl From<SegmentId> for RegionId {
    fn from(id: SegmentId) -> Self {
        RegionId::Segment(id)
    }
}

impl From<JunctionId> for RegionId {
    fn from(id: JunctionId) -> Self {
        RegionId::Junction(id)
    }
}

impl fmt::Display for RegionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RegionId::Segment(s)  => write!(f, "region[{s}]"),
            RegionId::Junction(j) => write!(f, "region[{j}]"),
        }
    }
}
