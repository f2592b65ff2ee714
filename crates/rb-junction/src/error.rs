use thiserror::Error;

use rb_core::{JunctionId, SegmentId};

/// A junction whose patch could not be triangulated from the current
/// ribbon end frames.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum JunctionGeometryError {
    #[error("junction {junction} has degree {degree}; a patch needs at least 2")]
    TooFewIncidences { junction: JunctionId, degree: usize },

    #[error("junction {junction} has no ribbon for incident {segment}")]
    MissingRibbon { junction: JunctionId, segment: SegmentId },

    #[error("junction {junction}: fan triangle {triangle} is not counter-clockwise")]
    NotStarShaped { junction: JunctionId, triangle: usize },

    #[error("junction {junction}: boundary ring is not a simple counter-clockwise polygon")]
    NotSimple { junction: JunctionId },
}

impl JunctionGeometryError {
    pub fn junction(&self) -> JunctionId {
        match self {
            JunctionGeometryError::TooFewIncidences { junction, .. }
            | JunctionGeometryError::MissingRibbon { junction, .. }
            | JunctionGeometryError::NotStarShaped { junction, .. }
            | JunctionGeometryError::NotSimple { junction } => *junction,
        }
    }
}

pub type JunctionResult<T> = Result<T, JunctionGeometryError>;
