//! Build configuration shared by every pipeline stage.
//!
//! Typically loaded from a JSON file by the application crate (with the
//! `serde` feature) and handed to the pipeline builder.  All distances are in
//! metres of the local planar frame; angles are radians.

/// Tunables for topology resolution, corridor sampling, junction sizing and
/// mesh emission.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct BuildConfig {
    /// Nodes closer than this merge during topology resolution, and a segment
    /// endpoint this close to another segment's interior splits it.
    pub snap_tolerance: f64,

    /// Adaptive sampling never produces two frames closer than this (except
    /// at control points and trim cuts, which are always kept).
    pub min_frame_spacing: f64,

    /// Frames are never further apart than this, even on straight road.
    pub max_frame_spacing: f64,

    /// Maximum heading change between consecutive frames.
    pub max_frame_angle: f64,

    /// Lane width used when neither the `width` tag nor a per-class default
    /// applies.
    pub default_lane_width: f64,

    /// Lane count used when the `lanes` tag is missing and the road class has
    /// no default.
    pub default_lanes: u32,

    /// Largest lane count a road class may carry.  Imported `lanes` tags
    /// above this are capped, and profiles never build more lanes.
    pub max_lanes: u32,

    /// Sidewalk width used when a way has a `sidewalk` tag but no
    /// `sidewalk:width`.
    pub sidewalk_width: f64,

    /// Height of the curb between the carriageway and a raised sidewalk.
    pub curb_height: f64,

    /// Width of a painted lane mark.
    pub mark_width: f64,

    /// Length of one dash of a dashed lane mark.
    pub dash_length: f64,

    /// Gap between dashes of a dashed lane mark.
    pub dash_gap: f64,

    /// Vertical distance between OSM `layer` levels.
    pub layer_height: f64,

    /// Extra distance added to every computed junction radius.
    pub junction_clearance: f64,

    /// Upper bound on a computed junction radius.
    pub max_junction_radius: f64,

    /// Radius multiplier applied once when a junction patch cannot be built.
    pub junction_growth_factor: f64,

    /// Crossing pieces whose elevations at the crossing differ by more than
    /// this are treated as grade-separated (bridge over road) and not split.
    pub grade_separation: f64,

    /// Two incidences whose directions differ from π by less than this are a
    /// straight pass-through.
    pub straight_tolerance: f64,

    /// Fraction of a segment's length that must survive junction trimming.
    pub min_ribbon_fraction: f64,

    /// World-space to texture-space scale.
    pub uv_scale: f64,

    /// Worker thread count passed to Rayon.  `None` uses all logical cores.
    pub num_threads: Option<usize>,
}

impl Default for BuildConfig {
    fn default() -> Self {
        Self {
            snap_tolerance:         0.05,
            min_frame_spacing:      0.25,
            max_frame_spacing:      10.0,
            max_frame_angle:        5f64.to_radians(),
            default_lane_width:     3.5,
            default_lanes:          2,
            max_lanes:              16,
            sidewalk_width:         2.0,
            curb_height:            0.15,
            mark_width:             0.125,
            dash_length:            1.5,
            dash_gap:               1.5,
            layer_height:           10.0,
            junction_clearance:     0.5,
            max_junction_radius:    60.0,
            junction_growth_factor: 1.5,
            grade_separation:       4.0,
            straight_tolerance:     3f64.to_radians(),
            min_ribbon_fraction:    0.1,
            uv_scale:               0.1,
            num_threads:            None,
        }
    }
}

impl BuildConfig {
    /// Check ranges that would otherwise surface as odd geometry far from the
    /// cause.  Returns the first offending field.
    pub fn validate(&self) -> Result<(), crate::CoreError> {
        let positive = [
            ("snap_tolerance", self.snap_tolerance),
            ("min_frame_spacing", self.min_frame_spacing),
            ("max_frame_spacing", self.max_frame_spacing),
            ("max_frame_angle", self.max_frame_angle),
            ("default_lane_width", self.default_lane_width),
            ("max_junction_radius", self.max_junction_radius),
            ("sidewalk_width", self.sidewalk_width),
            ("mark_width", self.mark_width),
            ("dash_length", self.dash_length),
        ];
        for (name, v) in positive {
            if !(v > 0.0) {
                return Err(crate::CoreError::Config(format!("{name} must be > 0, got {v}")));
            }
        }
        if self.min_frame_spacing > self.max_frame_spacing {
            return Err(crate::CoreError::Config(format!(
                "min_frame_spacing {} exceeds max_frame_spacing {}",
                self.min_frame_spacing, self.max_frame_spacing
            )));
        }
        if self.junction_growth_factor <= 1.0 {
            return Err(crate::CoreError::Config(format!(
                "junction_growth_factor must be > 1, got {}",
                self.junction_growth_factor
            )));
        }
        if !(0.0..1.0).contains(&self.min_ribbon_fraction) {
            return Err(crate::CoreError::Config(format!(
                "min_ribbon_fraction must be in [0, 1), got {}",
                self.min_ribbon_fraction
            )));
        }
        if self.default_lanes == 0 {
            return Err(crate::CoreError::Config("default_lanes must be ≥ 1".into()));
        }
        if self.default_lanes > self.max_lanes {
            return Err(crate::CoreError::Config(format!(
                "default_lanes {} exceeds max_lanes {}",
                self.default_lanes, self.max_lanes
            )));
        }
        for (name, v) in [("curb_height", self.curb_height), ("dash_gap", self.dash_gap)] {
            if !(v >= 0.0) {
                return Err(crate::CoreError::Config(format!("{name} must be ≥ 0, got {v}")));
            }
        }
        Ok(())
    }
}
