//! Lateral cross-section of a road: carriageway strips, raised sidewalks and
//! painted lane marks.

use rb_core::BuildConfig;
use rb_network::RoadClass;

/// What a carriageway strip between two adjacent offsets is for.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum LaneKind {
    Driving,
    Shoulder,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Side {
    Left,
    Right,
}

impl Side {
    /// −1 for left, +1 for right: the sign of the profile offset.
    #[inline]
    pub fn sign(self) -> f64 {
        match self {
            Side::Left => -1.0,
            Side::Right => 1.0,
        }
    }
}

/// A raised sidewalk outside one carriageway edge.  Widths are in metres,
/// so sidewalks do not stretch with per-frame width overrides.
#[derive(Copy, Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Sidewalk {
    pub side: Side,
    pub width: f64,
    pub curb_height: f64,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum MarkStyle {
    Solid,
    Dashed,
}

/// A painted line along the road at a normalised offset.
#[derive(Copy, Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct LaneMark {
    pub offset: f64,
    pub style: MarkStyle,
}

/// Normalised lateral offsets across the carriageway, left edge (−1) to
/// right edge (+1): outer edges, shoulder lines, and lane boundaries.
///
/// A vertex at offset `o` sits at `center + right · o · half_width`, so the
/// profile stretches with per-frame width overrides.  Junction patches join
/// the carriageway only; sidewalks and marks end at the trim.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Profile {
    /// Strictly increasing, first −1, last +1.
    pub offsets: Vec<f64>,
    /// Texture `u` per offset, in lanes measured from the left edge.
    pub lane_u: Vec<f64>,
    /// One per strip: `kinds[k]` lies between `offsets[k]` and `offsets[k + 1]`.
    pub kinds: Vec<LaneKind>,
    /// Left first.
    pub sidewalks: Vec<Sidewalk>,
    /// Ascending by offset.
    pub marks: Vec<LaneMark>,
}

impl Profile {
    /// The cross-section for `class`.  Lane counts are capped at
    /// `config.max_lanes`.
    pub fn for_class(class: &RoadClass, config: &BuildConfig) -> Profile {
        let sidewalks = sidewalks_of(class);
        let width = class.declared_width();
        if !(width > 0.0) {
            return Profile {
                offsets: vec![-1.0, 1.0],
                lane_u: vec![0.0, 1.0],
                kinds: vec![LaneKind::Driving],
                sidewalks,
                marks: Vec::new(),
            };
        }
        let lanes = class.lanes.clamp(1, config.max_lanes.max(1));
        // An override narrower than the shoulders drops them.
        let shoulder = if width > 2.0 * class.shoulder_width { class.shoulder_width.max(0.0) } else { 0.0 };
        let lane_width = (width - 2.0 * shoulder) / lanes as f64;

        let mut across = Vec::with_capacity(lanes as usize + 3);
        across.push(0.0);
        for k in 0..=lanes {
            across.push(shoulder + k as f64 * lane_width);
        }
        across.push(width);
        across.dedup_by(|b, a| (*b - *a).abs() < 1e-9);

        let has_shoulders = shoulder > 0.0;
        let strips = across.len() - 1;
        let kinds = (0..strips)
            .map(|k| {
                if has_shoulders && (k == 0 || k + 1 == strips) { LaneKind::Shoulder } else { LaneKind::Driving }
            })
            .collect();

        let norm = |x: f64| 2.0 * x / width - 1.0;
        let mut marks = Vec::new();
        if has_shoulders {
            marks.push(LaneMark { offset: norm(shoulder), style: MarkStyle::Solid });
        }
        for k in 1..lanes {
            let centre = !class.oneway && lanes % 2 == 0 && k == lanes / 2;
            let style = if centre && lanes >= 4 { MarkStyle::Solid } else { MarkStyle::Dashed };
            marks.push(LaneMark { offset: norm(shoulder + k as f64 * lane_width), style });
        }
        if has_shoulders {
            marks.push(LaneMark { offset: norm(width - shoulder), style: MarkStyle::Solid });
        }

        let offsets = across.iter().map(|&x| norm(x)).collect();
        let lane_u = across.iter().map(|x| x / lane_width).collect();
        Profile { offsets, lane_u, kinds, sidewalks, marks }
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.offsets.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.offsets.is_empty()
    }
}

fn sidewalks_of(class: &RoadClass) -> Vec<Sidewalk> {
    let s = &class.sidewalks;
    let curb_height = s.curb_height.max(0.0);
    [(Side::Left, s.left), (Side::Right, s.right)]
        .into_iter()
        .filter(|(_, w)| *w > 0.0 && w.is_finite())
        .map(|(side, width)| Sidewalk { side, width, curb_height })
        .collect()
}
