//! Trimmed corridor ribbons: frames along a segment's centerline.

use rb_core::{BuildConfig, DVec2, DVec3, DegenerateGeometryError, SegmentId};
use rb_core::geom::{fill_by_arc_length, right_of};
use rb_network::{NetworkModel, Segment, SegmentEnd};

use crate::profile::Profile;
use crate::spline::{g_at, Centerline, Sample};
use crate::CorridorResult;

/// Two frames closer than this along the curve are the same frame.
const SAME_STATION: f64 = 1e-6;

// ── Frame ─────────────────────────────────────────────────────────────────────

/// A cross-section station along the ribbon.
#[derive(Copy, Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Frame {
    /// Centerline point; `z` is the interpolated elevation.
    pub center: DVec3,
    /// Unit tangent including grade.
    pub tangent: DVec3,
    /// Horizontal unit vector to the right of the direction of travel.
    pub right: DVec3,
    pub half_width: f64,
    /// Arc length from the segment's start node along the untrimmed curve.
    pub s: f64,
}

impl Frame {
    /// Cross-section vertex at normalised lateral offset `offset`.
    #[inline]
    pub fn vertex(&self, offset: f64) -> DVec3 {
        self.center + self.right * (offset * self.half_width)
    }
}

// ── Trims ─────────────────────────────────────────────────────────────────────

/// Arc length cut off each end of a ribbon.
#[derive(Copy, Clone, Debug, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Trims {
    pub start: f64,
    pub end: f64,
}

impl Trims {
    pub fn new(start: f64, end: f64) -> Self {
        Trims { start, end }
    }

    /// Junction radii at both ends of `segment`, 0 at dead ends.
    pub fn from_model(model: &NetworkModel, segment: &Segment) -> Self {
        Trims { start: model.trim_at(segment.start), end: model.trim_at(segment.end) }
    }

    pub fn at(&self, end: SegmentEnd) -> f64 {
        match end {
            SegmentEnd::Start => self.start,
            SegmentEnd::End => self.end,
        }
    }

    /// Scale both trims down proportionally when together they leave less
    /// than `min_fraction` of `length`.
    pub fn fitted(self, length: f64, min_fraction: f64) -> Trims {
        let start = self.start.max(0.0);
        let end = self.end.max(0.0);
        let budget = length * (1.0 - min_fraction.clamp(0.0, 1.0));
        let total = start + end;
        if total > budget && total > 0.0 {
            let k = budget / total;
            Trims { start: start * k, end: end * k }
        } else {
            Trims { start, end }
        }
    }
}

// ── Ribbon ────────────────────────────────────────────────────────────────────

/// The swept cross-section surface of one segment.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Ribbon {
    pub segment: SegmentId,
    /// Segment version the ribbon was built from.
    pub version: u64,
    /// Ordered from the start trim to the end trim; at least two.
    pub frames: Vec<Frame>,
    pub profile: Profile,
    /// Arc length of the untrimmed centerline.
    pub length: f64,
    /// Effective trims after fitting.
    pub trims: Trims,
}

impl Ribbon {
    pub fn frame_at(&self, end: SegmentEnd) -> &Frame {
        match end {
            SegmentEnd::Start => &self.frames[0],
            SegmentEnd::End => &self.frames[self.frames.len() - 1],
        }
    }

    /// Cross-section vertices of frame `i`, left edge to right edge.
    pub fn vertices(&self, i: usize) -> Vec<DVec3> {
        let f = &self.frames[i];
        self.profile.offsets.iter().map(|&o| f.vertex(o)).collect()
    }

    /// Cross-section vertices of the end frame at `end`, left to right in
    /// the segment's direction.
    pub fn end_vertices(&self, end: SegmentEnd) -> Vec<DVec3> {
        let f = self.frame_at(end);
        self.profile.offsets.iter().map(|&o| f.vertex(o)).collect()
    }

    /// Frame at arc length `s`, interpolated between the two frames around
    /// it and clamped to the ribbon's ends.
    pub fn frame_at_s(&self, s: f64) -> Frame {
        let k = self.frames.partition_point(|f| f.s <= s).clamp(1, self.frames.len() - 1);
        let (a, b) = (&self.frames[k - 1], &self.frames[k]);
        let span = b.s - a.s;
        let t = if span > 0.0 { ((s - a.s) / span).clamp(0.0, 1.0) } else { 0.0 };
        Frame {
            center: a.center.lerp(b.center, t),
            tangent: a.tangent.lerp(b.tangent, t).try_normalize().unwrap_or(a.tangent),
            right: a.right.lerp(b.right, t).try_normalize().unwrap_or(a.right),
            half_width: a.half_width + (b.half_width - a.half_width) * t,
            s: a.s + span * t,
        }
    }

    /// Arc length between the two end frames.
    pub fn trimmed_length(&self) -> f64 {
        self.frames[self.frames.len() - 1].s - self.frames[0].s
    }
}

/// Per-control-point width and elevation, resolved over spline stations.
struct Stations {
    s: Vec<f64>,
    width: Vec<f64>,
    z: Vec<f64>,
}

impl Stations {
    /// Index of the station interval containing `s`.
    fn bracket(&self, s: f64) -> usize {
        let k = self.s.partition_point(|x| *x <= s);
        k.clamp(1, self.s.len() - 1) - 1
    }

    /// Width, elevation and grade at arc length `s`.
    fn at(&self, s: f64) -> (f64, f64, f64) {
        let i = self.bracket(s);
        let (s0, s1) = (self.s[i], self.s[i + 1]);
        let span = s1 - s0;
        let f = if span > 0.0 { ((s - s0) / span).clamp(0.0, 1.0) } else { 0.0 };
        let w = self.width[i] + (self.width[i + 1] - self.width[i]) * f;
        let z = self.z[i] + (self.z[i + 1] - self.z[i]) * f;
        let grade = if span > 0.0 { (self.z[i + 1] - self.z[i]) / span } else { 0.0 };
        (w, z, grade)
    }
}

fn make_frame(pos: DVec2, dir: DVec2, s: f64, stations: &Stations) -> Frame {
    let (width, z, grade) = stations.at(s);
    let r = right_of(dir);
    Frame {
        center: DVec3::new(pos.x, pos.y, z),
        tangent: DVec3::new(dir.x, dir.y, grade).normalize(),
        right: DVec3::new(r.x, r.y, 0.0),
        half_width: 0.5 * width,
        s,
    }
}

fn frame_at_station(curve: &Centerline, samples: &[Sample], s: f64, stations: &Stations) -> Frame {
    let g = g_at(samples, s);
    make_frame(curve.position(g), curve.direction(g), s, stations)
}

/// Build the ribbon for `segment` with the given junction trims.
///
/// # Errors
///
/// [`DegenerateGeometryError`] when the segment has fewer than two control
/// points, zero length, or a non-positive width anywhere.
pub fn build_ribbon(segment: &Segment, trims: Trims, config: &BuildConfig) -> CorridorResult<Ribbon> {
    let id = segment.id;
    if segment.points.len() < 2 {
        return Err(DegenerateGeometryError::TooFewPoints { segment: id, got: segment.points.len() });
    }
    if segment.start == segment.end {
        return Err(DegenerateGeometryError::SelfLoop { segment: id, node: segment.start });
    }
    let curve =
        Centerline::new(&segment.xy()).ok_or(DegenerateGeometryError::ZeroLength { segment: id })?;

    let samples = curve.sample(config);
    let length = samples.last().map_or(0.0, |x| x.s);
    if !(length > 0.0) {
        return Err(DegenerateGeometryError::ZeroLength { segment: id });
    }

    let station_s: Vec<f64> =
        samples.iter().filter(|x| x.g.fract() == 0.0).map(|x| x.s).collect();
    debug_assert_eq!(station_s.len(), segment.points.len());

    let declared = segment.class.declared_width();
    let widths: Vec<Option<f64>> = segment.points.iter().map(|p| p.width).collect();
    let width = fill_by_arc_length(&station_s, &widths, declared);
    if let Some(&bad) = width.iter().find(|w| !(**w > 0.0)) {
        return Err(DegenerateGeometryError::NonPositiveWidth { segment: id, width: bad });
    }
    let zs: Vec<Option<f64>> = segment.points.iter().map(|p| p.elevation).collect();
    let z = fill_by_arc_length(&station_s, &zs, 0.0);
    let stations = Stations { s: station_s, width, z };

    let trims = trims.fitted(length, config.min_ribbon_fraction);
    let (s0, s1) = (trims.start, length - trims.end);

    let mut frames = Vec::with_capacity(samples.len() + 2);
    frames.push(frame_at_station(&curve, &samples, s0, &stations));
    frames.extend(
        samples
            .iter()
            .filter(|x| x.s > s0 + SAME_STATION && x.s < s1 - SAME_STATION)
            .map(|x| make_frame(x.pos, x.dir, x.s, &stations)),
    );
    frames.push(frame_at_station(&curve, &samples, s1, &stations));

    Ok(Ribbon {
        segment: id,
        version: segment.version,
        frames,
        profile: Profile::for_class(&segment.class, config),
        length,
        trims,
    })
}

/// [`build_ribbon`] with trims taken from the model's current junctions.
pub fn ribbon_for(model: &NetworkModel, segment: &Segment) -> CorridorResult<Ribbon> {
    build_ribbon(segment, Trims::from_model(model, segment), model.config())
}
