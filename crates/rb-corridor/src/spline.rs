//! Centripetal Catmull-Rom centerlines and adaptive sampling.
//!
//! Each span `P[i] → P[i+1]` is evaluated with the Barry–Goldman pyramid
//! over the knot sequence `t[k+1] = t[k] + |P[k+1] − P[k]|^α`, α = 0.5.  The
//! first and last spans use phantom points reflected through the end points
//! (`2·P[0] − P[1]` and `2·P[n−1] − P[n−2]`), so the curve starts and ends
//! heading straight along the end pieces.  Centripetal knots never produce
//! cusps or self-intersections within a span.

use rb_core::geom::cross2;
use rb_core::{BuildConfig, DVec2};

const ALPHA: f64 = 0.5;

/// Bisection depth limit per span; 2^16 samples is far past any sane
/// spacing.
const MAX_DEPTH: u32 = 16;

/// One evaluated sample.  `g` is the global curve parameter: the integer
/// part is the span, the fraction is the position within it.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct Sample {
    pub g: f64,
    pub pos: DVec2,
    /// Unit tangent.
    pub dir: DVec2,
    /// Arc length from the start of the curve.
    pub s: f64,
}

/// A spline through an ordered list of distinct control positions.
#[derive(Clone, Debug)]
pub struct Centerline {
    /// Control points with the two phantoms at either end.
    pts: Vec<DVec2>,
    /// Knot per entry of `pts`.
    knots: Vec<f64>,
}

impl Centerline {
    /// Returns `None` for fewer than two points or for consecutive
    /// coincident points.
    pub fn new(control: &[DVec2]) -> Option<Self> {
        let n = control.len();
        if n < 2 || control.windows(2).any(|w| w[0].distance_squared(w[1]) == 0.0) {
            return None;
        }

        let mut pts = Vec::with_capacity(n + 2);
        pts.push(2.0 * control[0] - control[1]);
        pts.extend_from_slice(control);
        pts.push(2.0 * control[n - 1] - control[n - 2]);

        let mut knots = Vec::with_capacity(pts.len());
        let mut t = 0.0;
        knots.push(t);
        for w in pts.windows(2) {
            t += w[0].distance(w[1]).powf(ALPHA);
            knots.push(t);
        }
        Some(Centerline { pts, knots })
    }

    /// Number of spans (control points − 1).
    pub fn span_count(&self) -> usize {
        self.pts.len() - 3
    }

    /// Control point `i` (phantoms excluded).
    pub fn control(&self, i: usize) -> DVec2 {
        self.pts[i + 1]
    }

    /// Position and derivative (w.r.t. the knot parameter) on span `span`
    /// at local parameter `u ∈ [0, 1]`.
    fn eval(&self, span: usize, u: f64) -> (DVec2, DVec2) {
        let [p0, p1, p2, p3] = [self.pts[span], self.pts[span + 1], self.pts[span + 2], self.pts[span + 3]];
        let [t0, t1, t2, t3] =
            [self.knots[span], self.knots[span + 1], self.knots[span + 2], self.knots[span + 3]];
        let t = t1 + (t2 - t1) * u;

        let a1 = (p0 * (t1 - t) + p1 * (t - t0)) / (t1 - t0);
        let a2 = (p1 * (t2 - t) + p2 * (t - t1)) / (t2 - t1);
        let a3 = (p2 * (t3 - t) + p3 * (t - t2)) / (t3 - t2);
        let da1 = (p1 - p0) / (t1 - t0);
        let da2 = (p2 - p1) / (t2 - t1);
        let da3 = (p3 - p2) / (t3 - t2);

        let b1 = (a1 * (t2 - t) + a2 * (t - t0)) / (t2 - t0);
        let b2 = (a2 * (t3 - t) + a3 * (t - t1)) / (t3 - t1);
        let db1 = (a2 - a1) / (t2 - t0) + (da1 * (t2 - t) + da2 * (t - t0)) / (t2 - t0);
        let db2 = (a3 - a2) / (t3 - t1) + (da2 * (t3 - t) + da3 * (t - t1)) / (t3 - t1);

        let c = (b1 * (t2 - t) + b2 * (t - t1)) / (t2 - t1);
        let dc = (b2 - b1) / (t2 - t1) + (db1 * (t2 - t) + db2 * (t - t1)) / (t2 - t1);
        (c, dc)
    }

    fn split_g(&self, g: f64) -> (usize, f64) {
        let last = self.span_count() - 1;
        let g = g.clamp(0.0, self.span_count() as f64);
        let span = (g.floor() as usize).min(last);
        (span, g - span as f64)
    }

    /// Position at global parameter `g`.
    pub fn position(&self, g: f64) -> DVec2 {
        let (span, u) = self.split_g(g);
        self.eval(span, u).0
    }

    /// Unit tangent at global parameter `g`.
    pub fn direction(&self, g: f64) -> DVec2 {
        let (span, u) = self.split_g(g);
        let d = self.eval(span, u).1.normalize_or_zero();
        if d == DVec2::ZERO {
            // Knot derivative vanishes only on degenerate input; fall back to
            // the chord of the span.
            (self.pts[span + 2] - self.pts[span + 1]).normalize_or_zero()
        } else {
            d
        }
    }

    /// Adaptive samples along the whole curve, ordered by `g`.  Every
    /// control point is a sample (at integer `g`).
    pub fn sample(&self, config: &BuildConfig) -> Vec<Sample> {
        let mut gs = Vec::new();
        for span in 0..self.span_count() {
            gs.push(span as f64);
            self.bisect(span as f64, span as f64 + 1.0, config, 0, &mut gs);
        }
        gs.push(self.span_count() as f64);

        let mut out: Vec<Sample> = Vec::with_capacity(gs.len());
        for g in gs {
            let pos = self.position(g);
            let s = out.last().map_or(0.0, |prev| prev.s + prev.pos.distance(pos));
            out.push(Sample { g, pos, dir: self.direction(g), s });
        }
        out
    }

    /// Push the interior sample parameters of `(g0, g1)` in order.
    fn bisect(&self, g0: f64, g1: f64, config: &BuildConfig, depth: u32, out: &mut Vec<f64>) {
        if depth >= MAX_DEPTH {
            return;
        }
        let chord = self.position(g0).distance(self.position(g1));
        if chord < 2.0 * config.min_frame_spacing {
            return;
        }
        let (d0, d1) = (self.direction(g0), self.direction(g1));
        let turn = cross2(d0, d1).atan2(d0.dot(d1)).abs();
        if chord <= config.max_frame_spacing && turn <= config.max_frame_angle {
            return;
        }
        let mid = 0.5 * (g0 + g1);
        self.bisect(g0, mid, config, depth + 1, out);
        out.push(mid);
        self.bisect(mid, g1, config, depth + 1, out);
    }
}

/// Curve parameter at arc length `s`, by linear interpolation between the
/// bracketing samples.  `samples` must be non-empty and ordered.
pub fn g_at(samples: &[Sample], s: f64) -> f64 {
    let k = samples.partition_point(|x| x.s <= s);
    if k == 0 {
        return samples[0].g;
    }
    if k == samples.len() {
        return samples[k - 1].g;
    }
    let (a, b) = (&samples[k - 1], &samples[k]);
    let span = b.s - a.s;
    if span <= 0.0 { a.g } else { a.g + (b.g - a.g) * (s - a.s) / span }
}
