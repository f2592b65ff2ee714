//! Planar geometry helpers shared by the topology, corridor and junction
//! crates.  Everything works in the XY plane; `z` is elevation and is carried
//! along, never tested.

use glam::{DVec2, DVec3};

/// `z` component of the 3-D cross product of two planar vectors.
#[inline]
pub fn cross2(a: DVec2, b: DVec2) -> f64 {
    a.x * b.y - a.y * b.x
}

/// Wrap an angle into `(-π, π]`.
pub fn wrap_angle(mut a: f64) -> f64 {
    use std::f64::consts::{PI, TAU};
    while a > PI {
        a -= TAU;
    }
    while a <= -PI {
        a += TAU;
    }
    a
}

/// Counter-clockwise angle from `from` to `to`, in `[0, 2π)`.
pub fn ccw_gap(from: f64, to: f64) -> f64 {
    use std::f64::consts::TAU;
    let g = (to - from).rem_euclid(TAU);
    if g >= TAU { 0.0 } else { g }
}

/// Horizontal unit vector pointing to the right of `dir` (clockwise 90°).
#[inline]
pub fn right_of(dir: DVec2) -> DVec2 {
    DVec2::new(dir.y, -dir.x)
}

/// Twice the signed area of triangle `abc` in the XY plane (positive = CCW).
#[inline]
pub fn orient(a: DVec2, b: DVec2, c: DVec2) -> f64 {
    cross2(b - a, c - a)
}

// ── Segment tests ─────────────────────────────────────────────────────────────

/// Result of intersecting two straight pieces `p0→p1` and `q0→q1`.
#[derive(Copy, Clone, Debug, PartialEq)]
pub enum PieceHit {
    /// No contact.
    None,
    /// Single crossing at parameters `t` along `p` and `u` along `q`.
    Point { t: f64, u: f64 },
    /// The pieces are collinear and overlap.
    Collinear,
}

/// Intersect two straight pieces.  `t` and `u` are accepted in `[0, 1]`
/// widened by `slack` (parametric) so hits at shared vertices are reported.
pub fn intersect_pieces(p0: DVec2, p1: DVec2, q0: DVec2, q1: DVec2, slack: f64) -> PieceHit {
    let r = p1 - p0;
    let s = q1 - q0;
    let denom = cross2(r, s);
    let qp = q0 - p0;

    let scale = r.length() * s.length();
    if scale == 0.0 {
        return PieceHit::None;
    }

    if denom.abs() <= 1e-12 * scale {
        // Parallel: collinear only if q0 lies on p's supporting line.
        if cross2(qp, r).abs() > 1e-9 * r.length().max(1.0) * r.length() {
            return PieceHit::None;
        }
        let rr = r.length_squared();
        let t0 = qp.dot(r) / rr;
        let t1 = t0 + s.dot(r) / rr;
        let (lo, hi) = if t0 <= t1 { (t0, t1) } else { (t1, t0) };
        return if hi < -slack || lo > 1.0 + slack {
            PieceHit::None
        } else {
            PieceHit::Collinear
        };
    }

    let t = cross2(qp, s) / denom;
    let u = cross2(qp, r) / denom;
    if t < -slack || t > 1.0 + slack || u < -slack || u > 1.0 + slack {
        return PieceHit::None;
    }
    PieceHit::Point { t: t.clamp(0.0, 1.0), u: u.clamp(0.0, 1.0) }
}

/// Closest point on piece `a→b` to `p`: returns `(t, distance)` with `t` in
/// `[0, 1]`.
pub fn closest_on_piece(p: DVec2, a: DVec2, b: DVec2) -> (f64, f64) {
    let ab = b - a;
    let len2 = ab.length_squared();
    if len2 == 0.0 {
        return (0.0, p.distance(a));
    }
    let t = ((p - a).dot(ab) / len2).clamp(0.0, 1.0);
    (t, p.distance(a + ab * t))
}

/// `true` if the closed polygon `ring` has no pair of non-adjacent edges that
/// touch or cross.  O(n²); junction rings are small.
pub fn ring_is_simple(ring: &[DVec2]) -> bool {
    let n = ring.len();
    if n < 3 {
        return false;
    }
    for i in 0..n {
        let a0 = ring[i];
        let a1 = ring[(i + 1) % n];
        for j in (i + 1)..n {
            // Skip edges sharing a vertex with edge i.
            if j == i + 1 || (i == 0 && j == n - 1) {
                continue;
            }
            let b0 = ring[j];
            let b1 = ring[(j + 1) % n];
            if intersect_pieces(a0, a1, b0, b1, 0.0) != PieceHit::None {
                return false;
            }
        }
    }
    true
}

/// Signed area of a closed ring (positive = CCW).
pub fn ring_area(ring: &[DVec2]) -> f64 {
    let n = ring.len();
    (0..n).map(|i| cross2(ring[i], ring[(i + 1) % n])).sum::<f64>() * 0.5
}

/// Upward unit normal of a 3-D triangle, or `None` when degenerate.
pub fn triangle_normal(a: DVec3, b: DVec3, c: DVec3) -> Option<DVec3> {
    (b - a).cross(c - a).try_normalize()
}

// ── Arc-length interpolation ──────────────────────────────────────────────────

/// Cumulative arc length along a polyline, starting at 0.
pub fn cumulative_lengths(points: &[DVec2]) -> Vec<f64> {
    let mut out = Vec::with_capacity(points.len());
    let mut acc = 0.0;
    for (i, p) in points.iter().enumerate() {
        if i > 0 {
            acc += p.distance(points[i - 1]);
        }
        out.push(acc);
    }
    out
}

/// Fill `values` at every station `s` by linear interpolation between the
/// nearest bracketing stations that carry a value.  Before the first and
/// after the last known value the nearest one holds.  With no known value
/// at all every station gets `fallback`.
pub fn fill_by_arc_length(s: &[f64], values: &[Option<f64>], fallback: f64) -> Vec<f64> {
    debug_assert_eq!(s.len(), values.len());
    let known: Vec<usize> = (0..values.len()).filter(|&i| values[i].is_some()).collect();
    let Some((&first, &last)) = known.first().zip(known.last()) else {
        return vec![fallback; values.len()];
    };

    let mut out = Vec::with_capacity(values.len());
    let mut k = 0;
    for i in 0..values.len() {
        let v = if let Some(v) = values[i] {
            v
        } else if i < first {
            values[first].unwrap_or(fallback)
        } else if i > last {
            values[last].unwrap_or(fallback)
        } else {
            while known[k + 1] < i {
                k += 1;
            }
            let (a, b) = (known[k], known[k + 1]);
            let va = values[a].unwrap_or(fallback);
            let vb = values[b].unwrap_or(fallback);
            let span = s[b] - s[a];
            if span <= 0.0 { va } else { va + (vb - va) * (s[i] - s[a]) / span }
        };
        out.push(v);
    }
    out
}
