//! Unit tests for rb-junction.

#[cfg(test)]
mod helpers {
    use std::collections::BTreeMap;

    use rb_core::{DVec3, NodeId, SegmentId};
    use rb_corridor::{ribbon_for, Ribbon};
    use rb_network::{NetworkModel, RoadClass, SegmentSpec, Tags};

    /// A hub at the origin with one straight arm per `(x, y)` far end.
    /// `inbound` arms run towards the hub, the rest away from it.
    pub fn star(arms: &[(f64, f64, bool)]) -> (NetworkModel, NodeId) {
        let mut m = NetworkModel::default();
        let hub = m.add_node(DVec3::ZERO, Tags::new());
        for &(x, y, inbound) in arms {
            let far = m.add_node(DVec3::new(x, y, 0.0), Tags::new());
            let (a, b) = if inbound { (far, hub) } else { (hub, far) };
            m.add_segment(SegmentSpec::new(a, b, RoadClass::new(2, 3.5))).unwrap();
        }
        (m, hub)
    }

    pub fn ribbons(m: &NetworkModel) -> BTreeMap<SegmentId, Ribbon> {
        m.segments().map(|s| (s.id, ribbon_for(m, s).unwrap())).collect()
    }
}

#[cfg(test)]
mod fan {
    use rb_core::geom::orient;
    use rb_core::JunctionId;
    use rb_network::SegmentEnd;

    use super::helpers::*;
    use crate::{boundary_run, patch_for, JunctionGeometryError, PatchKind};

    #[test]
    fn cross_boundary_matches_ribbon_ends() {
        let (m, hub) = star(&[(50.0, 0.0, false), (0.0, 50.0, true), (-50.0, 0.0, false), (0.0, -50.0, true)]);
        let rs = ribbons(&m);
        let j = m.junction(JunctionId::of(hub)).unwrap();
        let patch = patch_for(&m, j, |s| rs.get(&s)).unwrap();

        assert_eq!(patch.kind, PatchKind::Fan);
        assert_eq!(patch.runs.len(), 4);
        assert_eq!(patch.vertices.len(), patch.boundary_len + 1);

        for (run, inc) in patch.runs.iter().zip(&j.incidences) {
            assert_eq!(run.segment, inc.segment);
            let expected = boundary_run(&rs[&inc.segment], inc.end);
            assert_eq!(&patch.boundary()[run.first..run.first + run.len], expected.as_slice());
        }

        // Start ends are reversed, end ends are not.
        let east = patch.runs.iter().find(|r| r.end == SegmentEnd::Start).unwrap();
        let mut fwd = rs[&east.segment].end_vertices(SegmentEnd::Start);
        fwd.reverse();
        assert_eq!(&patch.boundary()[east.first..east.first + east.len], fwd.as_slice());
    }

    #[test]
    fn fan_triangles_are_ccw() {
        let (m, hub) = star(&[(40.0, 5.0, false), (-10.0, 45.0, false), (-30.0, -30.0, true)]);
        let rs = ribbons(&m);
        let j = m.junction(JunctionId::of(hub)).unwrap();
        let patch = patch_for(&m, j, |s| rs.get(&s)).unwrap();

        assert_eq!(patch.triangles.len(), patch.boundary_len);
        for t in &patch.triangles {
            let [a, b, c] = t.map(|i| patch.vertices[i as usize].truncate());
            assert!(orient(a, b, c) > 0.0);
        }
        let centre = patch.vertices[patch.boundary_len];
        assert!(centre.truncate().length() < 1e-12);
    }

    #[test]
    fn arms_on_one_side_are_not_star_shaped() {
        let (m, hub) = star(&[(50.0, 0.0, false), (47.0, 17.1, false), (38.3, 32.1, false)]);
        let rs = ribbons(&m);
        let j = m.junction(JunctionId::of(hub)).unwrap();
        let err = patch_for(&m, j, |s| rs.get(&s)).unwrap_err();
        assert!(matches!(err, JunctionGeometryError::NotStarShaped { .. }));
        assert_eq!(err.junction(), j.id);
    }

    #[test]
    fn missing_ribbon_is_reported() {
        let (m, hub) = star(&[(50.0, 0.0, false), (0.0, 50.0, false), (-50.0, 0.0, false)]);
        let j = m.junction(JunctionId::of(hub)).unwrap();
        let err = patch_for(&m, j, |_| None).unwrap_err();
        assert_eq!(
            err,
            JunctionGeometryError::MissingRibbon { junction: j.id, segment: j.incidences[0].segment }
        );
    }
}

#[cfg(test)]
mod strip {
    use rb_core::geom::orient;
    use rb_core::{DVec3, JunctionId};
    use rb_network::{NetworkModel, RoadClass, SegmentSpec, Tags};

    use super::helpers::*;
    use crate::{patch_for, PatchKind};

    #[test]
    fn straight_pass_through_is_a_seam() {
        let (m, hub) = star(&[(-50.0, 0.0, true), (50.0, 0.0, false)]);
        let rs = ribbons(&m);
        let j = m.junction(JunctionId::of(hub)).unwrap();
        let patch = patch_for(&m, j, |s| rs.get(&s)).unwrap();

        assert_eq!(patch.kind, PatchKind::Seam);
        assert_eq!(patch.vertices.len(), patch.boundary_len);
        assert_eq!(patch.boundary_len, 6);
        // Both ribbons run to the node, so their end frames coincide.
        let b = patch.boundary();
        for i in 0..3 {
            assert!(b[i].distance(b[5 - i]) < 1e-9, "{} vs {}", b[i], b[5 - i]);
        }
        assert!(patch.triangles.is_empty());
    }

    #[test]
    fn slight_bend_seam_fills_only_the_open_side() {
        let (m, hub) = star(&[(-50.0, 0.0, true), (50.0, 2.0, false)]);
        let rs = ribbons(&m);
        let j = m.junction(JunctionId::of(hub)).unwrap();
        let patch = patch_for(&m, j, |s| rs.get(&s)).unwrap();

        assert_eq!(patch.kind, PatchKind::Seam);
        assert_eq!(patch.vertices.len(), patch.boundary_len);
        assert!(!patch.triangles.is_empty());
        assert!(patch.triangles.len() < patch.boundary_len - 2);
        for t in &patch.triangles {
            let [a, b, c] = t.map(|i| patch.vertices[i as usize].truncate());
            assert!(orient(a, b, c) > 0.0);
        }
    }

    #[test]
    fn width_change_on_a_straight_is_a_bridge() {
        let mut m = NetworkModel::default();
        let hub = m.add_node(DVec3::ZERO, Tags::new());
        let west = m.add_node(DVec3::new(-50.0, 0.0, 0.0), Tags::new());
        let east = m.add_node(DVec3::new(50.0, 0.0, 0.0), Tags::new());
        m.add_segment(SegmentSpec::new(west, hub, RoadClass::new(2, 3.5))).unwrap();
        m.add_segment(SegmentSpec::new(hub, east, RoadClass::new(4, 3.5))).unwrap();
        let rs = ribbons(&m);
        let j = m.junction(JunctionId::of(hub)).unwrap();
        let patch = patch_for(&m, j, |s| rs.get(&s)).unwrap();

        assert_eq!(patch.kind, PatchKind::Bridge);
        assert_eq!(patch.triangles.len(), patch.boundary_len - 2);
        // Both ends keep their trim back from the node.
        let mut lens: Vec<usize> = patch.runs.iter().map(|r| r.len).collect();
        lens.sort();
        assert_eq!(lens, vec![3, 5]);
        assert!(patch.boundary().iter().all(|v| v.x.abs() > 1.0));
    }

    #[test]
    fn bend_is_a_bridge() {
        let (m, hub) = star(&[(-50.0, 0.0, true), (0.0, 50.0, false)]);
        let rs = ribbons(&m);
        let j = m.junction(JunctionId::of(hub)).unwrap();
        let patch = patch_for(&m, j, |s| rs.get(&s)).unwrap();

        assert_eq!(patch.kind, PatchKind::Bridge);
        assert_eq!(patch.triangles.len(), patch.boundary_len - 2);
        for t in &patch.triangles {
            let [a, b, c] = t.map(|i| patch.vertices[i as usize].truncate());
            assert!(orient(a, b, c) > 0.0);
        }
    }
}
