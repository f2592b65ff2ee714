//! Unit tests for rb-corridor.

#[cfg(test)]
mod helpers {
    use rb_core::{DVec2, DVec3, SegmentId};
    use rb_network::{ControlPoint, NetworkModel, RoadClass, SegmentSpec, Tags};

    /// A model holding one segment through `pts`, all at elevation 0.
    pub fn single(pts: &[(f64, f64)], class: RoadClass) -> (NetworkModel, SegmentId) {
        let mut m = NetworkModel::default();
        let (first, last) = (pts[0], pts[pts.len() - 1]);
        let a = m.add_node(DVec3::new(first.0, first.1, 0.0), Tags::new());
        let b = m.add_node(DVec3::new(last.0, last.1, 0.0), Tags::new());
        let interior = pts[1..pts.len() - 1]
            .iter()
            .map(|&(x, y)| ControlPoint::new(DVec2::new(x, y)))
            .collect();
        let (id, _) = m.add_segment(SegmentSpec::new(a, b, class).with_interior(interior)).unwrap();
        (m, id)
    }

    pub fn turn(a: DVec2, b: DVec2) -> f64 {
        rb_core::geom::cross2(a, b).atan2(a.dot(b)).abs()
    }
}

#[cfg(test)]
mod spline {
    use rb_core::{BuildConfig, DVec2};

    use super::helpers::turn;
    use crate::Centerline;

    #[test]
    fn passes_through_control_points() {
        let ctrl = [
            DVec2::new(0.0, 0.0),
            DVec2::new(12.0, 3.0),
            DVec2::new(15.0, 20.0),
            DVec2::new(40.0, 22.0),
        ];
        let c = Centerline::new(&ctrl).unwrap();
        assert_eq!(c.span_count(), 3);
        for (i, p) in ctrl.iter().enumerate() {
            assert!(c.position(i as f64).distance(*p) < 1e-9, "control {i}");
        }
        let samples = c.sample(&BuildConfig::default());
        for p in &ctrl {
            assert!(samples.iter().any(|s| s.pos.distance(*p) < 1e-9));
        }
    }

    #[test]
    fn rejects_degenerate_input() {
        let p = DVec2::new(1.0, 1.0);
        assert!(Centerline::new(&[p]).is_none());
        assert!(Centerline::new(&[p, p]).is_none());
        assert!(Centerline::new(&[DVec2::ZERO, p, p]).is_none());
    }

    #[test]
    fn straight_input_stays_straight() {
        let c = Centerline::new(&[DVec2::ZERO, DVec2::new(100.0, 0.0)]).unwrap();
        let config = BuildConfig::default();
        let samples = c.sample(&config);
        for s in &samples {
            assert!(s.pos.y.abs() < 1e-9);
            assert!(s.dir.distance(DVec2::X) < 1e-9);
        }
        let last = samples.last().unwrap();
        assert!((last.s - 100.0).abs() < 1e-9);
        for w in samples.windows(2) {
            assert!(w[0].pos.distance(w[1].pos) <= config.max_frame_spacing + 1e-9);
        }
    }

    #[test]
    fn sampling_bounds_turning() {
        let c = Centerline::new(&[DVec2::ZERO, DVec2::new(10.0, 0.0), DVec2::new(10.0, 10.0)]).unwrap();
        let config = BuildConfig::default();
        let samples = c.sample(&config);
        for w in samples.windows(2) {
            let chord = w[0].pos.distance(w[1].pos);
            assert!(
                turn(w[0].dir, w[1].dir) <= config.max_frame_angle + 1e-9
                    || chord < 2.0 * config.min_frame_spacing,
                "turn {} over chord {chord}",
                turn(w[0].dir, w[1].dir)
            );
        }
    }

    #[test]
    fn arc_length_increases() {
        let c = Centerline::new(&[DVec2::ZERO, DVec2::new(5.0, 8.0), DVec2::new(-3.0, 14.0)]).unwrap();
        let samples = c.sample(&BuildConfig::default());
        assert!(samples.windows(2).all(|w| w[1].s > w[0].s && w[1].g > w[0].g));
    }
}

#[cfg(test)]
mod profile {
    use rb_core::BuildConfig;
    use rb_network::{RoadClass, Sidewalks};

    use crate::{LaneKind, MarkStyle, Profile, Side};

    fn styles(p: &Profile) -> Vec<MarkStyle> {
        p.marks.iter().map(|m| m.style).collect()
    }

    #[test]
    fn lanes_and_shoulders() {
        let p = Profile::for_class(&RoadClass::new(2, 3.5).with_shoulders(1.0), &BuildConfig::default());
        assert_eq!(p.len(), 5);
        assert_eq!(p.offsets[0], -1.0);
        assert_eq!(p.offsets[4], 1.0);
        assert!(p.offsets[2].abs() < 1e-12);
        assert!((p.offsets[1] + 7.0 / 9.0).abs() < 1e-12);
        assert!((p.lane_u[2] - 4.5 / 3.5).abs() < 1e-12);
        assert_eq!(
            p.kinds,
            vec![LaneKind::Shoulder, LaneKind::Driving, LaneKind::Driving, LaneKind::Shoulder]
        );
    }

    #[test]
    fn edges_and_lane_boundaries_coincide_without_shoulders() {
        let p = Profile::for_class(&RoadClass::new(2, 3.5), &BuildConfig::default());
        assert_eq!(p.offsets, vec![-1.0, 0.0, 1.0]);
        assert_eq!(p.lane_u, vec![0.0, 1.0, 2.0]);
        assert!(p.sidewalks.is_empty());
    }

    #[test]
    fn narrow_override_drops_shoulders() {
        let mut class = RoadClass::new(2, 3.5).with_shoulders(1.0);
        class.width_override = Some(1.5);
        let p = Profile::for_class(&class, &BuildConfig::default());
        assert_eq!(p.offsets, vec![-1.0, 0.0, 1.0]);
        assert_eq!(p.kinds, vec![LaneKind::Driving; 2]);
    }

    #[test]
    fn lane_count_is_capped() {
        let config = BuildConfig { max_lanes: 6, ..BuildConfig::default() };
        let p = Profile::for_class(&RoadClass::new(u32::MAX, 0.001), &config);
        assert_eq!(p.len(), 7);
        assert_eq!(p.marks.len(), 5);
    }

    #[test]
    fn two_way_centre_line_is_solid_on_wide_roads() {
        let config = BuildConfig::default();
        let p = Profile::for_class(&RoadClass::new(4, 3.5).with_shoulders(1.0), &config);
        assert_eq!(
            styles(&p),
            vec![MarkStyle::Solid, MarkStyle::Dashed, MarkStyle::Solid, MarkStyle::Dashed, MarkStyle::Solid]
        );
        assert!(p.marks[2].offset.abs() < 1e-12);
        assert!(p.marks.windows(2).all(|w| w[0].offset < w[1].offset));

        let p = Profile::for_class(&RoadClass::new(4, 3.5).one_way(), &config);
        assert_eq!(styles(&p), vec![MarkStyle::Dashed; 3]);

        let p = Profile::for_class(&RoadClass::new(2, 3.5), &config);
        assert_eq!(styles(&p), vec![MarkStyle::Dashed]);

        let p = Profile::for_class(&RoadClass::new(1, 3.0), &config);
        assert!(p.marks.is_empty());
    }

    #[test]
    fn sidewalks_sit_outside_the_carriageway() {
        let class = RoadClass::new(2, 3.5).with_sidewalks(Sidewalks { left: 0.0, right: 2.5, curb_height: 0.15 });
        let p = Profile::for_class(&class, &BuildConfig::default());
        assert_eq!(p.offsets, vec![-1.0, 0.0, 1.0]);
        assert_eq!(p.sidewalks.len(), 1);
        assert_eq!(p.sidewalks[0].side, Side::Right);
        assert_eq!(p.sidewalks[0].width, 2.5);
        assert_eq!(p.sidewalks[0].curb_height, 0.15);
    }
}

#[cfg(test)]
mod ribbon {
    use rb_core::{BuildConfig, DVec2, DVec3, DegenerateGeometryError, NodeId, SegmentId};
    use rb_network::{ControlPoint, RoadClass, Segment, SegmentEnd, Tags};

    use super::helpers::*;
    use crate::{build_ribbon, ribbon_for, Trims};

    #[test]
    fn turn_edges_sit_half_width_from_centerline() {
        let (m, id) = single(&[(0.0, 0.0), (10.0, 0.0), (10.0, 10.0)], RoadClass::new(1, 4.0));
        let config = BuildConfig::default();
        let r = build_ribbon(m.segment(id).unwrap(), Trims::default(), &config).unwrap();

        assert!(r.frames[0].center.distance(DVec3::ZERO) < 1e-9);
        assert!(r.frames[r.frames.len() - 1].center.distance(DVec3::new(10.0, 10.0, 0.0)) < 1e-9);
        for f in &r.frames {
            assert!((f.vertex(-1.0).distance(f.center) - 2.0).abs() < 1e-9);
            assert!((f.vertex(1.0).distance(f.center) - 2.0).abs() < 1e-9);
            assert!(f.right.dot(f.tangent).abs() < 1e-9);
            assert_eq!(f.right.z, 0.0);
        }
        for w in r.frames.windows(2) {
            let (a, b) = (w[0].tangent.truncate(), w[1].tangent.truncate());
            let chord = w[0].center.distance(w[1].center);
            assert!(turn(a, b) <= config.max_frame_angle + 1e-9 || chord < 2.0 * config.min_frame_spacing);
        }
    }

    #[test]
    fn left_edge_comes_first() {
        let (m, id) = single(&[(0.0, 0.0), (20.0, 0.0)], RoadClass::new(2, 3.5));
        let r = ribbon_for(&m, m.segment(id).unwrap()).unwrap();
        let verts = r.end_vertices(SegmentEnd::Start);
        assert!(verts[0].y > 0.0);
        assert!(verts[verts.len() - 1].y < 0.0);
    }

    #[test]
    fn trims_cut_at_arc_length() {
        let (m, id) = single(&[(0.0, 0.0), (100.0, 0.0)], RoadClass::new(1, 3.0));
        let r = build_ribbon(m.segment(id).unwrap(), Trims::new(10.0, 20.0), m.config()).unwrap();
        let (first, last) = (r.frame_at(SegmentEnd::Start), r.frame_at(SegmentEnd::End));
        assert!((first.s - 10.0).abs() < 1e-6);
        assert!((last.s - 80.0).abs() < 1e-6);
        assert!((first.center.x - 10.0).abs() < 1e-6);
        assert!((last.center.x - 80.0).abs() < 1e-6);
        assert!((r.trimmed_length() - 70.0).abs() < 1e-6);
    }

    #[test]
    fn frames_interpolate_between_stations() {
        let (m, id) = single(&[(0.0, 0.0), (100.0, 0.0)], RoadClass::new(1, 3.0));
        let r = build_ribbon(m.segment(id).unwrap(), Trims::new(10.0, 20.0), m.config()).unwrap();
        let f = r.frame_at_s(33.3);
        assert!((f.center.x - 33.3).abs() < 1e-6);
        assert!((f.s - 33.3).abs() < 1e-9);
        assert!((f.half_width - 1.5).abs() < 1e-12);
        // Clamped to the trimmed ends.
        assert!((r.frame_at_s(0.0).center.x - 10.0).abs() < 1e-6);
        assert!((r.frame_at_s(500.0).center.x - 80.0).abs() < 1e-6);
    }

    #[test]
    fn oversized_trims_scale_down() {
        let (m, id) = single(&[(0.0, 0.0), (10.0, 0.0)], RoadClass::new(1, 3.0));
        let r = build_ribbon(m.segment(id).unwrap(), Trims::new(8.0, 8.0), m.config()).unwrap();
        assert!((r.trims.start - 4.5).abs() < 1e-9);
        assert!((r.trims.end - 4.5).abs() < 1e-9);
        assert!((r.trimmed_length() - 1.0).abs() < 1e-6);
    }

    #[test]
    fn end_frame_ignores_other_trim() {
        let (m, id) = single(&[(0.0, 0.0), (30.0, 0.0), (30.0, 30.0)], RoadClass::new(2, 3.5));
        let seg = m.segment(id).unwrap();
        let a = build_ribbon(seg, Trims::new(5.0, 5.0), m.config()).unwrap();
        let b = build_ribbon(seg, Trims::new(5.0, 15.0), m.config()).unwrap();
        assert_eq!(a.frames[0], b.frames[0]);
        assert_ne!(a.frame_at(SegmentEnd::End), b.frame_at(SegmentEnd::End));
    }

    #[test]
    fn width_interpolates_between_overrides() {
        let (mut m, id) = single(&[(0.0, 0.0), (20.0, 0.0)], RoadClass::new(1, 3.0));
        m.set_control_points(
            id,
            vec![
                ControlPoint::new(DVec2::ZERO).with_width(4.0),
                ControlPoint::new(DVec2::new(10.0, 0.0)),
                ControlPoint::new(DVec2::new(20.0, 0.0)).with_width(8.0),
            ],
        )
        .unwrap();
        let r = ribbon_for(&m, m.segment(id).unwrap()).unwrap();
        for f in &r.frames {
            let expect = 0.5 * (4.0 + 4.0 * f.s / 20.0);
            assert!((f.half_width - expect).abs() < 1e-6, "s = {}", f.s);
        }
    }

    #[test]
    fn elevation_follows_nodes() {
        let mut m = rb_network::NetworkModel::default();
        let a = m.add_node(DVec3::ZERO, Tags::new());
        let b = m.add_node(DVec3::new(100.0, 0.0, 10.0), Tags::new());
        let (id, _) = m
            .add_segment(rb_network::SegmentSpec::new(a, b, RoadClass::new(1, 3.0)))
            .unwrap();
        let r = ribbon_for(&m, m.segment(id).unwrap()).unwrap();
        for f in &r.frames {
            assert!((f.center.z - f.s / 10.0).abs() < 1e-6);
            assert!(f.tangent.z > 0.0);
        }
    }

    #[test]
    fn degenerate_segments_are_rejected() {
        let mut seg = Segment {
            id: SegmentId(3),
            start: NodeId(0),
            end: NodeId(1),
            points: vec![ControlPoint::new(DVec2::ZERO)],
            class: RoadClass::new(1, 3.0),
            tags: Tags::new(),
            version: 0,
            source_way: None,
        };
        let config = BuildConfig::default();
        assert_eq!(
            build_ribbon(&seg, Trims::default(), &config),
            Err(DegenerateGeometryError::TooFewPoints { segment: SegmentId(3), got: 1 })
        );

        seg.points = vec![ControlPoint::new(DVec2::ZERO), ControlPoint::new(DVec2::ZERO)];
        assert_eq!(
            build_ribbon(&seg, Trims::default(), &config),
            Err(DegenerateGeometryError::ZeroLength { segment: SegmentId(3) })
        );

        seg.points = vec![
            ControlPoint::new(DVec2::ZERO).with_width(-1.0),
            ControlPoint::new(DVec2::new(5.0, 0.0)),
        ];
        assert!(matches!(
            build_ribbon(&seg, Trims::default(), &config),
            Err(DegenerateGeometryError::NonPositiveWidth { .. })
        ));
    }
}
