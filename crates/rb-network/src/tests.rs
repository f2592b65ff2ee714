//! Unit tests for rb-network.

#[cfg(test)]
mod helpers {
    use rb_core::{DVec2, DVec3, GeoPoint, NodeId, SegmentId};

    use crate::{NetworkModel, RoadClass, SegmentSpec, Tags};

    /// 2 lanes × 3.5 m: half-width 3.5.
    pub fn class() -> RoadClass {
        RoadClass::new(2, 3.5)
    }

    pub fn node(m: &mut NetworkModel, x: f64, y: f64) -> NodeId {
        m.add_node(DVec3::new(x, y, 0.0), Tags::new())
    }

    pub fn road(m: &mut NetworkModel, a: NodeId, b: NodeId) -> SegmentId {
        m.add_segment(SegmentSpec::new(a, b, class())).unwrap().0
    }

    /// Four arms of length 10 around a centre node at the origin.
    pub fn cross() -> (NetworkModel, NodeId, Vec<SegmentId>) {
        let mut m = NetworkModel::default();
        let c = node(&mut m, 0.0, 0.0);
        let arms = [(10.0, 0.0), (0.0, 10.0), (-10.0, 0.0), (0.0, -10.0)]
            .into_iter()
            .map(|(x, y)| {
                let n = node(&mut m, x, y);
                road(&mut m, c, n)
            })
            .collect();
        (m, c, arms)
    }

    /// Exact-in-binary test projection: 1° = 20 m.
    pub fn proj(g: GeoPoint) -> DVec2 {
        DVec2::new(g.lon * 20.0, g.lat * 20.0)
    }
}

#[cfg(test)]
mod junctions {
    use std::f64::consts::FRAC_PI_2;

    use rb_core::JunctionId;

    use super::helpers::*;
    use crate::{JunctionKind, NetworkModel, RoadClass, SegmentSpec};

    #[test]
    fn cross_is_degree_four() {
        let (m, c, _) = cross();
        let j = m.junction(JunctionId::of(c)).unwrap();
        assert_eq!(j.kind, JunctionKind::Cross);
        assert_eq!(j.degree(), 4);
    }

    #[test]
    fn incidences_sorted_ccw() {
        let (m, c, arms) = cross();
        let j = m.junction(JunctionId::of(c)).unwrap();
        let angles: Vec<f64> = j.incidences.iter().map(|i| i.angle).collect();
        assert!(angles.windows(2).all(|w| w[0] < w[1]));
        // -π/2 (south arm) first.
        assert_eq!(j.incidences[0].segment, arms[3]);
        assert!((j.incidences[0].angle + FRAC_PI_2).abs() < 1e-12);
    }

    #[test]
    fn right_angle_radius() {
        // hw 3.5 at 90° gaps: 3.5 / tan(45°) = 3.5, plus 0.5 clearance.
        let (m, c, _) = cross();
        let r = m.junction(JunctionId::of(c)).unwrap().radius;
        assert!((r - 4.0).abs() < 1e-9, "radius {r}");
        assert_eq!(m.trim_at(c), r);
    }

    #[test]
    fn acute_gap_grows_radius() {
        let mut m = NetworkModel::default();
        let c = node(&mut m, 0.0, 0.0);
        let a = node(&mut m, 10.0, 0.0);
        let b = node(&mut m, 10.0, 10.0 * (30f64).to_radians().tan());
        road(&mut m, c, a);
        road(&mut m, c, b);
        let r = m.junction(JunctionId::of(c)).unwrap().radius;
        let expected = 3.5 / (15f64).to_radians().tan() + 0.5;
        assert!((r - expected).abs() < 1e-6, "radius {r} vs {expected}");
    }

    #[test]
    fn radius_is_capped() {
        let mut m = NetworkModel::default();
        let c = node(&mut m, 0.0, 0.0);
        let a = node(&mut m, 10.0, 0.0);
        let b = node(&mut m, 10.0, 0.01);
        road(&mut m, c, a);
        road(&mut m, c, b);
        let r = m.junction(JunctionId::of(c)).unwrap().radius;
        assert_eq!(r, m.config().max_junction_radius);
    }

    #[test]
    fn dead_end_has_no_junction() {
        let (m, _, arms) = cross();
        let far = m.segment(arms[0]).unwrap().end;
        assert!(m.junction(JunctionId::of(far)).is_none());
        assert_eq!(m.trim_at(far), 0.0);
    }

    #[test]
    fn straight_pass_through() {
        let mut m = NetworkModel::default();
        let a = node(&mut m, -10.0, 0.0);
        let c = node(&mut m, 0.0, 0.0);
        let b = node(&mut m, 10.0, 0.0);
        road(&mut m, a, c);
        road(&mut m, c, b);
        let j = m.junction(JunctionId::of(c)).unwrap();
        assert_eq!(j.kind, JunctionKind::PassThrough);
        assert!(j.is_straight(1e-6));
        assert!(j.is_seamless(m.config().straight_tolerance));
        assert_eq!(j.radius, 0.0);
        assert_eq!(m.trim_at(c), 0.0);
    }

    #[test]
    fn pass_through_with_a_width_change_keeps_its_trim() {
        let mut m = NetworkModel::default();
        let a = node(&mut m, -10.0, 0.0);
        let c = node(&mut m, 0.0, 0.0);
        let b = node(&mut m, 10.0, 0.0);
        road(&mut m, a, c);
        m.add_segment(SegmentSpec::new(c, b, RoadClass::new(4, 3.5))).unwrap();
        let j = m.junction(JunctionId::of(c)).unwrap();
        assert!(j.is_straight(1e-6));
        assert!(!j.is_seamless(m.config().straight_tolerance));
        assert!(j.radius >= 7.0, "radius {}", j.radius);
    }

    #[test]
    fn slight_bend_within_tolerance_is_seamless() {
        let mut m = NetworkModel::default();
        let a = node(&mut m, -10.0, 0.0);
        let c = node(&mut m, 0.0, 0.0);
        let b = node(&mut m, 10.0, 0.2);
        road(&mut m, a, c);
        road(&mut m, c, b);
        let j = m.junction(JunctionId::of(c)).unwrap();
        assert!(!j.is_straight(1e-6));
        assert!(j.is_seamless(m.config().straight_tolerance));
        assert_eq!(j.radius, 0.0);
    }
}

#[cfg(test)]
mod edits {
    use rb_core::{DVec2, DVec3, DegenerateGeometryError, JunctionId, RegionId, SegmentId};

    use super::helpers::*;
    use crate::{ControlPoint, Cut, Edit, EditError, NetworkModel, RoadClass, SegmentEnd, SegmentSpec, Tags};

    #[test]
    fn endpoints_pinned_to_nodes() {
        let mut m = NetworkModel::default();
        let a = m.add_node(DVec3::new(0.0, 0.0, 2.0), Tags::new());
        let b = node(&mut m, 10.0, 0.0);
        let spec = SegmentSpec::new(a, b, class())
            .with_interior(vec![ControlPoint::new(DVec2::new(5.0, 1.0))]);
        let (s, _) = m.add_segment(spec).unwrap();
        let seg = m.segment(s).unwrap();
        assert_eq!(seg.points.len(), 3);
        assert_eq!(seg.points[0].elevation, Some(2.0));
        assert!(m.check_consistency().is_ok());
    }

    #[test]
    fn zero_length_rejected_and_model_untouched() {
        let mut m = NetworkModel::default();
        let a = node(&mut m, 1.0, 1.0);
        let b = node(&mut m, 1.0, 1.0);
        let before = m.clone();
        let err = m.add_segment(SegmentSpec::new(a, b, class())).unwrap_err();
        assert!(matches!(err, EditError::Degenerate(DegenerateGeometryError::ZeroLength { .. })));
        assert_eq!(m, before);
    }

    #[test]
    fn self_loop_rejected() {
        let mut m = NetworkModel::default();
        let a = node(&mut m, 0.0, 0.0);
        let err = m.add_segment(SegmentSpec::new(a, a, class())).unwrap_err();
        assert!(matches!(err, EditError::Degenerate(DegenerateGeometryError::SelfLoop { .. })));
    }

    #[test]
    fn non_positive_width_rejected() {
        let (mut m, _, arms) = cross();
        let err = m.set_segment_class(arms[0], RoadClass::new(0, 3.5)).unwrap_err();
        assert!(matches!(
            err,
            EditError::Degenerate(DegenerateGeometryError::NonPositiveWidth { .. })
        ));
    }

    #[test]
    fn too_few_points_rejected() {
        let (mut m, _, arms) = cross();
        let err = m.set_control_points(arms[0], vec![ControlPoint::new(DVec2::ZERO)]).unwrap_err();
        assert!(matches!(
            err,
            EditError::Degenerate(DegenerateGeometryError::TooFewPoints { got: 1, .. })
        ));
    }

    #[test]
    fn move_node_drags_segments() {
        let (mut m, c, arms) = cross();
        let v0 = m.segment(arms[0]).unwrap().version;
        let inv = m.move_node(c, DVec3::new(1.0, 1.0, 0.5)).unwrap();
        let seg = m.segment(arms[0]).unwrap();
        assert_eq!(seg.points[0].pos, DVec2::new(1.0, 1.0));
        assert_eq!(seg.points[0].elevation, Some(0.5));
        assert!(seg.version > v0);
        assert!(inv.contains(&RegionId::Junction(JunctionId::of(c))));
        for s in &arms {
            assert!(inv.contains(&RegionId::Segment(*s)));
        }
        assert!(m.check_consistency().is_ok());
    }

    #[test]
    fn move_onto_neighbour_rejected() {
        let (mut m, c, arms) = cross();
        let far = m.segment(arms[0]).unwrap().end;
        let pos = m.node(far).unwrap().pos;
        let before = m.clone();
        assert!(m.move_node(c, pos).is_err());
        assert_eq!(m, before);
    }

    #[test]
    fn deleting_segment_demotes_junction() {
        let mut m = NetworkModel::default();
        let a = node(&mut m, 0.0, 0.0);
        let b = node(&mut m, 10.0, 0.0);
        let c = node(&mut m, 10.0, 10.0);
        road(&mut m, a, b);
        let s2 = road(&mut m, b, c);
        assert!(m.junction(JunctionId::of(b)).is_some());

        let inv = m.delete_segment(s2).unwrap();
        assert!(m.junction(JunctionId::of(b)).is_none());
        assert!(inv.contains(&RegionId::Junction(JunctionId::of(b))));
        assert!(inv.contains(&RegionId::Segment(s2)));
        assert!(m.check_consistency().is_ok());
    }

    #[test]
    fn recreated_junction_gets_fresh_version() {
        let mut m = NetworkModel::default();
        let a = node(&mut m, 0.0, 0.0);
        let b = node(&mut m, 10.0, 0.0);
        let c = node(&mut m, 10.0, 10.0);
        let d = node(&mut m, 10.0, -10.0);
        road(&mut m, a, b);
        let s2 = road(&mut m, b, c);
        let v0 = m.junction(JunctionId::of(b)).unwrap().version;

        m.delete_segment(s2).unwrap();
        assert!(m.junction(JunctionId::of(b)).is_none());
        road(&mut m, b, d);
        let v1 = m.junction(JunctionId::of(b)).unwrap().version;
        assert!(v1 > v0);
    }

    #[test]
    fn delete_node_cascades() {
        let (mut m, c, arms) = cross();
        m.delete_node(c).unwrap();
        assert!(m.node(c).is_none());
        assert_eq!(m.segment_count(), 0);
        assert_eq!(m.junction_count(), 0);
        for s in arms {
            assert!(m.segment(s).is_none());
        }
    }

    #[test]
    fn retarget_moves_endpoint() {
        let (mut m, c, arms) = cross();
        let d = node(&mut m, 20.0, 0.0);
        m.retarget_segment(arms[0], SegmentEnd::End, d).unwrap();
        let seg = m.segment(arms[0]).unwrap();
        assert_eq!(seg.end, d);
        assert_eq!(seg.points[seg.points.len() - 1].pos, DVec2::new(20.0, 0.0));
        assert_eq!(m.node(c).unwrap().degree(), 4);
        assert!(m.check_consistency().is_ok());
    }

    #[test]
    fn split_keeps_first_id() {
        let mut m = NetworkModel::default();
        let a = node(&mut m, 0.0, 0.0);
        let b = node(&mut m, 10.0, 0.0);
        let s = road(&mut m, a, b);
        let mid = node(&mut m, 5.0, 0.0);
        let (ids, inv) = m.split_segment(s, &[Cut { piece: 0, t: 0.5, node: mid }]).unwrap();

        assert_eq!(ids.len(), 2);
        assert_eq!(ids[0], s);
        assert_eq!(m.segment(s).unwrap().end, mid);
        assert_eq!(m.segment(ids[1]).unwrap().start, mid);
        assert!(m.junction(JunctionId::of(mid)).is_some());
        assert!(inv.contains(&RegionId::Segment(ids[1])));
        assert!(m.check_consistency().is_ok());
    }

    #[test]
    fn split_preserves_width_taper() {
        let mut m = NetworkModel::default();
        let a = node(&mut m, 0.0, 0.0);
        let b = node(&mut m, 10.0, 0.0);
        let (s, _) = m.add_segment(SegmentSpec::new(a, b, class())).unwrap();
        m.set_control_points(
            s,
            vec![
                ControlPoint::new(DVec2::ZERO).with_width(4.0),
                ControlPoint::new(DVec2::new(10.0, 0.0)).with_width(8.0),
            ],
        )
        .unwrap();
        let mid = node(&mut m, 5.0, 0.0);
        let (ids, _) = m.split_segment(s, &[Cut { piece: 0, t: 0.5, node: mid }]).unwrap();
        let first = m.segment(ids[0]).unwrap();
        assert_eq!(first.points[first.points.len() - 1].width, Some(6.0));
    }

    #[test]
    fn split_rejects_bad_piece() {
        let (mut m, c, arms) = cross();
        let err = m.split_segment(arms[0], &[Cut { piece: 3, t: 0.5, node: c }]).unwrap_err();
        assert!(matches!(err, EditError::InvalidSplit { .. }));
    }

    #[test]
    fn merge_drops_collapsed_segments() {
        let mut m = NetworkModel::default();
        let a = node(&mut m, 0.0, 0.0);
        let b = node(&mut m, 0.01, 0.0);
        let c = node(&mut m, 10.0, 0.0);
        let ab = road(&mut m, a, b);
        let bc = road(&mut m, b, c);
        m.merge_nodes(a, b).unwrap();

        assert!(m.node(b).is_none());
        assert!(m.segment(ab).is_none());
        assert_eq!(m.segment(bc).unwrap().start, a);
        assert_eq!(m.segment(bc).unwrap().points[0].pos, DVec2::ZERO);
        assert!(m.check_consistency().is_ok());
    }

    #[test]
    fn queued_edit_matches_direct_call() {
        let (mut direct, c, _) = cross();
        let mut queued = direct.clone();
        let pos = DVec3::new(0.5, 0.0, 0.0);
        let a = direct.move_node(c, pos).unwrap();
        let b = Edit::MoveNode { node: c, pos }.apply(&mut queued).unwrap();
        assert_eq!(a, b);
        assert_eq!(direct, queued);
    }

    #[test]
    fn missing_ids_are_errors() {
        let mut m = NetworkModel::default();
        assert!(matches!(
            m.delete_segment(SegmentId(3)),
            Err(EditError::Core(rb_core::CoreError::SegmentNotFound(_)))
        ));
    }
}

#[cfg(test)]
mod import {
    use rb_core::{BuildConfig, DegenerateGeometryError, JunctionId};

    use super::helpers::proj;
    use crate::{import_osm_into, import_osm_str, import_osm_str_auto, ImportError, ImportOptions, NetworkModel, SkipReason};

    fn opts() -> ImportOptions {
        ImportOptions::default()
    }

    /// Two ways crossing at shared node 2.
    const PLUS: &str = r#"<?xml version="1.0"?>
<osm version="0.6">
  <bounds minlat="-1" minlon="-1" maxlat="1" maxlon="1"/>
  <node id="1" lat="0" lon="-0.5"/>
  <node id="2" lat="0" lon="0"/>
  <node id="3" lat="0" lon="0.5"/>
  <node id="4" lat="-0.5" lon="0"/>
  <node id="5" lat="0.5" lon="0"/>
  <way id="10"><nd ref="1"/><nd ref="2"/><nd ref="3"/><tag k="highway" v="primary"/></way>
  <way id="11"><nd ref="4"/><nd ref="2"/><nd ref="5"/><tag k="highway" v="residential"/></way>
  <relation id="99"><member type="way" ref="10" role=""/></relation>
</osm>"#;

    #[test]
    fn shared_node_becomes_junction() {
        let (m, report) = import_osm_str(PLUS, &proj, &opts()).unwrap();
        assert_eq!(m.node_count(), 5);
        assert_eq!(m.segment_count(), 4);
        assert_eq!(report.segments_created, 4);
        assert_eq!(report.ways_imported, 2);
        assert_eq!(report.relations_ignored, 1);
        assert!(report.bounds.is_some());

        let centre = m.nodes().find(|n| n.source == Some(2)).unwrap();
        assert_eq!(centre.degree(), 4);
        assert!(m.junction(JunctionId::of(centre.id)).is_some());
        assert!(m.check_consistency().is_ok());
    }

    #[test]
    fn unshared_nodes_are_control_points() {
        let text = r#"<osm>
  <node id="1" lat="0" lon="0"/>
  <node id="2" lat="0.25" lon="0.5"/>
  <node id="3" lat="0" lon="1"><tag k="ele" v="12.5"/></node>
  <way id="7"><nd ref="1"/><nd ref="2"/><nd ref="3"/></way>
</osm>"#;
        let (m, _) = import_osm_str(text, &proj, &opts()).unwrap();
        assert_eq!(m.node_count(), 2);
        let seg = m.segments().next().unwrap();
        assert_eq!(seg.points.len(), 3);
        assert_eq!(seg.points[1].pos, rb_core::DVec2::new(10.0, 5.0));
        assert_eq!(seg.points[2].elevation, Some(12.5));
        assert_eq!(seg.source_way, Some(7));
    }

    #[test]
    fn tags_drive_road_class() {
        let text = r#"<osm>
  <node id="1" lat="0" lon="0"/>
  <node id="2" lat="0" lon="1"/>
  <way id="7"><nd ref="1"/><nd ref="2"/>
    <tag k="highway" v="secondary"/><tag k="lanes" v="3"/>
    <tag k="width" v="9.5 m"/><tag k="surface" v="asphalt"/><tag k="name" v="Main"/>
  </way>
</osm>"#;
        let (m, _) = import_osm_str(text, &proj, &opts()).unwrap();
        let seg = m.segments().next().unwrap();
        assert_eq!(seg.class.lanes, 3);
        assert_eq!(seg.class.declared_width(), 9.5);
        assert_eq!(seg.class.surface.as_deref(), Some("asphalt"));
        assert_eq!(seg.tags.get("name").map(String::as_str), Some("Main"));
    }

    #[test]
    fn absurd_lane_count_is_capped() {
        let text = r#"<osm>
  <node id="1" lat="0" lon="0"/>
  <node id="2" lat="0" lon="1"/>
  <way id="7"><nd ref="1"/><nd ref="2"/>
    <tag k="highway" v="primary"/><tag k="lanes" v="4000000000"/>
  </way>
</osm>"#;
        let (m, report) = import_osm_str(text, &proj, &opts()).unwrap();
        assert_eq!(report.ways_imported, 1);
        let seg = m.segments().next().unwrap();
        assert_eq!(seg.class.lanes, m.config().max_lanes);
    }

    #[test]
    fn sidewalk_and_oneway_tags() {
        let text = r#"<osm>
  <node id="1" lat="0" lon="0"/>
  <node id="2" lat="0" lon="1"/>
  <node id="3" lat="0" lon="2"/>
  <way id="7"><nd ref="1"/><nd ref="2"/>
    <tag k="highway" v="residential"/><tag k="sidewalk" v="right"/><tag k="oneway" v="yes"/>
  </way>
  <way id="8"><nd ref="2"/><nd ref="3"/>
    <tag k="highway" v="residential"/><tag k="sidewalk" v="both"/><tag k="sidewalk:width" v="3"/>
  </way>
</osm>"#;
        let (m, _) = import_osm_str(text, &proj, &opts()).unwrap();
        let a = m.segments().find(|s| s.source_way == Some(7)).unwrap();
        let b = m.segments().find(|s| s.source_way == Some(8)).unwrap();
        assert!(a.class.oneway);
        assert_eq!((a.class.sidewalks.left, a.class.sidewalks.right), (0.0, m.config().sidewalk_width));
        assert_eq!(a.class.sidewalks.curb_height, m.config().curb_height);
        assert!(!b.class.oneway);
        assert_eq!((b.class.sidewalks.left, b.class.sidewalks.right), (3.0, 3.0));
        // Sidewalks sit outside the carriageway.
        assert_eq!(a.class.declared_width(), b.class.declared_width());
    }

    #[test]
    fn layer_sets_elevation() {
        let text = r#"<osm>
  <node id="1" lat="0" lon="0"/>
  <node id="2" lat="0" lon="1"/>
  <node id="3" lat="0" lon="2"/>
  <way id="7"><nd ref="1"/><nd ref="2"/><tag k="layer" v="1"/></way>
  <way id="8"><nd ref="2"/><nd ref="3"/></way>
</osm>"#;
        let options = ImportOptions { config: BuildConfig { layer_height: 10.0, ..BuildConfig::default() }, ..opts() };
        let (m, _) = import_osm_str(text, &proj, &options).unwrap();
        let z = |osm: i64| m.nodes().find(|n| n.source == Some(osm)).unwrap().pos.z;
        assert_eq!(z(1), 10.0);
        assert_eq!(z(2), 5.0);
        assert_eq!(z(3), 0.0);
    }

    #[test]
    fn closed_way_is_split() {
        let text = r#"<osm>
  <node id="1" lat="0" lon="0"/>
  <node id="2" lat="0" lon="1"/>
  <node id="3" lat="1" lon="1"/>
  <node id="4" lat="1" lon="0"/>
  <way id="7"><nd ref="1"/><nd ref="2"/><nd ref="3"/><nd ref="4"/><nd ref="1"/></way>
</osm>"#;
        let (m, _) = import_osm_str(text, &proj, &opts()).unwrap();
        assert_eq!(m.segment_count(), 2);
        assert_eq!(m.junction_count(), 2);
        assert!(m.check_consistency().is_ok());
    }

    #[test]
    fn drivable_only_filters() {
        let text = r#"<osm>
  <node id="1" lat="0" lon="0"/>
  <node id="2" lat="0" lon="1"/>
  <way id="7"><nd ref="1"/><nd ref="2"/><tag k="highway" v="footway"/></way>
  <way id="8"><nd ref="1"/><nd ref="2"/><tag k="highway" v="trunk_link"/></way>
</osm>"#;
        let options = ImportOptions { drivable_only: true, ..opts() };
        let (m, report) = import_osm_str(text, &proj, &options).unwrap();
        assert_eq!(report.ways_filtered, 1);
        assert_eq!(m.segments().next().unwrap().source_way, Some(8));
    }

    #[test]
    fn degenerate_ways_skipped() {
        let text = r#"<osm>
  <node id="1" lat="0" lon="0"/>
  <node id="2" lat="0" lon="0"/>
  <node id="3" lat="0" lon="1"/>
  <way id="7"><nd ref="1"/><nd ref="1"/></way>
  <way id="8"><nd ref="1"/><nd ref="2"/></way>
  <way id="9"><nd ref="2"/><nd ref="3"/></way>
</osm>"#;
        let (m, report) = import_osm_str(text, &proj, &opts()).unwrap();
        assert_eq!(m.segment_count(), 1);
        assert_eq!(report.skipped.len(), 2);
        assert_eq!(report.skipped[0].reason, SkipReason::TooFewNodes);
        assert!(matches!(
            report.skipped[1].reason,
            SkipReason::Degenerate(DegenerateGeometryError::ZeroLength { .. })
        ));
        // Node 1 lost its only segment and is not kept.
        assert!(m.nodes().all(|n| n.source != Some(1)));
    }

    #[test]
    fn error_taxonomy() {
        let cases: [(&str, fn(&ImportError) -> bool); 7] = [
            ("<osm><node id=\"1\" lat=\"0\" lon=\"0\"/><node id=\"1\" lat=\"1\" lon=\"1\"/></osm>",
             |e| matches!(e, ImportError::DuplicateNode(1))),
            ("<osm><node id=\"1\" lat=\"0\" lon=\"0\"/><way id=\"5\"><nd ref=\"1\"/></way><way id=\"5\"/></osm>",
             |e| matches!(e, ImportError::DuplicateWay(5))),
            ("<osm><node id=\"1\" lat=\"0\" lon=\"0\"/><way id=\"5\"><nd ref=\"1\"/><nd ref=\"2\"/></way></osm>",
             |e| matches!(e, ImportError::UnknownNodeRef { way: 5, node: 2 })),
            ("<osm><node id=\"1\" lon=\"0\"/></osm>",
             |e| matches!(e, ImportError::MissingAttribute { id: 1, attribute: "lat", .. })),
            ("<osm><node id=\"1\" lat=\"north\" lon=\"0\"/></osm>",
             |e| matches!(e, ImportError::InvalidAttribute { id: 1, attribute: "lat", .. })),
            ("<osm><node lat=\"0\" lon=\"0\"/></osm>",
             |e| matches!(e, ImportError::MissingId { element: "node", .. })),
            ("<map/>", |e| matches!(e, ImportError::UnexpectedRoot(_))),
        ];
        for (text, check) in cases {
            let err = import_osm_str(text, &proj, &opts()).unwrap_err();
            assert!(check(&err), "unexpected error {err:?} for {text}");
        }
        assert!(matches!(
            import_osm_str("<osm><node", &proj, &opts()).unwrap_err(),
            ImportError::Xml(_)
        ));
    }

    #[test]
    fn failed_import_leaves_model_untouched() {
        let (mut m, _) = import_osm_str(PLUS, &proj, &opts()).unwrap();
        let before = m.clone();
        let bad = "<osm><node id=\"1\" lat=\"0\" lon=\"0\"/><way id=\"5\"><nd ref=\"1\"/><nd ref=\"9\"/></way></osm>";
        assert!(import_osm_into(&mut m, bad, &proj, &opts()).is_err());
        assert_eq!(m, before);
    }

    #[test]
    fn import_into_appends() {
        let mut m = NetworkModel::default();
        import_osm_into(&mut m, PLUS, &proj, &opts()).unwrap();
        import_osm_into(&mut m, PLUS, &proj, &opts()).unwrap();
        assert_eq!(m.segment_count(), 8);
    }

    #[test]
    fn auto_projection_centres_on_bounds() {
        let (m, _) = import_osm_str_auto(PLUS, &opts()).unwrap();
        let centre = m.nodes().find(|n| n.source == Some(2)).unwrap();
        assert!(centre.xy().length() < 1e-6);
    }
}

#[cfg(test)]
mod tags {
    use crate::tags::{is_drivable, oneway, parse_length};
    use crate::Tags;

    fn tags(kv: &[(&str, &str)]) -> Tags {
        kv.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect()
    }

    #[test]
    fn oneway_is_implied_by_motorways_and_roundabouts() {
        assert!(oneway(&tags(&[("highway", "motorway")])));
        assert!(oneway(&tags(&[("highway", "primary"), ("junction", "roundabout")])));
        assert!(oneway(&tags(&[("oneway", "-1")])));
        assert!(!oneway(&tags(&[("highway", "motorway"), ("oneway", "no")])));
        assert!(!oneway(&tags(&[("highway", "primary")])));
    }

    #[test]
    fn drivable_classes() {
        assert!(is_drivable("motorway"));
        assert!(is_drivable("tertiary_link"));
        assert!(!is_drivable("residential"));
        assert!(!is_drivable("footway"));
    }

    #[test]
    fn lengths() {
        assert_eq!(parse_length("7"), Some(7.0));
        assert_eq!(parse_length("7.5 m"), Some(7.5));
        assert_eq!(parse_length("3,5"), Some(3.5));
        assert_eq!(parse_length("wide"), None);
    }
}
