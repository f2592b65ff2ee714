//! OpenStreetMap import.
//!
//! # Usage
//!
//! ```
//! use rb_network::import::{import_osm_str_auto, ImportOptions};
//!
//! let osm = r#"<osm version="0.6">
//!   <node id="1" lat="0.0" lon="0.0"/>
//!   <node id="2" lat="0.0" lon="0.001"/>
//!   <way id="10"><nd ref="1"/><nd ref="2"/><tag k="highway" v="primary"/></way>
//! </osm>"#;
//!
//! let (model, report) = import_osm_str_auto(osm, &ImportOptions::default()).unwrap();
//! assert_eq!(model.segment_count(), 1);
//! assert_eq!(report.ways_imported, 1);
//! ```
//!
//! # Graph construction
//!
//! A way node becomes a network [`Node`](crate::Node) when it is a way
//! endpoint, is shared by more than one way, or repeats within one way.  All
//! other way nodes become interior control points.  Each way is cut into one
//! segment per run between network nodes; a closed run (same node at both
//! ends) is split again at its middle point.
//!
//! Node elevation is the `ele` tag when present, otherwise the mean of
//! `layer · layer_height` over the ways touching the node.  Interior points
//! carry only an explicit `ele`; the corridor generator interpolates the rest.
//!
//! # Atomicity
//!
//! Parsing and validation happen before the model is touched.
//! [`import_osm_into`] additionally stages into a clone and commits only on
//! success.

use rb_core::{BuildConfig, DVec3, GeoBounds, GeoPoint, LocalProjection, NodeId, Projection};
use rustc_hash::{FxHashMap, FxHashSet};
use tracing::{debug, warn};

use crate::edit::SegmentSpec;
use crate::error::{EditError, ImportError, ImportResult};
use crate::model::{ControlPoint, NetworkModel, Tags};
use crate::tags;

// ── Options & report ──────────────────────────────────────────────────────────

/// Import switches.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct ImportOptions {
    /// Keep only motorway / trunk / primary / secondary / tertiary ways and
    /// their `_link` variants.
    pub drivable_only: bool,
    /// Configuration of the model created by [`import_osm_str`].
    /// [`import_osm_into`] uses the target model's configuration instead.
    pub config: BuildConfig,
}

/// Why a way produced no segments.
#[derive(Clone, Debug, PartialEq)]
pub enum SkipReason {
    /// Fewer than two distinct consecutive node refs.
    TooFewNodes,
    /// A run between two network nodes was degenerate.
    Degenerate(rb_core::DegenerateGeometryError),
}

#[derive(Clone, Debug, PartialEq)]
pub struct SkippedWay {
    pub way: i64,
    pub reason: SkipReason,
}

/// Summary of one import.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct ImportReport {
    /// `<bounds>` element, when the file has one.
    pub bounds: Option<GeoBounds>,
    pub nodes_created: usize,
    pub segments_created: usize,
    pub ways_imported: usize,
    /// Ways dropped by `drivable_only`.
    pub ways_filtered: usize,
    pub skipped: Vec<SkippedWay>,
    pub relations_ignored: usize,
}

// ── Raw OSM ───────────────────────────────────────────────────────────────────

/// Format-neutral OSM content, filled by the XML parser or the PBF reader.
#[derive(Default)]
pub(crate) struct RawOsm {
    pub bounds: Option<GeoBounds>,
    pub nodes: Vec<RawNode>,
    pub ways: Vec<RawWay>,
    pub relations: usize,
}

pub(crate) struct RawNode {
    pub id: i64,
    pub geo: GeoPoint,
    pub tags: Tags,
}

pub(crate) struct RawWay {
    pub id: i64,
    pub refs: Vec<i64>,
    pub tags: Tags,
}

// ── Public entry points ───────────────────────────────────────────────────────

/// Import OSM XML into a fresh model.
pub fn import_osm_str<P: Projection + ?Sized>(
    text: &str,
    projection: &P,
    options: &ImportOptions,
) -> ImportResult<(NetworkModel, ImportReport)> {
    let raw = parse_xml(text)?;
    let mut model = NetworkModel::new(options.config.clone());
    let report = build_graph(&mut model, raw, projection, options)?;
    Ok((model, report))
}

/// Import OSM XML with a [`LocalProjection`] centred on the file's
/// `<bounds>`, or on the bounding box of its nodes when there is none.
pub fn import_osm_str_auto(
    text: &str,
    options: &ImportOptions,
) -> ImportResult<(NetworkModel, ImportReport)> {
    let raw = parse_xml(text)?;
    let projection = auto_projection(&raw);
    let mut model = NetworkModel::new(options.config.clone());
    let report = build_graph(&mut model, raw, &projection, options)?;
    Ok((model, report))
}

/// Import OSM XML into an existing model.  On error `model` is unchanged.
pub fn import_osm_into<P: Projection + ?Sized>(
    model: &mut NetworkModel,
    text: &str,
    projection: &P,
    options: &ImportOptions,
) -> ImportResult<ImportReport> {
    let raw = parse_xml(text)?;
    let mut staged = model.clone();
    let report = build_graph(&mut staged, raw, projection, options)?;
    *model = staged;
    Ok(report)
}

pub(crate) fn auto_projection(raw: &RawOsm) -> LocalProjection {
    let bounds = raw
        .bounds
        .or_else(|| GeoBounds::from_points(raw.nodes.iter().map(|n| n.geo)))
        .unwrap_or_else(|| GeoBounds::new(GeoPoint::new(0.0, 0.0), GeoPoint::new(0.0, 0.0)));
    LocalProjection::centered_on(&bounds)
}

// ── XML parsing ───────────────────────────────────────────────────────────────

fn parse_xml(text: &str) -> ImportResult<RawOsm> {
    let doc = roxmltree::Document::parse(text)?;
    let root = doc.root_element();
    if root.tag_name().name() != "osm" {
        return Err(ImportError::UnexpectedRoot(root.tag_name().name().to_string()));
    }

    let mut raw = RawOsm::default();
    for el in root.children().filter(|n| n.is_element()) {
        match el.tag_name().name() {
            "bounds" => raw.bounds = parse_bounds(&el),
            "node" => {
                let id = element_id(&doc, &el, "node")?;
                let lat = float_attr(&el, "node", id, "lat")?;
                let lon = float_attr(&el, "node", id, "lon")?;
                raw.nodes.push(RawNode { id, geo: GeoPoint::new(lat, lon), tags: collect_tags(&el) });
            }
            "way" => {
                let id = element_id(&doc, &el, "way")?;
                let mut refs = Vec::new();
                for nd in el.children().filter(|n| n.has_tag_name("nd")) {
                    let r = nd.attribute("ref").ok_or(ImportError::MissingAttribute {
                        element: "way",
                        id,
                        attribute: "ref",
                    })?;
                    refs.push(r.trim().parse().map_err(|_| ImportError::InvalidAttribute {
                        element: "way",
                        id,
                        attribute: "ref",
                        value: r.to_string(),
                    })?);
                }
                raw.ways.push(RawWay { id, refs, tags: collect_tags(&el) });
            }
            "relation" => raw.relations += 1,
            _ => {}
        }
    }
    Ok(raw)
}

fn element_id(
    doc: &roxmltree::Document,
    el: &roxmltree::Node,
    element: &'static str,
) -> ImportResult<i64> {
    let Some(v) = el.attribute("id") else {
        let pos = doc.text_pos_at(el.range().start);
        return Err(ImportError::MissingId { element, position: format!("{}:{}", pos.row, pos.col) });
    };
    v.trim().parse().map_err(|_| ImportError::InvalidAttribute {
        element,
        id: 0,
        attribute: "id",
        value: v.to_string(),
    })
}

fn float_attr(
    el: &roxmltree::Node,
    element: &'static str,
    id: i64,
    attribute: &'static str,
) -> ImportResult<f64> {
    let v = el
        .attribute(attribute)
        .ok_or(ImportError::MissingAttribute { element, id, attribute })?;
    v.trim()
        .parse::<f64>()
        .ok()
        .filter(|x| x.is_finite())
        .ok_or_else(|| ImportError::InvalidAttribute {
            element,
            id,
            attribute,
            value: v.to_string(),
        })
}

fn collect_tags(el: &roxmltree::Node) -> Tags {
    el.children()
        .filter(|n| n.has_tag_name("tag"))
        .filter_map(|t| Some((t.attribute("k")?.to_string(), t.attribute("v")?.to_string())))
        .collect()
}

fn parse_bounds(el: &roxmltree::Node) -> Option<GeoBounds> {
    let get = |k: &str| el.attribute(k)?.trim().parse::<f64>().ok();
    Some(GeoBounds::new(
        GeoPoint::new(get("minlat")?, get("minlon")?),
        GeoPoint::new(get("maxlat")?, get("maxlon")?),
    ))
}

// ── Graph construction ────────────────────────────────────────────────────────

pub(crate) fn build_graph<P: Projection + ?Sized>(
    model: &mut NetworkModel,
    raw: RawOsm,
    projection: &P,
    options: &ImportOptions,
) -> ImportResult<ImportReport> {
    let mut report = ImportReport {
        bounds: raw.bounds,
        relations_ignored: raw.relations,
        ..ImportReport::default()
    };

    // ── Phase 1: validate ids and references ─────────────────────────────
    let mut node_index: FxHashMap<i64, usize> = FxHashMap::default();
    node_index.reserve(raw.nodes.len());
    for (i, n) in raw.nodes.iter().enumerate() {
        if node_index.insert(n.id, i).is_some() {
            return Err(ImportError::DuplicateNode(n.id));
        }
    }
    let mut way_ids: FxHashSet<i64> = FxHashSet::default();
    for w in &raw.ways {
        if !way_ids.insert(w.id) {
            return Err(ImportError::DuplicateWay(w.id));
        }
        if let Some(&missing) = w.refs.iter().find(|r| !node_index.contains_key(r)) {
            return Err(ImportError::UnknownNodeRef { way: w.id, node: missing });
        }
    }

    // ── Phase 2: select ways and collapse repeated refs ──────────────────
    let mut ways: Vec<(&RawWay, Vec<i64>)> = Vec::new();
    for w in &raw.ways {
        if options.drivable_only && !w.tags.get("highway").is_some_and(|h| tags::is_drivable(h)) {
            report.ways_filtered += 1;
            continue;
        }
        let mut refs = w.refs.clone();
        refs.dedup();
        if refs.len() < 2 {
            warn!(way = w.id, "skipping way with fewer than two distinct nodes");
            report.skipped.push(SkippedWay { way: w.id, reason: SkipReason::TooFewNodes });
            continue;
        }
        ways.push((w, refs));
    }

    // ── Phase 3: decide which way nodes are network nodes ────────────────
    let mut uses: FxHashMap<i64, u32> = FxHashMap::default();
    let mut graph: FxHashSet<i64> = FxHashSet::default();
    for (_, refs) in &ways {
        for r in refs {
            *uses.entry(*r).or_insert(0) += 1;
        }
        graph.insert(refs[0]);
        graph.insert(refs[refs.len() - 1]);
    }
    graph.extend(uses.iter().filter(|&(_, &n)| n >= 2).map(|(&r, _)| r));

    // Mean layer over the ways touching each network node.
    let mut layers: FxHashMap<i64, (i64, u32)> = FxHashMap::default();
    for (w, refs) in &ways {
        let layer = tags::layer(&w.tags) as i64;
        let mut seen: FxHashSet<i64> = FxHashSet::default();
        for r in refs.iter().filter(|r| graph.contains(r)) {
            if seen.insert(*r) {
                let e = layers.entry(*r).or_insert((0, 0));
                e.0 += layer;
                e.1 += 1;
            }
        }
    }

    // ── Phase 4: create network nodes in document order ──────────────────
    let layer_height = model.config().layer_height;
    let mut node_map: FxHashMap<i64, NodeId> = FxHashMap::default();
    let first_new = model.nodes.len();
    for n in raw.nodes.iter().filter(|n| graph.contains(&n.id)) {
        let z = tags::elevation(&n.tags).unwrap_or_else(|| {
            let (sum, count) = layers.get(&n.id).copied().unwrap_or((0, 1));
            sum as f64 / count.max(1) as f64 * layer_height
        });
        let xy = projection.project(n.geo);
        let id = model.push_node(DVec3::new(xy.x, xy.y, z), n.tags.clone(), Some(n.id));
        node_map.insert(n.id, id);
    }

    // ── Phase 5: cut ways into segments ──────────────────────────────────
    for (w, refs) in &ways {
        let class = tags::road_class(&w.tags, model.config());
        let mut runs: Vec<&[i64]> = Vec::new();
        let mut from = 0;
        for i in 1..refs.len() {
            if node_map.contains_key(&refs[i]) {
                runs.push(&refs[from..=i]);
                from = i;
            }
        }

        let mut created = 0;
        let mut failure = None;
        for run in runs {
            let pieces: Vec<&[i64]> = if run[0] == run[run.len() - 1] {
                // Closed run: promote the middle interior point to a node.
                let mid = run.len() / 2;
                let raw_node = &raw.nodes[node_index[&run[mid]]];
                let xy = projection.project(raw_node.geo);
                let z = tags::elevation(&raw_node.tags)
                    .unwrap_or(tags::layer(&w.tags) as f64 * layer_height);
                let id = model.push_node(DVec3::new(xy.x, xy.y, z), raw_node.tags.clone(), Some(raw_node.id));
                node_map.insert(run[mid], id);
                vec![&run[..=mid], &run[mid..]]
            } else {
                vec![run]
            };

            for piece in pieces {
                let interior = piece[1..piece.len() - 1]
                    .iter()
                    .map(|r| {
                        let n = &raw.nodes[node_index[r]];
                        let cp = ControlPoint::new(projection.project(n.geo));
                        match tags::elevation(&n.tags) {
                            Some(z) => cp.with_elevation(z),
                            None => cp,
                        }
                    })
                    .collect();
                let spec = SegmentSpec {
                    start: node_map[&piece[0]],
                    end: node_map[&piece[piece.len() - 1]],
                    interior,
                    class: class.clone(),
                    tags: w.tags.clone(),
                    source_way: Some(w.id),
                };
                match model.add_segment(spec) {
                    Ok(_) => created += 1,
                    Err(EditError::Degenerate(e)) => {
                        warn!(way = w.id, error = %e, "skipping degenerate run");
                        failure = Some(e);
                    }
                    Err(other) => return Err(ImportError::Model(other)),
                }
            }
        }

        report.segments_created += created;
        if created > 0 {
            report.ways_imported += 1;
        } else if let Some(e) = failure {
            report.skipped.push(SkippedWay { way: w.id, reason: SkipReason::Degenerate(e) });
        }
    }

    // Nodes left without any segment (all their runs were degenerate).
    for slot in &mut model.nodes[first_new..] {
        if slot.as_ref().is_some_and(|n| n.segments.is_empty()) {
            *slot = None;
        }
    }
    report.nodes_created = model.nodes[first_new..].iter().flatten().count();

    debug!(
        nodes = report.nodes_created,
        segments = report.segments_created,
        skipped = report.skipped.len(),
        relations = report.relations_ignored,
        "OSM import complete"
    );
    Ok(report)
}
