//! osm_tile: build a road mesh from one OpenStreetMap tile.
//!
//! ```text
//! osm_tile [MAP.osm | MAP.pbf] [--config build.json] [--obj out.obj]
//! ```
//!
//! Without a map file the embedded sample is used: a primary road with two
//! side streets, one of which crosses it without a shared node so the
//! topology resolver has something to split.  After the first build one
//! junction node is nudged and the mesh rebuilt incrementally, to show how
//! few regions an edit touches.  Set `RUST_LOG=debug` for per-pass detail.

use std::path::PathBuf;
use std::time::Instant;

use anyhow::{bail, Context, Result};
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use rb_core::{BuildConfig, DVec3};
use rb_mesh::MeshBuffer;
use rb_network::{import_osm_str_auto, Edit, ImportOptions, ImportReport, NetworkModel};
use rb_pipeline::{PassSummary, PipelineBuilder, PipelineObserver, RegionFailure};

// ── Embedded sample ───────────────────────────────────────────────────────────

const SAMPLE_OSM: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<osm version="0.6" generator="osm_tile">
  <bounds minlat="-0.0010" minlon="-0.0002" maxlat="0.0010" maxlon="0.0030"/>
  <node id="1" lat="0.0000" lon="0.0000"/>
  <node id="2" lat="0.0000" lon="0.0010"/>
  <node id="3" lat="0.0000" lon="0.0020"/>
  <node id="4" lat="0.0001" lon="0.0028"/>
  <node id="5" lat="-0.0008" lon="0.0010"/>
  <node id="6" lat="0.0008" lon="0.0010"/>
  <node id="7" lat="0.0009" lon="0.0017"/>
  <node id="8" lat="0.0006" lon="0.0015"/>
  <node id="9" lat="-0.0006" lon="0.0015"/>
  <way id="100">
    <nd ref="1"/><nd ref="2"/><nd ref="3"/><nd ref="4"/>
    <tag k="highway" v="primary"/>
    <tag k="lanes" v="2"/>
    <tag k="sidewalk" v="both"/>
    <tag k="name" v="Main Street"/>
  </way>
  <way id="101">
    <nd ref="5"/><nd ref="2"/><nd ref="6"/><nd ref="7"/><nd ref="3"/>
    <tag k="highway" v="residential"/>
    <tag k="name" v="Loop Road"/>
  </way>
  <way id="102">
    <nd ref="8"/><nd ref="9"/>
    <tag k="highway" v="tertiary"/>
    <tag k="layer" v="0"/>
  </way>
</osm>
"#;

// ── Arguments ─────────────────────────────────────────────────────────────────

#[derive(Default)]
struct Args {
    map: Option<PathBuf>,
    config: Option<PathBuf>,
    obj: Option<PathBuf>,
}

fn parse_args() -> Result<Args> {
    let mut args = Args::default();
    let mut it = std::env::args().skip(1);
    while let Some(arg) = it.next() {
        match arg.as_str() {
            "--config" => args.config = Some(it.next().context("--config needs a path")?.into()),
            "--obj" => args.obj = Some(it.next().context("--obj needs a path")?.into()),
            flag if flag.starts_with("--") => bail!("unknown flag {flag}"),
            _ if args.map.is_none() => args.map = Some(arg.into()),
            _ => bail!("unexpected argument {arg}"),
        }
    }
    Ok(args)
}

fn load_config(path: Option<&PathBuf>) -> Result<BuildConfig> {
    let Some(path) = path else { return Ok(BuildConfig::default()) };
    let text = std::fs::read_to_string(path).with_context(|| format!("reading {}", path.display()))?;
    let config: BuildConfig =
        serde_json::from_str(&text).with_context(|| format!("parsing {}", path.display()))?;
    Ok(config)
}

fn load_map(path: Option<&PathBuf>, options: &ImportOptions) -> Result<(NetworkModel, ImportReport)> {
    let Some(path) = path else {
        return Ok(import_osm_str_auto(SAMPLE_OSM, options)?);
    };
    if path.extension().is_some_and(|e| e == "pbf") {
        #[cfg(feature = "pbf")]
        return Ok(rb_network::pbf::import_pbf_auto(path, options)?);
        #[cfg(not(feature = "pbf"))]
        bail!("{} is a PBF file; rebuild with `--features pbf`", path.display());
    }
    let text = std::fs::read_to_string(path).with_context(|| format!("reading {}", path.display()))?;
    Ok(import_osm_str_auto(&text, options)?)
}

// ── Observer ──────────────────────────────────────────────────────────────────

/// Prints one line per failed region and per finished pass.
struct Report;

impl PipelineObserver for Report {
    fn on_region_failed(&mut self, failure: &RegionFailure) {
        println!("  ! {}: {}", failure.region, failure.error);
    }

    fn on_pass_end(&mut self, s: &PassSummary) {
        println!(
            "  pass {}: {} edits, {} ribbons, {} patches, {} grown, {} written, {} removed, {} failed",
            s.generation,
            s.edits_applied,
            s.ribbons_built,
            s.patches_built,
            s.junctions_grown,
            s.regions_written,
            s.regions_removed,
            s.failures.len(),
        );
    }
}

fn print_mesh(mesh: &MeshBuffer) {
    let (free_v, free_i) = mesh.free_space();
    println!(
        "Mesh: {} regions, {} vertices, {} triangles ({} vertices / {} indices free)",
        mesh.region_count(),
        mesh.positions().len(),
        mesh.triangle_count(),
        free_v,
        free_i,
    );
}

// ── main ──────────────────────────────────────────────────────────────────────

fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with(tracing_subscriber::fmt::layer())
        .init();

    let args = parse_args()?;
    let config = load_config(args.config.as_ref())?;

    // 1. Import.
    let t0 = Instant::now();
    let options = ImportOptions { config, ..ImportOptions::default() };
    let (model, report) = load_map(args.map.as_ref(), &options)?;
    println!(
        "Imported {} ways into {} nodes / {} segments in {:.1?} ({} skipped, {} filtered)",
        report.ways_imported,
        report.nodes_created,
        report.segments_created,
        t0.elapsed(),
        report.skipped.len(),
        report.ways_filtered,
    );
    for skipped in &report.skipped {
        info!(way = skipped.way, reason = ?skipped.reason, "way skipped");
    }

    // 2. Full build.
    let mut pipeline = PipelineBuilder::new(model).build()?;
    let t1 = Instant::now();
    let summary = pipeline.regenerate(&mut Report)?;
    if let Some(topology) = &summary.topology {
        println!(
            "Topology: {} merged, {} crossings, {} T-junctions, {} duplicates",
            topology.nodes_merged, topology.crossings, topology.t_junctions, topology.duplicates_removed,
        );
    }
    println!(
        "Network: {} segments, {} junctions; built in {:.1?}",
        pipeline.model().segment_count(),
        pipeline.model().junction_count(),
        t1.elapsed(),
    );
    print_mesh(&pipeline.mesh().snapshot());

    // 3. Nudge the busiest junction and rebuild incrementally.
    let busiest = pipeline.model().junctions().max_by_key(|j| j.degree()).map(|j| j.node);
    if let Some(node) = busiest {
        let pos = pipeline.model().node(node).map(|n| n.pos).unwrap_or_default();
        pipeline.submit(Edit::MoveNode { node, pos: pos + DVec3::new(1.5, -1.0, 0.0) });
        let t2 = Instant::now();
        let summary = pipeline.regenerate(&mut Report)?;
        println!(
            "Moved {node}: {} of {} regions rewritten in {:.1?}",
            summary.regions_written,
            pipeline.mesh().snapshot().region_count(),
            t2.elapsed(),
        );
    }

    // 4. Dump.
    if let Some(path) = &args.obj {
        let obj = pipeline.mesh().snapshot().to_obj();
        std::fs::write(path, obj).with_context(|| format!("writing {}", path.display()))?;
        println!("Wrote {}", path.display());
    }
    Ok(())
}
