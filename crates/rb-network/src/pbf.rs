//! OSM PBF import, enabled with the `pbf` Cargo feature.
//!
//! Reads every node, way and relation in one sequential pass into the same
//! format-neutral form the XML parser produces, then runs the shared graph
//! construction.  The error taxonomy and atomicity guarantees are identical
//! to the XML path.
//!
//! ```ignore
//! use std::path::Path;
//! use rb_network::pbf::import_pbf;
//!
//! let (model, report) = import_pbf(Path::new("tile.osm.pbf"), &projection, &options)?;
//! ```

use std::path::Path;

use osmpbf::{Element, ElementReader};

use rb_core::{GeoPoint, Projection};

use crate::error::{ImportError, ImportResult};
use crate::import::{build_graph, ImportOptions, ImportReport, RawNode, RawOsm, RawWay};
use crate::model::{NetworkModel, Tags};

/// Load an OSM PBF file into a fresh model.
///
/// # Errors
///
/// [`ImportError::Pbf`] when the file cannot be opened or decoded, and the
/// usual graph errors otherwise.
pub fn import_pbf<P: Projection + ?Sized>(
    path: &Path,
    projection: &P,
    options: &ImportOptions,
) -> ImportResult<(NetworkModel, ImportReport)> {
    let raw = read_pbf(path)?;
    let mut model = NetworkModel::new(options.config.clone());
    let report = build_graph(&mut model, raw, projection, options)?;
    Ok((model, report))
}

/// Like [`import_pbf`], with a projection centred on the data.
pub fn import_pbf_auto(
    path: &Path,
    options: &ImportOptions,
) -> ImportResult<(NetworkModel, ImportReport)> {
    let raw = read_pbf(path)?;
    let projection = crate::import::auto_projection(&raw);
    let mut model = NetworkModel::new(options.config.clone());
    let report = build_graph(&mut model, raw, &projection, options)?;
    Ok((model, report))
}

fn read_pbf(path: &Path) -> ImportResult<RawOsm> {
    let reader = ElementReader::from_path(path).map_err(|e| ImportError::Pbf(e.to_string()))?;
    let mut raw = RawOsm::default();

    reader
        .for_each(|elem| match elem {
            Element::Node(n) => raw.nodes.push(RawNode {
                id: n.id(),
                geo: GeoPoint::new(n.lat(), n.lon()),
                tags: to_tags(n.tags()),
            }),
            Element::DenseNode(n) => raw.nodes.push(RawNode {
                id: n.id(),
                geo: GeoPoint::new(n.lat(), n.lon()),
                tags: to_tags(n.tags()),
            }),
            Element::Way(w) => raw.ways.push(RawWay {
                id: w.id(),
                refs: w.refs().collect(),
                tags: to_tags(w.tags()),
            }),
            Element::Relation(_) => raw.relations += 1,
        })
        .map_err(|e| ImportError::Pbf(e.to_string()))?;

    Ok(raw)
}

fn to_tags<'a>(tags: impl Iterator<Item = (&'a str, &'a str)>) -> Tags {
    tags.map(|(k, v)| (k.to_string(), v.to_string())).collect()
}
