//! OSM tag interpretation: road classes, widths, layers and elevation.

use rb_core::BuildConfig;
use tracing::warn;

use crate::model::{RoadClass, Sidewalks, Tags};

/// `(lanes, lane width, shoulder width)` defaults for a `highway` value, or
/// `None` when the workspace default applies.
///
/// Lane counts are for both directions together.
fn class_defaults(highway: &str) -> Option<(u32, f64, f64)> {
    match highway {
        "motorway"                           => Some((4, 3.75, 2.5)),
        "trunk"                              => Some((4, 3.5, 1.5)),
        "primary"                            => Some((2, 3.5, 1.0)),
        "secondary"                          => Some((2, 3.25, 0.5)),
        "tertiary"                           => Some((2, 3.0, 0.5)),
        "motorway_link" | "trunk_link"       => Some((1, 3.75, 1.0)),
        "primary_link" | "secondary_link"
        | "tertiary_link"                    => Some((1, 3.5, 0.5)),
        "residential" | "unclassified"
        | "living_street"                    => Some((2, 3.0, 0.0)),
        "service"                            => Some((1, 3.0, 0.0)),
        "footway" | "path" | "cycleway"
        | "pedestrian" | "steps" | "track"   => Some((1, 2.0, 0.0)),
        _                                    => None,
    }
}

/// Highways the road builder treats as drivable trunk roads when
/// `drivable_only` is set.
pub fn is_drivable(highway: &str) -> bool {
    let base = highway.strip_suffix("_link").unwrap_or(highway);
    matches!(base, "motorway" | "trunk" | "primary" | "secondary" | "tertiary")
}

/// Road class for a way: `highway` defaults, then `lanes` / `width` /
/// `surface` / `oneway` / `sidewalk` overrides.  Lane counts above
/// `config.max_lanes` are capped.
pub fn road_class(tags: &Tags, config: &BuildConfig) -> RoadClass {
    let highway = tags.get("highway").map(String::as_str);
    let (mut lanes, lane_width, shoulder) = highway
        .and_then(class_defaults)
        .unwrap_or((config.default_lanes, config.default_lane_width, 0.0));

    if let Some(n) = tags.get("lanes").and_then(|v| parse_lanes(v)) {
        lanes = n;
    }
    if lanes > config.max_lanes {
        warn!(lanes, max = config.max_lanes, "lane count capped");
        lanes = config.max_lanes;
    }

    RoadClass {
        lane_width,
        lanes,
        shoulder_width: shoulder,
        oneway: oneway(tags),
        sidewalks: sidewalks(tags, config),
        surface: tags.get("surface").cloned(),
        width_override: tags.get("width").and_then(|v| parse_length(v)),
    }
}

/// `oneway=yes|true|1|-1`, or implied by motorways and roundabouts.
pub fn oneway(tags: &Tags) -> bool {
    match tags.get("oneway").map(|v| v.trim()) {
        Some("yes" | "true" | "1" | "-1" | "reversible") => true,
        Some("no" | "false" | "0") => false,
        _ => {
            matches!(tags.get("highway").map(String::as_str), Some("motorway" | "motorway_link"))
                || tags.get("junction").is_some_and(|j| j == "roundabout" || j == "circular")
        }
    }
}

/// Sidewalks from `sidewalk=both|left|right` and the `sidewalk:<side>`
/// forms.  `separate` means the sidewalk is its own way, so none is built
/// here.
pub fn sidewalks(tags: &Tags, config: &BuildConfig) -> Sidewalks {
    let yes = |k: &str| tags.get(k).is_some_and(|v| v == "yes");
    let (mut left, mut right) = match tags.get("sidewalk").map(|v| v.trim()) {
        Some("both") => (true, true),
        Some("left") => (true, false),
        Some("right") => (false, true),
        _ => (false, false),
    };
    left |= yes("sidewalk:left") || yes("sidewalk:both");
    right |= yes("sidewalk:right") || yes("sidewalk:both");

    let width = tags
        .get("sidewalk:width")
        .and_then(|v| parse_length(v))
        .filter(|w| *w > 0.0)
        .unwrap_or(config.sidewalk_width);
    Sidewalks {
        left: if left { width } else { 0.0 },
        right: if right { width } else { 0.0 },
        curb_height: config.curb_height,
    }
}

/// OSM `layer`, 0 when absent or unparseable.
pub fn layer(tags: &Tags) -> i32 {
    tags.get("layer").and_then(|v| v.trim().parse().ok()).unwrap_or(0)
}

/// OSM `ele` in metres.
pub fn elevation(tags: &Tags) -> Option<f64> {
    tags.get("ele").and_then(|v| parse_length(v))
}

/// `"2"` or `"2;3"` (first value wins).  Zero is rejected.
fn parse_lanes(v: &str) -> Option<u32> {
    v.split(';').next()?.trim().parse().ok().filter(|&n| n > 0)
}

/// Metric length with an optional ` m` suffix; a decimal comma is accepted.
pub fn parse_length(v: &str) -> Option<f64> {
    let v = v.trim();
    let v = v.strip_suffix('m').unwrap_or(v).trim_end();
    v.replace(',', ".").parse().ok().filter(|x: &f64| x.is_finite())
}
