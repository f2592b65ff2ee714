//! Geographic coordinate type and the projection seam.
//!
//! The pipeline never does geodesy itself.  Importers receive a
//! [`Projection`] from the host (typically the engine's geo-referencing
//! system) and call it once per node.  Closures implement the trait, so a
//! host can pass `|g: GeoPoint| host.to_local(g)` directly.
//!
//! [`LocalProjection`] is a small equirectangular adapter about an origin,
//! intended for tests, tooling, and hosts without a georeferencing system.
//! It is accurate to well under 0.1 % across a city-sized tile.

use glam::DVec2;

/// Mean Earth radius, metres.
const EARTH_RADIUS_M: f64 = 6_371_000.0;

/// A WGS-84 geographic coordinate.
///
/// Double precision: imported coordinates feed exact endpoint equality checks
/// downstream, so the lat/lon must survive the projection without rounding
/// to `f32`.
#[derive(Copy, Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct GeoPoint {
    pub lat: f64,
    pub lon: f64,
}

impl GeoPoint {
    #[inline]
    pub fn new(lat: f64, lon: f64) -> Self {
        Self { lat, lon }
    }

    /// Haversine great-circle distance in metres.
    pub fn distance_m(self, other: GeoPoint) -> f64 {
        let d_lat = (other.lat - self.lat).to_radians();
        let d_lon = (other.lon - self.lon).to_radians();

        let lat1 = self.lat.to_radians();
        let lat2 = other.lat.to_radians();

        let a = (d_lat * 0.5).sin().powi(2)
            + lat1.cos() * lat2.cos() * (d_lon * 0.5).sin().powi(2);

        let c = 2.0 * a.sqrt().atan2((1.0 - a).sqrt());
        EARTH_RADIUS_M * c
    }
}

impl std::fmt::Display for GeoPoint {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "({:.7}, {:.7})", self.lat, self.lon)
    }
}

// ── GeoBounds ─────────────────────────────────────────────────────────────────

/// Axis-aligned lat/lon bounding box.
#[derive(Copy, Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct GeoBounds {
    pub min: GeoPoint,
    pub max: GeoPoint,
}

impl GeoBounds {
    pub fn new(min: GeoPoint, max: GeoPoint) -> Self {
        Self { min, max }
    }

    /// Smallest box containing every point, or `None` for an empty input.
    pub fn from_points<I: IntoIterator<Item = GeoPoint>>(points: I) -> Option<Self> {
        let mut iter = points.into_iter();
        let first = iter.next()?;
        let mut b = GeoBounds::new(first, first);
        for p in iter {
            b.extend(p);
        }
        Some(b)
    }

    pub fn extend(&mut self, p: GeoPoint) {
        self.min.lat = self.min.lat.min(p.lat);
        self.min.lon = self.min.lon.min(p.lon);
        self.max.lat = self.max.lat.max(p.lat);
        self.max.lon = self.max.lon.max(p.lon);
    }

    pub fn center(&self) -> GeoPoint {
        GeoPoint::new(
            (self.min.lat + self.max.lat) * 0.5,
            (self.min.lon + self.max.lon) * 0.5,
        )
    }
}

// ── Projection ────────────────────────────────────────────────────────────────

/// Geographic → local planar conversion supplied by the host.
///
/// Output is in metres with `x` east and `y` north of the host's origin.
pub trait Projection {
    fn project(&self, geo: GeoPoint) -> DVec2;
}

impl<F> Projection for F
where
    F: Fn(GeoPoint) -> DVec2,
{
    #[inline]
    fn project(&self, geo: GeoPoint) -> DVec2 {
        self(geo)
    }
}

/// Equirectangular projection about `origin`, scaled to metres.
#[derive(Copy, Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct LocalProjection {
    pub origin: GeoPoint,
    /// Metres per degree of longitude at the origin latitude.
    m_per_deg_lon: f64,
    /// Metres per degree of latitude.
    m_per_deg_lat: f64,
}

impl LocalProjection {
    pub fn new(origin: GeoPoint) -> Self {
        let m_per_deg_lat = EARTH_RADIUS_M.to_radians();
        Self {
            origin,
            m_per_deg_lon: m_per_deg_lat * origin.lat.to_radians().cos(),
            m_per_deg_lat,
        }
    }

    /// Centre the projection on `bounds` so distortion is spread evenly over
    /// the whole tile.
    pub fn centered_on(bounds: &GeoBounds) -> Self {
        Self::new(bounds.center())
    }

    /// Inverse mapping, for tooling that needs to report lat/lon back.
    pub fn unproject(&self, local: DVec2) -> GeoPoint {
        GeoPoint::new(
            self.origin.lat + local.y / self.m_per_deg_lat,
            self.origin.lon + local.x / self.m_per_deg_lon,
        )
    }
}

impl Projection for LocalProjection {
    fn project(&self, geo: GeoPoint) -> DVec2 {
        DVec2::new(
            (geo.lon - self.origin.lon) * self.m_per_deg_lon,
            (geo.lat - self.origin.lat) * self.m_per_deg_lat,
        )
    }
}
