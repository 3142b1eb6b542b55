//! Place-search coordinates to WGS84.
//!
//! The place-search provider reports positions in KATECH (TM128): a
//! Transverse Mercator grid on the Bessel 1841 ellipsoid. Converting to
//! WGS84 takes three steps:
//!
//! 1. inverse Transverse Mercator on Bessel → geodetic lat/lon,
//! 2. geodetic → geocentric, seven-parameter (position vector) Helmert shift,
//! 3. geocentric → geodetic on WGS84.
//!
//! Some result sources already return WGS84 degrees multiplied by 10^7; those
//! are detected by magnitude and only rescaled.
//!
//! Conversion never fails from the caller's point of view: on bad input the
//! point is (0, 0) and [`Conversion::status`] says why. A (0, 0) point must
//! never be read as a real location.

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::model::GeoPoint;
use crate::telemetry::metrics;
use opentelemetry::KeyValue;

/// East values above this magnitude are WGS84 degrees scaled by 10^7.
pub const PRESCALED_THRESHOLD: f64 = 10_000_000.0;
const PRESCALE_FACTOR: f64 = 10_000_000.0;

const ARCSEC_TO_RAD: f64 = std::f64::consts::PI / (180.0 * 3600.0);

// ---------------------------------------------------------------------------
// Input
// ---------------------------------------------------------------------------

/// A coordinate as the provider hands it over: number or numeric string.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RawCoord {
    Number(f64),
    Text(String),
}

impl RawCoord {
    fn parse(&self) -> Result<f64, String> {
        let value = match self {
            RawCoord::Number(n) => *n,
            RawCoord::Text(s) => s
                .trim()
                .parse::<f64>()
                .map_err(|e| format!("'{s}' is not a number: {e}"))?,
        };
        if value.is_finite() {
            Ok(value)
        } else {
            Err(format!("{value} is not finite"))
        }
    }
}

impl From<f64> for RawCoord {
    fn from(value: f64) -> Self {
        RawCoord::Number(value)
    }
}

impl From<i64> for RawCoord {
    fn from(value: i64) -> Self {
        RawCoord::Number(value as f64)
    }
}

impl From<&str> for RawCoord {
    fn from(value: &str) -> Self {
        RawCoord::Text(value.to_string())
    }
}

impl From<String> for RawCoord {
    fn from(value: String) -> Self {
        RawCoord::Text(value)
    }
}

// ---------------------------------------------------------------------------
// Output
// ---------------------------------------------------------------------------

/// How a point was obtained.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "path", content = "reason", rename_all = "snake_case")]
pub enum ConversionStatus {
    /// Full TM128 → WGS84 projection and datum shift.
    Projected,
    /// Input was already scaled WGS84; divided by 10^7.
    PreScaled,
    /// Input could not be converted; the point is (0, 0).
    Failed(String),
}

impl ConversionStatus {
    fn label(&self) -> &'static str {
        match self {
            ConversionStatus::Projected => "projected",
            ConversionStatus::PreScaled => "prescaled",
            ConversionStatus::Failed(_) => "failed",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Conversion {
    pub point: GeoPoint,
    pub status: ConversionStatus,
}

impl Conversion {
    pub fn is_ok(&self) -> bool {
        !matches!(self.status, ConversionStatus::Failed(_))
    }

    /// The point, or `None` if conversion failed.
    pub fn ok(&self) -> Option<GeoPoint> {
        self.is_ok().then_some(self.point)
    }
}

// ---------------------------------------------------------------------------
// Geodesy
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy)]
struct Ellipsoid {
    /// Semi-major axis in metres.
    a: f64,
    /// Inverse flattening.
    rf: f64,
}

impl Ellipsoid {
    fn es(&self) -> f64 {
        let f = 1.0 / self.rf;
        2.0 * f - f * f
    }
}

const BESSEL_1841: Ellipsoid = Ellipsoid {
    a: 6_377_397.155,
    rf: 299.152_812_8,
};

const WGS84: Ellipsoid = Ellipsoid {
    a: 6_378_137.0,
    rf: 298.257_223_563,
};

/// Transverse Mercator grid parameters.
#[derive(Debug, Clone, Copy)]
struct TransverseMercator {
    lat0: f64,
    lon0: f64,
    k0: f64,
    false_easting: f64,
    false_northing: f64,
}

const TM128: TransverseMercator = TransverseMercator {
    lat0: 38.0,
    lon0: 128.0,
    k0: 0.9999,
    false_easting: 400_000.0,
    false_northing: 600_000.0,
};

/// Seven-parameter shift to WGS84: translation (m), rotation (arc-seconds), scale (ppm).
#[derive(Debug, Clone, Copy)]
struct Helmert {
    dx: f64,
    dy: f64,
    dz: f64,
    rx: f64,
    ry: f64,
    rz: f64,
    ppm: f64,
}

const KATECH_TO_WGS84: Helmert = Helmert {
    dx: -115.80,
    dy: 474.99,
    dz: 674.11,
    rx: 1.16,
    ry: -2.31,
    rz: -1.63,
    ppm: 6.43,
};

/// Meridian arc length from the equator to `phi`.
fn meridian_arc(ell: &Ellipsoid, phi: f64) -> f64 {
    let e2 = ell.es();
    let e4 = e2 * e2;
    let e6 = e4 * e2;
    ell.a
        * ((1.0 - e2 / 4.0 - 3.0 * e4 / 64.0 - 5.0 * e6 / 256.0) * phi
            - (3.0 * e2 / 8.0 + 3.0 * e4 / 32.0 + 45.0 * e6 / 1024.0) * (2.0 * phi).sin()
            + (15.0 * e4 / 256.0 + 45.0 * e6 / 1024.0) * (4.0 * phi).sin()
            - (35.0 * e6 / 3072.0) * (6.0 * phi).sin())
}

/// Grid easting/northing to geodetic (lat, lon) in radians.
fn tm_inverse(ell: &Ellipsoid, tm: &TransverseMercator, easting: f64, northing: f64) -> (f64, f64) {
    let e2 = ell.es();
    let e4 = e2 * e2;
    let e6 = e4 * e2;
    let ep2 = e2 / (1.0 - e2);
    let lat0 = tm.lat0.to_radians();
    let lon0 = tm.lon0.to_radians();

    let m = meridian_arc(ell, lat0) + (northing - tm.false_northing) / tm.k0;
    let mu = m / (ell.a * (1.0 - e2 / 4.0 - 3.0 * e4 / 64.0 - 5.0 * e6 / 256.0));
    let e1 = (1.0 - (1.0 - e2).sqrt()) / (1.0 + (1.0 - e2).sqrt());

    // Footpoint latitude.
    let phi1 = mu
        + (3.0 * e1 / 2.0 - 27.0 * e1.powi(3) / 32.0) * (2.0 * mu).sin()
        + (21.0 * e1.powi(2) / 16.0 - 55.0 * e1.powi(4) / 32.0) * (4.0 * mu).sin()
        + (151.0 * e1.powi(3) / 96.0) * (6.0 * mu).sin()
        + (1097.0 * e1.powi(4) / 512.0) * (8.0 * mu).sin();

    let (sin1, cos1) = phi1.sin_cos();
    let tan1 = sin1 / cos1;
    let c1 = ep2 * cos1 * cos1;
    let t1 = tan1 * tan1;
    let w = 1.0 - e2 * sin1 * sin1;
    let n1 = ell.a / w.sqrt();
    let r1 = ell.a * (1.0 - e2) / w.powf(1.5);
    let d = (easting - tm.false_easting) / (n1 * tm.k0);

    let lat = phi1
        - (n1 * tan1 / r1)
            * (d.powi(2) / 2.0
                - (5.0 + 3.0 * t1 + 10.0 * c1 - 4.0 * c1 * c1 - 9.0 * ep2) * d.powi(4) / 24.0
                + (61.0 + 90.0 * t1 + 298.0 * c1 + 45.0 * t1 * t1 - 252.0 * ep2 - 3.0 * c1 * c1)
                    * d.powi(6)
                    / 720.0);
    let lon = lon0
        + (d - (1.0 + 2.0 * t1 + c1) * d.powi(3) / 6.0
            + (5.0 - 2.0 * c1 + 28.0 * t1 - 3.0 * c1 * c1 + 8.0 * ep2 + 24.0 * t1 * t1)
                * d.powi(5)
                / 120.0)
            / cos1;

    (lat, lon)
}

fn geodetic_to_geocentric(ell: &Ellipsoid, lat: f64, lon: f64) -> [f64; 3] {
    let e2 = ell.es();
    let (sin_lat, cos_lat) = lat.sin_cos();
    let n = ell.a / (1.0 - e2 * sin_lat * sin_lat).sqrt();
    [
        n * cos_lat * lon.cos(),
        n * cos_lat * lon.sin(),
        n * (1.0 - e2) * sin_lat,
    ]
}

fn geocentric_to_geodetic(ell: &Ellipsoid, xyz: [f64; 3]) -> (f64, f64) {
    let [x, y, z] = xyz;
    let e2 = ell.es();
    let p = (x * x + y * y).sqrt();
    let lon = y.atan2(x);
    let mut lat = z.atan2(p * (1.0 - e2));
    for _ in 0..10 {
        let sin_lat = lat.sin();
        let n = ell.a / (1.0 - e2 * sin_lat * sin_lat).sqrt();
        let h = p / lat.cos() - n;
        let next = z.atan2(p * (1.0 - e2 * n / (n + h)));
        if (next - lat).abs() < 1e-14 {
            lat = next;
            break;
        }
        lat = next;
    }
    (lat, lon)
}

fn helmert(params: &Helmert, xyz: [f64; 3]) -> [f64; 3] {
    let [x, y, z] = xyz;
    let rx = params.rx * ARCSEC_TO_RAD;
    let ry = params.ry * ARCSEC_TO_RAD;
    let rz = params.rz * ARCSEC_TO_RAD;
    let m = 1.0 + params.ppm / 1_000_000.0;
    [
        m * (x - rz * y + ry * z) + params.dx,
        m * (rz * x + y - rx * z) + params.dy,
        m * (-ry * x + rx * y + z) + params.dz,
    ]
}

fn project_katech(east: f64, north: f64) -> GeoPoint {
    let (lat, lon) = tm_inverse(&BESSEL_1841, &TM128, east, north);
    let shifted = helmert(
        &KATECH_TO_WGS84,
        geodetic_to_geocentric(&BESSEL_1841, lat, lon),
    );
    let (lat, lon) = geocentric_to_geodetic(&WGS84, shifted);
    GeoPoint::new(lat.to_degrees(), lon.to_degrees())
}

// ---------------------------------------------------------------------------
// Public entry point
// ---------------------------------------------------------------------------

/// Convert a provider (east, north) pair to WGS84.
pub fn convert_katech(east: impl Into<RawCoord>, north: impl Into<RawCoord>) -> Conversion {
    let conversion = convert_inner(&east.into(), &north.into());
    metrics::geo_conversions().add(1, &[KeyValue::new("path", conversion.status.label())]);
    conversion
}

fn convert_inner(east: &RawCoord, north: &RawCoord) -> Conversion {
    let parsed = east.parse().and_then(|x| north.parse().map(|y| (x, y)));
    let (x, y) = match parsed {
        Ok(pair) => pair,
        Err(reason) => return failed(reason),
    };

    if x.abs() > PRESCALED_THRESHOLD {
        debug!(x, y, "coordinate pair is pre-scaled WGS84");
        return Conversion {
            point: GeoPoint::new(y / PRESCALE_FACTOR, x / PRESCALE_FACTOR),
            status: ConversionStatus::PreScaled,
        };
    }

    let point = project_katech(x, y);
    if !(point.latitude.is_finite() && point.longitude.is_finite()) {
        return failed(format!("projection of ({x}, {y}) produced a non-finite point"));
    }
    Conversion {
        point,
        status: ConversionStatus::Projected,
    }
}

fn failed(reason: String) -> Conversion {
    warn!(%reason, "coordinate conversion failed, falling back to (0, 0)");
    Conversion {
        point: GeoPoint::ORIGIN,
        status: ConversionStatus::Failed(reason),
    }
}
