//! Lambert Conformal Conic projection.
//!
//! This projection is used by the HRRR grid. It maps a cone tangent or
//! secant to a spherical Earth onto a flat plane.
//!
//! The projection parameters include:
//! - Central meridian (lon0): the longitude mapped to x = 0
//! - Reference latitude (lat0): the latitude mapped to y = 0
//! - Standard parallel(s): latin1 and latin2 (equal for a tangent cone)
//! - Sphere radius in meters
//!
//! Projected coordinates are meters from the (lat0, lon0) origin with no
//! false easting or northing, matching the `projection_x_coordinate` /
//! `projection_y_coordinate` axes of the HRRR Zarr archive.

use std::f64::consts::PI;

/// Radius of the spherical globe used by HRRR (meters).
pub const HRRR_EARTH_RADIUS: f64 = 6_371_229.0;

/// Lambert Conformal Conic projection parameters.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LambertConformal {
    /// Central meridian in radians
    pub lon0: f64,
    /// Reference latitude in radians
    pub lat0: f64,
    /// First standard parallel in radians
    pub latin1: f64,
    /// Second standard parallel in radians
    pub latin2: f64,
    /// Sphere radius (meters)
    pub earth_radius: f64,
    /// Cone constant (n)
    n: f64,
    /// F constant
    f: f64,
    /// Rho at the reference latitude
    rho0: f64,
}

impl LambertConformal {
    /// Create a new Lambert Conformal projection.
    ///
    /// # Arguments
    /// * `central_lon_deg` - Central meridian (degrees, 0..360 or -180..180)
    /// * `central_lat_deg` - Reference latitude of the origin (degrees)
    /// * `latin1_deg` - First standard parallel (degrees)
    /// * `latin2_deg` - Second standard parallel (degrees)
    /// * `earth_radius` - Sphere radius (meters)
    pub fn new(
        central_lon_deg: f64,
        central_lat_deg: f64,
        latin1_deg: f64,
        latin2_deg: f64,
        earth_radius: f64,
    ) -> Self {
        let to_rad = PI / 180.0;

        let lon0 = normalize_lon(central_lon_deg * to_rad);
        let lat0 = central_lat_deg * to_rad;
        let latin1 = latin1_deg * to_rad;
        let latin2 = latin2_deg * to_rad;

        // Compute cone constant n
        let n = if (latin1 - latin2).abs() < 1e-10 {
            // Tangent cone (single standard parallel)
            latin1.sin()
        } else {
            // Secant cone (two standard parallels)
            let ln_ratio = (latin1.cos() / latin2.cos()).ln();
            let tan_ratio =
                ((PI / 4.0 + latin2 / 2.0).tan() / (PI / 4.0 + latin1 / 2.0).tan()).ln();
            ln_ratio / tan_ratio
        };

        let f = (latin1.cos() * (PI / 4.0 + latin1 / 2.0).tan().powf(n)) / n;
        let rho0 = earth_radius * f / (PI / 4.0 + lat0 / 2.0).tan().powf(n);

        Self {
            lon0,
            lat0,
            latin1,
            latin2,
            earth_radius,
            n,
            f,
            rho0,
        }
    }

    /// Create the HRRR native projection.
    ///
    /// HRRR uses Lambert Conformal with:
    /// - Central meridian: 262.5°E (= -97.5°W)
    /// - Reference latitude: 38.5°N
    /// - Standard parallels: 38.5°N (both)
    /// - Spherical globe, radius 6,371,229 m
    pub fn hrrr() -> Self {
        Self::new(262.5, 38.5, 38.5, 38.5, HRRR_EARTH_RADIUS)
    }

    /// Project geographic coordinates (degrees) to planar (x, y) in meters.
    ///
    /// The south pole (for a northern cone) has no finite image; callers
    /// should check the result with `f64::is_finite`.
    pub fn project(&self, lat_deg: f64, lon_deg: f64) -> (f64, f64) {
        let to_rad = PI / 180.0;
        let lat = lat_deg * to_rad;
        let dlon = normalize_lon(lon_deg * to_rad - self.lon0);

        let rho = self.earth_radius * self.f / (PI / 4.0 + lat / 2.0).tan().powf(self.n);
        let theta = self.n * dlon;

        let x = rho * theta.sin();
        let y = self.rho0 - rho * theta.cos();

        (x, y)
    }

    /// Convert planar (x, y) in meters back to geographic (lat, lon) in degrees.
    ///
    /// Longitude is returned in [-180, 180).
    pub fn unproject(&self, x: f64, y: f64) -> (f64, f64) {
        let to_deg = 180.0 / PI;

        let dy = self.rho0 - y;
        let mut rho = (x * x + dy * dy).sqrt();
        let theta = if self.n < 0.0 {
            rho = -rho;
            (-x).atan2(-dy)
        } else {
            x.atan2(dy)
        };

        let lat = 2.0 * ((self.earth_radius * self.f / rho).powf(1.0 / self.n)).atan() - PI / 2.0;
        let lon = normalize_lon(self.lon0 + theta / self.n);

        (lat * to_deg, lon * to_deg)
    }

    /// Cone constant of the projection.
    pub fn cone_constant(&self) -> f64 {
        self.n
    }
}

/// Normalize a longitude in radians to [-π, π).
fn normalize_lon(mut lon: f64) -> f64 {
    while lon >= PI {
        lon -= 2.0 * PI;
    }
    while lon < -PI {
        lon += 2.0 * PI;
    }
    lon
}
