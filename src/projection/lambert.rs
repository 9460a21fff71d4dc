//! Forward Lambert Conformal Conic transform for the dataset's native grid.
//!
//! The grid geometry of the JMA MSM/LANAL products is defined on a Lambert
//! Conformal Conic projection with fixed parameters. This module converts a
//! geographic (latitude, longitude) pair into planar displacement (meters)
//! relative to the projection's reference grid cell. The authoritative
//! point-to-cell lookup happens in [`crate::GridSelector`]; the projection is
//! used for diagnostics and sanity reporting.

use crate::projection::error::ProjectionError;

/// Mean Earth radius in meters, matching the spherical form of the transform.
const EARTH_RADIUS_M: f64 = 6_371_000.0;

/// Tolerance for treating the two standard parallels as equal or anti-symmetric.
const PARALLEL_EPS: f64 = 1e-10;

/// Latitudes closer to a pole than this are rejected as singular.
const POLE_EPS: f64 = 1e-9;

/// Fixed parameters of a Lambert Conformal Conic grid definition.
///
/// These are constants of the dataset for its whole lifetime; they are never
/// derived from the data itself.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ProjectionParameters {
    /// First standard parallel, degrees north.
    pub standard_parallel_1: f64,
    /// Second standard parallel, degrees north.
    pub standard_parallel_2: f64,
    /// Central meridian, degrees east.
    pub central_meridian: f64,
    /// Latitude of the reference point, degrees north.
    pub reference_latitude: f64,
    /// Longitude of the reference point, degrees east.
    pub reference_longitude: f64,
    /// Grid row (Y index, counted from the northern edge) of the reference point, 0-based.
    pub reference_row: usize,
    /// Grid column (X index, counted from the western edge) of the reference point, 0-based.
    pub reference_col: usize,
    /// Planar grid spacing in meters.
    pub grid_spacing_m: f64,
}

impl ProjectionParameters {
    /// The JMA MSM grid definition: standard parallels 30°N and 60°N, central
    /// meridian 140°E, reference point 30°N 140°E at grid cell [360, 448]
    /// (0-based), 5 km spacing.
    pub fn msm() -> Self {
        Self {
            standard_parallel_1: 30.0,
            standard_parallel_2: 60.0,
            central_meridian: 140.0,
            reference_latitude: 30.0,
            reference_longitude: 140.0,
            reference_row: 360,
            reference_col: 448,
            grid_spacing_m: 5000.0,
        }
    }
}

/// Stateless forward Lambert Conformal Conic transform.
///
/// Constructed once per dataset from its [`ProjectionParameters`]; the cone
/// constant `n`, scale factor `F` and the reference-point offsets are
/// precomputed so [`LambertProjection::project`] is a pure closed-form
/// evaluation.
#[derive(Debug, Clone)]
pub struct LambertProjection {
    params: ProjectionParameters,
    cone_constant: f64,
    scale_factor: f64,
    // Reference-point planar offsets, subtracted so output is relative displacement.
    ref_x: f64,
    ref_y: f64,
}

impl LambertProjection {
    /// Builds the transform, precomputing the cone constant and scale factor.
    ///
    /// The cone constant uses the closed form `sin(sp1)` when the standard
    /// parallels are equal or anti-symmetric within a small epsilon, and the
    /// two-parallel logarithmic formula otherwise.
    ///
    /// # Errors
    ///
    /// Returns [`ProjectionError::DegenerateCone`] when the resulting cone
    /// constant is (near) zero, e.g. for equatorial standard parallels, and
    /// [`ProjectionError::PoleLatitude`] when the reference latitude itself is
    /// at a pole.
    pub fn new(params: ProjectionParameters) -> Result<Self, ProjectionError> {
        let sp1 = params.standard_parallel_1.to_radians();
        let sp2 = params.standard_parallel_2.to_radians();

        let parallels_coincide =
            (params.standard_parallel_1 - params.standard_parallel_2).abs() < PARALLEL_EPS
                || (params.standard_parallel_1 + params.standard_parallel_2).abs() < PARALLEL_EPS;

        let n = if parallels_coincide {
            sp1.sin()
        } else {
            (sp1.cos().ln() - sp2.cos().ln())
                / ((std::f64::consts::FRAC_PI_4 + sp2 / 2.0).tan().ln()
                    - (std::f64::consts::FRAC_PI_4 + sp1 / 2.0).tan().ln())
        };

        if n.abs() < 1e-12 || !n.is_finite() {
            return Err(ProjectionError::DegenerateCone {
                sp1: params.standard_parallel_1,
                sp2: params.standard_parallel_2,
                n,
            });
        }

        let f = sp1.cos() * (std::f64::consts::FRAC_PI_4 + sp1 / 2.0).tan().powf(n) / n;

        let mut projection = Self {
            params,
            cone_constant: n,
            scale_factor: f,
            ref_x: 0.0,
            ref_y: 0.0,
        };

        let (rho_ref, theta_ref) =
            projection.polar(params.reference_latitude, params.reference_longitude)?;
        projection.ref_x = rho_ref * theta_ref.sin();
        projection.ref_y = rho_ref * theta_ref.cos();

        Ok(projection)
    }

    /// The precomputed cone constant `n`.
    pub fn cone_constant(&self) -> f64 {
        self.cone_constant
    }

    /// The parameters this transform was built from.
    pub fn parameters(&self) -> &ProjectionParameters {
        &self.params
    }

    /// Polar coordinates (rho, theta) of a geographic point on the cone.
    fn polar(&self, lat: f64, lon: f64) -> Result<(f64, f64), ProjectionError> {
        if lat.abs() >= 90.0 - POLE_EPS {
            return Err(ProjectionError::PoleLatitude(lat));
        }
        let lat_rad = lat.to_radians();
        let rho = EARTH_RADIUS_M * self.scale_factor
            / (std::f64::consts::FRAC_PI_4 + lat_rad / 2.0)
                .tan()
                .powf(self.cone_constant);
        let theta = self.cone_constant * (lon - self.params.central_meridian).to_radians();
        Ok((rho, theta))
    }

    /// Converts a geographic coordinate to planar (x, y) meters relative to
    /// the reference point. X grows eastward, Y grows northward.
    ///
    /// The output is displacement within this dataset's framing, not an
    /// absolute projected coordinate.
    ///
    /// # Errors
    ///
    /// Returns [`ProjectionError::PoleLatitude`] for latitudes at or beyond a
    /// pole, where the transform is singular.
    pub fn project(&self, lat: f64, lon: f64) -> Result<(f64, f64), ProjectionError> {
        let (rho, theta) = self.polar(lat, lon)?;
        let x = rho * theta.sin() - self.ref_x;
        let y = self.ref_y - rho * theta.cos();
        Ok((x, y))
    }

    /// Fractional grid (row, col) coordinates of a geographic point, derived
    /// from the planar displacement and grid spacing.
    ///
    /// The row axis runs north to south, so a northward displacement lowers
    /// the row coordinate. Diagnostic only; cell selection goes through the
    /// spatial index, which uses the stored per-cell coordinates.
    pub fn grid_offset(&self, lat: f64, lon: f64) -> Result<(f64, f64), ProjectionError> {
        let (x, y) = self.project(lat, lon)?;
        let row = self.params.reference_row as f64 - y / self.params.grid_spacing_m;
        let col = self.params.reference_col as f64 + x / self.params.grid_spacing_m;
        Ok((row, col))
    }
}
