//! The main entry point: point extraction against a loaded gridded dataset.
//!
//! A [`PointExtractor`] owns the dataset, the spatial index built over its
//! cells, the variable mapping and the grid's Lambert projection. It is
//! constructed once per loaded dataset and is read-only afterwards, so it can
//! be shared behind `&self` across concurrent requests. Extraction calls are
//! synchronous and run to completion; there is no internal I/O.

use crate::error::ExtractError;
use crate::extraction::table::{RowKey, RowSet};
use crate::extraction::time::{time_indices, TimeSelection};
use crate::extraction::units::convert_units;
use crate::grid::dataset::{GridDataset, GridField};
use crate::grid::selector::{GridIndexSet, GridSelector, SpatialMethod};
use crate::projection::lambert::{LambertProjection, ProjectionParameters};
use crate::variables::mapping::VariableMapping;
use crate::variables::variable::{GridKind, Variable};
use bon::bon;
use log::{debug, warn};
use polars::prelude::DataFrame;
use std::collections::HashSet;

/// A geographical coordinate: latitude first, longitude second, both in
/// decimal degrees.
///
/// # Examples
///
/// ```
/// use lanal_extract::LatLon;
///
/// let tokyo = LatLon(35.6762, 139.6503);
/// assert_eq!(tokyo.0, 35.6762); // Latitude
/// ```
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LatLon(pub f64, pub f64);

/// A variable that could not be resolved to a physical field and was skipped.
///
/// Skips are per variable (and per level for isobaric extraction); they never
/// abort the rest of the call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SkippedVariable {
    pub variable: Variable,
    /// Pressure level (hPa) for isobaric extraction, `None` for surface.
    pub level: Option<u32>,
}

/// The availability of one (variable, level) pair, from
/// [`PointExtractor::check_variables`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VariableCheck {
    pub variable: Variable,
    pub level: Option<u32>,
    /// The resolved physical field name, or `None` when the dataset has no
    /// matching field.
    pub resolved: Option<String>,
}

/// The result of one extraction call.
#[derive(Debug)]
pub struct Extraction {
    /// One row per (time, level), time-ordered, with metadata columns
    /// (`time`, `lat`, `lon`, `level_hPa` for isobaric, `method`, `n_points`)
    /// followed by one value column per requested quantity. Timestamps are
    /// UTC; presentation timezones are a serialization concern.
    pub table: DataFrame,
    /// The grid cells that contributed, for auditability.
    pub grid_points: GridIndexSet,
    /// Variables (per level) that could not be resolved and were omitted.
    pub skipped: Vec<SkippedVariable>,
}

/// Extracts point values from a gridded forecast dataset.
///
/// # Examples
///
/// ```
/// use chrono::{TimeZone, Utc};
/// use lanal_extract::{GridDataset, GridField, LatLon, PointExtractor, Variable};
/// use ndarray::{Array2, Array3};
///
/// # fn main() -> Result<(), Box<dyn std::error::Error>> {
/// let lat = Array2::from_shape_fn((3, 3), |(y, _)| 34.9 + y as f64 * 0.05);
/// let lon = Array2::from_shape_fn((3, 3), |(_, x)| 138.9 + x as f64 * 0.0625);
/// let times = vec![Utc.with_ymd_and_hms(2024, 7, 3, 12, 0, 0).unwrap()];
/// let mut dataset = GridDataset::new(lat, lon, times)?;
/// dataset.insert_field(
///     "TMP_1D5maboveground",
///     GridField::timed(Array3::from_elem((1, 3, 3), 300.15), Some("K")),
/// )?;
///
/// let extractor = PointExtractor::new(dataset)?;
/// let result = extractor
///     .extract_surface()
///     .location(LatLon(35.0, 139.0))
///     .variables(vec![Variable::AirTemperature])
///     .call()?;
///
/// assert_eq!(result.table.height(), 1);
/// let temp = result.table.column("tas_C")?.f64()?.get(0).unwrap();
/// assert!((temp - 27.0).abs() < 1e-9);
/// # Ok(())
/// # }
/// ```
pub struct PointExtractor {
    dataset: GridDataset,
    selector: GridSelector,
    mapping: VariableMapping,
    projection: LambertProjection,
}

#[bon]
impl PointExtractor {
    /// Creates an extractor with the built-in variable mapping and the MSM
    /// grid's projection parameters.
    ///
    /// # Errors
    ///
    /// Returns [`ExtractError::Projection`] if the projection parameters are
    /// degenerate (they are not, for the built-in constants).
    pub fn new(dataset: GridDataset) -> Result<Self, ExtractError> {
        Self::with_mapping(dataset, VariableMapping::default())
    }

    /// Creates an extractor with a caller-supplied variable mapping, e.g. one
    /// deserialized from a configuration file by the surrounding service.
    pub fn with_mapping(
        dataset: GridDataset,
        mapping: VariableMapping,
    ) -> Result<Self, ExtractError> {
        Self::with_projection(dataset, mapping, ProjectionParameters::msm())
    }

    /// Full-control constructor for datasets on a different Lambert framing.
    pub fn with_projection(
        dataset: GridDataset,
        mapping: VariableMapping,
        parameters: ProjectionParameters,
    ) -> Result<Self, ExtractError> {
        let selector = GridSelector::new(&dataset);
        let projection = LambertProjection::new(parameters)?;
        Ok(Self {
            dataset,
            selector,
            mapping,
            projection,
        })
    }

    /// The loaded dataset this extractor serves.
    pub fn dataset(&self) -> &GridDataset {
        &self.dataset
    }

    /// The spatial index over the dataset's grid cells.
    pub fn selector(&self) -> &GridSelector {
        &self.selector
    }

    /// The grid's Lambert Conformal Conic transform.
    pub fn projection(&self) -> &LambertProjection {
        &self.projection
    }

    /// Extracts surface variables at a query point.
    ///
    /// Builder arguments:
    ///
    /// * `.location(LatLon)`: required, the query point.
    /// * `.variables(Vec<Variable>)`: optional; defaults to temperature,
    ///   humidity, both wind components and surface pressure. Requesting
    ///   [`Variable::WindSpeed`] or [`Variable::WindDirection`] retrieves the
    ///   wind components internally even when they are not listed; the
    ///   component columns only appear in the table when explicitly requested.
    /// * `.time(TimeSelection)`: optional; defaults to the whole time axis.
    /// * `.method(SpatialMethod)`: optional; defaults to
    ///   [`SpatialMethod::Nearest`].
    ///
    /// An empty spatial selection (e.g. a radius excluding every cell) yields
    /// an empty table and an empty grid-point set, not an error. Variables
    /// that resolve to no physical field are skipped, recorded in
    /// [`Extraction::skipped`], and their columns omitted; the rest of the
    /// call proceeds.
    ///
    /// # Errors
    ///
    /// Returns [`ExtractError::Selection`] for invalid aggregation parameters
    /// and [`ExtractError::Polars`] if the result table cannot be assembled.
    #[builder]
    pub fn extract_surface(
        &self,
        location: LatLon,
        variables: Option<Vec<Variable>>,
        time: Option<TimeSelection>,
        method: Option<SpatialMethod>,
    ) -> Result<Extraction, ExtractError> {
        self.run(GridKind::Surface, location, &[None], variables, time, method)
    }

    /// Extracts isobaric variables at a query point, one row per
    /// (time, pressure level).
    ///
    /// Takes the same builder arguments as
    /// [`extract_surface`](Self::extract_surface) plus:
    ///
    /// * `.levels(Vec<u32>)`: required, the pressure levels in hPa.
    ///
    /// The default variable set swaps surface pressure for geopotential
    /// height. A level whose fields are absent is skipped per variable, like
    /// any other resolution miss.
    #[builder]
    pub fn extract_isobaric(
        &self,
        location: LatLon,
        levels: Vec<u32>,
        variables: Option<Vec<Variable>>,
        time: Option<TimeSelection>,
        method: Option<SpatialMethod>,
    ) -> Result<Extraction, ExtractError> {
        let levels: Vec<Option<u32>> = levels.into_iter().map(Some).collect();
        self.run(GridKind::Isobaric, location, &levels, variables, time, method)
    }

    /// The grid cells a query would use, without extracting anything.
    ///
    /// Lets callers audit or display the selection for a given point and
    /// method up front.
    pub fn grid_points(
        &self,
        location: LatLon,
        method: &SpatialMethod,
    ) -> Result<GridIndexSet, ExtractError> {
        Ok(self.selector.select(location.0, location.1, method)?)
    }

    /// Reports, per (variable, level), the physical field name a request
    /// would resolve to, as a dry-run availability probe. Derived wind
    /// quantities are not listed; they resolve through the components.
    pub fn check_variables(
        &self,
        kind: GridKind,
        variables: &[Variable],
        levels: &[u32],
    ) -> Vec<VariableCheck> {
        let levels: Vec<Option<u32>> = match kind {
            GridKind::Surface => vec![None],
            GridKind::Isobaric => levels.iter().copied().map(Some).collect(),
        };
        let mut checks = Vec::new();
        for &level in &levels {
            for &variable in variables.iter().filter(|v| !v.is_derived()) {
                checks.push(VariableCheck {
                    variable,
                    level,
                    resolved: self.mapping.resolve(&self.dataset, variable, kind, level),
                });
            }
        }
        checks
    }

    fn run(
        &self,
        kind: GridKind,
        location: LatLon,
        levels: &[Option<u32>],
        variables: Option<Vec<Variable>>,
        time: Option<TimeSelection>,
        method: Option<SpatialMethod>,
    ) -> Result<Extraction, ExtractError> {
        let LatLon(lat, lon) = location;
        let method = method.unwrap_or(SpatialMethod::Nearest);

        if let Ok((row, col)) = self.projection.grid_offset(lat, lon) {
            debug!("query ({lat}, {lon}) sits near fractional grid cell [{row:.2}, {col:.2}]");
        }

        let grid_points = self.selector.select(lat, lon, &method)?;
        if grid_points.is_empty() {
            warn!("no grid cell selected for ({lat}, {lon}) with {method:?}; returning an empty table");
            return Ok(Extraction {
                table: DataFrame::empty(),
                grid_points,
                skipped: Vec::new(),
            });
        }

        let requested = dedup(variables.unwrap_or_else(|| Variable::defaults(kind)));
        let working = working_set(&requested);

        let mut rows = RowSet::default();
        let mut skipped = Vec::new();
        let mut resolved_any: HashSet<Variable> = HashSet::new();

        for &level in levels {
            for &variable in &working {
                let Some(field_name) =
                    self.mapping.resolve(&self.dataset, variable, kind, level)
                else {
                    match level {
                        Some(hpa) => warn!("no field for {variable} at {hpa} hPa; skipping"),
                        None => warn!("no field for {kind} variable {variable}; skipping"),
                    }
                    skipped.push(SkippedVariable { variable, level });
                    continue;
                };
                let Some(field) = self.dataset.field(&field_name) else {
                    skipped.push(SkippedVariable { variable, level });
                    continue;
                };
                resolved_any.insert(variable);

                let column = variable.column_name(kind);
                if field.has_time_axis() {
                    let indices = time_indices(self.dataset.times(), time.as_ref());
                    let mut values: Vec<f64> = indices
                        .iter()
                        .map(|&t| self.sample(field, t, &grid_points, &method))
                        .collect();
                    convert_units(variable, field.units.as_deref(), &mut values);
                    for (&t, value) in indices.iter().zip(values) {
                        let key = RowKey {
                            time_ms: Some(self.dataset.times()[t].timestamp_millis()),
                            level,
                        };
                        rows.insert(key, column, value);
                    }
                } else {
                    let mut values = vec![self.sample(field, 0, &grid_points, &method)];
                    convert_units(variable, field.units.as_deref(), &mut values);
                    rows.insert(RowKey { time_ms: None, level }, column, values[0]);
                }
            }
        }

        rows.derive_wind();

        let wind_available =
            resolved_any.contains(&Variable::UWind) && resolved_any.contains(&Variable::VWind);
        let value_columns: Vec<&'static str> = requested
            .iter()
            .filter(|v| {
                if v.is_derived() {
                    wind_available
                } else {
                    resolved_any.contains(v)
                }
            })
            .map(|v| v.column_name(kind))
            .collect();

        let table = rows.into_dataframe(
            lat,
            lon,
            method.name(),
            grid_points.len(),
            kind == GridKind::Isobaric,
            &value_columns,
        )?;

        Ok(Extraction {
            table,
            grid_points,
            skipped,
        })
    }

    /// One extracted value for a (field, time step): the nearest cell's value,
    /// or the unweighted mean over the selected cells.
    ///
    /// The mean skips NaN cells (missing data inside the selection) and
    /// weighs every remaining cell equally regardless of distance. It is a
    /// simplification, not an interpolation.
    fn sample(
        &self,
        field: &GridField,
        time_idx: usize,
        grid_points: &GridIndexSet,
        method: &SpatialMethod,
    ) -> f64 {
        match method {
            SpatialMethod::Nearest => grid_points
                .points()
                .first()
                .map(|p| field.value_at(time_idx, p.row, p.col))
                .unwrap_or(f64::NAN),
            SpatialMethod::RadiusMean { .. } | SpatialMethod::KNearestMean { .. } => {
                let mut sum = 0.0;
                let mut count = 0usize;
                for p in grid_points.iter() {
                    let v = field.value_at(time_idx, p.row, p.col);
                    if !v.is_nan() {
                        sum += v;
                        count += 1;
                    }
                }
                if count == 0 {
                    f64::NAN
                } else {
                    sum / count as f64
                }
            }
        }
    }
}

/// Preserves first-occurrence order while dropping duplicates.
fn dedup(variables: Vec<Variable>) -> Vec<Variable> {
    let mut seen = HashSet::new();
    variables.into_iter().filter(|v| seen.insert(*v)).collect()
}

/// The base variables to fetch: every non-derived request, plus the wind
/// components whenever a derived wind quantity is requested without them.
fn working_set(requested: &[Variable]) -> Vec<Variable> {
    let mut working: Vec<Variable> = requested.iter().copied().filter(|v| !v.is_derived()).collect();
    if requested.iter().any(Variable::is_derived) {
        for component in [Variable::UWind, Variable::VWind] {
            if !working.contains(&component) {
                working.push(component);
            }
        }
    }
    working
}
