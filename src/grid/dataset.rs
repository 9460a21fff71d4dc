//! In-memory representation of a loaded curvilinear gridded dataset.
//!
//! Loading (file discovery, NetCDF decoding, time filtering) is a collaborator
//! concern; this crate receives the decoded arrays and validates their shapes
//! once, at insertion time. After that the dataset is never mutated, so it can
//! be shared read-only across threads.

use crate::grid::error::DatasetError;
use chrono::{DateTime, Utc};
use ndarray::{Array2, Array3};
use std::collections::HashMap;

/// The values of one physical field, with or without a time axis.
#[derive(Debug, Clone)]
pub enum FieldData {
    /// A field with no time axis, shaped (y, x).
    Static(Array2<f64>),
    /// A time-varying field, shaped (time, y, x).
    Timed(Array3<f64>),
}

/// One named physical field of the dataset.
#[derive(Debug, Clone)]
pub struct GridField {
    /// Declared units metadata (e.g. `"K"`, `"Pa"`), when the source carried it.
    pub units: Option<String>,
    pub data: FieldData,
}

impl GridField {
    pub fn static_field(data: Array2<f64>, units: Option<&str>) -> Self {
        Self {
            units: units.map(str::to_string),
            data: FieldData::Static(data),
        }
    }

    pub fn timed(data: Array3<f64>, units: Option<&str>) -> Self {
        Self {
            units: units.map(str::to_string),
            data: FieldData::Timed(data),
        }
    }

    /// Spatial (y, x) shape of the field.
    pub fn spatial_shape(&self) -> (usize, usize) {
        match &self.data {
            FieldData::Static(a) => (a.nrows(), a.ncols()),
            FieldData::Timed(a) => {
                let s = a.shape();
                (s[1], s[2])
            }
        }
    }

    /// Value at one grid cell, for one time step when the field is timed.
    ///
    /// `time_idx` is ignored for static fields. Callers index within bounds;
    /// the dataset validated shapes at insertion.
    pub fn value_at(&self, time_idx: usize, row: usize, col: usize) -> f64 {
        match &self.data {
            FieldData::Static(a) => a[[row, col]],
            FieldData::Timed(a) => a[[time_idx, row, col]],
        }
    }

    pub fn has_time_axis(&self) -> bool {
        matches!(self.data, FieldData::Timed(_))
    }
}

/// A loaded gridded dataset: per-cell geographic coordinates, a UTC time axis,
/// and named physical fields.
///
/// The grid is curvilinear: each cell's latitude and longitude come from the
/// 2-D coordinate arrays, not from a formula. Every field shares the grid's
/// (y, x) shape; timed fields share the time axis. Both invariants are
/// enforced when fields are inserted.
#[derive(Debug, Clone)]
pub struct GridDataset {
    shape: (usize, usize),
    latitude: Array2<f64>,
    longitude: Array2<f64>,
    times: Vec<DateTime<Utc>>,
    fields: HashMap<String, GridField>,
}

impl GridDataset {
    /// Creates a dataset from its coordinate arrays and time axis.
    ///
    /// # Errors
    ///
    /// Returns [`DatasetError::CoordinateShapeMismatch`] when the latitude and
    /// longitude arrays disagree in shape.
    pub fn new(
        latitude: Array2<f64>,
        longitude: Array2<f64>,
        times: Vec<DateTime<Utc>>,
    ) -> Result<Self, DatasetError> {
        let lat_shape = (latitude.nrows(), latitude.ncols());
        let lon_shape = (longitude.nrows(), longitude.ncols());
        if lat_shape != lon_shape {
            return Err(DatasetError::CoordinateShapeMismatch {
                lat_shape,
                lon_shape,
            });
        }
        Ok(Self {
            shape: lat_shape,
            latitude,
            longitude,
            times,
            fields: HashMap::new(),
        })
    }

    /// Inserts a named field, validating its shape against the grid and, for
    /// timed fields, against the time axis.
    ///
    /// # Errors
    ///
    /// Returns [`DatasetError::ShapeMismatch`] or
    /// [`DatasetError::TimeAxisMismatch`] when the field disagrees with the
    /// grid's framing.
    pub fn insert_field(&mut self, name: &str, field: GridField) -> Result<(), DatasetError> {
        let spatial = field.spatial_shape();
        if spatial != self.shape {
            return Err(DatasetError::ShapeMismatch {
                field: name.to_string(),
                expected: self.shape,
                actual: spatial,
            });
        }
        if let FieldData::Timed(a) = &field.data {
            if a.shape()[0] != self.times.len() {
                return Err(DatasetError::TimeAxisMismatch {
                    field: name.to_string(),
                    expected: self.times.len(),
                    actual: a.shape()[0],
                });
            }
        }
        self.fields.insert(name.to_string(), field);
        Ok(())
    }

    /// Grid shape as (rows, columns).
    pub fn shape(&self) -> (usize, usize) {
        self.shape
    }

    /// Total cell count (rows × columns).
    pub fn cell_count(&self) -> usize {
        self.shape.0 * self.shape.1
    }

    pub fn latitude(&self) -> &Array2<f64> {
        &self.latitude
    }

    pub fn longitude(&self) -> &Array2<f64> {
        &self.longitude
    }

    /// Geographic coordinate of one cell.
    pub fn cell_coordinate(&self, row: usize, col: usize) -> (f64, f64) {
        (self.latitude[[row, col]], self.longitude[[row, col]])
    }

    /// The UTC time axis shared by all timed fields.
    pub fn times(&self) -> &[DateTime<Utc>] {
        &self.times
    }

    pub fn field(&self, name: &str) -> Option<&GridField> {
        self.fields.get(name)
    }

    pub fn has_field(&self, name: &str) -> bool {
        self.fields.contains_key(name)
    }

    /// Iterates the physical field names present in the dataset.
    pub fn field_names(&self) -> impl Iterator<Item = &str> {
        self.fields.keys().map(String::as_str)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use ndarray::{Array2, Array3};

    fn coords(rows: usize, cols: usize) -> (Array2<f64>, Array2<f64>) {
        let lat = Array2::from_shape_fn((rows, cols), |(y, _)| 30.0 + y as f64 * 0.05);
        let lon = Array2::from_shape_fn((rows, cols), |(_, x)| 138.0 + x as f64 * 0.0625);
        (lat, lon)
    }

    fn times(n: usize) -> Vec<DateTime<Utc>> {
        (0..n)
            .map(|h| Utc.with_ymd_and_hms(2024, 7, 3, h as u32, 0, 0).unwrap())
            .collect()
    }

    #[test]
    fn coordinate_shapes_must_agree() {
        let (lat, _) = coords(4, 5);
        let (_, lon) = coords(4, 6);
        assert!(matches!(
            GridDataset::new(lat, lon, times(1)),
            Err(DatasetError::CoordinateShapeMismatch { .. })
        ));
    }

    #[test]
    fn field_shape_is_validated() {
        let (lat, lon) = coords(4, 5);
        let mut ds = GridDataset::new(lat, lon, times(2)).unwrap();

        let wrong = GridField::static_field(Array2::zeros((3, 5)), None);
        assert!(matches!(
            ds.insert_field("bad", wrong),
            Err(DatasetError::ShapeMismatch { .. })
        ));

        let ok = GridField::timed(Array3::zeros((2, 4, 5)), Some("K"));
        ds.insert_field("TMP_1D5maboveground", ok).unwrap();
        assert!(ds.has_field("TMP_1D5maboveground"));
    }

    #[test]
    fn timed_field_must_match_time_axis() {
        let (lat, lon) = coords(4, 5);
        let mut ds = GridDataset::new(lat, lon, times(3)).unwrap();
        let field = GridField::timed(Array3::zeros((2, 4, 5)), None);
        assert!(matches!(
            ds.insert_field("short", field),
            Err(DatasetError::TimeAxisMismatch {
                expected: 3,
                actual: 2,
                ..
            })
        ));
    }

    #[test]
    fn value_lookup_hits_the_right_cell() {
        let (lat, lon) = coords(2, 2);
        let mut ds = GridDataset::new(lat, lon, times(2)).unwrap();
        let mut data = Array3::zeros((2, 2, 2));
        data[[1, 0, 1]] = 42.0;
        ds.insert_field("f", GridField::timed(data, None)).unwrap();
        assert_eq!(ds.field("f").unwrap().value_at(1, 0, 1), 42.0);
    }
}
