//! Row assembly for extraction results.
//!
//! Values arrive one (variable, level, time) at a time; rows are merged in a
//! map keyed by the composite (time, level) so assembly stays linear in the
//! number of rows, and the key's ordering gives the final table its
//! time-major order for free (rows without a timestamp sort first).

use crate::extraction::wind::{wind_direction, wind_speed};
use polars::prelude::*;
use std::collections::BTreeMap;

pub(crate) const COL_TIME: &str = "time";
pub(crate) const COL_LAT: &str = "lat";
pub(crate) const COL_LON: &str = "lon";
pub(crate) const COL_LEVEL: &str = "level_hPa";
pub(crate) const COL_METHOD: &str = "method";
pub(crate) const COL_N_POINTS: &str = "n_points";
pub(crate) const COL_U: &str = "u_ms";
pub(crate) const COL_V: &str = "v_ms";
pub(crate) const COL_WIND_SPEED: &str = "wind_speed";
pub(crate) const COL_WIND_DIRECTION: &str = "wind_direction";

/// Composite row key. `time_ms` is the UTC timestamp in epoch milliseconds
/// (`None` for fields without a time axis); `level` is the pressure level in
/// hPa (`None` for surface rows).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub(crate) struct RowKey {
    pub time_ms: Option<i64>,
    pub level: Option<u32>,
}

/// Accumulates per-row value columns keyed by (time, level).
#[derive(Debug, Default)]
pub(crate) struct RowSet {
    rows: BTreeMap<RowKey, BTreeMap<&'static str, f64>>,
}

impl RowSet {
    pub fn insert(&mut self, key: RowKey, column: &'static str, value: f64) {
        self.rows.entry(key).or_default().insert(column, value);
    }

    /// Computes wind speed and direction for every row carrying both
    /// components. Runs unconditionally; whether the derived columns reach
    /// the output table is decided by the column list passed to
    /// [`RowSet::into_dataframe`].
    pub fn derive_wind(&mut self) {
        for values in self.rows.values_mut() {
            if let (Some(&u), Some(&v)) = (values.get(COL_U), values.get(COL_V)) {
                values.insert(COL_WIND_SPEED, wind_speed(u, v));
                values.insert(COL_WIND_DIRECTION, wind_direction(u, v));
            }
        }
    }

    /// Renders the accumulated rows as a DataFrame with the fixed metadata
    /// columns followed by `value_columns` in the given order. The `time`
    /// column is a millisecond-precision UTC datetime.
    pub fn into_dataframe(
        self,
        lat: f64,
        lon: f64,
        method: &'static str,
        n_points: usize,
        include_level: bool,
        value_columns: &[&'static str],
    ) -> PolarsResult<DataFrame> {
        if self.rows.is_empty() {
            return Ok(DataFrame::empty());
        }
        let height = self.rows.len();

        let times: Vec<Option<i64>> = self.rows.keys().map(|k| k.time_ms).collect();
        let time_column = Series::new(COL_TIME.into(), times)
            .cast(&DataType::Datetime(TimeUnit::Milliseconds, None))?
            .into_column();

        let mut columns = vec![
            time_column,
            Series::new(COL_LAT.into(), vec![lat; height]).into_column(),
            Series::new(COL_LON.into(), vec![lon; height]).into_column(),
        ];

        if include_level {
            let levels: Vec<Option<u32>> = self.rows.keys().map(|k| k.level).collect();
            columns.push(Series::new(COL_LEVEL.into(), levels).into_column());
        }

        columns.push(Series::new(COL_METHOD.into(), vec![method; height]).into_column());
        columns
            .push(Series::new(COL_N_POINTS.into(), vec![n_points as u32; height]).into_column());

        for &name in value_columns {
            let values: Vec<Option<f64>> = self
                .rows
                .values()
                .map(|row| row.get(name).copied())
                .collect();
            columns.push(Series::new(name.into(), values).into_column());
        }

        DataFrame::new(columns)
    }
}
