//! Spatial index over the grid's per-cell geographic coordinates and the
//! point-selection strategies built on it.
//!
//! The index answers "which grid cell(s) represent this query point" for three
//! strategies: the single nearest cell, all cells within a radius, and the k
//! nearest cells. The R-tree searches in raw (latitude, longitude) degree
//! space, the same space the grid's coordinate arrays are stored in. That
//! metric only approximates geodesic distance, which is acceptable at grid
//! spacings small relative to the Earth's radius; the distances *reported* on
//! each selected cell are true great-circle (haversine) kilometers, computed
//! independently of the search metric.

use crate::grid::dataset::GridDataset;
use crate::grid::error::SelectionError;
use haversine::{distance, Location, Units};
use log::debug;
use ordered_float::OrderedFloat;
use rstar::{PointDistance, RTree, RTreeObject, AABB};

/// Kilometers per degree of latitude (and of longitude at the equator).
const KM_PER_DEGREE: f64 = 111.32;

/// How the extraction pipeline picks grid cells for a query point.
///
/// The averaging variants correspond to the `"mean"` method of the public
/// contract; the enum makes "mean without an aggregation parameter" and
/// "unknown method name" unrepresentable.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum SpatialMethod {
    /// The single nearest grid cell.
    Nearest,
    /// Unweighted average over all cells within `radius_km` of the query point.
    RadiusMean { radius_km: f64 },
    /// Unweighted average over the `k` nearest cells.
    KNearestMean { k: usize },
}

impl SpatialMethod {
    /// The method name reported in result tables.
    pub fn name(&self) -> &'static str {
        match self {
            SpatialMethod::Nearest => "nearest",
            SpatialMethod::RadiusMean { .. } | SpatialMethod::KNearestMean { .. } => "mean",
        }
    }
}

/// One selected grid cell: its (row, col) index, its stored geographic
/// coordinate, and the great-circle distance from the query point.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GridPoint {
    /// Y index, counted from the grid's northern edge.
    pub row: usize,
    /// X index, counted from the grid's western edge.
    pub col: usize,
    pub latitude: f64,
    pub longitude: f64,
    /// Haversine distance from the query point, km (Earth radius 6371 km).
    pub distance_km: f64,
}

/// The outcome of one spatial selection: zero or more grid cells, ordered by
/// ascending distance from the query point.
///
/// An empty set signals "no cell matched" (e.g. a radius that excludes the
/// whole grid); callers treat that as "cannot aggregate", not as a failure.
/// Immutable once produced; surfaced alongside extraction results so callers
/// can audit exactly which cells contributed.
#[derive(Debug, Clone, Default)]
pub struct GridIndexSet {
    points: Vec<GridPoint>,
}

impl GridIndexSet {
    fn new(mut points: Vec<GridPoint>) -> Self {
        points.sort_by_key(|p| OrderedFloat(p.distance_km));
        Self { points }
    }

    pub fn points(&self) -> &[GridPoint] {
        &self.points
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &GridPoint> {
        self.points.iter()
    }

    /// Normalized inverse-distance weights for the selected cells.
    ///
    /// This is the planned weighted-averaging extension: the extraction
    /// pipeline's `mean` method deliberately averages cells with equal weight,
    /// but callers wanting distance-aware aggregation can combine raw cell
    /// values with these weights themselves. Weights sum to 1.0; a cell
    /// closer than one meter is clamped to avoid division blow-up.
    pub fn inverse_distance_weights(&self) -> Vec<f64> {
        if self.points.is_empty() {
            return Vec::new();
        }
        let raw: Vec<f64> = self
            .points
            .iter()
            .map(|p| 1.0 / p.distance_km.max(1e-3))
            .collect();
        let total: f64 = raw.iter().sum();
        raw.into_iter().map(|w| w / total).collect()
    }
}

/// One grid cell as stored in the R-tree: indexed by its geographic coordinate.
#[derive(Debug, Clone, Copy)]
struct GridCell {
    row: usize,
    col: usize,
    latitude: f64,
    longitude: f64,
}

impl RTreeObject for GridCell {
    type Envelope = AABB<[f64; 2]>;

    fn envelope(&self) -> Self::Envelope {
        AABB::from_point([self.latitude, self.longitude])
    }
}

impl PointDistance for GridCell {
    /// Squared Euclidean distance in (lat, lon) degree space. An approximation
    /// of geodesic ordering, fine at the cell spacings this index serves.
    fn distance_2(&self, point: &[f64; 2]) -> f64 {
        let dy = self.latitude - point[0];
        let dx = self.longitude - point[1];
        dy * dy + dx * dx
    }
}

/// Static nearest-neighbor index over all grid cells.
///
/// Built once per loaded dataset (O(N log N) bulk load for N cells) and
/// read-only afterwards, so it can be shared across concurrent requests.
#[derive(Debug, Clone)]
pub struct GridSelector {
    rtree: RTree<GridCell>,
    cell_count: usize,
}

impl GridSelector {
    /// Bulk-loads the index from the dataset's coordinate arrays.
    pub fn new(dataset: &GridDataset) -> Self {
        let (rows, cols) = dataset.shape();
        let mut cells = Vec::with_capacity(rows * cols);
        for row in 0..rows {
            for col in 0..cols {
                let (latitude, longitude) = dataset.cell_coordinate(row, col);
                cells.push(GridCell {
                    row,
                    col,
                    latitude,
                    longitude,
                });
            }
        }
        let cell_count = cells.len();
        debug!("grid selector indexed {cell_count} cells ({rows}x{cols})");
        Self {
            rtree: RTree::bulk_load(cells),
            cell_count,
        }
    }

    /// Total number of indexed cells.
    pub fn cell_count(&self) -> usize {
        self.cell_count
    }

    /// Dispatches to the strategy the method selects.
    pub fn select(
        &self,
        lat: f64,
        lon: f64,
        method: &SpatialMethod,
    ) -> Result<GridIndexSet, SelectionError> {
        match *method {
            SpatialMethod::Nearest => Ok(self.nearest(lat, lon)),
            SpatialMethod::RadiusMean { radius_km } => self.within_radius(lat, lon, radius_km),
            SpatialMethod::KNearestMean { k } => self.k_nearest(lat, lon, k),
        }
    }

    /// The single minimum-distance cell under the index metric.
    ///
    /// Only empty for an empty grid.
    pub fn nearest(&self, lat: f64, lon: f64) -> GridIndexSet {
        let points = self
            .rtree
            .nearest_neighbor(&[lat, lon])
            .map(|cell| vec![self.to_point(cell, lat, lon)])
            .unwrap_or_default();
        GridIndexSet::new(points)
    }

    /// All cells within `radius_km` of the query point, ascending by distance.
    ///
    /// The km-to-degree conversion evaluates 111.32 km/° latitude against
    /// 111.32·cos(lat) km/° longitude at the query latitude and uses the
    /// smaller factor, keeping the search circle conservative: it never
    /// under-selects from longitude compression at high latitude, at the cost
    /// of occasionally admitting cells slightly beyond the radius. An empty
    /// result is an empty set, not an error.
    ///
    /// # Errors
    ///
    /// Returns [`SelectionError::InvalidRadius`] for a non-positive radius.
    pub fn within_radius(
        &self,
        lat: f64,
        lon: f64,
        radius_km: f64,
    ) -> Result<GridIndexSet, SelectionError> {
        if !(radius_km > 0.0) {
            return Err(SelectionError::InvalidRadius(radius_km));
        }
        let lat_deg_km = KM_PER_DEGREE;
        let lon_deg_km = KM_PER_DEGREE * lat.to_radians().cos();
        let radius_deg = radius_km / lat_deg_km.min(lon_deg_km);

        let points: Vec<GridPoint> = self
            .rtree
            .locate_within_distance([lat, lon], radius_deg * radius_deg)
            .map(|cell| self.to_point(cell, lat, lon))
            .collect();
        debug!(
            "radius search: {} cells within {radius_km} km ({radius_deg:.4}°) of ({lat}, {lon})",
            points.len()
        );
        Ok(GridIndexSet::new(points))
    }

    /// The `k` nearest cells, ascending by distance.
    ///
    /// # Errors
    ///
    /// Returns [`SelectionError::InvalidNeighborCount`] when `k` is zero or
    /// exceeds the total cell count.
    pub fn k_nearest(&self, lat: f64, lon: f64, k: usize) -> Result<GridIndexSet, SelectionError> {
        if k == 0 || k > self.cell_count {
            return Err(SelectionError::InvalidNeighborCount {
                k,
                cells: self.cell_count,
            });
        }
        let points: Vec<GridPoint> = self
            .rtree
            .nearest_neighbor_iter(&[lat, lon])
            .take(k)
            .map(|cell| self.to_point(cell, lat, lon))
            .collect();
        Ok(GridIndexSet::new(points))
    }

    fn to_point(&self, cell: &GridCell, query_lat: f64, query_lon: f64) -> GridPoint {
        let distance_km = distance(
            Location {
                latitude: query_lat,
                longitude: query_lon,
            },
            Location {
                latitude: cell.latitude,
                longitude: cell.longitude,
            },
            Units::Kilometers,
        );
        GridPoint {
            row: cell.row,
            col: cell.col,
            latitude: cell.latitude,
            longitude: cell.longitude,
            distance_km,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};
    use ndarray::Array2;

    /// A small synthetic curvilinear grid around the MSM domain, ~5.5 km
    /// latitude spacing with a slight column-dependent skew.
    fn grid(rows: usize, cols: usize) -> GridDataset {
        let lat = Array2::from_shape_fn((rows, cols), |(y, x)| {
            36.0 - y as f64 * 0.05 + x as f64 * 0.001
        });
        let lon = Array2::from_shape_fn((rows, cols), |(y, x)| {
            138.0 + x as f64 * 0.0625 + y as f64 * 0.001
        });
        let times = vec![Utc.with_ymd_and_hms(2024, 7, 3, 0, 0, 0).unwrap()];
        GridDataset::new(lat, lon, times).unwrap()
    }

    #[test]
    fn nearest_returns_the_minimum_distance_cell() {
        let ds = grid(10, 12);
        let selector = GridSelector::new(&ds);
        let (qlat, qlon) = (35.77, 138.31);
        let set = selector.nearest(qlat, qlon);
        assert_eq!(set.len(), 1);
        let picked = set.points()[0];

        // Brute force over every cell: nothing may be closer.
        for row in 0..10 {
            for col in 0..12 {
                let (lat, lon) = ds.cell_coordinate(row, col);
                let d = distance(
                    Location {
                        latitude: qlat,
                        longitude: qlon,
                    },
                    Location {
                        latitude: lat,
                        longitude: lon,
                    },
                    Units::Kilometers,
                );
                assert!(
                    picked.distance_km <= d + 1e-9,
                    "cell ({row},{col}) at {d} km beats picked {} km",
                    picked.distance_km
                );
            }
        }
    }

    #[test]
    fn radius_selection_is_monotonic_in_radius() {
        let ds = grid(10, 12);
        let selector = GridSelector::new(&ds);
        let small = selector.within_radius(35.8, 138.3, 8.0).unwrap();
        let large = selector.within_radius(35.8, 138.3, 20.0).unwrap();
        assert!(small.len() <= large.len());
        for p in small.iter() {
            assert!(
                large.iter().any(|q| q.row == p.row && q.col == p.col),
                "cell ({}, {}) in small radius missing from larger",
                p.row,
                p.col
            );
        }
    }

    #[test]
    fn tiny_radius_yields_an_empty_set_not_an_error() {
        let ds = grid(10, 12);
        let selector = GridSelector::new(&ds);
        // Far outside the grid with a radius no cell can satisfy.
        let set = selector.within_radius(20.0, 120.0, 0.5).unwrap();
        assert!(set.is_empty());
    }

    #[test]
    fn invalid_radius_is_rejected() {
        let ds = grid(4, 4);
        let selector = GridSelector::new(&ds);
        assert!(matches!(
            selector.within_radius(35.8, 138.3, 0.0),
            Err(SelectionError::InvalidRadius(_))
        ));
        assert!(matches!(
            selector.within_radius(35.8, 138.3, -3.0),
            Err(SelectionError::InvalidRadius(_))
        ));
    }

    #[test]
    fn k_nearest_is_sorted_and_validated() {
        let ds = grid(6, 6);
        let selector = GridSelector::new(&ds);
        let set = selector.k_nearest(35.8, 138.2, 5).unwrap();
        assert_eq!(set.len(), 5);
        for pair in set.points().windows(2) {
            assert!(pair[0].distance_km <= pair[1].distance_km);
        }

        assert!(matches!(
            selector.k_nearest(35.8, 138.2, 0),
            Err(SelectionError::InvalidNeighborCount { k: 0, .. })
        ));
        assert!(matches!(
            selector.k_nearest(35.8, 138.2, 37),
            Err(SelectionError::InvalidNeighborCount { k: 37, cells: 36 })
        ));
    }

    #[test]
    fn radius_results_are_distance_ordered() {
        let ds = grid(10, 12);
        let selector = GridSelector::new(&ds);
        let set = selector.within_radius(35.8, 138.3, 25.0).unwrap();
        assert!(set.len() > 2);
        for pair in set.points().windows(2) {
            assert!(pair[0].distance_km <= pair[1].distance_km);
        }
    }

    #[test]
    fn inverse_distance_weights_normalize_and_favor_near_cells() {
        let ds = grid(8, 8);
        let selector = GridSelector::new(&ds);
        let set = selector.k_nearest(35.81, 138.21, 4).unwrap();
        let weights = set.inverse_distance_weights();
        assert_eq!(weights.len(), 4);
        let total: f64 = weights.iter().sum();
        assert!((total - 1.0).abs() < 1e-12);
        // Set is distance-ordered, so weights must be non-increasing.
        for pair in weights.windows(2) {
            assert!(pair[0] >= pair[1]);
        }
    }

    #[test]
    fn empty_set_has_no_weights() {
        let set = GridIndexSet::default();
        assert!(set.inverse_distance_weights().is_empty());
    }
}
