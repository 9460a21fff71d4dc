use thiserror::Error;

#[derive(Debug, Error)]
pub enum DatasetError {
    #[error("Coordinate arrays disagree: latitude is {lat_shape:?}, longitude is {lon_shape:?}")]
    CoordinateShapeMismatch {
        lat_shape: (usize, usize),
        lon_shape: (usize, usize),
    },

    #[error("Field '{field}' has spatial shape {actual:?}, grid is {expected:?}")]
    ShapeMismatch {
        field: String,
        expected: (usize, usize),
        actual: (usize, usize),
    },

    #[error("Field '{field}' has {actual} time steps, the time axis has {expected}")]
    TimeAxisMismatch {
        field: String,
        expected: usize,
        actual: usize,
    },
}

#[derive(Debug, Error)]
pub enum SelectionError {
    #[error("Neighbor count {k} is invalid; must be between 1 and {cells} (total grid cells)")]
    InvalidNeighborCount { k: usize, cells: usize },

    #[error("Search radius {0} km is invalid; must be positive")]
    InvalidRadius(f64),
}
