use crate::grid::error::{DatasetError, SelectionError};
use crate::projection::error::ProjectionError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ExtractError {
    #[error(transparent)]
    Projection(#[from] ProjectionError),

    #[error(transparent)]
    Dataset(#[from] DatasetError),

    #[error(transparent)]
    Selection(#[from] SelectionError),

    #[error("Failed to assemble the result table")]
    Polars(#[from] polars::error::PolarsError),
}
