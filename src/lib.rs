mod error;
mod extraction;
mod extractor;
mod grid;
mod projection;
mod variables;

pub use error::ExtractError;
pub use extractor::*;

pub use extraction::time::TimeSelection;

pub use grid::dataset::{FieldData, GridDataset, GridField};
pub use grid::error::{DatasetError, SelectionError};
pub use grid::selector::{GridIndexSet, GridPoint, GridSelector, SpatialMethod};

pub use projection::error::ProjectionError;
pub use projection::lambert::{LambertProjection, ProjectionParameters};

pub use variables::mapping::{FallbackPatternsConfig, VariableMapping, VariableMappingConfig};
pub use variables::variable::{GridKind, Variable};
