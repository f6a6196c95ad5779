pub mod calculations;
pub mod db;
pub mod models;

pub use calculations::{
    CostService, ErrorKind, RecalculationError, RecalculationReport, RecalculationRequest,
    Recalculator,
};
pub use db::repository::{ApplyError, CostRepository, RepositoryError};
pub use models::*;
