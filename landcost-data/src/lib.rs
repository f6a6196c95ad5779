//! CSV import of indicator values and CSV export of the estimate table.

pub mod export;
pub mod loader;

pub use export::{EstimateExporter, EstimateRow, ExportError};
pub use loader::{IndicatorLoader, IndicatorLoaderError, IndicatorRecord};
