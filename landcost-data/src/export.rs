use std::io::Write;

use landcost_core::calculations::round_half_up;
use landcost_core::{Category, CostRepository, EstimateLine, RepositoryError};
use rust_decimal::Decimal;
use serde::Serialize;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ExportError {
    #[error("CSV write error: {0}")]
    Csv(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Repository error: {0}")]
    Repository(#[from] RepositoryError),
}

impl From<csv::Error> for ExportError {
    fn from(err: csv::Error) -> Self {
        ExportError::Csv(err.to_string())
    }
}

/// One exported estimate line, with amounts rounded half-up to two places.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EstimateRow {
    #[serde(rename = "序号")]
    pub serial_number: String,
    #[serde(rename = "项目名称")]
    pub project_name: String,
    #[serde(rename = "单位")]
    pub unit: String,
    #[serde(rename = "数量")]
    pub value: Decimal,
    #[serde(rename = "单价（万元）")]
    pub unit_price: Decimal,
    #[serde(rename = "成本（万元）")]
    pub cost: Decimal,
}

impl From<&EstimateLine> for EstimateRow {
    fn from(line: &EstimateLine) -> Self {
        Self {
            serial_number: line.serial_number.clone(),
            project_name: line.project_name.clone(),
            unit: line.unit.clone(),
            value: round_half_up(line.value),
            unit_price: round_half_up(line.unit_price),
            cost: round_half_up(line.cost),
        }
    }
}

pub struct EstimateExporter;

impl EstimateExporter {
    /// Write `lines` as CSV with a header row. Returns the number of data rows.
    pub fn write<W: Write>(
        writer: W,
        lines: &[EstimateLine],
    ) -> Result<usize, ExportError> {
        let mut csv_writer = csv::Writer::from_writer(writer);
        for line in lines {
            csv_writer.serialize(EstimateRow::from(line))?;
        }
        csv_writer.flush()?;
        Ok(lines.len())
    }

    /// Read the estimate lines of `category` (or all of them) and write them as CSV.
    pub async fn export<W: Write>(
        repo: &dyn CostRepository,
        category: Option<Category>,
        writer: W,
    ) -> Result<usize, ExportError> {
        let lines = repo.list_estimate_lines(category).await?;
        Self::write(writer, &lines)
    }
}
