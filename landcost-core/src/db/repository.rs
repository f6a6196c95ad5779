use async_trait::async_trait;
use rust_decimal::Decimal;
use thiserror::Error;

use crate::models::{
    Category, CellUpdate, CostFilter, EstimateLine, IndicatorFilter, IndicatorInput,
    IndicatorKey, LineKey, LineValues,
};

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RepositoryError {
    #[error("Record not found")]
    NotFound,

    #[error("Database error: {0}")]
    Database(String),

    #[error("Connection error: {0}")]
    Connection(String),

    #[error("Configuration error: {0}")]
    Configuration(String),
}

/// Failure while applying a batch of updates.
///
/// `applied` counts the writes that reached the store before `source` occurred.
/// Transactional backends always report zero.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{source} after {applied} of {total} updates")]
pub struct ApplyError {
    pub applied: usize,
    pub total: usize,
    #[source]
    pub source: RepositoryError,
}

#[async_trait]
pub trait CostRepository: Send + Sync {
    // Indicator inputs
    async fn list_indicators(
        &self,
        category: Option<Category>,
        filter: &IndicatorFilter,
    ) -> Result<Vec<IndicatorInput>, RepositoryError>;

    async fn set_indicator_value(
        &self,
        key: &IndicatorKey,
        value: Decimal,
    ) -> Result<(), RepositoryError>;

    // Estimate lines
    async fn list_estimate_lines(
        &self,
        category: Option<Category>,
    ) -> Result<Vec<EstimateLine>, RepositoryError>;

    async fn get_estimate_line(&self, key: &LineKey) -> Result<EstimateLine, RepositoryError>;

    async fn set_estimate_line(
        &self,
        key: &LineKey,
        values: &LineValues,
    ) -> Result<(), RepositoryError>;

    async fn sum_estimate_cost(&self, filter: &CostFilter) -> Result<Decimal, RepositoryError>;

    /// Applies a batch of writes in order.
    ///
    /// The default implementation is not atomic: it stops at the first failure
    /// and reports how many writes already landed.
    async fn apply_updates(&self, updates: &[CellUpdate]) -> Result<(), ApplyError> {
        for (applied, update) in updates.iter().enumerate() {
            let result = match update {
                CellUpdate::Indicator { key, value } => self.set_indicator_value(key, *value).await,
                CellUpdate::Line { key, values } => self.set_estimate_line(key, values).await,
            };
            result.map_err(|source| ApplyError {
                applied,
                total: updates.len(),
                source,
            })?;
        }
        Ok(())
    }
}
