//! Process-local backend, seeded from the catalog.
//!
//! Used by tests and by `--backend memory`. Batches are applied
//! all-or-nothing: every key is checked before the first write.

use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

use async_trait::async_trait;
use rust_decimal::Decimal;

use super::factory::{DbConfig, RepositoryFactory};
use super::repository::{ApplyError, CostRepository, RepositoryError};
use crate::calculations::catalog;
use crate::calculations::common::checked_sum;
use crate::models::{
    Category, CellUpdate, CostFilter, EstimateLine, IndicatorFilter, IndicatorInput,
    IndicatorKey, LineKey, LineValues,
};

#[derive(Debug, Default)]
struct Tables {
    indicators: Vec<IndicatorInput>,
    lines: Vec<EstimateLine>,
}

impl Tables {
    fn indicator_mut(&mut self, key: &IndicatorKey) -> Result<&mut IndicatorInput, RepositoryError> {
        self.indicators
            .iter_mut()
            .find(|i| i.category == key.category && i.serial_number == key.serial_number)
            .ok_or(RepositoryError::NotFound)
    }

    fn line_mut(&mut self, key: &LineKey) -> Result<&mut EstimateLine, RepositoryError> {
        self.lines
            .iter_mut()
            .find(|l| l.category == key.category && l.serial_number == key.serial_number)
            .ok_or(RepositoryError::NotFound)
    }

    fn apply(&mut self, update: &CellUpdate) -> Result<(), RepositoryError> {
        match update {
            CellUpdate::Indicator { key, value } => {
                self.indicator_mut(key)?.value = *value;
            }
            CellUpdate::Line { key, values } => {
                let line = self.line_mut(key)?;
                line.value = values.value;
                line.unit_price = values.unit_price;
                line.cost = values.cost;
            }
        }
        Ok(())
    }
}

#[derive(Debug, Default)]
pub struct MemoryRepository {
    tables: RwLock<Tables>,
}

impl MemoryRepository {
    pub fn new(
        indicators: Vec<IndicatorInput>,
        lines: Vec<EstimateLine>,
    ) -> Self {
        Self {
            tables: RwLock::new(Tables { indicators, lines }),
        }
    }

    /// Every catalog row, zero-valued.
    pub fn seeded() -> Self {
        Self::new(catalog::indicator_rows(), catalog::estimate_rows())
    }

    fn read(&self) -> Result<RwLockReadGuard<'_, Tables>, RepositoryError> {
        self.tables
            .read()
            .map_err(|e| RepositoryError::Database(format!("lock poisoned: {e}")))
    }

    fn write(&self) -> Result<RwLockWriteGuard<'_, Tables>, RepositoryError> {
        self.tables
            .write()
            .map_err(|e| RepositoryError::Database(format!("lock poisoned: {e}")))
    }
}

#[async_trait]
impl CostRepository for MemoryRepository {
    async fn list_indicators(
        &self,
        category: Option<Category>,
        filter: &IndicatorFilter,
    ) -> Result<Vec<IndicatorInput>, RepositoryError> {
        let tables = self.read()?;
        let mut rows: Vec<_> = tables
            .indicators
            .iter()
            .filter(|i| category.is_none_or(|c| c == i.category) && filter.matches(i))
            .cloned()
            .collect();
        rows.sort_by_key(|i| i.id);
        Ok(rows)
    }

    async fn set_indicator_value(
        &self,
        key: &IndicatorKey,
        value: Decimal,
    ) -> Result<(), RepositoryError> {
        self.write()?.indicator_mut(key)?.value = value;
        Ok(())
    }

    async fn list_estimate_lines(
        &self,
        category: Option<Category>,
    ) -> Result<Vec<EstimateLine>, RepositoryError> {
        let tables = self.read()?;
        let mut rows: Vec<_> = tables
            .lines
            .iter()
            .filter(|l| category.is_none_or(|c| c == l.category))
            .cloned()
            .collect();
        rows.sort_by_key(|l| l.id);
        Ok(rows)
    }

    async fn get_estimate_line(&self, key: &LineKey) -> Result<EstimateLine, RepositoryError> {
        self.read()?
            .lines
            .iter()
            .find(|l| l.category == key.category && l.serial_number == key.serial_number)
            .cloned()
            .ok_or(RepositoryError::NotFound)
    }

    async fn set_estimate_line(
        &self,
        key: &LineKey,
        values: &LineValues,
    ) -> Result<(), RepositoryError> {
        self.write()?.apply(&CellUpdate::Line {
            key: key.clone(),
            values: *values,
        })
    }

    async fn sum_estimate_cost(&self, filter: &CostFilter) -> Result<Decimal, RepositoryError> {
        let tables = self.read()?;
        checked_sum(tables.lines.iter().filter(|l| filter.matches(l)).map(|l| l.cost))
            .ok_or_else(|| RepositoryError::Database(format!("sum over {filter} overflowed")))
    }

    async fn apply_updates(&self, updates: &[CellUpdate]) -> Result<(), ApplyError> {
        let fail = |source| ApplyError {
            applied: 0,
            total: updates.len(),
            source,
        };
        let mut tables = self.write().map_err(fail)?;

        let mut staged = Tables {
            indicators: tables.indicators.clone(),
            lines: tables.lines.clone(),
        };
        for update in updates {
            staged.apply(update).map_err(fail)?;
        }
        *tables = staged;
        Ok(())
    }
}

pub struct MemoryRepositoryFactory;

#[async_trait]
impl RepositoryFactory for MemoryRepositoryFactory {
    fn backend_name(&self) -> &'static str {
        "memory"
    }

    async fn create(&self, _config: &DbConfig) -> Result<Box<dyn CostRepository>, RepositoryError> {
        Ok(Box::new(MemoryRepository::seeded()))
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use rust_decimal_macros::dec;

    use super::*;

    #[tokio::test]
    async fn list_indicators_filters_by_category_and_prefix() {
        let repo = MemoryRepository::seeded();

        let rows = repo
            .list_indicators(
                Some(Category::Demolition),
                &IndicatorFilter::SerialPrefix("2.".to_string()),
            )
            .await
            .unwrap();

        let serials: Vec<_> = rows.iter().map(|i| i.serial_number.as_str()).collect();
        assert_eq!(serials, vec!["2.1", "2.2", "2.3", "2.4", "2.5"]);
    }

    #[tokio::test]
    async fn unknown_keys_are_not_found() {
        let repo = MemoryRepository::seeded();
        let key = IndicatorKey::new(Category::Contingency, "2");

        assert_eq!(
            repo.set_indicator_value(&key, dec!(1)).await,
            Err(RepositoryError::NotFound)
        );
        assert_eq!(
            repo.get_estimate_line(&LineKey::new(Category::Contingency, "3"))
                .await,
            Err(RepositoryError::NotFound)
        );
    }

    #[tokio::test]
    async fn sum_estimate_cost_of_empty_selection_is_zero() {
        let repo = MemoryRepository::seeded();

        let sum = repo
            .sum_estimate_cost(&CostFilter::category(Category::Contingency).with_prefix("9"))
            .await
            .unwrap();

        assert_eq!(sum, dec!(0));
    }

    #[tokio::test]
    async fn apply_updates_is_all_or_nothing() {
        let repo = MemoryRepository::seeded();
        let good = CellUpdate::Indicator {
            key: IndicatorKey::new(Category::Contingency, "1"),
            value: dec!(5),
        };
        let bad = CellUpdate::Line {
            key: LineKey::new(Category::Contingency, "9"),
            values: LineValues::default(),
        };

        let result = repo.apply_updates(&[good.clone(), bad]).await;

        assert_eq!(
            result,
            Err(ApplyError {
                applied: 0,
                total: 2,
                source: RepositoryError::NotFound,
            })
        );
        let rate = repo
            .list_indicators(Some(Category::Contingency), &IndicatorFilter::All)
            .await
            .unwrap();
        assert_eq!(rate[0].value, dec!(0));

        repo.apply_updates(&[good]).await.unwrap();
        let rate = repo
            .list_indicators(Some(Category::Contingency), &IndicatorFilter::All)
            .await
            .unwrap();
        assert_eq!(rate[0].value, dec!(5));
    }

    #[tokio::test]
    async fn factory_creates_a_seeded_store() {
        let repo = MemoryRepositoryFactory
            .create(&DbConfig {
                backend: "memory".to_string(),
                connection_string: String::new(),
            })
            .await
            .unwrap();

        let lines = repo.list_estimate_lines(None).await.unwrap();

        assert_eq!(lines.len(), catalog::LINES.len());
    }
}
