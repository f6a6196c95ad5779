use std::path::Path;
use std::str::FromStr;

use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::Utc;
use rust_decimal::Decimal;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePool, SqlitePoolOptions, SqliteRow};
use sqlx::{Executor, QueryBuilder, Row, Sqlite};
use tracing::debug;
use landcost_core::{
    ApplyError, Category, CellUpdate, CostFilter, CostRepository, EstimateLine, IndicatorFilter,
    IndicatorInput, IndicatorKey, LineKey, LineKind, LineValues, RepositoryError,
};

use crate::decimal::{decimal_to_f64, get_decimal};

pub struct SqliteRepository {
    pool: SqlitePool,
}

fn is_memory(database_url: &str) -> bool {
    database_url.trim_start_matches("sqlite:") == ":memory:"
}

/// Accepts a bare file path, `:memory:`, or a sqlx-style `sqlite:` URL.
fn connect_options(database_url: &str) -> Result<SqliteConnectOptions> {
    let options = if is_memory(database_url) {
        SqliteConnectOptions::from_str("sqlite::memory:")?
    } else if database_url.starts_with("sqlite:") {
        SqliteConnectOptions::from_str(database_url)?
    } else {
        SqliteConnectOptions::new().filename(database_url)
    };
    Ok(options.create_if_missing(true))
}

impl SqliteRepository {
    pub async fn new(database_url: &str) -> Result<Self> {
        let options = connect_options(database_url)
            .with_context(|| format!("Invalid database location: {database_url}"))?;
        // Each connection to :memory: is a separate database.
        let pool_options = if is_memory(database_url) {
            SqlitePoolOptions::new()
                .max_connections(1)
                .idle_timeout(None)
                .max_lifetime(None)
        } else {
            SqlitePoolOptions::new()
        };
        let pool = pool_options
            .connect_with(options)
            .await
            .with_context(|| format!("Failed to connect to database: {database_url}"))?;
        Ok(Self { pool })
    }

    pub async fn new_with_pool(pool: SqlitePool) -> Self {
        Self { pool }
    }

    pub async fn run_migrations(&self) -> Result<()> {
        sqlx::migrate!("./migrations")
            .run(&self.pool)
            .await
            .context("Failed to run database migrations")?;
        Ok(())
    }

    /// Load and execute all SQL seed files from the specified directory.
    /// Files are executed in alphabetical order by filename.
    pub async fn run_seeds(
        &self,
        seeds_dir: &Path,
    ) -> Result<()> {
        let mut entries: Vec<_> = std::fs::read_dir(seeds_dir)
            .with_context(|| format!("Failed to read seeds directory '{}'", seeds_dir.display()))?
            .filter_map(|entry| entry.ok())
            .filter(|entry| entry.path().extension().is_some_and(|ext| ext == "sql"))
            .collect();

        entries.sort_by_key(|entry| entry.file_name());

        for entry in entries {
            let path = entry.path();
            let sql = std::fs::read_to_string(&path)
                .with_context(|| format!("Failed to read seed file '{}'", path.display()))?;

            sqlx::raw_sql(&sql)
                .execute(&self.pool)
                .await
                .with_context(|| format!("Failed to execute seed file '{}'", path.display()))?;
            debug!(file = %path.display(), "Applied seed file");
        }

        Ok(())
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }
}

fn db_error(e: sqlx::Error) -> RepositoryError {
    RepositoryError::Database(e.to_string())
}

fn get_category(row: &SqliteRow) -> Result<Category, RepositoryError> {
    let id: i32 = row.try_get("category").map_err(db_error)?;
    Category::from_id(id)
        .ok_or_else(|| RepositoryError::Database(format!("Invalid category: {id}")))
}

fn row_to_indicator(row: &SqliteRow) -> Result<IndicatorInput, RepositoryError> {
    Ok(IndicatorInput {
        id: row.try_get("id").map_err(db_error)?,
        category: get_category(row)?,
        serial_number: row.try_get("serial_number").map_err(db_error)?,
        indicator_name: row.try_get("indicator_name").map_err(db_error)?,
        value: get_decimal(row, "value")?,
        remark: row.try_get("remark").map_err(db_error)?,
        basis: row.try_get("basis").map_err(db_error)?,
        source_url: row.try_get("source_url").map_err(db_error)?,
    })
}

fn row_to_estimate_line(row: &SqliteRow) -> Result<EstimateLine, RepositoryError> {
    let kind: String = row.try_get("line_kind").map_err(db_error)?;
    Ok(EstimateLine {
        id: row.try_get("id").map_err(db_error)?,
        category: get_category(row)?,
        serial_number: row.try_get("serial_number").map_err(db_error)?,
        project_name: row.try_get("project_name").map_err(db_error)?,
        unit: row.try_get("unit").map_err(db_error)?,
        kind: LineKind::parse(&kind)
            .ok_or_else(|| RepositoryError::Database(format!("Invalid line kind: {kind}")))?,
        value: get_decimal(row, "value")?,
        unit_price: get_decimal(row, "unit_price")?,
        cost: get_decimal(row, "cost")?,
    })
}

const LINE_COLUMNS: &str = "id, category, serial_number, project_name, unit, line_kind, \
                            value, unit_price, cost";

/// Appends `AND substr(column, 1, length(prefix)) = prefix`.
///
/// `LIKE` would treat `_` and `%` in a serial as wildcards.
fn push_prefix(
    query: &mut QueryBuilder<'_, Sqlite>,
    column: &str,
    prefix: &str,
) {
    query
        .push(format!(" AND substr({column}, 1, length("))
        .push_bind(prefix.to_string())
        .push(")) = ")
        .push_bind(prefix.to_string());
}

/// Writes one update through `executor`; a key that matches no row is `NotFound`.
async fn write_update<'e, E>(
    executor: E,
    update: &CellUpdate,
) -> Result<(), RepositoryError>
where
    E: Executor<'e, Database = Sqlite>,
{
    let now = Utc::now();
    let result = match update {
        CellUpdate::Indicator { key, value } => {
            sqlx::query(
                "UPDATE indicator_input SET value = ?, updated_at = ?
                 WHERE category = ? AND serial_number = ?",
            )
            .bind(decimal_to_f64(*value))
            .bind(now)
            .bind(key.category.id())
            .bind(&key.serial_number)
            .execute(executor)
            .await
        }
        CellUpdate::Line { key, values } => {
            sqlx::query(
                "UPDATE land_acquisition_cost_estimate
                 SET value = ?, unit_price = ?, cost = ?, updated_at = ?
                 WHERE category = ? AND serial_number = ?",
            )
            .bind(decimal_to_f64(values.value))
            .bind(decimal_to_f64(values.unit_price))
            .bind(decimal_to_f64(values.cost))
            .bind(now)
            .bind(key.category.id())
            .bind(&key.serial_number)
            .execute(executor)
            .await
        }
    }
    .map_err(db_error)?;

    if result.rows_affected() == 0 {
        return Err(RepositoryError::NotFound);
    }
    Ok(())
}

#[async_trait]
impl CostRepository for SqliteRepository {
    async fn list_indicators(
        &self,
        category: Option<Category>,
        filter: &IndicatorFilter,
    ) -> Result<Vec<IndicatorInput>, RepositoryError> {
        let mut query = QueryBuilder::<Sqlite>::new(
            "SELECT id, category, serial_number, indicator_name, value, remark, basis, source_url
             FROM indicator_input WHERE 1 = 1",
        );
        if let Some(category) = category {
            query.push(" AND category = ").push_bind(category.id());
        }
        match filter {
            IndicatorFilter::All => {}
            IndicatorFilter::SerialPrefix(prefix) => push_prefix(&mut query, "serial_number", prefix),
            IndicatorFilter::Serial(serial) => {
                query.push(" AND serial_number = ").push_bind(serial.clone());
            }
            IndicatorFilter::Name(name) => {
                query.push(" AND indicator_name = ").push_bind(name.clone());
            }
            IndicatorFilter::Id(id) => {
                query.push(" AND id = ").push_bind(*id);
            }
        }
        query.push(" ORDER BY id");

        let rows = query.build().fetch_all(&self.pool).await.map_err(db_error)?;
        rows.iter().map(row_to_indicator).collect()
    }

    async fn set_indicator_value(
        &self,
        key: &IndicatorKey,
        value: Decimal,
    ) -> Result<(), RepositoryError> {
        let update = CellUpdate::Indicator {
            key: key.clone(),
            value,
        };
        write_update(&self.pool, &update).await
    }

    async fn list_estimate_lines(
        &self,
        category: Option<Category>,
    ) -> Result<Vec<EstimateLine>, RepositoryError> {
        let mut query = QueryBuilder::<Sqlite>::new(format!(
            "SELECT {LINE_COLUMNS} FROM land_acquisition_cost_estimate WHERE 1 = 1"
        ));
        if let Some(category) = category {
            query.push(" AND category = ").push_bind(category.id());
        }
        query.push(" ORDER BY id");

        let rows = query.build().fetch_all(&self.pool).await.map_err(db_error)?;
        rows.iter().map(row_to_estimate_line).collect()
    }

    async fn get_estimate_line(&self, key: &LineKey) -> Result<EstimateLine, RepositoryError> {
        let row = sqlx::query(&format!(
            "SELECT {LINE_COLUMNS} FROM land_acquisition_cost_estimate
             WHERE category = ? AND serial_number = ?"
        ))
        .bind(key.category.id())
        .bind(&key.serial_number)
        .fetch_optional(&self.pool)
        .await
        .map_err(db_error)?
        .ok_or(RepositoryError::NotFound)?;

        row_to_estimate_line(&row)
    }

    async fn set_estimate_line(
        &self,
        key: &LineKey,
        values: &LineValues,
    ) -> Result<(), RepositoryError> {
        let update = CellUpdate::Line {
            key: key.clone(),
            values: *values,
        };
        write_update(&self.pool, &update).await
    }

    async fn sum_estimate_cost(&self, filter: &CostFilter) -> Result<Decimal, RepositoryError> {
        let mut query = QueryBuilder::<Sqlite>::new(
            "SELECT COALESCE(SUM(cost), 0) AS total FROM land_acquisition_cost_estimate WHERE 1 = 1",
        );
        if let Some(category) = filter.category {
            query.push(" AND category = ").push_bind(category.id());
        }
        if let Some(prefix) = &filter.serial_prefix {
            push_prefix(&mut query, "serial_number", prefix);
        }
        if let Some(kind) = filter.kind {
            query.push(" AND line_kind = ").push_bind(kind.as_str());
        }

        let row = query.build().fetch_one(&self.pool).await.map_err(db_error)?;
        get_decimal(&row, "total")
    }

    /// Applies the whole batch in one transaction. On failure nothing is
    /// written, so `applied` is always zero.
    async fn apply_updates(&self, updates: &[CellUpdate]) -> Result<(), ApplyError> {
        let fail = |source| ApplyError {
            applied: 0,
            total: updates.len(),
            source,
        };

        let mut tx = self.pool.begin().await.map_err(|e| fail(db_error(e)))?;
        for update in updates {
            write_update(&mut *tx, update).await.map_err(fail)?;
        }
        tx.commit().await.map_err(|e| fail(db_error(e)))?;

        debug!(count = updates.len(), "Committed update batch");
        Ok(())
    }
}
