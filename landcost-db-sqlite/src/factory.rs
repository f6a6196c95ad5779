use std::path::PathBuf;

use async_trait::async_trait;
use tracing::info;

use landcost_core::db::{CostRepository, DbConfig, RepositoryError, RepositoryFactory};

use crate::repository::SqliteRepository;

/// Resolve the seeds directory at runtime so it works in both development and
/// packaged distribution.
///
/// Resolution order:
/// 1. **`LANDCOST_SQLITE_SEEDS_DIR`** if set (override for packagers or
///    custom layouts).
/// 2. **`./seeds`** if the directory exists in the current working directory.
/// 3. **Crate manifest dir**: `$CARGO_MANIFEST_DIR/seeds` as last resort
///    (dev/tests when run from the build tree).
pub fn seeds_dir() -> PathBuf {
    if let Ok(dir) = std::env::var("LANDCOST_SQLITE_SEEDS_DIR") {
        return PathBuf::from(dir);
    }
    let cwd_seeds = PathBuf::from("./seeds");
    if cwd_seeds.is_dir() {
        return cwd_seeds;
    }
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("seeds")
}

/// [`RepositoryFactory`] for SQLite.
///
/// Register this with a [`landcost_core::db::RepositoryRegistry`] to make the
/// `"sqlite"` backend available:
///
/// ```rust,no_run
/// use landcost_core::db::RepositoryRegistry;
/// use landcost_db_sqlite::SqliteRepositoryFactory;
///
/// let mut registry = RepositoryRegistry::new();
/// registry.register(Box::new(SqliteRepositoryFactory));
/// ```
pub struct SqliteRepositoryFactory;

#[async_trait]
impl RepositoryFactory for SqliteRepositoryFactory {
    fn backend_name(&self) -> &'static str {
        "sqlite"
    }

    /// Open the database described by `config.connection_string`.
    ///
    /// Accepted connection-string values:
    /// * A bare file path such as `"landcost.db"`. The file is created if it
    ///   does not exist.
    /// * `":memory:"`, an ephemeral in-memory database (useful for tests).
    /// * A sqlx-style URL such as `"sqlite://landcost.db?mode=rwc"`.
    ///
    /// Seeds only insert missing catalog rows, so reopening an existing
    /// database keeps its values.
    async fn create(
        &self,
        config: &DbConfig,
    ) -> Result<Box<dyn CostRepository>, RepositoryError> {
        let repo = SqliteRepository::new(&config.connection_string)
            .await
            .map_err(|e| RepositoryError::Connection(format!("{e:#}")))?;
        repo.run_migrations()
            .await
            .map_err(|e| RepositoryError::Database(format!("{e:#}")))?;
        let seeds = seeds_dir();
        repo.run_seeds(&seeds)
            .await
            .map_err(|e| RepositoryError::Database(format!("{e:#}")))?;
        info!(
            database = %config.connection_string,
            seeds = %seeds.display(),
            "Opened SQLite repository"
        );
        Ok(Box::new(repo))
    }
}
