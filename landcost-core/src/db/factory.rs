//! Backend selection.
//!
//! Binaries register the backends they link against (`sqlite` from
//! `landcost-db-sqlite`, `memory` from this crate) and open whichever one
//! their [`DbConfig`] names.

use std::collections::HashMap;

use async_trait::async_trait;
use tracing::debug;

use super::repository::{CostRepository, RepositoryError};

/// Which backend to open and where its data lives.
///
/// For `sqlite` the connection string is a file path or `:memory:`; the
/// `memory` backend ignores it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DbConfig {
    pub backend: String,
    pub connection_string: String,
}

impl DbConfig {
    pub fn new(
        backend: impl Into<String>,
        connection_string: impl Into<String>,
    ) -> Self {
        Self {
            backend: backend.into(),
            connection_string: connection_string.into(),
        }
    }
}

impl Default for DbConfig {
    fn default() -> Self {
        Self::new("sqlite", ":memory:")
    }
}

#[async_trait]
pub trait RepositoryFactory: Send + Sync {
    fn backend_name(&self) -> &'static str;

    /// Returns a store with the schema in place and every catalog row present.
    async fn create(&self, config: &DbConfig) -> Result<Box<dyn CostRepository>, RepositoryError>;
}

#[derive(Default)]
pub struct RepositoryRegistry {
    factories: HashMap<&'static str, Box<dyn RepositoryFactory>>,
}

impl RepositoryRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// A later factory with the same backend name replaces the earlier one.
    pub fn register(&mut self, factory: Box<dyn RepositoryFactory>) {
        self.factories.insert(factory.backend_name(), factory);
    }

    /// Registered backend names in alphabetical order.
    pub fn available_backends(&self) -> Vec<&'static str> {
        let mut names: Vec<_> = self.factories.keys().copied().collect();
        names.sort_unstable();
        names
    }

    /// Opens the backend named by `config.backend`.
    ///
    /// An unregistered name is a [`RepositoryError::Configuration`] listing
    /// the names that are registered.
    pub async fn create(
        &self,
        config: &DbConfig,
    ) -> Result<Box<dyn CostRepository>, RepositoryError> {
        let Some(factory) = self.factories.get(config.backend.as_str()) else {
            return Err(RepositoryError::Configuration(format!(
                "unknown backend '{}'; available: {}",
                config.backend,
                self.available_backends().join(", ")
            )));
        };
        debug!(backend = factory.backend_name(), "Opening repository");
        factory.create(config).await
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::sync::atomic::{AtomicBool, Ordering};

    use async_trait::async_trait;

    use super::{DbConfig, RepositoryError, RepositoryFactory, RepositoryRegistry};
    use crate::db::{CostRepository, MemoryRepository};

    // ── stub factory ─────────────────────────────────────────────────────
    /// Flips an `AtomicBool` in `create` so tests can prove it was reached.
    struct StubFactory {
        name: &'static str,
        called: Arc<AtomicBool>,
    }

    #[async_trait]
    impl RepositoryFactory for StubFactory {
        fn backend_name(&self) -> &'static str {
            self.name
        }
        async fn create(
            &self,
            _config: &DbConfig,
        ) -> Result<Box<dyn CostRepository>, RepositoryError> {
            self.called.store(true, Ordering::SeqCst);
            Ok(Box::new(MemoryRepository::new(Vec::new(), Vec::new())))
        }
    }

    struct FailingFactory;

    #[async_trait]
    impl RepositoryFactory for FailingFactory {
        fn backend_name(&self) -> &'static str {
            "failing"
        }
        async fn create(
            &self,
            _config: &DbConfig,
        ) -> Result<Box<dyn CostRepository>, RepositoryError> {
            Err(RepositoryError::Connection("intentional failure".to_string()))
        }
    }

    fn stub_factory(name: &'static str) -> (Box<dyn RepositoryFactory>, Arc<AtomicBool>) {
        let flag = Arc::new(AtomicBool::new(false));
        (
            Box::new(StubFactory {
                name,
                called: flag.clone(),
            }),
            flag,
        )
    }

    fn config(backend: &str) -> DbConfig {
        DbConfig::new(backend, ":memory:")
    }

    #[test]
    fn default_config_opens_an_in_memory_sqlite_database() {
        assert_eq!(DbConfig::default(), DbConfig::new("sqlite", ":memory:"));
    }

    #[test]
    fn new_registry_has_no_backends() {
        assert!(RepositoryRegistry::new().available_backends().is_empty());
    }

    #[test]
    fn available_backends_is_sorted_and_deduplicated() {
        let mut reg = RepositoryRegistry::new();
        let (f1, _) = stub_factory("sqlite");
        let (f2, _) = stub_factory("memory");
        let (f3, _) = stub_factory("sqlite");
        reg.register(f1);
        reg.register(f2);
        reg.register(f3);
        assert_eq!(reg.available_backends(), vec!["memory", "sqlite"]);
    }

    #[tokio::test]
    async fn create_calls_only_the_matching_factory() {
        let mut reg = RepositoryRegistry::new();
        let (sqlite, sqlite_called) = stub_factory("sqlite");
        let (memory, memory_called) = stub_factory("memory");
        reg.register(sqlite);
        reg.register(memory);

        let result = reg.create(&config("sqlite")).await;

        assert!(result.is_ok(), "expected Ok, got {:#?}", result.err());
        assert!(sqlite_called.load(Ordering::SeqCst));
        assert!(!memory_called.load(Ordering::SeqCst));
    }

    #[tokio::test]
    async fn unknown_backend_names_requested_and_available_backends() {
        let mut reg = RepositoryRegistry::new();
        let (f, _) = stub_factory("sqlite");
        reg.register(f);

        match reg.create(&config("postgres")).await {
            Err(RepositoryError::Configuration(msg)) => {
                assert!(msg.contains("postgres"), "error should name the requested backend");
                assert!(msg.contains("sqlite"), "error should list available backends");
            }
            Err(other) => panic!("expected Configuration error, got {other:#?}"),
            Ok(_) => panic!("expected Configuration error, got a repository"),
        }
    }

    #[tokio::test]
    async fn create_propagates_factory_error() {
        let mut reg = RepositoryRegistry::new();
        reg.register(Box::new(FailingFactory));

        let result = reg.create(&config("failing")).await;

        assert!(matches!(
            result,
            Err(RepositoryError::Connection(msg)) if msg == "intentional failure"
        ));
    }
}
