use std::collections::HashMap;

use async_trait::async_trait;
use serde::Deserialize;
use tracing::debug;

use super::memory::MemoryRepositoryFactory;
use super::repository::{JournalRepository, RepositoryError};

/// Which storage backend to open, and how.
///
/// `backend` names a registered [`RepositoryFactory`]; `connection_string`
/// is handed to that factory untouched.
///
/// | backend    | connection_string examples          |
/// |------------|-------------------------------------|
/// | `sqlite`   | `inkbook.db`, `:memory:`            |
/// | `memory`   | ignored                             |
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct DbConfig {
    pub backend: String,
    pub connection_string: String,
}

impl Default for DbConfig {
    fn default() -> Self {
        Self {
            backend: "sqlite".to_string(),
            connection_string: "inkbook.db".to_string(),
        }
    }
}

/// Opens repositories for one backend. Backend crates export a unit struct
/// implementing this and the binary registers it at startup.
#[async_trait]
pub trait RepositoryFactory: Send + Sync {
    /// Lowercase, unique backend name.
    fn backend_name(&self) -> &'static str;

    /// Connect, migrate if needed, and hand back a ready repository.
    async fn create(
        &self,
        config: &DbConfig,
    ) -> Result<Box<dyn JournalRepository>, RepositoryError>;
}

/// Backend factories keyed by name.
pub struct RepositoryRegistry {
    factories: HashMap<&'static str, Box<dyn RepositoryFactory>>,
}

impl RepositoryRegistry {
    pub fn new() -> Self {
        Self {
            factories: HashMap::new(),
        }
    }

    /// A registry that already knows the in-process `memory` backend.
    pub fn with_memory() -> Self {
        let mut registry = Self::new();
        registry.register(Box::new(MemoryRepositoryFactory));
        registry
    }

    /// A later registration under the same name replaces the earlier one.
    pub fn register(
        &mut self,
        factory: Box<dyn RepositoryFactory>,
    ) {
        self.factories.insert(factory.backend_name(), factory);
    }

    /// Sorted backend names.
    pub fn available_backends(&self) -> Vec<&'static str> {
        let mut names: Vec<_> = self.factories.keys().copied().collect();
        names.sort_unstable();
        names
    }

    /// Open a repository with the factory named by `config.backend`.
    ///
    /// # Errors
    /// * [`RepositoryError::Configuration`] when no such backend is registered.
    /// * Whatever the factory itself reports.
    pub async fn create(
        &self,
        config: &DbConfig,
    ) -> Result<Box<dyn JournalRepository>, RepositoryError> {
        let factory = self.factories.get(config.backend.as_str()).ok_or_else(|| {
            RepositoryError::Configuration(format!(
                "unknown backend '{}'; available: {:?}",
                config.backend,
                self.available_backends()
            ))
        })?;

        debug!(backend = %config.backend, "opening repository");
        factory.create(config).await
    }
}

impl Default for RepositoryRegistry {
    fn default() -> Self {
        Self::new()
    }
}
