use async_trait::async_trait;
use tracing::info;

use ink_core::db::repository::{JournalRepository, RepositoryError};
use ink_core::db::{DbConfig, RepositoryFactory};

use crate::repository::SqliteRepository;

/// [`RepositoryFactory`] for SQLite.
///
/// Register this with a [`ink_core::db::RepositoryRegistry`] to make the
/// `"sqlite"` backend available:
///
/// ```rust,no_run
/// use ink_core::db::RepositoryRegistry;
/// use ink_db_sqlite::SqliteRepositoryFactory;
///
/// let mut registry = RepositoryRegistry::with_memory();
/// registry.register(Box::new(SqliteRepositoryFactory));
/// ```
pub struct SqliteRepositoryFactory;

#[async_trait]
impl RepositoryFactory for SqliteRepositoryFactory {
    fn backend_name(&self) -> &'static str {
        "sqlite"
    }

    /// Open the journal described by `config.connection_string` and bring its
    /// schema up to date.
    ///
    /// Accepted connection-string values:
    /// * A bare file path, e.g. `"inkbook.db"`. The file is created if it
    ///   does not exist.
    /// * `":memory:"`, an ephemeral in-memory database.
    /// * A sqlx URL such as `"sqlite:journal.db?mode=rwc"`.
    async fn create(
        &self,
        config: &DbConfig,
    ) -> Result<Box<dyn JournalRepository>, RepositoryError> {
        let repo = SqliteRepository::new(&config.connection_string)
            .await
            .map_err(|e| RepositoryError::Connection(format!("{e:#}")))?;
        repo.run_migrations()
            .await
            .map_err(|e| RepositoryError::Database(format!("{e:#}")))?;
        info!(path = %config.connection_string, "opened sqlite journal");
        Ok(Box::new(repo))
    }
}
