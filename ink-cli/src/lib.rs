pub mod cli;
pub mod commands;
pub mod config;
pub mod csv_io;
pub mod form;
pub mod logging;
pub mod notifier;
pub mod utils;

use ink_core::db::RepositoryRegistry;
use ink_db_sqlite::SqliteRepositoryFactory;

/// Every backend this binary can open.
pub fn build_registry() -> RepositoryRegistry {
    let mut registry = RepositoryRegistry::with_memory();
    registry.register(Box::new(SqliteRepositoryFactory));
    registry
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    #[test]
    fn registry_knows_both_backends() {
        assert_eq!(build_registry().available_backends(), vec!["memory", "sqlite"]);
    }
}
