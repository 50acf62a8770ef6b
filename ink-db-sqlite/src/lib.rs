//! SQLite storage for the tattoo journal.

mod columns;
pub mod factory;
pub mod repository;

pub use factory::SqliteRepositoryFactory;
pub use repository::SqliteRepository;
