pub mod calculations;
pub mod collection;
pub mod db;
pub mod models;
pub mod notify;

pub use collection::{AppointmentCollection, CollectionError, CollectionEvent, View};
pub use db::repository::{JournalRepository, RepositoryError};
pub use models::*;
pub use notify::{NoopNotifier, Notifier, NotifyError, ScheduleHint};
