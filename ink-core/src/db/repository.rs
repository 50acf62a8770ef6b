use async_trait::async_trait;
use thiserror::Error;

use crate::models::{
    Appointment, AppointmentId, Artist, ArtistId, Shop, ShopId, UserPreferences,
};

#[derive(Debug, Error, PartialEq, Eq)]
pub enum RepositoryError {
    #[error("Record not found")]
    NotFound,

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Database error: {0}")]
    Database(String),

    #[error("Connection error: {0}")]
    Connection(String),

    #[error("Configuration error: {0}")]
    Configuration(String),
}

/// Storage for the journal's object graph.
///
/// Every write is all-or-nothing: when a method returns an error nothing it
/// was asked to change has been stored.
#[async_trait]
pub trait JournalRepository: Send + Sync {
    // Appointments
    async fn list_appointments(&self) -> Result<Vec<Appointment>, RepositoryError>;

    async fn insert_appointment(
        &self,
        appointment: &Appointment,
    ) -> Result<(), RepositoryError>;

    /// Insert every listed appointment in one transaction. Fails (and
    /// inserts nothing) if any of them cannot be stored.
    async fn insert_appointments(
        &self,
        appointments: &[Appointment],
    ) -> Result<(), RepositoryError>;

    async fn update_appointment(
        &self,
        appointment: &Appointment,
    ) -> Result<(), RepositoryError>;

    /// Delete every listed appointment in one transaction. Fails with
    /// `NotFound` (and deletes nothing) if any id is unknown.
    async fn delete_appointments(
        &self,
        ids: &[AppointmentId],
    ) -> Result<(), RepositoryError>;

    // Artists
    async fn list_artists(&self) -> Result<Vec<Artist>, RepositoryError>;

    /// `Conflict` when the name or handle is already taken.
    async fn insert_artist(
        &self,
        artist: &Artist,
    ) -> Result<(), RepositoryError>;

    /// Removes the artist and clears `artist` on its appointments.
    async fn delete_artist(
        &self,
        id: ArtistId,
    ) -> Result<(), RepositoryError>;

    // Shops
    async fn list_shops(&self) -> Result<Vec<Shop>, RepositoryError>;

    /// `Conflict` when the name is already taken.
    async fn insert_shop(
        &self,
        shop: &Shop,
    ) -> Result<(), RepositoryError>;

    /// Removes the shop and clears `shop` on its appointments.
    async fn delete_shop(
        &self,
        id: ShopId,
    ) -> Result<(), RepositoryError>;

    // Preferences
    async fn get_preferences(&self) -> Result<Option<UserPreferences>, RepositoryError>;

    async fn save_preferences(
        &self,
        preferences: &UserPreferences,
    ) -> Result<(), RepositoryError>;
}

/// Fetch the preferences record, creating it with defaults on first use.
pub async fn load_or_init_preferences(
    repository: &dyn JournalRepository
) -> Result<UserPreferences, RepositoryError> {
    if let Some(preferences) = repository.get_preferences().await? {
        return Ok(preferences);
    }

    let preferences = UserPreferences::default();
    repository.save_preferences(&preferences).await?;
    tracing::info!(
        currency = preferences.currency.as_str(),
        tip = preferences.tip.percent(),
        "created default preferences"
    );
    Ok(preferences)
}
