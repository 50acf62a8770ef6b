use std::sync::{Mutex, MutexGuard};

use async_trait::async_trait;

use super::factory::{DbConfig, RepositoryFactory};
use super::repository::{JournalRepository, RepositoryError};
use crate::models::{
    Appointment, AppointmentId, Artist, ArtistId, Shop, ShopId, UserPreferences,
};

#[derive(Debug, Default)]
struct Store {
    appointments: Vec<Appointment>,
    artists: Vec<Artist>,
    shops: Vec<Shop>,
    preferences: Option<UserPreferences>,
}

/// Process-local repository. Nothing survives the process; used for
/// `--backend memory` and throughout the tests.
#[derive(Debug, Default)]
pub struct MemoryRepository {
    store: Mutex<Store>,
}

impl MemoryRepository {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> Result<MutexGuard<'_, Store>, RepositoryError> {
        self.store
            .lock()
            .map_err(|e| RepositoryError::Database(format!("store lock poisoned: {e}")))
    }
}

#[async_trait]
impl JournalRepository for MemoryRepository {
    async fn list_appointments(&self) -> Result<Vec<Appointment>, RepositoryError> {
        Ok(self.lock()?.appointments.clone())
    }

    async fn insert_appointment(
        &self,
        appointment: &Appointment,
    ) -> Result<(), RepositoryError> {
        let mut store = self.lock()?;
        if store.appointments.iter().any(|a| a.id == appointment.id) {
            return Err(RepositoryError::Conflict(format!(
                "appointment {} already exists",
                appointment.id
            )));
        }
        store.appointments.push(appointment.clone());
        Ok(())
    }

    async fn insert_appointments(
        &self,
        appointments: &[Appointment],
    ) -> Result<(), RepositoryError> {
        let mut store = self.lock()?;
        for (position, appointment) in appointments.iter().enumerate() {
            let taken = store.appointments.iter().any(|a| a.id == appointment.id)
                || appointments[..position].iter().any(|a| a.id == appointment.id);
            if taken {
                return Err(RepositoryError::Conflict(format!(
                    "appointment {} already exists",
                    appointment.id
                )));
            }
        }
        store.appointments.extend_from_slice(appointments);
        Ok(())
    }

    async fn update_appointment(
        &self,
        appointment: &Appointment,
    ) -> Result<(), RepositoryError> {
        let mut store = self.lock()?;
        let slot = store
            .appointments
            .iter_mut()
            .find(|a| a.id == appointment.id)
            .ok_or(RepositoryError::NotFound)?;
        *slot = appointment.clone();
        Ok(())
    }

    async fn delete_appointments(
        &self,
        ids: &[AppointmentId],
    ) -> Result<(), RepositoryError> {
        let mut store = self.lock()?;
        if !ids
            .iter()
            .all(|id| store.appointments.iter().any(|a| a.id == *id))
        {
            return Err(RepositoryError::NotFound);
        }
        store.appointments.retain(|a| !ids.contains(&a.id));
        Ok(())
    }

    async fn list_artists(&self) -> Result<Vec<Artist>, RepositoryError> {
        Ok(self.lock()?.artists.clone())
    }

    async fn insert_artist(
        &self,
        artist: &Artist,
    ) -> Result<(), RepositoryError> {
        let mut store = self.lock()?;
        if store.artists.iter().any(|a| a.name == artist.name) {
            return Err(RepositoryError::Conflict(format!(
                "artist name '{}' is taken",
                artist.name
            )));
        }
        if let Some(handle) = &artist.handle {
            if store
                .artists
                .iter()
                .any(|a| a.handle.as_ref() == Some(handle))
            {
                return Err(RepositoryError::Conflict(format!(
                    "artist handle '{handle}' is taken"
                )));
            }
        }
        store.artists.push(artist.clone());
        Ok(())
    }

    async fn delete_artist(
        &self,
        id: ArtistId,
    ) -> Result<(), RepositoryError> {
        let mut store = self.lock()?;
        let before = store.artists.len();
        store.artists.retain(|a| a.id != id);
        if store.artists.len() == before {
            return Err(RepositoryError::NotFound);
        }
        for appointment in store.appointments.iter_mut() {
            if appointment.artist == Some(id) {
                appointment.artist = None;
            }
        }
        Ok(())
    }

    async fn list_shops(&self) -> Result<Vec<Shop>, RepositoryError> {
        Ok(self.lock()?.shops.clone())
    }

    async fn insert_shop(
        &self,
        shop: &Shop,
    ) -> Result<(), RepositoryError> {
        let mut store = self.lock()?;
        if store.shops.iter().any(|s| s.name == shop.name) {
            return Err(RepositoryError::Conflict(format!(
                "shop name '{}' is taken",
                shop.name
            )));
        }
        store.shops.push(shop.clone());
        Ok(())
    }

    async fn delete_shop(
        &self,
        id: ShopId,
    ) -> Result<(), RepositoryError> {
        let mut store = self.lock()?;
        let before = store.shops.len();
        store.shops.retain(|s| s.id != id);
        if store.shops.len() == before {
            return Err(RepositoryError::NotFound);
        }
        for appointment in store.appointments.iter_mut() {
            if appointment.shop == Some(id) {
                appointment.shop = None;
            }
        }
        Ok(())
    }

    async fn get_preferences(&self) -> Result<Option<UserPreferences>, RepositoryError> {
        Ok(self.lock()?.preferences)
    }

    async fn save_preferences(
        &self,
        preferences: &UserPreferences,
    ) -> Result<(), RepositoryError> {
        self.lock()?.preferences = Some(*preferences);
        Ok(())
    }
}

/// [`RepositoryFactory`] for the `"memory"` backend. The connection string is ignored.
pub struct MemoryRepositoryFactory;

#[async_trait]
impl RepositoryFactory for MemoryRepositoryFactory {
    fn backend_name(&self) -> &'static str {
        "memory"
    }

    async fn create(
        &self,
        _config: &DbConfig,
    ) -> Result<Box<dyn JournalRepository>, RepositoryError> {
        Ok(Box::new(MemoryRepository::new()))
    }
}
