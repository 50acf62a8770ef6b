//! The appointment collection: the journal's single source of appointments.
//!
//! Mutations are committed to the [`JournalRepository`] first and only then
//! applied to the in-memory list, so a storage failure leaves both sides as
//! they were. Reads never touch storage.

pub mod events;
pub mod query;

use std::collections::HashSet;

use chrono::{DateTime, Duration, Utc};
use rust_decimal::Decimal;
use thiserror::Error;
use tokio::sync::broadcast;
use tracing::{debug, info, warn};

pub use events::{CollectionEvent, EventBus};
pub use query::{IndexOutOfRange, View};

use crate::calculations::total_cost;
use crate::db::{JournalRepository, RepositoryError};
use crate::models::{Appointment, AppointmentId, ArtistId, ShopId, ValidationError};
use crate::notify::{Notifier, ScheduleHint};

#[derive(Debug, Error, PartialEq)]
pub enum CollectionError {
    #[error("appointment {0} not found")]
    NotFound(AppointmentId),

    #[error("appointment {0} already exists")]
    DuplicateIdentifier(AppointmentId),

    #[error(transparent)]
    InvalidIndex(#[from] IndexOutOfRange),

    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error("persistence failed: {0}")]
    Persistence(#[from] RepositoryError),
}

pub struct AppointmentCollection {
    appointments: Vec<Appointment>,
    repository: Box<dyn JournalRepository>,
    notifier: Box<dyn Notifier>,
    reminder_lead: Duration,
    events: EventBus,
}

impl AppointmentCollection {
    /// Load every stored appointment.
    pub async fn load(
        repository: Box<dyn JournalRepository>,
        notifier: Box<dyn Notifier>,
    ) -> Result<Self, CollectionError> {
        let appointments = repository.list_appointments().await?;
        debug!(count = appointments.len(), "loaded appointments");
        Ok(Self {
            appointments,
            repository,
            notifier,
            reminder_lead: Duration::hours(ScheduleHint::DEFAULT_LEAD_HOURS),
            events: EventBus::default(),
        })
    }

    /// How long before an appointment its reminder fires.
    pub fn with_reminder_lead(
        mut self,
        lead: Duration,
    ) -> Self {
        self.reminder_lead = lead;
        self
    }

    pub fn repository(&self) -> &dyn JournalRepository {
        self.repository.as_ref()
    }

    pub fn subscribe(&self) -> broadcast::Receiver<CollectionEvent> {
        self.events.subscribe()
    }

    // ── reads ───────────────────────────────────────────────────────────

    /// Storage order.
    pub fn all(&self) -> &[Appointment] {
        &self.appointments
    }

    pub fn len(&self) -> usize {
        self.appointments.len()
    }

    pub fn is_empty(&self) -> bool {
        self.appointments.is_empty()
    }

    pub fn get(
        &self,
        id: AppointmentId,
    ) -> Option<&Appointment> {
        self.appointments.iter().find(|a| a.id == id)
    }

    pub fn upcoming(
        &self,
        now: DateTime<Utc>,
    ) -> Vec<&Appointment> {
        query::upcoming(&self.appointments, now)
    }

    pub fn history(
        &self,
        now: DateTime<Utc>,
    ) -> Vec<&Appointment> {
        query::history(&self.appointments, now)
    }

    pub fn next(
        &self,
        now: DateTime<Utc>,
    ) -> Option<&Appointment> {
        query::next(&self.appointments, now)
    }

    pub fn view(
        &self,
        view: View,
        now: DateTime<Utc>,
    ) -> Vec<&Appointment> {
        query::materialize(view, &self.appointments, now)
    }

    pub fn by_artist(
        &self,
        artist: ArtistId,
    ) -> Vec<&Appointment> {
        query::by_artist(&self.appointments, artist)
    }

    pub fn by_shop(
        &self,
        shop: ShopId,
    ) -> Vec<&Appointment> {
        query::by_shop(&self.appointments, shop)
    }

    /// Spend across every appointment, tip included.
    pub fn total_cost(
        &self,
        tip_percent: u32,
    ) -> Decimal {
        total_cost(&self.appointments, tip_percent)
    }

    // ── mutations ───────────────────────────────────────────────────────

    pub async fn add(
        &mut self,
        appointment: Appointment,
    ) -> Result<(), CollectionError> {
        if self.get(appointment.id).is_some() {
            return Err(CollectionError::DuplicateIdentifier(appointment.id));
        }

        self.repository.insert_appointment(&appointment).await?;
        info!(id = %appointment.id, date = %appointment.date, "appointment added");

        if appointment.notify {
            self.schedule_reminder(&appointment);
        }
        let id = appointment.id;
        self.appointments.push(appointment);
        self.events.emit(CollectionEvent::Added(id));
        Ok(())
    }

    /// Add several appointments at once. Either all of them are stored or,
    /// on any failure, none are.
    pub async fn add_all(
        &mut self,
        appointments: Vec<Appointment>,
    ) -> Result<(), CollectionError> {
        let mut seen = HashSet::new();
        for appointment in &appointments {
            if self.get(appointment.id).is_some() || !seen.insert(appointment.id) {
                return Err(CollectionError::DuplicateIdentifier(appointment.id));
            }
        }
        if appointments.is_empty() {
            return Ok(());
        }

        self.repository.insert_appointments(&appointments).await?;
        info!(count = appointments.len(), "appointments added");

        for appointment in appointments {
            if appointment.notify {
                self.schedule_reminder(&appointment);
            }
            let id = appointment.id;
            self.appointments.push(appointment);
            self.events.emit(CollectionEvent::Added(id));
        }
        Ok(())
    }

    /// Replace the stored record that has the same id.
    pub async fn edit(
        &mut self,
        appointment: Appointment,
    ) -> Result<(), CollectionError> {
        let position = self
            .position(appointment.id)
            .ok_or(CollectionError::NotFound(appointment.id))?;

        self.repository.update_appointment(&appointment).await?;
        info!(id = %appointment.id, "appointment edited");

        let was_notifying = self.appointments[position].notify;
        if appointment.notify {
            self.schedule_reminder(&appointment);
        } else if was_notifying {
            self.cancel_reminder(appointment.id);
        }
        let id = appointment.id;
        self.appointments[position] = appointment;
        self.events.emit(CollectionEvent::Edited(id));
        Ok(())
    }

    pub async fn delete(
        &mut self,
        id: AppointmentId,
    ) -> Result<(), CollectionError> {
        self.delete_many(vec![id]).await
    }

    /// Delete the rows at `indices` of `view` as rendered against `now`.
    ///
    /// Either every resolved appointment is deleted or none is.
    pub async fn delete_by_visible_index<I>(
        &mut self,
        view: View,
        now: DateTime<Utc>,
        indices: I,
    ) -> Result<Vec<AppointmentId>, CollectionError>
    where
        I: IntoIterator<Item = usize>,
    {
        let ids = query::resolve_visible_indices(view, &self.appointments, now, indices)?;
        self.delete_many(ids.clone()).await?;
        Ok(ids)
    }

    /// Delete an artist and detach it from its appointments. The
    /// appointments themselves stay.
    pub async fn remove_artist(
        &mut self,
        artist: ArtistId,
    ) -> Result<Vec<AppointmentId>, CollectionError> {
        self.repository.delete_artist(artist).await?;

        let mut detached = Vec::new();
        for appointment in self.appointments.iter_mut() {
            if appointment.artist == Some(artist) {
                appointment.artist = None;
                detached.push(appointment.id);
            }
        }
        info!(%artist, detached = detached.len(), "artist removed");
        self.events.emit(CollectionEvent::ArtistRemoved {
            artist,
            detached: detached.clone(),
        });
        Ok(detached)
    }

    /// Delete a shop and detach it from its appointments.
    pub async fn remove_shop(
        &mut self,
        shop: ShopId,
    ) -> Result<Vec<AppointmentId>, CollectionError> {
        self.repository.delete_shop(shop).await?;

        let mut detached = Vec::new();
        for appointment in self.appointments.iter_mut() {
            if appointment.shop == Some(shop) {
                appointment.shop = None;
                detached.push(appointment.id);
            }
        }
        info!(%shop, detached = detached.len(), "shop removed");
        self.events.emit(CollectionEvent::ShopRemoved {
            shop,
            detached: detached.clone(),
        });
        Ok(detached)
    }

    // ── internals ───────────────────────────────────────────────────────

    fn position(
        &self,
        id: AppointmentId,
    ) -> Option<usize> {
        self.appointments.iter().position(|a| a.id == id)
    }

    async fn delete_many(
        &mut self,
        ids: Vec<AppointmentId>,
    ) -> Result<(), CollectionError> {
        if let Some(missing) = ids.iter().find(|id| self.get(**id).is_none()) {
            return Err(CollectionError::NotFound(*missing));
        }
        if ids.is_empty() {
            return Ok(());
        }

        for id in &ids {
            self.cancel_reminder(*id);
        }
        self.repository.delete_appointments(&ids).await?;

        let doomed: HashSet<AppointmentId> = ids.iter().copied().collect();
        self.appointments.retain(|a| !doomed.contains(&a.id));
        info!(count = ids.len(), "appointments deleted");
        self.events.emit(CollectionEvent::Deleted(ids));
        Ok(())
    }

    fn schedule_reminder(
        &self,
        appointment: &Appointment,
    ) {
        let Some(hint) = ScheduleHint::before(appointment, self.reminder_lead) else {
            warn!(id = %appointment.id, "reminder time out of range, not scheduled");
            return;
        };
        if let Err(error) = self.notifier.schedule(appointment, hint) {
            warn!(id = %appointment.id, %error, "could not schedule reminder");
        }
    }

    fn cancel_reminder(
        &self,
        id: AppointmentId,
    ) {
        if let Err(error) = self.notifier.cancel(id) {
            warn!(%id, %error, "could not cancel reminder");
        }
    }
}
