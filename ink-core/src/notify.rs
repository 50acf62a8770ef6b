//! Reminder hooks.
//!
//! The collection calls a [`Notifier`] after it has committed a change.
//! Implementations hand the request to whatever delivers reminders and
//! return straight away; a failure is logged by the caller and never undoes
//! the change that triggered it.

use chrono::{DateTime, Duration, Utc};
use thiserror::Error;

use crate::models::{Appointment, AppointmentId};

/// When a reminder should fire for an appointment.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScheduleHint {
    pub remind_at: DateTime<Utc>,
    pub lead: Duration,
}

impl ScheduleHint {
    pub const DEFAULT_LEAD_HOURS: i64 = 24;

    /// `lead` before the appointment starts, or `None` when that instant
    /// falls outside the representable date range.
    pub fn before(
        appointment: &Appointment,
        lead: Duration,
    ) -> Option<Self> {
        let remind_at = appointment.date.checked_sub_signed(lead)?;
        Some(Self { remind_at, lead })
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum NotifyError {
    #[error("notifications are not permitted")]
    PermissionDenied,

    #[error("notification backend failed: {0}")]
    Backend(String),
}

pub trait Notifier: Send + Sync {
    fn schedule(
        &self,
        appointment: &Appointment,
        hint: ScheduleHint,
    ) -> Result<(), NotifyError>;

    fn cancel(
        &self,
        id: AppointmentId,
    ) -> Result<(), NotifyError>;
}

/// Drops every request. For callers that have no reminder channel.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopNotifier;

impl Notifier for NoopNotifier {
    fn schedule(
        &self,
        _appointment: &Appointment,
        _hint: ScheduleHint,
    ) -> Result<(), NotifyError> {
        Ok(())
    }

    fn cancel(
        &self,
        _id: AppointmentId,
    ) -> Result<(), NotifyError> {
        Ok(())
    }
}
