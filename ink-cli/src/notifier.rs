use chrono::Utc;
use ink_core::{Appointment, AppointmentId, Notifier, NotifyError, ScheduleHint};
use tracing::{debug, info};

/// Reminder delivery for the terminal: records each request in the log.
#[derive(Debug, Default)]
pub struct LogNotifier;

impl Notifier for LogNotifier {
    fn schedule(
        &self,
        appointment: &Appointment,
        hint: ScheduleHint,
    ) -> Result<(), NotifyError> {
        if hint.remind_at <= Utc::now() {
            debug!(id = %appointment.id, remind_at = %hint.remind_at, "reminder time already passed");
            return Ok(());
        }
        info!(
            id = %appointment.id,
            design = %appointment.design,
            remind_at = %hint.remind_at,
            "reminder scheduled"
        );
        Ok(())
    }

    fn cancel(
        &self,
        id: AppointmentId,
    ) -> Result<(), NotifyError> {
        info!(%id, "reminder cancelled");
        Ok(())
    }
}
