//! Derived views over the appointment set.
//!
//! Every function takes the caller's `now` explicitly. An appointment dated
//! exactly `now` is in neither [`upcoming`] nor [`history`].

use std::collections::BTreeSet;

use chrono::{DateTime, Utc};
use thiserror::Error;
use tracing::debug;

use crate::models::{Appointment, AppointmentId, ArtistId, ShopId};

/// A projection the presentation layer renders as a list.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum View {
    Upcoming,
    History,
}

impl View {
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "upcoming" => Some(Self::Upcoming),
            "history" | "past" => Some(Self::History),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("row {index} is out of range for a view of {len} appointments")]
pub struct IndexOutOfRange {
    pub index: usize,
    pub len: usize,
}

/// Dated after `now`, earliest first. Ties keep input order.
pub fn upcoming<'a>(
    appointments: &'a [Appointment],
    now: DateTime<Utc>,
) -> Vec<&'a Appointment> {
    let mut view: Vec<_> = appointments.iter().filter(|a| a.date > now).collect();
    view.sort_by_key(|a| a.date);
    view
}

/// Dated before `now`, most recent first. Ties keep input order.
pub fn history<'a>(
    appointments: &'a [Appointment],
    now: DateTime<Utc>,
) -> Vec<&'a Appointment> {
    let mut view: Vec<_> = appointments.iter().filter(|a| a.date < now).collect();
    view.sort_by(|a, b| b.date.cmp(&a.date));
    view
}

/// Same as [`history`].
pub fn past<'a>(
    appointments: &'a [Appointment],
    now: DateTime<Utc>,
) -> Vec<&'a Appointment> {
    history(appointments, now)
}

/// The earliest appointment after `now`, found in one pass.
/// On equal dates the first in input order wins.
pub fn next(
    appointments: &[Appointment],
    now: DateTime<Utc>,
) -> Option<&Appointment> {
    let mut earliest: Option<&Appointment> = None;
    for appointment in appointments {
        if appointment.date <= now {
            continue;
        }
        match earliest {
            Some(current) if current.date <= appointment.date => {}
            _ => earliest = Some(appointment),
        }
    }
    earliest
}

pub fn materialize<'a>(
    view: View,
    appointments: &'a [Appointment],
    now: DateTime<Utc>,
) -> Vec<&'a Appointment> {
    match view {
        View::Upcoming => upcoming(appointments, now),
        View::History => history(appointments, now),
    }
}

/// Map row positions in `view` back to identities.
///
/// The view is rebuilt here exactly as [`materialize`] renders it, so the
/// positions must come from a rendering against the same `now`. Duplicate
/// positions collapse. Any position past the end fails the whole lookup.
pub fn resolve_visible_indices<I>(
    view: View,
    appointments: &[Appointment],
    now: DateTime<Utc>,
    indices: I,
) -> Result<Vec<AppointmentId>, IndexOutOfRange>
where
    I: IntoIterator<Item = usize>,
{
    let rows = materialize(view, appointments, now);
    let indices: BTreeSet<usize> = indices.into_iter().collect();
    debug!(?view, rows = rows.len(), ?indices, "resolving visible rows");

    indices
        .into_iter()
        .map(|index| {
            rows.get(index).map(|a| a.id).ok_or(IndexOutOfRange {
                index,
                len: rows.len(),
            })
        })
        .collect()
}

pub fn by_artist(
    appointments: &[Appointment],
    artist: ArtistId,
) -> Vec<&Appointment> {
    appointments
        .iter()
        .filter(|a| a.artist == Some(artist))
        .collect()
}

pub fn by_shop(
    appointments: &[Appointment],
    shop: ShopId,
) -> Vec<&Appointment> {
    appointments
        .iter()
        .filter(|a| a.shop == Some(shop))
        .collect()
}
