//! CSV import and export of appointments.
//!
//! ## CSV Format
//!
//! Headers are matched by name, so column order does not matter. Header
//! names are case-sensitive.
//!
//! | Column     | Required | Notes                                                |
//! |------------|----------|------------------------------------------------------|
//! | `date`     | yes      | RFC 3339, `YYYY-MM-DD HH:MM` (local) or `YYYY-MM-DD` |
//! | `price`    | yes      | Non-negative decimal, commas allowed: `1,200.00`     |
//! | `design`   | yes      |                                                      |
//! | `location` | no       | Body part code (`arm`, `back`, ...); empty = `other` |
//! | `notify`   | no       | `true`/`false`; empty = `false`                      |
//! | `artist`   | no       | Name or id of an artist already in the journal       |
//! | `shop`     | no       | Name or id of a shop already in the journal          |
//! | `rating`   | no       | 1-5. Required when `comment` is set                  |
//! | `comment`  | no       |                                                      |
//! | `photo`    | no       | Opaque photo reference                               |
//!
//! ### Minimal example
//!
//! ```csv
//! date,price,design
//! 2026-05-02 14:00,180,swallow
//! ```
//!
//! Export writes every column, with dates in RFC 3339 and references by
//! name, so an exported file imports back unchanged.

use std::io::{Read, Write};
use std::path::Path;

use ink_core::{Appointment, Artist, NewAppointment, Shop};
use serde::{Deserialize, Serialize};

use crate::form::{AppointmentForm, InvalidForm};

#[derive(Debug, Deserialize)]
struct CsvRow {
    date: String,
    price: String,
    design: String,
    #[serde(default)]
    location: String,
    #[serde(default)]
    notify: Option<bool>,
    #[serde(default)]
    artist: String,
    #[serde(default)]
    shop: String,
    #[serde(default)]
    rating: String,
    #[serde(default)]
    comment: String,
    #[serde(default)]
    photo: String,
}

impl From<CsvRow> for AppointmentForm {
    fn from(row: CsvRow) -> Self {
        Self {
            date: row.date,
            price: row.price,
            design: row.design,
            location: row.location,
            notify: row.notify.unwrap_or(false),
            artist: row.artist,
            shop: row.shop,
            rating: row.rating,
            comment: row.comment,
            photo: row.photo,
        }
    }
}

#[derive(Debug, Serialize)]
struct ExportRow<'a> {
    date: String,
    price: &'a str,
    design: &'a str,
    location: &'a str,
    notify: bool,
    artist: &'a str,
    shop: &'a str,
    rating: Option<u8>,
    comment: &'a str,
    photo: &'a str,
}

/// Errors that can occur while importing or exporting CSV data.
#[derive(Debug, thiserror::Error)]
pub enum CsvError {
    #[error("cannot access '{path}': {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    /// Bad structure, missing required column, or an unreadable cell.
    #[error("CSV parse error: {0}")]
    Parse(#[from] csv::Error),

    /// `row` is 1-based, header excluded.
    #[error("row {row}: {errors}")]
    InvalidRow { row: usize, errors: InvalidForm },
}

/// Read appointments from CSV. Rows come back in file order; the first bad
/// row aborts the whole import. Nothing is stored here: callers persist the
/// result in one batch.
pub fn read_appointments<R: Read>(
    input: R,
    artists: &[Artist],
    shops: &[Shop],
) -> Result<Vec<NewAppointment>, CsvError> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .trim(csv::Trim::All)
        .flexible(false)
        .from_reader(input);

    reader
        .deserialize::<CsvRow>()
        .enumerate()
        .map(|(idx, result)| {
            let form = AppointmentForm::from(result?);
            form.validate(artists, shops)
                .map_err(|errors| CsvError::InvalidRow {
                    row: idx + 1,
                    errors,
                })
        })
        .collect()
}

pub fn load_from_file(
    path: &Path,
    artists: &[Artist],
    shops: &[Shop],
) -> Result<Vec<NewAppointment>, CsvError> {
    let file = std::fs::File::open(path).map_err(|source| CsvError::Io {
        path: path.display().to_string(),
        source,
    })?;
    read_appointments(file, artists, shops)
}

/// Write `appointments` as CSV, naming artists and shops rather than using
/// their ids.
pub fn write_appointments<'a, W, I>(
    output: W,
    appointments: I,
    artists: &[Artist],
    shops: &[Shop],
) -> Result<usize, CsvError>
where
    W: Write,
    I: IntoIterator<Item = &'a Appointment>,
{
    let mut writer = csv::Writer::from_writer(output);
    let mut count = 0;

    for appointment in appointments {
        let artist = appointment
            .artist
            .and_then(|id| artists.iter().find(|a| a.id == id))
            .map(|a| a.name.as_str())
            .unwrap_or_default();
        let shop = appointment
            .shop
            .and_then(|id| shops.iter().find(|s| s.id == id))
            .map(|s| s.name.as_str())
            .unwrap_or_default();

        writer.serialize(ExportRow {
            date: appointment.date.to_rfc3339(),
            price: appointment.price.as_str(),
            design: &appointment.design,
            location: appointment.location.as_str(),
            notify: appointment.notify,
            artist,
            shop,
            rating: appointment.review.as_ref().map(|r| r.rating.value()),
            comment: appointment
                .review
                .as_ref()
                .and_then(|r| r.comment.as_deref())
                .unwrap_or_default(),
            photo: appointment
                .photo
                .as_ref()
                .map(|p| p.as_str())
                .unwrap_or_default(),
        })?;
        count += 1;
    }

    writer.flush().map_err(csv::Error::from)?;
    Ok(count)
}

pub fn save_to_file<'a, I>(
    path: &Path,
    appointments: I,
    artists: &[Artist],
    shops: &[Shop],
) -> Result<usize, CsvError>
where
    I: IntoIterator<Item = &'a Appointment>,
{
    let file = std::fs::File::create(path).map_err(|source| CsvError::Io {
        path: path.display().to_string(),
        source,
    })?;
    write_appointments(file, appointments, artists, shops)
}
