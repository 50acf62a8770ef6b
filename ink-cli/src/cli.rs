use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};
use ink_core::{AppointmentId, ArtistId, ShopId, View};

use crate::config::DEFAULT_CONFIG_FILE;

/// Tattoo appointment journal.
///
/// Keeps upcoming sessions and past work in one place, sends reminders, and
/// totals what you have spent.
#[derive(Debug, Parser)]
#[command(name = "inkbook", version)]
pub struct Cli {
    /// Configuration file. Missing is fine; defaults apply.
    #[arg(long, global = true, default_value = DEFAULT_CONFIG_FILE)]
    pub config: PathBuf,

    /// Storage backend, overriding the config file (`sqlite` or `memory`).
    #[arg(long, global = true)]
    pub backend: Option<String>,

    /// Connection string, overriding the config file. For SQLite this is a
    /// file path (e.g. `inkbook.db`) or `:memory:`.
    #[arg(long, global = true)]
    pub db: Option<String>,

    /// Hide log output on stderr. File logging is unaffected.
    #[arg(short, long, global = true)]
    pub quiet: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Record a new appointment.
    Add(AddArgs),

    /// Change fields of an existing appointment.
    Edit(EditArgs),

    /// Delete one appointment by id.
    Delete { id: AppointmentId },

    /// Delete rows by their position in a listing, as `upcoming` or
    /// `history` print them right now.
    DeleteIndex {
        #[arg(value_parser = parse_view)]
        view: View,
        #[arg(required = true)]
        indices: Vec<usize>,
    },

    /// Future appointments, soonest first.
    Upcoming,

    /// Past appointments, most recent first.
    History,

    /// The next appointment.
    Next,

    /// Total spend with tip, in the preferred currency.
    Cost {
        /// Only this artist's appointments (name or id).
        #[arg(long)]
        artist: Option<String>,
    },

    /// Show or change currency and tip.
    #[command(subcommand)]
    Prefs(PrefsCommand),

    /// Manage artists.
    #[command(subcommand)]
    Artist(ArtistCommand),

    /// Manage shops.
    #[command(subcommand)]
    Shop(ShopCommand),

    /// Add every appointment in a CSV file.
    Import { path: PathBuf },

    /// Write all appointments to a CSV file.
    Export { path: PathBuf },
}

#[derive(Debug, Args)]
pub struct AddArgs {
    /// RFC 3339, `YYYY-MM-DD HH:MM` (local time) or `YYYY-MM-DD`.
    #[arg(long)]
    pub date: String,

    /// e.g. `180` or `1,200.50`.
    #[arg(long)]
    pub price: String,

    #[arg(long)]
    pub design: String,

    /// Body part; defaults to `other`.
    #[arg(long, default_value = "")]
    pub location: String,

    /// Schedule a reminder.
    #[arg(long)]
    pub notify: bool,

    /// Artist name or id.
    #[arg(long, default_value = "")]
    pub artist: String,

    /// Shop name or id.
    #[arg(long, default_value = "")]
    pub shop: String,

    /// 1-5.
    #[arg(long, default_value = "")]
    pub rating: String,

    #[arg(long, default_value = "")]
    pub comment: String,

    #[arg(long, default_value = "")]
    pub photo: String,
}

/// Unset flags keep the stored value. Pass an empty string to clear an
/// optional field.
#[derive(Debug, Args)]
pub struct EditArgs {
    pub id: AppointmentId,

    #[arg(long)]
    pub date: Option<String>,

    #[arg(long)]
    pub price: Option<String>,

    #[arg(long)]
    pub design: Option<String>,

    #[arg(long)]
    pub location: Option<String>,

    #[arg(long)]
    pub notify: Option<bool>,

    #[arg(long)]
    pub artist: Option<String>,

    #[arg(long)]
    pub shop: Option<String>,

    #[arg(long)]
    pub rating: Option<String>,

    #[arg(long)]
    pub comment: Option<String>,

    #[arg(long)]
    pub photo: Option<String>,
}

#[derive(Debug, Subcommand)]
pub enum PrefsCommand {
    Show,
    Set {
        /// `GBP`, `EUR`, `USD`, or the symbol.
        #[arg(long)]
        currency: Option<String>,

        /// 10, 20, 30 or 40 (a trailing `%` is fine).
        #[arg(long)]
        tip: Option<String>,
    },
}

#[derive(Debug, Subcommand)]
pub enum ArtistCommand {
    Add {
        name: String,
        /// Social handle, with or without the `@`.
        #[arg(long)]
        handle: Option<String>,
    },
    List,
    /// Remove an artist. Their appointments are kept.
    Remove { id: ArtistId },
}

#[derive(Debug, Subcommand)]
pub enum ShopCommand {
    Add {
        name: String,
        #[arg(long, requires = "longitude", allow_hyphen_values = true)]
        latitude: Option<f64>,
        #[arg(long, requires = "latitude", allow_hyphen_values = true)]
        longitude: Option<f64>,
    },
    List,
    /// Remove a shop. Its appointments are kept.
    Remove { id: ShopId },
}

fn parse_view(s: &str) -> Result<View, String> {
    View::parse(s).ok_or_else(|| format!("unknown view '{s}': expected 'upcoming' or 'history'"))
}
