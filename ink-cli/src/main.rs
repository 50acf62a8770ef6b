use std::io;

use anyhow::Context;
use chrono::Utc;
use clap::Parser;
use tracing::{debug, warn};

use ink_cli::cli::Cli;
use ink_cli::config::Config;
use ink_cli::notifier::LogNotifier;
use ink_cli::{build_registry, commands, logging};
use ink_core::AppointmentCollection;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    logging::init_default_logging();
    if cli.quiet {
        logging::set_console_enabled(false)?;
    }

    let config = Config::load(&cli.config)?.with_overrides(cli.backend, cli.db);
    if std::env::var_os("RUST_LOG").is_none() {
        logging::set_log_level(&config.logging.level)?;
    }
    if let Some(path) = &config.logging.file {
        if let Err(error) = logging::enable_file_logging(path) {
            warn!(%error, "continuing without a log file");
        }
    }

    debug!(backend = %config.database.backend, "opening journal");
    let registry = build_registry();
    let repository = registry
        .create(&config.database)
        .await
        .with_context(|| format!("cannot open '{}'", config.database.connection_string))?;

    let lead = config.reminders.lead()?;
    let mut collection = AppointmentCollection::load(repository, Box::new(LogNotifier))
        .await?
        .with_reminder_lead(lead);

    let mut out = io::stdout().lock();
    commands::execute(cli.command, &mut collection, Utc::now(), &mut out).await
}
