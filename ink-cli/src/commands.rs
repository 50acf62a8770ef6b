//! Command handlers. Each takes the loaded collection, runs one command,
//! and writes its human-readable result to `out`.

use std::io::Write;

use anyhow::{Context, Result, anyhow};
use chrono::{DateTime, Utc};
use ink_core::calculations::total_cost;
use ink_core::db::load_or_init_preferences;
use ink_core::{
    Appointment, AppointmentCollection, Artist, Coordinate, Currency, Shop, TipPercentage,
    UserPreferences, View,
};
use tracing::info;

use crate::cli::{AddArgs, ArtistCommand, Command, EditArgs, PrefsCommand, ShopCommand};
use crate::csv_io;
use crate::form::AppointmentForm;
use crate::utils::{format_local, format_money, opt_display};

pub async fn execute<W: Write>(
    command: Command,
    collection: &mut AppointmentCollection,
    now: DateTime<Utc>,
    out: &mut W,
) -> Result<()> {
    match command {
        Command::Add(args) => add(collection, args, out).await,
        Command::Edit(args) => edit(collection, args, out).await,
        Command::Delete { id } => {
            collection.delete(id).await?;
            writeln!(out, "Deleted {id}")?;
            Ok(())
        }
        Command::DeleteIndex { view, indices } => {
            let ids = collection
                .delete_by_visible_index(view, now, indices)
                .await?;
            for id in &ids {
                writeln!(out, "Deleted {id}")?;
            }
            Ok(())
        }
        Command::Upcoming => list(collection, View::Upcoming, now, out).await,
        Command::History => list(collection, View::History, now, out).await,
        Command::Next => next(collection, now, out).await,
        Command::Cost { artist } => cost(collection, artist.as_deref(), out).await,
        Command::Prefs(action) => prefs(collection, action, out).await,
        Command::Artist(action) => artist(collection, action, out).await,
        Command::Shop(action) => shop(collection, action, out).await,
        Command::Import { path } => {
            let (artists, shops) = references(collection).await?;
            let incoming = csv_io::load_from_file(&path, &artists, &shops)?;
            let total = incoming.len();
            let appointments = incoming
                .into_iter()
                .map(|new| new.into_appointment())
                .collect();
            collection.add_all(appointments).await?;
            info!(path = %path.display(), count = total, "imported appointments");
            writeln!(out, "Imported {total} appointments")?;
            Ok(())
        }
        Command::Export { path } => {
            let (artists, shops) = references(collection).await?;
            let count = csv_io::save_to_file(&path, collection.all(), &artists, &shops)?;
            writeln!(out, "Exported {count} appointments to {}", path.display())?;
            Ok(())
        }
    }
}

async fn references(collection: &AppointmentCollection) -> Result<(Vec<Artist>, Vec<Shop>)> {
    let repository = collection.repository();
    Ok((
        repository.list_artists().await?,
        repository.list_shops().await?,
    ))
}

async fn add<W: Write>(
    collection: &mut AppointmentCollection,
    args: AddArgs,
    out: &mut W,
) -> Result<()> {
    let form = AppointmentForm {
        date: args.date,
        price: args.price,
        design: args.design,
        location: args.location,
        notify: args.notify,
        artist: args.artist,
        shop: args.shop,
        rating: args.rating,
        comment: args.comment,
        photo: args.photo,
    };
    let (artists, shops) = references(collection).await?;
    let appointment = form.validate(&artists, &shops)?.into_appointment();
    let id = appointment.id;

    collection.add(appointment).await?;
    writeln!(out, "Added {id}")?;
    Ok(())
}

async fn edit<W: Write>(
    collection: &mut AppointmentCollection,
    args: EditArgs,
    out: &mut W,
) -> Result<()> {
    let existing = collection
        .get(args.id)
        .ok_or(ink_core::CollectionError::NotFound(args.id))?;

    let mut form = AppointmentForm::from_appointment(existing);
    let overlay = [
        (&mut form.date, args.date),
        (&mut form.price, args.price),
        (&mut form.design, args.design),
        (&mut form.location, args.location),
        (&mut form.artist, args.artist),
        (&mut form.shop, args.shop),
        (&mut form.rating, args.rating),
        (&mut form.comment, args.comment),
        (&mut form.photo, args.photo),
    ];
    for (field, value) in overlay {
        if let Some(value) = value {
            *field = value;
        }
    }
    if let Some(notify) = args.notify {
        form.notify = notify;
    }

    let (artists, shops) = references(collection).await?;
    let updated = form.validate(&artists, &shops)?.with_id(args.id);
    collection.edit(updated).await?;
    writeln!(out, "Updated {}", args.id)?;
    Ok(())
}

async fn list<W: Write>(
    collection: &AppointmentCollection,
    view: View,
    now: DateTime<Utc>,
    out: &mut W,
) -> Result<()> {
    let rows = collection.view(view, now);
    if rows.is_empty() {
        let label = match view {
            View::Upcoming => "No upcoming appointments",
            View::History => "No past appointments",
        };
        writeln!(out, "{label}")?;
        return Ok(());
    }

    let preferences = load_or_init_preferences(collection.repository()).await?;
    let (artists, _) = references(collection).await?;
    writeln!(
        out,
        "{:>3}  {:<16}  {:<24}  {:<9}  {:>10}  {:<16}  {}",
        "#", "DATE", "DESIGN", "LOCATION", "PRICE", "ARTIST", "ID"
    )?;
    for (index, appointment) in rows.into_iter().enumerate() {
        writeln!(
            out,
            "{:>3}  {}",
            index,
            render_row(appointment, &artists, preferences.currency)
        )?;
    }
    Ok(())
}

fn render_row(
    appointment: &Appointment,
    artists: &[Artist],
    currency: Currency,
) -> String {
    let artist = appointment
        .artist
        .and_then(|id| artists.iter().find(|a| a.id == id))
        .map(|a| a.name.as_str());
    let reminder = if appointment.notify { " *" } else { "" };
    format!(
        "{:<16}  {:<24}  {:<9}  {:>10}  {:<16}  {}{}",
        format_local(appointment.date),
        appointment.design,
        appointment.location.as_str(),
        format!("{}{}", currency.glyph(), appointment.price.as_str()),
        opt_display(artist),
        appointment.id,
        reminder,
    )
}

async fn next<W: Write>(
    collection: &AppointmentCollection,
    now: DateTime<Utc>,
    out: &mut W,
) -> Result<()> {
    let Some(appointment) = collection.next(now) else {
        writeln!(out, "No upcoming appointments")?;
        return Ok(());
    };

    let until = appointment.date - now;
    let days = until.num_days();
    let hours = until.num_hours() - days * 24;
    writeln!(
        out,
        "{} ({}) on {}, in {}d {}h",
        appointment.design,
        appointment.location,
        format_local(appointment.date),
        days,
        hours
    )?;
    Ok(())
}

async fn cost<W: Write>(
    collection: &AppointmentCollection,
    artist: Option<&str>,
    out: &mut W,
) -> Result<()> {
    let preferences = load_or_init_preferences(collection.repository()).await?;
    let tip = preferences.tip.percent();

    let total = match artist {
        None => collection.total_cost(tip),
        Some(needle) => {
            let (artists, _) = references(collection).await?;
            let artist = find_artist(&artists, needle)
                .ok_or_else(|| anyhow!("unknown artist '{needle}'"))?;
            total_cost(collection.by_artist(artist.id), tip)
        }
    };

    writeln!(
        out,
        "Total spent: {} (including {}% tip)",
        format_money(total, preferences.currency),
        tip
    )?;
    Ok(())
}

async fn prefs<W: Write>(
    collection: &AppointmentCollection,
    action: PrefsCommand,
    out: &mut W,
) -> Result<()> {
    let repository = collection.repository();
    let mut preferences = load_or_init_preferences(repository).await?;

    if let PrefsCommand::Set { currency, tip } = action {
        if let Some(code) = currency {
            preferences.currency = Currency::parse(&code)
                .ok_or_else(|| anyhow!("unknown currency '{code}': expected GBP, EUR or USD"))?;
        }
        if let Some(percent) = tip {
            preferences.tip = TipPercentage::parse(&percent)
                .ok_or_else(|| anyhow!("unsupported tip '{percent}': expected 10, 20, 30 or 40"))?;
        }
        repository.save_preferences(&preferences).await?;
        info!(
            currency = preferences.currency.as_str(),
            tip = preferences.tip.percent(),
            "preferences saved"
        );
    }

    write_preferences(&preferences, out)
}

fn write_preferences<W: Write>(
    preferences: &UserPreferences,
    out: &mut W,
) -> Result<()> {
    writeln!(
        out,
        "currency: {} ({})",
        preferences.currency.as_str(),
        preferences.currency.glyph()
    )?;
    writeln!(out, "tip:      {}%", preferences.tip.percent())?;
    Ok(())
}

async fn artist<W: Write>(
    collection: &mut AppointmentCollection,
    action: ArtistCommand,
    out: &mut W,
) -> Result<()> {
    match action {
        ArtistCommand::Add { name, handle } => {
            let artist = Artist::new(&name, handle.as_deref())?;
            collection.repository().insert_artist(&artist).await?;
            writeln!(out, "Added artist {} ({})", artist.name, artist.id)?;
        }
        ArtistCommand::List => {
            let artists = collection.repository().list_artists().await?;
            if artists.is_empty() {
                writeln!(out, "No artists")?;
            }
            for artist in artists {
                let handle = artist.handle.as_ref().map(|h| format!("@{h}"));
                let count = collection.by_artist(artist.id).len();
                writeln!(
                    out,
                    "{:<24}  {:<20}  {:>3} appointments  {}",
                    artist.name,
                    opt_display(handle.as_deref()),
                    count,
                    artist.id
                )?;
            }
        }
        ArtistCommand::Remove { id } => {
            let detached = collection
                .remove_artist(id)
                .await
                .with_context(|| format!("could not remove artist {id}"))?;
            writeln!(
                out,
                "Removed artist {id}; {} appointments kept without an artist",
                detached.len()
            )?;
        }
    }
    Ok(())
}

async fn shop<W: Write>(
    collection: &mut AppointmentCollection,
    action: ShopCommand,
    out: &mut W,
) -> Result<()> {
    match action {
        ShopCommand::Add {
            name,
            latitude,
            longitude,
        } => {
            let coordinate = Coordinate::from_parts(latitude, longitude)?;
            let shop = Shop::new(&name, coordinate)?;
            collection.repository().insert_shop(&shop).await?;
            writeln!(out, "Added shop {} ({})", shop.name, shop.id)?;
        }
        ShopCommand::List => {
            let shops = collection.repository().list_shops().await?;
            if shops.is_empty() {
                writeln!(out, "No shops")?;
            }
            for shop in shops {
                let place = shop
                    .coordinate
                    .map(|c| format!("{:.4}, {:.4}", c.latitude(), c.longitude()));
                writeln!(
                    out,
                    "{:<24}  {:<20}  {}",
                    shop.name,
                    opt_display(place.as_deref()),
                    shop.id
                )?;
            }
        }
        ShopCommand::Remove { id } => {
            let detached = collection
                .remove_shop(id)
                .await
                .with_context(|| format!("could not remove shop {id}"))?;
            writeln!(
                out,
                "Removed shop {id}; {} appointments kept without a shop",
                detached.len()
            )?;
        }
    }
    Ok(())
}

/// Match an artist by id or case-insensitive name.
fn find_artist<'a>(
    artists: &'a [Artist],
    needle: &str,
) -> Option<&'a Artist> {
    let needle = needle.trim();
    artists.iter().find(|artist| {
        artist.id.to_string().eq_ignore_ascii_case(needle)
            || artist.name.eq_ignore_ascii_case(needle)
    })
}

#[cfg(test)]
mod tests {
    use chrono::{Duration, TimeZone};
    use ink_core::db::MemoryRepository;
    use ink_core::{CollectionError, NoopNotifier};
    use pretty_assertions::assert_eq;

    use super::*;

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 5, 1, 12, 0, 0).unwrap()
    }

    async fn journal() -> AppointmentCollection {
        AppointmentCollection::load(Box::new(MemoryRepository::new()), Box::new(NoopNotifier))
            .await
            .unwrap()
    }

    async fn run(
        collection: &mut AppointmentCollection,
        args: &[&str],
    ) -> Result<String> {
        use clap::Parser;

        let cli = crate::cli::Cli::try_parse_from(std::iter::once("inkbook").chain(args.iter().copied()))?;
        let mut out = Vec::new();
        execute(cli.command, collection, now(), &mut out).await?;
        Ok(String::from_utf8(out)?)
    }

    fn at(offset: Duration) -> String {
        (now() + offset).to_rfc3339()
    }

    async fn seed(collection: &mut AppointmentCollection) {
        for (offset, price, design) in [
            (Duration::days(-30), "150", "swallow"),
            (Duration::days(10), "250", "rose"),
            (Duration::days(3), "200", "anchor"),
            (Duration::days(-2), "80", "dagger"),
        ] {
            run(
                collection,
                &["add", "--date", &at(offset), "--price", price, "--design", design],
            )
            .await
            .unwrap();
        }
    }

    fn designs(collection: &AppointmentCollection, view: View) -> Vec<String> {
        collection
            .view(view, now())
            .into_iter()
            .map(|a| a.design.clone())
            .collect()
    }

    #[tokio::test]
    async fn add_then_list_upcoming_and_history() {
        let mut collection = journal().await;
        seed(&mut collection).await;

        let upcoming = run(&mut collection, &["upcoming"]).await.unwrap();
        let history = run(&mut collection, &["history"]).await.unwrap();

        let anchor = upcoming.find("anchor").unwrap();
        let rose = upcoming.find("rose").unwrap();
        assert!(anchor < rose);
        assert!(!upcoming.contains("swallow"));
        let dagger = history.find("dagger").unwrap();
        let swallow = history.find("swallow").unwrap();
        assert!(dagger < swallow);
    }

    #[tokio::test]
    async fn empty_listings_say_so() {
        let mut collection = journal().await;

        assert_eq!(
            run(&mut collection, &["upcoming"]).await.unwrap(),
            "No upcoming appointments\n"
        );
        assert_eq!(
            run(&mut collection, &["next"]).await.unwrap(),
            "No upcoming appointments\n"
        );
    }

    #[tokio::test]
    async fn next_is_the_soonest_future_appointment() {
        let mut collection = journal().await;
        seed(&mut collection).await;

        let output = run(&mut collection, &["next"]).await.unwrap();

        assert!(output.starts_with("anchor (other) on "));
        assert!(output.contains("in 3d 0h"));
    }

    #[tokio::test]
    async fn delete_index_uses_the_rendered_order() {
        let mut collection = journal().await;
        seed(&mut collection).await;

        run(&mut collection, &["delete-index", "history", "0"])
            .await
            .unwrap();

        assert_eq!(designs(&collection, View::History), vec!["swallow"]);
        assert_eq!(designs(&collection, View::Upcoming), vec!["anchor", "rose"]);
    }

    #[tokio::test]
    async fn delete_index_out_of_range_deletes_nothing() {
        let mut collection = journal().await;
        seed(&mut collection).await;

        let result = run(&mut collection, &["delete-index", "upcoming", "0", "5"]).await;

        assert!(result.is_err());
        assert_eq!(collection.len(), 4);
    }

    #[tokio::test]
    async fn edit_changes_only_given_fields() {
        let mut collection = journal().await;
        seed(&mut collection).await;
        let id = collection.view(View::Upcoming, now())[0].id;
        let id_text = id.to_string();

        run(
            &mut collection,
            &["edit", &id_text, "--price", "220", "--notify", "true"],
        )
        .await
        .unwrap();

        let edited = collection.get(id).unwrap();
        assert_eq!(edited.price.as_str(), "220");
        assert_eq!(edited.design, "anchor");
        assert!(edited.notify);
    }

    #[tokio::test]
    async fn edit_unknown_id_is_not_found() {
        let mut collection = journal().await;
        let id = ink_core::AppointmentId::new();
        let id_text = id.to_string();

        let err = run(&mut collection, &["edit", &id_text, "--price", "1"])
            .await
            .unwrap_err();

        assert_eq!(
            err.downcast_ref::<CollectionError>(),
            Some(&CollectionError::NotFound(id))
        );
    }

    #[tokio::test]
    async fn invalid_add_is_rejected_with_every_problem() {
        let mut collection = journal().await;

        let err = run(
            &mut collection,
            &["add", "--date", "soon", "--price", "lots", "--design", "x"],
        )
        .await
        .unwrap_err();

        let message = err.to_string();
        assert!(message.contains("invalid date 'soon'"));
        assert!(message.contains("invalid price 'lots'"));
        assert!(collection.is_empty());
    }

    #[tokio::test]
    async fn cost_applies_the_preferred_tip_and_currency() {
        let mut collection = journal().await;
        seed(&mut collection).await;

        run(&mut collection, &["prefs", "set", "--currency", "EUR", "--tip", "20%"])
            .await
            .unwrap();
        let output = run(&mut collection, &["cost"]).await.unwrap();

        // (150 + 250 + 200 + 80) * 1.2
        assert_eq!(output, "Total spent: €816.00 (including 20% tip)\n");
    }

    #[tokio::test]
    async fn cost_for_one_artist() {
        let mut collection = journal().await;
        run(&mut collection, &["artist", "add", "Ami", "--handle", "@ami"])
            .await
            .unwrap();
        run(
            &mut collection,
            &["add", "--date", &at(Duration::days(5)), "--price", "300", "--design", "koi", "--artist", "ami"],
        )
        .await
        .unwrap();
        seed(&mut collection).await;

        let output = run(&mut collection, &["cost", "--artist", "Ami"]).await.unwrap();

        assert_eq!(output, "Total spent: £330.00 (including 10% tip)\n");
    }

    #[tokio::test]
    async fn removing_an_artist_keeps_their_appointments() {
        let mut collection = journal().await;
        run(&mut collection, &["artist", "add", "Ami"]).await.unwrap();
        run(
            &mut collection,
            &["add", "--date", &at(Duration::days(5)), "--price", "300", "--design", "koi", "--artist", "Ami"],
        )
        .await
        .unwrap();
        let artist_id = collection.all()[0].artist.unwrap();
        let artist_text = artist_id.to_string();

        let output = run(&mut collection, &["artist", "remove", &artist_text])
            .await
            .unwrap();

        assert!(output.contains("1 appointments kept"));
        assert_eq!(collection.len(), 1);
        assert_eq!(collection.all()[0].artist, None);
    }

    #[tokio::test]
    async fn prefs_show_creates_defaults() {
        let mut collection = journal().await;

        let output = run(&mut collection, &["prefs", "show"]).await.unwrap();

        assert_eq!(output, "currency: GBP (£)\ntip:      10%\n");
    }

    #[tokio::test]
    async fn prefs_set_rejects_unsupported_tip() {
        let mut collection = journal().await;

        assert!(run(&mut collection, &["prefs", "set", "--tip", "15"]).await.is_err());
    }

    #[tokio::test]
    async fn shop_add_and_list() {
        let mut collection = journal().await;

        run(
            &mut collection,
            &["shop", "add", "Frith Street", "--latitude", "51.5136", "--longitude", "-0.1319"],
        )
        .await
        .unwrap();
        let output = run(&mut collection, &["shop", "list"]).await.unwrap();

        assert!(output.starts_with("Frith Street"));
        assert!(output.contains("51.5136, -0.1319"));
    }

    #[tokio::test]
    async fn export_then_import_into_a_fresh_journal() {
        let mut collection = journal().await;
        seed(&mut collection).await;
        let path = std::env::temp_dir().join(format!("inkbook-export-{}.csv", ink_core::AppointmentId::new()));
        let path_text = path.display().to_string();

        run(&mut collection, &["export", &path_text]).await.unwrap();
        let mut fresh = journal().await;
        let output = run(&mut fresh, &["import", &path_text]).await.unwrap();
        let _ = std::fs::remove_file(&path);

        assert_eq!(output, "Imported 4 appointments\n");
        assert_eq!(designs(&fresh, View::Upcoming), vec!["anchor", "rose"]);
        assert_eq!(designs(&fresh, View::History), vec!["dagger", "swallow"]);
    }
}
