use std::str::FromStr;

use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use ink_core::{
    Appointment, AppointmentId, Artist, ArtistId, BodyPart, Coordinate, Currency,
    JournalRepository, PhotoRef, Rating, RepositoryError, Review, Shop, ShopId, TipPercentage,
    UserPreferences,
};
use sqlx::sqlite::{
    SqliteConnectOptions, SqliteConnection, SqlitePool, SqlitePoolOptions, SqliteRow,
};
use sqlx::Row;
use tracing::debug;

use crate::columns::{
    get_optional_f64, get_optional_parsed, get_optional_text, get_parsed, get_price, get_text,
};

pub struct SqliteRepository {
    pool: SqlitePool,
}

/// Accepts a bare file path, `:memory:`, or a full `sqlite:` URL.
fn connect_options(connection_string: &str) -> Result<SqliteConnectOptions> {
    let options = if connection_string == ":memory:" {
        SqliteConnectOptions::from_str("sqlite::memory:")?
    } else if connection_string.starts_with("sqlite:") {
        SqliteConnectOptions::from_str(connection_string)
            .with_context(|| format!("Invalid SQLite URL: {}", connection_string))?
    } else {
        SqliteConnectOptions::new().filename(connection_string)
    };
    Ok(options.create_if_missing(true).foreign_keys(true))
}

impl SqliteRepository {
    pub async fn new(connection_string: &str) -> Result<Self> {
        let in_memory = connection_string.contains(":memory:");
        let pool = SqlitePoolOptions::new()
            // Each in-memory connection would otherwise see its own database.
            .max_connections(if in_memory { 1 } else { 4 })
            .connect_with(connect_options(connection_string)?)
            .await
            .with_context(|| format!("Failed to connect to database: {}", connection_string))?;
        Ok(Self { pool })
    }

    pub async fn new_with_pool(pool: SqlitePool) -> Self {
        Self { pool }
    }

    pub async fn run_migrations(&self) -> Result<()> {
        sqlx::migrate!("./migrations")
            .run(&self.pool)
            .await
            .context("Failed to run database migrations")?;
        Ok(())
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }
}

fn db_err(e: sqlx::Error) -> RepositoryError {
    RepositoryError::Database(e.to_string())
}

/// Unique-constraint failures become `Conflict`; everything else is a database error.
fn write_err(
    e: sqlx::Error,
    what: &str,
) -> RepositoryError {
    let conflict = e
        .as_database_error()
        .filter(|db| db.is_unique_violation())
        .map(|db| db.message().to_string());
    match conflict {
        Some(message) => RepositoryError::Conflict(format!("{what}: {message}")),
        None => db_err(e),
    }
}

const APPOINTMENT_COLUMNS: &str = "id, artist_id, shop_id, scheduled_at, price, design, location,
     notify, review_rating, review_comment, photo";

const INSERT_APPOINTMENT: &str = "INSERT INTO appointment (id, artist_id, shop_id, scheduled_at,
     price, design, location, notify, review_rating, review_comment, photo)
     VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)";

fn row_to_appointment(row: &SqliteRow) -> Result<Appointment, RepositoryError> {
    let location_code = get_text(row, "location")?;
    let location = BodyPart::parse(&location_code).ok_or_else(|| {
        RepositoryError::Database(format!("Invalid body part: {}", location_code))
    })?;

    let rating: Option<i64> = row
        .try_get("review_rating")
        .map_err(|e| RepositoryError::Database(format!("Failed to get review_rating: {}", e)))?;
    let review = match rating {
        Some(value) => {
            let rating = Rating::new(value)
                .map_err(|e| RepositoryError::Database(format!("Invalid review_rating: {}", e)))?;
            Some(Review::new(rating, get_optional_text(row, "review_comment")?))
        }
        None => None,
    };

    Ok(Appointment {
        id: get_parsed(row, "id")?,
        artist: get_optional_parsed(row, "artist_id")?,
        date: row
            .try_get::<DateTime<Utc>, _>("scheduled_at")
            .map_err(|e| RepositoryError::Database(format!("Failed to get scheduled_at: {}", e)))?,
        price: get_price(row, "price")?,
        design: get_text(row, "design")?,
        location,
        notify: row
            .try_get("notify")
            .map_err(|e| RepositoryError::Database(format!("Failed to get notify: {}", e)))?,
        shop: get_optional_parsed(row, "shop_id")?,
        review,
        photo: get_optional_text(row, "photo")?.map(PhotoRef::new),
    })
}

fn row_to_artist(row: &SqliteRow) -> Result<Artist, RepositoryError> {
    Ok(Artist {
        id: get_parsed(row, "id")?,
        name: get_text(row, "name")?,
        handle: get_optional_text(row, "handle")?,
    })
}

fn row_to_shop(row: &SqliteRow) -> Result<Shop, RepositoryError> {
    let coordinate = Coordinate::from_parts(
        get_optional_f64(row, "latitude")?,
        get_optional_f64(row, "longitude")?,
    )
    .map_err(|e| RepositoryError::Database(format!("Invalid shop coordinate: {}", e)))?;

    Ok(Shop {
        id: get_parsed(row, "id")?,
        name: get_text(row, "name")?,
        coordinate,
    })
}

async fn insert_appointment_row(
    conn: &mut SqliteConnection,
    appointment: &Appointment,
) -> Result<(), sqlx::Error> {
    sqlx::query(INSERT_APPOINTMENT)
        .bind(appointment.id.to_string())
        .bind(appointment.artist.map(|id| id.to_string()))
        .bind(appointment.shop.map(|id| id.to_string()))
        .bind(appointment.date)
        .bind(appointment.price.as_str())
        .bind(appointment.design.as_str())
        .bind(appointment.location.as_str())
        .bind(appointment.notify)
        .bind(appointment.review.as_ref().map(|r| i64::from(r.rating.value())))
        .bind(appointment.review.as_ref().and_then(|r| r.comment.as_deref()))
        .bind(appointment.photo.as_ref().map(PhotoRef::as_str))
        .execute(conn)
        .await?;
    Ok(())
}

#[async_trait]
impl JournalRepository for SqliteRepository {
    async fn list_appointments(&self) -> Result<Vec<Appointment>, RepositoryError> {
        let rows = sqlx::query(&format!(
            "SELECT {} FROM appointment ORDER BY rowid",
            APPOINTMENT_COLUMNS
        ))
        .fetch_all(&self.pool)
        .await
        .map_err(db_err)?;

        rows.iter().map(row_to_appointment).collect()
    }

    async fn insert_appointment(
        &self,
        appointment: &Appointment,
    ) -> Result<(), RepositoryError> {
        let mut conn = self.pool.acquire().await.map_err(db_err)?;
        insert_appointment_row(&mut conn, appointment)
            .await
            .map_err(|e| write_err(e, "appointment"))?;

        debug!(id = %appointment.id, "inserted appointment");
        Ok(())
    }

    async fn insert_appointments(
        &self,
        appointments: &[Appointment],
    ) -> Result<(), RepositoryError> {
        let mut tx = self.pool.begin().await.map_err(db_err)?;

        for appointment in appointments {
            insert_appointment_row(&mut *tx, appointment)
                .await
                .map_err(|e| write_err(e, "appointment"))?;
        }

        tx.commit().await.map_err(db_err)?;
        debug!(count = appointments.len(), "inserted appointments");
        Ok(())
    }

    async fn update_appointment(
        &self,
        appointment: &Appointment,
    ) -> Result<(), RepositoryError> {
        let result = sqlx::query(
            "UPDATE appointment SET
                artist_id = ?, shop_id = ?, scheduled_at = ?, price = ?, design = ?,
                location = ?, notify = ?, review_rating = ?, review_comment = ?, photo = ?
             WHERE id = ?",
        )
        .bind(appointment.artist.map(|id| id.to_string()))
        .bind(appointment.shop.map(|id| id.to_string()))
        .bind(appointment.date)
        .bind(appointment.price.as_str())
        .bind(appointment.design.as_str())
        .bind(appointment.location.as_str())
        .bind(appointment.notify)
        .bind(appointment.review.as_ref().map(|r| i64::from(r.rating.value())))
        .bind(appointment.review.as_ref().and_then(|r| r.comment.as_deref()))
        .bind(appointment.photo.as_ref().map(PhotoRef::as_str))
        .bind(appointment.id.to_string())
        .execute(&self.pool)
        .await
        .map_err(db_err)?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }

        Ok(())
    }

    async fn delete_appointments(
        &self,
        ids: &[AppointmentId],
    ) -> Result<(), RepositoryError> {
        let mut tx = self.pool.begin().await.map_err(db_err)?;

        for id in ids {
            let result = sqlx::query("DELETE FROM appointment WHERE id = ?")
                .bind(id.to_string())
                .execute(&mut *tx)
                .await
                .map_err(db_err)?;
            if result.rows_affected() == 0 {
                // Dropping the transaction rolls back the earlier deletes.
                return Err(RepositoryError::NotFound);
            }
        }

        tx.commit().await.map_err(db_err)?;
        debug!(count = ids.len(), "deleted appointments");
        Ok(())
    }

    async fn list_artists(&self) -> Result<Vec<Artist>, RepositoryError> {
        let rows = sqlx::query("SELECT id, name, handle FROM artist ORDER BY name")
            .fetch_all(&self.pool)
            .await
            .map_err(db_err)?;

        rows.iter().map(row_to_artist).collect()
    }

    async fn insert_artist(
        &self,
        artist: &Artist,
    ) -> Result<(), RepositoryError> {
        sqlx::query("INSERT INTO artist (id, name, handle) VALUES (?, ?, ?)")
            .bind(artist.id.to_string())
            .bind(artist.name.as_str())
            .bind(artist.handle.as_deref())
            .execute(&self.pool)
            .await
            .map_err(|e| write_err(e, "artist"))?;
        Ok(())
    }

    async fn delete_artist(
        &self,
        id: ArtistId,
    ) -> Result<(), RepositoryError> {
        let mut tx = self.pool.begin().await.map_err(db_err)?;

        sqlx::query("UPDATE appointment SET artist_id = NULL WHERE artist_id = ?")
            .bind(id.to_string())
            .execute(&mut *tx)
            .await
            .map_err(db_err)?;
        let result = sqlx::query("DELETE FROM artist WHERE id = ?")
            .bind(id.to_string())
            .execute(&mut *tx)
            .await
            .map_err(db_err)?;
        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }

        tx.commit().await.map_err(db_err)?;
        Ok(())
    }

    async fn list_shops(&self) -> Result<Vec<Shop>, RepositoryError> {
        let rows = sqlx::query("SELECT id, name, latitude, longitude FROM shop ORDER BY name")
            .fetch_all(&self.pool)
            .await
            .map_err(db_err)?;

        rows.iter().map(row_to_shop).collect()
    }

    async fn insert_shop(
        &self,
        shop: &Shop,
    ) -> Result<(), RepositoryError> {
        sqlx::query("INSERT INTO shop (id, name, latitude, longitude) VALUES (?, ?, ?, ?)")
            .bind(shop.id.to_string())
            .bind(shop.name.as_str())
            .bind(shop.coordinate.map(|c| c.latitude()))
            .bind(shop.coordinate.map(|c| c.longitude()))
            .execute(&self.pool)
            .await
            .map_err(|e| write_err(e, "shop"))?;
        Ok(())
    }

    async fn delete_shop(
        &self,
        id: ShopId,
    ) -> Result<(), RepositoryError> {
        let mut tx = self.pool.begin().await.map_err(db_err)?;

        sqlx::query("UPDATE appointment SET shop_id = NULL WHERE shop_id = ?")
            .bind(id.to_string())
            .execute(&mut *tx)
            .await
            .map_err(db_err)?;
        let result = sqlx::query("DELETE FROM shop WHERE id = ?")
            .bind(id.to_string())
            .execute(&mut *tx)
            .await
            .map_err(db_err)?;
        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }

        tx.commit().await.map_err(db_err)?;
        Ok(())
    }

    async fn get_preferences(&self) -> Result<Option<UserPreferences>, RepositoryError> {
        let row = sqlx::query("SELECT currency, tip_percent FROM user_preferences WHERE id = 1")
            .fetch_optional(&self.pool)
            .await
            .map_err(db_err)?;

        let Some(row) = row else {
            return Ok(None);
        };

        let currency_code = get_text(&row, "currency")?;
        let currency = Currency::parse(&currency_code).ok_or_else(|| {
            RepositoryError::Database(format!("Invalid currency: {}", currency_code))
        })?;
        let tip_percent: i64 = row
            .try_get("tip_percent")
            .map_err(|e| RepositoryError::Database(e.to_string()))?;
        let tip = u32::try_from(tip_percent)
            .ok()
            .and_then(TipPercentage::from_percent)
            .ok_or_else(|| {
                RepositoryError::Database(format!("Invalid tip percentage: {}", tip_percent))
            })?;

        Ok(Some(UserPreferences { currency, tip }))
    }

    async fn save_preferences(
        &self,
        preferences: &UserPreferences,
    ) -> Result<(), RepositoryError> {
        sqlx::query(
            "INSERT INTO user_preferences (id, currency, tip_percent) VALUES (1, ?, ?)
             ON CONFLICT (id) DO UPDATE SET
                currency = excluded.currency,
                tip_percent = excluded.tip_percent",
        )
        .bind(preferences.currency.as_str())
        .bind(i64::from(preferences.tip.percent()))
        .execute(&self.pool)
        .await
        .map_err(db_err)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use chrono::TimeZone;
    use ink_core::{NewAppointment, Price};
    use pretty_assertions::assert_eq;

    use super::*;

    async fn setup_test_db() -> SqliteRepository {
        let repo = SqliteRepository::new(":memory:")
            .await
            .expect("Failed to create in-memory database");
        repo.run_migrations()
            .await
            .expect("Failed to run migrations");
        repo
    }

    fn sample_appointment() -> Appointment {
        NewAppointment {
            artist: None,
            date: Utc.with_ymd_and_hms(2026, 9, 1, 13, 30, 0).unwrap(),
            price: Price::parse("450.00").unwrap(),
            design: "peony sleeve, session 2".to_string(),
            location: BodyPart::Arm,
            notify: true,
            shop: None,
            review: Some(Review::new(
                Rating::new(4).unwrap(),
                Some("healed well".to_string()),
            )),
            photo: Some(PhotoRef::new("photos/peony-2.heic")),
        }
        .into_appointment()
    }

    #[tokio::test]
    async fn appointment_round_trips_every_field() {
        let repo = setup_test_db().await;
        let appointment = sample_appointment();

        repo.insert_appointment(&appointment).await.unwrap();

        assert_eq!(repo.list_appointments().await.unwrap(), vec![appointment]);
    }

    #[tokio::test]
    async fn list_keeps_insertion_order() {
        let repo = setup_test_db().await;
        let first = sample_appointment();
        let mut second = sample_appointment();
        second.id = AppointmentId::new();
        second.date = first.date - chrono::Duration::days(30);

        repo.insert_appointment(&first).await.unwrap();
        repo.insert_appointment(&second).await.unwrap();

        let ids: Vec<_> = repo
            .list_appointments()
            .await
            .unwrap()
            .into_iter()
            .map(|a| a.id)
            .collect();
        assert_eq!(ids, vec![first.id, second.id]);
    }

    #[tokio::test]
    async fn duplicate_appointment_id_is_a_conflict() {
        let repo = setup_test_db().await;
        let appointment = sample_appointment();
        repo.insert_appointment(&appointment).await.unwrap();

        let result = repo.insert_appointment(&appointment).await;

        assert!(matches!(result, Err(RepositoryError::Conflict(_))));
    }

    #[tokio::test]
    async fn update_replaces_review_and_clears_photo() {
        let repo = setup_test_db().await;
        let mut appointment = sample_appointment();
        repo.insert_appointment(&appointment).await.unwrap();

        appointment.review = None;
        appointment.photo = None;
        appointment.notify = false;
        repo.update_appointment(&appointment).await.unwrap();

        assert_eq!(repo.list_appointments().await.unwrap(), vec![appointment]);
    }

    #[tokio::test]
    async fn update_missing_is_not_found() {
        let repo = setup_test_db().await;

        let result = repo.update_appointment(&sample_appointment()).await;

        assert_eq!(result, Err(RepositoryError::NotFound));
    }

    #[tokio::test]
    async fn batch_delete_rolls_back_when_any_id_is_missing() {
        let repo = setup_test_db().await;
        let appointment = sample_appointment();
        repo.insert_appointment(&appointment).await.unwrap();

        let result = repo
            .delete_appointments(&[appointment.id, AppointmentId::new()])
            .await;

        assert_eq!(result, Err(RepositoryError::NotFound));
        assert_eq!(repo.list_appointments().await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn batch_delete_removes_all() {
        let repo = setup_test_db().await;
        let first = sample_appointment();
        let mut second = sample_appointment();
        second.id = AppointmentId::new();
        repo.insert_appointment(&first).await.unwrap();
        repo.insert_appointment(&second).await.unwrap();

        repo.delete_appointments(&[first.id, second.id])
            .await
            .unwrap();

        assert!(repo.list_appointments().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn batch_insert_rolls_back_on_a_conflict() {
        let repo = setup_test_db().await;
        let existing = sample_appointment();
        repo.insert_appointment(&existing).await.unwrap();
        let mut fresh = sample_appointment();
        fresh.id = AppointmentId::new();

        let result = repo.insert_appointments(&[fresh, existing.clone()]).await;

        assert!(matches!(result, Err(RepositoryError::Conflict(_))));
        let stored = repo.list_appointments().await.unwrap();
        assert_eq!(stored.len(), 1);
        assert_eq!(stored[0].id, existing.id);
    }

    #[tokio::test]
    async fn batch_insert_stores_all_in_order() {
        let repo = setup_test_db().await;
        let first = sample_appointment();
        let mut second = sample_appointment();
        second.id = AppointmentId::new();

        repo.insert_appointments(&[first.clone(), second.clone()])
            .await
            .unwrap();

        let ids: Vec<_> = repo
            .list_appointments()
            .await
            .unwrap()
            .into_iter()
            .map(|a| a.id)
            .collect();
        assert_eq!(ids, vec![first.id, second.id]);
    }

    #[tokio::test]
    async fn artist_names_and_handles_are_unique() {
        let repo = setup_test_db().await;
        repo.insert_artist(&Artist::new("Ami", Some("@ami")).unwrap())
            .await
            .unwrap();
        repo.insert_artist(&Artist::new("Bert", None).unwrap())
            .await
            .unwrap();
        repo.insert_artist(&Artist::new("Cleo", None).unwrap())
            .await
            .unwrap();

        let same_name = repo.insert_artist(&Artist::new("Ami", None).unwrap()).await;
        let same_handle = repo
            .insert_artist(&Artist::new("Dee", Some("ami")).unwrap())
            .await;

        assert!(matches!(same_name, Err(RepositoryError::Conflict(_))));
        assert!(matches!(same_handle, Err(RepositoryError::Conflict(_))));
        assert_eq!(repo.list_artists().await.unwrap().len(), 3);
    }

    #[tokio::test]
    async fn deleting_artist_nullifies_but_keeps_appointments() {
        let repo = setup_test_db().await;
        let artist = Artist::new("Ami", None).unwrap();
        repo.insert_artist(&artist).await.unwrap();
        let mut appointment = sample_appointment();
        appointment.artist = Some(artist.id);
        repo.insert_appointment(&appointment).await.unwrap();

        repo.delete_artist(artist.id).await.unwrap();

        let stored = repo.list_appointments().await.unwrap();
        assert_eq!(stored.len(), 1);
        assert_eq!(stored[0].artist, None);
        assert!(repo.list_artists().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn deleting_unknown_artist_is_not_found() {
        let repo = setup_test_db().await;

        let result = repo.delete_artist(ArtistId::new()).await;

        assert_eq!(result, Err(RepositoryError::NotFound));
    }

    #[tokio::test]
    async fn shop_coordinates_round_trip() {
        let repo = setup_test_db().await;
        let shop = Shop::new(
            "Frith Street Tattoo",
            Some(Coordinate::new(51.5136, -0.1319).unwrap()),
        )
        .unwrap();
        let bare = Shop::new("Back Room", None).unwrap();

        repo.insert_shop(&shop).await.unwrap();
        repo.insert_shop(&bare).await.unwrap();

        assert_eq!(repo.list_shops().await.unwrap(), vec![bare, shop]);
    }

    #[tokio::test]
    async fn deleting_shop_nullifies_appointments() {
        let repo = setup_test_db().await;
        let shop = Shop::new("Back Room", None).unwrap();
        repo.insert_shop(&shop).await.unwrap();
        let mut appointment = sample_appointment();
        appointment.shop = Some(shop.id);
        repo.insert_appointment(&appointment).await.unwrap();

        repo.delete_shop(shop.id).await.unwrap();

        assert_eq!(repo.list_appointments().await.unwrap()[0].shop, None);
    }

    #[tokio::test]
    async fn preferences_are_a_single_row() {
        let repo = setup_test_db().await;
        assert_eq!(repo.get_preferences().await.unwrap(), None);

        repo.save_preferences(&UserPreferences::default())
            .await
            .unwrap();
        let changed = UserPreferences {
            currency: Currency::Euro,
            tip: TipPercentage::Thirty,
        };
        repo.save_preferences(&changed).await.unwrap();

        assert_eq!(repo.get_preferences().await.unwrap(), Some(changed));
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM user_preferences")
            .fetch_one(repo.pool())
            .await
            .unwrap();
        assert_eq!(count, 1);
    }

    #[tokio::test]
    async fn unreadable_legacy_price_still_loads() {
        let repo = setup_test_db().await;
        let appointment = sample_appointment();
        repo.insert_appointment(&appointment).await.unwrap();
        sqlx::query("UPDATE appointment SET price = 'ask artist'")
            .execute(repo.pool())
            .await
            .unwrap();

        let stored = repo.list_appointments().await.unwrap();

        assert_eq!(stored[0].price.as_str(), "ask artist");
        assert_eq!(stored[0].price.amount(), None);
    }

    #[tokio::test]
    async fn schema_rejects_out_of_range_rating() {
        let repo = setup_test_db().await;
        let appointment = sample_appointment();
        repo.insert_appointment(&appointment).await.unwrap();

        let result = sqlx::query("UPDATE appointment SET review_rating = 9")
            .execute(repo.pool())
            .await;

        assert!(result.is_err());
    }
}
