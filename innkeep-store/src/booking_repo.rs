use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use sqlx::PgPool;
use uuid::Uuid;

use innkeep_core::models::{Booking, BookingStatus};
use innkeep_core::repository::BookingRepository;
use innkeep_core::{CoreError, CoreResult};

use crate::storage_err;

pub struct PgBookingRepository {
    pool: PgPool,
}

impl PgBookingRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[derive(sqlx::FromRow)]
struct BookingRow {
    id: Uuid,
    room_id: Uuid,
    user_id: Uuid,
    check_in: NaiveDate,
    check_out: NaiveDate,
    guests: i32,
    total_cents: i64,
    status: String,
    special_requests: Option<String>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl TryFrom<BookingRow> for Booking {
    type Error = CoreError;

    fn try_from(row: BookingRow) -> Result<Self, Self::Error> {
        let status = BookingStatus::parse(&row.status)
            .ok_or_else(|| CoreError::Storage(format!("unknown booking status {}", row.status)))?;
        Ok(Booking {
            id: row.id,
            room_id: row.room_id,
            user_id: row.user_id,
            check_in: row.check_in,
            check_out: row.check_out,
            guests: row.guests,
            total_cents: row.total_cents,
            status,
            special_requests: row.special_requests,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

fn rows_to_bookings(rows: Vec<BookingRow>) -> CoreResult<Vec<Booking>> {
    rows.into_iter().map(Booking::try_from).collect()
}

const BOOKING_COLUMNS: &str = "id, room_id, user_id, check_in, check_out, guests, total_cents, status, special_requests, created_at, updated_at";

/// Exclusion (23P01) and unique (23505) violations on the bookings table
/// mean the dates were taken between check and insert.
fn is_overlap_violation(err: &sqlx::Error) -> bool {
    err.as_database_error()
        .and_then(|db| db.code())
        .map(|code| code == "23P01" || code == "23505")
        .unwrap_or(false)
}

#[async_trait]
impl BookingRepository for PgBookingRepository {
    async fn insert_booking(&self, booking: &Booking) -> CoreResult<()> {
        let mut tx = self.pool.begin().await.map_err(storage_err)?;

        // Serialize writers per room: the lock makes the recheck-then-insert
        // atomic against other booking attempts on the same room.
        let room: Option<(Uuid,)> = sqlx::query_as("SELECT id FROM rooms WHERE id = $1 FOR UPDATE")
            .bind(booking.room_id)
            .fetch_optional(&mut *tx)
            .await
            .map_err(storage_err)?;
        if room.is_none() {
            return Err(CoreError::not_found(format!("room {}", booking.room_id)));
        }

        let conflicts: i64 = sqlx::query_scalar(
            r#"
            SELECT COUNT(*) FROM bookings
            WHERE room_id = $1
              AND status IN ('PENDING', 'CONFIRMED', 'CHECKED_IN')
              AND check_in < $3
              AND check_out > $2
            "#,
        )
        .bind(booking.room_id)
        .bind(booking.check_in)
        .bind(booking.check_out)
        .fetch_one(&mut *tx)
        .await
        .map_err(storage_err)?;
        if conflicts > 0 {
            return Err(CoreError::RoomUnavailable(format!(
                "room {} is already booked for {} to {}",
                booking.room_id, booking.check_in, booking.check_out
            )));
        }

        sqlx::query(
            r#"
            INSERT INTO bookings (id, room_id, user_id, check_in, check_out, guests, total_cents, status, special_requests, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11)
            "#,
        )
        .bind(booking.id)
        .bind(booking.room_id)
        .bind(booking.user_id)
        .bind(booking.check_in)
        .bind(booking.check_out)
        .bind(booking.guests)
        .bind(booking.total_cents)
        .bind(booking.status.as_str())
        .bind(&booking.special_requests)
        .bind(booking.created_at)
        .bind(booking.updated_at)
        .execute(&mut *tx)
        .await
        .map_err(|e| {
            if is_overlap_violation(&e) {
                CoreError::RoomUnavailable(format!(
                    "room {} is already booked for {} to {}",
                    booking.room_id, booking.check_in, booking.check_out
                ))
            } else {
                storage_err(e)
            }
        })?;

        tx.commit().await.map_err(storage_err)?;
        Ok(())
    }

    async fn get_booking(&self, id: Uuid) -> CoreResult<Option<Booking>> {
        let row = sqlx::query_as::<_, BookingRow>(&format!(
            "SELECT {BOOKING_COLUMNS} FROM bookings WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(storage_err)?;
        row.map(Booking::try_from).transpose()
    }

    async fn save_status(
        &self,
        id: Uuid,
        status: BookingStatus,
        updated_at: DateTime<Utc>,
    ) -> CoreResult<()> {
        let result = sqlx::query("UPDATE bookings SET status = $1, updated_at = $2 WHERE id = $3")
            .bind(status.as_str())
            .bind(updated_at)
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(storage_err)?;
        if result.rows_affected() == 0 {
            return Err(CoreError::not_found(format!("booking {id}")));
        }
        Ok(())
    }

    async fn list_occupying(
        &self,
        room_id: Uuid,
        exclude: Option<Uuid>,
    ) -> CoreResult<Vec<Booking>> {
        let rows = sqlx::query_as::<_, BookingRow>(&format!(
            r#"
            SELECT {BOOKING_COLUMNS} FROM bookings
            WHERE room_id = $1
              AND status IN ('PENDING', 'CONFIRMED', 'CHECKED_IN')
              AND ($2::UUID IS NULL OR id <> $2)
            ORDER BY check_in
            "#
        ))
        .bind(room_id)
        .bind(exclude)
        .fetch_all(&self.pool)
        .await
        .map_err(storage_err)?;
        rows_to_bookings(rows)
    }

    async fn list_for_user(&self, user_id: Uuid) -> CoreResult<Vec<Booking>> {
        let rows = sqlx::query_as::<_, BookingRow>(&format!(
            "SELECT {BOOKING_COLUMNS} FROM bookings WHERE user_id = $1 ORDER BY created_at DESC"
        ))
        .bind(user_id)
        .fetch_all(&self.pool)
        .await
        .map_err(storage_err)?;
        rows_to_bookings(rows)
    }

    async fn list_created_between(
        &self,
        start: NaiveDate,
        end: NaiveDate,
    ) -> CoreResult<Vec<Booking>> {
        let rows = sqlx::query_as::<_, BookingRow>(&format!(
            r#"
            SELECT {BOOKING_COLUMNS} FROM bookings
            WHERE created_at::date >= $1 AND created_at::date <= $2
            ORDER BY created_at
            "#
        ))
        .bind(start)
        .bind(end)
        .fetch_all(&self.pool)
        .await
        .map_err(storage_err)?;
        rows_to_bookings(rows)
    }

    async fn list_checked_out_between(
        &self,
        start: NaiveDate,
        end: NaiveDate,
    ) -> CoreResult<Vec<Booking>> {
        let rows = sqlx::query_as::<_, BookingRow>(&format!(
            r#"
            SELECT {BOOKING_COLUMNS} FROM bookings
            WHERE status = 'CHECKED_OUT' AND check_out >= $1 AND check_out <= $2
            ORDER BY check_out
            "#
        ))
        .bind(start)
        .bind(end)
        .fetch_all(&self.pool)
        .await
        .map_err(storage_err)?;
        rows_to_bookings(rows)
    }

    async fn list_by_status(&self, status: BookingStatus) -> CoreResult<Vec<Booking>> {
        let rows = sqlx::query_as::<_, BookingRow>(&format!(
            "SELECT {BOOKING_COLUMNS} FROM bookings WHERE status = $1 ORDER BY created_at"
        ))
        .bind(status.as_str())
        .fetch_all(&self.pool)
        .await
        .map_err(storage_err)?;
        rows_to_bookings(rows)
    }

    async fn list_recent(&self, limit: i64) -> CoreResult<Vec<Booking>> {
        let rows = sqlx::query_as::<_, BookingRow>(&format!(
            "SELECT {BOOKING_COLUMNS} FROM bookings ORDER BY created_at DESC LIMIT $1"
        ))
        .bind(limit)
        .fetch_all(&self.pool)
        .await
        .map_err(storage_err)?;
        rows_to_bookings(rows)
    }

    async fn count_bookings(&self) -> CoreResult<i64> {
        sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM bookings")
            .fetch_one(&self.pool)
            .await
            .map_err(storage_err)
    }

    async fn user_has_checked_out_stay(&self, user_id: Uuid, room_id: Uuid) -> CoreResult<bool> {
        sqlx::query_scalar::<_, bool>(
            r#"
            SELECT EXISTS (
                SELECT 1 FROM bookings
                WHERE user_id = $1 AND room_id = $2 AND status = 'CHECKED_OUT'
            )
            "#,
        )
        .bind(user_id)
        .bind(room_id)
        .fetch_one(&self.pool)
        .await
        .map_err(storage_err)
    }
}
