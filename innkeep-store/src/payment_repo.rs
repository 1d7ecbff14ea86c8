use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;
use uuid::Uuid;

use innkeep_core::models::{Booking, Payment, PaymentMethod, PaymentStatus};
use innkeep_core::repository::PaymentRepository;
use innkeep_core::{CoreError, CoreResult};

use crate::storage_err;

pub struct PgPaymentRepository {
    pool: PgPool,
}

impl PgPaymentRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[derive(sqlx::FromRow)]
struct PaymentRow {
    id: Uuid,
    booking_id: Uuid,
    amount_cents: i64,
    method: String,
    status: String,
    transaction_id: String,
    paid_at: DateTime<Utc>,
    created_at: DateTime<Utc>,
}

impl TryFrom<PaymentRow> for Payment {
    type Error = CoreError;

    fn try_from(row: PaymentRow) -> Result<Self, Self::Error> {
        let method = PaymentMethod::parse(&row.method)
            .ok_or_else(|| CoreError::Storage(format!("unknown payment method {}", row.method)))?;
        let status = PaymentStatus::parse(&row.status)
            .ok_or_else(|| CoreError::Storage(format!("unknown payment status {}", row.status)))?;
        Ok(Payment {
            id: row.id,
            booking_id: row.booking_id,
            amount_cents: row.amount_cents,
            method,
            status,
            transaction_id: row.transaction_id,
            paid_at: row.paid_at,
            created_at: row.created_at,
        })
    }
}

const PAYMENT_COLUMNS: &str =
    "id, booking_id, amount_cents, method, status, transaction_id, paid_at, created_at";

#[async_trait]
impl PaymentRepository for PgPaymentRepository {
    async fn insert_payment(&self, payment: &Payment, booking: &Booking) -> CoreResult<()> {
        let mut tx = self.pool.begin().await.map_err(storage_err)?;

        sqlx::query(
            r#"
            INSERT INTO payments (id, booking_id, amount_cents, method, status, transaction_id, paid_at, created_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            "#,
        )
        .bind(payment.id)
        .bind(payment.booking_id)
        .bind(payment.amount_cents)
        .bind(payment.method.as_str())
        .bind(payment.status.as_str())
        .bind(&payment.transaction_id)
        .bind(payment.paid_at)
        .bind(payment.created_at)
        .execute(&mut *tx)
        .await
        .map_err(|e| {
            // partial unique index: one COMPLETED payment per booking
            let unique_hit = e
                .as_database_error()
                .and_then(|db| db.code())
                .map(|code| code == "23505")
                .unwrap_or(false);
            if unique_hit {
                CoreError::AlreadyPaid(payment.booking_id)
            } else {
                storage_err(e)
            }
        })?;

        sqlx::query("UPDATE bookings SET status = $1, updated_at = $2 WHERE id = $3")
            .bind(booking.status.as_str())
            .bind(booking.updated_at)
            .bind(booking.id)
            .execute(&mut *tx)
            .await
            .map_err(storage_err)?;

        tx.commit().await.map_err(storage_err)?;
        Ok(())
    }

    async fn get_payment(&self, id: Uuid) -> CoreResult<Option<Payment>> {
        let row = sqlx::query_as::<_, PaymentRow>(&format!(
            "SELECT {PAYMENT_COLUMNS} FROM payments WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(storage_err)?;
        row.map(Payment::try_from).transpose()
    }

    async fn find_completed_for_booking(&self, booking_id: Uuid) -> CoreResult<Option<Payment>> {
        let row = sqlx::query_as::<_, PaymentRow>(&format!(
            "SELECT {PAYMENT_COLUMNS} FROM payments WHERE booking_id = $1 AND status = 'COMPLETED'"
        ))
        .bind(booking_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(storage_err)?;
        row.map(Payment::try_from).transpose()
    }
}
