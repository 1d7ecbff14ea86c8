use axum::{
    extract::{Path, State},
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use innkeep_core::models::{Payment, PaymentMethod, PaymentStatus};

use crate::error::AppError;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct RecordPaymentRequest {
    pub booking_id: Uuid,
    pub method: PaymentMethod,
}

#[derive(Debug, Serialize)]
pub struct PaymentResponse {
    pub id: Uuid,
    pub booking_id: Uuid,
    pub amount_cents: i64,
    pub method: PaymentMethod,
    pub status: PaymentStatus,
    pub transaction_id: String,
    pub paid_at: DateTime<Utc>,
}

impl From<Payment> for PaymentResponse {
    fn from(p: Payment) -> Self {
        Self {
            id: p.id,
            booking_id: p.booking_id,
            amount_cents: p.amount_cents,
            method: p.method,
            status: p.status,
            transaction_id: p.transaction_id,
            paid_at: p.paid_at,
        }
    }
}

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/v1/payments", post(record_payment))
        .route("/v1/payments/{id}", get(get_payment))
}

async fn record_payment(
    State(state): State<AppState>,
    Json(req): Json<RecordPaymentRequest>,
) -> Result<(StatusCode, Json<PaymentResponse>), AppError> {
    let payment = state
        .payments
        .record_payment(req.booking_id, req.method)
        .await?;
    Ok((StatusCode::CREATED, Json(payment.into())))
}

async fn get_payment(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<PaymentResponse>, AppError> {
    let payment = state.payments.get_payment(id).await?;
    Ok(Json(payment.into()))
}
