use axum::{
    extract::{Path, State},
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use innkeep_core::booking::{CreateBooking, Requester};
use innkeep_core::models::{Booking, BookingStatus};

use crate::error::AppError;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct CreateBookingRequest {
    pub room_id: Uuid,
    pub user_id: Uuid,
    pub check_in: NaiveDate,
    pub check_out: NaiveDate,
    pub guests: i32,
    pub special_requests: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct BookingResponse {
    pub id: Uuid,
    pub room_id: Uuid,
    pub user_id: Uuid,
    pub check_in: NaiveDate,
    pub check_out: NaiveDate,
    pub guests: i32,
    pub total_cents: i64,
    pub status: BookingStatus,
    pub special_requests: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl From<Booking> for BookingResponse {
    fn from(b: Booking) -> Self {
        Self {
            id: b.id,
            room_id: b.room_id,
            user_id: b.user_id,
            check_in: b.check_in,
            check_out: b.check_out,
            guests: b.guests,
            total_cents: b.total_cents,
            status: b.status,
            special_requests: b.special_requests,
            created_at: b.created_at,
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct CancelBookingRequest {
    /// The guest asking for the cancellation; must own the booking.
    pub user_id: Uuid,
}

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/v1/bookings", post(create_booking))
        .route("/v1/bookings/{id}", get(get_booking))
        .route("/v1/bookings/{id}/cancel", post(cancel_booking))
        .route("/v1/users/{id}/bookings", get(user_bookings))
}

async fn create_booking(
    State(state): State<AppState>,
    Json(req): Json<CreateBookingRequest>,
) -> Result<(StatusCode, Json<BookingResponse>), AppError> {
    let booking = state
        .bookings
        .create_booking(CreateBooking {
            room_id: req.room_id,
            user_id: req.user_id,
            check_in: req.check_in,
            check_out: req.check_out,
            guests: req.guests,
            special_requests: req.special_requests,
        })
        .await?;
    Ok((StatusCode::CREATED, Json(booking.into())))
}

async fn get_booking(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<BookingResponse>, AppError> {
    let booking = state.bookings.get_booking(id).await?;
    Ok(Json(booking.into()))
}

async fn cancel_booking(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(req): Json<CancelBookingRequest>,
) -> Result<Json<BookingResponse>, AppError> {
    let booking = state
        .bookings
        .cancel_booking(id, Requester::Guest(req.user_id))
        .await?;
    Ok(Json(booking.into()))
}

async fn user_bookings(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<Vec<BookingResponse>>, AppError> {
    let bookings = state.bookings.list_user_bookings(id).await?;
    Ok(Json(bookings.into_iter().map(Into::into).collect()))
}
