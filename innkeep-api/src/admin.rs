use axum::{
    extract::{Path, Query, State},
    routing::{delete, get, post, put},
    Json, Router,
};
use chrono::{Duration, NaiveDate, Utc};
use serde::Deserialize;
use serde_json::json;
use uuid::Uuid;

use innkeep_core::booking::Requester;
use innkeep_core::models::BookingStatus;
use innkeep_core::reporting::{BookingReport, DashboardStats, RevenueReport};

use crate::bookings::BookingResponse;
use crate::error::AppError;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct UpdateStatusRequest {
    pub status: BookingStatus,
    /// Bypass the transition table. Forced moves are logged for audit.
    #[serde(default)]
    pub force: bool,
}

#[derive(Debug, Deserialize)]
pub struct ReportQuery {
    pub start: Option<NaiveDate>,
    pub end: Option<NaiveDate>,
}

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/v1/admin/bookings/{id}/status", put(update_booking_status))
        .route("/v1/admin/bookings/{id}/cancel", post(cancel_booking))
        .route("/v1/admin/reviews/{id}", delete(delete_review))
        .route("/v1/admin/reports/revenue", get(revenue_report))
        .route("/v1/admin/reports/bookings", get(booking_report))
        .route("/v1/admin/dashboard", get(dashboard))
}

async fn update_booking_status(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(req): Json<UpdateStatusRequest>,
) -> Result<Json<BookingResponse>, AppError> {
    let booking = state
        .bookings
        .update_status(id, req.status, req.force)
        .await?;
    Ok(Json(booking.into()))
}

async fn cancel_booking(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<BookingResponse>, AppError> {
    let booking = state.bookings.cancel_booking(id, Requester::Admin).await?;
    Ok(Json(booking.into()))
}

async fn delete_review(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<serde_json::Value>, AppError> {
    state.reviews.delete_review(id).await?;
    Ok(Json(json!({ "deleted": id })))
}

/// Callers may omit the window; it defaults to the configured trailing
/// number of days ending today.
fn window_or_default(query: &ReportQuery, default_days: i64) -> (NaiveDate, NaiveDate) {
    let today = Utc::now().date_naive();
    let end = query.end.unwrap_or(today);
    let start = query.start.unwrap_or(end - Duration::days(default_days));
    (start, end)
}

async fn revenue_report(
    State(state): State<AppState>,
    Query(query): Query<ReportQuery>,
) -> Result<Json<RevenueReport>, AppError> {
    let (start, end) = window_or_default(&query, state.report_window_days);
    let report = state.reports.revenue_report(start, end).await?;
    Ok(Json(report))
}

async fn booking_report(
    State(state): State<AppState>,
    Query(query): Query<ReportQuery>,
) -> Result<Json<BookingReport>, AppError> {
    let (start, end) = window_or_default(&query, state.report_window_days);
    let report = state.reports.booking_report(start, end).await?;
    Ok(Json(report))
}

async fn dashboard(State(state): State<AppState>) -> Result<Json<DashboardStats>, AppError> {
    let stats = state.reports.dashboard_stats().await?;
    Ok(Json(stats))
}
