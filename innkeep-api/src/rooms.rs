use axum::{
    extract::{Path, Query, State},
    routing::get,
    Json, Router,
};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use innkeep_core::models::{Review, Room};
use innkeep_core::repository::RoomSearchFilter;
use innkeep_core::CoreError;

use crate::error::AppError;
use crate::state::AppState;

#[derive(Debug, Serialize)]
pub struct RoomSummary {
    pub id: Uuid,
    pub name: String,
    pub description: String,
    pub room_type: String,
    pub price_cents: i64,
    pub capacity: i32,
    pub size_sqm: i32,
    pub is_available: bool,
    pub average_rating: f64,
    pub review_count: usize,
}

#[derive(Debug, Serialize)]
pub struct RoomDetails {
    #[serde(flatten)]
    pub summary: RoomSummary,
    pub reviews: Vec<Review>,
}

#[derive(Debug, Deserialize)]
pub struct SearchQuery {
    pub term: Option<String>,
    pub room_type: Option<String>,
    pub min_price_cents: Option<i64>,
    pub max_price_cents: Option<i64>,
}

#[derive(Debug, Deserialize)]
pub struct AvailabilityQuery {
    pub check_in: NaiveDate,
    pub check_out: NaiveDate,
    pub exclude_booking: Option<Uuid>,
}

#[derive(Debug, Serialize)]
pub struct AvailabilityResponse {
    pub room_id: Uuid,
    pub check_in: NaiveDate,
    pub check_out: NaiveDate,
    pub available: bool,
}

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/v1/rooms", get(list_rooms))
        .route("/v1/rooms/search", get(search_rooms))
        .route("/v1/rooms/{id}", get(room_details))
        .route("/v1/rooms/{id}/availability", get(check_availability))
}

fn summarize(room: Room, reviews: &[Review]) -> RoomSummary {
    let average_rating = if reviews.is_empty() {
        0.0
    } else {
        f64::from(reviews.iter().map(|r| r.rating).sum::<i32>()) / reviews.len() as f64
    };
    RoomSummary {
        id: room.id,
        name: room.name,
        description: room.description,
        room_type: room.room_type,
        price_cents: room.price_cents,
        capacity: room.capacity,
        size_sqm: room.size_sqm,
        is_available: room.is_available,
        average_rating,
        review_count: reviews.len(),
    }
}

async fn list_rooms(State(state): State<AppState>) -> Result<Json<Vec<RoomSummary>>, AppError> {
    let mut out = Vec::new();
    for room in state.rooms.list_available().await? {
        let reviews = state.reviews.room_reviews(room.id).await?;
        out.push(summarize(room, &reviews));
    }
    Ok(Json(out))
}

async fn search_rooms(
    State(state): State<AppState>,
    Query(query): Query<SearchQuery>,
) -> Result<Json<Vec<RoomSummary>>, AppError> {
    let filter = RoomSearchFilter {
        term: query.term,
        room_type: query.room_type,
        min_price_cents: query.min_price_cents,
        max_price_cents: query.max_price_cents,
    };
    let mut out = Vec::new();
    for room in state.rooms.search(&filter).await? {
        let reviews = state.reviews.room_reviews(room.id).await?;
        out.push(summarize(room, &reviews));
    }
    Ok(Json(out))
}

async fn room_details(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<RoomDetails>, AppError> {
    let room = state
        .rooms
        .get_room(id)
        .await?
        .ok_or_else(|| CoreError::not_found(format!("room {id}")))?;
    let reviews = state.reviews.room_reviews(id).await?;
    let summary = summarize(room, &reviews);
    Ok(Json(RoomDetails { summary, reviews }))
}

async fn check_availability(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Query(query): Query<AvailabilityQuery>,
) -> Result<Json<AvailabilityResponse>, AppError> {
    let available = state
        .bookings
        .availability()
        .is_available(id, query.check_in, query.check_out, query.exclude_booking)
        .await?;
    Ok(Json(AvailabilityResponse {
        room_id: id,
        check_in: query.check_in,
        check_out: query.check_out,
        available,
    }))
}
