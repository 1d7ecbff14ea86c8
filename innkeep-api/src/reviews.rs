use axum::{
    extract::{Path, State},
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use serde::Deserialize;
use uuid::Uuid;

use innkeep_core::models::Review;

use crate::error::AppError;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct CreateReviewRequest {
    pub user_id: Uuid,
    pub room_id: Uuid,
    pub rating: i32,
    pub comment: String,
}

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/v1/reviews", post(create_review))
        .route("/v1/rooms/{id}/reviews", get(room_reviews))
}

async fn create_review(
    State(state): State<AppState>,
    Json(req): Json<CreateReviewRequest>,
) -> Result<(StatusCode, Json<Review>), AppError> {
    let review = state
        .reviews
        .create_review(req.user_id, req.room_id, req.rating, req.comment)
        .await?;
    Ok((StatusCode::CREATED, Json(review)))
}

async fn room_reviews(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<Vec<Review>>, AppError> {
    let reviews = state.reviews.room_reviews(id).await?;
    Ok(Json(reviews))
}
