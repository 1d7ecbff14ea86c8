use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;
use uuid::Uuid;

use innkeep_core::models::{Review, ReviewStatus};
use innkeep_core::repository::ReviewRepository;
use innkeep_core::{CoreError, CoreResult};

use crate::storage_err;

pub struct PgReviewRepository {
    pool: PgPool,
}

impl PgReviewRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[derive(sqlx::FromRow)]
struct ReviewRow {
    id: Uuid,
    room_id: Uuid,
    user_id: Uuid,
    booking_id: Option<Uuid>,
    rating: i32,
    comment: String,
    status: String,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl TryFrom<ReviewRow> for Review {
    type Error = CoreError;

    fn try_from(row: ReviewRow) -> Result<Self, Self::Error> {
        let status = ReviewStatus::parse(&row.status)
            .ok_or_else(|| CoreError::Storage(format!("unknown review status {}", row.status)))?;
        Ok(Review {
            id: row.id,
            room_id: row.room_id,
            user_id: row.user_id,
            booking_id: row.booking_id,
            rating: row.rating,
            comment: row.comment,
            status,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

const REVIEW_COLUMNS: &str =
    "id, room_id, user_id, booking_id, rating, comment, status, created_at, updated_at";

#[async_trait]
impl ReviewRepository for PgReviewRepository {
    async fn insert_review(&self, review: &Review) -> CoreResult<()> {
        sqlx::query(
            r#"
            INSERT INTO reviews (id, room_id, user_id, booking_id, rating, comment, status, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
            "#,
        )
        .bind(review.id)
        .bind(review.room_id)
        .bind(review.user_id)
        .bind(review.booking_id)
        .bind(review.rating)
        .bind(&review.comment)
        .bind(review.status.as_str())
        .bind(review.created_at)
        .bind(review.updated_at)
        .execute(&self.pool)
        .await
        .map_err(|e| {
            let unique_hit = e
                .as_database_error()
                .and_then(|db| db.code())
                .map(|code| code == "23505")
                .unwrap_or(false);
            if unique_hit {
                CoreError::validation("room already reviewed by this guest")
            } else {
                storage_err(e)
            }
        })?;
        Ok(())
    }

    async fn get_review(&self, id: Uuid) -> CoreResult<Option<Review>> {
        let row = sqlx::query_as::<_, ReviewRow>(&format!(
            "SELECT {REVIEW_COLUMNS} FROM reviews WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(storage_err)?;
        row.map(Review::try_from).transpose()
    }

    async fn delete_review(&self, id: Uuid) -> CoreResult<bool> {
        let result = sqlx::query("DELETE FROM reviews WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(storage_err)?;
        Ok(result.rows_affected() > 0)
    }

    async fn list_for_room(&self, room_id: Uuid) -> CoreResult<Vec<Review>> {
        let rows = sqlx::query_as::<_, ReviewRow>(&format!(
            r#"
            SELECT {REVIEW_COLUMNS} FROM reviews
            WHERE room_id = $1 AND status = 'ACTIVE'
            ORDER BY created_at DESC
            "#
        ))
        .bind(room_id)
        .fetch_all(&self.pool)
        .await
        .map_err(storage_err)?;
        rows.into_iter().map(Review::try_from).collect()
    }

    async fn user_has_reviewed(&self, user_id: Uuid, room_id: Uuid) -> CoreResult<bool> {
        sqlx::query_scalar::<_, bool>(
            "SELECT EXISTS (SELECT 1 FROM reviews WHERE user_id = $1 AND room_id = $2)",
        )
        .bind(user_id)
        .bind(room_id)
        .fetch_one(&self.pool)
        .await
        .map_err(storage_err)
    }
}
