use std::sync::Arc;
use tracing::info;
use uuid::Uuid;

use crate::models::{BookingStatus, Review};
use crate::repository::{BookingRepository, ReviewRepository, RoomRepository};
use crate::{CoreError, CoreResult};

/// Guest reviews: gated on a completed stay, one per (user, room).
pub struct ReviewService {
    reviews: Arc<dyn ReviewRepository>,
    bookings: Arc<dyn BookingRepository>,
    rooms: Arc<dyn RoomRepository>,
}

impl ReviewService {
    pub fn new(
        reviews: Arc<dyn ReviewRepository>,
        bookings: Arc<dyn BookingRepository>,
        rooms: Arc<dyn RoomRepository>,
    ) -> Self {
        Self {
            reviews,
            bookings,
            rooms,
        }
    }

    pub async fn create_review(
        &self,
        user_id: Uuid,
        room_id: Uuid,
        rating: i32,
        comment: String,
    ) -> CoreResult<Review> {
        if !(1..=5).contains(&rating) {
            return Err(CoreError::validation("rating must be between 1 and 5"));
        }

        self.rooms
            .get_room(room_id)
            .await?
            .ok_or_else(|| CoreError::not_found(format!("room {room_id}")))?;

        if !self
            .bookings
            .user_has_checked_out_stay(user_id, room_id)
            .await?
        {
            return Err(CoreError::validation(
                "only guests with a completed stay can review a room",
            ));
        }

        if self.reviews.user_has_reviewed(user_id, room_id).await? {
            return Err(CoreError::validation("room already reviewed by this guest"));
        }

        // Link the qualifying stay when we can find one.
        let booking_id = self
            .bookings
            .list_for_user(user_id)
            .await?
            .into_iter()
            .find(|b| b.room_id == room_id && b.status == BookingStatus::CheckedOut)
            .map(|b| b.id);

        let review = Review::new(room_id, user_id, booking_id, rating, comment);
        self.reviews.insert_review(&review).await?;

        info!(review_id = %review.id, room_id = %room_id, rating, "review created");
        Ok(review)
    }

    /// Admin moderation hook.
    pub async fn delete_review(&self, review_id: Uuid) -> CoreResult<()> {
        if !self.reviews.delete_review(review_id).await? {
            return Err(CoreError::not_found(format!("review {review_id}")));
        }
        info!(review_id = %review_id, "review deleted");
        Ok(())
    }

    pub async fn room_reviews(&self, room_id: Uuid) -> CoreResult<Vec<Review>> {
        self.reviews.list_for_room(room_id).await
    }

    /// Mean rating of a room's active reviews, 0.0 when there are none.
    pub async fn average_rating(&self, room_id: Uuid) -> CoreResult<f64> {
        let reviews = self.reviews.list_for_room(room_id).await?;
        if reviews.is_empty() {
            return Ok(0.0);
        }
        let sum: i32 = reviews.iter().map(|r| r.rating).sum();
        Ok(f64::from(sum) / reviews.len() as f64)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::MemoryStore;
    use crate::models::{Booking, Room};
    use chrono::NaiveDate;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    struct Fixture {
        store: Arc<MemoryStore>,
        service: ReviewService,
        room: Room,
        guest: Uuid,
    }

    async fn fixture(stayed: bool) -> Fixture {
        let store = Arc::new(MemoryStore::new());
        let room = Room::new(
            "Garden 12".into(),
            "Quiet garden room".into(),
            "Standard".into(),
            8000,
            2,
            20,
        );
        store.seed_room(room.clone()).await;
        let guest = Uuid::new_v4();
        if stayed {
            let mut booking = Booking::new(
                room.id,
                guest,
                date(2024, 2, 1),
                date(2024, 2, 3),
                2,
                16000,
                None,
            );
            booking.status = BookingStatus::CheckedOut;
            store.seed_booking(booking).await;
        }
        let service = ReviewService::new(store.clone(), store.clone(), store.clone());
        Fixture {
            store,
            service,
            room,
            guest,
        }
    }

    #[tokio::test]
    async fn review_requires_a_completed_stay() {
        let fx = fixture(false).await;
        let err = fx
            .service
            .create_review(fx.guest, fx.room.id, 5, "Lovely".into())
            .await
            .unwrap_err();
        assert!(matches!(err, CoreError::Validation(_)));
    }

    #[tokio::test]
    async fn checked_out_guest_can_review_once() {
        let fx = fixture(true).await;
        let review = fx
            .service
            .create_review(fx.guest, fx.room.id, 4, "Very comfortable".into())
            .await
            .unwrap();
        assert_eq!(review.rating, 4);
        assert!(review.booking_id.is_some());

        let err = fx
            .service
            .create_review(fx.guest, fx.room.id, 5, "Again!".into())
            .await
            .unwrap_err();
        assert!(matches!(err, CoreError::Validation(_)));
    }

    #[tokio::test]
    async fn rating_bounds_are_enforced() {
        let fx = fixture(true).await;
        for rating in [0, 6, -1] {
            let err = fx
                .service
                .create_review(fx.guest, fx.room.id, rating, "x".into())
                .await
                .unwrap_err();
            assert!(matches!(err, CoreError::Validation(_)));
        }
    }

    #[tokio::test]
    async fn average_rating_over_active_reviews() {
        let fx = fixture(true).await;
        assert_eq!(fx.service.average_rating(fx.room.id).await.unwrap(), 0.0);

        fx.service
            .create_review(fx.guest, fx.room.id, 4, "Good".into())
            .await
            .unwrap();

        // second guest with their own stay
        let other = Uuid::new_v4();
        let mut booking = Booking::new(
            fx.room.id,
            other,
            date(2024, 2, 10),
            date(2024, 2, 12),
            1,
            16000,
            None,
        );
        booking.status = BookingStatus::CheckedOut;
        fx.store.seed_booking(booking).await;
        fx.service
            .create_review(other, fx.room.id, 5, "Great".into())
            .await
            .unwrap();

        assert_eq!(fx.service.average_rating(fx.room.id).await.unwrap(), 4.5);
    }

    #[tokio::test]
    async fn delete_review_is_not_found_when_absent() {
        let fx = fixture(true).await;
        let err = fx.service.delete_review(Uuid::new_v4()).await.unwrap_err();
        assert!(matches!(err, CoreError::NotFound(_)));

        let review = fx
            .service
            .create_review(fx.guest, fx.room.id, 3, "Fine".into())
            .await
            .unwrap();
        fx.service.delete_review(review.id).await.unwrap();
        assert!(fx.service.room_reviews(fx.room.id).await.unwrap().is_empty());
    }
}
