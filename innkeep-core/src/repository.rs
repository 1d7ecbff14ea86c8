use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use uuid::Uuid;

use crate::models::{Booking, BookingStatus, Payment, Review, Room, User};
use crate::CoreResult;

/// Catalog search filter. All fields optional; absent fields do not
/// constrain the result.
#[derive(Debug, Clone, Default)]
pub struct RoomSearchFilter {
    /// Matched against name and description, case-insensitive substring.
    pub term: Option<String>,
    pub room_type: Option<String>,
    pub min_price_cents: Option<i64>,
    pub max_price_cents: Option<i64>,
}

/// Repository trait for room catalog access
#[async_trait]
pub trait RoomRepository: Send + Sync {
    async fn insert_room(&self, room: &Room) -> CoreResult<()>;

    async fn get_room(&self, id: Uuid) -> CoreResult<Option<Room>>;

    /// Rooms flagged available in the catalog, name-ascending.
    async fn list_available(&self) -> CoreResult<Vec<Room>>;

    async fn list_all(&self) -> CoreResult<Vec<Room>>;

    async fn search(&self, filter: &RoomSearchFilter) -> CoreResult<Vec<Room>>;

    async fn count_rooms(&self) -> CoreResult<i64>;
}

/// Repository trait for booking data access
#[async_trait]
pub trait BookingRepository: Send + Sync {
    /// Insert a new booking, re-validating the no-overlap invariant inside
    /// the store's unit of work. Two concurrent inserts for the same room
    /// and overlapping dates must not both succeed; the loser gets
    /// `RoomUnavailable`.
    async fn insert_booking(&self, booking: &Booking) -> CoreResult<()>;

    async fn get_booking(&self, id: Uuid) -> CoreResult<Option<Booking>>;

    /// Persist a status change together with the new `updated_at`.
    async fn save_status(
        &self,
        id: Uuid,
        status: BookingStatus,
        updated_at: DateTime<Utc>,
    ) -> CoreResult<()>;

    /// Bookings on a room whose status still occupies it, for overlap
    /// checks. `exclude` skips the booking being edited.
    async fn list_occupying(&self, room_id: Uuid, exclude: Option<Uuid>)
        -> CoreResult<Vec<Booking>>;

    async fn list_for_user(&self, user_id: Uuid) -> CoreResult<Vec<Booking>>;

    /// Bookings created within the inclusive [start, end] date window, any
    /// status.
    async fn list_created_between(&self, start: NaiveDate, end: NaiveDate)
        -> CoreResult<Vec<Booking>>;

    /// CheckedOut bookings whose check-out date falls within [start, end].
    async fn list_checked_out_between(
        &self,
        start: NaiveDate,
        end: NaiveDate,
    ) -> CoreResult<Vec<Booking>>;

    async fn list_by_status(&self, status: BookingStatus) -> CoreResult<Vec<Booking>>;

    /// Most recently created bookings, newest first.
    async fn list_recent(&self, limit: i64) -> CoreResult<Vec<Booking>>;

    async fn count_bookings(&self) -> CoreResult<i64>;

    /// Whether the user has a CheckedOut stay on the room (review gating).
    async fn user_has_checked_out_stay(&self, user_id: Uuid, room_id: Uuid) -> CoreResult<bool>;
}

/// Repository trait for payment data access
#[async_trait]
pub trait PaymentRepository: Send + Sync {
    /// Persist the payment and the booking's advance to Confirmed as one
    /// unit of work.
    async fn insert_payment(&self, payment: &Payment, booking: &Booking) -> CoreResult<()>;

    async fn get_payment(&self, id: Uuid) -> CoreResult<Option<Payment>>;

    async fn find_completed_for_booking(&self, booking_id: Uuid) -> CoreResult<Option<Payment>>;
}

/// Repository trait for review data access
#[async_trait]
pub trait ReviewRepository: Send + Sync {
    async fn insert_review(&self, review: &Review) -> CoreResult<()>;

    async fn get_review(&self, id: Uuid) -> CoreResult<Option<Review>>;

    async fn delete_review(&self, id: Uuid) -> CoreResult<bool>;

    /// Active reviews for a room, newest first.
    async fn list_for_room(&self, room_id: Uuid) -> CoreResult<Vec<Review>>;

    async fn user_has_reviewed(&self, user_id: Uuid, room_id: Uuid) -> CoreResult<bool>;
}

/// Repository trait for guest records
#[async_trait]
pub trait UserRepository: Send + Sync {
    async fn insert_user(&self, user: &User) -> CoreResult<()>;

    async fn get_user(&self, id: Uuid) -> CoreResult<Option<User>>;

    async fn count_users(&self) -> CoreResult<i64>;
}
