use chrono::{Duration, NaiveDate, Utc};
use std::sync::Arc;
use tracing::{info, warn};
use uuid::Uuid;

use crate::availability::AvailabilityChecker;
use crate::models::{Booking, BookingStatus};
use crate::repository::{BookingRepository, RoomRepository};
use crate::{CoreError, CoreResult};

/// Tunable booking policy, loaded from configuration by the binary.
#[derive(Debug, Clone)]
pub struct BookingRules {
    /// Guests may cancel only while check-in is at least this many hours
    /// away. Admin cancellation ignores the window.
    pub cancellation_cutoff_hours: i64,
}

impl Default for BookingRules {
    fn default() -> Self {
        Self {
            cancellation_cutoff_hours: 24,
        }
    }
}

#[derive(Debug, Clone)]
pub struct CreateBooking {
    pub room_id: Uuid,
    pub user_id: Uuid,
    pub check_in: NaiveDate,
    pub check_out: NaiveDate,
    pub guests: i32,
    pub special_requests: Option<String>,
}

/// Who is asking for a cancellation. Guests must own the booking and
/// respect the cutoff window; admins bypass both.
#[derive(Debug, Clone, Copy)]
pub enum Requester {
    Guest(Uuid),
    Admin,
}

/// Booking lifecycle: creation, cancellation and status transitions.
pub struct BookingService {
    rooms: Arc<dyn RoomRepository>,
    bookings: Arc<dyn BookingRepository>,
    checker: AvailabilityChecker,
    rules: BookingRules,
}

impl BookingService {
    pub fn new(
        rooms: Arc<dyn RoomRepository>,
        bookings: Arc<dyn BookingRepository>,
        rules: BookingRules,
    ) -> Self {
        let checker = AvailabilityChecker::new(rooms.clone(), bookings.clone());
        Self {
            rooms,
            bookings,
            checker,
            rules,
        }
    }

    pub fn availability(&self) -> &AvailabilityChecker {
        &self.checker
    }

    /// Create a booking with status Pending. The total is snapshotted from
    /// the room's current rate; later price edits do not touch it.
    pub async fn create_booking(&self, req: CreateBooking) -> CoreResult<Booking> {
        let room = self
            .rooms
            .get_room(req.room_id)
            .await?
            .ok_or_else(|| CoreError::not_found(format!("room {}", req.room_id)))?;

        if req.check_out <= req.check_in {
            return Err(CoreError::validation(
                "check-out date must be after check-in date",
            ));
        }
        if req.guests < 1 {
            return Err(CoreError::validation("guest count must be at least 1"));
        }
        if req.guests > room.capacity {
            return Err(CoreError::validation(format!(
                "room {} sleeps at most {} guests",
                room.name, room.capacity
            )));
        }
        if !room.is_available {
            return Err(CoreError::RoomUnavailable(format!(
                "room {} is not open for booking",
                room.name
            )));
        }

        let available = self
            .checker
            .is_available(req.room_id, req.check_in, req.check_out, None)
            .await?;
        if !available {
            return Err(CoreError::RoomUnavailable(format!(
                "room {} is already booked for {} to {}",
                room.name, req.check_in, req.check_out
            )));
        }

        let nights = (req.check_out - req.check_in).num_days();
        if nights <= 0 {
            return Err(CoreError::validation("stay must cover at least one night"));
        }
        let total_cents = room.price_cents * nights;

        let booking = Booking::new(
            req.room_id,
            req.user_id,
            req.check_in,
            req.check_out,
            req.guests,
            total_cents,
            req.special_requests,
        );

        // The store re-validates overlap inside its own unit of work, so a
        // concurrent attempt for the same dates loses here, not later.
        self.bookings.insert_booking(&booking).await?;

        info!(
            booking_id = %booking.id,
            room_id = %booking.room_id,
            check_in = %booking.check_in,
            check_out = %booking.check_out,
            nights,
            total_cents,
            "booking created"
        );
        Ok(booking)
    }

    pub async fn get_booking(&self, id: Uuid) -> CoreResult<Booking> {
        self.bookings
            .get_booking(id)
            .await?
            .ok_or_else(|| CoreError::not_found(format!("booking {id}")))
    }

    pub async fn list_user_bookings(&self, user_id: Uuid) -> CoreResult<Vec<Booking>> {
        self.bookings.list_for_user(user_id).await
    }

    pub async fn cancel_booking(
        &self,
        booking_id: Uuid,
        requester: Requester,
    ) -> CoreResult<Booking> {
        let mut booking = self
            .bookings
            .get_booking(booking_id)
            .await?
            .ok_or_else(|| CoreError::not_found(format!("booking {booking_id}")))?;

        // Ownership failures read as NotFound so guests cannot probe for
        // other people's booking ids.
        if let Requester::Guest(user_id) = requester {
            if booking.user_id != user_id {
                return Err(CoreError::not_found(format!("booking {booking_id}")));
            }
        }

        match booking.status {
            BookingStatus::Cancelled => return Err(CoreError::AlreadyCancelled(booking_id)),
            BookingStatus::CheckedIn | BookingStatus::CheckedOut => {
                return Err(CoreError::InvalidTransition {
                    from: booking.status,
                    to: BookingStatus::Cancelled,
                })
            }
            BookingStatus::Pending | BookingStatus::Confirmed => {}
        }

        if matches!(requester, Requester::Guest(_)) {
            let check_in_start = booking.check_in.and_hms_opt(0, 0, 0).ok_or_else(|| {
                CoreError::Storage("invalid check-in date on stored booking".into())
            })?;
            let cutoff = Utc::now() + Duration::hours(self.rules.cancellation_cutoff_hours);
            if check_in_start.and_utc() <= cutoff {
                return Err(CoreError::validation(format!(
                    "bookings can only be cancelled up to {} hours before check-in",
                    self.rules.cancellation_cutoff_hours
                )));
            }
        }

        booking.set_status(BookingStatus::Cancelled);
        self.bookings
            .save_status(booking.id, booking.status, booking.updated_at)
            .await?;

        info!(booking_id = %booking.id, "booking cancelled");
        Ok(booking)
    }

    /// Admin status change. The transition table is enforced here rather
    /// than trusting the caller; `force` keeps the old unrestricted
    /// override available but leaves an audit trail.
    pub async fn update_status(
        &self,
        booking_id: Uuid,
        new_status: BookingStatus,
        force: bool,
    ) -> CoreResult<Booking> {
        let mut booking = self
            .bookings
            .get_booking(booking_id)
            .await?
            .ok_or_else(|| CoreError::not_found(format!("booking {booking_id}")))?;

        if !booking.status.can_transition_to(new_status) {
            if !force {
                return Err(CoreError::InvalidTransition {
                    from: booking.status,
                    to: new_status,
                });
            }
            warn!(
                booking_id = %booking.id,
                from = %booking.status,
                to = %new_status,
                "forced status transition outside the lifecycle table"
            );
        }

        booking.set_status(new_status);
        self.bookings
            .save_status(booking.id, booking.status, booking.updated_at)
            .await?;

        info!(booking_id = %booking.id, status = %new_status, "booking status updated");
        Ok(booking)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::MemoryStore;
    use crate::models::Room;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn far_future(days: i64) -> NaiveDate {
        Utc::now().date_naive() + Duration::days(days)
    }

    struct Fixture {
        store: Arc<MemoryStore>,
        service: BookingService,
        room: Room,
    }

    async fn fixture() -> Fixture {
        let store = Arc::new(MemoryStore::new());
        let room = Room::new(
            "Sea View 101".into(),
            "Corner room with balcony".into(),
            "Deluxe".into(),
            10000, // $100/night
            2,
            28,
        );
        store.seed_room(room.clone()).await;
        let service = BookingService::new(store.clone(), store.clone(), BookingRules::default());
        Fixture {
            store,
            service,
            room,
        }
    }

    fn request(room_id: Uuid, check_in: NaiveDate, check_out: NaiveDate) -> CreateBooking {
        CreateBooking {
            room_id,
            user_id: Uuid::new_v4(),
            check_in,
            check_out,
            guests: 2,
            special_requests: None,
        }
    }

    #[tokio::test]
    async fn total_is_rate_times_nights() {
        let fx = fixture().await;
        let booking = fx
            .service
            .create_booking(request(fx.room.id, date(2024, 1, 10), date(2024, 1, 13)))
            .await
            .unwrap();
        assert_eq!(booking.nights(), 3);
        assert_eq!(booking.total_cents, 30000);
        assert_eq!(booking.status, BookingStatus::Pending);
    }

    #[tokio::test]
    async fn price_is_snapshotted_at_creation() {
        let fx = fixture().await;
        let booking = fx
            .service
            .create_booking(request(fx.room.id, date(2024, 1, 10), date(2024, 1, 13)))
            .await
            .unwrap();

        let mut room = fx.room.clone();
        room.price_cents = 99999;
        fx.store.insert_room(&room).await.unwrap();

        let stored = fx.service.get_booking(booking.id).await.unwrap();
        assert_eq!(stored.total_cents, 30000);
    }

    #[tokio::test]
    async fn rejects_inverted_or_empty_range() {
        let fx = fixture().await;
        for (check_in, check_out) in [
            (date(2024, 1, 13), date(2024, 1, 10)),
            (date(2024, 1, 10), date(2024, 1, 10)),
        ] {
            let err = fx
                .service
                .create_booking(request(fx.room.id, check_in, check_out))
                .await
                .unwrap_err();
            assert!(matches!(err, CoreError::Validation(_)), "{err}");
        }
    }

    #[tokio::test]
    async fn rejects_guest_count_outside_capacity() {
        let fx = fixture().await;
        let mut req = request(fx.room.id, date(2024, 1, 10), date(2024, 1, 13));
        req.guests = 0;
        assert!(matches!(
            fx.service.create_booking(req.clone()).await.unwrap_err(),
            CoreError::Validation(_)
        ));
        req.guests = 3; // capacity is 2
        assert!(matches!(
            fx.service.create_booking(req).await.unwrap_err(),
            CoreError::Validation(_)
        ));
    }

    #[tokio::test]
    async fn rejects_room_flagged_unavailable() {
        let fx = fixture().await;
        let mut room = fx.room.clone();
        room.is_available = false;
        fx.store.insert_room(&room).await.unwrap();

        let err = fx
            .service
            .create_booking(request(fx.room.id, date(2024, 1, 10), date(2024, 1, 13)))
            .await
            .unwrap_err();
        assert!(matches!(err, CoreError::RoomUnavailable(_)));
    }

    #[tokio::test]
    async fn rejects_overlapping_dates() {
        let fx = fixture().await;
        fx.service
            .create_booking(request(fx.room.id, date(2024, 1, 10), date(2024, 1, 13)))
            .await
            .unwrap();

        // Jan 12 collides
        let err = fx
            .service
            .create_booking(request(fx.room.id, date(2024, 1, 12), date(2024, 1, 14)))
            .await
            .unwrap_err();
        assert!(matches!(err, CoreError::RoomUnavailable(_)));

        // same-day turnover is allowed
        fx.service
            .create_booking(request(fx.room.id, date(2024, 1, 13), date(2024, 1, 15)))
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn guest_cancellation_checks_ownership_and_window() {
        let fx = fixture().await;
        let req = request(fx.room.id, far_future(30), far_future(33));
        let owner = req.user_id;
        let booking = fx.service.create_booking(req).await.unwrap();

        // a stranger sees NotFound, not a hint the booking exists
        let err = fx
            .service
            .cancel_booking(booking.id, Requester::Guest(Uuid::new_v4()))
            .await
            .unwrap_err();
        assert!(matches!(err, CoreError::NotFound(_)));

        let cancelled = fx
            .service
            .cancel_booking(booking.id, Requester::Guest(owner))
            .await
            .unwrap();
        assert_eq!(cancelled.status, BookingStatus::Cancelled);

        // second cancel is a typed no-op failure
        let err = fx
            .service
            .cancel_booking(booking.id, Requester::Guest(owner))
            .await
            .unwrap_err();
        assert!(matches!(err, CoreError::AlreadyCancelled(_)));
    }

    #[tokio::test]
    async fn guest_cannot_cancel_inside_cutoff_window_but_admin_can() {
        let fx = fixture().await;
        let req = request(fx.room.id, far_future(0), far_future(2));
        let owner = req.user_id;
        let booking = fx.service.create_booking(req).await.unwrap();

        let err = fx
            .service
            .cancel_booking(booking.id, Requester::Guest(owner))
            .await
            .unwrap_err();
        assert!(matches!(err, CoreError::Validation(_)));

        let cancelled = fx
            .service
            .cancel_booking(booking.id, Requester::Admin)
            .await
            .unwrap();
        assert_eq!(cancelled.status, BookingStatus::Cancelled);
    }

    #[tokio::test]
    async fn checked_in_and_out_cannot_be_cancelled() {
        let fx = fixture().await;
        for status in [BookingStatus::CheckedIn, BookingStatus::CheckedOut] {
            let mut booking = Booking::new(
                fx.room.id,
                Uuid::new_v4(),
                far_future(40),
                far_future(41),
                1,
                10000,
                None,
            );
            booking.status = status;
            let id = booking.id;
            fx.store.seed_booking(booking).await;

            let err = fx
                .service
                .cancel_booking(id, Requester::Admin)
                .await
                .unwrap_err();
            assert!(matches!(err, CoreError::InvalidTransition { .. }));
        }
    }

    #[tokio::test]
    async fn status_updates_follow_the_lifecycle() {
        let fx = fixture().await;
        let booking = fx
            .service
            .create_booking(request(fx.room.id, far_future(10), far_future(12)))
            .await
            .unwrap();

        // illegal jump is rejected
        let err = fx
            .service
            .update_status(booking.id, BookingStatus::CheckedOut, false)
            .await
            .unwrap_err();
        assert!(matches!(err, CoreError::InvalidTransition { .. }));

        for next in [
            BookingStatus::Confirmed,
            BookingStatus::CheckedIn,
            BookingStatus::CheckedOut,
        ] {
            let updated = fx.service.update_status(booking.id, next, false).await.unwrap();
            assert_eq!(updated.status, next);
        }

        // terminal: nothing further without force
        let err = fx
            .service
            .update_status(booking.id, BookingStatus::Confirmed, false)
            .await
            .unwrap_err();
        assert!(matches!(err, CoreError::InvalidTransition { .. }));

        // forced override is allowed and audited
        let updated = fx
            .service
            .update_status(booking.id, BookingStatus::Confirmed, true)
            .await
            .unwrap();
        assert_eq!(updated.status, BookingStatus::Confirmed);
    }

    #[tokio::test]
    async fn missing_booking_is_not_found() {
        let fx = fixture().await;
        let err = fx
            .service
            .cancel_booking(Uuid::new_v4(), Requester::Admin)
            .await
            .unwrap_err();
        assert!(matches!(err, CoreError::NotFound(_)));
    }
}
