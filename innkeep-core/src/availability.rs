use chrono::NaiveDate;
use std::sync::Arc;
use uuid::Uuid;

use crate::repository::{BookingRepository, RoomRepository};
use crate::{CoreError, CoreResult};

/// Half-open interval overlap: [a1, a2) and [b1, b2) overlap iff
/// a1 < b2 && a2 > b1. Sharing a boundary day (one stay's check-out equals
/// another's check-in) is not a conflict.
pub fn ranges_overlap(a1: NaiveDate, a2: NaiveDate, b1: NaiveDate, b2: NaiveDate) -> bool {
    a1 < b2 && a2 > b1
}

/// Decides whether a room can take a stay for a date range. Read-only; the
/// storage layer re-checks on insert to close the check-then-act race.
pub struct AvailabilityChecker {
    rooms: Arc<dyn RoomRepository>,
    bookings: Arc<dyn BookingRepository>,
}

impl AvailabilityChecker {
    pub fn new(rooms: Arc<dyn RoomRepository>, bookings: Arc<dyn BookingRepository>) -> Self {
        Self { rooms, bookings }
    }

    /// `exclude_booking` lets re-validation during an edit skip the booking
    /// being edited.
    pub async fn is_available(
        &self,
        room_id: Uuid,
        check_in: NaiveDate,
        check_out: NaiveDate,
        exclude_booking: Option<Uuid>,
    ) -> CoreResult<bool> {
        if check_out <= check_in {
            return Err(CoreError::validation(
                "check-out date must be after check-in date",
            ));
        }

        self.rooms
            .get_room(room_id)
            .await?
            .ok_or_else(|| CoreError::not_found(format!("room {room_id}")))?;

        let occupying = self.bookings.list_occupying(room_id, exclude_booking).await?;
        let conflict = occupying
            .iter()
            .any(|b| ranges_overlap(check_in, check_out, b.check_in, b.check_out));

        Ok(!conflict)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::MemoryStore;
    use crate::models::{Booking, BookingStatus, Room};

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn half_open_overlap_rule() {
        // plain overlap
        assert!(ranges_overlap(
            date(2024, 1, 10),
            date(2024, 1, 13),
            date(2024, 1, 12),
            date(2024, 1, 14)
        ));
        // containment
        assert!(ranges_overlap(
            date(2024, 1, 1),
            date(2024, 1, 31),
            date(2024, 1, 10),
            date(2024, 1, 12)
        ));
        // back-to-back stays share a boundary day, no conflict
        assert!(!ranges_overlap(
            date(2024, 1, 10),
            date(2024, 1, 13),
            date(2024, 1, 13),
            date(2024, 1, 15)
        ));
        // disjoint
        assert!(!ranges_overlap(
            date(2024, 1, 1),
            date(2024, 1, 5),
            date(2024, 1, 20),
            date(2024, 1, 25)
        ));
    }

    async fn store_with_room() -> (Arc<MemoryStore>, Room) {
        let store = Arc::new(MemoryStore::new());
        let room = Room::new(
            "Sea View 101".into(),
            "Corner room".into(),
            "Deluxe".into(),
            10000,
            2,
            28,
        );
        store.seed_room(room.clone()).await;
        (store, room)
    }

    #[tokio::test]
    async fn free_room_is_available() {
        let (store, room) = store_with_room().await;
        let checker = AvailabilityChecker::new(store.clone(), store.clone());
        let ok = checker
            .is_available(room.id, date(2024, 1, 10), date(2024, 1, 13), None)
            .await
            .unwrap();
        assert!(ok);
    }

    #[tokio::test]
    async fn overlapping_active_booking_blocks() {
        let (store, room) = store_with_room().await;
        let booking = Booking::new(
            room.id,
            Uuid::new_v4(),
            date(2024, 1, 10),
            date(2024, 1, 13),
            2,
            30000,
            None,
        );
        store.seed_booking(booking).await;

        let checker = AvailabilityChecker::new(store.clone(), store.clone());
        let ok = checker
            .is_available(room.id, date(2024, 1, 12), date(2024, 1, 14), None)
            .await
            .unwrap();
        assert!(!ok);
    }

    #[tokio::test]
    async fn cancelled_and_checked_out_free_the_room() {
        let (store, room) = store_with_room().await;
        for status in [BookingStatus::Cancelled, BookingStatus::CheckedOut] {
            let mut booking = Booking::new(
                room.id,
                Uuid::new_v4(),
                date(2024, 1, 10),
                date(2024, 1, 13),
                2,
                30000,
                None,
            );
            booking.status = status;
            store.seed_booking(booking).await;
        }

        let checker = AvailabilityChecker::new(store.clone(), store.clone());
        let ok = checker
            .is_available(room.id, date(2024, 1, 11), date(2024, 1, 12), None)
            .await
            .unwrap();
        assert!(ok);
    }

    #[tokio::test]
    async fn exclusion_skips_the_edited_booking() {
        let (store, room) = store_with_room().await;
        let booking = Booking::new(
            room.id,
            Uuid::new_v4(),
            date(2024, 1, 10),
            date(2024, 1, 13),
            2,
            30000,
            None,
        );
        let booking_id = booking.id;
        store.seed_booking(booking).await;

        let checker = AvailabilityChecker::new(store.clone(), store.clone());
        let ok = checker
            .is_available(room.id, date(2024, 1, 11), date(2024, 1, 14), Some(booking_id))
            .await
            .unwrap();
        assert!(ok);
    }

    #[tokio::test]
    async fn rejects_inverted_range_and_missing_room() {
        let (store, room) = store_with_room().await;
        let checker = AvailabilityChecker::new(store.clone(), store.clone());

        let err = checker
            .is_available(room.id, date(2024, 1, 13), date(2024, 1, 10), None)
            .await
            .unwrap_err();
        assert!(matches!(err, CoreError::Validation(_)));

        let err = checker
            .is_available(Uuid::new_v4(), date(2024, 1, 10), date(2024, 1, 13), None)
            .await
            .unwrap_err();
        assert!(matches!(err, CoreError::NotFound(_)));
    }
}
