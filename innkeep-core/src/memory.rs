//! In-memory store implementing every repository trait. Backs the test
//! suite and local development; the Postgres store lives in `innkeep-store`.

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard};
use uuid::Uuid;

use crate::availability::ranges_overlap;
use crate::models::{Booking, BookingStatus, Payment, PaymentStatus, Review, Room, User};
use crate::repository::{
    BookingRepository, PaymentRepository, ReviewRepository, RoomRepository, RoomSearchFilter,
    UserRepository,
};
use crate::{CoreError, CoreResult};

#[derive(Default)]
struct Inner {
    rooms: HashMap<Uuid, Room>,
    bookings: HashMap<Uuid, Booking>,
    booking_order: Vec<Uuid>,
    payments: HashMap<Uuid, Payment>,
    reviews: HashMap<Uuid, Review>,
    review_order: Vec<Uuid>,
    users: HashMap<Uuid, User>,
}

pub struct MemoryStore {
    inner: Mutex<Inner>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self {
            inner: Mutex::new(Inner::default()),
        }
    }

    fn guard(&self) -> MutexGuard<'_, Inner> {
        self.inner.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Seed a room directly, bypassing validation. Test/bootstrap helper.
    pub async fn seed_room(&self, room: Room) {
        self.guard().rooms.insert(room.id, room);
    }

    /// Seed a booking directly, bypassing the overlap check. Test helper.
    pub async fn seed_booking(&self, booking: Booking) {
        let mut inner = self.guard();
        if inner.bookings.insert(booking.id, booking.clone()).is_none() {
            inner.booking_order.push(booking.id);
        }
    }

    pub async fn seed_user(&self, user: User) {
        self.guard().users.insert(user.id, user);
    }
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl RoomRepository for MemoryStore {
    async fn insert_room(&self, room: &Room) -> CoreResult<()> {
        self.guard().rooms.insert(room.id, room.clone());
        Ok(())
    }

    async fn get_room(&self, id: Uuid) -> CoreResult<Option<Room>> {
        Ok(self.guard().rooms.get(&id).cloned())
    }

    async fn list_available(&self) -> CoreResult<Vec<Room>> {
        let mut rooms: Vec<Room> = self
            .guard()
            .rooms
            .values()
            .filter(|r| r.is_available)
            .cloned()
            .collect();
        rooms.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(rooms)
    }

    async fn list_all(&self) -> CoreResult<Vec<Room>> {
        let mut rooms: Vec<Room> = self.guard().rooms.values().cloned().collect();
        rooms.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(rooms)
    }

    async fn search(&self, filter: &RoomSearchFilter) -> CoreResult<Vec<Room>> {
        let term = filter.term.as_ref().map(|t| t.to_lowercase());
        let mut rooms: Vec<Room> = self
            .guard()
            .rooms
            .values()
            .filter(|r| r.is_available)
            .filter(|r| match &term {
                Some(t) => {
                    r.name.to_lowercase().contains(t) || r.description.to_lowercase().contains(t)
                }
                None => true,
            })
            .filter(|r| match &filter.room_type {
                Some(t) => &r.room_type == t,
                None => true,
            })
            .filter(|r| filter.min_price_cents.map_or(true, |min| r.price_cents >= min))
            .filter(|r| filter.max_price_cents.map_or(true, |max| r.price_cents <= max))
            .cloned()
            .collect();
        rooms.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(rooms)
    }

    async fn count_rooms(&self) -> CoreResult<i64> {
        Ok(self.guard().rooms.len() as i64)
    }
}

#[async_trait]
impl BookingRepository for MemoryStore {
    async fn insert_booking(&self, booking: &Booking) -> CoreResult<()> {
        let mut inner = self.guard();
        // Re-check under the lock: the availability probe and this insert
        // are separate calls, and two writers must not both win.
        let conflict = inner.bookings.values().any(|b| {
            b.room_id == booking.room_id
                && b.status.occupies_room()
                && ranges_overlap(booking.check_in, booking.check_out, b.check_in, b.check_out)
        });
        if conflict {
            return Err(CoreError::RoomUnavailable(format!(
                "room {} is already booked for {} to {}",
                booking.room_id, booking.check_in, booking.check_out
            )));
        }
        inner.booking_order.push(booking.id);
        inner.bookings.insert(booking.id, booking.clone());
        Ok(())
    }

    async fn get_booking(&self, id: Uuid) -> CoreResult<Option<Booking>> {
        Ok(self.guard().bookings.get(&id).cloned())
    }

    async fn save_status(
        &self,
        id: Uuid,
        status: BookingStatus,
        updated_at: DateTime<Utc>,
    ) -> CoreResult<()> {
        let mut inner = self.guard();
        let booking = inner
            .bookings
            .get_mut(&id)
            .ok_or_else(|| CoreError::not_found(format!("booking {id}")))?;
        booking.status = status;
        booking.updated_at = updated_at;
        Ok(())
    }

    async fn list_occupying(
        &self,
        room_id: Uuid,
        exclude: Option<Uuid>,
    ) -> CoreResult<Vec<Booking>> {
        let inner = self.guard();
        Ok(inner
            .booking_order
            .iter()
            .filter_map(|id| inner.bookings.get(id))
            .filter(|b| b.room_id == room_id && b.status.occupies_room())
            .filter(|b| Some(b.id) != exclude)
            .cloned()
            .collect())
    }

    async fn list_for_user(&self, user_id: Uuid) -> CoreResult<Vec<Booking>> {
        let inner = self.guard();
        let mut out: Vec<Booking> = inner
            .booking_order
            .iter()
            .filter_map(|id| inner.bookings.get(id))
            .filter(|b| b.user_id == user_id)
            .cloned()
            .collect();
        out.reverse(); // newest first, insertion order breaks timestamp ties
        out.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(out)
    }

    async fn list_created_between(
        &self,
        start: NaiveDate,
        end: NaiveDate,
    ) -> CoreResult<Vec<Booking>> {
        let inner = self.guard();
        Ok(inner
            .booking_order
            .iter()
            .filter_map(|id| inner.bookings.get(id))
            .filter(|b| {
                let created = b.created_at.date_naive();
                created >= start && created <= end
            })
            .cloned()
            .collect())
    }

    async fn list_checked_out_between(
        &self,
        start: NaiveDate,
        end: NaiveDate,
    ) -> CoreResult<Vec<Booking>> {
        let inner = self.guard();
        Ok(inner
            .booking_order
            .iter()
            .filter_map(|id| inner.bookings.get(id))
            .filter(|b| {
                b.status == BookingStatus::CheckedOut
                    && b.check_out >= start
                    && b.check_out <= end
            })
            .cloned()
            .collect())
    }

    async fn list_by_status(&self, status: BookingStatus) -> CoreResult<Vec<Booking>> {
        let inner = self.guard();
        Ok(inner
            .booking_order
            .iter()
            .filter_map(|id| inner.bookings.get(id))
            .filter(|b| b.status == status)
            .cloned()
            .collect())
    }

    async fn list_recent(&self, limit: i64) -> CoreResult<Vec<Booking>> {
        let inner = self.guard();
        let mut out: Vec<Booking> = inner
            .booking_order
            .iter()
            .filter_map(|id| inner.bookings.get(id))
            .cloned()
            .collect();
        out.reverse();
        out.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        out.truncate(limit.max(0) as usize);
        Ok(out)
    }

    async fn count_bookings(&self) -> CoreResult<i64> {
        Ok(self.guard().bookings.len() as i64)
    }

    async fn user_has_checked_out_stay(&self, user_id: Uuid, room_id: Uuid) -> CoreResult<bool> {
        Ok(self.guard().bookings.values().any(|b| {
            b.user_id == user_id && b.room_id == room_id && b.status == BookingStatus::CheckedOut
        }))
    }
}

#[async_trait]
impl PaymentRepository for MemoryStore {
    async fn insert_payment(&self, payment: &Payment, booking: &Booking) -> CoreResult<()> {
        let mut inner = self.guard();
        // Same invariant as the partial unique index in Postgres: at most
        // one Completed payment per booking, other statuses unrestricted.
        if payment.status == PaymentStatus::Completed
            && inner.payments.values().any(|p| {
                p.booking_id == payment.booking_id && p.status == PaymentStatus::Completed
            })
        {
            return Err(CoreError::AlreadyPaid(payment.booking_id));
        }
        inner.payments.insert(payment.id, payment.clone());
        if let Some(stored) = inner.bookings.get_mut(&booking.id) {
            stored.status = booking.status;
            stored.updated_at = booking.updated_at;
        }
        Ok(())
    }

    async fn get_payment(&self, id: Uuid) -> CoreResult<Option<Payment>> {
        Ok(self.guard().payments.get(&id).cloned())
    }

    async fn find_completed_for_booking(&self, booking_id: Uuid) -> CoreResult<Option<Payment>> {
        Ok(self
            .guard()
            .payments
            .values()
            .find(|p| p.booking_id == booking_id && p.status == PaymentStatus::Completed)
            .cloned())
    }
}

#[async_trait]
impl ReviewRepository for MemoryStore {
    async fn insert_review(&self, review: &Review) -> CoreResult<()> {
        let mut inner = self.guard();
        inner.review_order.push(review.id);
        inner.reviews.insert(review.id, review.clone());
        Ok(())
    }

    async fn get_review(&self, id: Uuid) -> CoreResult<Option<Review>> {
        Ok(self.guard().reviews.get(&id).cloned())
    }

    async fn delete_review(&self, id: Uuid) -> CoreResult<bool> {
        let mut inner = self.guard();
        inner.review_order.retain(|r| *r != id);
        Ok(inner.reviews.remove(&id).is_some())
    }

    async fn list_for_room(&self, room_id: Uuid) -> CoreResult<Vec<Review>> {
        let inner = self.guard();
        let mut out: Vec<Review> = inner
            .review_order
            .iter()
            .filter_map(|id| inner.reviews.get(id))
            .filter(|r| r.room_id == room_id && r.status == crate::models::ReviewStatus::Active)
            .cloned()
            .collect();
        out.reverse();
        out.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(out)
    }

    async fn user_has_reviewed(&self, user_id: Uuid, room_id: Uuid) -> CoreResult<bool> {
        Ok(self
            .guard()
            .reviews
            .values()
            .any(|r| r.user_id == user_id && r.room_id == room_id))
    }
}

#[async_trait]
impl UserRepository for MemoryStore {
    async fn insert_user(&self, user: &User) -> CoreResult<()> {
        self.guard().users.insert(user.id, user.clone());
        Ok(())
    }

    async fn get_user(&self, id: Uuid) -> CoreResult<Option<User>> {
        Ok(self.guard().users.get(&id).cloned())
    }

    async fn count_users(&self) -> CoreResult<i64> {
        Ok(self.guard().users.len() as i64)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::PaymentMethod;
    use chrono::NaiveDate;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[tokio::test]
    async fn one_completed_payment_per_booking() {
        let store = MemoryStore::new();
        let booking = Booking::new(
            Uuid::new_v4(),
            Uuid::new_v4(),
            date(2024, 4, 1),
            date(2024, 4, 4),
            2,
            30000,
            None,
        );
        store.seed_booking(booking.clone()).await;

        // a Failed attempt does not block a later Completed one
        let mut failed = Payment::completed(booking.id, 30000, PaymentMethod::CreditCard);
        failed.status = PaymentStatus::Failed;
        store.insert_payment(&failed, &booking).await.unwrap();

        let completed = Payment::completed(booking.id, 30000, PaymentMethod::CreditCard);
        store.insert_payment(&completed, &booking).await.unwrap();

        let second = Payment::completed(booking.id, 30000, PaymentMethod::Cash);
        let err = store.insert_payment(&second, &booking).await.unwrap_err();
        assert!(matches!(err, CoreError::AlreadyPaid(id) if id == booking.id));
    }

    #[tokio::test]
    async fn insert_rejects_overlap_for_occupying_statuses() {
        let store = MemoryStore::new();
        let room_id = Uuid::new_v4();

        let first = Booking::new(
            room_id,
            Uuid::new_v4(),
            date(2024, 1, 10),
            date(2024, 1, 13),
            2,
            30000,
            None,
        );
        store.insert_booking(&first).await.unwrap();

        let second = Booking::new(
            room_id,
            Uuid::new_v4(),
            date(2024, 1, 12),
            date(2024, 1, 14),
            2,
            20000,
            None,
        );
        let err = store.insert_booking(&second).await.unwrap_err();
        assert!(matches!(err, CoreError::RoomUnavailable(_)));

        // back-to-back is fine
        let third = Booking::new(
            room_id,
            Uuid::new_v4(),
            date(2024, 1, 13),
            date(2024, 1, 15),
            2,
            20000,
            None,
        );
        store.insert_booking(&third).await.unwrap();
    }

    #[tokio::test]
    async fn room_search_filters_compose() {
        let store = MemoryStore::new();
        store
            .seed_room(Room::new(
                "Garden 12".into(),
                "Quiet garden room".into(),
                "Standard".into(),
                8000,
                2,
                20,
            ))
            .await;
        store
            .seed_room(Room::new(
                "Penthouse".into(),
                "Top floor suite".into(),
                "Suite".into(),
                45000,
                4,
                80,
            ))
            .await;

        let hits = store
            .search(&RoomSearchFilter {
                term: Some("garden".into()),
                ..Default::default()
            })
            .await
            .unwrap();
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].name, "Garden 12");

        let hits = store
            .search(&RoomSearchFilter {
                room_type: Some("Suite".into()),
                min_price_cents: Some(10000),
                ..Default::default()
            })
            .await
            .unwrap();
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].name, "Penthouse");

        let hits = store
            .search(&RoomSearchFilter {
                max_price_cents: Some(5000),
                ..Default::default()
            })
            .await
            .unwrap();
        assert!(hits.is_empty());
    }
}
