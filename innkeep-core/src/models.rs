use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Booking status in the lifecycle
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum BookingStatus {
    Pending,
    Confirmed,
    CheckedIn,
    CheckedOut,
    Cancelled,
}

impl BookingStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            BookingStatus::Pending => "PENDING",
            BookingStatus::Confirmed => "CONFIRMED",
            BookingStatus::CheckedIn => "CHECKED_IN",
            BookingStatus::CheckedOut => "CHECKED_OUT",
            BookingStatus::Cancelled => "CANCELLED",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "PENDING" => Some(BookingStatus::Pending),
            "CONFIRMED" => Some(BookingStatus::Confirmed),
            "CHECKED_IN" => Some(BookingStatus::CheckedIn),
            "CHECKED_OUT" => Some(BookingStatus::CheckedOut),
            "CANCELLED" => Some(BookingStatus::Cancelled),
            _ => None,
        }
    }

    /// Whether a booking in this status still occupies the room for its
    /// dates. Cancelled never did; CheckedOut is a completed stay and no
    /// longer blocks future capacity.
    pub fn occupies_room(&self) -> bool {
        matches!(
            self,
            BookingStatus::Pending | BookingStatus::Confirmed | BookingStatus::CheckedIn
        )
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, BookingStatus::CheckedOut | BookingStatus::Cancelled)
    }

    /// Transition table for the booking state machine. CheckedIn guests
    /// cannot be cancelled, only checked out.
    pub fn can_transition_to(&self, next: BookingStatus) -> bool {
        use BookingStatus::*;
        matches!(
            (self, next),
            (Pending, Confirmed)
                | (Pending, Cancelled)
                | (Confirmed, CheckedIn)
                | (Confirmed, Cancelled)
                | (CheckedIn, CheckedOut)
        )
    }
}

impl std::fmt::Display for BookingStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A bookable room in the catalog
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Room {
    pub id: Uuid,
    pub name: String,
    pub description: String,
    pub room_type: String,
    /// Per-night rate in cents. Snapshotted into bookings at creation time.
    pub price_cents: i64,
    pub capacity: i32,
    pub size_sqm: i32,
    pub is_available: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Room {
    pub fn new(
        name: String,
        description: String,
        room_type: String,
        price_cents: i64,
        capacity: i32,
        size_sqm: i32,
    ) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            name,
            description,
            room_type,
            price_cents,
            capacity,
            size_sqm,
            is_available: true,
            created_at: now,
            updated_at: now,
        }
    }
}

/// A stay reservation. Dates form the half-open interval
/// [check_in, check_out): back-to-back bookings sharing a boundary day do
/// not conflict.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Booking {
    pub id: Uuid,
    pub room_id: Uuid,
    pub user_id: Uuid,
    pub check_in: NaiveDate,
    pub check_out: NaiveDate,
    pub guests: i32,
    /// Total for the stay in cents, computed from the room's rate at
    /// creation time. Later catalog price edits never touch this.
    pub total_cents: i64,
    pub status: BookingStatus,
    pub special_requests: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Booking {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        room_id: Uuid,
        user_id: Uuid,
        check_in: NaiveDate,
        check_out: NaiveDate,
        guests: i32,
        total_cents: i64,
        special_requests: Option<String>,
    ) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            room_id,
            user_id,
            check_in,
            check_out,
            guests,
            total_cents,
            status: BookingStatus::Pending,
            special_requests,
            created_at: now,
            updated_at: now,
        }
    }

    /// Whole nights of the stay, by calendar-day difference.
    pub fn nights(&self) -> i64 {
        (self.check_out - self.check_in).num_days()
    }

    pub fn set_status(&mut self, next: BookingStatus) {
        self.status = next;
        self.updated_at = Utc::now();
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PaymentStatus {
    Pending,
    Completed,
    Failed,
    Refunded,
}

impl PaymentStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            PaymentStatus::Pending => "PENDING",
            PaymentStatus::Completed => "COMPLETED",
            PaymentStatus::Failed => "FAILED",
            PaymentStatus::Refunded => "REFUNDED",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "PENDING" => Some(PaymentStatus::Pending),
            "COMPLETED" => Some(PaymentStatus::Completed),
            "FAILED" => Some(PaymentStatus::Failed),
            "REFUNDED" => Some(PaymentStatus::Refunded),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PaymentMethod {
    CreditCard,
    BankTransfer,
    Cash,
    EWallet,
}

impl PaymentMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            PaymentMethod::CreditCard => "CREDIT_CARD",
            PaymentMethod::BankTransfer => "BANK_TRANSFER",
            PaymentMethod::Cash => "CASH",
            PaymentMethod::EWallet => "E_WALLET",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "CREDIT_CARD" => Some(PaymentMethod::CreditCard),
            "BANK_TRANSFER" => Some(PaymentMethod::BankTransfer),
            "CASH" => Some(PaymentMethod::Cash),
            "E_WALLET" => Some(PaymentMethod::EWallet),
            _ => None,
        }
    }
}

/// A recorded payment. One Completed payment finalizes one booking.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Payment {
    pub id: Uuid,
    pub booking_id: Uuid,
    pub amount_cents: i64,
    pub method: PaymentMethod,
    pub status: PaymentStatus,
    pub transaction_id: String,
    pub paid_at: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
}

impl Payment {
    pub fn completed(booking_id: Uuid, amount_cents: i64, method: PaymentMethod) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            booking_id,
            amount_cents,
            method,
            status: PaymentStatus::Completed,
            // Random token: wall-clock tick ids collide under concurrency.
            transaction_id: format!("PAY-{}", Uuid::new_v4().simple()),
            paid_at: now,
            created_at: now,
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ReviewStatus {
    Active,
    Hidden,
}

impl ReviewStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ReviewStatus::Active => "ACTIVE",
            ReviewStatus::Hidden => "HIDDEN",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "ACTIVE" => Some(ReviewStatus::Active),
            "HIDDEN" => Some(ReviewStatus::Hidden),
            _ => None,
        }
    }
}

/// A guest review, one per (user, room)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Review {
    pub id: Uuid,
    pub room_id: Uuid,
    pub user_id: Uuid,
    pub booking_id: Option<Uuid>,
    pub rating: i32,
    pub comment: String,
    pub status: ReviewStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Review {
    pub fn new(
        room_id: Uuid,
        user_id: Uuid,
        booking_id: Option<Uuid>,
        rating: i32,
        comment: String,
    ) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            room_id,
            user_id,
            booking_id,
            rating,
            comment,
            status: ReviewStatus::Active,
            created_at: now,
            updated_at: now,
        }
    }
}

/// Slim guest record. Identity and sessions live outside the engine; this
/// is only what ownership checks, dashboards and review listings need.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    pub id: Uuid,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub created_at: DateTime<Utc>,
}

impl User {
    pub fn new(first_name: String, last_name: String, email: String) -> Self {
        Self {
            id: Uuid::new_v4(),
            first_name,
            last_name,
            email,
            created_at: Utc::now(),
        }
    }

    pub fn display_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_round_trip() {
        for s in [
            BookingStatus::Pending,
            BookingStatus::Confirmed,
            BookingStatus::CheckedIn,
            BookingStatus::CheckedOut,
            BookingStatus::Cancelled,
        ] {
            assert_eq!(BookingStatus::parse(s.as_str()), Some(s));
        }
    }

    #[test]
    fn transition_table() {
        use BookingStatus::*;
        assert!(Pending.can_transition_to(Confirmed));
        assert!(Pending.can_transition_to(Cancelled));
        assert!(Confirmed.can_transition_to(CheckedIn));
        assert!(Confirmed.can_transition_to(Cancelled));
        assert!(CheckedIn.can_transition_to(CheckedOut));

        // CheckedIn guests cannot be cancelled
        assert!(!CheckedIn.can_transition_to(Cancelled));
        // terminal states go nowhere
        assert!(!Cancelled.can_transition_to(Confirmed));
        assert!(!CheckedOut.can_transition_to(CheckedIn));
        // no skipping ahead
        assert!(!Pending.can_transition_to(CheckedIn));
        assert!(!Pending.can_transition_to(CheckedOut));
    }

    #[test]
    fn occupancy_filter() {
        assert!(BookingStatus::Pending.occupies_room());
        assert!(BookingStatus::Confirmed.occupies_room());
        assert!(BookingStatus::CheckedIn.occupies_room());
        assert!(!BookingStatus::CheckedOut.occupies_room());
        assert!(!BookingStatus::Cancelled.occupies_room());
    }

    #[test]
    fn nights_by_calendar_days() {
        let b = Booking::new(
            Uuid::new_v4(),
            Uuid::new_v4(),
            NaiveDate::from_ymd_opt(2024, 1, 10).unwrap(),
            NaiveDate::from_ymd_opt(2024, 1, 13).unwrap(),
            2,
            30000,
            None,
        );
        assert_eq!(b.nights(), 3);
    }
}
