pub mod availability;
pub mod booking;
pub mod memory;
pub mod models;
pub mod payment;
pub mod reporting;
pub mod repository;
pub mod review;

use crate::models::BookingStatus;
use uuid::Uuid;

/// Error taxonomy shared by every engine operation. The API layer maps these
/// onto HTTP statuses; the core never produces user-facing copy beyond the
/// Display text.
#[derive(Debug, thiserror::Error)]
pub enum CoreError {
    #[error("{0} not found")]
    NotFound(String),

    #[error("Room is not available: {0}")]
    RoomUnavailable(String),

    #[error("Invalid status transition from {from} to {to}")]
    InvalidTransition {
        from: BookingStatus,
        to: BookingStatus,
    },

    #[error("Booking {0} already has a completed payment")]
    AlreadyPaid(Uuid),

    #[error("Booking {0} is already cancelled")]
    AlreadyCancelled(Uuid),

    #[error("Validation failed: {0}")]
    Validation(String),

    #[error("Storage error: {0}")]
    Storage(String),
}

pub type CoreResult<T> = Result<T, CoreError>;

impl CoreError {
    pub fn not_found(what: impl Into<String>) -> Self {
        Self::NotFound(what.into())
    }

    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }
}
