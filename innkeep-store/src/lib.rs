pub mod app_config;
pub mod booking_repo;
pub mod database;
pub mod payment_repo;
pub mod review_repo;
pub mod room_repo;
pub mod user_repo;

pub use booking_repo::PgBookingRepository;
pub use database::DbClient;
pub use payment_repo::PgPaymentRepository;
pub use review_repo::PgReviewRepository;
pub use room_repo::PgRoomRepository;
pub use user_repo::PgUserRepository;

use innkeep_core::CoreError;

/// Storage failures surface as `CoreError::Storage`; constraint hits that
/// encode domain rules are translated by the individual repositories.
pub(crate) fn storage_err(err: sqlx::Error) -> CoreError {
    CoreError::Storage(err.to_string())
}
