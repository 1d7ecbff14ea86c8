use std::sync::Arc;

use innkeep_core::booking::{BookingRules, BookingService};
use innkeep_core::payment::PaymentService;
use innkeep_core::reporting::ReportingService;
use innkeep_core::repository::{
    BookingRepository, PaymentRepository, ReviewRepository, RoomRepository, UserRepository,
};
use innkeep_core::review::ReviewService;

#[derive(Clone)]
pub struct AppState {
    pub rooms: Arc<dyn RoomRepository>,
    pub bookings: Arc<BookingService>,
    pub payments: Arc<PaymentService>,
    pub reviews: Arc<ReviewService>,
    pub reports: Arc<ReportingService>,
    /// Days covered by report endpoints when the caller omits a window.
    pub report_window_days: i64,
}

impl AppState {
    pub fn new(
        rooms: Arc<dyn RoomRepository>,
        bookings: Arc<dyn BookingRepository>,
        payments: Arc<dyn PaymentRepository>,
        reviews: Arc<dyn ReviewRepository>,
        users: Arc<dyn UserRepository>,
        rules: BookingRules,
        report_window_days: i64,
    ) -> Self {
        Self {
            rooms: rooms.clone(),
            bookings: Arc::new(BookingService::new(rooms.clone(), bookings.clone(), rules)),
            payments: Arc::new(PaymentService::new(bookings.clone(), payments)),
            reviews: Arc::new(ReviewService::new(reviews, bookings.clone(), rooms.clone())),
            reports: Arc::new(ReportingService::new(bookings, rooms, users)),
            report_window_days,
        }
    }
}
