use std::sync::Arc;
use tracing::info;
use uuid::Uuid;

use crate::models::{BookingStatus, Payment, PaymentMethod};
use crate::repository::{BookingRepository, PaymentRepository};
use crate::{CoreError, CoreResult};

/// Records payments against bookings. One Completed payment finalizes one
/// booking and advances it Pending → Confirmed.
pub struct PaymentService {
    bookings: Arc<dyn BookingRepository>,
    payments: Arc<dyn PaymentRepository>,
}

impl PaymentService {
    pub fn new(bookings: Arc<dyn BookingRepository>, payments: Arc<dyn PaymentRepository>) -> Self {
        Self { bookings, payments }
    }

    pub async fn record_payment(
        &self,
        booking_id: Uuid,
        method: PaymentMethod,
    ) -> CoreResult<Payment> {
        let mut booking = self
            .bookings
            .get_booking(booking_id)
            .await?
            .ok_or_else(|| CoreError::not_found(format!("booking {booking_id}")))?;

        if self
            .payments
            .find_completed_for_booking(booking_id)
            .await?
            .is_some()
        {
            return Err(CoreError::AlreadyPaid(booking_id));
        }

        // Only a Pending booking is waiting on money. Paying a cancelled or
        // already-progressed booking is a lifecycle violation.
        if booking.status != BookingStatus::Pending {
            return Err(CoreError::InvalidTransition {
                from: booking.status,
                to: BookingStatus::Confirmed,
            });
        }

        let payment = Payment::completed(booking_id, booking.total_cents, method);
        booking.set_status(BookingStatus::Confirmed);

        // Single unit of work: payment row plus booking status move together.
        self.payments.insert_payment(&payment, &booking).await?;

        info!(
            payment_id = %payment.id,
            booking_id = %booking_id,
            amount_cents = payment.amount_cents,
            transaction_id = %payment.transaction_id,
            "payment recorded"
        );
        Ok(payment)
    }

    pub async fn get_payment(&self, id: Uuid) -> CoreResult<Payment> {
        self.payments
            .get_payment(id)
            .await?
            .ok_or_else(|| CoreError::not_found(format!("payment {id}")))
    }
}
