use chrono::{NaiveDate, Utc};
use std::sync::Arc;
use uuid::Uuid;

use sawa_domain::{Booking, BookingRepository, BookingStatus, CancellationInfo};

#[derive(Debug, thiserror::Error)]
pub enum LifecycleError {
    #[error("Booking not found: {0}")]
    BookingNotFound(Uuid),

    #[error("Invalid state transition from {from} to {to}")]
    InvalidTransition { from: String, to: String },

    #[error("Booking already cancelled: {0}")]
    AlreadyCancelled(Uuid),

    #[error("Storage failure: {0}")]
    Storage(String),
}

impl LifecycleError {
    fn storage(e: Box<dyn std::error::Error + Send + Sync>) -> Self {
        Self::Storage(e.to_string())
    }

    fn invalid(from: &BookingStatus, to: &str) -> Self {
        Self::InvalidTransition {
            from: format!("{:?}", from),
            to: to.to_string(),
        }
    }
}

/// Cancellation refunds the full traveler-paid total; a booking that never
/// confirmed has nothing to refund
fn refund_amount(booking: &Booking) -> i64 {
    booking.total_cents.unwrap_or(0)
}

fn is_cancellable(status: &BookingStatus) -> bool {
    matches!(status, BookingStatus::Pending | BookingStatus::Confirmed)
}

/// Manages the booking status state machine.
///
/// The only writer of `Booking.status`; every transition goes through a
/// conditional write on the prior status, so a guard miss fails without
/// mutating anything.
pub struct BookingLifecycle {
    bookings: Arc<dyn BookingRepository>,
}

impl BookingLifecycle {
    pub fn new(bookings: Arc<dyn BookingRepository>) -> Self {
        Self { bookings }
    }

    /// Traveler opens a request; the aggregate starts PENDING
    pub async fn create_booking(
        &self,
        traveler_id: Uuid,
        city: String,
        start_date: NaiveDate,
        end_date: NaiveDate,
        party_size: u32,
    ) -> Result<Booking, LifecycleError> {
        let booking = Booking::new(traveler_id, city, start_date, end_date, party_size);
        self.bookings
            .insert(&booking)
            .await
            .map_err(LifecycleError::storage)?;
        tracing::info!(booking_id = %booking.id, city = %booking.city, "booking created");
        Ok(booking)
    }

    pub async fn get_booking(&self, booking_id: Uuid) -> Result<Booking, LifecycleError> {
        self.bookings
            .get(booking_id)
            .await
            .map_err(LifecycleError::storage)?
            .ok_or(LifecycleError::BookingNotFound(booking_id))
    }

    /// PENDING -> CONFIRMED, binding the winning host and the total the
    /// traveler pays. Only the settlement orchestrator calls this.
    pub async fn confirm(
        &self,
        booking_id: Uuid,
        host_id: Uuid,
        total_cents: i64,
    ) -> Result<Booking, LifecycleError> {
        let applied = self
            .bookings
            .confirm_if_pending(booking_id, host_id, total_cents)
            .await
            .map_err(LifecycleError::storage)?;
        if !applied {
            let booking = self.get_booking(booking_id).await?;
            return Err(LifecycleError::invalid(&booking.status, "CONFIRMED"));
        }
        self.get_booking(booking_id).await
    }

    /// PENDING -> REJECTED, triggered by the all-hosts-rejected detection.
    /// Returns whether this call applied the transition; re-rejecting an
    /// already-rejected booking is a no-op.
    pub async fn reject(&self, booking_id: Uuid) -> Result<bool, LifecycleError> {
        let applied = self
            .bookings
            .reject_if_pending(booking_id)
            .await
            .map_err(LifecycleError::storage)?;
        if applied {
            tracing::info!(%booking_id, "booking rejected by all eligible hosts");
            return Ok(true);
        }
        let booking = self.get_booking(booking_id).await?;
        if booking.status == BookingStatus::Rejected {
            return Ok(false);
        }
        Err(LifecycleError::invalid(&booking.status, "REJECTED"))
    }

    /// Traveler-initiated cancellation from PENDING or CONFIRMED
    pub async fn cancel(
        &self,
        booking_id: Uuid,
        reason: String,
        category: Option<String>,
    ) -> Result<CancellationInfo, LifecycleError> {
        let booking = self.get_booking(booking_id).await?;

        if booking.status == BookingStatus::Cancelled {
            return Err(LifecycleError::AlreadyCancelled(booking_id));
        }
        if !is_cancellable(&booking.status) {
            return Err(LifecycleError::invalid(&booking.status, "CANCELLED"));
        }

        let info = CancellationInfo {
            reason,
            category,
            refund_cents: refund_amount(&booking),
            cancelled_at: Utc::now(),
        };
        let applied = self
            .bookings
            .cancel_if(booking_id, booking.status.clone(), info.clone())
            .await
            .map_err(LifecycleError::storage)?;
        if !applied {
            // Another writer moved the booking between our read and the CAS
            let fresh = self.get_booking(booking_id).await?;
            if fresh.status == BookingStatus::Cancelled {
                return Err(LifecycleError::AlreadyCancelled(booking_id));
            }
            return Err(LifecycleError::invalid(&fresh.status, "CANCELLED"));
        }

        tracing::info!(%booking_id, refund_cents = info.refund_cents, "booking cancelled");
        Ok(info)
    }
}
