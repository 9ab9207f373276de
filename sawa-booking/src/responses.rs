use chrono::Utc;
use std::sync::Arc;
use uuid::Uuid;

use crate::lifecycle::{BookingLifecycle, LifecycleError};
use sawa_core::{HostDirectory, NotificationTemplate, Notifier};
use sawa_domain::{BookingRepository, HostAction, HostResponse};
use sawa_shared::models::events::BookingRejectedEvent;

#[derive(Debug, thiserror::Error)]
pub enum TrackerError {
    #[error("Booking not found: {0}")]
    BookingNotFound(Uuid),

    #[error("Storage failure: {0}")]
    Storage(String),
}

impl TrackerError {
    fn storage(e: Box<dyn std::error::Error + Send + Sync>) -> Self {
        Self::Storage(e.to_string())
    }
}

/// Owns the per-host response map on a booking and the "every eligible
/// host has rejected" detection that auto-closes it.
pub struct HostResponseTracker {
    bookings: Arc<dyn BookingRepository>,
    directory: Arc<dyn HostDirectory>,
    lifecycle: Arc<BookingLifecycle>,
    notifier: Arc<dyn Notifier>,
}

impl HostResponseTracker {
    pub fn new(
        bookings: Arc<dyn BookingRepository>,
        directory: Arc<dyn HostDirectory>,
        lifecycle: Arc<BookingLifecycle>,
        notifier: Arc<dyn Notifier>,
    ) -> Self {
        Self {
            bookings,
            directory,
            lifecycle,
            notifier,
        }
    }

    pub async fn record_offer(
        &self,
        booking_id: Uuid,
        host_id: Uuid,
        offer_id: Uuid,
    ) -> Result<(), TrackerError> {
        self.upsert(
            booking_id,
            host_id,
            HostResponse::now(HostAction::Offered, Some(offer_id)),
        )
        .await
    }

    /// Upgrade a host's entry when the traveler turns their offer down.
    /// Does not touch booking status.
    pub async fn record_traveler_decline(
        &self,
        booking_id: Uuid,
        host_id: Uuid,
        offer_id: Uuid,
    ) -> Result<(), TrackerError> {
        self.upsert(
            booking_id,
            host_id,
            HostResponse::now(HostAction::DeclinedByTraveler, Some(offer_id)),
        )
        .await
    }

    /// Record a host bowing out, then decide whether the booking is dead.
    ///
    /// The eligible-host roster is re-fetched at decision time, never
    /// cached: city assignments move between rejections, and the resulting
    /// check-then-act race is tolerated because the rejected transition is
    /// idempotent. Returns whether this call closed the booking.
    pub async fn record_rejection(
        &self,
        booking_id: Uuid,
        host_id: Uuid,
    ) -> Result<bool, TrackerError> {
        self.upsert(
            booking_id,
            host_id,
            HostResponse::now(HostAction::Rejected, None),
        )
        .await?;

        // Fresh read of both sides of the quantifier
        let booking = self
            .bookings
            .get(booking_id)
            .await
            .map_err(TrackerError::storage)?
            .ok_or(TrackerError::BookingNotFound(booking_id))?;
        if !booking.is_open() {
            return Ok(false);
        }

        let roster = self
            .directory
            .eligible_hosts(&booking.city)
            .await
            .map_err(TrackerError::storage)?;
        if !booking.all_rejected(&roster) {
            return Ok(false);
        }

        let applied = match self.lifecycle.reject(booking_id).await {
            Ok(applied) => applied,
            // A concurrent accept or cancel got there first; nothing to do
            Err(LifecycleError::InvalidTransition { .. }) => false,
            Err(LifecycleError::BookingNotFound(id)) => {
                return Err(TrackerError::BookingNotFound(id))
            }
            Err(e) => return Err(TrackerError::Storage(e.to_string())),
        };

        if applied {
            let payload = BookingRejectedEvent {
                booking_id,
                traveler_id: booking.traveler_id,
                city: booking.city.clone(),
                timestamp: Utc::now().timestamp(),
            };
            if let Err(e) = self
                .notifier
                .notify(
                    booking.traveler_id,
                    NotificationTemplate::BookingRejected,
                    serde_json::to_value(&payload).unwrap_or_default(),
                )
                .await
            {
                tracing::warn!(%booking_id, "rejection notification failed: {}", e);
            }
        }
        Ok(applied)
    }

    async fn upsert(
        &self,
        booking_id: Uuid,
        host_id: Uuid,
        response: HostResponse,
    ) -> Result<(), TrackerError> {
        // Existence check keeps a typed error instead of a storage message
        self.bookings
            .get(booking_id)
            .await
            .map_err(TrackerError::storage)?
            .ok_or(TrackerError::BookingNotFound(booking_id))?;
        self.bookings
            .upsert_host_response(booking_id, host_id, response)
            .await
            .map_err(TrackerError::storage)
    }
}
