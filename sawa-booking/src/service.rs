use chrono::{NaiveDate, Utc};
use std::sync::Arc;
use uuid::Uuid;

use crate::lifecycle::{BookingLifecycle, LifecycleError};
use crate::responses::{HostResponseTracker, TrackerError};
use crate::settlement::{
    CascadeOutcome, SettlementError, SettlementOrchestrator, SettlementResult,
};
use sawa_core::{HostDirectory, NotificationTemplate, Notifier};
use sawa_domain::{
    Booking, BookingRepository, CancellationInfo, ConversationRepository, MessageRepository,
    Offer, OfferRepository,
};
use sawa_offer::{ExpirySweeper, LedgerError, OfferHorizons, OfferLedger};
use sawa_shared::models::events::{
    BookingCancelledEvent, OfferDeclinedEvent, OfferSubmittedEvent,
};
use sawa_shared::{HostCategory, OfferOrigin, OfferType};

/// The operation surface this core exposes to collaborators, wiring the
/// ledger, tracker, lifecycle manager, and settlement orchestrator over
/// one set of repositories.
pub struct NegotiationService {
    ledger: OfferLedger,
    tracker: HostResponseTracker,
    lifecycle: Arc<BookingLifecycle>,
    orchestrator: SettlementOrchestrator,
    sweeper: ExpirySweeper,
    notifier: Arc<dyn Notifier>,
}

impl NegotiationService {
    pub fn new(
        bookings: Arc<dyn BookingRepository>,
        offers: Arc<dyn OfferRepository>,
        conversations: Arc<dyn ConversationRepository>,
        messages: Arc<dyn MessageRepository>,
        directory: Arc<dyn HostDirectory>,
        notifier: Arc<dyn Notifier>,
        horizons: OfferHorizons,
    ) -> Self {
        let lifecycle = Arc::new(BookingLifecycle::new(bookings.clone()));
        Self {
            ledger: OfferLedger::new(
                offers.clone(),
                bookings.clone(),
                conversations.clone(),
                horizons,
            ),
            tracker: HostResponseTracker::new(
                bookings.clone(),
                directory,
                lifecycle.clone(),
                notifier.clone(),
            ),
            orchestrator: SettlementOrchestrator::new(
                offers.clone(),
                bookings,
                conversations,
                messages,
                lifecycle.clone(),
                notifier.clone(),
            ),
            lifecycle,
            sweeper: ExpirySweeper::new(offers),
            notifier,
        }
    }

    pub async fn create_booking(
        &self,
        traveler_id: Uuid,
        city: String,
        start_date: NaiveDate,
        end_date: NaiveDate,
        party_size: u32,
    ) -> Result<Booking, LifecycleError> {
        self.lifecycle
            .create_booking(traveler_id, city, start_date, end_date, party_size)
            .await
    }

    /// Host submits a priced bid; the ledger persists it and the tracker
    /// records the host's engagement on the booking
    #[allow(clippy::too_many_arguments)]
    pub async fn submit_offer(
        &self,
        booking_id: Uuid,
        host_id: Uuid,
        offer_type: OfferType,
        origin: OfferOrigin,
        host_category: HostCategory,
        base_cents: i64,
        details: String,
    ) -> Result<Offer, LedgerError> {
        let offer = self
            .ledger
            .submit_offer(
                booking_id,
                host_id,
                offer_type,
                origin,
                host_category,
                base_cents,
                details,
            )
            .await?;
        self.tracker
            .record_offer(booking_id, host_id, offer.id)
            .await
            .map_err(|e| match e {
                TrackerError::BookingNotFound(id) => LedgerError::BookingNotFound(id),
                TrackerError::Storage(msg) => LedgerError::Storage(msg),
            })?;

        let payload = OfferSubmittedEvent {
            offer_id: offer.id,
            booking_id,
            host_id,
            total_cents: offer.total_cents,
            timestamp: Utc::now().timestamp(),
        };
        if let Err(e) = self
            .notifier
            .notify(
                offer.traveler_id,
                NotificationTemplate::OfferReceived,
                serde_json::to_value(&payload).unwrap_or_default(),
            )
            .await
        {
            tracing::warn!(%booking_id, offer_id = %offer.id, "offer notification failed: {}", e);
        }
        Ok(offer)
    }

    pub async fn accept_offer(
        &self,
        offer_id: Uuid,
    ) -> Result<SettlementResult, SettlementError> {
        self.orchestrator.accept_offer(offer_id).await
    }

    /// Traveler turns one offer down without accepting anything; booking
    /// status is untouched
    pub async fn decline_offer(&self, offer_id: Uuid) -> Result<(), LedgerError> {
        let offer = self.ledger.get_offer(offer_id).await?;
        self.ledger.decline_offer(offer_id).await?;
        self.tracker
            .record_traveler_decline(offer.booking_id, offer.host_id, offer_id)
            .await
            .map_err(|e| match e {
                TrackerError::BookingNotFound(id) => LedgerError::BookingNotFound(id),
                TrackerError::Storage(msg) => LedgerError::Storage(msg),
            })?;

        let payload = OfferDeclinedEvent {
            offer_id,
            booking_id: offer.booking_id,
            host_id: offer.host_id,
            timestamp: Utc::now().timestamp(),
        };
        if let Err(e) = self
            .notifier
            .notify(
                offer.host_id,
                NotificationTemplate::OfferDeclined,
                serde_json::to_value(&payload).unwrap_or_default(),
            )
            .await
        {
            tracing::warn!(%offer_id, "decline notification failed: {}", e);
        }
        Ok(())
    }

    pub async fn record_rejection(
        &self,
        booking_id: Uuid,
        host_id: Uuid,
    ) -> Result<bool, TrackerError> {
        self.tracker.record_rejection(booking_id, host_id).await
    }

    pub async fn cancel_booking(
        &self,
        booking_id: Uuid,
        reason: String,
        category: Option<String>,
    ) -> Result<CancellationInfo, LifecycleError> {
        let booking = self.lifecycle.get_booking(booking_id).await?;
        let info = self.lifecycle.cancel(booking_id, reason, category).await?;

        let payload = BookingCancelledEvent {
            booking_id,
            traveler_id: booking.traveler_id,
            refund_cents: info.refund_cents,
            timestamp: Utc::now().timestamp(),
        };
        if let Err(e) = self
            .notifier
            .notify(
                booking.traveler_id,
                NotificationTemplate::BookingCancelled,
                serde_json::to_value(&payload).unwrap_or_default(),
            )
            .await
        {
            tracing::warn!(%booking_id, "cancellation notification failed: {}", e);
        }
        Ok(info)
    }

    /// One expiry pass over stale pending offers; CAS per offer, safe to
    /// call from concurrent workers
    pub async fn expire_stale(&self) -> Result<usize, LedgerError> {
        self.sweeper
            .sweep_once()
            .await
            .map_err(|e| LedgerError::Storage(e.to_string()))
    }

    pub async fn list_active_offers(&self, booking_id: Uuid) -> Result<Vec<Offer>, LedgerError> {
        self.ledger.list_active_offers(booking_id).await
    }

    pub async fn reconcile(&self, booking_id: Uuid) -> Result<CascadeOutcome, SettlementError> {
        self.orchestrator.reconcile(booking_id).await
    }

    pub async fn is_fully_settled(&self, booking_id: Uuid) -> Result<bool, SettlementError> {
        self.orchestrator.is_fully_settled(booking_id).await
    }
}
