use chrono::Utc;
use std::sync::Arc;
use uuid::Uuid;

use crate::lifecycle::{BookingLifecycle, LifecycleError};
use sawa_core::{NotificationTemplate, Notifier};
use sawa_domain::{
    Booking, BookingRepository, BookingStatus, ConversationRepository, HostAction, HostResponse,
    MessageRepository, OfferRepository, OfferStatus,
};
use sawa_shared::models::events::OfferAcceptedEvent;
use sawa_shared::OfferType;

#[derive(Debug, thiserror::Error)]
pub enum SettlementError {
    #[error("Offer not found: {0}")]
    OfferNotFound(Uuid),

    #[error("Offer not pending: {0}")]
    OfferNotPending(Uuid),

    #[error("Offer expired: {0}")]
    OfferExpired(Uuid),

    #[error("A {offer_type:?} offer already won booking {booking_id}")]
    CategoryAlreadyWon {
        booking_id: Uuid,
        offer_type: OfferType,
    },

    #[error("Booking not found: {0}")]
    BookingNotFound(Uuid),

    #[error("Booking not open: {0}")]
    BookingNotOpen(Uuid),

    #[error("Invalid state transition from {from} to {to}")]
    InvalidTransition { from: String, to: String },

    #[error("Storage failure: {0}")]
    Storage(String),
}

impl SettlementError {
    fn storage(e: Box<dyn std::error::Error + Send + Sync>) -> Self {
        Self::Storage(e.to_string())
    }
}

impl From<LifecycleError> for SettlementError {
    fn from(e: LifecycleError) -> Self {
        match e {
            LifecycleError::BookingNotFound(id) => Self::BookingNotFound(id),
            LifecycleError::InvalidTransition { from, to } => Self::InvalidTransition { from, to },
            other => Self::Storage(other.to_string()),
        }
    }
}

/// What a cleanup pass over one booking actually removed or retracted.
/// Warnings are per-item failures; re-running the cascade completes them.
#[derive(Debug, Default)]
pub struct CascadeOutcome {
    pub conversations_deleted: usize,
    pub messages_deleted: u64,
    pub offers_declined: usize,
    pub warnings: Vec<String>,
}

impl CascadeOutcome {
    fn merge(mut self, other: CascadeOutcome) -> Self {
        self.conversations_deleted += other.conversations_deleted;
        self.messages_deleted += other.messages_deleted;
        self.offers_declined += other.offers_declined;
        self.warnings.extend(other.warnings);
        self
    }
}

#[derive(Debug)]
pub struct SettlementResult {
    pub winning_offer_id: Uuid,
    pub booking: Booking,
    pub conversations_deleted: usize,
    pub messages_deleted: u64,
    pub offers_declined: usize,
    /// Per-item cleanup failures, already recorded on the booking for the
    /// retry sweep; the settlement itself has committed regardless
    pub cleanup_warnings: Vec<String>,
}

/// Declares a winner, confirms the booking, and retracts every competing
/// bid and its chat artifacts.
///
/// The category invariant is closed by a conditional write on the
/// booking's winner slot before the offer is touched; everything after the
/// booking confirms is a best-effort, re-runnable sweep.
pub struct SettlementOrchestrator {
    offers: Arc<dyn OfferRepository>,
    bookings: Arc<dyn BookingRepository>,
    conversations: Arc<dyn ConversationRepository>,
    messages: Arc<dyn MessageRepository>,
    lifecycle: Arc<BookingLifecycle>,
    notifier: Arc<dyn Notifier>,
}

impl SettlementOrchestrator {
    pub fn new(
        offers: Arc<dyn OfferRepository>,
        bookings: Arc<dyn BookingRepository>,
        conversations: Arc<dyn ConversationRepository>,
        messages: Arc<dyn MessageRepository>,
        lifecycle: Arc<BookingLifecycle>,
        notifier: Arc<dyn Notifier>,
    ) -> Self {
        Self {
            offers,
            bookings,
            conversations,
            messages,
            lifecycle,
            notifier,
        }
    }

    /// Traveler accepts one offer; every check is ordered and gated, and
    /// once the booking confirms the operation is committed no matter how
    /// the cleanup goes.
    pub async fn accept_offer(&self, offer_id: Uuid) -> Result<SettlementResult, SettlementError> {
        // 1. Load and validate the offer
        let offer = self
            .offers
            .get(offer_id)
            .await
            .map_err(SettlementError::storage)?
            .ok_or(SettlementError::OfferNotFound(offer_id))?;
        if offer.status != OfferStatus::Pending {
            return Err(SettlementError::OfferNotPending(offer_id));
        }
        if offer.is_expired() {
            // Opportunistic lazy expiry on the way out
            let _ = self
                .offers
                .transition(offer_id, OfferStatus::Pending, OfferStatus::Expired)
                .await
                .map_err(SettlementError::storage)?;
            return Err(SettlementError::OfferExpired(offer_id));
        }

        let booking = self
            .bookings
            .get(offer.booking_id)
            .await
            .map_err(SettlementError::storage)?
            .ok_or(SettlementError::BookingNotFound(offer.booking_id))?;
        if !booking.is_open() {
            return Err(SettlementError::BookingNotOpen(offer.booking_id));
        }

        // 2. Category arbitration: single conditional write on the winner
        // slot, the only thing standing between two concurrent accepts
        let claimed = self
            .bookings
            .claim_category_winner(offer.booking_id, offer.offer_type, offer_id)
            .await
            .map_err(SettlementError::storage)?;
        if !claimed {
            return Err(SettlementError::CategoryAlreadyWon {
                booking_id: offer.booking_id,
                offer_type: offer.offer_type,
            });
        }

        // 3. Commit: winning offer, then the booking itself
        let accepted = self
            .offers
            .transition(offer_id, OfferStatus::Pending, OfferStatus::Accepted)
            .await
            .map_err(SettlementError::storage)?;
        if !accepted {
            return Err(SettlementError::OfferNotPending(offer_id));
        }
        let confirmed = match self
            .lifecycle
            .confirm(offer.booking_id, offer.host_id, offer.total_cents)
            .await
        {
            Ok(booking) => booking,
            Err(e) => {
                // The booking left PENDING between the winner claim and the
                // confirm; put the offer back so it is not stranded ACCEPTED
                // on a closed booking. The winner slot stays behind, and
                // re-claiming it with this same offer id succeeds.
                if let Err(undo) = self
                    .offers
                    .transition(offer_id, OfferStatus::Accepted, OfferStatus::Pending)
                    .await
                {
                    tracing::warn!(
                        %offer_id,
                        booking_id = %offer.booking_id,
                        "reverting offer after lost confirm failed: {}",
                        undo
                    );
                }
                return Err(match e {
                    LifecycleError::InvalidTransition { .. } => {
                        SettlementError::BookingNotOpen(offer.booking_id)
                    }
                    other => other.into(),
                });
            }
        };

        // 4. Cascade cleanup; failures degrade to warnings, never roll back
        let outcome = self.run_cascade(offer.booking_id, offer.host_id).await;
        if let Err(e) = self
            .bookings
            .set_cleanup_pending(offer.booking_id, !outcome.warnings.is_empty())
            .await
        {
            tracing::warn!(booking_id = %offer.booking_id, "failed to record cleanup flag: {}", e);
        }
        for warning in &outcome.warnings {
            tracing::warn!(booking_id = %offer.booking_id, "settlement cleanup: {}", warning);
        }

        // 5. Best-effort notifications for both parties
        let payload = OfferAcceptedEvent {
            offer_id,
            booking_id: offer.booking_id,
            host_id: offer.host_id,
            traveler_id: offer.traveler_id,
            total_cents: offer.total_cents,
            timestamp: Utc::now().timestamp(),
        };
        self.notify_quietly(offer.host_id, NotificationTemplate::OfferAccepted, &payload)
            .await;
        self.notify_quietly(
            offer.traveler_id,
            NotificationTemplate::BookingConfirmed,
            &payload,
        )
        .await;

        tracing::info!(
            %offer_id,
            booking_id = %offer.booking_id,
            host_id = %offer.host_id,
            conversations_deleted = outcome.conversations_deleted,
            offers_declined = outcome.offers_declined,
            "settlement committed"
        );

        Ok(SettlementResult {
            winning_offer_id: offer_id,
            booking: confirmed,
            conversations_deleted: outcome.conversations_deleted,
            messages_deleted: outcome.messages_deleted,
            offers_declined: outcome.offers_declined,
            cleanup_warnings: outcome.warnings,
        })
    }

    /// Re-run the cleanup sweep for a confirmed booking. Idempotent; clears
    /// the partial-cleanup flag once a pass finishes without warnings.
    pub async fn reconcile(&self, booking_id: Uuid) -> Result<CascadeOutcome, SettlementError> {
        let booking = self
            .bookings
            .get(booking_id)
            .await
            .map_err(SettlementError::storage)?
            .ok_or(SettlementError::BookingNotFound(booking_id))?;
        let winner = match (&booking.status, booking.confirmed_host_id) {
            (BookingStatus::Confirmed, Some(host_id)) => host_id,
            _ => {
                return Err(SettlementError::InvalidTransition {
                    from: format!("{:?}", booking.status),
                    to: "RECONCILED".to_string(),
                })
            }
        };

        let outcome = self.run_cascade(booking_id, winner).await;
        if outcome.warnings.is_empty() {
            self.bookings
                .set_cleanup_pending(booking_id, false)
                .await
                .map_err(SettlementError::storage)?;
        }
        Ok(outcome)
    }

    /// Derived settled check: confirmed, no live losing bids, and no chat
    /// channels left for hosts other than the winner
    pub async fn is_fully_settled(&self, booking_id: Uuid) -> Result<bool, SettlementError> {
        let booking = self
            .bookings
            .get(booking_id)
            .await
            .map_err(SettlementError::storage)?
            .ok_or(SettlementError::BookingNotFound(booking_id))?;
        let winner = match (&booking.status, booking.confirmed_host_id) {
            (BookingStatus::Confirmed, Some(host_id)) => host_id,
            _ => return Ok(false),
        };

        let offers = self
            .offers
            .list_for_booking(booking_id)
            .await
            .map_err(SettlementError::storage)?;
        if offers.iter().any(|o| o.is_live()) {
            return Ok(false);
        }

        let conversations = self
            .conversations
            .list_for_booking(booking_id)
            .await
            .map_err(SettlementError::storage)?;
        Ok(conversations.iter().all(|c| c.includes_host(&winner)))
    }

    /// One cleanup pass. The two sub-sweeps touch disjoint collections and
    /// run concurrently; each item is independent and retryable.
    async fn run_cascade(&self, booking_id: Uuid, winner_host: Uuid) -> CascadeOutcome {
        let (chat, offers) = tokio::join!(
            self.cleanup_conversations(booking_id, winner_host),
            self.retract_losing_offers(booking_id)
        );
        chat.merge(offers)
    }

    /// Delete every losing host's conversation, messages first so a failed
    /// conversation delete leaves a re-runnable remainder
    async fn cleanup_conversations(&self, booking_id: Uuid, winner_host: Uuid) -> CascadeOutcome {
        let mut outcome = CascadeOutcome::default();

        let conversations = match self.conversations.list_for_booking(booking_id).await {
            Ok(conversations) => conversations,
            Err(e) => {
                outcome
                    .warnings
                    .push(format!("listing conversations failed: {}", e));
                return outcome;
            }
        };

        for conversation in conversations
            .into_iter()
            .filter(|c| !c.includes_host(&winner_host))
        {
            match self.messages.delete_for_conversation(conversation.id).await {
                Ok(count) => outcome.messages_deleted += count,
                Err(e) => {
                    outcome.warnings.push(format!(
                        "deleting messages of conversation {} failed: {}",
                        conversation.id, e
                    ));
                    continue;
                }
            }
            match self.conversations.delete(conversation.id).await {
                Ok(true) => outcome.conversations_deleted += 1,
                Ok(false) => {}
                Err(e) => outcome.warnings.push(format!(
                    "deleting conversation {} failed: {}",
                    conversation.id, e
                )),
            }
        }
        outcome
    }

    /// Retract every still-pending bid; the winner is already ACCEPTED by
    /// the time this runs, so a plain pending filter is the losing set
    async fn retract_losing_offers(&self, booking_id: Uuid) -> CascadeOutcome {
        let mut outcome = CascadeOutcome::default();

        let offers = match self.offers.list_for_booking(booking_id).await {
            Ok(offers) => offers,
            Err(e) => {
                outcome.warnings.push(format!("listing offers failed: {}", e));
                return outcome;
            }
        };

        for offer in offers.into_iter().filter(|o| o.status == OfferStatus::Pending) {
            match self
                .offers
                .transition(offer.id, OfferStatus::Pending, OfferStatus::Declined)
                .await
            {
                Ok(true) => {
                    outcome.offers_declined += 1;
                    // Keep the booking's response map coherent with the bid
                    if let Err(e) = self
                        .bookings
                        .upsert_host_response(
                            booking_id,
                            offer.host_id,
                            HostResponse::now(HostAction::DeclinedByTraveler, Some(offer.id)),
                        )
                        .await
                    {
                        outcome.warnings.push(format!(
                            "recording decline of host {} failed: {}",
                            offer.host_id, e
                        ));
                    }
                }
                Ok(false) => {}
                Err(e) => outcome
                    .warnings
                    .push(format!("declining offer {} failed: {}", offer.id, e)),
            }
        }
        outcome
    }

    async fn notify_quietly(
        &self,
        recipient: Uuid,
        template: NotificationTemplate,
        payload: &OfferAcceptedEvent,
    ) {
        let value = serde_json::to_value(payload).unwrap_or_default();
        if let Err(e) = self.notifier.notify(recipient, template, value).await {
            tracing::warn!(%recipient, ?template, "notification failed: {}", e);
        }
    }
}
