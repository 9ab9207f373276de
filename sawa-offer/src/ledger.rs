use chrono::{Duration, Utc};
use std::sync::Arc;
use uuid::Uuid;

use sawa_domain::{
    BookingRepository, ConversationRepository, Offer, OfferRepository, OfferStatus,
};
use sawa_pricing::{compute_breakdown, PricingError};
use sawa_shared::{HostCategory, OfferOrigin, OfferType};

/// How long a bid stays open, by who started the negotiation
#[derive(Debug, Clone, Copy)]
pub struct OfferHorizons {
    pub host_initiated: Duration,
    pub traveler_solicited: Duration,
}

impl Default for OfferHorizons {
    fn default() -> Self {
        Self {
            host_initiated: Duration::days(3),
            traveler_solicited: Duration::days(7),
        }
    }
}

impl OfferHorizons {
    pub fn from_days(host_initiated: i64, traveler_solicited: i64) -> Self {
        Self {
            host_initiated: Duration::days(host_initiated),
            traveler_solicited: Duration::days(traveler_solicited),
        }
    }

    pub fn for_origin(&self, origin: OfferOrigin) -> Duration {
        match origin {
            OfferOrigin::HostInitiated => self.host_initiated,
            OfferOrigin::TravelerSolicited => self.traveler_solicited,
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum LedgerError {
    #[error(transparent)]
    InvalidPrice(#[from] PricingError),

    #[error("Booking not found: {0}")]
    BookingNotFound(Uuid),

    #[error("Booking not open for offers: {0}")]
    BookingNotOpen(Uuid),

    #[error("Host {host_id} already has an active {offer_type:?} offer on booking {booking_id}")]
    DuplicateActiveOffer {
        booking_id: Uuid,
        host_id: Uuid,
        offer_type: OfferType,
    },

    #[error("Offer not found: {0}")]
    OfferNotFound(Uuid),

    #[error("Offer not pending: {0}")]
    OfferNotPending(Uuid),

    #[error("Storage failure: {0}")]
    Storage(String),
}

impl LedgerError {
    fn storage(e: Box<dyn std::error::Error + Send + Sync>) -> Self {
        Self::Storage(e.to_string())
    }
}

/// Owns creation, status transitions, and expiry of the offers on a
/// booking. Offers only leave PENDING through traveler action, the
/// settlement cascade, or the expiry sweep.
pub struct OfferLedger {
    offers: Arc<dyn OfferRepository>,
    bookings: Arc<dyn BookingRepository>,
    conversations: Arc<dyn ConversationRepository>,
    horizons: OfferHorizons,
}

impl OfferLedger {
    pub fn new(
        offers: Arc<dyn OfferRepository>,
        bookings: Arc<dyn BookingRepository>,
        conversations: Arc<dyn ConversationRepository>,
        horizons: OfferHorizons,
    ) -> Self {
        Self {
            offers,
            bookings,
            conversations,
            horizons,
        }
    }

    /// Record a host's priced bid against an open booking.
    ///
    /// Also makes sure the (booking, host) conversation channel exists;
    /// first engagement creates it lazily.
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
        let breakdown = compute_breakdown(base_cents, host_category, origin)?;

        let booking = self
            .bookings
            .get(booking_id)
            .await
            .map_err(LedgerError::storage)?
            .ok_or(LedgerError::BookingNotFound(booking_id))?;
        if !booking.is_open() {
            return Err(LedgerError::BookingNotOpen(booking_id));
        }

        let existing = self
            .offers
            .list_for_booking(booking_id)
            .await
            .map_err(LedgerError::storage)?;
        for other in existing
            .iter()
            .filter(|o| o.host_id == host_id && o.offer_type == offer_type)
        {
            if other.status == OfferStatus::Pending && other.is_expired() {
                // Lazy expiry: a stale pending bid does not block a new one
                let _ = self
                    .offers
                    .transition(other.id, OfferStatus::Pending, OfferStatus::Expired)
                    .await
                    .map_err(LedgerError::storage)?;
                continue;
            }
            if !other.is_terminal() {
                return Err(LedgerError::DuplicateActiveOffer {
                    booking_id,
                    host_id,
                    offer_type,
                });
            }
        }

        let expires_at = Utc::now() + self.horizons.for_origin(origin);
        let offer = Offer::new(
            booking_id,
            host_id,
            booking.traveler_id,
            offer_type,
            origin,
            host_category,
            breakdown,
            details,
            expires_at,
        );
        self.offers
            .insert(&offer)
            .await
            .map_err(LedgerError::storage)?;

        self.conversations
            .find_or_create(booking_id, booking.traveler_id, host_id)
            .await
            .map_err(LedgerError::storage)?;

        tracing::info!(
            offer_id = %offer.id,
            %booking_id,
            %host_id,
            total_cents = offer.total_cents,
            "offer submitted"
        );
        Ok(offer)
    }

    pub async fn get_offer(&self, offer_id: Uuid) -> Result<Offer, LedgerError> {
        self.offers
            .get(offer_id)
            .await
            .map_err(LedgerError::storage)?
            .ok_or(LedgerError::OfferNotFound(offer_id))
    }

    /// PENDING -> DECLINED. Declining an already-declined or expired offer
    /// is a no-op; declining an accepted offer is refused.
    pub async fn decline_offer(&self, offer_id: Uuid) -> Result<(), LedgerError> {
        let offer = self.get_offer(offer_id).await?;
        match offer.status {
            OfferStatus::Declined | OfferStatus::Expired => Ok(()),
            OfferStatus::Accepted => Err(LedgerError::OfferNotPending(offer_id)),
            OfferStatus::Pending => {
                let applied = self
                    .offers
                    .transition(offer_id, OfferStatus::Pending, OfferStatus::Declined)
                    .await
                    .map_err(LedgerError::storage)?;
                if applied {
                    return Ok(());
                }
                // Lost a race; idempotent only if the other writer declined it
                match self.get_offer(offer_id).await?.status {
                    OfferStatus::Declined | OfferStatus::Expired => Ok(()),
                    _ => Err(LedgerError::OfferNotPending(offer_id)),
                }
            }
        }
    }

    /// All offers on the booking that are not declined or expired, with the
    /// clock applied: stale pending offers are excluded and opportunistically
    /// marked EXPIRED on the way out.
    pub async fn list_active_offers(&self, booking_id: Uuid) -> Result<Vec<Offer>, LedgerError> {
        let offers = self
            .offers
            .list_for_booking(booking_id)
            .await
            .map_err(LedgerError::storage)?;

        let mut active = Vec::new();
        for offer in offers {
            if offer.is_terminal() {
                continue;
            }
            if offer.status == OfferStatus::Pending && offer.is_expired() {
                let _ = self
                    .offers
                    .transition(offer.id, OfferStatus::Pending, OfferStatus::Expired)
                    .await
                    .map_err(LedgerError::storage)?;
                continue;
            }
            active.push(offer);
        }
        Ok(active)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_horizon_selection() {
        let horizons = OfferHorizons::default();
        assert_eq!(
            horizons.for_origin(OfferOrigin::HostInitiated),
            Duration::days(3)
        );
        assert_eq!(
            horizons.for_origin(OfferOrigin::TravelerSolicited),
            Duration::days(7)
        );
    }
}
