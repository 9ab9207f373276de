use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use sawa_pricing::CommissionBreakdown;
use sawa_shared::{HostCategory, OfferOrigin, OfferType};

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum OfferStatus {
    Pending,
    Accepted,
    Declined,
    Expired,
}

/// One host's priced bid against a booking.
///
/// Owned by its host until traveler action: only the traveler's accept and
/// the settlement cascade may move it out of PENDING, plus the lazy expiry
/// sweep. Expiry is judged by the clock, not just the stored status; a
/// PENDING offer past `expires_at` is already dead.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Offer {
    pub id: Uuid,
    pub booking_id: Uuid,
    pub host_id: Uuid,
    pub traveler_id: Uuid,
    pub offer_type: OfferType,
    pub origin: OfferOrigin,
    pub host_category: HostCategory,
    pub breakdown: CommissionBreakdown,
    pub total_cents: i64,
    pub details: String,
    pub status: OfferStatus,
    pub expires_at: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Offer {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        booking_id: Uuid,
        host_id: Uuid,
        traveler_id: Uuid,
        offer_type: OfferType,
        origin: OfferOrigin,
        host_category: HostCategory,
        breakdown: CommissionBreakdown,
        details: String,
        expires_at: DateTime<Utc>,
    ) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            booking_id,
            host_id,
            traveler_id,
            offer_type,
            origin,
            host_category,
            total_cents: breakdown.total_cents(),
            breakdown,
            details,
            status: OfferStatus::Pending,
            expires_at,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn is_expired(&self) -> bool {
        Utc::now() > self.expires_at
    }

    /// Still a live bid: pending and within its expiry horizon
    pub fn is_live(&self) -> bool {
        self.status == OfferStatus::Pending && !self.is_expired()
    }

    /// Retracted one way or another
    pub fn is_terminal(&self) -> bool {
        matches!(self.status, OfferStatus::Declined | OfferStatus::Expired)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;
    use sawa_pricing::compute_breakdown;

    fn offer(expires_in: Duration) -> Offer {
        let breakdown = compute_breakdown(
            10_000,
            HostCategory::Independent,
            OfferOrigin::TravelerSolicited,
        )
        .unwrap();
        Offer::new(
            Uuid::new_v4(),
            Uuid::new_v4(),
            Uuid::new_v4(),
            OfferType::Service,
            OfferOrigin::TravelerSolicited,
            HostCategory::Independent,
            breakdown,
            "City tour, lunch included".to_string(),
            Utc::now() + expires_in,
        )
    }

    #[test]
    fn test_new_offer_is_live() {
        let o = offer(Duration::days(7));
        assert_eq!(o.status, OfferStatus::Pending);
        assert_eq!(o.total_cents, 13_500);
        assert!(o.is_live());
        assert!(!o.is_terminal());
    }

    #[test]
    fn test_lazy_expiry() {
        // Stored status still reads PENDING, but the clock has moved on
        let o = offer(Duration::minutes(-1));
        assert_eq!(o.status, OfferStatus::Pending);
        assert!(o.is_expired());
        assert!(!o.is_live());
    }
}
