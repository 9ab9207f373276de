use serde::{Deserialize, Serialize};
use sawa_shared::{HostCategory, OfferOrigin};

/// Commission rates applied to a host's base price, in basis points
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct CommissionScheme {
    pub sawa_fee_bps: u32,
    pub office_fee_bps: u32,
}

impl CommissionScheme {
    /// Select the scheme for an offer.
    ///
    /// Traveler-solicited offers price by host tier; host-initiated first
    /// offers use the flat 15/10 split regardless of tier.
    pub fn select(category: HostCategory, origin: OfferOrigin) -> Self {
        match (origin, category) {
            (OfferOrigin::HostInitiated, _) => Self {
                sawa_fee_bps: 1500,
                office_fee_bps: 1000,
            },
            (OfferOrigin::TravelerSolicited, HostCategory::Independent) => Self {
                sawa_fee_bps: 3500,
                office_fee_bps: 0,
            },
            (OfferOrigin::TravelerSolicited, HostCategory::OfficeAffiliated) => Self {
                sawa_fee_bps: 2800,
                office_fee_bps: 700,
            },
        }
    }
}

/// Traveler-facing price composition for one offer
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct CommissionBreakdown {
    pub base_cents: i64,
    pub sawa_fee_cents: i64,
    pub office_fee_cents: i64,
    pub sawa_fee_bps: u32,
    pub office_fee_bps: u32,
}

impl CommissionBreakdown {
    pub fn total_cents(&self) -> i64 {
        self.base_cents + self.sawa_fee_cents + self.office_fee_cents
    }
}

#[derive(Debug, thiserror::Error)]
pub enum PricingError {
    #[error("Invalid base price: {0} cents")]
    InvalidPrice(i64),
}

fn apply_bps(base_cents: i64, bps: u32) -> i64 {
    // Round half-up at the cent boundary
    (base_cents * bps as i64 + 5_000) / 10_000
}

/// Compute the commission breakdown for a host's base price.
///
/// Pure and deterministic; rejects non-positive prices.
pub fn compute_breakdown(
    base_cents: i64,
    category: HostCategory,
    origin: OfferOrigin,
) -> Result<CommissionBreakdown, PricingError> {
    if base_cents <= 0 {
        return Err(PricingError::InvalidPrice(base_cents));
    }

    let scheme = CommissionScheme::select(category, origin);
    Ok(CommissionBreakdown {
        base_cents,
        sawa_fee_cents: apply_bps(base_cents, scheme.sawa_fee_bps),
        office_fee_cents: apply_bps(base_cents, scheme.office_fee_bps),
        sawa_fee_bps: scheme.sawa_fee_bps,
        office_fee_bps: scheme.office_fee_bps,
    })
}
