pub mod events;

use serde::{Deserialize, Serialize};

/// Category of service a host bids on
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum OfferType {
    Service,
    Rental,
}

/// Commercial tier of the host submitting an offer
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum HostCategory {
    Independent,
    OfficeAffiliated,
}

/// Who opened the negotiation for a given offer.
///
/// Selects both the commission scheme and the offer expiry horizon.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum OfferOrigin {
    HostInitiated,
    TravelerSolicited,
}
