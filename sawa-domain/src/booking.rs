use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use uuid::Uuid;

use sawa_shared::OfferType;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum BookingStatus {
    Pending,
    Confirmed,
    Rejected,
    Cancelled,
    Completed,
}

/// How one host engaged with a booking
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum HostAction {
    Offered,
    Rejected,
    DeclinedByTraveler,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HostResponse {
    pub action: HostAction,
    pub offer_id: Option<Uuid>,
    pub responded_at: DateTime<Utc>,
}

impl HostResponse {
    pub fn now(action: HostAction, offer_id: Option<Uuid>) -> Self {
        Self {
            action,
            offer_id,
            responded_at: Utc::now(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CancellationInfo {
    pub reason: String,
    pub category: Option<String>,
    pub refund_cents: i64,
    pub cancelled_at: DateTime<Utc>,
}

/// One traveler's service/rental request for a city and date range.
///
/// Root aggregate of a negotiation. Terminal bookings are retained for
/// history, never hard-deleted. Entries in `host_responses` only ever get
/// added or upgraded, a host never silently disappears from the map.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Booking {
    pub id: Uuid,
    pub traveler_id: Uuid,
    pub city: String,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub party_size: u32,
    pub status: BookingStatus,
    pub host_responses: HashMap<Uuid, HostResponse>,
    /// Conditional-write arbitration field: at most one winning offer per
    /// category, claimed before any offer is marked accepted
    pub category_winners: HashMap<OfferType, Uuid>,
    pub confirmed_host_id: Option<Uuid>,
    pub total_cents: Option<i64>,
    pub confirmed_at: Option<DateTime<Utc>>,
    pub cancellation: Option<CancellationInfo>,
    /// Set when settlement cleanup partially failed; cleared by the
    /// reconciliation sweep
    pub cleanup_pending: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Booking {
    pub fn new(
        traveler_id: Uuid,
        city: String,
        start_date: NaiveDate,
        end_date: NaiveDate,
        party_size: u32,
    ) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            traveler_id,
            city,
            start_date,
            end_date,
            party_size,
            status: BookingStatus::Pending,
            host_responses: HashMap::new(),
            category_winners: HashMap::new(),
            confirmed_host_id: None,
            total_cents: None,
            confirmed_at: None,
            cancellation: None,
            cleanup_pending: false,
            created_at: now,
            updated_at: now,
        }
    }

    /// Still open for offers and host responses
    pub fn is_open(&self) -> bool {
        self.status == BookingStatus::Pending
    }

    pub fn response_action(&self, host_id: &Uuid) -> Option<HostAction> {
        self.host_responses.get(host_id).map(|r| r.action)
    }

    /// True when every host in `roster` has a REJECTED entry.
    ///
    /// An empty roster never counts as all-rejected; the first rejection in
    /// a city with no other eligible hosts must not close the booking by
    /// vacuous quantification.
    pub fn all_rejected(&self, roster: &[Uuid]) -> bool {
        !roster.is_empty()
            && roster.iter().all(|host_id| {
                self.host_responses
                    .get(host_id)
                    .map(|r| r.action == HostAction::Rejected)
                    .unwrap_or(false)
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn booking() -> Booking {
        Booking::new(
            Uuid::new_v4(),
            "Amman".to_string(),
            NaiveDate::from_ymd_opt(2026, 10, 1).unwrap(),
            NaiveDate::from_ymd_opt(2026, 10, 5).unwrap(),
            2,
        )
    }

    #[test]
    fn test_new_booking_is_open() {
        let b = booking();
        assert_eq!(b.status, BookingStatus::Pending);
        assert!(b.is_open());
        assert!(b.host_responses.is_empty());
    }

    #[test]
    fn test_all_rejected_quantifier() {
        let mut b = booking();
        let h1 = Uuid::new_v4();
        let h2 = Uuid::new_v4();

        assert!(!b.all_rejected(&[]));
        assert!(!b.all_rejected(&[h1, h2]));

        b.host_responses
            .insert(h1, HostResponse::now(HostAction::Rejected, None));
        assert!(!b.all_rejected(&[h1, h2]));
        assert!(b.all_rejected(&[h1]));

        b.host_responses
            .insert(h2, HostResponse::now(HostAction::Offered, Some(Uuid::new_v4())));
        assert!(!b.all_rejected(&[h1, h2]));

        b.host_responses
            .insert(h2, HostResponse::now(HostAction::Rejected, None));
        assert!(b.all_rejected(&[h1, h2]));
    }
}
