use uuid::Uuid;

#[derive(Debug, serde::Serialize, serde::Deserialize, Clone)]
pub struct OfferSubmittedEvent {
    pub offer_id: Uuid,
    pub booking_id: Uuid,
    pub host_id: Uuid,
    pub total_cents: i64,
    pub timestamp: i64,
}

#[derive(Debug, serde::Serialize, serde::Deserialize, Clone)]
pub struct OfferAcceptedEvent {
    pub offer_id: Uuid,
    pub booking_id: Uuid,
    pub host_id: Uuid,
    pub traveler_id: Uuid,
    pub total_cents: i64,
    pub timestamp: i64,
}

#[derive(Debug, serde::Serialize, serde::Deserialize, Clone)]
pub struct OfferDeclinedEvent {
    pub offer_id: Uuid,
    pub booking_id: Uuid,
    pub host_id: Uuid,
    pub timestamp: i64,
}

#[derive(Debug, serde::Serialize, serde::Deserialize, Clone)]
pub struct BookingRejectedEvent {
    pub booking_id: Uuid,
    pub traveler_id: Uuid,
    pub city: String,
    pub timestamp: i64,
}

#[derive(Debug, serde::Serialize, serde::Deserialize, Clone)]
pub struct BookingCancelledEvent {
    pub booking_id: Uuid,
    pub traveler_id: Uuid,
    pub refund_cents: i64,
    pub timestamp: i64,
}
