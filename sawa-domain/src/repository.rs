use async_trait::async_trait;
use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::booking::{Booking, BookingStatus, CancellationInfo, HostResponse};
use crate::chat::{Conversation, Message};
use crate::offer::{Offer, OfferStatus};
use sawa_shared::OfferType;

/// Repository trait for the booking aggregate.
///
/// The document store offers no multi-document transactions; everything a
/// writer needs to be safe against interleaving is expressed here as a
/// conditional single-document write returning whether it applied. Status
/// is never blind-overwritten.
#[async_trait]
pub trait BookingRepository: Send + Sync {
    async fn insert(
        &self,
        booking: &Booking,
    ) -> Result<(), Box<dyn std::error::Error + Send + Sync>>;

    async fn get(
        &self,
        id: Uuid,
    ) -> Result<Option<Booking>, Box<dyn std::error::Error + Send + Sync>>;

    /// Add or upgrade one host's response entry
    async fn upsert_host_response(
        &self,
        id: Uuid,
        host_id: Uuid,
        response: HostResponse,
    ) -> Result<(), Box<dyn std::error::Error + Send + Sync>>;

    /// Claim the winner slot for (booking, category). Returns false if a
    /// different offer already holds it; re-claiming with the same offer id
    /// succeeds, so settlement retries stay idempotent.
    async fn claim_category_winner(
        &self,
        id: Uuid,
        offer_type: OfferType,
        offer_id: Uuid,
    ) -> Result<bool, Box<dyn std::error::Error + Send + Sync>>;

    /// PENDING -> CONFIRMED, binding host and traveler-paid total.
    /// Returns false when the booking is not pending.
    async fn confirm_if_pending(
        &self,
        id: Uuid,
        host_id: Uuid,
        total_cents: i64,
    ) -> Result<bool, Box<dyn std::error::Error + Send + Sync>>;

    /// PENDING -> REJECTED. Returns false when the booking is not pending.
    async fn reject_if_pending(
        &self,
        id: Uuid,
    ) -> Result<bool, Box<dyn std::error::Error + Send + Sync>>;

    /// `from` -> CANCELLED with cancellation metadata. Returns false when
    /// the booking is not in `from`.
    async fn cancel_if(
        &self,
        id: Uuid,
        from: BookingStatus,
        info: CancellationInfo,
    ) -> Result<bool, Box<dyn std::error::Error + Send + Sync>>;

    /// Mark or clear the partial-cleanup flag consumed by the retry sweep
    async fn set_cleanup_pending(
        &self,
        id: Uuid,
        pending: bool,
    ) -> Result<(), Box<dyn std::error::Error + Send + Sync>>;
}

/// Repository trait for offer documents
#[async_trait]
pub trait OfferRepository: Send + Sync {
    async fn insert(
        &self,
        offer: &Offer,
    ) -> Result<(), Box<dyn std::error::Error + Send + Sync>>;

    async fn get(
        &self,
        id: Uuid,
    ) -> Result<Option<Offer>, Box<dyn std::error::Error + Send + Sync>>;

    async fn list_for_booking(
        &self,
        booking_id: Uuid,
    ) -> Result<Vec<Offer>, Box<dyn std::error::Error + Send + Sync>>;

    /// Compare-and-set on status; bumps `updated_at` when it applies.
    /// Returns false when the offer is missing or not in `from`.
    async fn transition(
        &self,
        id: Uuid,
        from: OfferStatus,
        to: OfferStatus,
    ) -> Result<bool, Box<dyn std::error::Error + Send + Sync>>;

    /// PENDING offers whose expiry horizon has passed as of `now`
    async fn list_expired_pending(
        &self,
        now: DateTime<Utc>,
    ) -> Result<Vec<Offer>, Box<dyn std::error::Error + Send + Sync>>;
}

/// Repository trait for conversations
#[async_trait]
pub trait ConversationRepository: Send + Sync {
    /// Lazy creation on first host engagement; returns the existing
    /// conversation for the (booking, host) pair when there is one
    async fn find_or_create(
        &self,
        booking_id: Uuid,
        traveler_id: Uuid,
        host_id: Uuid,
    ) -> Result<Conversation, Box<dyn std::error::Error + Send + Sync>>;

    async fn get(
        &self,
        id: Uuid,
    ) -> Result<Option<Conversation>, Box<dyn std::error::Error + Send + Sync>>;

    async fn list_for_booking(
        &self,
        booking_id: Uuid,
    ) -> Result<Vec<Conversation>, Box<dyn std::error::Error + Send + Sync>>;

    async fn touch_preview(
        &self,
        id: Uuid,
        preview: String,
        at: DateTime<Utc>,
    ) -> Result<(), Box<dyn std::error::Error + Send + Sync>>;

    /// Returns false when the conversation was already gone
    async fn delete(
        &self,
        id: Uuid,
    ) -> Result<bool, Box<dyn std::error::Error + Send + Sync>>;
}

/// Repository trait for chat messages
#[async_trait]
pub trait MessageRepository: Send + Sync {
    async fn append(
        &self,
        message: &Message,
    ) -> Result<(), Box<dyn std::error::Error + Send + Sync>>;

    async fn list_for_conversation(
        &self,
        conversation_id: Uuid,
    ) -> Result<Vec<Message>, Box<dyn std::error::Error + Send + Sync>>;

    /// Bulk removal when a conversation is torn down; returns the count
    async fn delete_for_conversation(
        &self,
        conversation_id: Uuid,
    ) -> Result<u64, Box<dyn std::error::Error + Send + Sync>>;
}
