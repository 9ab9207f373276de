use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::collections::HashMap;
use tokio::sync::RwLock;
use uuid::Uuid;

use sawa_core::{HostDirectory, HostProfile};
use sawa_domain::{
    Booking, BookingRepository, BookingStatus, CancellationInfo, Conversation,
    ConversationRepository, HostResponse, Message, MessageRepository, Offer, OfferRepository,
    OfferStatus,
};
use sawa_shared::OfferType;

/// In-memory document store for the four negotiation collections.
///
/// Models the persistence contract the services are written against:
/// create/read/update/delete plus equality filters, each call atomic on a
/// single document, and no transaction spanning documents. The conditional
/// writes (status CAS, winner-slot claim) hold the collection lock for the
/// read-check-write, which is exactly the atomicity a conditional update
/// gives on a real document store.
#[derive(Default)]
pub struct MemoryStore {
    bookings: RwLock<HashMap<Uuid, Booking>>,
    offers: RwLock<HashMap<Uuid, Offer>>,
    conversations: RwLock<HashMap<Uuid, Conversation>>,
    messages: RwLock<HashMap<Uuid, Message>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

fn missing(collection: &str, id: Uuid) -> Box<dyn std::error::Error + Send + Sync> {
    format!("{} document missing: {}", collection, id).into()
}

#[async_trait]
impl BookingRepository for MemoryStore {
    async fn insert(
        &self,
        booking: &Booking,
    ) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
        self.bookings
            .write()
            .await
            .insert(booking.id, booking.clone());
        Ok(())
    }

    async fn get(
        &self,
        id: Uuid,
    ) -> Result<Option<Booking>, Box<dyn std::error::Error + Send + Sync>> {
        Ok(self.bookings.read().await.get(&id).cloned())
    }

    async fn upsert_host_response(
        &self,
        id: Uuid,
        host_id: Uuid,
        response: HostResponse,
    ) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
        let mut bookings = self.bookings.write().await;
        let booking = bookings.get_mut(&id).ok_or_else(|| missing("booking", id))?;
        booking.host_responses.insert(host_id, response);
        booking.updated_at = Utc::now();
        Ok(())
    }

    async fn claim_category_winner(
        &self,
        id: Uuid,
        offer_type: OfferType,
        offer_id: Uuid,
    ) -> Result<bool, Box<dyn std::error::Error + Send + Sync>> {
        let mut bookings = self.bookings.write().await;
        let booking = bookings.get_mut(&id).ok_or_else(|| missing("booking", id))?;
        match booking.category_winners.get(&offer_type) {
            Some(existing) => Ok(*existing == offer_id),
            None => {
                booking.category_winners.insert(offer_type, offer_id);
                booking.updated_at = Utc::now();
                Ok(true)
            }
        }
    }

    async fn confirm_if_pending(
        &self,
        id: Uuid,
        host_id: Uuid,
        total_cents: i64,
    ) -> Result<bool, Box<dyn std::error::Error + Send + Sync>> {
        let mut bookings = self.bookings.write().await;
        let booking = bookings.get_mut(&id).ok_or_else(|| missing("booking", id))?;
        if booking.status != BookingStatus::Pending {
            return Ok(false);
        }
        let now = Utc::now();
        booking.status = BookingStatus::Confirmed;
        booking.confirmed_host_id = Some(host_id);
        booking.total_cents = Some(total_cents);
        booking.confirmed_at = Some(now);
        booking.updated_at = now;
        Ok(true)
    }

    async fn reject_if_pending(
        &self,
        id: Uuid,
    ) -> Result<bool, Box<dyn std::error::Error + Send + Sync>> {
        let mut bookings = self.bookings.write().await;
        let booking = bookings.get_mut(&id).ok_or_else(|| missing("booking", id))?;
        if booking.status != BookingStatus::Pending {
            return Ok(false);
        }
        booking.status = BookingStatus::Rejected;
        booking.updated_at = Utc::now();
        Ok(true)
    }

    async fn cancel_if(
        &self,
        id: Uuid,
        from: BookingStatus,
        info: CancellationInfo,
    ) -> Result<bool, Box<dyn std::error::Error + Send + Sync>> {
        let mut bookings = self.bookings.write().await;
        let booking = bookings.get_mut(&id).ok_or_else(|| missing("booking", id))?;
        if booking.status != from {
            return Ok(false);
        }
        booking.status = BookingStatus::Cancelled;
        booking.cancellation = Some(info);
        booking.updated_at = Utc::now();
        Ok(true)
    }

    async fn set_cleanup_pending(
        &self,
        id: Uuid,
        pending: bool,
    ) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
        let mut bookings = self.bookings.write().await;
        let booking = bookings.get_mut(&id).ok_or_else(|| missing("booking", id))?;
        booking.cleanup_pending = pending;
        booking.updated_at = Utc::now();
        Ok(())
    }
}

#[async_trait]
impl OfferRepository for MemoryStore {
    async fn insert(&self, offer: &Offer) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
        self.offers.write().await.insert(offer.id, offer.clone());
        Ok(())
    }

    async fn get(
        &self,
        id: Uuid,
    ) -> Result<Option<Offer>, Box<dyn std::error::Error + Send + Sync>> {
        Ok(self.offers.read().await.get(&id).cloned())
    }

    async fn list_for_booking(
        &self,
        booking_id: Uuid,
    ) -> Result<Vec<Offer>, Box<dyn std::error::Error + Send + Sync>> {
        Ok(self
            .offers
            .read()
            .await
            .values()
            .filter(|o| o.booking_id == booking_id)
            .cloned()
            .collect())
    }

    async fn transition(
        &self,
        id: Uuid,
        from: OfferStatus,
        to: OfferStatus,
    ) -> Result<bool, Box<dyn std::error::Error + Send + Sync>> {
        let mut offers = self.offers.write().await;
        let Some(offer) = offers.get_mut(&id) else {
            return Ok(false);
        };
        if offer.status != from {
            return Ok(false);
        }
        offer.status = to;
        offer.updated_at = Utc::now();
        Ok(true)
    }

    async fn list_expired_pending(
        &self,
        now: DateTime<Utc>,
    ) -> Result<Vec<Offer>, Box<dyn std::error::Error + Send + Sync>> {
        Ok(self
            .offers
            .read()
            .await
            .values()
            .filter(|o| o.status == OfferStatus::Pending && o.expires_at < now)
            .cloned()
            .collect())
    }
}

#[async_trait]
impl ConversationRepository for MemoryStore {
    async fn find_or_create(
        &self,
        booking_id: Uuid,
        traveler_id: Uuid,
        host_id: Uuid,
    ) -> Result<Conversation, Box<dyn std::error::Error + Send + Sync>> {
        let mut conversations = self.conversations.write().await;
        if let Some(existing) = conversations
            .values()
            .find(|c| c.booking_id == booking_id && c.includes_host(&host_id))
        {
            return Ok(existing.clone());
        }
        let conversation = Conversation::new(booking_id, traveler_id, host_id);
        conversations.insert(conversation.id, conversation.clone());
        Ok(conversation)
    }

    async fn get(
        &self,
        id: Uuid,
    ) -> Result<Option<Conversation>, Box<dyn std::error::Error + Send + Sync>> {
        Ok(self.conversations.read().await.get(&id).cloned())
    }

    async fn list_for_booking(
        &self,
        booking_id: Uuid,
    ) -> Result<Vec<Conversation>, Box<dyn std::error::Error + Send + Sync>> {
        Ok(self
            .conversations
            .read()
            .await
            .values()
            .filter(|c| c.booking_id == booking_id)
            .cloned()
            .collect())
    }

    async fn touch_preview(
        &self,
        id: Uuid,
        preview: String,
        at: DateTime<Utc>,
    ) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
        let mut conversations = self.conversations.write().await;
        let conversation = conversations
            .get_mut(&id)
            .ok_or_else(|| missing("conversation", id))?;
        conversation.last_message_preview = Some(preview);
        conversation.last_message_at = Some(at);
        Ok(())
    }

    async fn delete(&self, id: Uuid) -> Result<bool, Box<dyn std::error::Error + Send + Sync>> {
        Ok(self.conversations.write().await.remove(&id).is_some())
    }
}

#[async_trait]
impl MessageRepository for MemoryStore {
    async fn append(
        &self,
        message: &Message,
    ) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
        self.messages
            .write()
            .await
            .insert(message.id, message.clone());
        Ok(())
    }

    async fn list_for_conversation(
        &self,
        conversation_id: Uuid,
    ) -> Result<Vec<Message>, Box<dyn std::error::Error + Send + Sync>> {
        let mut messages: Vec<Message> = self
            .messages
            .read()
            .await
            .values()
            .filter(|m| m.conversation_id == conversation_id)
            .cloned()
            .collect();
        messages.sort_by_key(|m| m.created_at);
        Ok(messages)
    }

    async fn delete_for_conversation(
        &self,
        conversation_id: Uuid,
    ) -> Result<u64, Box<dyn std::error::Error + Send + Sync>> {
        let mut messages = self.messages.write().await;
        let before = messages.len();
        messages.retain(|_, m| m.conversation_id != conversation_id);
        Ok((before - messages.len()) as u64)
    }
}

/// Roster lookup backed by a mutable in-memory host table, so tests can
/// move city assignments between calls the way the live directory does
#[derive(Default)]
pub struct MemoryHostDirectory {
    hosts: RwLock<HashMap<Uuid, HostProfile>>,
}

impl MemoryHostDirectory {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn upsert(&self, profile: HostProfile) {
        self.hosts.write().await.insert(profile.id, profile);
    }

    pub async fn remove(&self, host_id: Uuid) {
        self.hosts.write().await.remove(&host_id);
    }
}

#[async_trait]
impl HostDirectory for MemoryHostDirectory {
    async fn eligible_hosts(
        &self,
        city: &str,
    ) -> Result<Vec<Uuid>, Box<dyn std::error::Error + Send + Sync>> {
        Ok(self
            .hosts
            .read()
            .await
            .values()
            .filter(|h| h.is_approved && h.covers_city(city))
            .map(|h| h.id)
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, NaiveDate};

    fn booking() -> Booking {
        Booking::new(
            Uuid::new_v4(),
            "Amman".to_string(),
            NaiveDate::from_ymd_opt(2026, 10, 1).unwrap(),
            NaiveDate::from_ymd_opt(2026, 10, 5).unwrap(),
            2,
        )
    }

    #[tokio::test]
    async fn test_claim_category_winner_is_first_write_wins() {
        let store = MemoryStore::new();
        let b = booking();
        BookingRepository::insert(&store, &b).await.unwrap();

        let first = Uuid::new_v4();
        let second = Uuid::new_v4();

        assert!(store
            .claim_category_winner(b.id, OfferType::Service, first)
            .await
            .unwrap());
        // Same offer re-claiming succeeds, a different one does not
        assert!(store
            .claim_category_winner(b.id, OfferType::Service, first)
            .await
            .unwrap());
        assert!(!store
            .claim_category_winner(b.id, OfferType::Service, second)
            .await
            .unwrap());
        // The other category is an independent slot
        assert!(store
            .claim_category_winner(b.id, OfferType::Rental, second)
            .await
            .unwrap());
    }

    #[tokio::test]
    async fn test_confirm_is_conditional_on_pending() {
        let store = MemoryStore::new();
        let b = booking();
        BookingRepository::insert(&store, &b).await.unwrap();
        let host = Uuid::new_v4();

        assert!(store.confirm_if_pending(b.id, host, 13_500).await.unwrap());
        assert!(!store.confirm_if_pending(b.id, host, 13_500).await.unwrap());
        assert!(!store.reject_if_pending(b.id).await.unwrap());

        let stored = BookingRepository::get(&store, b.id).await.unwrap().unwrap();
        assert_eq!(stored.status, BookingStatus::Confirmed);
        assert_eq!(stored.confirmed_host_id, Some(host));
        assert_eq!(stored.total_cents, Some(13_500));
    }

    #[tokio::test]
    async fn test_find_or_create_conversation_dedupes_per_host() {
        let store = MemoryStore::new();
        let booking_id = Uuid::new_v4();
        let traveler = Uuid::new_v4();
        let host_a = Uuid::new_v4();
        let host_b = Uuid::new_v4();

        let first = store
            .find_or_create(booking_id, traveler, host_a)
            .await
            .unwrap();
        let again = store
            .find_or_create(booking_id, traveler, host_a)
            .await
            .unwrap();
        let other = store
            .find_or_create(booking_id, traveler, host_b)
            .await
            .unwrap();

        assert_eq!(first.id, again.id);
        assert_ne!(first.id, other.id);
        assert_eq!(
            ConversationRepository::list_for_booking(&store, booking_id)
                .await
                .unwrap()
                .len(),
            2
        );
    }

    #[tokio::test]
    async fn test_message_cascade_delete_counts() {
        let store = MemoryStore::new();
        let convo = Uuid::new_v4();
        let sender = Uuid::new_v4();
        for i in 0..3 {
            MessageRepository::append(&store, &Message::new(convo, sender, format!("hi {}", i)))
                .await
                .unwrap();
        }
        MessageRepository::append(&store, &Message::new(Uuid::new_v4(), sender, "other".into()))
            .await
            .unwrap();

        assert_eq!(store.delete_for_conversation(convo).await.unwrap(), 3);
        assert_eq!(store.delete_for_conversation(convo).await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_touch_preview_updates_conversation() {
        let store = MemoryStore::new();
        let traveler = Uuid::new_v4();
        let host = Uuid::new_v4();
        let convo = store
            .find_or_create(Uuid::new_v4(), traveler, host)
            .await
            .unwrap();

        let message = Message::new(convo.id, host, "Welcome! The tour starts at 9am.".to_string());
        MessageRepository::append(&store, &message).await.unwrap();
        store
            .touch_preview(convo.id, message.preview(), message.created_at)
            .await
            .unwrap();

        let stored = ConversationRepository::get(&store, convo.id)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(
            stored.last_message_preview.as_deref(),
            Some("Welcome! The tour starts at 9am.")
        );
        assert_eq!(stored.last_message_at, Some(message.created_at));
    }

    #[tokio::test]
    async fn test_expired_pending_filter() {
        let store = MemoryStore::new();
        let breakdown = sawa_pricing::compute_breakdown(
            10_000,
            sawa_shared::HostCategory::Independent,
            sawa_shared::OfferOrigin::TravelerSolicited,
        )
        .unwrap();
        let mut stale = Offer::new(
            Uuid::new_v4(),
            Uuid::new_v4(),
            Uuid::new_v4(),
            OfferType::Service,
            sawa_shared::OfferOrigin::TravelerSolicited,
            sawa_shared::HostCategory::Independent,
            breakdown,
            "old".into(),
            Utc::now() - Duration::minutes(1),
        );
        OfferRepository::insert(&store, &stale).await.unwrap();

        let fresh = Offer::new(
            stale.booking_id,
            Uuid::new_v4(),
            stale.traveler_id,
            OfferType::Service,
            sawa_shared::OfferOrigin::TravelerSolicited,
            sawa_shared::HostCategory::Independent,
            breakdown,
            "new".into(),
            Utc::now() + Duration::days(7),
        );
        OfferRepository::insert(&store, &fresh).await.unwrap();

        let listed = store.list_expired_pending(Utc::now()).await.unwrap();
        assert_eq!(listed.len(), 1);
        assert_eq!(listed[0].id, stale.id);

        // A non-pending stale offer must not show up either
        stale.status = OfferStatus::Declined;
        OfferRepository::insert(&store, &stale).await.unwrap();
        let listed = store.list_expired_pending(Utc::now()).await.unwrap();
        assert!(listed.is_empty());
    }

    #[tokio::test]
    async fn test_directory_follows_live_assignments() {
        let directory = MemoryHostDirectory::new();
        let host = HostProfile {
            id: Uuid::new_v4(),
            display_name: "Omar".to_string(),
            home_city: "Aqaba".to_string(),
            assigned_cities: vec![],
            is_approved: true,
        };
        directory.upsert(host.clone()).await;

        assert!(directory.eligible_hosts("Amman").await.unwrap().is_empty());

        let mut moved = host.clone();
        moved.assigned_cities = vec!["Amman".to_string()];
        directory.upsert(moved).await;
        assert_eq!(directory.eligible_hosts("Amman").await.unwrap(), vec![host.id]);

        let mut unapproved = host;
        unapproved.is_approved = false;
        directory.upsert(unapproved).await;
        assert!(directory.eligible_hosts("Aqaba").await.unwrap().is_empty());
    }
}
