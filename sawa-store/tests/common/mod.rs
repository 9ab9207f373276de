#![allow(dead_code)]

use async_trait::async_trait;
use chrono::NaiveDate;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::sync::Mutex;
use uuid::Uuid;

use sawa_booking::NegotiationService;
use sawa_core::{HostProfile, NotificationTemplate, Notifier};
use sawa_domain::{
    Booking, BookingRepository, BookingStatus, CancellationInfo, Conversation,
    ConversationRepository, HostResponse,
};
use sawa_offer::OfferHorizons;
use sawa_shared::OfferType;
use sawa_store::{BusinessRules, MemoryHostDirectory, MemoryStore};

/// Notifier double that records deliveries instead of sending them
#[derive(Default)]
pub struct RecordingNotifier {
    pub sent: Mutex<Vec<(Uuid, NotificationTemplate)>>,
}

impl RecordingNotifier {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn sent_to(&self, recipient: Uuid) -> Vec<NotificationTemplate> {
        self.sent
            .lock()
            .await
            .iter()
            .filter(|(r, _)| *r == recipient)
            .map(|(_, t)| *t)
            .collect()
    }
}

#[async_trait]
impl Notifier for RecordingNotifier {
    async fn notify(
        &self,
        recipient: Uuid,
        template: NotificationTemplate,
        _payload: serde_json::Value,
    ) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
        self.sent.lock().await.push((recipient, template));
        Ok(())
    }
}

/// Conversation repository that fails its first delete, for exercising the
/// partial-cleanup path
pub struct FlakyConversations {
    inner: Arc<MemoryStore>,
    tripped: AtomicBool,
}

impl FlakyConversations {
    pub fn new(inner: Arc<MemoryStore>) -> Self {
        Self {
            inner,
            tripped: AtomicBool::new(false),
        }
    }
}

#[async_trait]
impl ConversationRepository for FlakyConversations {
    async fn find_or_create(
        &self,
        booking_id: Uuid,
        traveler_id: Uuid,
        host_id: Uuid,
    ) -> Result<Conversation, Box<dyn std::error::Error + Send + Sync>> {
        self.inner
            .find_or_create(booking_id, traveler_id, host_id)
            .await
    }

    async fn get(
        &self,
        id: Uuid,
    ) -> Result<Option<Conversation>, Box<dyn std::error::Error + Send + Sync>> {
        ConversationRepository::get(self.inner.as_ref(), id).await
    }

    async fn list_for_booking(
        &self,
        booking_id: Uuid,
    ) -> Result<Vec<Conversation>, Box<dyn std::error::Error + Send + Sync>> {
        ConversationRepository::list_for_booking(self.inner.as_ref(), booking_id).await
    }

    async fn touch_preview(
        &self,
        id: Uuid,
        preview: String,
        at: chrono::DateTime<chrono::Utc>,
    ) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
        self.inner.touch_preview(id, preview, at).await
    }

    async fn delete(&self, id: Uuid) -> Result<bool, Box<dyn std::error::Error + Send + Sync>> {
        if !self.tripped.swap(true, Ordering::SeqCst) {
            return Err("simulated conversation delete outage".into());
        }
        self.inner.delete(id).await
    }
}

/// Booking repository that cancels the booking out from under the first
/// confirm, for exercising the settlement path where the booking closes
/// between the winner claim and the confirm write
pub struct CancellingBookings {
    inner: Arc<MemoryStore>,
    tripped: AtomicBool,
}

impl CancellingBookings {
    pub fn new(inner: Arc<MemoryStore>) -> Self {
        Self {
            inner,
            tripped: AtomicBool::new(false),
        }
    }
}

#[async_trait]
impl BookingRepository for CancellingBookings {
    async fn insert(
        &self,
        booking: &Booking,
    ) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
        BookingRepository::insert(self.inner.as_ref(), booking).await
    }

    async fn get(
        &self,
        id: Uuid,
    ) -> Result<Option<Booking>, Box<dyn std::error::Error + Send + Sync>> {
        BookingRepository::get(self.inner.as_ref(), id).await
    }

    async fn upsert_host_response(
        &self,
        id: Uuid,
        host_id: Uuid,
        response: HostResponse,
    ) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
        self.inner.upsert_host_response(id, host_id, response).await
    }

    async fn claim_category_winner(
        &self,
        id: Uuid,
        offer_type: OfferType,
        offer_id: Uuid,
    ) -> Result<bool, Box<dyn std::error::Error + Send + Sync>> {
        self.inner
            .claim_category_winner(id, offer_type, offer_id)
            .await
    }

    async fn confirm_if_pending(
        &self,
        id: Uuid,
        host_id: Uuid,
        total_cents: i64,
    ) -> Result<bool, Box<dyn std::error::Error + Send + Sync>> {
        if !self.tripped.swap(true, Ordering::SeqCst) {
            let info = CancellationInfo {
                reason: "changed plans".to_string(),
                category: None,
                refund_cents: 0,
                cancelled_at: chrono::Utc::now(),
            };
            self.inner.cancel_if(id, BookingStatus::Pending, info).await?;
        }
        self.inner.confirm_if_pending(id, host_id, total_cents).await
    }

    async fn reject_if_pending(
        &self,
        id: Uuid,
    ) -> Result<bool, Box<dyn std::error::Error + Send + Sync>> {
        self.inner.reject_if_pending(id).await
    }

    async fn cancel_if(
        &self,
        id: Uuid,
        from: BookingStatus,
        info: CancellationInfo,
    ) -> Result<bool, Box<dyn std::error::Error + Send + Sync>> {
        self.inner.cancel_if(id, from, info).await
    }

    async fn set_cleanup_pending(
        &self,
        id: Uuid,
        pending: bool,
    ) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
        self.inner.set_cleanup_pending(id, pending).await
    }
}

pub struct TestEnv {
    pub store: Arc<MemoryStore>,
    pub directory: Arc<MemoryHostDirectory>,
    pub notifier: Arc<RecordingNotifier>,
    pub service: Arc<NegotiationService>,
}

pub fn env() -> TestEnv {
    let store = Arc::new(MemoryStore::new());
    build(store.clone(), store.clone(), store.clone())
}

/// Same wiring but with the conversation collection swapped out
pub fn env_with_flaky_conversations() -> TestEnv {
    let store = Arc::new(MemoryStore::new());
    let flaky = Arc::new(FlakyConversations::new(store.clone()));
    build(store.clone(), store, flaky)
}

/// Same wiring but with the booking collection swapped out
pub fn env_with_cancelling_bookings() -> TestEnv {
    let store = Arc::new(MemoryStore::new());
    let cancelling = Arc::new(CancellingBookings::new(store.clone()));
    build(store.clone(), cancelling, store)
}

fn build(
    store: Arc<MemoryStore>,
    bookings: Arc<dyn BookingRepository>,
    conversations: Arc<dyn ConversationRepository>,
) -> TestEnv {
    let directory = Arc::new(MemoryHostDirectory::new());
    let notifier = Arc::new(RecordingNotifier::new());
    let rules = BusinessRules::default();
    let service = Arc::new(NegotiationService::new(
        bookings,
        store.clone(),
        conversations,
        store.clone(),
        directory.clone(),
        notifier.clone(),
        OfferHorizons::from_days(rules.host_offer_ttl_days, rules.solicited_offer_ttl_days),
    ));
    TestEnv {
        store,
        directory,
        notifier,
        service,
    }
}

impl TestEnv {
    pub async fn approved_host(&self, city: &str) -> Uuid {
        let host = HostProfile {
            id: Uuid::new_v4(),
            display_name: "host".to_string(),
            home_city: city.to_string(),
            assigned_cities: vec![],
            is_approved: true,
        };
        let id = host.id;
        self.directory.upsert(host).await;
        id
    }

    pub async fn open_booking(&self, traveler_id: Uuid) -> Booking {
        self.service
            .create_booking(
                traveler_id,
                "Amman".to_string(),
                NaiveDate::from_ymd_opt(2026, 10, 1).unwrap(),
                NaiveDate::from_ymd_opt(2026, 10, 5).unwrap(),
                2,
            )
            .await
            .unwrap()
    }
}
