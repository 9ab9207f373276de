use chrono::Utc;
use std::sync::Arc;
use tokio::time::{interval, Duration};

use sawa_domain::{OfferRepository, OfferStatus};

/// Sweeps stale pending offers over to EXPIRED.
///
/// Safe to run from any number of workers at once: each transition is a
/// compare-and-set on status = PENDING, so two sweepers racing on the same
/// offer resolve to exactly one applied write.
pub struct ExpirySweeper {
    offers: Arc<dyn OfferRepository>,
}

impl ExpirySweeper {
    pub fn new(offers: Arc<dyn OfferRepository>) -> Self {
        Self { offers }
    }

    /// One pass; returns how many offers this worker expired
    pub async fn sweep_once(&self) -> Result<usize, Box<dyn std::error::Error + Send + Sync>> {
        let stale = self.offers.list_expired_pending(Utc::now()).await?;

        let mut expired = 0usize;
        for offer in stale {
            if self
                .offers
                .transition(offer.id, OfferStatus::Pending, OfferStatus::Expired)
                .await?
            {
                expired += 1;
            }
        }

        if expired > 0 {
            tracing::info!(expired, "expiry sweep retired stale offers");
        }
        Ok(expired)
    }

    /// Interval-driven sweep loop; spawn it on the runtime with the
    /// configured sweep period
    pub async fn run(&self, period: Duration) {
        let mut ticker = interval(period);
        loop {
            ticker.tick().await;
            if let Err(e) = self.sweep_once().await {
                tracing::error!("expiry sweep failed: {}", e);
            }
        }
    }
}
