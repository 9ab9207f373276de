use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HostProfile {
    pub id: Uuid,
    pub display_name: String,
    pub home_city: String,
    pub assigned_cities: Vec<String>,
    pub is_approved: bool,
}

impl HostProfile {
    /// A host covers a city through their home city or any assignment
    pub fn covers_city(&self, city: &str) -> bool {
        self.home_city == city || self.assigned_cities.iter().any(|c| c == city)
    }
}

/// Live roster lookup for the hosts eligible to serve a city.
///
/// Callers deciding on "every eligible host has responded" must query this
/// at decision time rather than caching the roster, since city assignments
/// change between responses.
#[async_trait]
pub trait HostDirectory: Send + Sync {
    async fn eligible_hosts(
        &self,
        city: &str,
    ) -> Result<Vec<Uuid>, Box<dyn std::error::Error + Send + Sync>>;
}
