pub mod lifecycle;
pub mod responses;
pub mod service;
pub mod settlement;

pub use lifecycle::{BookingLifecycle, LifecycleError};
pub use responses::{HostResponseTracker, TrackerError};
pub use service::NegotiationService;
pub use settlement::{CascadeOutcome, SettlementError, SettlementOrchestrator, SettlementResult};
