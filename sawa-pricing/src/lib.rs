pub mod pricing;

pub use pricing::{compute_breakdown, CommissionBreakdown, CommissionScheme, PricingError};
