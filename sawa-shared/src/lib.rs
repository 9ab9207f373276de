pub mod models;

pub use models::{HostCategory, OfferOrigin, OfferType};
