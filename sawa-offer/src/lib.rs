pub mod expiry;
pub mod ledger;

pub use expiry::ExpirySweeper;
pub use ledger::{LedgerError, OfferHorizons, OfferLedger};
