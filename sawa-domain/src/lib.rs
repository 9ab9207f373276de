pub mod booking;
pub mod chat;
pub mod offer;
pub mod repository;

pub use booking::{Booking, BookingStatus, CancellationInfo, HostAction, HostResponse};
pub use chat::{Conversation, Message};
pub use offer::{Offer, OfferStatus};
pub use repository::{
    BookingRepository, ConversationRepository, MessageRepository, OfferRepository,
};
