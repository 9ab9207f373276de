pub mod notify;
pub mod roster;

pub use notify::{LogNotifier, NotificationTemplate, Notifier};
pub use roster::{HostDirectory, HostProfile};
