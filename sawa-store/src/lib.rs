pub mod app_config;
pub mod memory;

pub use app_config::{BusinessRules, Config};
pub use memory::{MemoryHostDirectory, MemoryStore};
