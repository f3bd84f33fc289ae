mod browser;
mod memory;
mod provider;

pub use browser::BrowserSession;
pub use memory::{MemorySession, Relationship};
pub use provider::{ConfigSessionProvider, SingleSessionProvider};
