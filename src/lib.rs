pub mod core;
pub mod search;

// --- Primary core exports ---
pub use core::config;
pub use core::types;
pub use core::types::*;
pub use core::{SessionConfig, StoreSearchConfig};
pub use search::{CatalogTransport, EngineError, HttpReply, SearchSession};
