pub mod engines;
mod service;
pub mod session;

pub use engines::{EngineError, HttpReply, HttpTransport};
pub use service::CatalogTransport;
pub use session::{SearchComplete, SearchSession};
