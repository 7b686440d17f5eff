pub mod adapters;
pub mod config;
pub mod core;
pub mod errors;

// Re-export commonly used items for convenience
pub use config::ClientConfig;
pub use core::*;
pub use errors::stream_error::{StreamError, StreamResult};
