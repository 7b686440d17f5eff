pub mod stream_error;

pub use stream_error::{StreamError, StreamResult};
