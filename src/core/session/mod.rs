//! Streaming session: capture in, signed WebSocket out, transcripts back.
//!
//! ```text
//! Idle --start--> Connecting --open--> Streaming --stop--> Closing --close(1000)--> Closed
//!                     |                    |                  |
//!                     +------- error / abnormal close --------+-----------------> Failed
//! ```
//!
//! Only the first error or close of a failure drives a transition; once the
//! session is `Closed` or `Failed` every further notification is ignored.

mod machine;
mod observer;
mod runner;
mod state;
mod transport;


pub use machine::Session;
pub use observer::{ChannelObserver, ObserverEvent, SessionObserver};
pub use runner::{SessionHandle, SessionRunner};
pub use state::SessionState;
pub use transport::{
    CLOSE_NORMAL, CaptureSource, EventReceiver, EventSender, SessionEvent, Transport,
    TransportConnector,
};
