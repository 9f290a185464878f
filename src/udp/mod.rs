pub mod listener;
pub use listener::{DatagramOutcome, IngestLoop, ListenerError, ListenerState, DEFAULT_RECV_TIMEOUT};
