//! Open Sound Control output
//!
//! Encodes single-argument OSC 1.0 messages and ships them over UDP to the
//! configured sender endpoint.

mod message;
mod transport;

pub use message::{OscArg, OscError, OscMessage};
pub use transport::{StatusCallback, Transport, TransportError, TransportStatus};
