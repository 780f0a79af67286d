//! The seam between the delivery core and the channel underneath.

use auto_impl::auto_impl;
use derive_more::Display;
use pericope_wire::{WireError, WireRecord};

/// Why the transport reported a failure or dropped an inbound payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display)]
pub enum FailureReason {
    /// The peer did not acknowledge in time.
    #[display("timeout")]
    Timeout,
    /// The channel was busy with another transmission.
    #[display("busy")]
    Busy,
    /// The payload did not fit the buffer.
    #[display("buffer overflow")]
    BufferOverflow,
    /// No peer is connected.
    #[display("not connected")]
    NotConnected,
    /// The peer rejected the payload.
    #[display("rejected")]
    Rejected,
    /// Transport specific code.
    #[display("code {_0}")]
    Other(u32),
}

/// A submission the transport refused outright.
///
/// Counts as one failed attempt, exactly like an asynchronous failure.
#[derive(Debug, thiserror::Error)]
pub enum SubmitError {
    #[error("No outbound buffer available")]
    NoBuffer,
    #[error("Transmission already pending")]
    Busy,
    #[error("Transport closed")]
    Closed,
    #[error("Encode error: {0}")]
    Encode(#[from] WireError),
}

/// An asynchronous, single-channel dictionary transport.
///
/// A successful [`submit`](Transport::submit) promises exactly one later call
/// to [`DeliveryService::on_delivered`](crate::DeliveryService::on_delivered)
/// or [`DeliveryService::on_failed`](crate::DeliveryService::on_failed). The
/// transport must never report that outcome from inside `submit`.
#[auto_impl(&mut, Box)]
pub trait Transport {
    fn submit(&mut self, record: WireRecord) -> Result<(), SubmitError>;
}
