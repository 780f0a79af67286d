//! Outbound delivery and inbound dispatch for the pericope client.
//!
//! The transport underneath is a single channel of small dictionaries that
//! accepts one outbound message at a time, may refuse a send outright, and
//! reports delivery or failure asynchronously. This crate keeps exactly one
//! message in flight on it.
//!
//! # Components
//!
//! - [`TokenAllocator`]: mints the correlation token for each request
//! - [`ReadinessGate`]: holds all transmission until the peer announces itself
//! - [`OutboundQueue`]: FIFO of pending requests with per-entry attempt counts
//! - [`DeliveryService`]: the send cycle, driving the queue head through the
//!   [`Transport`] and resolving it on each outcome
//! - [`Dispatcher`]: routes inbound payloads to one [`InboundHandler`] per
//!   [`MessageType`](pericope_wire::MessageType)
//!
//! # Send cycle
//!
//! ```text
//!            enqueue / open / outcome
//!                      │
//!                      ▼
//!   ┌──────┐  gate open, queue non-empty  ┌─────────┐
//!   │ Idle │ ───────────────────────────▶ │ Sending │
//!   └──────┘ ◀─────────────────────────── └─────────┘
//!              delivered: pop head
//!              failed: pop head if attempts exhausted
//! ```
//!
//! A refused submission resolves as a failure on the spot and the cycle
//! continues in the same loop, so retries are back to back.
//!
//! # Sharing
//!
//! Collaborators hold a [`DeliveryHandle`] (or an `Arc<dyn Outbox>`) and
//! issue requests through it. Each collaborator checks inbound tokens itself
//! with [`is_current`]; the core does not filter stale responses.

mod config;
mod dispatch;
mod gate;
mod handle;
mod metrics;
mod queue;
mod service;
mod token;
mod transport;

pub use config::{DeliveryConfig, MAX_ATTEMPTS, TokenStrategy};
pub use dispatch::{DispatchOutcome, Dispatcher, InboundHandler, is_current};
pub use gate::ReadinessGate;
pub use handle::{DeliveryHandle, Outbox};
pub use queue::{OutboundQueue, QueueEntry};
pub use service::DeliveryService;
pub use token::TokenAllocator;
pub use transport::{FailureReason, SubmitError, Transport};
