//! Wire format shared by the pericope client and its companion.
//!
//! Every message exchanged over the transport is a flat dictionary of
//! integer keys to small typed values. This crate owns:
//!
//! - the stable key and discriminant tables ([`WireKey`], [`RequestKind`],
//!   [`MessageType`], [`Testament`])
//! - the in-memory record ([`WireRecord`]) and its lenient view
//!   ([`PartialFields`])
//! - the typed messages in both directions ([`Request`], [`Response`])
//! - the byte framing ([`DictionaryCodec`])
//!
//! # Flow
//!
//! ```text
//! Request ──encode──▶ WireRecord ──DictionaryCodec──▶ bytes ──▶ transport
//! transport ──▶ bytes ──DictionaryCodec──▶ WireRecord ──decode──▶ PartialFields
//! ```
//!
//! Decoding into [`PartialFields`] never fails. Absence of a field is
//! meaningful and the consumer decides whether it can act on what arrived.

mod dictionary;
mod error;
mod fields;
mod key;
mod record;
mod request;
mod response;
mod token;

pub use dictionary::{DEFAULT_MAX_DICTIONARY_SIZE, DictionaryCodec};
pub use error::WireError;
pub use fields::{PartialFields, decode};
pub use key::{MessageType, RequestKind, Testament, WireKey};
pub use record::{WireRecord, WireValue};
pub use request::{Passage, Request};
pub use response::Response;
pub use token::CorrelationToken;
