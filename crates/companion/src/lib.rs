//! The companion peer.
//!
//! Runs on the other side of the link. It answers each client request with
//! a burst of small responses: one per book, verse range, favorite or text
//! chunk, all tagged with the request's token. Responses for different
//! tokens are interleaved, and a cancel drops whatever is still queued for
//! its token.

pub mod catalog;
mod companion;
mod error;
mod favorites;
pub mod passage;
mod source;

pub use companion::Companion;
pub use error::CompanionError;
pub use favorites::{FavoriteStore, Toggle};
pub use source::{StaticVerseSource, Verse, VerseSource};
