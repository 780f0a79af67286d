//! Collaborator state for the scripture browser.
//!
//! Each collaborator owns one screen worth of state, issues its requests
//! through a shared [`Outbox`](pericope_delivery::Outbox) and consumes the
//! payloads the [`Dispatcher`](pericope_delivery::Dispatcher) routes to it.
//! A collaborator remembers the last token it issued and ignores every
//! payload carrying any other token. Closing a collaborator cancels its
//! outstanding request.
//!
//! Nothing here renders. The binary prints collaborator state directly.

use std::sync::Arc;

use pericope_delivery::Outbox;

mod books;
mod favorites;
mod verses;
mod viewer;

pub use books::{Book, BookList, MAX_BOOKS};
pub use favorites::{Favorite, FavoritesChanged, FavoritesList, MAX_FAVORITES};
pub use verses::{MAX_RANGE_LEN, MAX_RANGES, VerseRangeList};
pub use viewer::Viewer;

/// The outbox every collaborator issues requests through.
pub type SharedOutbox = Arc<dyn Outbox + Send + Sync>;

/// Placeholder shown while a list or passage has not arrived yet.
pub const LOADING_TEXT: &str = "Loading...";
