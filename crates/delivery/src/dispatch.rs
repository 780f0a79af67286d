//! Inbound routing by message category.

use std::sync::Arc;

use auto_impl::auto_impl;
use parking_lot::Mutex;
use pericope_wire::{CorrelationToken, MessageType, PartialFields, WireRecord, decode};
use tracing::{debug, trace, warn};

use crate::{DeliveryHandle, Transport, metrics::DispatchMetrics};

/// Receives the inbound payloads of one message category.
///
/// Implementations check the token themselves, see [`is_current`].
#[auto_impl(&mut, Box)]
pub trait InboundHandler {
    fn on_payload(&mut self, fields: &PartialFields);
}

impl<H: InboundHandler> InboundHandler for Arc<Mutex<H>> {
    fn on_payload(&mut self, fields: &PartialFields) {
        self.lock().on_payload(fields);
    }
}

/// Whether a payload carrying `received` belongs to the request the caller
/// is waiting on. A missing token on either side never matches.
pub fn is_current(received: Option<CorrelationToken>, expected: Option<CorrelationToken>) -> bool {
    matches!((received, expected), (Some(received), Some(expected)) if received == expected)
}

/// What [`Dispatcher::dispatch`] did with a payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DispatchOutcome {
    /// Delivered to the handler for this category.
    Routed(MessageType),
    /// No category field. Dropped.
    MissingDiscriminant,
    /// Category outside the known set. Dropped.
    UnknownDiscriminant(u32),
    /// Known category with no handler registered. Dropped.
    Unregistered(MessageType),
}

type Slot = Option<Box<dyn InboundHandler + Send>>;

/// Routes each inbound payload to the single handler of its category.
///
/// [`MessageType::PeerReady`] is always wired to the ready callback given at
/// construction; the other categories are registered with the `with_*`
/// builders, each replacing any previous handler.
pub struct Dispatcher {
    books: Slot,
    verses: Slot,
    viewer: Slot,
    favorites: Slot,
    favorites_changed: Slot,
    ready: Box<dyn FnMut() + Send>,
    metrics: DispatchMetrics,
}

impl Dispatcher {
    pub fn new(on_ready: impl FnMut() + Send + 'static) -> Self {
        Self {
            books: None,
            verses: None,
            viewer: None,
            favorites: None,
            favorites_changed: None,
            ready: Box::new(on_ready),
            metrics: DispatchMetrics::default(),
        }
    }

    /// Dispatcher whose ready signal opens the gate of `handle`.
    pub fn for_handle<T>(handle: &DeliveryHandle<T>) -> Self
    where
        T: Transport + Send + 'static,
    {
        let handle = handle.clone();
        Self::new(move || handle.on_ready())
    }

    pub fn with_books_handler(mut self, handler: impl InboundHandler + Send + 'static) -> Self {
        self.books = Some(Box::new(handler));
        self
    }

    pub fn with_verses_handler(mut self, handler: impl InboundHandler + Send + 'static) -> Self {
        self.verses = Some(Box::new(handler));
        self
    }

    pub fn with_viewer_handler(mut self, handler: impl InboundHandler + Send + 'static) -> Self {
        self.viewer = Some(Box::new(handler));
        self
    }

    pub fn with_favorites_handler(mut self, handler: impl InboundHandler + Send + 'static) -> Self {
        self.favorites = Some(Box::new(handler));
        self
    }

    pub fn with_favorites_changed_handler(
        mut self,
        handler: impl InboundHandler + Send + 'static,
    ) -> Self {
        self.favorites_changed = Some(Box::new(handler));
        self
    }

    /// Decode `record` and route it.
    pub fn dispatch(&mut self, record: &WireRecord) -> DispatchOutcome {
        let fields = decode(record);
        self.dispatch_fields(&fields)
    }

    /// Route already decoded fields.
    pub fn dispatch_fields(&mut self, fields: &PartialFields) -> DispatchOutcome {
        let Some(raw) = fields.category else {
            match &fields.error {
                Some(error) => warn!(%error, "Companion reported an error"),
                None => debug!("Dropping inbound payload without category"),
            }
            self.metrics.inc_malformed();
            return DispatchOutcome::MissingDiscriminant;
        };
        let Some(category) = MessageType::from_repr(raw) else {
            debug!(category = raw, "Dropping inbound payload with unknown category");
            self.metrics.inc_malformed();
            return DispatchOutcome::UnknownDiscriminant(raw);
        };

        let slot = match category {
            MessageType::PeerReady => {
                trace!("Peer ready signal");
                (self.ready)();
                self.metrics.inc_routed(category);
                return DispatchOutcome::Routed(category);
            }
            MessageType::Book => &mut self.books,
            MessageType::Verses => &mut self.verses,
            MessageType::Viewer => &mut self.viewer,
            MessageType::Favorites => &mut self.favorites,
            MessageType::FavoritesChanged => &mut self.favorites_changed,
        };

        match slot {
            Some(handler) => {
                trace!(%category, token = ?fields.token, "Routing inbound payload");
                handler.on_payload(fields);
                self.metrics.inc_routed(category);
                DispatchOutcome::Routed(category)
            }
            None => {
                debug!(%category, "No handler registered, dropping payload");
                self.metrics.inc_unregistered();
                DispatchOutcome::Unregistered(category)
            }
        }
    }
}

impl std::fmt::Debug for Dispatcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Dispatcher")
            .field("books", &self.books.is_some())
            .field("verses", &self.verses.is_some())
            .field("viewer", &self.viewer.is_some())
            .field("favorites", &self.favorites.is_some())
            .field("favorites_changed", &self.favorites_changed.is_some())
            .finish_non_exhaustive()
    }
}
