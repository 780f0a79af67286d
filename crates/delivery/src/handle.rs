//! Shared access to the send cycle for collaborators and the event loop.

use std::sync::Arc;

use auto_impl::auto_impl;
use parking_lot::Mutex;
use pericope_wire::{CorrelationToken, Testament};

use crate::{DeliveryService, FailureReason, Transport};

/// The request surface collaborators issue requests through.
#[auto_impl(&, Arc, Box)]
pub trait Outbox {
    fn request_books(&self, testament: Testament) -> CorrelationToken;

    fn request_verse_ranges(&self, book: &str, chapter: u8) -> CorrelationToken;

    fn request_viewer_content(&self, book: &str, chapter: u8, range: &str) -> CorrelationToken;

    fn request_favorites(&self) -> CorrelationToken;

    fn toggle_favorite(&self, book: &str, chapter: u8, range: &str) -> CorrelationToken;

    fn cancel(&self, token: CorrelationToken);
}

/// Cloneable, shared handle to a [`DeliveryService`].
///
/// Every call takes the lock for its duration. Handlers run by the
/// [`Dispatcher`](crate::Dispatcher) may call back into the handle, so the
/// dispatcher must never be driven while this lock is held.
#[derive(Debug)]
pub struct DeliveryHandle<T> {
    inner: Arc<Mutex<DeliveryService<T>>>,
}

impl<T> Clone for DeliveryHandle<T> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<T: Transport> DeliveryHandle<T> {
    pub fn new(service: DeliveryService<T>) -> Self {
        Self {
            inner: Arc::new(Mutex::new(service)),
        }
    }

    pub fn open(&self) {
        self.inner.lock().open();
    }

    pub fn on_ready(&self) {
        self.inner.lock().on_ready();
    }

    pub fn on_delivered(&self) {
        self.inner.lock().on_delivered();
    }

    pub fn on_failed(&self, reason: FailureReason) {
        self.inner.lock().on_failed(reason);
    }

    pub fn on_inbound_dropped(&self, reason: FailureReason) {
        self.inner.lock().on_inbound_dropped(reason);
    }

    pub fn is_open(&self) -> bool {
        self.inner.lock().is_open()
    }

    pub fn is_sending(&self) -> bool {
        self.inner.lock().is_sending()
    }

    pub fn queue_len(&self) -> usize {
        self.inner.lock().queue_len()
    }

    /// Run `f` with exclusive access to the service.
    pub fn with<R>(&self, f: impl FnOnce(&mut DeliveryService<T>) -> R) -> R {
        f(&mut self.inner.lock())
    }
}

impl<T: Transport> Outbox for DeliveryHandle<T> {
    fn request_books(&self, testament: Testament) -> CorrelationToken {
        self.inner.lock().request_books(testament)
    }

    fn request_verse_ranges(&self, book: &str, chapter: u8) -> CorrelationToken {
        self.inner.lock().request_verse_ranges(book, chapter)
    }

    fn request_viewer_content(&self, book: &str, chapter: u8, range: &str) -> CorrelationToken {
        self.inner
            .lock()
            .request_viewer_content(book, chapter, range)
    }

    fn request_favorites(&self) -> CorrelationToken {
        self.inner.lock().request_favorites()
    }

    fn toggle_favorite(&self, book: &str, chapter: u8, range: &str) -> CorrelationToken {
        self.inner.lock().toggle_favorite(book, chapter, range)
    }

    fn cancel(&self, token: CorrelationToken) {
        self.inner.lock().cancel(token);
    }
}
