use std::sync::Arc;

use parking_lot::Mutex;
use pericope_delivery::{InboundHandler, is_current};
use pericope_wire::{CorrelationToken, Passage, PartialFields};
use tracing::{debug, trace};

use crate::SharedOutbox;

/// Favorites kept on the client.
pub const MAX_FAVORITES: usize = 20;

/// A stored favorite passage.
pub type Favorite = Passage;

/// The favorites list.
///
/// Refetched only when marked dirty. It starts dirty and is marked dirty
/// again whenever the companion reports a change.
pub struct FavoritesList {
    outbox: SharedOutbox,
    slots: Vec<Option<Favorite>>,
    dirty: bool,
    token: Option<CorrelationToken>,
}

impl FavoritesList {
    pub fn new(outbox: SharedOutbox) -> Self {
        Self {
            outbox,
            slots: vec![None; MAX_FAVORITES],
            dirty: true,
            token: None,
        }
    }

    /// Clear and refetch if dirty. Returns the new token, or `None` when the
    /// list was up to date.
    pub fn refresh(&mut self) -> Option<CorrelationToken> {
        if !self.dirty {
            return None;
        }
        self.slots.fill(None);
        let token = self.outbox.request_favorites();
        self.token = Some(token);
        Some(token)
    }

    pub fn mark_dirty(&mut self) {
        self.dirty = true;
    }

    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    pub fn close(&mut self) {
        if let Some(token) = self.token.take() {
            self.outbox.cancel(token);
        }
    }

    pub fn token(&self) -> Option<CorrelationToken> {
        self.token
    }

    pub fn favorites(&self) -> impl Iterator<Item = &Favorite> {
        self.slots.iter().flatten()
    }

    pub fn len(&self) -> usize {
        self.favorites().count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl InboundHandler for FavoritesList {
    fn on_payload(&mut self, fields: &PartialFields) {
        if !is_current(fields.token, self.token) {
            trace!(token = ?fields.token, "Stale favorites payload");
            return;
        }
        // Any current payload, including the token-only empty marker, means
        // the list is being delivered.
        self.dirty = false;

        let (Some(index), Some(book), Some(chapter), Some(range)) =
            (fields.index, &fields.book, fields.chapter, &fields.range)
        else {
            return;
        };
        let Some(slot) = self.slots.get_mut(usize::from(index)) else {
            debug!(index, "Favorite index out of range");
            return;
        };

        let favorite = Passage::new(book.as_str(), chapter, range.as_str());
        debug!(index, %favorite, "Received favorite");
        *slot = Some(favorite);
    }
}

impl std::fmt::Debug for FavoritesList {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FavoritesList")
            .field("favorites", &self.len())
            .field("dirty", &self.dirty)
            .field("token", &self.token)
            .finish_non_exhaustive()
    }
}

/// Marks a shared [`FavoritesList`] dirty whenever the companion reports
/// that the favorites changed.
///
/// The notification carries the token of the toggle that caused it, not one
/// the list issued, so it is not token checked.
#[derive(Debug, Clone)]
pub struct FavoritesChanged {
    list: Arc<Mutex<FavoritesList>>,
}

impl FavoritesChanged {
    pub fn new(list: Arc<Mutex<FavoritesList>>) -> Self {
        Self { list }
    }
}

impl InboundHandler for FavoritesChanged {
    fn on_payload(&mut self, fields: &PartialFields) {
        debug!(token = ?fields.token, "Favorites changed");
        self.list.lock().mark_dirty();
    }
}

#[cfg(test)]
mod tests {
    use pericope_wire::{Response, decode};

    use super::*;
    use crate::test_utils::RecordingOutbox;

    fn favorite(token: CorrelationToken, index: u16, passage: Passage) -> PartialFields {
        decode(
            &Response::FavoriteEntry {
                token,
                index,
                passage,
            }
            .encode(),
        )
    }

    #[test]
    fn test_refresh_only_when_dirty() {
        let outbox = Arc::new(RecordingOutbox::default());
        let mut list = FavoritesList::new(outbox.clone());
        let token = list.refresh().unwrap();

        list.on_payload(&favorite(token, 0, Passage::new("John", 3, "16-30")));
        assert!(!list.is_dirty());
        assert_eq!(list.refresh(), None);
        assert_eq!(outbox.calls(), vec!["favorites"]);

        list.mark_dirty();
        assert!(list.refresh().is_some());
        assert!(list.is_empty());
    }

    #[test]
    fn test_empty_marker_clears_dirty() {
        let outbox = Arc::new(RecordingOutbox::default());
        let mut list = FavoritesList::new(outbox);
        let token = list.refresh().unwrap();

        list.on_payload(&decode(&Response::FavoritesEmpty { token }.encode()));
        assert!(!list.is_dirty());
        assert!(list.is_empty());
    }

    #[test]
    fn test_stale_and_out_of_range() {
        let outbox = Arc::new(RecordingOutbox::default());
        let mut list = FavoritesList::new(outbox);
        let token = list.refresh().unwrap();

        list.on_payload(&favorite(
            CorrelationToken::new(77),
            0,
            Passage::new("John", 3, "16-30"),
        ));
        assert!(list.is_dirty());

        list.on_payload(&favorite(token, 20, Passage::new("John", 3, "16-30")));
        assert!(!list.is_dirty());
        assert!(list.is_empty());
    }

    #[test]
    fn test_changed_marks_dirty() {
        let outbox = Arc::new(RecordingOutbox::default());
        let list = Arc::new(Mutex::new(FavoritesList::new(outbox)));
        let token = list.lock().refresh().unwrap();
        list.lock()
            .on_payload(&decode(&Response::FavoritesEmpty { token }.encode()));
        assert!(!list.lock().is_dirty());

        let mut changed = FavoritesChanged::new(Arc::clone(&list));
        changed.on_payload(&decode(
            &Response::FavoritesChanged {
                token: CorrelationToken::new(5),
            }
            .encode(),
        ));
        assert!(list.lock().is_dirty());
    }
}
