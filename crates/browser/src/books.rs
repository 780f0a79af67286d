use std::ops::RangeInclusive;

use pericope_delivery::{InboundHandler, is_current};
use pericope_wire::{CorrelationToken, PartialFields, Testament};
use tracing::{debug, trace};

use crate::SharedOutbox;

/// Slots in a book list. Large enough for either testament.
pub const MAX_BOOKS: usize = 39;

/// A book as listed by the companion.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Book {
    pub name: String,
    pub chapters: u8,
}

impl Book {
    /// Chapter numbers, starting at one.
    pub fn chapter_numbers(&self) -> RangeInclusive<u8> {
        1..=self.chapters
    }
}

/// The books of one testament.
pub struct BookList {
    outbox: SharedOutbox,
    testament: Testament,
    slots: Vec<Option<Book>>,
    token: Option<CorrelationToken>,
}

impl BookList {
    pub fn new(outbox: SharedOutbox, testament: Testament) -> Self {
        Self {
            outbox,
            testament,
            slots: vec![None; MAX_BOOKS],
            token: None,
        }
    }

    pub fn testament(&self) -> Testament {
        self.testament
    }

    /// Clear the list and request it again.
    pub fn refresh(&mut self) -> CorrelationToken {
        self.slots.fill(None);
        let token = self.outbox.request_books(self.testament);
        self.token = Some(token);
        token
    }

    /// Cancel the outstanding request, if any.
    pub fn close(&mut self) {
        if let Some(token) = self.token.take() {
            self.outbox.cancel(token);
        }
    }

    pub fn token(&self) -> Option<CorrelationToken> {
        self.token
    }

    /// Received books in index order.
    pub fn books(&self) -> impl Iterator<Item = &Book> {
        self.slots.iter().flatten()
    }

    pub fn get(&self, index: usize) -> Option<&Book> {
        self.slots.get(index).and_then(Option::as_ref)
    }

    pub fn len(&self) -> usize {
        self.books().count()
    }

    /// Nothing received yet.
    pub fn is_loading(&self) -> bool {
        self.len() == 0
    }
}

impl InboundHandler for BookList {
    fn on_payload(&mut self, fields: &PartialFields) {
        let (Some(index), Some(name), Some(chapters)) = (fields.index, &fields.book, fields.chapter)
        else {
            trace!(token = ?fields.token, "Incomplete book entry");
            return;
        };
        if !is_current(fields.token, self.token) {
            trace!(token = ?fields.token, "Stale book entry");
            return;
        }
        let Some(slot) = self.slots.get_mut(usize::from(index)) else {
            debug!(index, "Book index out of range");
            return;
        };

        debug!(index, book = %name, chapters, "Received book");
        *slot = Some(Book {
            name: name.clone(),
            chapters,
        });
    }
}

impl std::fmt::Debug for BookList {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BookList")
            .field("testament", &self.testament)
            .field("books", &self.len())
            .field("token", &self.token)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use pericope_wire::{Response, decode};

    use super::*;
    use crate::test_utils::RecordingOutbox;

    fn entry(token: CorrelationToken, index: u16, name: &str, chapters: u8) -> PartialFields {
        decode(
            &Response::BookEntry {
                token,
                index,
                name: name.into(),
                chapters,
            }
            .encode(),
        )
    }

    #[test]
    fn test_entries_land_by_index() {
        let outbox = Arc::new(RecordingOutbox::default());
        let mut list = BookList::new(outbox.clone(), Testament::Old);
        let token = list.refresh();

        list.on_payload(&entry(token, 1, "Exodus", 40));
        list.on_payload(&entry(token, 0, "Genesis", 50));

        let names: Vec<_> = list.books().map(|book| book.name.as_str()).collect();
        assert_eq!(names, vec!["Genesis", "Exodus"]);
        assert_eq!(outbox.calls(), vec!["books Old Testament"]);
        assert_eq!(list.get(0).map(|book| book.chapter_numbers().count()), Some(50));
    }

    #[test]
    fn test_stale_and_incomplete_entries_ignored() {
        let outbox = Arc::new(RecordingOutbox::default());
        let mut list = BookList::new(outbox, Testament::New);
        let first = list.refresh();
        let second = list.refresh();

        list.on_payload(&entry(first, 0, "Matthew", 28));
        list.on_payload(&entry(second, 39, "Overflow", 1));
        let mut partial = entry(second, 0, "Matthew", 28);
        partial.chapter = None;
        list.on_payload(&partial);

        assert!(list.is_loading());
    }

    #[test]
    fn test_refresh_clears() {
        let outbox = Arc::new(RecordingOutbox::default());
        let mut list = BookList::new(outbox, Testament::Old);
        let token = list.refresh();
        list.on_payload(&entry(token, 0, "Genesis", 50));
        assert_eq!(list.len(), 1);

        list.refresh();
        assert!(list.is_loading());
    }

    #[test]
    fn test_close_cancels_once() {
        let outbox = Arc::new(RecordingOutbox::default());
        let mut list = BookList::new(outbox.clone(), Testament::Old);
        let token = list.refresh();
        list.close();
        list.close();
        assert_eq!(
            outbox.calls(),
            vec!["books Old Testament".to_owned(), format!("cancel {token}")]
        );
    }
}
