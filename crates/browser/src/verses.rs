use pericope_delivery::{InboundHandler, is_current};
use pericope_wire::{CorrelationToken, PartialFields};
use tracing::{debug, trace};

use crate::SharedOutbox;

/// Verse ranges kept per chapter.
pub const MAX_RANGES: usize = 6;

/// Longest range label kept, in characters. Longer labels are truncated.
pub const MAX_RANGE_LEN: usize = 7;

/// The verse ranges of one chapter, such as `"1-15"`, `"16-30"`.
pub struct VerseRangeList {
    outbox: SharedOutbox,
    book: String,
    chapter: u8,
    slots: Vec<Option<String>>,
    token: Option<CorrelationToken>,
}

impl VerseRangeList {
    pub fn new(outbox: SharedOutbox, book: impl Into<String>, chapter: u8) -> Self {
        Self {
            outbox,
            book: book.into(),
            chapter,
            slots: vec![None; MAX_RANGES],
            token: None,
        }
    }

    pub fn book(&self) -> &str {
        &self.book
    }

    pub fn chapter(&self) -> u8 {
        self.chapter
    }

    pub fn refresh(&mut self) -> CorrelationToken {
        self.slots.fill(None);
        let token = self.outbox.request_verse_ranges(&self.book, self.chapter);
        self.token = Some(token);
        token
    }

    pub fn close(&mut self) {
        if let Some(token) = self.token.take() {
            self.outbox.cancel(token);
        }
    }

    pub fn token(&self) -> Option<CorrelationToken> {
        self.token
    }

    pub fn ranges(&self) -> impl Iterator<Item = &str> {
        self.slots.iter().flatten().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.ranges().count()
    }

    pub fn is_loading(&self) -> bool {
        self.len() == 0
    }
}

impl InboundHandler for VerseRangeList {
    fn on_payload(&mut self, fields: &PartialFields) {
        let (Some(index), Some(range)) = (fields.index, &fields.content) else {
            trace!(token = ?fields.token, "Incomplete verse range");
            return;
        };
        if !is_current(fields.token, self.token) {
            trace!(token = ?fields.token, "Stale verse range");
            return;
        }
        let Some(slot) = self.slots.get_mut(usize::from(index)) else {
            debug!(index, "Verse range index out of range");
            return;
        };

        let range: String = range.chars().take(MAX_RANGE_LEN).collect();
        debug!(index, %range, "Received verse range");
        *slot = Some(range);
    }
}

impl std::fmt::Debug for VerseRangeList {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("VerseRangeList")
            .field("book", &self.book)
            .field("chapter", &self.chapter)
            .field("ranges", &self.len())
            .field("token", &self.token)
            .finish_non_exhaustive()
    }
}
