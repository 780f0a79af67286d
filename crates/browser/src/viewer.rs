use pericope_delivery::{InboundHandler, is_current};
use pericope_wire::{CorrelationToken, Passage, PartialFields};
use tracing::{debug, trace};

use crate::{LOADING_TEXT, SharedOutbox};

/// The text of one passage, assembled from chunks as they arrive.
pub struct Viewer {
    outbox: SharedOutbox,
    passage: Passage,
    /// `None` until the first chunk arrives.
    text: Option<String>,
    chunks: usize,
    token: Option<CorrelationToken>,
}

impl Viewer {
    pub fn new(outbox: SharedOutbox, passage: Passage) -> Self {
        Self {
            outbox,
            passage,
            text: None,
            chunks: 0,
            token: None,
        }
    }

    pub fn passage(&self) -> &Passage {
        &self.passage
    }

    /// Request the passage text, discarding anything received so far.
    pub fn load(&mut self) -> CorrelationToken {
        self.text = None;
        self.chunks = 0;
        let Passage {
            book,
            chapter,
            range,
        } = &self.passage;
        let token = self.outbox.request_viewer_content(book, *chapter, range);
        self.token = Some(token);
        token
    }

    /// Add or remove this passage from the favorites.
    pub fn toggle_favorite(&self) -> CorrelationToken {
        let Passage {
            book,
            chapter,
            range,
        } = &self.passage;
        self.outbox.toggle_favorite(book, *chapter, range)
    }

    pub fn close(&mut self) {
        if let Some(token) = self.token.take() {
            self.outbox.cancel(token);
        }
    }

    pub fn token(&self) -> Option<CorrelationToken> {
        self.token
    }

    /// Text received so far, or the loading placeholder.
    pub fn text(&self) -> &str {
        self.text.as_deref().unwrap_or(LOADING_TEXT)
    }

    pub fn is_loading(&self) -> bool {
        self.text.is_none()
    }

    /// Chunks appended so far.
    pub fn chunks(&self) -> usize {
        self.chunks
    }
}

impl InboundHandler for Viewer {
    fn on_payload(&mut self, fields: &PartialFields) {
        let Some(content) = &fields.content else {
            trace!(token = ?fields.token, "Viewer payload without content");
            return;
        };
        if !is_current(fields.token, self.token) {
            trace!(token = ?fields.token, "Stale viewer chunk");
            return;
        }

        self.text.get_or_insert_with(String::new).push_str(content);
        self.chunks += 1;
        debug!(
            passage = %self.passage,
            index = ?fields.index,
            len = content.len(),
            "Received passage chunk"
        );
    }
}

impl std::fmt::Debug for Viewer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Viewer")
            .field("passage", &self.passage)
            .field("chunks", &self.chunks)
            .field("token", &self.token)
            .finish_non_exhaustive()
    }
}
