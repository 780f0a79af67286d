//! Inbound messages, as produced by the companion.

use crate::{CorrelationToken, MessageType, Passage, WireKey, WireRecord};

/// Everything the companion sends to the client.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Response {
    /// The companion finished starting up.
    PeerReady,
    /// One book of a testament.
    BookEntry {
        token: CorrelationToken,
        index: u16,
        name: String,
        /// Number of chapters in the book.
        chapters: u8,
    },
    /// One verse range of a chapter.
    VerseRange {
        token: CorrelationToken,
        index: u16,
        range: String,
    },
    /// One chunk of passage text.
    ViewerChunk {
        token: CorrelationToken,
        index: u16,
        content: String,
    },
    /// One stored favorite.
    FavoriteEntry {
        token: CorrelationToken,
        index: u16,
        passage: Passage,
    },
    /// The favorites list is empty. Carries only the token.
    FavoritesEmpty { token: CorrelationToken },
    /// A toggle changed the favorites list.
    FavoritesChanged { token: CorrelationToken },
    /// The companion could not serve a request. Has no category, so the
    /// client dispatcher drops it after logging.
    Error { message: String },
}

impl Response {
    pub const fn token(&self) -> Option<CorrelationToken> {
        match self {
            Self::BookEntry { token, .. }
            | Self::VerseRange { token, .. }
            | Self::ViewerChunk { token, .. }
            | Self::FavoriteEntry { token, .. }
            | Self::FavoritesEmpty { token }
            | Self::FavoritesChanged { token } => Some(*token),
            Self::PeerReady | Self::Error { .. } => None,
        }
    }

    pub const fn category(&self) -> Option<MessageType> {
        match self {
            Self::PeerReady => Some(MessageType::PeerReady),
            Self::BookEntry { .. } => Some(MessageType::Book),
            Self::VerseRange { .. } => Some(MessageType::Verses),
            Self::ViewerChunk { .. } => Some(MessageType::Viewer),
            Self::FavoriteEntry { .. } | Self::FavoritesEmpty { .. } => {
                Some(MessageType::Favorites)
            }
            Self::FavoritesChanged { .. } => Some(MessageType::FavoritesChanged),
            Self::Error { .. } => None,
        }
    }

    pub fn encode(&self) -> WireRecord {
        let mut record = WireRecord::new();
        if let Some(category) = self.category() {
            record.insert(WireKey::MessageType, category.id());
        }
        if let Some(token) = self.token() {
            record.insert(WireKey::Token, token.get());
        }

        match self {
            Self::PeerReady | Self::FavoritesEmpty { .. } | Self::FavoritesChanged { .. } => record,
            Self::BookEntry {
                index,
                name,
                chapters,
                ..
            } => record
                .with(WireKey::Index, *index)
                .with(WireKey::Book, name.as_str())
                .with(WireKey::Chapter, *chapters),
            Self::VerseRange { index, range, .. } => record
                .with(WireKey::Index, *index)
                .with(WireKey::Content, range.as_str()),
            Self::ViewerChunk { index, content, .. } => record
                .with(WireKey::Index, *index)
                .with(WireKey::Content, content.as_str()),
            Self::FavoriteEntry { index, passage, .. } => record
                .with(WireKey::Index, *index)
                .with(WireKey::Book, passage.book.as_str())
                .with(WireKey::Chapter, passage.chapter)
                .with(WireKey::Range, passage.range.as_str()),
            Self::Error { message } => record.with(WireKey::Error, message.as_str()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::decode;

    #[test]
    fn test_verse_range_travels_as_content() {
        let fields = decode(
            &Response::VerseRange {
                token: CorrelationToken::new(3),
                index: 1,
                range: "16-30".into(),
            }
            .encode(),
        );

        assert_eq!(fields.category, Some(MessageType::Verses.id()));
        assert_eq!(fields.content.as_deref(), Some("16-30"));
        assert_eq!(fields.index, Some(1));
        assert_eq!(fields.range, None);
    }

    #[test]
    fn test_empty_favorites_is_token_only() {
        let record = Response::FavoritesEmpty {
            token: CorrelationToken::new(8),
        }
        .encode();

        assert_eq!(record.len(), 2);
        assert!(!record.contains(WireKey::Index));
    }

    #[test]
    fn test_error_has_no_category() {
        let fields = decode(
            &Response::Error {
                message: "Error: Request timed out!".into(),
            }
            .encode(),
        );

        assert_eq!(fields.category, None);
        assert_eq!(fields.token, None);
        assert!(fields.error.is_some());
    }

    #[test]
    fn test_peer_ready_is_category_only() {
        let record = Response::PeerReady.encode();
        assert_eq!(record.len(), 1);
        assert_eq!(
            decode(&record).category,
            Some(MessageType::PeerReady.id())
        );
    }
}
