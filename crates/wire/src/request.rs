//! Outbound requests.

use std::fmt;

use crate::{
    CorrelationToken, PartialFields, RequestKind, Testament, WireError, WireKey, WireRecord,
};

/// A book, chapter and verse range.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Passage {
    pub book: String,
    pub chapter: u8,
    /// Verse range such as `"1-15"`.
    pub range: String,
}

impl Passage {
    pub fn new(book: impl Into<String>, chapter: u8, range: impl Into<String>) -> Self {
        Self {
            book: book.into(),
            chapter,
            range: range.into(),
        }
    }
}

impl fmt::Display for Passage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}:{}", self.book, self.chapter, self.range)
    }
}

/// A request to the companion. Immutable once created.
///
/// Each variant carries exactly the fields its kind puts on the wire.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Request {
    /// List the books of a testament.
    Books {
        token: CorrelationToken,
        testament: Testament,
    },
    /// List the verse ranges of a chapter.
    VerseRanges {
        token: CorrelationToken,
        book: String,
        chapter: u8,
    },
    /// Fetch the text of a passage, delivered in chunks.
    Viewer {
        token: CorrelationToken,
        passage: Passage,
    },
    /// Ask the companion to stop responding to `token`.
    Cancel { token: CorrelationToken },
    /// List the favorites.
    Favorites { token: CorrelationToken },
    /// Add or remove a passage from the favorites.
    ToggleFavorite {
        token: CorrelationToken,
        passage: Passage,
    },
}

impl Request {
    pub const fn token(&self) -> CorrelationToken {
        match self {
            Self::Books { token, .. }
            | Self::VerseRanges { token, .. }
            | Self::Viewer { token, .. }
            | Self::Cancel { token }
            | Self::Favorites { token }
            | Self::ToggleFavorite { token, .. } => *token,
        }
    }

    pub const fn kind(&self) -> RequestKind {
        match self {
            Self::Books { .. } => RequestKind::Books,
            Self::VerseRanges { .. } => RequestKind::Verses,
            Self::Viewer { .. } => RequestKind::Viewer,
            Self::Cancel { .. } => RequestKind::Cancel,
            Self::Favorites { .. } => RequestKind::Favorites,
            Self::ToggleFavorite { .. } => RequestKind::ToggleFavorite,
        }
    }

    /// Serialize into a wire record holding only the populated fields.
    pub fn encode(&self) -> WireRecord {
        let record = WireRecord::new()
            .with(WireKey::Request, self.kind().id())
            .with(WireKey::Token, self.token().get());

        match self {
            Self::Books { testament, .. } => record.with(WireKey::Testament, testament.id()),
            Self::VerseRanges { book, chapter, .. } => record
                .with(WireKey::Book, book.as_str())
                .with(WireKey::Chapter, *chapter),
            Self::Viewer { passage, .. } | Self::ToggleFavorite { passage, .. } => record
                .with(WireKey::Book, passage.book.as_str())
                .with(WireKey::Chapter, passage.chapter)
                .with(WireKey::Range, passage.range.as_str()),
            Self::Cancel { .. } | Self::Favorites { .. } => record,
        }
    }
}

impl TryFrom<&PartialFields> for Request {
    type Error = WireError;

    fn try_from(fields: &PartialFields) -> Result<Self, Self::Error> {
        let raw = fields
            .request
            .ok_or(WireError::MissingField(WireKey::Request))?;
        let kind = RequestKind::from_repr(raw).ok_or(WireError::UnknownRequestKind(raw))?;
        let token = fields.token.ok_or(WireError::MissingField(WireKey::Token))?;

        let request = match kind {
            RequestKind::Books => {
                let raw = fields
                    .testament
                    .ok_or(WireError::MissingField(WireKey::Testament))?;
                Self::Books {
                    token,
                    testament: Testament::from_repr(raw).ok_or(WireError::UnknownTestament(raw))?,
                }
            }
            RequestKind::Verses => Self::VerseRanges {
                token,
                book: required(fields.book.clone(), WireKey::Book)?,
                chapter: required(fields.chapter, WireKey::Chapter)?,
            },
            RequestKind::Viewer => Self::Viewer {
                token,
                passage: passage(fields)?,
            },
            RequestKind::Cancel => Self::Cancel { token },
            RequestKind::Favorites => Self::Favorites { token },
            RequestKind::ToggleFavorite => Self::ToggleFavorite {
                token,
                passage: passage(fields)?,
            },
        };

        Ok(request)
    }
}

fn required<T>(value: Option<T>, key: WireKey) -> Result<T, WireError> {
    value.ok_or(WireError::MissingField(key))
}

fn passage(fields: &PartialFields) -> Result<Passage, WireError> {
    Ok(Passage {
        book: required(fields.book.clone(), WireKey::Book)?,
        chapter: required(fields.chapter, WireKey::Chapter)?,
        range: required(fields.range.clone(), WireKey::Range)?,
    })
}
