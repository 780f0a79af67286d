//! Stable integer discriminants shared with the companion.
//!
//! These values are part of the wire contract. Never renumber a variant;
//! append new ones instead.

use strum::{Display, EnumIter, EnumString, FromRepr, IntoStaticStr};

/// Dictionary keys.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Display, EnumIter, FromRepr, IntoStaticStr,
)]
#[strum(serialize_all = "snake_case")]
#[repr(u32)]
pub enum WireKey {
    /// Category of an inbound message, see [`MessageType`].
    MessageType = 0,
    /// Kind of an outbound request, see [`RequestKind`].
    Request = 1,
    /// Position of an entry within a paged or chunked response.
    Index = 2,
    Testament = 3,
    /// Book name.
    Book = 4,
    /// Chapter number, or chapter count in a book entry.
    Chapter = 5,
    /// Verse range such as `"1-15"`.
    Range = 6,
    /// Free text chunk.
    Content = 7,
    Token = 8,
    /// Error report from the companion. Carries no category.
    Error = 9,
}

impl WireKey {
    /// The integer written on the wire.
    pub const fn id(self) -> u32 {
        self as u32
    }
}

/// Outbound request kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumIter, FromRepr, IntoStaticStr)]
#[strum(serialize_all = "snake_case")]
#[repr(u32)]
pub enum RequestKind {
    Books = 0,
    Verses = 1,
    Viewer = 2,
    Cancel = 3,
    Favorites = 4,
    ToggleFavorite = 5,
}

impl RequestKind {
    pub const fn id(self) -> u32 {
        self as u32
    }
}

/// Inbound message categories, used by the dispatcher to pick a handler.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumIter, FromRepr, IntoStaticStr)]
#[strum(serialize_all = "snake_case")]
#[repr(u32)]
pub enum MessageType {
    /// One entry of a book list.
    Book = 0,
    /// One verse range of a chapter.
    Verses = 1,
    /// One favorite, or a token-only marker for an empty list.
    Favorites = 2,
    /// One chunk of passage text.
    Viewer = 3,
    /// The favorites list changed on the companion.
    FavoritesChanged = 4,
    /// The companion is ready to receive requests.
    PeerReady = 5,
}

impl MessageType {
    pub const fn id(self) -> u32 {
        self as u32
    }
}

/// Top level of the content hierarchy.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumIter, EnumString, FromRepr, IntoStaticStr,
)]
#[strum(ascii_case_insensitive)]
#[repr(u8)]
pub enum Testament {
    #[strum(to_string = "Old Testament", serialize = "old")]
    Old = 0,
    #[strum(to_string = "New Testament", serialize = "new")]
    New = 1,
}

impl Testament {
    pub const fn id(self) -> u8 {
        self as u8
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_wire_keys_are_stable() {
        assert_eq!(WireKey::MessageType.id(), 0);
        assert_eq!(WireKey::Token.id(), 8);
        assert_eq!(WireKey::from_repr(6), Some(WireKey::Range));
        assert_eq!(WireKey::from_repr(42), None);
    }

    #[test]
    fn test_message_type_matches_companion_table() {
        assert_eq!(MessageType::from_repr(3), Some(MessageType::Viewer));
        assert_eq!(MessageType::from_repr(5), Some(MessageType::PeerReady));
        assert_eq!(RequestKind::from_repr(5), Some(RequestKind::ToggleFavorite));
    }

    #[test]
    fn test_testament_parse_and_display() {
        assert_eq!("old".parse::<Testament>().unwrap(), Testament::Old);
        assert_eq!("NEW".parse::<Testament>().unwrap(), Testament::New);
        assert_eq!(Testament::Old.to_string(), "Old Testament");
        assert!("apocrypha".parse::<Testament>().is_err());
    }
}
