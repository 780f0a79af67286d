//! Flat key/value records.

use bytes::Bytes;

use crate::WireKey;

/// Bytes of framing per tuple: key (u32), type (u8), length (u16).
pub(crate) const TUPLE_HEADER_LEN: usize = 7;

/// A single typed value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WireValue {
    /// Raw bytes.
    Bytes(Bytes),
    /// UTF-8 text, framed as a NUL-terminated C string.
    Str(String),
    /// Unsigned integer.
    Uint(u32),
    /// Signed integer.
    Int(i32),
}

impl WireValue {
    pub(crate) const TYPE_BYTES: u8 = 0;
    pub(crate) const TYPE_CSTRING: u8 = 1;
    pub(crate) const TYPE_UINT: u8 = 2;
    pub(crate) const TYPE_INT: u8 = 3;

    /// Type tag written ahead of the value.
    pub const fn type_tag(&self) -> u8 {
        match self {
            Self::Bytes(_) => Self::TYPE_BYTES,
            Self::Str(_) => Self::TYPE_CSTRING,
            Self::Uint(_) => Self::TYPE_UINT,
            Self::Int(_) => Self::TYPE_INT,
        }
    }

    /// Length of the encoded value, excluding the tuple header.
    pub fn encoded_len(&self) -> usize {
        match self {
            Self::Bytes(bytes) => bytes.len(),
            Self::Str(text) => text.len() + 1,
            Self::Uint(_) | Self::Int(_) => 4,
        }
    }

    /// Non-negative integer view. Negative signed values yield `None`.
    pub fn as_uint(&self) -> Option<u32> {
        match *self {
            Self::Uint(value) => Some(value),
            Self::Int(value) => u32::try_from(value).ok(),
            _ => None,
        }
    }

    /// Integer view that reinterprets signed values bit for bit.
    ///
    /// Tokens minted by the companion may arrive as signed 32-bit integers.
    pub fn as_bits(&self) -> Option<u32> {
        match *self {
            Self::Uint(value) => Some(value),
            Self::Int(value) => Some(value as u32),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::Str(text) => Some(text.as_str()),
            _ => None,
        }
    }
}

impl From<u8> for WireValue {
    fn from(value: u8) -> Self {
        Self::Uint(value.into())
    }
}

impl From<u16> for WireValue {
    fn from(value: u16) -> Self {
        Self::Uint(value.into())
    }
}

impl From<u32> for WireValue {
    fn from(value: u32) -> Self {
        Self::Uint(value)
    }
}

impl From<i32> for WireValue {
    fn from(value: i32) -> Self {
        Self::Int(value)
    }
}

impl From<String> for WireValue {
    fn from(value: String) -> Self {
        Self::Str(value)
    }
}

impl From<&str> for WireValue {
    fn from(value: &str) -> Self {
        Self::Str(value.to_owned())
    }
}

impl From<Bytes> for WireValue {
    fn from(value: Bytes) -> Self {
        Self::Bytes(value)
    }
}

/// An ordered dictionary of raw keys to values.
///
/// Keys are kept as raw integers so that a record decoded from a newer peer
/// still carries keys this build does not know about.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct WireRecord {
    entries: Vec<(u32, WireValue)>,
}

impl WireRecord {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder form of [`insert`](Self::insert).
    pub fn with(mut self, key: WireKey, value: impl Into<WireValue>) -> Self {
        self.insert(key, value);
        self
    }

    /// Set `key`, replacing any previous value while keeping its position.
    pub fn insert(&mut self, key: WireKey, value: impl Into<WireValue>) {
        self.insert_raw(key.id(), value.into());
    }

    pub fn insert_raw(&mut self, key: u32, value: WireValue) {
        match self.entries.iter_mut().find(|(k, _)| *k == key) {
            Some((_, slot)) => *slot = value,
            None => self.entries.push((key, value)),
        }
    }

    pub fn get(&self, key: WireKey) -> Option<&WireValue> {
        self.get_raw(key.id())
    }

    pub fn get_raw(&self, key: u32) -> Option<&WireValue> {
        self.entries
            .iter()
            .find_map(|(k, value)| (*k == key).then_some(value))
    }

    pub fn contains(&self, key: WireKey) -> bool {
        self.get(key).is_some()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (u32, &WireValue)> {
        self.entries.iter().map(|(key, value)| (*key, value))
    }

    /// Size of this record once framed by [`DictionaryCodec`](crate::DictionaryCodec).
    pub fn encoded_len(&self) -> usize {
        1 + self
            .entries
            .iter()
            .map(|(_, value)| TUPLE_HEADER_LEN + value.encoded_len())
            .sum::<usize>()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_insert_replaces_in_place() {
        let mut record = WireRecord::new()
            .with(WireKey::Request, 1u32)
            .with(WireKey::Book, "Ruth");
        record.insert(WireKey::Request, 4u32);

        assert_eq!(record.len(), 2);
        assert_eq!(record.get(WireKey::Request), Some(&WireValue::Uint(4)));
        assert_eq!(record.iter().next().map(|(k, _)| k), Some(WireKey::Request.id()));
    }

    #[test]
    fn test_encoded_len() {
        let record = WireRecord::new()
            .with(WireKey::Token, 7u32)
            .with(WireKey::Book, "Job");
        // count + (7 + 4) + (7 + "Job\0")
        assert_eq!(record.encoded_len(), 1 + 11 + 11);
    }

    #[test]
    fn test_integer_views() {
        assert_eq!(WireValue::Int(-1).as_uint(), None);
        assert_eq!(WireValue::Int(-1).as_bits(), Some(u32::MAX));
        assert_eq!(WireValue::Int(12).as_uint(), Some(12));
        assert_eq!(WireValue::from("x").as_uint(), None);
    }
}
