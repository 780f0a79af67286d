//! Lenient decoding of inbound records.

use tracing::trace;

use crate::{CorrelationToken, Testament, WireKey, WireRecord, WireValue};

/// Whichever known fields a record carried.
///
/// Every field is optional. A key that is present with a value of the wrong
/// type, or an integer that does not fit the field, is treated as absent.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PartialFields {
    /// Raw [`MessageType`](crate::MessageType) discriminant.
    pub category: Option<u32>,
    /// Raw [`RequestKind`](crate::RequestKind) discriminant.
    pub request: Option<u32>,
    pub index: Option<u16>,
    /// Raw [`Testament`] discriminant.
    pub testament: Option<u8>,
    pub book: Option<String>,
    pub chapter: Option<u8>,
    pub range: Option<String>,
    pub content: Option<String>,
    pub token: Option<CorrelationToken>,
    pub error: Option<String>,
}

impl PartialFields {
    /// The testament, if present and known.
    pub fn testament(&self) -> Option<Testament> {
        self.testament.and_then(Testament::from_repr)
    }

    /// Number of populated fields.
    pub fn populated(&self) -> usize {
        [
            self.category.is_some(),
            self.request.is_some(),
            self.index.is_some(),
            self.testament.is_some(),
            self.book.is_some(),
            self.chapter.is_some(),
            self.range.is_some(),
            self.content.is_some(),
            self.token.is_some(),
            self.error.is_some(),
        ]
        .into_iter()
        .filter(|present| *present)
        .count()
    }
}

/// Extract the known keys from `record`. Never fails.
pub fn decode(record: &WireRecord) -> PartialFields {
    let mut fields = PartialFields::default();

    for (raw, value) in record.iter() {
        let Some(key) = WireKey::from_repr(raw) else {
            trace!(key = raw, "Ignoring unknown wire key");
            continue;
        };

        match key {
            WireKey::MessageType => fields.category = uint(key, value),
            WireKey::Request => fields.request = uint(key, value),
            WireKey::Index => fields.index = narrow(key, value),
            WireKey::Testament => fields.testament = narrow(key, value),
            WireKey::Book => fields.book = text(key, value),
            WireKey::Chapter => fields.chapter = narrow(key, value),
            WireKey::Range => fields.range = text(key, value),
            WireKey::Content => fields.content = text(key, value),
            WireKey::Token => {
                fields.token = value.as_bits().map(CorrelationToken::new);
                if fields.token.is_none() {
                    trace!(%key, "Wire field has unexpected type");
                }
            }
            WireKey::Error => fields.error = text(key, value),
        }
    }

    fields
}

fn uint(key: WireKey, value: &WireValue) -> Option<u32> {
    let result = value.as_uint();
    if result.is_none() {
        trace!(%key, "Wire field has unexpected type");
    }
    result
}

fn narrow<T: TryFrom<u32>>(key: WireKey, value: &WireValue) -> Option<T> {
    let result = uint(key, value).and_then(|v| T::try_from(v).ok());
    if result.is_none() {
        trace!(%key, "Wire field out of range");
    }
    result
}

fn text(key: WireKey, value: &WireValue) -> Option<String> {
    let result = value.as_str().map(str::to_owned);
    if result.is_none() {
        trace!(%key, "Wire field has unexpected type");
    }
    result
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decode_missing_keys_are_absent() {
        let record = WireRecord::new()
            .with(WireKey::MessageType, 0u32)
            .with(WireKey::Book, "Genesis");

        let fields = decode(&record);
        assert_eq!(fields.category, Some(0));
        assert_eq!(fields.book.as_deref(), Some("Genesis"));
        assert_eq!(fields.token, None);
        assert_eq!(fields.populated(), 2);
    }

    #[test]
    fn test_decode_wrong_type_is_absent() {
        let record = WireRecord::new()
            .with(WireKey::Chapter, "three")
            .with(WireKey::Book, 4u32)
            .with(WireKey::Index, 70_000u32);

        let fields = decode(&record);
        assert_eq!(fields.chapter, None);
        assert_eq!(fields.book, None);
        assert_eq!(fields.index, None);
        assert_eq!(fields.populated(), 0);
    }

    #[test]
    fn test_decode_ignores_unknown_keys() {
        let mut record = WireRecord::new().with(WireKey::Token, 9u32);
        record.insert_raw(99, WireValue::Uint(1));

        let fields = decode(&record);
        assert_eq!(fields.token, Some(CorrelationToken::new(9)));
        assert_eq!(fields.populated(), 1);
    }

    #[test]
    fn test_decode_signed_token() {
        let record = WireRecord::new().with(WireKey::Token, -2i32);
        assert_eq!(
            decode(&record).token,
            Some(CorrelationToken::new(u32::MAX - 1))
        );
    }
}
