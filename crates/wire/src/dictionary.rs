//! Byte framing for wire records.
//!
//! # Layout
//!
//! ```text
//! count: u8
//! count × { key: u32 LE, type: u8, length: u16 LE, value: [u8; length] }
//! ```
//!
//! Strings carry a trailing NUL. Integers are written as four bytes and
//! accepted in widths of one, two or four. The whole frame is bounded by the
//! transport buffer size.

use bytes::{Buf, BufMut, Bytes, BytesMut};

use crate::{
    WireError, WireRecord, WireValue,
    record::TUPLE_HEADER_LEN,
};

/// Default size of each transport buffer.
pub const DEFAULT_MAX_DICTIONARY_SIZE: usize = 128;

/// Encoder and decoder for one bounded dictionary per frame.
#[derive(Debug, Clone)]
pub struct DictionaryCodec {
    max_size: usize,
}

impl DictionaryCodec {
    pub fn new(max_size: usize) -> Self {
        Self { max_size }
    }

    pub fn max_size(&self) -> usize {
        self.max_size
    }
}

impl Default for DictionaryCodec {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_DICTIONARY_SIZE)
    }
}

impl asynchronous_codec::Encoder for DictionaryCodec {
    type Item<'a> = WireRecord;
    type Error = WireError;

    fn encode(&mut self, item: Self::Item<'_>, dst: &mut BytesMut) -> Result<(), Self::Error> {
        let size = item.encoded_len();
        if size > self.max_size {
            return Err(WireError::TooLarge {
                size,
                max: self.max_size,
            });
        }
        let count = u8::try_from(item.len()).map_err(|_| WireError::TooManyTuples(item.len()))?;

        // Validate before writing so a failed encode leaves `dst` untouched.
        for (key, value) in item.iter() {
            if let WireValue::Str(text) = value
                && text.contains('\0')
            {
                return Err(WireError::InteriorNul { key });
            }
            if u16::try_from(value.encoded_len()).is_err() {
                return Err(WireError::TooLarge {
                    size,
                    max: usize::from(u16::MAX),
                });
            }
        }

        dst.reserve(size);
        dst.put_u8(count);
        for (key, value) in item.iter() {
            dst.put_u32_le(key);
            dst.put_u8(value.type_tag());
            // Fits, checked above.
            dst.put_u16_le(value.encoded_len() as u16);
            match value {
                WireValue::Bytes(bytes) => dst.put_slice(bytes),
                WireValue::Str(text) => {
                    dst.put_slice(text.as_bytes());
                    dst.put_u8(0);
                }
                WireValue::Uint(v) => dst.put_u32_le(*v),
                WireValue::Int(v) => dst.put_i32_le(*v),
            }
        }

        Ok(())
    }
}

impl asynchronous_codec::Decoder for DictionaryCodec {
    type Item = WireRecord;
    type Error = WireError;

    fn decode(&mut self, src: &mut BytesMut) -> Result<Option<Self::Item>, Self::Error> {
        match frame_len(src.as_ref(), self.max_size)? {
            Some(len) => parse(src.split_to(len).freeze()).map(Some),
            None => Ok(None),
        }
    }
}

/// Length of the first complete frame in `src`, or `None` if more bytes are needed.
fn frame_len(mut src: &[u8], max_size: usize) -> Result<Option<usize>, WireError> {
    if !src.has_remaining() {
        return Ok(None);
    }
    let count = src.get_u8();
    let mut size = 1usize;

    for _ in 0..count {
        if src.remaining() < TUPLE_HEADER_LEN {
            return Ok(None);
        }
        src.advance(5);
        let value_len = usize::from(src.get_u16_le());

        size += TUPLE_HEADER_LEN + value_len;
        if size > max_size {
            return Err(WireError::TooLarge {
                size,
                max: max_size,
            });
        }
        if src.remaining() < value_len {
            return Ok(None);
        }
        src.advance(value_len);
    }

    Ok(Some(size))
}

/// Parse one complete frame, as measured by [`frame_len`].
fn parse(mut frame: Bytes) -> Result<WireRecord, WireError> {
    let count = frame.get_u8();
    let mut record = WireRecord::new();

    for _ in 0..count {
        let key = frame.get_u32_le();
        let tag = frame.get_u8();
        let len = usize::from(frame.get_u16_le());
        let data = frame.split_to(len);

        let value = match tag {
            WireValue::TYPE_BYTES => WireValue::Bytes(data),
            WireValue::TYPE_CSTRING => {
                let text = data.split(|b| *b == 0).next().unwrap_or_default();
                let text = std::str::from_utf8(text).map_err(|_| WireError::InvalidUtf8 { key })?;
                WireValue::Str(text.to_owned())
            }
            WireValue::TYPE_UINT => WireValue::Uint(read_uint(key, &data)?),
            WireValue::TYPE_INT => WireValue::Int(read_int(key, &data)?),
            tag => return Err(WireError::UnknownValueType { key, tag }),
        };
        record.insert_raw(key, value);
    }

    Ok(record)
}

fn read_uint(key: u32, data: &[u8]) -> Result<u32, WireError> {
    match *data {
        [a] => Ok(a.into()),
        [a, b] => Ok(u16::from_le_bytes([a, b]).into()),
        [a, b, c, d] => Ok(u32::from_le_bytes([a, b, c, d])),
        _ => Err(WireError::InvalidIntegerWidth {
            key,
            width: data.len(),
        }),
    }
}

fn read_int(key: u32, data: &[u8]) -> Result<i32, WireError> {
    match *data {
        [a] => Ok(i8::from_le_bytes([a]).into()),
        [a, b] => Ok(i16::from_le_bytes([a, b]).into()),
        [a, b, c, d] => Ok(i32::from_le_bytes([a, b, c, d])),
        _ => Err(WireError::InvalidIntegerWidth {
            key,
            width: data.len(),
        }),
    }
}
