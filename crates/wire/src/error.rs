use crate::WireKey;

/// Error type for wire encoding, framing and typed parsing.
#[derive(Debug, thiserror::Error)]
pub enum WireError {
    /// The framed dictionary does not fit the transport buffer.
    #[error("Dictionary of {size} bytes exceeds buffer of {max} bytes")]
    TooLarge { size: usize, max: usize },
    #[error("Dictionary holds {0} tuples, at most 255 allowed")]
    TooManyTuples(usize),
    #[error("Unknown value type {tag} for key {key}")]
    UnknownValueType { key: u32, tag: u8 },
    #[error("Invalid integer width {width} for key {key}")]
    InvalidIntegerWidth { key: u32, width: usize },
    #[error("Invalid UTF-8 in string for key {key}")]
    InvalidUtf8 { key: u32 },
    #[error("String for key {key} contains an interior NUL")]
    InteriorNul { key: u32 },
    /// A field required by the message kind is absent.
    #[error("Missing field: {0}")]
    MissingField(WireKey),
    #[error("Unknown request kind {0}")]
    UnknownRequestKind(u32),
    #[error("Unknown testament {0}")]
    UnknownTestament(u8),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}
