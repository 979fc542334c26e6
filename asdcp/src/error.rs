use thiserror::Error;

use crate::ul::Ul;

/// Coarse classification of a failure, independent of the variant that carries the detail.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize)]
#[cfg_attr(feature = "jsonschema", derive(schemars::JsonSchema))]
pub enum ErrorKind {
    /// The caller passed an invalid argument.
    Param,
    /// The operation is not valid in the current reader/writer state.
    State,
    /// The bytes do not have the expected structural shape.
    Format,
    /// A frame number or byte offset lies outside known bounds.
    Range,
    /// A buffer could not hold the requested amount of data.
    Alloc,
    /// An HMAC or check-value comparison failed.
    Integrity,
    /// The underlying file operation failed.
    Io,
}

#[derive(Error, Debug)]
pub enum AsdcpError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("I/O error at offset 0x{offset:X} ({context}): {source}")]
    IoAtOffset {
        offset: u64,
        context: &'static str,
        source: std::io::Error,
    },

    #[error("unexpected end of data at offset 0x{offset:X} ({context})")]
    UnexpectedEof { offset: u64, context: &'static str },

    #[error("invalid parameter: {0}")]
    Param(String),

    #[error("{op} is not permitted in writer state {state}")]
    State { state: &'static str, op: &'static str },

    #[error("file is not open")]
    NotOpen,

    #[error("unexpected key at offset 0x{offset:X}: expected {expected}, got {got}")]
    KeyMismatch { offset: u64, expected: Ul, got: Ul },

    #[error("BER coding error: {0}")]
    BerCoding(&'static str),

    #[error("KLV coding error: {0}")]
    KlvCoding(String),

    #[error("format error: {0}")]
    Format(String),

    #[error("required metadata object not found: {0}")]
    MissingObject(&'static str),

    #[error("frame {frame} is outside the index")]
    FrameOutOfRange { frame: u32 },

    #[error("RIP length {rip_size} exceeds file size {file_size}")]
    RipOutOfRange { rip_size: u64, file_size: u64 },

    #[error("header content needs {needed} bytes but only {reserved} are reserved")]
    HeaderOverflow { needed: u64, reserved: u64 },

    #[error("frame buffer too small: capacity {capacity}, need {needed}")]
    SmallBuffer { capacity: usize, needed: usize },

    #[error("check value mismatch: wrong decryption key")]
    CheckValue,

    #[error("integrity pack failure: {0}")]
    Integrity(String),

    #[error("cryptographic setup error: {0}")]
    Crypto(String),
}

impl AsdcpError {
    /// Map this error onto the format-level error taxonomy.
    pub fn kind(&self) -> ErrorKind {
        match self {
            AsdcpError::Io(_) | AsdcpError::IoAtOffset { .. } => ErrorKind::Io,
            AsdcpError::Param(_) | AsdcpError::Crypto(_) => ErrorKind::Param,
            AsdcpError::State { .. } | AsdcpError::NotOpen => ErrorKind::State,
            AsdcpError::UnexpectedEof { .. }
            | AsdcpError::KeyMismatch { .. }
            | AsdcpError::BerCoding(_)
            | AsdcpError::KlvCoding(_)
            | AsdcpError::Format(_)
            | AsdcpError::MissingObject(_) => ErrorKind::Format,
            AsdcpError::FrameOutOfRange { .. } | AsdcpError::RipOutOfRange { .. } => {
                ErrorKind::Range
            }
            AsdcpError::HeaderOverflow { .. } | AsdcpError::SmallBuffer { .. } => ErrorKind::Alloc,
            AsdcpError::CheckValue | AsdcpError::Integrity(_) => ErrorKind::Integrity,
        }
    }

    pub(crate) fn format(msg: impl Into<String>) -> Self {
        AsdcpError::Format(msg.into())
    }

    pub(crate) fn param(msg: impl Into<String>) -> Self {
        AsdcpError::Param(msg.into())
    }
}

pub type Result<T> = std::result::Result<T, AsdcpError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kind_mapping() {
        assert_eq!(AsdcpError::CheckValue.kind(), ErrorKind::Integrity);
        assert_eq!(AsdcpError::FrameOutOfRange { frame: 3 }.kind(), ErrorKind::Range);
        assert_eq!(AsdcpError::NotOpen.kind(), ErrorKind::State);
        assert_eq!(
            AsdcpError::UnexpectedEof { offset: 0, context: "test" }.kind(),
            ErrorKind::Format
        );
        let io = std::io::Error::new(std::io::ErrorKind::Other, "boom");
        assert_eq!(AsdcpError::from(io).kind(), ErrorKind::Io);
    }
}
