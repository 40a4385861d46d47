//! Header structures for the UMD block stream.

use byteorder::{ByteOrder, LittleEndian};
use std::fmt;
use thiserror::Error;

/// Errors that can occur while decoding a UMD file.
#[derive(Error, Debug)]
pub enum UmdError {
    #[error("Unknown block tag 0x{tag:02X} at offset {offset}")]
    UnknownBlockTag { offset: usize, tag: u8 },

    #[error("Unsupported document type {kind} at offset {offset} (only text books are supported)")]
    UnsupportedDocumentType { offset: usize, kind: u8 },

    #[error("Truncated block at offset {offset}: declares {declared} bytes, {available} available")]
    TruncatedBlock {
        offset: usize,
        declared: usize,
        available: usize,
    },

    #[error("Block at offset {offset} declares length {length}, shorter than its {header}-byte header")]
    BlockTooShort {
        offset: usize,
        length: usize,
        header: usize,
    },

    #[error("Stream ended at offset {offset} without an end-of-document block")]
    MissingEndMarker { offset: usize },

    #[error("Function block {function_id} at offset {offset}: expected {expected} payload bytes, got {actual}")]
    MalformedPayload {
        offset: usize,
        function_id: u8,
        expected: usize,
        actual: usize,
    },

    #[error("Title table (data block {id}) truncated at offset {offset}")]
    TruncatedTitleTable { id: u32, offset: usize },

    #[error("Missing {role} data block {id}")]
    MissingReference { role: &'static str, id: u32 },

    #[error("No function block declares the {role}")]
    UndeclaredReference { role: &'static str },

    #[error("The {role} (data block {id}) is {len} bytes, not a multiple of 4")]
    InvalidTableLength {
        role: &'static str,
        id: u32,
        len: usize,
    },

    #[error("Chapter {chapter} out of range: {fault}")]
    ChapterOffsetOutOfRange {
        chapter: usize,
        fault: ChapterRangeFault,
    },

    #[error("Failed to inflate content chunk {id}: {source}")]
    DecompressionFailure {
        id: u32,
        #[source]
        source: std::io::Error,
    },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Why a chapter could not be sliced out of the content stream.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChapterRangeFault {
    /// More titles than offsets.
    MissingOffset { offsets: usize },
    /// More offsets than titles.
    ExtraOffsets { offsets: usize, titles: usize },
    /// `start..end` does not fit in the content.
    Span { start: u64, end: u64, len: usize },
}

impl fmt::Display for ChapterRangeFault {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::MissingOffset { offsets } => {
                write!(f, "offset table only has {} entries", offsets)
            }
            Self::ExtraOffsets { offsets, titles } => {
                write!(f, "{} offsets for {} titles", offsets, titles)
            }
            Self::Span { start, end, len } => {
                write!(f, "span {}..{} exceeds {} content bytes", start, end, len)
            }
        }
    }
}

/// Convenience alias used throughout the crate.
pub type Result<T> = std::result::Result<T, UmdError>;

/// Magic number at the start of every UMD file (`89 9B 9A DE`).
pub const UMD_MAGIC: [u8; 4] = [0x89, 0x9B, 0x9A, 0xDE];

/// Offset of the first block, right after the magic number.
pub const FIRST_BLOCK_OFFSET: usize = UMD_MAGIC.len();

/// Leading byte of a function block (`#`).
pub const FUNCTION_TAG: u8 = 0x23;

/// Leading byte of a data block (`$`).
pub const DATA_TAG: u8 = 0x24;

/// Function block header (5 bytes): tag, id, two flag bytes, length.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FunctionHeader {
    pub function_id: u8,
    pub flags: [u8; 2],
    /// Total block length, header included.
    pub length: u8,
}

impl FunctionHeader {
    pub const SIZE: usize = 5;

    /// Parse from at least [`Self::SIZE`] bytes starting at the tag.
    pub fn from_bytes(data: &[u8]) -> Self {
        Self {
            function_id: data[1],
            flags: [data[2], data[3]],
            length: data[4],
        }
    }

    pub fn payload_len(&self) -> usize {
        (self.length as usize).saturating_sub(Self::SIZE)
    }
}

/// Data block header (9 bytes): tag, u32 id, u32 length.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DataHeader {
    pub data_id: u32,
    /// Total block length, header included.
    pub length: u32,
}

impl DataHeader {
    pub const SIZE: usize = 9;

    /// Parse from at least [`Self::SIZE`] bytes starting at the tag.
    pub fn from_bytes(data: &[u8]) -> Self {
        Self {
            data_id: LittleEndian::read_u32(&data[1..5]),
            length: LittleEndian::read_u32(&data[5..9]),
        }
    }

    pub fn payload_len(&self) -> usize {
        (self.length as usize).saturating_sub(Self::SIZE)
    }
}
