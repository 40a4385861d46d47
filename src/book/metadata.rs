//! Function block interpretation: book metadata and data block references.

use crate::parser::{decode_utf16le, read_u32, Result, UmdError};
use log::{debug, trace};
use serde::Serialize;

pub const DEFAULT_TITLE: &str = "书名";
pub const DEFAULT_AUTHOR: &str = "作者";
pub const DEFAULT_DATE: &str = "2000-00-00";
pub const DEFAULT_GENRE: &str = "类型";
pub const DEFAULT_PUBLISHER: &str = "出版商";
pub const DEFAULT_DISTRIBUTOR: &str = "零售商";

/// Document type carried by the header block for text books.
const TEXT_DOCUMENT: u8 = 1;

/// Cover format code for JPEG.
const COVER_JPEG: u8 = 1;

/// Function block identifiers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FunctionId {
    Header,
    Title,
    Author,
    Year,
    Month,
    Day,
    Genre,
    Publisher,
    Distributor,
    ContentId,
    ContentLength,
    EndOfDocument,
    ContentBlocks,
    Cover,
    ChapterOffsets,
    ChapterTitles,
    PageOffsets,
    CdsKey,
    LicenceKey,
    Unknown(u8),
}

impl From<u8> for FunctionId {
    fn from(value: u8) -> Self {
        match value {
            1 => FunctionId::Header,
            2 => FunctionId::Title,
            3 => FunctionId::Author,
            4 => FunctionId::Year,
            5 => FunctionId::Month,
            6 => FunctionId::Day,
            7 => FunctionId::Genre,
            8 => FunctionId::Publisher,
            9 => FunctionId::Distributor,
            10 => FunctionId::ContentId,
            11 => FunctionId::ContentLength,
            12 => FunctionId::EndOfDocument,
            129 => FunctionId::ContentBlocks,
            130 => FunctionId::Cover,
            131 => FunctionId::ChapterOffsets,
            132 => FunctionId::ChapterTitles,
            135 => FunctionId::PageOffsets,
            240 => FunctionId::CdsKey,
            241 => FunctionId::LicenceKey,
            other => FunctionId::Unknown(other),
        }
    }
}

/// Descriptive fields of a book.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct Metadata {
    pub title: String,
    pub author: String,
    /// `year-month-day` as stored, not validated.
    pub date: String,
    pub genre: String,
    pub publisher: String,
    pub distributor: String,
}

impl Default for Metadata {
    fn default() -> Self {
        Self {
            title: DEFAULT_TITLE.to_string(),
            author: DEFAULT_AUTHOR.to_string(),
            date: DEFAULT_DATE.to_string(),
            genre: DEFAULT_GENRE.to_string(),
            publisher: DEFAULT_PUBLISHER.to_string(),
            distributor: DEFAULT_DISTRIBUTOR.to_string(),
        }
    }
}

/// Data block ids recorded by function blocks, resolved once the stream ends.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct References {
    /// Block listing the ids of the compressed content chunks.
    pub content_blocks: Option<u32>,
    pub cover: Option<u32>,
    pub chapter_offsets: Option<u32>,
    pub chapter_titles: Option<u32>,
    /// Total length of the inflated content in bytes.
    pub content_length: Option<u32>,
}

/// What the scan loop should do after a function block.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Step {
    Continue,
    /// The end-of-document block was reached.
    End,
}

/// Accumulates metadata and references while the stream is scanned.
#[derive(Debug, Default)]
pub struct MetadataCollector {
    title: Option<String>,
    author: Option<String>,
    year: Option<String>,
    month: Option<String>,
    day: Option<String>,
    genre: Option<String>,
    publisher: Option<String>,
    distributor: Option<String>,
    refs: References,
}

impl MetadataCollector {
    pub fn new() -> Self {
        Self::default()
    }

    /// Interpret one function block payload.
    pub fn apply(&mut self, offset: usize, function_id: u8, payload: &[u8]) -> Result<Step> {
        trace!("Function {} payload: {:02X?}", function_id, payload);

        match FunctionId::from(function_id) {
            FunctionId::Header => {
                let kind = *payload.first().ok_or(UmdError::MalformedPayload {
                    offset,
                    function_id,
                    expected: 1,
                    actual: 0,
                })?;
                if kind != TEXT_DOCUMENT {
                    return Err(UmdError::UnsupportedDocumentType { offset, kind });
                }
                debug!("Text document header");
            }
            FunctionId::Title => self.title = Some(text_field("title", payload)),
            FunctionId::Author => self.author = Some(text_field("author", payload)),
            FunctionId::Year => self.year = Some(text_field("year", payload)),
            FunctionId::Month => self.month = Some(text_field("month", payload)),
            FunctionId::Day => self.day = Some(text_field("day", payload)),
            FunctionId::Genre => self.genre = Some(text_field("genre", payload)),
            FunctionId::Publisher => self.publisher = Some(text_field("publisher", payload)),
            FunctionId::Distributor => {
                self.distributor = Some(text_field("distributor", payload))
            }
            FunctionId::ContentLength => {
                let len = u32_field(offset, function_id, payload)?;
                debug!("Content length: {} bytes", len);
                self.refs.content_length = Some(len);
            }
            FunctionId::ContentBlocks => {
                let id = u32_field(offset, function_id, payload)?;
                debug!("Content block list: data block {}", id);
                self.refs.content_blocks = Some(id);
            }
            FunctionId::Cover => {
                let format = *payload.first().ok_or(UmdError::MalformedPayload {
                    offset,
                    function_id,
                    expected: 5,
                    actual: 0,
                })?;
                if format == COVER_JPEG {
                    let id = u32_field(offset, function_id, &payload[1..])?;
                    debug!("JPEG cover: data block {}", id);
                    self.refs.cover = Some(id);
                } else {
                    debug!("Cover format {} not supported, skipping", format);
                }
            }
            FunctionId::ChapterOffsets => {
                let id = u32_field(offset, function_id, payload)?;
                debug!("Chapter offsets: data block {}", id);
                self.refs.chapter_offsets = Some(id);
            }
            FunctionId::ChapterTitles => {
                let id = u32_field(offset, function_id, payload)?;
                debug!("Chapter titles: data block {}", id);
                self.refs.chapter_titles = Some(id);
            }
            FunctionId::EndOfDocument => {
                match read_u32(payload) {
                    Some(file_len) => debug!("End of document, declared file length {}", file_len),
                    None => debug!("End of document"),
                }
                return Ok(Step::End);
            }
            FunctionId::ContentId
            | FunctionId::PageOffsets
            | FunctionId::CdsKey
            | FunctionId::LicenceKey => {
                debug!("Skipping function {}", function_id);
            }
            FunctionId::Unknown(id) => {
                debug!("Ignoring unknown function {} at offset {}", id, offset);
            }
        }

        Ok(Step::Continue)
    }

    /// Settle defaults and hand over the collected values.
    pub fn finish(self) -> (Metadata, References) {
        let defaults = Metadata::default();
        let date = if self.year.is_none() && self.month.is_none() && self.day.is_none() {
            defaults.date
        } else {
            format!(
                "{}-{}-{}",
                self.year.unwrap_or_default(),
                self.month.unwrap_or_default(),
                self.day.unwrap_or_default()
            )
        };

        let metadata = Metadata {
            title: self.title.unwrap_or(defaults.title),
            author: self.author.unwrap_or(defaults.author),
            date,
            genre: self.genre.unwrap_or(defaults.genre),
            publisher: self.publisher.unwrap_or(defaults.publisher),
            distributor: self.distributor.unwrap_or(defaults.distributor),
        };
        (metadata, self.refs)
    }
}

fn text_field(name: &str, payload: &[u8]) -> String {
    let value = decode_utf16le(payload);
    debug!("{}: {}", name, value);
    value
}

fn u32_field(offset: usize, function_id: u8, payload: &[u8]) -> Result<u32> {
    read_u32(payload).ok_or(UmdError::MalformedPayload {
        offset,
        function_id,
        expected: 4,
        actual: payload.len(),
    })
}
