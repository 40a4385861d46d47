//! Decoded UMD book and the decode driver.

use super::metadata::{Metadata, MetadataCollector, Step};
use super::reassemble::Reassembler;
use crate::parser::{
    BlockScanner, DataStore, RawBlock, Result, UmdError, FIRST_BLOCK_OFFSET, UMD_MAGIC,
};
use log::{debug, warn};
use serde::Serialize;
use std::path::{Path, PathBuf};

/// File name suggested for an extracted cover.
pub const COVER_FILE_NAME: &str = "cover.jpg";

/// One chapter of decoded text.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct Chapter {
    pub title: String,
    pub content: String,
}

/// Embedded JPEG cover.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Cover {
    pub data: Vec<u8>,
    /// Where the cover should be written: next to the input when known.
    pub path: PathBuf,
}

impl Cover {
    /// Write the image to its suggested path.
    pub fn save(&self) -> std::io::Result<()> {
        std::fs::write(&self.path, &self.data)
    }
}

/// A fully decoded UMD text book.
#[derive(Debug, Clone, Serialize)]
pub struct UmdBook {
    #[serde(flatten)]
    pub metadata: Metadata,
    pub chapters: Vec<Chapter>,
    #[serde(skip)]
    pub cover: Option<Cover>,
}

impl UmdBook {
    /// Decode a whole UMD file held in memory.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        decode(bytes)
    }

    /// Read and decode a file. The cover, if any, is placed beside it.
    pub fn from_file(path: &Path) -> Result<Self> {
        let bytes = std::fs::read(path)?;
        let mut book = Self::from_bytes(&bytes)?;
        if let Some(cover) = book.cover.as_mut() {
            let dir = path.parent().unwrap_or_else(|| Path::new(""));
            cover.path = dir.join(COVER_FILE_NAME);
        }
        Ok(book)
    }

    pub fn title(&self) -> &str {
        &self.metadata.title
    }

    pub fn author(&self) -> &str {
        &self.metadata.author
    }

    pub fn date(&self) -> &str {
        &self.metadata.date
    }

    pub fn genre(&self) -> &str {
        &self.metadata.genre
    }

    pub fn publisher(&self) -> &str {
        &self.metadata.publisher
    }

    pub fn distributor(&self) -> &str {
        &self.metadata.distributor
    }

    pub fn chapter_count(&self) -> usize {
        self.chapters.len()
    }

    /// `(title, content)` of chapter `idx`.
    pub fn chapter_at(&self, idx: usize) -> Option<(&str, &str)> {
        self.chapters
            .get(idx)
            .map(|c| (c.title.as_str(), c.content.as_str()))
    }

    pub fn title_at(&self, idx: usize) -> Option<&str> {
        self.chapters.get(idx).map(|c| c.title.as_str())
    }

    pub fn content_at(&self, idx: usize) -> Option<&str> {
        self.chapters.get(idx).map(|c| c.content.as_str())
    }

    pub fn cover(&self) -> Option<&Cover> {
        self.cover.as_ref()
    }

    pub fn cover_path(&self) -> Option<&Path> {
        self.cover.as_ref().map(|c| c.path.as_path())
    }
}

/// Scan the block stream, then reassemble at the end-of-document block.
fn decode(bytes: &[u8]) -> Result<UmdBook> {
    match bytes.get(..UMD_MAGIC.len()) {
        Some(magic) if magic == UMD_MAGIC => {}
        Some(magic) => warn!("Unexpected magic number {:02X?}", magic),
        None => warn!("Input is only {} bytes", bytes.len()),
    }

    let mut collector = MetadataCollector::new();
    let mut store = DataStore::new();
    let mut scanner = BlockScanner::new(bytes, FIRST_BLOCK_OFFSET);

    for block in scanner.by_ref() {
        match block? {
            RawBlock::Function { offset, header, payload } => {
                debug!(
                    "Function block {} at offset {} ({} bytes)",
                    header.function_id, offset, header.length
                );
                if collector.apply(offset, header.function_id, payload)? == Step::End {
                    let (metadata, refs) = collector.finish();
                    let parts = Reassembler::new(&store, refs).run()?;
                    let cover = parts.cover.map(|data| Cover {
                        data,
                        path: PathBuf::from(COVER_FILE_NAME),
                    });
                    return Ok(UmdBook {
                        metadata,
                        chapters: parts.chapters,
                        cover,
                    });
                }
            }
            RawBlock::Data { offset, header, payload } => {
                debug!(
                    "Data block {} at offset {} ({} bytes)",
                    header.data_id, offset, header.length
                );
                store.put(header.data_id, payload);
            }
        }
    }

    match scanner.truncation() {
        Some(t) => Err(UmdError::TruncatedBlock {
            offset: t.offset,
            declared: t.declared,
            available: t.available,
        }),
        None => Err(UmdError::MissingEndMarker {
            offset: scanner.position(),
        }),
    }
}
