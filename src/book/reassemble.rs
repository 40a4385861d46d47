//! Resolution of recorded references into chapters and a cover.
//!
//! Runs once, after the end-of-document block. Content chunks are inflated
//! in the order their data blocks appear in the file, keeping only the ids
//! named by the content block list; the order of the list itself is not used.

use super::document::Chapter;
use super::metadata::References;
use crate::parser::{
    decode_utf16le, inflate, read_u32_table, repair_newlines, ChapterRangeFault, DataStore,
    Result, UmdError,
};
use log::{debug, warn};
use std::collections::HashSet;

/// Chapters and cover recovered from the data blocks.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Reassembled {
    pub chapters: Vec<Chapter>,
    pub cover: Option<Vec<u8>>,
}

/// Resolves [`References`] against a filled [`DataStore`].
pub struct Reassembler<'s, 'a> {
    store: &'s DataStore<'a>,
    refs: References,
}

impl<'s, 'a> Reassembler<'s, 'a> {
    pub fn new(store: &'s DataStore<'a>, refs: References) -> Self {
        Self { store, refs }
    }

    pub fn run(&self) -> Result<Reassembled> {
        let (offsets_id, offsets_data) = self.resolve("chapter offset table", self.refs.chapter_offsets)?;
        let offsets = read_u32_table("chapter offset table", offsets_id, offsets_data)?;
        debug!("{} chapter offsets: {:?}", offsets.len(), offsets);

        let (titles_id, titles_data) = self.resolve("chapter title table", self.refs.chapter_titles)?;
        let titles = parse_title_table(titles_id, titles_data)?;
        debug!("{} chapter titles", titles.len());

        let content = self.content()?;

        let cover = match self.refs.cover {
            Some(id) => Some(self.lookup("cover image", id)?.to_vec()),
            None => None,
        };

        let chapters = slice_chapters(&content, &offsets, titles, self.refs.content_length)?;
        Ok(Reassembled { chapters, cover })
    }

    /// Inflate, concatenate and repair the content chunks.
    fn content(&self) -> Result<Vec<u8>> {
        let (list_id, list_data) = self.resolve("content block list", self.refs.content_blocks)?;
        let listed = read_u32_table("content block list", list_id, list_data)?;

        let mut content = Vec::new();
        for id in content_order(self.store.appearance_order(), &listed) {
            // Every id in appearance order has been stored.
            let Some(chunk) = self.store.get(id) else {
                continue;
            };
            content.extend_from_slice(&inflate(id, chunk)?);
        }

        let repaired = repair_newlines(&mut content);
        debug!(
            "Content: {} bytes from {} listed chunks, {} newlines repaired",
            content.len(),
            listed.len(),
            repaired
        );
        if let Some(expected) = self.refs.content_length {
            if expected as usize != content.len() {
                warn!(
                    "Content is {} bytes, header declares {}",
                    content.len(),
                    expected
                );
            }
        }
        Ok(content)
    }

    fn resolve(&self, role: &'static str, id: Option<u32>) -> Result<(u32, &'a [u8])> {
        let id = id.ok_or(UmdError::UndeclaredReference { role })?;
        Ok((id, self.lookup(role, id)?))
    }

    fn lookup(&self, role: &'static str, id: u32) -> Result<&'a [u8]> {
        self.store
            .get(id)
            .ok_or(UmdError::MissingReference { role, id })
    }
}

/// Content chunk ids in the order they are concatenated: appearance order,
/// filtered to the ids named by the content block list. Repeated
/// appearances are kept.
pub fn content_order(appearance: &[u32], listed: &[u32]) -> Vec<u32> {
    let members: HashSet<u32> = listed.iter().copied().collect();
    appearance
        .iter()
        .copied()
        .filter(|id| members.contains(id))
        .collect()
}

/// Parse a title table: repeated `len: u8` followed by `len` UTF-16LE bytes.
pub fn parse_title_table(id: u32, data: &[u8]) -> Result<Vec<String>> {
    let mut titles = Vec::new();
    let mut pos = 0;

    while pos < data.len() {
        let len = data[pos] as usize;
        let start = pos + 1;
        let end = start + len;
        if end > data.len() {
            return Err(UmdError::TruncatedTitleTable { id, offset: pos });
        }
        titles.push(decode_utf16le(&data[start..end]));
        pos = end;
    }

    Ok(titles)
}

/// Cut the content into one chapter per title.
///
/// Chapter `i` spans `offsets[i]..offsets[i + 1]`; the last one ends at
/// `content_length`, or at the end of the content when no length was given.
pub fn slice_chapters(
    content: &[u8],
    offsets: &[u32],
    titles: Vec<String>,
    content_length: Option<u32>,
) -> Result<Vec<Chapter>> {
    if offsets.len() < titles.len() {
        return Err(UmdError::ChapterOffsetOutOfRange {
            chapter: offsets.len(),
            fault: ChapterRangeFault::MissingOffset {
                offsets: offsets.len(),
            },
        });
    }
    if offsets.len() > titles.len() {
        return Err(UmdError::ChapterOffsetOutOfRange {
            chapter: titles.len(),
            fault: ChapterRangeFault::ExtraOffsets {
                offsets: offsets.len(),
                titles: titles.len(),
            },
        });
    }

    let last_end = content_length.map_or(content.len() as u64, u64::from);
    let mut chapters = Vec::with_capacity(titles.len());

    for (i, title) in titles.into_iter().enumerate() {
        let start = u64::from(offsets[i]);
        let end = offsets.get(i + 1).map_or(last_end, |&next| u64::from(next));
        if start > end || end > content.len() as u64 {
            return Err(UmdError::ChapterOffsetOutOfRange {
                chapter: i,
                fault: ChapterRangeFault::Span {
                    start,
                    end,
                    len: content.len(),
                },
            });
        }

        let content = decode_utf16le(&content[start as usize..end as usize]);
        chapters.push(Chapter { title, content });
    }

    Ok(chapters)
}
