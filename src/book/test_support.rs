//! Builders for synthetic UMD streams used by the unit tests.

use crate::parser::{DATA_TAG, FUNCTION_TAG, UMD_MAGIC};
use flate2::write::ZlibEncoder;
use flate2::Compression;
use std::io::Write;

/// First id handed out to content chunks and tables by [`UmdBuilder::chapters`].
const FIRST_GENERATED_ID: u32 = 0x3000;

pub(crate) fn utf16(text: &str) -> Vec<u8> {
    text.encode_utf16().flat_map(u16::to_le_bytes).collect()
}

pub(crate) fn title_table(titles: &[&str]) -> Vec<u8> {
    let mut out = Vec::new();
    for title in titles {
        let bytes = utf16(title);
        out.push(bytes.len() as u8);
        out.extend(bytes);
    }
    out
}

pub(crate) fn zlib(data: &[u8]) -> Vec<u8> {
    let mut encoder = ZlibEncoder::new(Vec::new(), Compression::default());
    encoder.write_all(data).unwrap();
    encoder.finish().unwrap()
}

/// Appends blocks to an in-memory UMD file.
pub(crate) struct UmdBuilder {
    bytes: Vec<u8>,
    next_id: u32,
    shuffle_seed: Option<u64>,
}

impl UmdBuilder {
    pub fn new() -> Self {
        Self {
            bytes: UMD_MAGIC.to_vec(),
            next_id: FIRST_GENERATED_ID,
            shuffle_seed: None,
        }
    }

    pub fn title_table(titles: &[&str]) -> Vec<u8> {
        title_table(titles)
    }

    pub fn function(mut self, id: u8, payload: &[u8]) -> Self {
        let length = 5 + payload.len();
        assert!(length <= u8::MAX as usize, "function payload too long");
        self.bytes
            .extend_from_slice(&[FUNCTION_TAG, id, 0, 0, length as u8]);
        self.bytes.extend_from_slice(payload);
        self
    }

    /// Text document header.
    pub fn header(self) -> Self {
        self.function(1, &[1, 0, 0])
    }

    pub fn text(self, id: u8, value: &str) -> Self {
        self.function(id, &utf16(value))
    }

    pub fn reference(self, id: u8, value: u32) -> Self {
        self.function(id, &value.to_le_bytes())
    }

    pub fn data(mut self, id: u32, payload: &[u8]) -> Self {
        let length = (9 + payload.len()) as u32;
        self.bytes.push(DATA_TAG);
        self.bytes.extend_from_slice(&id.to_le_bytes());
        self.bytes.extend_from_slice(&length.to_le_bytes());
        self.bytes.extend_from_slice(payload);
        self
    }

    /// Compressed content chunk.
    pub fn chunk(self, id: u32, raw: &[u8]) -> Self {
        self.data(id, &zlib(raw))
    }

    pub fn cover(self, id: u32, image: &[u8]) -> Self {
        let mut payload = vec![1];
        payload.extend_from_slice(&id.to_le_bytes());
        self.data(id, image).function(130, &payload)
    }

    /// Store the content block list of the next [`Self::chapters`] call in a
    /// scrambled order.
    pub fn shuffle_content_list(mut self, seed: u64) -> Self {
        self.shuffle_seed = Some(seed);
        self
    }

    /// Emit compressed chunks, the content block list, offset and title
    /// tables and the content length for the given chapters.
    ///
    /// The text is cut into chunks of `chunk_units[i % len]` UTF-16 units.
    pub fn chapters(mut self, chapters: &[(&str, &str)], chunk_units: &[usize]) -> Self {
        let mut text = Vec::new();
        let mut offsets = Vec::new();
        for (_, content) in chapters {
            offsets.extend_from_slice(&(text.len() as u32).to_le_bytes());
            text.extend(utf16(content));
        }

        let mut chunk_ids = Vec::new();
        let mut rest = text.as_slice();
        let mut i = 0;
        while !rest.is_empty() {
            let take = (chunk_units[i % chunk_units.len()].max(1) * 2).min(rest.len());
            let id = self.alloc_id();
            self = self.chunk(id, &rest[..take]);
            chunk_ids.push(id);
            rest = &rest[take..];
            i += 1;
        }

        if let Some(seed) = self.shuffle_seed {
            shuffle(&mut chunk_ids, seed);
        }
        let list: Vec<u8> = chunk_ids.iter().flat_map(|id| id.to_le_bytes()).collect();
        let titles: Vec<&str> = chapters.iter().map(|(title, _)| *title).collect();

        let list_id = self.alloc_id();
        let offsets_id = self.alloc_id();
        let titles_id = self.alloc_id();
        let total = text.len() as u32;
        self.reference(129, list_id)
            .data(list_id, &list)
            .reference(131, offsets_id)
            .data(offsets_id, &offsets)
            .reference(132, titles_id)
            .data(titles_id, &title_table(&titles))
            .reference(11, total)
    }

    /// End-of-document block carrying the final file length.
    pub fn end(self) -> Self {
        let total = (self.bytes.len() + 9) as u32;
        self.reference(12, total)
    }

    pub fn build(self) -> Vec<u8> {
        self.bytes
    }

    fn alloc_id(&mut self) -> u32 {
        let id = self.next_id;
        self.next_id += 1;
        id
    }
}

/// Fisher-Yates driven by xorshift64.
fn shuffle(ids: &mut [u32], seed: u64) {
    let mut state = seed | 1;
    for i in (1..ids.len()).rev() {
        state ^= state << 13;
        state ^= state >> 7;
        state ^= state << 17;
        ids.swap(i, (state % (i as u64 + 1)) as usize);
    }
}

/// The single-chapter book used across the decode tests.
pub(crate) fn scenario_stream() -> Vec<u8> {
    UmdBuilder::new()
        .header()
        .text(2, "测试")
        .text(3, "狐")
        .text(4, "2021")
        .text(5, "01")
        .text(6, "01")
        .chapters(&[("第一章", "第一章\n正文")], &[64])
        .end()
        .build()
}
