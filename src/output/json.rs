//! JSON output format.

use crate::book::UmdBook;
use serde::Serialize;
use std::io::Write;

/// Cover summary; the image bytes themselves are not embedded.
#[derive(Serialize)]
pub struct JsonCover<'a> {
    pub path: &'a std::path::Path,
    pub size: usize,
}

/// JSON view of a book with a few derived counts.
#[derive(Serialize)]
pub struct JsonOutput<'a> {
    #[serde(flatten)]
    pub book: &'a UmdBook,
    pub chapter_count: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cover_image: Option<JsonCover<'a>>,
    pub source_format: &'static str,
}

impl<'a> JsonOutput<'a> {
    pub fn new(book: &'a UmdBook) -> Self {
        Self {
            book,
            chapter_count: book.chapter_count(),
            cover_image: book.cover().map(|c| JsonCover {
                path: &c.path,
                size: c.data.len(),
            }),
            source_format: "umd_text",
        }
    }
}

/// Write the book as JSON to a writer.
pub fn write_json<W: Write>(book: &UmdBook, writer: W, pretty: bool) -> Result<(), serde_json::Error> {
    let output = JsonOutput::new(book);
    if pretty {
        serde_json::to_writer_pretty(writer, &output)
    } else {
        serde_json::to_writer(writer, &output)
    }
}

/// Write the book as a JSON string.
pub fn to_json_string(book: &UmdBook, pretty: bool) -> Result<String, serde_json::Error> {
    let output = JsonOutput::new(book);
    if pretty {
        serde_json::to_string_pretty(&output)
    } else {
        serde_json::to_string(&output)
    }
}
