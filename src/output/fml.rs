//! FML shelf output format.
//!
//! A small XML document holding one `<novel>` with its chapters as `<page>`
//! entries. Text is written as-is, without escaping.

use crate::book::UmdBook;
use std::io::{self, Write};
use std::path::Path;

/// Write the book as an FML shelf.
///
/// `source` is the path of the UMD file, recorded in the novel's `bookurl`.
pub fn write_fml<W: Write>(book: &UmdBook, source: &Path, mut writer: W) -> io::Result<()> {
    let url_path = source.to_string_lossy().replace('\\', "/");

    write!(writer, "<?xml version=\"1.0\" encoding=\"utf-8\"?>\n\n<shelf>\n\n")?;
    write!(writer, "<novel>\n\t<bookname>{}</bookname>\n", book.title())?;
    write!(
        writer,
        "\t<bookurl>file:///{}?date={}&type={}&pub={}&dist={}</bookurl>\n",
        url_path,
        book.date(),
        book.genre(),
        book.publisher(),
        book.distributor()
    )?;
    write!(
        writer,
        "\t<delurl></delurl>\n\t<statu>0</statu>\n\t<qidianBookID></qidianBookID>\n"
    )?;
    write!(writer, "\t<author>{}</author>\n<chapters>\n", book.author())?;

    for chapter in &book.chapters {
        write!(
            writer,
            "<page>\n\t<pagename>{}</pagename>\n\t<pageurl></pageurl>\n\t<content>{}</content>\n\t<size>{}</size>\n</page>\n",
            chapter.title,
            chapter.content,
            chapter.content.len()
        )?;
    }

    write!(writer, "</chapters>\n</novel>\n\n</shelf>\n")?;
    Ok(())
}

/// Write the book as an FML string.
pub fn to_fml_string(book: &UmdBook, source: &Path) -> io::Result<String> {
    let mut buf = Vec::new();
    write_fml(book, source, &mut buf)?;
    String::from_utf8(buf).map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))
}
