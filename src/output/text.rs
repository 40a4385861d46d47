//! Plain text output format.

use crate::book::UmdBook;
use std::io::{self, Write};

/// Write the book as plain text.
///
/// Format:
/// ```text
/// 书名: <title>
/// 作者: <author>
/// 日期: <date>
/// 类型: <genre>
/// 出版: <publisher>
/// 零售: <distributor>
///
///
///
/// ## <chapter title>
///
/// <chapter content>
///
/// ```
pub fn write_text<W: Write>(book: &UmdBook, mut writer: W) -> io::Result<()> {
    writeln!(writer, "书名: {}", book.title())?;
    writeln!(writer, "作者: {}", book.author())?;
    writeln!(writer, "日期: {}", book.date())?;
    writeln!(writer, "类型: {}", book.genre())?;
    writeln!(writer, "出版: {}", book.publisher())?;
    writeln!(writer, "零售: {}", book.distributor())?;
    writeln!(writer)?;
    writeln!(writer)?;

    for chapter in &book.chapters {
        write!(writer, "\n## {}\n\n{}\n\n", chapter.title, chapter.content)?;
    }

    Ok(())
}

/// Write the book as a plain text string.
pub fn to_text_string(book: &UmdBook) -> io::Result<String> {
    let mut buf = Vec::new();
    write_text(book, &mut buf)?;
    String::from_utf8(buf).map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))
}
