//! UMD Converter Library
//!
//! Decodes UMD ebook containers into a book model and writes it out as
//! plain text, FML or JSON.

pub mod book;
pub mod output;
pub mod parser;

pub use book::{Chapter, Cover, Metadata, UmdBook};
pub use parser::{Result, UmdError};
