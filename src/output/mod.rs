//! Output format writers.

mod fml;
mod json;
mod text;

pub use self::fml::*;
pub use self::json::*;
pub use self::text::*;
