//! Binary parser for the UMD block stream.

mod codec;
mod header;
mod scanner;
mod store;

pub use codec::*;
pub use header::*;
pub use scanner::*;
pub use store::*;
