//! Decoded book model: metadata collection, reassembly and the document.

mod document;
mod metadata;
mod reassemble;

#[cfg(test)]
pub(crate) mod test_support;

pub use document::*;
pub use metadata::*;
pub use reassemble::*;
