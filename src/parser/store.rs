//! Data block storage keyed by block id.

use std::collections::HashMap;

/// Payloads of every data block seen so far, plus the order the ids appeared in.
///
/// A repeated id overwrites the stored payload but is recorded again in the
/// appearance order.
#[derive(Debug, Default)]
pub struct DataStore<'a> {
    blocks: HashMap<u32, &'a [u8]>,
    order: Vec<u32>,
}

impl<'a> DataStore<'a> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn put(&mut self, id: u32, payload: &'a [u8]) {
        self.blocks.insert(id, payload);
        self.order.push(id);
    }

    pub fn get(&self, id: u32) -> Option<&'a [u8]> {
        self.blocks.get(&id).copied()
    }

    /// Ids in file order, repeats included.
    pub fn appearance_order(&self) -> &[u32] {
        &self.order
    }

    pub fn len(&self) -> usize {
        self.blocks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.blocks.is_empty()
    }
}
