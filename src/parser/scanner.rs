//! Block scanner: walks the tagged block stream after the magic number.

use super::header::{DataHeader, FunctionHeader, Result, UmdError, DATA_TAG, FUNCTION_TAG};
use log::trace;

/// One block of the stream, borrowing its payload from the input buffer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RawBlock<'a> {
    Function {
        offset: usize,
        header: FunctionHeader,
        payload: &'a [u8],
    },
    Data {
        offset: usize,
        header: DataHeader,
        payload: &'a [u8],
    },
}

impl RawBlock<'_> {
    /// Byte offset of the block's tag in the input.
    pub fn offset(&self) -> usize {
        match self {
            RawBlock::Function { offset, .. } | RawBlock::Data { offset, .. } => *offset,
        }
    }
}

/// Where the stream stopped because a block did not fit in the buffer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Truncation {
    pub offset: usize,
    pub declared: usize,
    pub available: usize,
}

/// Iterator over the blocks of a UMD buffer.
///
/// A block whose declared length runs past the end of the buffer ends the
/// iteration without an error; [`BlockScanner::truncation`] reports it.
/// Unknown tags and impossible lengths yield one error and then stop.
pub struct BlockScanner<'a> {
    data: &'a [u8],
    cursor: usize,
    truncation: Option<Truncation>,
    done: bool,
}

impl<'a> BlockScanner<'a> {
    pub fn new(data: &'a [u8], start: usize) -> Self {
        Self {
            data,
            cursor: start,
            truncation: None,
            done: false,
        }
    }

    /// Offset of the next unread byte.
    pub fn position(&self) -> usize {
        self.cursor
    }

    pub fn truncation(&self) -> Option<Truncation> {
        self.truncation
    }

    fn stop_truncated(&mut self, declared: usize, available: usize) -> Option<Result<RawBlock<'a>>> {
        trace!(
            "Block at offset {} declares {} bytes, only {} left; end of stream",
            self.cursor,
            declared,
            available
        );
        self.truncation = Some(Truncation {
            offset: self.cursor,
            declared,
            available,
        });
        self.done = true;
        None
    }

    fn fail(&mut self, err: UmdError) -> Option<Result<RawBlock<'a>>> {
        self.done = true;
        Some(Err(err))
    }
}

impl<'a> Iterator for BlockScanner<'a> {
    type Item = Result<RawBlock<'a>>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }

        let offset = self.cursor;
        let remaining = self.data.get(offset..).unwrap_or_default();
        let Some(&tag) = remaining.first() else {
            self.done = true;
            return None;
        };

        match tag {
            FUNCTION_TAG => {
                if remaining.len() < FunctionHeader::SIZE {
                    return self.stop_truncated(FunctionHeader::SIZE, remaining.len());
                }
                let header = FunctionHeader::from_bytes(remaining);
                let length = header.length as usize;
                if length < FunctionHeader::SIZE {
                    return self.fail(UmdError::BlockTooShort {
                        offset,
                        length,
                        header: FunctionHeader::SIZE,
                    });
                }
                if length > remaining.len() {
                    return self.stop_truncated(length, remaining.len());
                }

                self.cursor += length;
                Some(Ok(RawBlock::Function {
                    offset,
                    header,
                    payload: &remaining[FunctionHeader::SIZE..length],
                }))
            }
            DATA_TAG => {
                if remaining.len() < DataHeader::SIZE {
                    return self.stop_truncated(DataHeader::SIZE, remaining.len());
                }
                let header = DataHeader::from_bytes(remaining);
                let length = header.length as usize;
                if length < DataHeader::SIZE {
                    return self.fail(UmdError::BlockTooShort {
                        offset,
                        length,
                        header: DataHeader::SIZE,
                    });
                }
                if length > remaining.len() {
                    return self.stop_truncated(length, remaining.len());
                }

                self.cursor += length;
                Some(Ok(RawBlock::Data {
                    offset,
                    header,
                    payload: &remaining[DataHeader::SIZE..length],
                }))
            }
            _ => self.fail(UmdError::UnknownBlockTag { offset, tag }),
        }
    }
}
