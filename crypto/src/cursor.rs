/*++

Licensed under the Apache-2.0 license.

File Name:

    cursor.rs

Abstract:

    Bounds-checked byte cursor used by the binary codecs.

--*/

use vboot_error::{VbootError, VbootResult};
use zerocopy::FromBytes;

/// Forward-only reader over an untrusted byte buffer.
///
/// Every read is bounds checked; running off the end of the buffer is
/// reported as a truncated/overrun buffer rather than touching adjacent
/// bytes.
pub struct Cursor<'a> {
    buf: &'a [u8],
}

impl<'a> Cursor<'a> {
    pub fn new(buf: &'a [u8]) -> Self {
        Self { buf }
    }

    pub fn remaining(&self) -> usize {
        self.buf.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buf.is_empty()
    }

    /// Consume exactly `len` bytes.
    pub fn take(&mut self, len: usize) -> VbootResult<&'a [u8]> {
        if len > self.buf.len() {
            return Err(VbootError::IMAGE_TRUNCATED_OR_OVERRUN_BUFFER);
        }
        let (head, tail) = self.buf.split_at(len);
        self.buf = tail;
        Ok(head)
    }

    /// Read one native-byte-order value.
    pub fn read<T: FromBytes>(&mut self) -> VbootResult<T> {
        let bytes = self.take(core::mem::size_of::<T>())?;
        T::read_from(bytes).ok_or(VbootError::IMAGE_TRUNCATED_OR_OVERRUN_BUFFER)
    }
}
