//! Pooled byte buffers for object data and content streams.
//!
//! Every indirect object borrows buffers from the writer's pool while it
//! is open and returns them, reset, when it is released. Ownership is
//! transferred on checkout: a buffer belongs to exactly one object at a
//! time, and the pool only ever holds buffers that have been reset.

use crate::error::Result;
use crate::filters::{apply_chain, FilterKind};

/// A growable byte buffer with an optional filter chain.
///
/// Filters are applied once, on first access to the filtered bytes, and
/// the result is cached until the buffer is reset. A chain that achieves
/// no reduction leaves the raw bytes in place.
#[derive(Debug, Default)]
pub struct Buffer {
    bytes: Vec<u8>,
    filters: Vec<FilterKind>,
    filtered: Option<Option<Vec<u8>>>,
}

impl Buffer {
    /// Create an empty buffer with no filters.
    pub fn new() -> Self {
        Self::default()
    }

    /// Raw (unfiltered) length in bytes.
    pub fn len(&self) -> u64 {
        self.bytes.len() as u64
    }

    /// True when no bytes have been written.
    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    /// Append raw bytes.
    pub fn write(&mut self, data: &[u8]) {
        debug_assert!(self.filtered.is_none(), "write after filter application");
        self.bytes.extend_from_slice(data);
    }

    /// Append a text token. PDF token text is latin-1 compatible by
    /// construction; callers encode string values before they get here.
    pub fn write_str(&mut self, text: &str) {
        for ch in text.chars() {
            debug_assert!((ch as u32) < 256, "token text must stay single-byte");
            self.bytes.push(ch as u8);
        }
    }

    /// Replace the filter chain, discarding any cached filtered output.
    pub fn set_filters(&mut self, filters: &[FilterKind]) {
        self.filters = filters.to_vec();
        self.filtered = None;
    }

    /// True when a filter chain is attached.
    pub fn has_filters(&self) -> bool {
        !self.filters.is_empty()
    }

    /// Apply the filter chain if it has not run yet.
    fn ensure_filtered(&mut self) -> Result<()> {
        if self.filtered.is_none() {
            self.filtered = Some(if self.filters.is_empty() {
                None
            } else {
                apply_chain(&self.filters, &self.bytes)?
            });
        }
        Ok(())
    }

    /// Bytes that should reach the file: the filtered output, or the raw
    /// bytes when there are no filters or the chain declined to reduce.
    pub fn output_bytes(&mut self) -> Result<&[u8]> {
        self.ensure_filtered()?;
        Ok(match self.filtered.as_ref().expect("just ensured") {
            Some(filtered) => filtered,
            None => &self.bytes,
        })
    }

    /// Length of [`Buffer::output_bytes`].
    pub fn output_len(&mut self) -> Result<u64> {
        Ok(self.output_bytes()?.len() as u64)
    }

    /// Filters that were actually applied — empty when the chain fell
    /// back to the raw bytes, so no /Filter entry should be written.
    pub fn applied_filters(&mut self) -> Result<&[FilterKind]> {
        self.ensure_filtered()?;
        Ok(match self.filtered.as_ref().expect("just ensured") {
            Some(_) => &self.filters,
            None => &[],
        })
    }

    /// Clear contents, filters, and cache, keeping the allocation.
    pub fn reset(&mut self) {
        self.bytes.clear();
        self.filters.clear();
        self.filtered = None;
    }
}

/// Pool of reusable buffers.
///
/// The in-use side of the pool is implicit: checked-out buffers are owned
/// by their indirect object until recycled. The pool tracks the count so
/// release imbalances surface in tests.
#[derive(Debug, Default)]
pub struct BufferPool {
    available: Vec<Buffer>,
    checked_out: usize,
}

impl BufferPool {
    /// Create an empty pool.
    pub fn new() -> Self {
        Self::default()
    }

    /// Take a reset buffer from the pool, allocating if none is free.
    pub fn checkout(&mut self) -> Buffer {
        self.checked_out += 1;
        self.available.pop().unwrap_or_default()
    }

    /// Return a buffer to the pool, resetting it first.
    pub fn recycle(&mut self, mut buffer: Buffer) {
        debug_assert!(self.checked_out > 0, "recycle without checkout");
        self.checked_out = self.checked_out.saturating_sub(1);
        buffer.reset();
        self.available.push(buffer);
    }

    /// Number of buffers currently owned by open objects.
    pub fn in_use(&self) -> usize {
        self.checked_out
    }

    /// Number of reset buffers ready for checkout.
    pub fn available(&self) -> usize {
        self.available.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_write_and_len() {
        let mut buf = Buffer::new();
        buf.write_str("<< /Type /Catalog >>");
        assert_eq!(buf.len(), 20);
        assert!(!buf.is_empty());
    }

    #[test]
    fn test_output_without_filters_is_raw() {
        let mut buf = Buffer::new();
        buf.write(b"raw stream data");
        assert_eq!(buf.output_bytes().unwrap(), b"raw stream data");
        assert!(buf.applied_filters().unwrap().is_empty());
    }

    #[test]
    fn test_filter_fallback_keeps_raw_bytes() {
        let mut buf = Buffer::new();
        buf.write(b"xy");
        buf.set_filters(&[FilterKind::Flate]);
        // Two bytes cannot shrink under zlib, so the chain declines
        assert_eq!(buf.output_bytes().unwrap(), b"xy");
        assert!(buf.applied_filters().unwrap().is_empty());
    }

    #[test]
    fn test_filter_applied_when_it_reduces() {
        let mut buf = Buffer::new();
        buf.write(&vec![b'Z'; 2048]);
        buf.set_filters(&[FilterKind::Flate]);
        assert!(buf.output_len().unwrap() < 2048);
        assert_eq!(buf.applied_filters().unwrap(), &[FilterKind::Flate][..]);
    }

    #[test]
    fn test_reset_clears_everything() {
        let mut buf = Buffer::new();
        buf.write(b"data");
        buf.set_filters(&[FilterKind::AsciiHex]);
        buf.reset();
        assert!(buf.is_empty());
        assert!(!buf.has_filters());
        assert_eq!(buf.output_bytes().unwrap(), b"");
    }

    #[test]
    fn test_pool_checkout_recycle_balance() {
        let mut pool = BufferPool::new();
        let mut a = pool.checkout();
        let b = pool.checkout();
        assert_eq!(pool.in_use(), 2);

        a.write(b"contents");
        pool.recycle(a);
        pool.recycle(b);
        assert_eq!(pool.in_use(), 0);
        assert_eq!(pool.available(), 2);

        // Recycled buffers come back reset
        let again = pool.checkout();
        assert!(again.is_empty());
    }
}
