// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

use std::io::{self, SeekFrom};

use tracing::{Level, event};

use crate::mem::{ArrayProvider, HeapPages, PAGE_SIZE, PagedArray};
use crate::{Error, FrozenBytes, MAX_POSITION, PagedBytes, Result};

/// An append-oriented byte sink backed by fixed-size pages.
///
/// Bytes are written at a cursor that starts at zero. Writing past the end of the backing
/// storage acquires more pages from the sink's [`ArrayProvider`], so growing never copies bytes
/// that were already written. The written bytes are `[0, position())`.
///
/// The cursor can be moved with [`seek()`][Self::seek] and [`skip()`][Self::skip]. Moving the
/// cursor forward grows the storage but does not clear it - bytes in the gap hold whatever the
/// pages contained before.
///
/// # Reuse
///
/// A sink can be [`reset()`][Self::reset] and written again. Resetting keeps one page of
/// backing storage, so a reused sink does not need to go to the provider for short payloads.
/// Combine with a [`BoundedRecycler`][crate::recycler::BoundedRecycler] to reuse sinks across
/// tasks, or with [`RecyclingPages`][crate::mem::RecyclingPages] to reuse individual pages.
///
/// # Example
///
/// ```
/// use recyclebuf::PagedByteSink;
///
/// let mut sink = PagedByteSink::new();
/// sink.write_byte(b'[');
/// sink.write_bytes(b"--payload--", 2, 7)?;
/// sink.write_byte(b']');
///
/// assert_eq!(sink.size(), 9);
/// assert_eq!(sink.bytes(), b"[payload]");
/// # Ok::<(), recyclebuf::Error>(())
/// ```
#[derive(Debug)]
pub struct PagedByteSink<P: ArrayProvider = HeapPages> {
    provider: P,
    pages: PagedArray,
    cursor: usize,
}

impl PagedByteSink {
    /// Creates an empty sink backed by heap pages, with one page of storage.
    #[must_use]
    pub fn new() -> Self {
        Self::with_provider(HeapPages)
    }

    /// Creates an empty sink backed by heap pages, with room for at least `expected` bytes.
    #[must_use]
    pub fn with_capacity(expected: usize) -> Self {
        Self::with_capacity_in(expected, HeapPages)
    }
}

impl<P: ArrayProvider> PagedByteSink<P> {
    /// Creates an empty sink that acquires its pages from `provider`, starting with one page.
    #[must_use]
    pub fn with_provider(provider: P) -> Self {
        Self::with_capacity_in(PAGE_SIZE, provider)
    }

    /// Creates an empty sink that acquires its pages from `provider`, with room for at least
    /// `expected` bytes.
    #[must_use]
    pub fn with_capacity_in(expected: usize, provider: P) -> Self {
        let pages = provider.allocate(expected);

        Self {
            provider,
            pages,
            cursor: 0,
        }
    }

    /// Writes one byte at the cursor and advances the cursor by one.
    pub fn write_byte(&mut self, byte: u8) {
        let end = self.cursor + 1;
        self.ensure_capacity(end);

        self.pages.set(self.cursor, byte);
        self.cursor = end;
    }

    /// Writes `len` bytes of `src`, starting at `offset`, and advances the cursor by `len`.
    ///
    /// Writing zero bytes does nothing, regardless of `offset`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidRange`] if `offset + len` is beyond the end of `src`. The sink is
    /// not modified in that case.
    pub fn write_bytes(&mut self, src: &[u8], offset: usize, len: usize) -> Result<()> {
        if len == 0 {
            return Ok(());
        }

        let range = offset
            .checked_add(len)
            .and_then(|end| src.get(offset..end))
            .ok_or(Error::InvalidRange {
                offset,
                len,
                source_len: src.len(),
            })?;

        self.write_slice(range);
        Ok(())
    }

    /// Writes all of `src` at the cursor and advances the cursor by `src.len()`.
    pub fn write_slice(&mut self, src: &[u8]) {
        if src.is_empty() {
            return;
        }

        let end = self.cursor + src.len();
        self.ensure_capacity(end);

        self.pages.set_slice(self.cursor, src);
        self.cursor = end;
    }

    /// The current cursor position.
    #[must_use]
    pub fn position(&self) -> usize {
        self.cursor
    }

    /// Number of bytes written, which is the same as [`position()`][Self::position].
    ///
    /// Seeking backward therefore makes bytes after the new position no longer count as
    /// written.
    #[must_use]
    pub fn size(&self) -> usize {
        self.cursor
    }

    /// Capacity of the backing storage in bytes. Always a whole number of pages.
    #[must_use]
    pub fn capacity(&self) -> usize {
        self.pages.capacity()
    }

    /// The provider the sink acquires its pages from.
    #[must_use]
    pub fn provider(&self) -> &P {
        &self.provider
    }

    /// Moves the cursor to `position`, growing the storage so it holds at least `position`
    /// bytes.
    ///
    /// Storage is never shrunk and bytes between the old and the new position are not cleared.
    ///
    /// # Errors
    ///
    /// Returns [`Error::PositionOutOfRange`] if `position` is beyond [`MAX_POSITION`]. The
    /// cursor is not moved in that case.
    pub fn seek(&mut self, position: u64) -> Result<()> {
        let cursor = match usize::try_from(position) {
            Ok(cursor) if position <= MAX_POSITION => cursor,
            _ => return Err(Error::PositionOutOfRange { position }),
        };

        self.ensure_capacity(cursor);
        self.cursor = cursor;
        Ok(())
    }

    /// Advances the cursor by `len` bytes without writing them.
    ///
    /// # Errors
    ///
    /// Returns [`Error::PositionOutOfRange`] if the new position would be beyond
    /// [`MAX_POSITION`].
    pub fn skip(&mut self, len: usize) -> Result<()> {
        let target = (self.cursor as u64).checked_add(len as u64).unwrap_or(u64::MAX);

        self.seek(target)
    }

    /// Moves the cursor back to zero, keeping at most one page of backing storage.
    pub fn reset(&mut self) {
        if self.pages.capacity() > PAGE_SIZE {
            event!(
                Level::TRACE,
                released_pages = self.pages.page_count() - 1,
                "shrinking paged byte sink to a single page"
            );

            self.provider.resize(&mut self.pages, PAGE_SIZE);
        }

        self.cursor = 0;
    }

    /// Borrows the written bytes `[0, position())`.
    ///
    /// The view is zero-copy and the sink cannot be modified while it exists.
    #[must_use]
    pub fn bytes(&self) -> PagedBytes<'_> {
        PagedBytes::new(self.pages.pages(), 0, self.cursor)
    }

    /// Consumes the sink, turning the written bytes into a cheaply clonable [`FrozenBytes`].
    ///
    /// The pages are handed over without copying. They are released when the last clone of the
    /// returned value is dropped.
    #[must_use]
    pub fn freeze(self) -> FrozenBytes {
        FrozenBytes::new(self.pages, self.cursor)
    }

    fn ensure_capacity(&mut self, min_bytes: usize) {
        self.provider.grow(&mut self.pages, min_bytes);
    }
}

impl Default for PagedByteSink {
    fn default() -> Self {
        Self::new()
    }
}

impl<P: ArrayProvider> io::Write for PagedByteSink<P> {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.write_slice(buf);
        Ok(buf.len())
    }

    fn write_all(&mut self, buf: &[u8]) -> io::Result<()> {
        self.write_slice(buf);
        Ok(())
    }

    #[cfg_attr(test, mutants::skip)] // Nothing to flush.
    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

impl<P: ArrayProvider> io::Seek for PagedByteSink<P> {
    fn seek(&mut self, pos: SeekFrom) -> io::Result<u64> {
        let target = match pos {
            SeekFrom::Start(target) => Some(target),
            SeekFrom::Current(delta) => (self.cursor as u64).checked_add_signed(delta),
            SeekFrom::End(delta) => (self.size() as u64).checked_add_signed(delta),
        }
        .ok_or_else(|| io::Error::new(io::ErrorKind::InvalidInput, "seek to a negative or overflowing position"))?;

        Self::seek(self, target)?;
        Ok(target)
    }

    fn stream_position(&mut self) -> io::Result<u64> {
        Ok(self.cursor as u64)
    }
}

#[cfg_attr(coverage_nightly, coverage(off))]
#[cfg(test)]
mod tests {
    use std::io::{Seek, Write};

    use static_assertions::assert_impl_all;

    use super::*;
    use crate::mem::RecyclingPages;
    use crate::testing::EventLog;

    assert_impl_all!(PagedByteSink: Send, Sync, Default);
    assert_impl_all!(PagedByteSink<RecyclingPages>: Send, Sync);

    #[expect(clippy::cast_possible_truncation, reason = "intentionally wrapping pattern")]
    fn pattern(len: usize) -> Vec<u8> {
        (0..len).map(|i| (i * 7 % 256) as u8).collect()
    }

    #[test]
    fn new_sink_is_empty_with_one_page() {
        let sink = PagedByteSink::new();

        assert_eq!(sink.size(), 0);
        assert_eq!(sink.position(), 0);
        assert_eq!(sink.capacity(), PAGE_SIZE);
        assert!(sink.bytes().is_empty());

        assert_eq!(PagedByteSink::default().capacity(), PAGE_SIZE);
        assert_eq!(PagedByteSink::with_provider(HeapPages).capacity(), PAGE_SIZE);
    }

    #[test]
    fn with_capacity_preallocates() {
        let sink = PagedByteSink::with_capacity(PAGE_SIZE + 1);

        assert_eq!(sink.capacity(), 2 * PAGE_SIZE);
        assert_eq!(sink.size(), 0);
    }

    #[test]
    fn bytes_are_concatenation_of_writes() {
        let mut sink = PagedByteSink::new();
        let mut expected = Vec::new();

        let big = pattern(3 * PAGE_SIZE + 17);

        sink.write_byte(1);
        expected.push(1);

        sink.write_slice(&big);
        expected.extend_from_slice(&big);

        sink.write_bytes(&big, 100, PAGE_SIZE).unwrap();
        expected.extend_from_slice(&big[100..100 + PAGE_SIZE]);

        sink.write_byte(2);
        expected.push(2);

        assert_eq!(sink.size(), expected.len());
        assert_eq!(sink.position(), expected.len());
        assert_eq!(sink.bytes().to_vec(), expected);
        assert_eq!(sink.bytes(), expected.as_slice());
    }

    #[test]
    fn single_bytes_cross_page_boundary() {
        let mut sink = PagedByteSink::new();
        let data = pattern(PAGE_SIZE + 2);

        for byte in &data {
            sink.write_byte(*byte);
        }

        assert_eq!(sink.capacity(), 2 * PAGE_SIZE);
        assert_eq!(sink.bytes(), data.as_slice());
    }

    #[test]
    fn zero_length_write_is_noop() {
        let mut sink = PagedByteSink::new();

        sink.write_bytes(b"abc", 10, 0).unwrap();
        sink.write_slice(&[]);

        assert_eq!(sink.position(), 0);
        assert_eq!(sink.capacity(), PAGE_SIZE);

        let mut unallocated = PagedByteSink::with_capacity(0);
        unallocated.write_bytes(b"abc", 10, 0).unwrap();
        assert_eq!(unallocated.capacity(), 0);
    }

    #[test]
    fn out_of_range_write_fails_without_mutation() {
        let mut sink = PagedByteSink::new();
        sink.write_slice(b"keep");
        let capacity = sink.capacity();

        let error = sink.write_bytes(b"abc", 2, 2).unwrap_err();

        assert_eq!(
            error,
            Error::InvalidRange {
                offset: 2,
                len: 2,
                source_len: 3
            }
        );
        assert!(error.is_invalid_argument());
        assert_eq!(sink.position(), 4);
        assert_eq!(sink.capacity(), capacity);
        assert_eq!(sink.bytes(), b"keep");
    }

    #[test]
    fn overflowing_range_fails() {
        let mut sink = PagedByteSink::new();

        let error = sink.write_bytes(b"abc", usize::MAX, 2).unwrap_err();

        assert!(matches!(error, Error::InvalidRange { offset: usize::MAX, .. }));
        assert_eq!(sink.position(), 0);
    }

    #[test]
    fn reset_keeps_one_page() {
        let mut sink = PagedByteSink::new();
        sink.write_slice(&pattern(3 * PAGE_SIZE));

        sink.reset();

        assert_eq!(sink.size(), 0);
        assert_eq!(sink.capacity(), PAGE_SIZE);

        sink.write_slice(b"again");
        assert_eq!(sink.bytes(), b"again");
    }

    #[test]
    fn reset_of_small_sink_keeps_storage() {
        let mut sink = PagedByteSink::new();
        sink.write_slice(b"tiny");

        sink.reset();

        assert_eq!(sink.size(), 0);
        assert_eq!(sink.capacity(), PAGE_SIZE);

        let mut unused = PagedByteSink::default();
        unused.reset();
        assert_eq!(unused.capacity(), PAGE_SIZE);
    }

    #[test]
    fn reset_logs_shrink() {
        let mut sink = PagedByteSink::new();
        sink.write_slice(&pattern(2 * PAGE_SIZE + 1));

        let log = EventLog::record(|| sink.reset());

        log.assert_contains("released_pages=2");
    }

    #[test]
    fn seek_moves_cursor_and_grows() {
        let mut sink = PagedByteSink::new();

        sink.seek(2 * PAGE_SIZE as u64 + 5).unwrap();

        assert_eq!(sink.position(), 2 * PAGE_SIZE + 5);
        assert_eq!(sink.capacity(), 3 * PAGE_SIZE);

        sink.seek(3).unwrap();
        assert_eq!(sink.position(), 3);
        assert_eq!(sink.size(), 3);
        assert_eq!(sink.capacity(), 3 * PAGE_SIZE, "seeking back never shrinks");
    }

    #[test]
    fn seek_back_and_overwrite() {
        let mut sink = PagedByteSink::new();
        sink.write_slice(b"hello world");

        sink.seek(6).unwrap();
        sink.write_slice(b"there");

        assert_eq!(sink.bytes(), b"hello there");
    }

    #[test]
    fn seek_forward_keeps_gap_content() {
        let mut sink = PagedByteSink::new();
        sink.write_slice(b"abcdef");
        sink.seek(2).unwrap();

        sink.seek(6).unwrap();

        assert_eq!(sink.bytes(), b"abcdef");
    }

    #[test]
    fn seek_beyond_max_position_fails() {
        let mut sink = PagedByteSink::new();
        sink.write_slice(b"abc");

        let error = sink.seek(1 << 31).unwrap_err();

        assert_eq!(error, Error::PositionOutOfRange { position: 1 << 31 });
        assert!(error.is_invalid_argument());
        assert_eq!(sink.position(), 3);
        assert_eq!(sink.capacity(), PAGE_SIZE);
    }

    #[test]
    fn skip_advances_cursor() {
        let mut sink = PagedByteSink::new();
        sink.write_slice(b"ab");

        sink.skip(PAGE_SIZE).unwrap();

        assert_eq!(sink.position(), PAGE_SIZE + 2);
        assert_eq!(sink.capacity(), 2 * PAGE_SIZE);
    }

    #[test]
    fn skip_beyond_max_position_fails() {
        let mut sink = PagedByteSink::new();
        sink.write_byte(0);

        let error = sink.skip(usize::MAX).unwrap_err();

        assert!(matches!(error, Error::PositionOutOfRange { .. }));
        assert_eq!(sink.position(), 1);
    }

    #[test]
    fn freeze_hands_over_written_bytes() {
        let mut sink = PagedByteSink::new();
        let data = pattern(PAGE_SIZE + 10);
        sink.write_slice(&data);

        let frozen = sink.freeze();

        assert_eq!(frozen.len(), data.len());
        assert_eq!(frozen.to_vec(), data);
    }

    #[test]
    fn io_write_appends() {
        let mut sink = PagedByteSink::new();

        write!(sink, "{}-{}", 12, "ab").unwrap();
        sink.write_all(b"!").unwrap();
        sink.flush().unwrap();

        assert_eq!(sink.bytes(), b"12-ab!");
    }

    #[test]
    fn io_seek_variants() {
        let mut sink = PagedByteSink::new();
        sink.write_slice(b"0123456789");

        assert_eq!(Seek::seek(&mut sink, SeekFrom::Start(4)).unwrap(), 4);
        assert_eq!(Seek::seek(&mut sink, SeekFrom::Current(2)).unwrap(), 6);
        assert_eq!(Seek::seek(&mut sink, SeekFrom::End(-1)).unwrap(), 5);
        assert_eq!(sink.stream_position().unwrap(), 5);
    }

    #[test]
    fn io_seek_rejects_invalid_targets() {
        let mut sink = PagedByteSink::new();
        sink.write_slice(b"abc");

        let negative = Seek::seek(&mut sink, SeekFrom::Current(-4)).unwrap_err();
        assert_eq!(negative.kind(), io::ErrorKind::InvalidInput);

        let too_far = Seek::seek(&mut sink, SeekFrom::Start(u64::MAX)).unwrap_err();
        assert_eq!(too_far.kind(), io::ErrorKind::InvalidInput);

        assert_eq!(sink.position(), 3);
    }

    #[test]
    fn recycling_provider_reuses_released_pages() {
        let pages = RecyclingPages::new(4);
        let mut sink = PagedByteSink::with_capacity_in(3 * PAGE_SIZE, pages.clone());

        sink.reset();
        assert_eq!(pages.cached_pages(), 2);

        sink.write_slice(&pattern(2 * PAGE_SIZE));
        assert_eq!(pages.cached_pages(), 1);
        assert_eq!(sink.provider().cached_pages(), 1);

        drop(sink);
        assert_eq!(pages.cached_pages(), 3);
    }
}
