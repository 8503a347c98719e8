// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

use std::iter::FusedIterator;
use std::sync::Arc;
use std::{mem, slice};

use bytes::{Buf, Bytes, BytesMut};
use nm::Event;

use crate::mem::{PAGE_SIZE, Page, PagedArray};

/// An immutable view over bytes written into a [`PagedByteSink`][crate::PagedByteSink].
///
/// Returned by [`PagedByteSink::bytes()`][crate::PagedByteSink::bytes]. The view borrows the
/// sink, so the sink cannot be written to, reset or dropped while the view exists. Creating the
/// view is zero-copy; the bytes may be spread over multiple pages, exposed via
/// [`slices()`][Self::slices].
///
/// To keep the bytes around independently of the sink, turn the sink into
/// [`FrozenBytes`] via [`PagedByteSink::freeze()`][crate::PagedByteSink::freeze], or copy them
/// out with [`to_vec()`][Self::to_vec].
#[derive(Clone, Copy, Debug)]
pub struct PagedBytes<'a> {
    pages: &'a [Page],

    // Offset of the first byte of the view inside the pages.
    start: usize,

    len: usize,
}

impl<'a> PagedBytes<'a> {
    pub(crate) fn new(pages: &'a [Page], start: usize, len: usize) -> Self {
        debug_assert!(start + len <= pages.len() * PAGE_SIZE);

        Self { pages, start, len }
    }

    /// Number of bytes in the view.
    #[must_use]
    pub fn len(&self) -> usize {
        self.len
    }

    /// Whether the view contains no bytes.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Returns the byte at `index`, or `None` if the index is out of bounds.
    #[must_use]
    pub fn get(&self, index: usize) -> Option<u8> {
        if index >= self.len {
            return None;
        }

        let offset = self.start + index;
        Some(self.pages[offset / PAGE_SIZE].as_slice()[offset % PAGE_SIZE])
    }

    /// Iterates over the contiguous slices that make up the view, in order.
    ///
    /// Each slice lies within one page. Empty views yield no slices.
    #[must_use]
    pub fn slices(&self) -> Slices<'a> {
        let first_page = self.start / PAGE_SIZE;
        let pages = self.pages.get(first_page..).unwrap_or_default();

        Slices {
            pages: pages.iter(),
            first_offset: self.start % PAGE_SIZE,
            remaining: self.len,
        }
    }

    /// Copies the bytes of the view into `dst`.
    ///
    /// # Panics
    ///
    /// Panics if `dst` is not exactly as long as the view.
    pub fn copy_to_slice(&self, dst: &mut [u8]) {
        assert_eq!(dst.len(), self.len, "destination length must match the view length");

        let mut dst = dst;
        for slice in self.slices() {
            let (head, tail) = dst.split_at_mut(slice.len());
            head.copy_from_slice(slice);
            dst = tail;
        }
    }

    /// Copies the bytes of the view into a new vector.
    #[must_use]
    pub fn to_vec(&self) -> Vec<u8> {
        let mut result = Vec::with_capacity(self.len);
        self.slices().for_each(|slice| result.extend_from_slice(slice));
        result
    }

    fn eq_slice(&self, other: &[u8]) -> bool {
        if self.len != other.len() {
            return false;
        }

        let mut other = other;
        self.slices().all(|slice| {
            let (head, tail) = other.split_at(slice.len());
            other = tail;
            head == slice
        })
    }
}

impl PartialEq for PagedBytes<'_> {
    fn eq(&self, other: &Self) -> bool {
        self.len == other.len && self.slices().flatten().eq(other.slices().flatten())
    }
}

impl Eq for PagedBytes<'_> {}

impl PartialEq<[u8]> for PagedBytes<'_> {
    fn eq(&self, other: &[u8]) -> bool {
        self.eq_slice(other)
    }
}

impl PartialEq<&[u8]> for PagedBytes<'_> {
    fn eq(&self, other: &&[u8]) -> bool {
        self.eq_slice(other)
    }
}

impl<const N: usize> PartialEq<&[u8; N]> for PagedBytes<'_> {
    fn eq(&self, other: &&[u8; N]) -> bool {
        self.eq_slice(other.as_slice())
    }
}

/// Iterator over the contiguous slices of a [`PagedBytes`] or [`FrozenBytes`] view.
#[derive(Clone, Debug)]
pub struct Slices<'a> {
    pages: slice::Iter<'a, Page>,

    // Offset into the first page; zero for all pages after it.
    first_offset: usize,

    remaining: usize,
}

impl<'a> Iterator for Slices<'a> {
    type Item = &'a [u8];

    fn next(&mut self) -> Option<Self::Item> {
        if self.remaining == 0 {
            return None;
        }

        let page = self.pages.next()?;
        let from = mem::take(&mut self.first_offset);
        let len = self.remaining.min(PAGE_SIZE - from);
        self.remaining -= len;

        Some(&page.as_slice()[from..from + len])
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        if self.remaining == 0 {
            return (0, Some(0));
        }

        let count = (self.first_offset + self.remaining).div_ceil(PAGE_SIZE);
        (count, Some(count))
    }
}

impl ExactSizeIterator for Slices<'_> {}

impl FusedIterator for Slices<'_> {}

/// Bytes written into a [`PagedByteSink`][crate::PagedByteSink], detached from the sink.
///
/// Created by [`PagedByteSink::freeze()`][crate::PagedByteSink::freeze], which hands the pages
/// of the sink over to this type without copying. Clones share the same pages, so cloning is
/// cheap and clones may be sent to other threads. The pages are released to their provider
/// when the last clone is dropped.
///
/// The bytes can be consumed via the [`bytes::Buf`] implementation, which shrinks this view
/// (but not its clones) from the front.
#[derive(Clone, Debug)]
pub struct FrozenBytes {
    pages: Arc<PagedArray>,
    start: usize,
    len: usize,
}

impl FrozenBytes {
    pub(crate) fn new(pages: PagedArray, len: usize) -> Self {
        debug_assert!(len <= pages.capacity());

        Self {
            pages: Arc::new(pages),
            start: 0,
            len,
        }
    }

    /// Borrows the bytes as a [`PagedBytes`] view.
    #[must_use]
    pub fn as_view(&self) -> PagedBytes<'_> {
        PagedBytes::new(self.pages.pages(), self.start, self.len)
    }

    /// Number of bytes remaining in the view.
    #[must_use]
    pub fn len(&self) -> usize {
        self.len
    }

    /// Whether no bytes remain in the view.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Copies the remaining bytes into a new vector.
    #[must_use]
    pub fn to_vec(&self) -> Vec<u8> {
        self.as_view().to_vec()
    }

    /// Returns a [`bytes::Bytes`] with the same contents.
    ///
    /// # Performance
    ///
    /// This is zero-copy if the remaining bytes lie within a single page - the returned value
    /// then keeps the pages alive. Otherwise, the bytes are copied into a new `Bytes` backed by
    /// memory from the Rust global allocator.
    #[must_use]
    pub fn to_bytes(&self) -> Bytes {
        if self.is_empty() {
            return Bytes::new();
        }

        if self.as_view().slices().len() == 1 {
            TO_BYTES_SHARED.with(|e| e.observe(self.len));

            return Bytes::from_owner(SinglePage {
                pages: Arc::clone(&self.pages),
                page: self.start / PAGE_SIZE,
                from: self.start % PAGE_SIZE,
                len: self.len,
            });
        }

        TO_BYTES_COPIED.with(|e| e.observe(self.len));

        let mut bytes = BytesMut::with_capacity(self.len);
        self.as_view().slices().for_each(|slice| bytes.extend_from_slice(slice));
        bytes.freeze()
    }
}

impl PartialEq for FrozenBytes {
    fn eq(&self, other: &Self) -> bool {
        self.as_view() == other.as_view()
    }
}

impl Eq for FrozenBytes {}

impl PartialEq<[u8]> for FrozenBytes {
    fn eq(&self, other: &[u8]) -> bool {
        self.as_view() == *other
    }
}

impl PartialEq<&[u8]> for FrozenBytes {
    fn eq(&self, other: &&[u8]) -> bool {
        self.as_view() == *other
    }
}

impl<const N: usize> PartialEq<&[u8; N]> for FrozenBytes {
    fn eq(&self, other: &&[u8; N]) -> bool {
        self.as_view() == *other
    }
}

impl Buf for FrozenBytes {
    fn remaining(&self) -> usize {
        self.len
    }

    fn chunk(&self) -> &[u8] {
        self.as_view().slices().next().unwrap_or_default()
    }

    fn advance(&mut self, cnt: usize) {
        assert!(
            cnt <= self.len,
            "cannot advance past the end of the view: {cnt} > {}",
            self.len
        );

        self.start += cnt;
        self.len -= cnt;
    }
}

/// Owner of a byte range within one page, used to hand out zero-copy [`Bytes`].
struct SinglePage {
    pages: Arc<PagedArray>,
    page: usize,
    from: usize,
    len: usize,
}

impl AsRef<[u8]> for SinglePage {
    fn as_ref(&self) -> &[u8] {
        &self.pages.pages()[self.page].as_slice()[self.from..self.from + self.len]
    }
}

thread_local! {
    static TO_BYTES_SHARED: Event = Event::builder()
        .name("recyclebuf_frozen_to_bytes_shared")
        .build();

    static TO_BYTES_COPIED: Event = Event::builder()
        .name("recyclebuf_frozen_to_bytes_copied")
        .build();
}
