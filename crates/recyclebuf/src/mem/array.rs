// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

use smallvec::SmallVec;

use crate::mem::{PAGE_SIZE, Page};

/// How many pages a [`PagedArray`] stores without a separate heap allocation for the page list.
const MAX_INLINE_PAGES: usize = 4;

/// A logical byte array made up of fixed-size [`Page`]s.
///
/// The array is addressed with offsets in `0..capacity()`, where the capacity is always a whole
/// number of pages. Growing the array appends pages - existing pages never move and their
/// contents are never copied.
///
/// Arrays are created and resized by an [`ArrayProvider`][crate::mem::ArrayProvider]; this type
/// only offers access to the bytes.
#[derive(Debug, Default)]
pub struct PagedArray {
    pages: SmallVec<[Page; MAX_INLINE_PAGES]>,
}

impl PagedArray {
    /// Creates an array with zero capacity.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            pages: SmallVec::new_const(),
        }
    }

    /// Capacity of the array in bytes.
    #[must_use]
    pub fn capacity(&self) -> usize {
        self.pages.len() * PAGE_SIZE
    }

    /// Number of pages backing the array.
    #[must_use]
    pub fn page_count(&self) -> usize {
        self.pages.len()
    }

    /// Reads the byte at `offset`, if the offset is inside the capacity.
    ///
    /// Bytes that were never written hold whatever the page contained when it was acquired.
    #[must_use]
    pub fn get(&self, offset: usize) -> Option<u8> {
        let page = self.pages.get(offset / PAGE_SIZE)?;
        Some(page.as_slice()[offset % PAGE_SIZE])
    }

    /// Overwrites the byte at `offset`.
    ///
    /// # Panics
    ///
    /// Panics if `offset` is not inside the capacity of the array.
    pub fn set(&mut self, offset: usize, byte: u8) {
        let page = self
            .pages
            .get_mut(offset / PAGE_SIZE)
            .expect("offset must be inside the paged array capacity");

        page.as_mut_slice()[offset % PAGE_SIZE] = byte;
    }

    /// Copies `src` into the array, starting at `offset`. The copy may span any number of pages.
    ///
    /// # Panics
    ///
    /// Panics if `offset + src.len()` exceeds the capacity of the array.
    pub fn set_slice(&mut self, offset: usize, src: &[u8]) {
        assert!(
            offset.checked_add(src.len()).is_some_and(|end| end <= self.capacity()),
            "range {offset}+{} is outside the paged array capacity {}",
            src.len(),
            self.capacity()
        );

        let mut offset = offset;
        let mut remaining = src;

        while !remaining.is_empty() {
            let within_page = offset % PAGE_SIZE;
            let chunk_len = (PAGE_SIZE - within_page).min(remaining.len());
            let (chunk, rest) = remaining.split_at(chunk_len);

            self.pages[offset / PAGE_SIZE].as_mut_slice()[within_page..within_page + chunk_len].copy_from_slice(chunk);

            offset += chunk_len;
            remaining = rest;
        }
    }

    pub(crate) fn pages(&self) -> &[Page] {
        &self.pages
    }

    pub(crate) fn push_pages(&mut self, pages: impl IntoIterator<Item = Page>) {
        self.pages.extend(pages);
    }

    pub(crate) fn truncate_pages(&mut self, page_count: usize) {
        self.pages.truncate(page_count);
    }
}
