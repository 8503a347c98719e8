// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

use std::fmt;
use std::mem;
use std::sync::Arc;

use crate::mem::PAGE_SIZE;
use crate::mem::recycling::PageCache;

/// One fixed-size page of byte storage, [`PAGE_SIZE`] bytes long.
///
/// A page is exclusively owned by whoever holds it. Pages that were rented from a
/// [`RecyclingPages`][crate::mem::RecyclingPages] provider go back to that provider's cache
/// when dropped; all other pages are simply freed.
///
/// Page contents are never cleared when a page is reused, so a page may contain stale bytes
/// from a previous user.
pub struct Page {
    data: Box<[u8]>,

    // The cache this page returns its buffer to on drop, if any.
    home: Option<Arc<PageCache>>,
}

impl Page {
    /// Allocates a new zero-filled page from the Rust global allocator.
    #[must_use]
    pub fn zeroed() -> Self {
        Self {
            data: vec![0; PAGE_SIZE].into_boxed_slice(),
            home: None,
        }
    }

    /// Wraps an existing buffer as a page.
    ///
    /// # Panics
    ///
    /// Panics if the buffer is not exactly [`PAGE_SIZE`] bytes long.
    #[must_use]
    pub fn from_boxed(data: Box<[u8]>) -> Self {
        assert_eq!(data.len(), PAGE_SIZE, "a page buffer must be exactly PAGE_SIZE bytes");

        Self { data, home: None }
    }

    pub(crate) fn with_home(data: Box<[u8]>, home: Arc<PageCache>) -> Self {
        debug_assert_eq!(data.len(), PAGE_SIZE);

        Self { data, home: Some(home) }
    }

    /// The contents of the page.
    #[must_use]
    pub fn as_slice(&self) -> &[u8] {
        &self.data
    }

    /// The contents of the page, for writing.
    #[must_use]
    pub fn as_mut_slice(&mut self) -> &mut [u8] {
        &mut self.data
    }
}

impl Drop for Page {
    fn drop(&mut self) {
        if let Some(home) = self.home.take() {
            // The cache decides whether to keep the buffer; a full cache drops it.
            _ = home.release_value(mem::take(&mut self.data));
        }
    }
}

impl fmt::Debug for Page {
    #[cfg_attr(test, mutants::skip)] // We have no API contract for this.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Page")
            .field("len", &self.data.len())
            .field("recycled", &self.home.is_some())
            .finish()
    }
}

#[cfg_attr(coverage_nightly, coverage(off))]
#[cfg(test)]
mod tests {
    use static_assertions::assert_impl_all;

    use super::*;

    assert_impl_all!(Page: Send, Sync);

    #[test]
    fn zeroed_page_is_full_size_and_clean() {
        let page = Page::zeroed();

        assert_eq!(page.as_slice().len(), PAGE_SIZE);
        assert!(page.as_slice().iter().all(|b| *b == 0));
    }

    #[test]
    fn from_boxed_keeps_contents() {
        let page = Page::from_boxed(vec![7; PAGE_SIZE].into_boxed_slice());

        assert!(page.as_slice().iter().all(|b| *b == 7));
    }

    #[test]
    #[should_panic]
    fn from_boxed_rejects_wrong_size() {
        _ = Page::from_boxed(vec![0; 10].into_boxed_slice());
    }

    #[test]
    fn writes_are_visible() {
        let mut page = Page::zeroed();
        page.as_mut_slice()[100] = 42;

        assert_eq!(page.as_slice()[100], 42);
    }
}
