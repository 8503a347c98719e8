// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

use std::sync::Arc;

use nm::Event;

use crate::mem::{ArrayProvider, PAGE_SIZE, Page};
use crate::recycler::BoundedRecycler;

/// The cache of idle page buffers shared by a [`RecyclingPages`] provider and its pages.
pub(crate) type PageCache = BoundedRecycler<Box<[u8]>, fn(usize) -> Box<[u8]>>;

/// A page provider that keeps a bounded cache of page buffers for reuse.
///
/// Every page handed out by this provider remembers the cache it came from and returns its
/// buffer there when dropped - whether it is dropped by a sink being reset, a sink being
/// dropped or the last [`FrozenBytes`][crate::FrozenBytes] referencing it going away. Once the
/// cache holds `max_cached_pages` buffers, further returned buffers are freed.
///
/// Buffers are not cleared when reused, so a new page may contain bytes written by a previous
/// user. Sinks never expose bytes they have not written themselves.
///
/// Clones of the provider share the same cache.
///
/// # Example
///
/// ```
/// use recyclebuf::PagedByteSink;
/// use recyclebuf::mem::RecyclingPages;
///
/// let pages = RecyclingPages::new(64);
///
/// for message in [&b"first"[..], b"second", b"third"] {
///     let mut sink = PagedByteSink::with_provider(pages.clone());
///     sink.write_slice(message);
///     assert_eq!(sink.bytes(), message);
/// }
///
/// // The page used by the last sink went back to the cache when the sink was dropped.
/// assert_eq!(pages.cached_pages(), 1);
/// ```
#[derive(Clone, Debug)]
pub struct RecyclingPages {
    cache: Arc<PageCache>,
}

impl RecyclingPages {
    /// Creates a provider that caches up to `max_cached_pages` idle page buffers.
    #[must_use]
    pub fn new(max_cached_pages: usize) -> Self {
        let factory: fn(usize) -> Box<[u8]> = new_page_buffer;

        Self {
            cache: Arc::new(BoundedRecycler::new(max_cached_pages, factory)),
        }
    }

    /// Number of idle page buffers currently in the cache.
    #[must_use]
    pub fn cached_pages(&self) -> usize {
        self.cache.pooled()
    }

    /// Maximum number of idle page buffers the cache keeps.
    #[must_use]
    pub fn max_cached_pages(&self) -> usize {
        self.cache.capacity()
    }
}

impl ArrayProvider for RecyclingPages {
    fn new_page(&self) -> Page {
        let buffer = self.cache.obtain(PAGE_SIZE);

        if buffer.is_recycled() {
            PAGE_REUSED.with(|e| e.observe(PAGE_SIZE));
        }

        Page::with_home(buffer.into_inner(), Arc::clone(&self.cache))
    }
}

fn new_page_buffer(_sizing: usize) -> Box<[u8]> {
    vec![0; PAGE_SIZE].into_boxed_slice()
}

thread_local! {
    static PAGE_REUSED: Event = Event::builder()
        .name("recyclebuf_page_reused")
        .build();
}
