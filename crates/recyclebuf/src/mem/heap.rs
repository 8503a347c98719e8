// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

use crate::mem::{ArrayProvider, Page};

/// A page provider that allocates every page from the Rust global allocator.
///
/// Pages are zero-filled when created and freed when dropped - nothing is reused. This is the
/// default provider of [`PagedByteSink`][crate::PagedByteSink]. Use
/// [`RecyclingPages`][crate::mem::RecyclingPages] when sinks are created and dropped often
/// enough for page reuse to matter.
#[derive(Clone, Copy, Debug, Default)]
pub struct HeapPages;

impl ArrayProvider for HeapPages {
    #[inline]
    fn new_page(&self) -> Page {
        Page::zeroed()
    }
}
