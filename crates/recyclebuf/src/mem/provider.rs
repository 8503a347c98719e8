// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

use std::fmt::Debug;
use std::iter;
use std::sync::Arc;

use nm::{Event, Magnitude};

use crate::mem::{Page, PagedArray, pages_for};

/// Supplies the pages that back a [`PagedArray`].
///
/// Implementations only need to provide [`new_page()`][Self::new_page]. Allocating, growing
/// and resizing arrays are expressed in terms of whole pages on top of it:
///
/// * Growth appends pages to the end of the array. Pages already in the array are neither moved
///   nor copied, so the cost of a growth step is bounded by the pages it adds.
/// * Shrinking drops pages from the end of the array.
///
/// Growth is always "grow to at least N bytes" - the resulting capacity is N rounded up to a
/// whole number of pages.
///
/// # Resource management
///
/// Pages are owned by the array. Dropping an array (or truncating it) drops its pages, which
/// is when a recycling provider takes their memory back.
pub trait ArrayProvider: Debug {
    /// Provides one page of [`PAGE_SIZE`][crate::mem::PAGE_SIZE] bytes.
    ///
    /// The contents of the page are unspecified - a provider may hand out pages that
    /// still contain data from an earlier user.
    ///
    /// # Panics
    ///
    /// May panic if the operating system runs out of memory.
    fn new_page(&self) -> Page;

    /// Creates an array with capacity for at least `min_bytes` bytes.
    ///
    /// Allocating zero bytes returns an array without any pages.
    #[must_use]
    fn allocate(&self, min_bytes: usize) -> PagedArray {
        let mut array = PagedArray::new();
        self.grow(&mut array, min_bytes);
        array
    }

    /// Grows `array` so its capacity is at least `min_bytes`, preserving existing content.
    ///
    /// Does nothing if the array is already large enough.
    fn grow(&self, array: &mut PagedArray, min_bytes: usize) {
        let required = pages_for(min_bytes);
        let current = array.page_count();

        if required <= current {
            return;
        }

        let added = required - current;
        PAGES_ACQUIRED.with(|e| e.observe(added));

        array.push_pages(iter::repeat_with(|| self.new_page()).take(added));
    }

    /// Resizes `array` to the smallest whole number of pages that holds `exact_bytes`, either
    /// dropping pages from the end or appending new ones.
    fn resize(&self, array: &mut PagedArray, exact_bytes: usize) {
        let required = pages_for(exact_bytes);

        if required < array.page_count() {
            array.truncate_pages(required);
        } else {
            self.grow(array, exact_bytes);
        }
    }
}

impl<P: ArrayProvider + ?Sized> ArrayProvider for &P {
    #[cfg_attr(test, mutants::skip)] // Trivial forwarder.
    #[inline]
    fn new_page(&self) -> Page {
        (*self).new_page()
    }
}

impl<P: ArrayProvider + ?Sized> ArrayProvider for Arc<P> {
    #[cfg_attr(test, mutants::skip)] // Trivial forwarder.
    #[inline]
    fn new_page(&self) -> Page {
        (**self).new_page()
    }
}

// Histogram buckets for the number of pages acquired per growth step.
const PAGE_BATCH_BUCKETS: &[Magnitude] = &[1, 2, 4, 8, 16, 64, 256];

thread_local! {
    static PAGES_ACQUIRED: Event = Event::builder()
        .name("recyclebuf_pages_acquired")
        .histogram(PAGE_BATCH_BUCKETS)
        .build();
}
