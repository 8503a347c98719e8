// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

//! Types for using and implementing page providers.
//!
//! A [`PagedByteSink`][crate::PagedByteSink] stores its bytes in a [`PagedArray`], a logical
//! byte array made up of fixed-size [`Page`]s of [`PAGE_SIZE`] bytes each. Pages are supplied
//! by an [`ArrayProvider`]:
//!
//! * [`HeapPages`] allocates every page from the Rust global allocator and frees it on drop.
//! * [`RecyclingPages`] keeps a bounded cache of page buffers and hands them out again,
//!   so that sinks created and dropped in a loop stop allocating once the cache is warm.

mod array;
mod heap;
mod page;
mod provider;
mod recycling;

pub use array::PagedArray;
pub use heap::HeapPages;
pub use page::Page;
pub use provider::ArrayProvider;
pub use recycling::RecyclingPages;

/// Size of a single page in bytes.
///
/// Shared by every provider and every sink - a [`PagedArray`] always consists of pages of
/// exactly this size.
pub const PAGE_SIZE: usize = 16 * 1024;

/// Number of whole pages needed to back `bytes` bytes of capacity.
pub(crate) const fn pages_for(bytes: usize) -> usize {
    bytes.div_ceil(PAGE_SIZE)
}
