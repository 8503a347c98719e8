// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

#![cfg_attr(coverage_nightly, feature(coverage_attribute))]
#![cfg_attr(docsrs, feature(doc_auto_cfg))]

//! Paged byte sinks and bounded object recyclers for allocation-light hot paths.
//!
//! This crate provides two building blocks that are typically used together when serializing
//! many messages:
//!
//! * [`PagedByteSink`] is a growable, seekable byte sink whose storage is made up of
//!   fixed-size pages of [`PAGE_SIZE`][mem::PAGE_SIZE] bytes. Growing the sink appends pages
//!   and never copies bytes that were already written.
//! * [`BoundedRecycler`][recycler::BoundedRecycler] keeps up to a fixed number of idle objects
//!   around for reuse, for example reset sinks or page buffers. Objects released into a full
//!   recycler are dropped instead of being kept.
//!
//! # Writing bytes
//!
//! Bytes are written at the sink's cursor via [`write_byte()`][PagedByteSink::write_byte],
//! [`write_bytes()`][PagedByteSink::write_bytes], [`write_slice()`][PagedByteSink::write_slice]
//! or the [`std::io::Write`] implementation. The cursor can be moved with
//! [`seek()`][PagedByteSink::seek] and [`skip()`][PagedByteSink::skip], for example to leave
//! room for a length prefix that is filled in later.
//!
//! ```
//! use recyclebuf::PagedByteSink;
//!
//! let mut sink = PagedByteSink::new();
//!
//! sink.skip(2)?;
//! sink.write_slice(b"payload");
//!
//! let end = sink.position();
//! sink.seek(0)?;
//! sink.write_slice(&u16::try_from(end - 2).unwrap().to_be_bytes());
//! sink.seek(end as u64)?;
//!
//! assert_eq!(sink.bytes(), b"\x00\x07payload");
//! # Ok::<(), recyclebuf::Error>(())
//! ```
//!
//! # Reading bytes
//!
//! [`PagedByteSink::bytes()`] borrows the written bytes as a [`PagedBytes`] view, which exposes
//! them as a sequence of per-page slices. [`PagedByteSink::freeze()`] turns the sink into
//! [`FrozenBytes`], an owned and cheaply clonable view that implements [`bytes::Buf`].
//!
//! # Reusing memory
//!
//! Memory can be reused at two levels:
//!
//! * Whole sinks, by keeping reset sinks in a [`BoundedRecycler`][recycler::BoundedRecycler].
//!   A reset sink keeps one page of storage.
//! * Individual pages, by creating sinks over a shared
//!   [`RecyclingPages`][mem::RecyclingPages] provider. Pages return to the provider's cache
//!   when the sink (or the last [`FrozenBytes`] clone) that owns them is dropped.
//!
//! # Observability
//!
//! The crate emits `tracing` events when recyclers abandon or drain objects and when sinks
//! shrink, and records `nm` metrics for page acquisition and recycler reuse.

mod error;
pub mod mem;
pub mod recycler;
mod sink;
mod view;

#[cfg(test)]
mod testing;

pub use error::{Error, Result};
pub use sink::PagedByteSink;
pub use view::{FrozenBytes, PagedBytes, Slices};

/// The largest position a [`PagedByteSink`] can [`seek()`][PagedByteSink::seek] to.
///
/// Writes may still extend a sink past this position.
pub const MAX_POSITION: u64 = 0x7FFF_FFFF;
