// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

use thiserror::Error;

/// An error returned when a caller hands invalid arguments to a [`PagedByteSink`][crate::PagedByteSink].
///
/// Every variant belongs to the "invalid argument" class: the caller asked for something that
/// cannot be done, nothing was modified and retrying the same call will fail the same way.
///
/// Running out of memory is not represented here - allocation failures abort the process, as is
/// customary for the Rust global allocator.
///
/// # Thread safety
///
/// This type is thread-safe.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum Error {
    /// The `offset` and `len` pair does not describe a range inside the source slice.
    #[error("illegal offset {offset}/length {len} for slice of length {source_len}")]
    InvalidRange {
        /// Offset of the first byte to copy from the source slice.
        offset: usize,
        /// Number of bytes requested.
        len: usize,
        /// Actual length of the source slice.
        source_len: usize,
    },

    /// The requested write position is beyond [`MAX_POSITION`][crate::MAX_POSITION].
    #[error("position {position} exceeds the maximum position {}", crate::MAX_POSITION)]
    PositionOutOfRange {
        /// The rejected position.
        position: u64,
    },
}

impl Error {
    /// Whether the error was caused by an invalid argument supplied by the caller.
    ///
    /// This is currently true for all variants but remains a separate query so that callers
    /// do not need to enumerate variants of a non-exhaustive type.
    #[must_use]
    pub fn is_invalid_argument(&self) -> bool {
        matches!(self, Self::InvalidRange { .. } | Self::PositionOutOfRange { .. })
    }
}

/// A specialized `Result` for paged byte sink operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Represents the error as a standard I/O error with [`ErrorKind::InvalidInput`][std::io::ErrorKind::InvalidInput].
///
/// This is used by the `std::io::Write` and `std::io::Seek` implementations of the sink.
impl From<Error> for std::io::Error {
    fn from(value: Error) -> Self {
        Self::new(std::io::ErrorKind::InvalidInput, value)
    }
}
