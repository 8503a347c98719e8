// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

/// Creates, resets and disposes of the instances managed by a
/// [`BoundedRecycler`][crate::recycler::BoundedRecycler].
///
/// Only [`create()`][Self::create] is mandatory. Any `Fn(usize) -> T` is a factory that
/// creates instances and keeps the default reuse and disposal behavior.
///
/// # Example
///
/// ```
/// use recyclebuf::recycler::{BoundedRecycler, Factory};
///
/// #[derive(Debug)]
/// struct ScratchBuffers;
///
/// impl Factory<Vec<u8>> for ScratchBuffers {
///     fn create(&self, sizing: usize) -> Vec<u8> {
///         Vec::with_capacity(sizing)
///     }
///
///     fn recycle(&self, value: &mut Vec<u8>) {
///         // The next user expects an empty buffer.
///         value.clear();
///     }
/// }
///
/// let recycler: BoundedRecycler<Vec<u8>, _> = BoundedRecycler::new(8, ScratchBuffers);
///
/// let mut buffer = recycler.obtain(256);
/// buffer.extend_from_slice(b"temporary");
/// assert!(recycler.release(buffer));
///
/// assert!(recycler.obtain(256).is_empty());
/// ```
pub trait Factory<T> {
    /// Creates a new instance. `sizing` is a hint passed through from
    /// [`obtain()`][crate::recycler::BoundedRecycler::obtain], e.g. a desired buffer capacity.
    fn create(&self, sizing: usize) -> T;

    /// Prepares a released instance for reuse before it enters the pool.
    ///
    /// Only called for instances that the recycler accepts. The default does nothing.
    #[cfg_attr(test, mutants::skip)] // Intentionally empty default.
    fn recycle(&self, value: &mut T) {
        _ = value;
    }

    /// Disposes of an instance that the recycler does not keep, either because the pool was
    /// full when it was released or because the recycler is being closed.
    ///
    /// The default drops the instance.
    #[cfg_attr(test, mutants::skip)] // Intentionally trivial default.
    fn destroy(&self, value: T) {
        drop(value);
    }
}

impl<T, F> Factory<T> for F
where
    F: Fn(usize) -> T,
{
    #[inline]
    fn create(&self, sizing: usize) -> T {
        self(sizing)
    }
}
