// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

use std::ops::{Deref, DerefMut};

/// An instance handed out by [`BoundedRecycler::obtain()`][crate::recycler::BoundedRecycler::obtain].
///
/// Dereferences to the instance. Hand it back with
/// [`release()`][crate::recycler::BoundedRecycler::release] to make it available for reuse;
/// dropping the handle drops the instance without returning it to the recycler.
#[derive(Debug)]
pub struct Recycled<T> {
    value: T,
    recycled: bool,
}

impl<T> Recycled<T> {
    pub(crate) const fn new(value: T, recycled: bool) -> Self {
        Self { value, recycled }
    }

    /// Whether the instance came from the pool (`true`) or was freshly created (`false`).
    #[must_use]
    pub fn is_recycled(&self) -> bool {
        self.recycled
    }

    /// Takes the instance out of the handle.
    #[must_use]
    pub fn into_inner(self) -> T {
        self.value
    }
}

impl<T> Deref for Recycled<T> {
    type Target = T;

    fn deref(&self) -> &Self::Target {
        &self.value
    }
}

impl<T> DerefMut for Recycled<T> {
    fn deref_mut(&mut self) -> &mut Self::Target {
        &mut self.value
    }
}
