// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

use std::collections::VecDeque;
use std::fmt;

use crossbeam_queue::SegQueue;
use parking_lot::Mutex;

/// A thread-safe store of idle instances, used as the backing storage of a
/// [`BoundedRecycler`][crate::recycler::BoundedRecycler].
///
/// Each operation must be individually thread-safe. The queue does not need to enforce any
/// bound - the recycler does that. The order in which instances come back out is up to the
/// implementation.
pub trait RecycleQueue<T> {
    /// Adds an idle instance.
    fn push_back(&self, value: T);

    /// Removes some idle instance, if there is one.
    fn pop_back(&self) -> Option<T>;

    /// Number of idle instances in the queue.
    ///
    /// This may be a linear-time operation and is never used on the obtain/release path.
    fn len(&self) -> usize;

    /// Whether the queue holds no idle instances.
    fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// A [`RecycleQueue`] backed by a mutex-guarded double-ended queue.
///
/// Instances come back out in last-in-first-out order, which tends to hand out the instance
/// whose memory is most likely to still be in cache.
pub struct MutexDeque<T> {
    inner: Mutex<VecDeque<T>>,
}

impl<T> MutexDeque<T> {
    /// Creates an empty queue.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            inner: Mutex::new(VecDeque::new()),
        }
    }
}

impl<T> Default for MutexDeque<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> RecycleQueue<T> for MutexDeque<T> {
    fn push_back(&self, value: T) {
        self.inner.lock().push_back(value);
    }

    fn pop_back(&self) -> Option<T> {
        self.inner.lock().pop_back()
    }

    fn len(&self) -> usize {
        self.inner.lock().len()
    }
}

impl<T> fmt::Debug for MutexDeque<T> {
    #[cfg_attr(test, mutants::skip)] // We have no API contract for this.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MutexDeque").field("len", &self.len()).finish()
    }
}

/// Lock-free alternative. Instances come back out in first-in-first-out order.
impl<T> RecycleQueue<T> for SegQueue<T> {
    #[inline]
    fn push_back(&self, value: T) {
        self.push(value);
    }

    #[inline]
    fn pop_back(&self) -> Option<T> {
        self.pop()
    }

    #[inline]
    fn len(&self) -> usize {
        Self::len(self)
    }
}
