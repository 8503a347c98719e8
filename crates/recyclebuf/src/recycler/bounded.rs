// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

use std::fmt;
use std::marker::PhantomData;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

use nm::Event;
use tracing::{Level, event};

use crate::recycler::{Factory, MutexDeque, RecycleQueue, Recycled};

/// A thread-safe recycler that keeps at most `capacity` idle instances for reuse.
///
/// Instances are handed out by [`obtain()`][Self::obtain] - taken from the pool if one is
/// available, freshly created by the [`Factory`] otherwise - and handed back by
/// [`release()`][Self::release]. A release that would push the number of pooled instances above
/// `capacity` is rejected and the instance goes to [`Factory::destroy()`].
///
/// # Capacity accounting
///
/// The number of pooled instances is tracked by an atomic counter, separately from the queue
/// that stores them, so that neither path needs to lock the queue as a whole or ask it for its
/// (potentially linear-time) length.
///
/// A release first increments the counter and then checks the new value against the capacity.
/// If the capacity is exceeded, the increment is reverted and the instance is abandoned;
/// otherwise the instance is pushed onto the queue. An obtain that takes an instance from the
/// queue decrements the counter afterwards. Because a slot is claimed before the instance is
/// pushed, concurrent releases can never collectively overfill the pool - if two threads race
/// for the last free slot, exactly one of them wins.
///
/// The counter may briefly exceed the capacity while a losing release is reverting its
/// increment, which can cause another concurrent release to be rejected even though a slot
/// was about to become free. This is the only imprecision and it only ever errs on the side
/// of keeping fewer instances.
///
/// # Shutdown
///
/// [`close()`][Self::close] destroys all pooled instances. It must not race with `obtain()` or
/// `release()` - doing so corrupts the accounting. Debug builds detect use of a closed recycler.
///
/// # Thread safety
///
/// This type is thread-safe if the factory and queue are.
pub struct BoundedRecycler<T, F, Q = MutexDeque<T>>
where
    F: Factory<T>,
    Q: RecycleQueue<T>,
{
    factory: F,
    queue: Q,
    capacity: usize,

    // Number of instances counted as pooled. Tracked separately because the queue length may
    // be expensive to determine. See type-level docs for the protocol that keeps this bounded.
    pooled: AtomicUsize,

    closed: AtomicBool,

    _value: PhantomData<fn() -> T>,
}

impl<T, F> BoundedRecycler<T, F>
where
    F: Factory<T>,
{
    /// Creates a recycler that keeps up to `capacity` instances in a [`MutexDeque`].
    ///
    /// A capacity of zero creates a recycler that never keeps anything.
    #[must_use]
    pub fn new(capacity: usize, factory: F) -> Self {
        Self::with_queue(capacity, factory, MutexDeque::new())
    }
}

impl<T, F, Q> BoundedRecycler<T, F, Q>
where
    F: Factory<T>,
    Q: RecycleQueue<T>,
{
    /// Creates a recycler that keeps up to `capacity` instances in the provided queue.
    ///
    /// The queue must be empty.
    ///
    /// # Panics
    ///
    /// Panics if the queue is not empty.
    #[must_use]
    pub fn with_queue(capacity: usize, factory: F, queue: Q) -> Self {
        assert!(queue.is_empty(), "a recycler must start with an empty queue");

        Self {
            factory,
            queue,
            capacity,
            pooled: AtomicUsize::new(0),
            closed: AtomicBool::new(false),
            _value: PhantomData,
        }
    }

    /// Obtains an instance - a pooled one if available, otherwise a new one created by the
    /// factory with the given sizing hint.
    ///
    /// Never blocks beyond what the queue itself does.
    #[must_use]
    pub fn obtain(&self, sizing: usize) -> Recycled<T> {
        debug_assert!(!self.is_closed(), "obtain() called on a closed recycler");

        if let Some(value) = self.queue.pop_back() {
            // Each queued instance was counted before it was pushed, so this cannot underflow.
            let previous = self.pooled.fetch_sub(1, Ordering::AcqRel);
            debug_assert!(previous > 0, "pooled count underflow - close() raced with obtain()");

            OBTAINED.with(|e| e.observe(1));

            Recycled::new(value, true)
        } else {
            OBTAINED.with(|e| e.observe(0));

            Recycled::new(self.factory.create(sizing), false)
        }
    }

    /// Returns an instance obtained from [`obtain()`][Self::obtain] to the recycler.
    ///
    /// Returns `true` if the instance was accepted into the pool and `false` if the pool was
    /// full and the instance was destroyed instead.
    pub fn release(&self, handle: Recycled<T>) -> bool {
        self.release_value(handle.into_inner())
    }

    /// Offers an instance to the recycler, whether or not it was obtained from it.
    ///
    /// Returns `true` if the instance was accepted into the pool and `false` if the pool was
    /// full and the instance was destroyed instead.
    pub fn release_value(&self, mut value: T) -> bool {
        debug_assert!(!self.is_closed(), "release() called on a closed recycler");

        // Claim a slot first, then check whether the claim was within the capacity.
        let claimed = self.pooled.fetch_add(1, Ordering::AcqRel) + 1;

        if claimed <= self.capacity {
            self.factory.recycle(&mut value);
            self.queue.push_back(value);
            return true;
        }

        self.pooled.fetch_sub(1, Ordering::AcqRel);

        ABANDONED.with(|e| e.observe(1));
        event!(
            Level::TRACE,
            capacity = self.capacity,
            "recycler is full, abandoning released instance"
        );

        self.factory.destroy(value);
        false
    }

    /// Destroys all pooled instances and resets the pooled count to zero.
    ///
    /// Must not be called concurrently with [`obtain()`][Self::obtain] or
    /// [`release()`][Self::release]. The recycler is not meant to be used after it is closed;
    /// debug builds panic if it is.
    ///
    /// # Panics
    ///
    /// In debug builds, panics if the number of drained instances does not match the pooled
    /// count, which indicates that the recycler was closed while in use.
    pub fn close(&self) {
        let drained = self.drain();
        let pooled = self.pooled.swap(0, Ordering::AcqRel);
        self.closed.store(true, Ordering::Release);

        debug_assert_eq!(drained, pooled, "recycler was closed while instances were being obtained or released");

        event!(Level::DEBUG, drained, capacity = self.capacity, "recycler closed");
    }

    /// Maximum number of instances the recycler keeps.
    #[must_use]
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Number of instances currently pooled. Only a snapshot when other threads are active.
    #[must_use]
    pub fn pooled(&self) -> usize {
        self.pooled.load(Ordering::Acquire)
    }

    fn drain(&self) -> usize {
        let mut drained = 0;

        while let Some(value) = self.queue.pop_back() {
            self.factory.destroy(value);
            drained += 1;
        }

        drained
    }

    fn is_closed(&self) -> bool {
        self.closed.load(Ordering::Acquire)
    }
}

impl<T, F, Q> Drop for BoundedRecycler<T, F, Q>
where
    F: Factory<T>,
    Q: RecycleQueue<T>,
{
    fn drop(&mut self) {
        // Instances still pooled at this point are disposed of the same way close() would.
        _ = self.drain();
    }
}

impl<T, F, Q> fmt::Debug for BoundedRecycler<T, F, Q>
where
    F: Factory<T>,
    Q: RecycleQueue<T>,
{
    #[cfg_attr(test, mutants::skip)] // We have no API contract for this.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BoundedRecycler")
            .field("capacity", &self.capacity)
            .field("pooled", &self.pooled.load(Ordering::Relaxed))
            .field("closed", &self.closed.load(Ordering::Relaxed))
            .finish_non_exhaustive()
    }
}

thread_local! {
    // Magnitude 1 when the instance came from the pool, 0 when it was freshly created.
    static OBTAINED: Event = Event::builder()
        .name("recyclebuf_recycler_obtained")
        .build();

    static ABANDONED: Event = Event::builder()
        .name("recyclebuf_recycler_abandoned")
        .build();
}
