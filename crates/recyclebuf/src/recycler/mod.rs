// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

//! Bounded, thread-safe recycling of reusable objects.
//!
//! A [`BoundedRecycler`] keeps idle instances of some type around so that hot paths can
//! [`obtain()`][BoundedRecycler::obtain] an existing instance instead of constructing a new one,
//! and [`release()`][BoundedRecycler::release] it afterwards. At most `capacity` instances are
//! kept - anything released into a full recycler is handed to [`Factory::destroy()`] instead.
//!
//! The recycler is assembled from two parts:
//!
//! * A [`Factory`] that creates new instances and prepares released instances for reuse.
//!   Any `Fn(usize) -> T` closure is a factory.
//! * A [`RecycleQueue`] that holds the idle instances. [`MutexDeque`] is the default;
//!   [`SegQueue`][crossbeam_queue::SegQueue] is a lock-free alternative.
//!
//! ```
//! use recyclebuf::recycler::BoundedRecycler;
//!
//! let recycler: BoundedRecycler<Vec<u8>, _> = BoundedRecycler::new(2, Vec::with_capacity);
//!
//! let mut buffer = recycler.obtain(1024);
//! assert!(!buffer.is_recycled());
//! buffer.extend_from_slice(b"scratch data");
//!
//! assert!(recycler.release(buffer));
//!
//! let buffer = recycler.obtain(1024);
//! assert!(buffer.is_recycled());
//! ```

mod bounded;
mod factory;
mod handle;
mod queue;

pub use bounded::BoundedRecycler;
pub use factory::Factory;
pub use handle::Recycled;
pub use queue::{MutexDeque, RecycleQueue};
