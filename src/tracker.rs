//! # TinyScan - Recently Seen Device Tracking for Embedded Systems
//!
//! TinyScan keeps the most recently observed wireless devices from a stream of
//! advertisement events in a bounded, allocation-free registry.
//! It features:
//!
//! - **Fixed memory budget** - Every tracked device lives in a preallocated block pool
//! - **Generation-tracked handles** - Stale block handles are rejected, never aliased
//! - **Recency ordering** - O(1) move-to-front on every observation
//! - **Deduplication** - A chatty device cannot push quieter devices out
//! - **Signal ranking** - Stable RSSI-ordered snapshots on demand
//!
//! ## Quick Start
//!
//! ```rust
//! use tinyscan::prelude::*;
//!
//! // Track up to 32 devices
//! let mut registry = DeviceRegistry::<32>::new();
//!
//! let mut adv = AdvertisementRecord::new(7);
//! adv.signal_strength = 42;
//! registry.observe(&adv, 1_000);
//!
//! let newest = registry.snapshot_by_recency().next().unwrap();
//! assert_eq!(newest.device_id(), 7);
//! assert_eq!(newest.age_ms(1_250), 250);
//! ```
//!
//! ## Features
//!
//! - `wire` (default) - Decode packed advertisement events with `nom`
//! - `std` (default) - Wall-clock [`clock::SystemClock`] and `std::error::Error` impls
//!
//! ## Architecture
//!
//! ### Core Traits
//!
//! The [`BlockPool`] trait defines the storage interface the registry sits on:
//!
//! - `init()` / `reset()` - Explicit pool lifecycle
//! - `allocate()` / `release()` - O(1) block hand-out and reclaim
//! - `get()` / `get_mut()` - Access blocks via handles
//! - `len()` / `capacity()` / `free_count()` - Query pool state
//!
//! The [`Clock`](clock::Clock) trait is the injected time provider.
//!
//! ### Storage Model
//!
//! ```rust
//! # use tinyscan::prelude::*;
//! let mut pool = FixedBlockPool::<u32, 4>::new();
//! pool.init(4).unwrap();
//!
//! let handle = pool.allocate(10).unwrap();
//! pool.release(handle).unwrap();
//!
//! // Released handles are stale
//! assert!(pool.get(handle).is_none());
//! assert_eq!(pool.release(handle), Err(PoolError::DoubleRelease));
//! ```
//!
//! ## Performance Characteristics
//!
//! | Operation | Cost | Notes |
//! |-----------|------|-------|
//! | observe() | O(n) | Linear dedup scan, n <= capacity |
//! | snapshot_by_recency() | O(1) per item | Lazy walk |
//! | snapshot_by_signal_strength() | O(n^2) | Insertion sort, stable |
//! | allocate() / release() | O(1) | Free list head |
//!
//! ## Concurrency
//!
//! Nothing in this crate is synchronized. The registry owns its pool, so a
//! single external lock around the registry is enough if it must be shared.
//!
//! ## Diagnostics
//!
//! Non-fatal conditions (double release, capacity exhaustion, truncated
//! snapshots) are reported through the [`log`] facade. Install any logger to
//! see them.

#![no_std]
#![warn(missing_docs)]
#![doc(html_root_url = "https://docs.rs/tinyscan/0.1.0")]

#[cfg(any(test, feature = "std"))]
extern crate std;

use core::fmt;

// Internal modules - use prelude for public API
mod backend;
mod registry;
mod utils;

/// Advertisement payloads and tracked device entries
pub mod record;

/// Time providers
pub mod clock;

/// Convenient re-exports for common use
///
/// ```
/// use tinyscan::prelude::*;
/// ```
pub mod prelude;

/// Returns the version string of the tinyscan crate
///
/// # Examples
///
/// ```
/// use tinyscan::version;
/// assert_eq!(version(), "0.1.0");
/// ```
pub fn version() -> &'static str {
    "0.1.0"
}

/// A handle to a block handed out by a [`BlockPool`]
///
/// Handles combine a slot index with a generation counter. Releasing a block
/// bumps its generation, so any copy of the old handle stops resolving.
///
/// # Examples
///
/// ```
/// use tinyscan::Handle;
///
/// let handle = Handle::new(5, 2);
/// let (slot, generation) = handle.parts();
/// assert_eq!(slot, 5);
/// assert_eq!(generation, 2);
/// ```
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct Handle {
    /// Slot index in the pool
    pub slot: u16,
    /// Generation counter for validity checking
    pub generation: u8,
}

impl Handle {
    /// Creates a new handle from a slot index and generation
    pub const fn new(slot: u16, generation: u8) -> Self {
        Self { slot, generation }
    }
    /// Returns the slot index and generation as a tuple
    pub const fn parts(&self) -> (u16, u8) {
        (self.slot, self.generation)
    }
}

/// Errors reported by a [`BlockPool`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PoolError {
    /// `init` called on a pool that is already initialized
    AlreadyInitialized,
    /// Operation requires an initialized pool
    Uninitialized,
    /// Requested block count is zero or larger than the backing region
    InvalidBlockCount {
        /// Requested number of blocks
        requested: usize,
        /// Blocks available in the backing region
        max: usize,
    },
    /// Handle does not name a slot of this pool
    InvalidHandle,
    /// Block was already released (or the handle is stale)
    DoubleRelease,
}

impl fmt::Display for PoolError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PoolError::AlreadyInitialized => f.write_str("block pool already initialized"),
            PoolError::Uninitialized => f.write_str("block pool not initialized"),
            PoolError::InvalidBlockCount { requested, max } => {
                write!(f, "invalid block count {requested} (1..={max})")
            }
            PoolError::InvalidHandle => f.write_str("handle does not belong to this pool"),
            PoolError::DoubleRelease => f.write_str("block released twice"),
        }
    }
}

#[cfg(feature = "std")]
impl std::error::Error for PoolError {}

/// Fixed-size block storage with O(1) hand-out and reclaim
///
/// The pool has an explicit lifecycle: nothing can be allocated until
/// [`init`](BlockPool::init) carves the backing region into blocks, and
/// [`reset`](BlockPool::reset) returns it to the uninitialized state.
///
/// # Examples
///
/// ```
/// use tinyscan::prelude::*;
///
/// let mut pool = FixedBlockPool::<[u8; 8], 2>::new();
/// pool.init(2).unwrap();
///
/// let a = pool.allocate(*b"deadbeef").unwrap();
/// let _b = pool.allocate([0; 8]).unwrap();
/// assert!(pool.allocate([1; 8]).is_none()); // exhausted
///
/// pool.release(a).unwrap();
/// assert!(pool.allocate([2; 8]).is_some());
/// ```
pub trait BlockPool<T> {
    /// Carves the backing region into `block_count` blocks and builds the free list
    ///
    /// Blocks are handed out in ascending slot order after initialization.
    ///
    /// # Errors
    ///
    /// - [`PoolError::AlreadyInitialized`] if called twice without a reset
    /// - [`PoolError::InvalidBlockCount`] if `block_count` is zero or too large
    fn init(&mut self, block_count: usize) -> Result<(), PoolError>;
    /// Pops a block off the free list and stores `value` in it
    ///
    /// Returns `None` when no blocks are free or the pool is uninitialized.
    fn allocate(&mut self, value: T) -> Option<Handle>;
    /// Gets a shared reference to an allocated block
    fn get(&self, handle: Handle) -> Option<&T>;
    /// Gets a mutable reference to an allocated block
    fn get_mut(&mut self, handle: Handle) -> Option<&mut T>;
    /// Pushes a block back onto the free list
    ///
    /// # Errors
    ///
    /// - [`PoolError::InvalidHandle`] if the slot is outside the pool
    /// - [`PoolError::DoubleRelease`] if the block is already free
    /// - [`PoolError::Uninitialized`] if the pool was never initialized
    ///
    /// A failed release never touches the free list.
    fn release(&mut self, handle: Handle) -> Result<(), PoolError>;
    /// Returns the pool to its uninitialized state, invalidating every handle
    fn reset(&mut self);
    /// Returns true once [`init`](BlockPool::init) has succeeded
    fn is_initialized(&self) -> bool;
    /// Returns the number of currently allocated blocks
    fn len(&self) -> usize;

    /// Returns true if no blocks are currently allocated
    fn is_empty(&self) -> bool {
        self.len() == 0
    }
    /// Returns the number of blocks carved by `init` (0 before)
    fn capacity(&self) -> usize;
    /// Returns the size of each block in bytes
    fn block_size(&self) -> usize;
    /// Counts free blocks by walking the free list
    fn free_count(&self) -> usize;
}
