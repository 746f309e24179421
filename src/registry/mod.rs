//! Bounded registry of recently seen devices
//!
//! `DeviceRegistry` keeps one entry per `device_id` in a doubly linked list
//! ordered by recency, most recent at the front. The list nodes live in a
//! [`FixedBlockPool`] owned by the registry and link to each other by
//! [`Handle`], so the whole registry is a single fixed-size value.
//!
//! # Examples
//!
//! ```
//! use tinyscan::prelude::*;
//!
//! let mut registry = DeviceRegistry::<32>::with_capacity(3).unwrap();
//!
//! for (id, ts) in [(1, 100), (2, 200), (3, 300), (1, 400)] {
//!     registry.observe(&AdvertisementRecord::new(id), ts);
//! }
//! let order: Vec<u32> = registry.snapshot_by_recency().map(|d| d.device_id()).collect();
//! assert_eq!(order, [1, 3, 2]);
//!
//! // Full: the least recently seen device makes room
//! let outcome = registry.observe(&AdvertisementRecord::new(4), 500);
//! assert_eq!(outcome, Observation::Inserted { evicted: Some(2) });
//! ```

use core::fmt;

use crate::backend::fixedpool::{BlockInfo, FixedBlockPool, PoolDiagnostics};
use crate::clock::Clock;
use crate::record::{AdvertisementRecord, TrackedDevice};
use crate::{BlockPool, Handle, PoolError};

mod snapshot;

use snapshot::{Links, rank_by_signal_strength};
pub use snapshot::{Recency, SignalRanking};

/// Capacity used when none is given
pub const DEFAULT_CAPACITY: usize = 32;

/// List node stored in one pool block
#[derive(Clone, Copy, Default)]
pub(crate) struct Node {
    device: TrackedDevice,
    prev: Option<Handle>,
    next: Option<Handle>,
}

impl Node {
    fn new(device: TrackedDevice) -> Self {
        Self {
            device,
            prev: None,
            next: None,
        }
    }
}

/// What [`DeviceRegistry::observe`] did with an advertisement
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Observation {
    /// First sighting; `evicted` names the device pushed out to make room
    ///
    /// Only the first eviction of the call is reported. Extra evictions made
    /// while recovering from an over-full registry or an exhausted pool are
    /// logged at `debug` level and not listed here.
    Inserted {
        /// Least recently seen device that was dropped, if the registry was full
        evicted: Option<u32>,
    },
    /// Known device moved to the front with fresh data
    Refreshed,
    /// No block could be found for the device; the event was ignored
    Dropped,
}

/// Errors constructing a registry
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RegistryError {
    /// Capacity is zero or larger than the backing region
    InvalidCapacity {
        /// Requested capacity
        requested: usize,
        /// Largest capacity the registry type supports
        max: usize,
    },
    /// The backing pool refused to initialize
    Pool(PoolError),
}

impl fmt::Display for RegistryError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RegistryError::InvalidCapacity { requested, max } => {
                write!(f, "invalid registry capacity {requested} (1..={max})")
            }
            RegistryError::Pool(err) => write!(f, "block pool: {err}"),
        }
    }
}

impl From<PoolError> for RegistryError {
    fn from(err: PoolError) -> Self {
        RegistryError::Pool(err)
    }
}

#[cfg(feature = "std")]
impl std::error::Error for RegistryError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            RegistryError::Pool(err) => Some(err),
            RegistryError::InvalidCapacity { .. } => None,
        }
    }
}

/// The most recently seen devices, at most `N` of them
///
/// N: size of the backing region in devices (default 32)
///
/// Not synchronized. Wrap the whole registry in one lock if it has to be
/// shared; the pool inside is never reachable on its own.
pub struct DeviceRegistry<const N: usize = { DEFAULT_CAPACITY }> {
    pool: FixedBlockPool<Node, N>,
    head: Option<Handle>, // most recently seen
    tail: Option<Handle>, // least recently seen
    len: usize,
    capacity: usize,
}

impl<const N: usize> DeviceRegistry<N> {
    const _ASSERT_CAPACITY_NONZERO: () = assert!(N > 0, "registry capacity must be non-zero");

    /// Creates an empty registry holding up to `N` devices
    pub fn new() -> Self {
        let () = Self::_ASSERT_CAPACITY_NONZERO;

        Self {
            pool: FixedBlockPool::with_all_blocks(),
            head: None,
            tail: None,
            len: 0,
            capacity: N,
        }
    }

    /// Creates an empty registry holding up to `capacity` devices
    ///
    /// # Errors
    ///
    /// [`RegistryError::InvalidCapacity`] unless `1 <= capacity <= N`.
    pub fn with_capacity(capacity: usize) -> Result<Self, RegistryError> {
        if capacity == 0 || capacity > N {
            return Err(RegistryError::InvalidCapacity {
                requested: capacity,
                max: N,
            });
        }

        let mut pool = FixedBlockPool::<Node, N>::new();
        pool.init(capacity)?;

        Ok(Self {
            pool,
            head: None,
            tail: None,
            len: 0,
            capacity,
        })
    }

    /// Number of tracked devices
    #[inline]
    pub fn len(&self) -> usize {
        self.len
    }

    /// Returns true if no devices are tracked
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Most devices tracked at once
    #[inline]
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Bookkeeping of the backing pool
    pub fn pool_diagnostics(&self) -> PoolDiagnostics {
        self.pool.diagnostics()
    }

    /// Per-block state of the backing pool, in slot order
    pub fn pool_blocks(&self) -> impl Iterator<Item = BlockInfo> + '_ {
        self.pool.blocks()
    }

    /// Records one advertisement seen at `now` (milliseconds)
    ///
    /// A known device is moved to the front with the new record and
    /// timestamp. An unknown device is inserted at the front, evicting the
    /// least recently seen device first if the registry is full. Only that
    /// first eviction is reported; evictions forced by the over-capacity guard
    /// or by an exhausted pool are logged at `debug` level.
    ///
    /// Runs in O(len): finding a known device is a linear scan.
    pub fn observe(&mut self, record: &AdvertisementRecord, now: u64) -> Observation {
        if let Some(handle) = self.find(record.device_id) {
            self.unlink(handle);
            if let Some(node) = self.pool.get_mut(handle) {
                node.device.record = *record;
                node.device.last_seen = now;
            }
            self.push_front(handle);

            log::trace!(
                "refreshed device {} rssi {} at {}",
                record.device_id,
                record.signal_strength,
                now
            );
            return Observation::Refreshed;
        }

        while self.len > self.capacity {
            log::warn!("device count {} above capacity {}", self.len, self.capacity);
            if self.evict_back().is_none() {
                break;
            }
        }

        let mut evicted = None;
        if self.len == self.capacity {
            evicted = self.evict_back();
        }

        let node = Node::new(TrackedDevice {
            record: *record,
            last_seen: now,
        });
        let handle = match self.pool.allocate(node) {
            Some(handle) => handle,
            None => {
                log::warn!(
                    "block pool exhausted with {} of {} devices tracked",
                    self.len,
                    self.capacity
                );
                // Make room by force and retry once
                match self.evict_back() {
                    Some(id) => evicted = evicted.or(Some(id)),
                    None => return Observation::Dropped,
                }
                match self.pool.allocate(node) {
                    Some(handle) => handle,
                    None => return Observation::Dropped,
                }
            }
        };
        self.push_front(handle);

        log::trace!(
            "inserted device {} rssi {} at {}",
            record.device_id,
            record.signal_strength,
            now
        );
        Observation::Inserted { evicted }
    }

    /// Records one advertisement, stamped with `clock`
    pub fn observe_with<C: Clock + ?Sized>(
        &mut self,
        record: &AdvertisementRecord,
        clock: &C,
    ) -> Observation {
        self.observe(record, clock.now_ms())
    }

    /// Tracked devices from most to least recently seen
    ///
    /// Lazy: entries are read from the registry as the iterator advances.
    pub fn snapshot_by_recency(&self) -> Recency<'_, N> {
        Recency::new(self.links())
    }

    /// Tracked devices by descending signal strength
    ///
    /// Devices with equal strength appear in recency order. O(len^2), which
    /// is fine for a human-facing table refreshed every few seconds.
    pub fn snapshot_by_signal_strength(&self) -> SignalRanking<'_, N> {
        rank_by_signal_strength(self.snapshot_by_recency(), self.len)
    }

    /// Looks up a device by id
    pub fn get(&self, device_id: u32) -> Option<&TrackedDevice> {
        self.links()
            .find(|(_, node)| node.device.device_id() == device_id)
            .map(|(_, node)| &node.device)
    }

    /// Returns true if `device_id` is tracked
    pub fn contains(&self, device_id: u32) -> bool {
        self.find(device_id).is_some()
    }

    /// Forgets every device and returns all blocks to the pool
    pub fn clear(&mut self) {
        while let Some(handle) = self.pop_back() {
            // A refused release is already logged by the pool
            let _ = self.pool.release(handle);
        }
        self.head = None;
        self.tail = None;
        self.len = 0;
    }

    /* ---- Internal helpers ---- */

    fn links(&self) -> Links<'_, N> {
        Links::new(&self.pool, self.head)
    }

    fn find(&self, device_id: u32) -> Option<Handle> {
        self.links()
            .find(|(_, node)| node.device.device_id() == device_id)
            .map(|(handle, _)| handle)
    }

    /// Detaches a node, leaving its block allocated
    fn unlink(&mut self, handle: Handle) {
        let Some(node) = self.pool.get_mut(handle) else {
            log::warn!("dangling registry link to slot {}", handle.slot);
            self.drop_list();
            return;
        };
        let prev = node.prev.take();
        let next = node.next.take();

        match prev {
            Some(p) => {
                if let Some(node) = self.pool.get_mut(p) {
                    node.next = next;
                }
            }
            None => self.head = next,
        }
        match next {
            Some(n) => {
                if let Some(node) = self.pool.get_mut(n) {
                    node.prev = prev;
                }
            }
            None => self.tail = prev,
        }

        self.len = self.len.saturating_sub(1);
    }

    fn push_front(&mut self, handle: Handle) {
        let old_head = self.head;
        match self.pool.get_mut(handle) {
            Some(node) => {
                node.prev = None;
                node.next = old_head;
            }
            None => return,
        }

        match old_head {
            Some(h) => {
                if let Some(node) = self.pool.get_mut(h) {
                    node.prev = Some(handle);
                }
            }
            None => self.tail = Some(handle),
        }
        self.head = Some(handle);
        self.len += 1;
    }

    fn pop_back(&mut self) -> Option<Handle> {
        let tail = self.tail?;
        self.unlink(tail);
        Some(tail)
    }

    /// Drops the least recently seen device, returning its id
    fn evict_back(&mut self) -> Option<u32> {
        let handle = self.pop_back()?;
        let device_id = self.pool.get(handle).map(|node| node.device.device_id());
        if self.pool.release(handle).is_ok() {
            log::debug!("evicted device {:?}", device_id);
        }
        device_id
    }

    /// Abandons the list after corruption; blocks come back on the next reset
    fn drop_list(&mut self) {
        self.head = None;
        self.tail = None;
        self.len = 0;
        self.pool.reset();
        // Same count that succeeded before, so this cannot fail
        let _ = self.pool.init(self.capacity);
    }
}

impl<const N: usize> Default for DeviceRegistry<N> {
    fn default() -> Self {
        Self::new()
    }
}

impl<'a, const N: usize> IntoIterator for &'a DeviceRegistry<N> {
    type Item = &'a TrackedDevice;
    type IntoIter = Recency<'a, N>;

    fn into_iter(self) -> Self::IntoIter {
        self.snapshot_by_recency()
    }
}

impl<const N: usize> fmt::Debug for DeviceRegistry<N> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        struct Ids<'a, const N: usize>(&'a DeviceRegistry<N>);

        impl<const N: usize> fmt::Debug for Ids<'_, N> {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.debug_list()
                    .entries(self.0.snapshot_by_recency().map(TrackedDevice::device_id))
                    .finish()
            }
        }

        f.debug_struct("DeviceRegistry")
            .field("len", &self.len)
            .field("capacity", &self.capacity)
            .field("devices", &Ids(self))
            .finish()
    }
}
