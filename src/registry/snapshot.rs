//! Read-only views over the registry
//!
//! Both views borrow the registry, so they always reflect its state at the
//! time they are taken. Copy the entries out to keep a stable picture.

use super::Node;
use crate::backend::fixedpool::FixedBlockPool;
use crate::record::TrackedDevice;
use crate::{BlockPool, Handle};

/// Devices ordered by descending signal strength
///
/// Fixed capacity `N`; entries with equal strength keep their recency order.
pub type SignalRanking<'a, const N: usize> = heapless::Vec<&'a TrackedDevice, N>;

/// Walks the recency list front to back, yielding each node with its handle
pub(super) struct Links<'a, const N: usize> {
    pool: &'a FixedBlockPool<Node, N>,
    cursor: Option<Handle>,
    remaining: usize,
}

impl<'a, const N: usize> Links<'a, N> {
    pub(super) fn new(pool: &'a FixedBlockPool<Node, N>, head: Option<Handle>) -> Self {
        Self {
            pool,
            cursor: head,
            // A well-formed list never holds more nodes than the pool has blocks
            remaining: pool.capacity(),
        }
    }
}

impl<'a, const N: usize> Iterator for Links<'a, N> {
    type Item = (Handle, &'a Node);

    fn next(&mut self) -> Option<Self::Item> {
        if self.remaining == 0 {
            return None;
        }
        let handle = self.cursor?;
        let node = self.pool.get(handle)?;

        self.cursor = node.next;
        self.remaining -= 1;
        Some((handle, node))
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (0, Some(self.remaining))
    }
}

/// Devices from most to least recently seen
///
/// Returned by [`DeviceRegistry::snapshot_by_recency`](super::DeviceRegistry::snapshot_by_recency).
pub struct Recency<'a, const N: usize> {
    links: Links<'a, N>,
}

impl<'a, const N: usize> Recency<'a, N> {
    pub(super) fn new(links: Links<'a, N>) -> Self {
        Self { links }
    }
}

impl<'a, const N: usize> Iterator for Recency<'a, N> {
    type Item = &'a TrackedDevice;

    #[inline]
    fn next(&mut self) -> Option<Self::Item> {
        self.links.next().map(|(_, node)| &node.device)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.links.size_hint()
    }
}

/// Stable insertion sort of `devices` into a ranking of at most `N` entries
///
/// `devices` must arrive in recency order; ties then stay in recency order
/// because an entry only moves past strictly weaker neighbours.
pub(super) fn rank_by_signal_strength<'a, const N: usize>(
    devices: impl Iterator<Item = &'a TrackedDevice>,
    live: usize,
) -> SignalRanking<'a, N> {
    let mut ranked: SignalRanking<'a, N> = heapless::Vec::new();

    for device in devices {
        if ranked.push(device).is_err() {
            log::warn!("signal ranking truncated to {} of {} devices", N, live);
            break;
        }

        let mut j = ranked.len() - 1;
        while j > 0 && ranked[j].signal_strength() > ranked[j - 1].signal_strength() {
            ranked.swap(j, j - 1);
            j -= 1;
        }
    }

    ranked
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::record::AdvertisementRecord;
    use pretty_assertions::assert_eq;
    use std::vec::Vec;

    fn device(id: u32, rssi: u8) -> TrackedDevice {
        TrackedDevice {
            record: AdvertisementRecord::new(id).with_signal_strength(rssi),
            last_seen: u64::from(id),
        }
    }

    fn ids(ranked: &[&TrackedDevice]) -> Vec<u32> {
        ranked.iter().map(|d| d.device_id()).collect()
    }

    #[test]
    fn test_rank_descending_and_stable() {
        let devices = [device(1, 10), device(2, 30), device(3, 30), device(4, 5)];
        let ranked = rank_by_signal_strength::<8>(devices.iter(), devices.len());
        assert_eq!(ids(&ranked), [2, 3, 1, 4]);
    }

    #[test]
    fn test_rank_all_equal_keeps_input_order() {
        let devices = [device(9, 50), device(4, 50), device(7, 50)];
        let ranked = rank_by_signal_strength::<4>(devices.iter(), devices.len());
        assert_eq!(ids(&ranked), [9, 4, 7]);
    }

    #[test]
    fn test_rank_empty() {
        let ranked = rank_by_signal_strength::<4>(core::iter::empty(), 0);
        assert!(ranked.is_empty());
    }

    #[test]
    fn test_rank_truncates_instead_of_overflowing() {
        let devices = [device(1, 1), device(2, 200), device(3, 100)];
        let ranked = rank_by_signal_strength::<2>(devices.iter(), devices.len());

        // Only the first two in recency order are ranked
        assert_eq!(ids(&ranked), [2, 1]);
    }
}
