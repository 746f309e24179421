use core::fmt;

use crate::{BlockPool, Handle, PoolError};

const NONE_SLOT: u16 = u16::MAX;

/// Metadata for each slot in the pool
#[derive(Clone, Copy)]
struct SlotMeta {
    generation: u8,
    in_use: bool,
    next_free: u16, // next free slot index, NONE_SLOT terminates the list
}

impl SlotMeta {
    const VACANT: Self = Self {
        generation: 0,
        in_use: false,
        next_free: NONE_SLOT,
    };
}

#[derive(Clone, Copy)]
struct Slot<T> {
    meta: SlotMeta,
    value: T,
}

/// Fixed-size block pool with generation-tracked handles
///
/// T: block contents, one value per block
/// BLOCKS: size of the backing region in blocks (must be < 65535)
///
/// The region is allocated inline with the pool. `init` decides how many of
/// the `BLOCKS` slots are actually handed out.
pub struct FixedBlockPool<T, const BLOCKS: usize> {
    slots: [Slot<T>; BLOCKS],
    block_count: u16,
    free_head: u16,
    used_count: u16,
    initialized: bool,
}

/// Snapshot of a pool's bookkeeping, for tests and debug dumps
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PoolDiagnostics {
    /// Size of one block in bytes
    pub block_size: usize,
    /// Blocks carved by `init`
    pub block_count: usize,
    /// Slot at the head of the free list
    pub free_head: Option<u16>,
    /// Free blocks counted by walking the free list
    pub free_blocks: usize,
    /// Blocks currently handed out
    pub in_use: usize,
}

impl fmt::Display for PoolDiagnostics {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Fixed pool: size: {} count: {} in use: {} ",
            self.block_size, self.block_count, self.in_use
        )?;
        match self.free_head {
            Some(slot) => write!(f, "free head: {slot} ")?,
            None => f.write_str("free head: none ")?,
        }
        write!(f, "free by walking: {}", self.free_blocks)
    }
}

/// State of one carved block, as yielded by [`FixedBlockPool::blocks`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BlockInfo {
    /// Slot index
    pub slot: u16,
    /// Whether the block is handed out
    pub in_use: bool,
    /// Current generation of the slot
    pub generation: u8,
    /// Next slot in the free list; `None` for allocated blocks and the list end
    pub next_free: Option<u16>,
}

impl fmt::Display for BlockInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = if self.in_use { "in use" } else { "free" };
        write!(f, "block[{}]: {} gen {} ", self.slot, state, self.generation)?;
        match self.next_free {
            Some(slot) => write!(f, "next free: {slot}"),
            None => f.write_str("next free: none"),
        }
    }
}

impl<T: Copy + Default, const BLOCKS: usize> FixedBlockPool<T, BLOCKS> {
    // Compile-time assertion: slot indices must fit in u16 with room for NONE_SLOT
    const _ASSERT_BLOCKS_FIT_U16: () = assert!(
        BLOCKS < NONE_SLOT as usize,
        "BLOCKS must be < 65535 to fit in u16 metadata"
    );

    /// Creates an uninitialized pool; call [`BlockPool::init`] before allocating
    pub fn new() -> Self {
        let () = Self::_ASSERT_BLOCKS_FIT_U16;

        Self {
            slots: [Slot {
                meta: SlotMeta::VACANT,
                value: T::default(),
            }; BLOCKS],
            block_count: 0,
            free_head: NONE_SLOT,
            used_count: 0,
            initialized: false,
        }
    }

    /// Creates a pool and initializes it with every slot of the region
    pub fn with_all_blocks() -> Self {
        let mut pool = Self::new();
        pool.build_free_list(BLOCKS as u16);
        pool
    }

    /// Returns the current bookkeeping state
    pub fn diagnostics(&self) -> PoolDiagnostics {
        PoolDiagnostics {
            block_size: self.block_size(),
            block_count: self.block_count as usize,
            free_head: (self.free_head != NONE_SLOT).then_some(self.free_head),
            free_blocks: self.free_count(),
            in_use: self.used_count as usize,
        }
    }

    /// Per-block link dump over the carved blocks, in slot order
    pub fn blocks(&self) -> impl Iterator<Item = BlockInfo> + '_ {
        self.slots[..self.block_count as usize]
            .iter()
            .enumerate()
            .map(|(slot, entry)| BlockInfo {
                slot: slot as u16,
                in_use: entry.meta.in_use,
                generation: entry.meta.generation,
                next_free: (entry.meta.next_free != NONE_SLOT).then_some(entry.meta.next_free),
            })
    }

    fn build_free_list(&mut self, count: u16) {
        // Link slots in ascending order so allocation order follows slot order
        for i in 0..count {
            let meta = &mut self.slots[i as usize].meta;
            meta.in_use = false;
            meta.next_free = if i + 1 < count { i + 1 } else { NONE_SLOT };
        }
        self.block_count = count;
        self.free_head = if count > 0 { 0 } else { NONE_SLOT };
        self.used_count = 0;
        self.initialized = true;
    }

    /// Resolves a handle to a live slot index
    #[inline]
    fn live_slot(&self, handle: Handle) -> Result<usize, PoolError> {
        if !self.initialized {
            return Err(PoolError::Uninitialized);
        }

        let slot = handle.slot as usize;
        if slot >= self.block_count as usize {
            return Err(PoolError::InvalidHandle);
        }

        // Stale generation or free slot both mean the block was already released
        let meta = &self.slots[slot].meta;
        if !meta.in_use || meta.generation != handle.generation {
            return Err(PoolError::DoubleRelease);
        }

        Ok(slot)
    }
}

impl<T: Copy + Default, const BLOCKS: usize> Default for FixedBlockPool<T, BLOCKS> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: Copy + Default, const BLOCKS: usize> BlockPool<T> for FixedBlockPool<T, BLOCKS> {
    fn init(&mut self, block_count: usize) -> Result<(), PoolError> {
        if self.initialized {
            return Err(PoolError::AlreadyInitialized);
        }
        if block_count == 0 || block_count > BLOCKS {
            return Err(PoolError::InvalidBlockCount {
                requested: block_count,
                max: BLOCKS,
            });
        }

        self.build_free_list(block_count as u16);
        Ok(())
    }

    fn allocate(&mut self, value: T) -> Option<Handle> {
        if !self.initialized {
            log::warn!("allocate on uninitialized block pool");
            return None;
        }

        if self.free_head == NONE_SLOT {
            return None;
        }

        // Pop from free list
        let slot = self.free_head;
        let entry = &mut self.slots[slot as usize];
        self.free_head = entry.meta.next_free;

        entry.meta.next_free = NONE_SLOT;
        entry.meta.in_use = true;
        entry.value = value;

        self.used_count += 1;
        Some(Handle::new(slot, entry.meta.generation))
    }

    fn get(&self, handle: Handle) -> Option<&T> {
        let slot = self.live_slot(handle).ok()?;
        Some(&self.slots[slot].value)
    }

    fn get_mut(&mut self, handle: Handle) -> Option<&mut T> {
        let slot = self.live_slot(handle).ok()?;
        Some(&mut self.slots[slot].value)
    }

    fn release(&mut self, handle: Handle) -> Result<(), PoolError> {
        let slot = match self.live_slot(handle) {
            Ok(slot) => slot,
            Err(err) => {
                log::warn!(
                    "release of slot {} gen {} refused: {}",
                    handle.slot,
                    handle.generation,
                    err
                );
                return Err(err);
            }
        };

        let meta = &mut self.slots[slot].meta;

        // Increment generation to invalidate old handles
        meta.generation = meta.generation.wrapping_add(1);
        meta.in_use = false;

        // Push to free list
        meta.next_free = self.free_head;
        self.free_head = slot as u16;

        self.used_count -= 1;
        Ok(())
    }

    fn reset(&mut self) {
        for slot in &mut self.slots {
            slot.meta.generation = slot.meta.generation.wrapping_add(1);
            slot.meta.in_use = false;
            slot.meta.next_free = NONE_SLOT;
        }

        self.block_count = 0;
        self.free_head = NONE_SLOT;
        self.used_count = 0;
        self.initialized = false;
    }

    fn is_initialized(&self) -> bool {
        self.initialized
    }

    fn len(&self) -> usize {
        self.used_count as usize
    }

    fn capacity(&self) -> usize {
        self.block_count as usize
    }

    fn block_size(&self) -> usize {
        core::mem::size_of::<T>()
    }

    fn free_count(&self) -> usize {
        let mut count = 0;
        let mut cursor = self.free_head;
        // Bounded by block_count so a corrupted list cannot spin forever
        while cursor != NONE_SLOT && count < self.block_count as usize {
            count += 1;
            cursor = self.slots[cursor as usize].meta.next_free;
        }
        count
    }
}
