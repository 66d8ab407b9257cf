use std::collections::{BTreeMap, VecDeque};

use crate::{
  Allocation, AllocationCounters, AllocatorKind, Block, MemoryStats, OwnerId, Result, SimError,
  Span, SpanState,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BuddyConfig {
  /// Return freed blocks to their free list and merge free buddies.
  /// When false, `deallocate` is a no-op and freed capacity is never
  /// reused.
  pub coalesce: bool,
}

impl Default for BuddyConfig {
  fn default() -> Self {
    Self { coalesce: true }
  }
}

/// Power-of-two allocator over the largest power-of-two prefix of the
/// arena. Free blocks live in one queue per order, used blocks in a map
/// keyed by offset.
#[derive(Debug, Clone)]
pub struct BuddyAllocator {
  total_size: usize,
  max_order: u32,
  free_lists: Vec<VecDeque<usize>>,
  used: BTreeMap<usize, Block>,
  config: BuddyConfig,
  counters: AllocationCounters,
}

fn floor_log2(value: usize) -> u32 {
  usize::BITS - 1 - value.leading_zeros()
}

impl BuddyAllocator {
  pub fn new(
    total_size: usize,
    config: BuddyConfig,
  ) -> Result<Self> {
    if total_size == 0 {
      return Err(SimError::ZeroArena);
    }

    let max_order = floor_log2(total_size);
    let mut free_lists = vec![VecDeque::new(); max_order as usize + 1];
    free_lists[max_order as usize].push_back(0);

    log::debug!(
      "BuddyAllocator::new({total_size}): max_order={max_order}, managed={}, coalesce={}",
      1usize << max_order,
      config.coalesce
    );

    Ok(Self {
      total_size,
      max_order,
      free_lists,
      used: BTreeMap::new(),
      config,
      counters: AllocationCounters::default(),
    })
  }

  pub fn total_size(&self) -> usize {
    self.total_size
  }

  /// Bytes the buddy tree covers: `2^max_order`.
  pub fn managed_size(&self) -> usize {
    1 << self.max_order
  }

  pub fn max_order(&self) -> u32 {
    self.max_order
  }

  pub fn counters(&self) -> AllocationCounters {
    self.counters
  }

  /// Number of free blocks currently queued at `order`.
  pub fn free_blocks(
    &self,
    order: u32,
  ) -> usize {
    self.free_lists.get(order as usize).map_or(0, VecDeque::len)
  }

  pub fn allocate(
    &mut self,
    size: usize,
    id: OwnerId,
  ) -> Option<Allocation> {
    if size == 0 {
      log::warn!("BuddyAllocator::allocate(0, {id}): zero-byte request rejected");
      self.counters.record_failure();
      return None;
    }

    let order = size.checked_next_power_of_two().map(|block| block.trailing_zeros());

    let found = order.filter(|order| *order <= self.max_order).and_then(|order| {
      (order..=self.max_order)
        .find(|level| !self.free_lists[*level as usize].is_empty())
        .map(|level| (order, level))
    });

    let Some((order, mut level)) = found else {
      log::trace!("BuddyAllocator::allocate({size}, {id}) -> no block");
      self.counters.record_failure();
      return None;
    };

    let offset = self.free_lists[level as usize].pop_front()?;

    while level > order {
      level -= 1;
      let buddy = offset + (1 << level);
      log::trace!("BuddyAllocator: split order {} at {offset:#x}, buddy {buddy:#x}", level + 1);
      self.free_lists[level as usize].push_back(buddy);
    }

    let block_size = 1usize << order;
    let mut block = Block::new(block_size, false, None);
    block.claim(id, size);
    self.used.insert(offset, block);
    self.counters.record_success();

    log::trace!("BuddyAllocator::allocate({size}, {id}) -> {offset:#x} (order {order})");

    Some(Allocation {
      id,
      offset,
      size: block_size,
      requested_size: size,
    })
  }

  /// Releases the block owned by `id` and reports whether one was
  /// released. Unknown ids are ignored, and with `coalesce` disabled every
  /// call is ignored.
  pub fn deallocate(
    &mut self,
    id: OwnerId,
  ) -> bool {
    if !self.config.coalesce {
      log::debug!("BuddyAllocator::deallocate({id}): coalescing disabled, block retained");
      return false;
    }

    let found = self.used.iter().find(|(_, block)| block.is_owned_by(id)).map(|(offset, block)| (*offset, block.size));

    let Some((mut offset, size)) = found else {
      log::debug!("BuddyAllocator::deallocate({id}): no such allocation");
      return false;
    };

    self.used.remove(&offset);
    let mut order = floor_log2(size);

    while order < self.max_order {
      let buddy = offset ^ (1 << order);
      let list = &mut self.free_lists[order as usize];

      let Some(position) = list.iter().position(|candidate| *candidate == buddy) else {
        break;
      };

      list.remove(position);
      log::trace!("BuddyAllocator: merge {offset:#x} with buddy {buddy:#x} at order {order}");
      offset = offset.min(buddy);
      order += 1;
    }

    self.free_lists[order as usize].push_back(offset);
    true
  }

  pub fn dump(&self) -> Vec<Span> {
    let free = self.free_lists.iter().enumerate().flat_map(|(order, list)| {
      list.iter().map(move |offset| Span::new(*offset, 1 << order, SpanState::Free))
    });

    let used = self.used.iter().map(|(offset, block)| {
      let state = SpanState::Used {
        id: block.owner.unwrap_or_default(),
        requested: block.requested_size,
      };
      Span::new(*offset, block.size, state)
    });

    let mut spans: Vec<Span> = free.chain(used).collect();
    spans.sort_by_key(|span| span.start);
    spans
  }

  pub fn stats(&self) -> MemoryStats {
    MemoryStats::from_spans(AllocatorKind::Buddy, self.total_size, &self.dump(), self.counters)
  }
}
