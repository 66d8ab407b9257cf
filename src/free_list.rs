use crate::{
  Allocation, AllocationCounters, AllocatorKind, Block, BlockIndex, Candidate, FitStrategy,
  MemoryStats, OwnerId, Result, SimError, Span, SpanState,
};

/// A free block is only split when the leftover is at least this large;
/// smaller leftovers stay attached to the allocation as slack.
pub const MIN_SPLIT_THRESHOLD: usize = 32;

/// A block chain covering one arena, with blocks kept in a slot arena and
/// linked by index.
#[derive(Debug, Clone)]
pub struct FreeListAllocator {
  total_size: usize,
  slots: Vec<Block>,
  vacant: Vec<BlockIndex>,
  head: BlockIndex,
  strategy: FitStrategy,
  counters: AllocationCounters,
}

/// Walks a chain in address order, yielding each block with its offset.
pub struct Chain<'a> {
  slots: &'a [Block],
  cursor: Option<BlockIndex>,
  offset: usize,
}

impl<'a> Iterator for Chain<'a> {
  type Item = (BlockIndex, usize, &'a Block);

  fn next(&mut self) -> Option<Self::Item> {
    let index = self.cursor?;
    let block = &self.slots[index];
    let offset = self.offset;

    self.cursor = block.next;
    self.offset += block.size;

    Some((index, offset, block))
  }
}

impl FreeListAllocator {
  pub fn new(
    total_size: usize,
    strategy: FitStrategy,
  ) -> Result<Self> {
    if total_size == 0 {
      return Err(SimError::ZeroArena);
    }

    log::debug!("FreeListAllocator::new({total_size}, {})", strategy.name());

    Ok(Self {
      total_size,
      slots: vec![Block::new(total_size, true, None)],
      vacant: Vec::new(),
      head: 0,
      strategy,
      counters: AllocationCounters::default(),
    })
  }

  pub fn total_size(&self) -> usize {
    self.total_size
  }

  pub fn strategy(&self) -> FitStrategy {
    self.strategy
  }

  /// Swaps the selection rule; the chain and counters are kept.
  pub fn set_strategy(
    &mut self,
    strategy: FitStrategy,
  ) {
    log::debug!("FreeListAllocator::set_strategy({})", strategy.name());
    self.strategy = strategy;
  }

  pub fn counters(&self) -> AllocationCounters {
    self.counters
  }

  pub fn chain(&self) -> Chain<'_> {
    Chain {
      slots: &self.slots,
      cursor: Some(self.head),
      offset: 0,
    }
  }

  fn find_free_block(
    &self,
    size: usize,
  ) -> Option<Candidate> {
    let mut winner: Option<Candidate> = None;

    for (index, offset, block) in self.chain() {
      if !block.is_free || block.size < size {
        continue;
      }

      let challenger = Candidate {
        index,
        offset,
        size: block.size,
      };

      winner = Some(match winner {
        None => challenger,
        Some(incumbent) => self.strategy.choose(incumbent, challenger),
      });

      if self.strategy.settles_on_first() {
        break;
      }
    }

    winner
  }

  pub fn allocate(
    &mut self,
    size: usize,
    id: OwnerId,
  ) -> Option<Allocation> {
    if size == 0 {
      log::warn!("FreeListAllocator::allocate(0, {id}): zero-byte request rejected");
      self.counters.record_failure();
      return None;
    }

    let Some(candidate) = self.find_free_block(size) else {
      log::trace!("FreeListAllocator::allocate({size}, {id}) -> no fit");
      self.counters.record_failure();
      return None;
    };

    self.split(candidate.index, size);

    let block = &mut self.slots[candidate.index];
    block.claim(id, size);
    self.counters.record_success();

    log::trace!(
      "FreeListAllocator::allocate({size}, {id}) -> {:#x}..{:#x}",
      candidate.offset,
      candidate.offset + block.size
    );

    Some(Allocation {
      id,
      offset: candidate.offset,
      size: block.size,
      requested_size: size,
    })
  }

  fn split(
    &mut self,
    index: BlockIndex,
    size: usize,
  ) {
    let remainder = self.slots[index].size - size;
    if remainder < MIN_SPLIT_THRESHOLD {
      return;
    }

    let next = self.slots[index].next;
    let tail = self.acquire_slot(Block::new(remainder, true, next));

    let block = &mut self.slots[index];
    block.size = size;
    block.next = Some(tail);
  }

  fn acquire_slot(
    &mut self,
    block: Block,
  ) -> BlockIndex {
    match self.vacant.pop() {
      Some(index) => {
        self.slots[index] = block;
        index
      }
      None => {
        self.slots.push(block);
        self.slots.len() - 1
      }
    }
  }

  /// Frees the block owned by `id` and reports whether one was found. An
  /// id that owns nothing is ignored.
  pub fn deallocate(
    &mut self,
    id: OwnerId,
  ) -> bool {
    let found = self.chain().find(|(_, _, block)| block.is_owned_by(id));

    let Some((index, offset, _)) = found else {
      log::debug!("FreeListAllocator::deallocate({id}): no such allocation");
      return false;
    };

    log::trace!("FreeListAllocator::deallocate({id}) at {offset:#x}");
    self.slots[index].release();
    self.coalesce();
    true
  }

  /// Merges every run of adjacent free blocks into its first block.
  fn coalesce(&mut self) {
    let mut cursor = self.head;

    while let Some(next) = self.slots[cursor].next {
      if self.slots[cursor].is_free && self.slots[next].is_free {
        let absorbed = self.slots[next].clone();
        log::trace!("coalesce: absorbing slot {next} ({} bytes) into slot {cursor}", absorbed.size);

        let block = &mut self.slots[cursor];
        block.size += absorbed.size;
        block.next = absorbed.next;
        self.vacant.push(next);
      } else {
        cursor = next;
      }
    }
  }

  pub fn dump(&self) -> Vec<Span> {
    self
      .chain()
      .map(|(_, offset, block)| {
        let state = match block.owner {
          Some(id) if !block.is_free => SpanState::Used {
            id,
            requested: block.requested_size,
          },
          _ => SpanState::Free,
        };
        Span::new(offset, block.size, state)
      })
      .collect()
  }

  pub fn stats(&self) -> MemoryStats {
    MemoryStats::from_spans(AllocatorKind::from(self.strategy), self.total_size, &self.dump(), self.counters)
  }
}
