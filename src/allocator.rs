use crate::{
  Allocation, AllocationCounters, AllocatorKind, BuddyAllocator, BuddyConfig, FreeListAllocator,
  MemoryStats, OwnerId, Result, Span,
};

/// The active allocator: a fit-strategy block chain or a buddy system.
#[derive(Debug, Clone)]
pub enum Allocator {
  FreeList(FreeListAllocator),
  Buddy(BuddyAllocator),
}

impl Allocator {
  pub fn new(
    kind: AllocatorKind,
    total_size: usize,
    buddy: BuddyConfig,
  ) -> Result<Self> {
    match kind.fit_strategy() {
      Some(strategy) => FreeListAllocator::new(total_size, strategy).map(Allocator::FreeList),
      None => BuddyAllocator::new(total_size, buddy).map(Allocator::Buddy),
    }
  }

  pub fn kind(&self) -> AllocatorKind {
    match self {
      Allocator::FreeList(allocator) => allocator.strategy().into(),
      Allocator::Buddy(_) => AllocatorKind::Buddy,
    }
  }

  pub fn total_size(&self) -> usize {
    match self {
      Allocator::FreeList(allocator) => allocator.total_size(),
      Allocator::Buddy(allocator) => allocator.total_size(),
    }
  }

  pub fn counters(&self) -> AllocationCounters {
    match self {
      Allocator::FreeList(allocator) => allocator.counters(),
      Allocator::Buddy(allocator) => allocator.counters(),
    }
  }

  pub fn allocate(
    &mut self,
    size: usize,
    id: OwnerId,
  ) -> Option<Allocation> {
    match self {
      Allocator::FreeList(allocator) => allocator.allocate(size, id),
      Allocator::Buddy(allocator) => allocator.allocate(size, id),
    }
  }

  pub fn deallocate(
    &mut self,
    id: OwnerId,
  ) -> bool {
    match self {
      Allocator::FreeList(allocator) => allocator.deallocate(id),
      Allocator::Buddy(allocator) => allocator.deallocate(id),
    }
  }

  pub fn dump(&self) -> Vec<Span> {
    match self {
      Allocator::FreeList(allocator) => allocator.dump(),
      Allocator::Buddy(allocator) => allocator.dump(),
    }
  }

  pub fn stats(&self) -> MemoryStats {
    match self {
      Allocator::FreeList(allocator) => allocator.stats(),
      Allocator::Buddy(allocator) => allocator.stats(),
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn test_kind_dispatch() {
    let fit = Allocator::new(AllocatorKind::BestFit, 1024, BuddyConfig::default()).unwrap();
    let buddy = Allocator::new(AllocatorKind::Buddy, 1024, BuddyConfig::default()).unwrap();

    assert!(matches!(fit, Allocator::FreeList(_)));
    assert!(matches!(buddy, Allocator::Buddy(_)));
    assert_eq!(fit.kind(), AllocatorKind::BestFit);
    assert_eq!(buddy.kind(), AllocatorKind::Buddy);
  }

  #[test]
  fn test_same_request_different_engines() {
    let mut fit = Allocator::new(AllocatorKind::FirstFit, 1024, BuddyConfig::default()).unwrap();
    let mut buddy = Allocator::new(AllocatorKind::Buddy, 1024, BuddyConfig::default()).unwrap();

    assert_eq!(fit.allocate(100, 1).map(|block| block.size), Some(100));
    assert_eq!(buddy.allocate(100, 1).map(|block| block.size), Some(128));

    fit.deallocate(1);
    buddy.deallocate(1);

    assert_eq!(fit.stats().used, 0);
    assert_eq!(buddy.stats().used, 0);
    assert_eq!(fit.counters().successes, 1);
    assert_eq!(buddy.counters().requests, 1);
  }

  #[test]
  fn test_zero_arena_rejected() {
    for kind in [AllocatorKind::WorstFit, AllocatorKind::Buddy] {
      assert_eq!(
        Allocator::new(kind, 0, BuddyConfig::default()).unwrap_err(),
        crate::SimError::ZeroArena
      );
    }
  }
}
