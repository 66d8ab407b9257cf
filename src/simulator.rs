use crate::{
  Allocation, Allocator, AllocatorKind, BuddyConfig, CacheReport, MemoryStats, OwnerId, Result,
  SimError, Span,
  cache::{AccessKind, CacheConfig, CacheHierarchy, HierarchyOutcome, ReplacementPolicy},
};

/// One simulated machine: an arena with its allocator, and a cache
/// hierarchy. The two halves are independent; callers decide which
/// addresses to push through the caches.
#[derive(Debug, Clone, Default)]
pub struct Simulator {
  allocator: Option<Allocator>,
  kind: AllocatorKind,
  buddy: BuddyConfig,
  caches: CacheHierarchy,
}

impl Simulator {
  pub fn new() -> Self {
    Self::default()
  }

  /// Starts without an arena; the next [`Simulator::init`] builds one
  /// with `kind`.
  pub fn with_config(
    kind: AllocatorKind,
    buddy: BuddyConfig,
  ) -> Self {
    Self {
      kind,
      buddy,
      ..Self::default()
    }
  }

  /// (Re)builds the arena as one free block using the selected allocator.
  /// Previous allocations and counters are discarded.
  pub fn init(
    &mut self,
    arena_size: usize,
  ) -> Result<()> {
    let allocator = Allocator::new(self.kind, arena_size, self.buddy)?;
    log::debug!("Simulator::init({arena_size}) with {}", self.kind);
    self.allocator = Some(allocator);
    Ok(())
  }

  pub fn is_initialized(&self) -> bool {
    self.allocator.is_some()
  }

  pub fn arena_size(&self) -> Option<usize> {
    self.allocator.as_ref().map(Allocator::total_size)
  }

  pub fn strategy(&self) -> AllocatorKind {
    self.kind
  }

  pub fn buddy_config(&self) -> BuddyConfig {
    self.buddy
  }

  /// Selects the allocator. Moving between fit strategies keeps the
  /// current chain; moving to or from the buddy system starts a fresh
  /// arena of the same size.
  pub fn set_strategy(
    &mut self,
    kind: AllocatorKind,
  ) -> Result<()> {
    let allocator = self.allocator.as_mut().ok_or(SimError::MemoryNotInitialized)?;

    match (allocator, kind.fit_strategy()) {
      (Allocator::FreeList(free_list), Some(strategy)) => free_list.set_strategy(strategy),
      (allocator, _) => {
        let total_size = allocator.total_size();
        *allocator = Allocator::new(kind, total_size, self.buddy)?;
      }
    }

    log::debug!("Simulator::set_strategy({kind})");
    self.kind = kind;
    Ok(())
  }

  fn allocator_mut(&mut self) -> Result<&mut Allocator> {
    self.allocator.as_mut().ok_or(SimError::MemoryNotInitialized)
  }

  fn allocator(&self) -> Result<&Allocator> {
    self.allocator.as_ref().ok_or(SimError::MemoryNotInitialized)
  }

  /// `Ok(None)` means the request did not fit; it is counted as a failure.
  pub fn allocate(
    &mut self,
    size: usize,
    id: OwnerId,
  ) -> Result<Option<Allocation>> {
    Ok(self.allocator_mut()?.allocate(size, id))
  }

  /// Frees the allocation owned by `id`. `Ok(false)` means nothing was
  /// released: the id owns nothing, or buddy merging is disabled.
  pub fn deallocate(
    &mut self,
    id: OwnerId,
  ) -> Result<bool> {
    Ok(self.allocator_mut()?.deallocate(id))
  }

  pub fn dump(&self) -> Result<Vec<Span>> {
    Ok(self.allocator()?.dump())
  }

  pub fn stats(&self) -> Result<MemoryStats> {
    Ok(self.allocator()?.stats())
  }

  pub fn init_cache(
    &mut self,
    level: usize,
    size: usize,
    block_size: usize,
    associativity: usize,
    policy: ReplacementPolicy,
  ) -> Result<()> {
    self.caches.configure(
      level,
      CacheConfig {
        size,
        block_size,
        associativity,
        policy,
      },
    )
  }

  pub fn access(
    &mut self,
    address: u64,
  ) -> HierarchyOutcome {
    self.caches.access(address)
  }

  pub fn access_with(
    &mut self,
    address: u64,
    kind: AccessKind,
  ) -> HierarchyOutcome {
    self.caches.access_with(address, kind)
  }

  pub fn report(
    &self,
    level: usize,
  ) -> Result<CacheReport> {
    self.caches.report(level)
  }

  pub fn caches(&self) -> &CacheHierarchy {
    &self.caches
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::SpanState;

  #[test]
  fn test_requires_init() {
    let mut simulator = Simulator::new();

    assert_eq!(simulator.allocate(10, 1), Err(SimError::MemoryNotInitialized));
    assert_eq!(simulator.deallocate(1), Err(SimError::MemoryNotInitialized));
    assert_eq!(simulator.set_strategy(AllocatorKind::Buddy), Err(SimError::MemoryNotInitialized));
    assert!(simulator.stats().is_err());
    assert_eq!(simulator.init(0), Err(SimError::ZeroArena));
  }

  #[test]
  fn test_init_resets_chain_and_counters() {
    let mut simulator = Simulator::new();
    simulator.init(1024).unwrap();
    simulator.allocate(100, 1).unwrap().unwrap();
    assert!(simulator.allocate(4096, 2).unwrap().is_none());

    simulator.init(2048).unwrap();

    let stats = simulator.stats().unwrap();
    assert_eq!(stats.total, 2048);
    assert_eq!(stats.used, 0);
    assert_eq!(stats.requests, 0);
    assert_eq!(simulator.dump().unwrap(), vec![Span::new(0, 2048, SpanState::Free)]);
  }

  #[test]
  fn test_fit_switch_keeps_chain() {
    let mut simulator = Simulator::new();
    simulator.init(1024).unwrap();
    simulator.allocate(100, 1).unwrap().unwrap();

    simulator.set_strategy(AllocatorKind::WorstFit).unwrap();

    let stats = simulator.stats().unwrap();
    assert_eq!(stats.allocator, AllocatorKind::WorstFit);
    assert_eq!(stats.used, 100);
    assert_eq!(stats.requests, 1);
  }

  #[test]
  fn test_buddy_switch_starts_fresh() {
    let mut simulator = Simulator::new();
    simulator.init(1024).unwrap();
    simulator.allocate(100, 1).unwrap().unwrap();

    simulator.set_strategy(AllocatorKind::Buddy).unwrap();
    assert_eq!(simulator.stats().unwrap().used, 0);
    assert_eq!(simulator.allocate(100, 1).unwrap().map(|block| block.size), Some(128));

    simulator.set_strategy(AllocatorKind::BestFit).unwrap();
    assert_eq!(simulator.stats().unwrap().used, 0);

    simulator.set_strategy(AllocatorKind::Buddy).unwrap();
    simulator.init(512).unwrap();
    assert_eq!(simulator.stats().unwrap().allocator, AllocatorKind::Buddy);
    assert_eq!(simulator.arena_size(), Some(512));
  }

  #[test]
  fn test_kind_chosen_before_init() {
    let mut simulator = Simulator::with_config(AllocatorKind::Buddy, BuddyConfig { coalesce: false });
    assert_eq!(simulator.strategy(), AllocatorKind::Buddy);
    assert!(!simulator.is_initialized());

    simulator.init(1000).unwrap();
    assert_eq!(simulator.stats().unwrap().allocator, AllocatorKind::Buddy);
    assert_eq!(simulator.allocate(100, 1).unwrap().map(|block| block.size), Some(128));
    assert!(!simulator.deallocate(1).unwrap());
  }

  #[test]
  fn test_deallocate_reports_release() {
    let mut simulator = Simulator::new();
    simulator.init(256).unwrap();
    simulator.allocate(64, 1).unwrap().unwrap();

    assert_eq!(simulator.deallocate(7), Ok(false));
    assert_eq!(simulator.deallocate(1), Ok(true));
    assert_eq!(simulator.deallocate(1), Ok(false));
  }

  #[test]
  fn test_cache_operations() {
    let mut simulator = Simulator::new();
    assert_eq!(simulator.access(0x10), HierarchyOutcome::Uncached);

    simulator.init_cache(1, 256, 64, 2, ReplacementPolicy::Fifo).unwrap();
    assert_eq!(simulator.access(0x10), HierarchyOutcome::Memory);
    assert_eq!(simulator.access(0x20), HierarchyOutcome::L1Hit);

    let report = simulator.report(1).unwrap();
    assert_eq!((report.hits, report.misses), (1, 1));
    assert_eq!(report.policy, ReplacementPolicy::Fifo);
    assert_eq!(simulator.report(2), Err(SimError::CacheNotConfigured(2)));
  }
}
