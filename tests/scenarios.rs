use memsim::{
  AllocatorKind, FitStrategy, FreeListAllocator, MIN_SPLIT_THRESHOLD, Simulator, SpanState,
  cache::{Cache, CacheConfig, HierarchyOutcome, ReplacementPolicy},
};

/// Free holes of 50, 30, 80 and 30 bytes at offsets 0, 82, 144 and 256,
/// kept apart by used 32-byte fences.
fn holes(strategy: FitStrategy) -> FreeListAllocator {
  let mut allocator = FreeListAllocator::new(318, FitStrategy::FirstFit).unwrap();

  for (id, size) in [(1, 50), (10, 32), (2, 30), (11, 32), (3, 80), (12, 32), (4, 30), (13, 32)] {
    allocator.allocate(size, id).unwrap();
  }
  for id in 1..=4 {
    allocator.deallocate(id);
  }

  allocator.set_strategy(strategy);
  allocator
}

#[test]
fn test_strategy_selection() {
  let expected = [
    (FitStrategy::FirstFit, 0),
    (FitStrategy::BestFit, 82),
    (FitStrategy::WorstFit, 144),
  ];

  for (strategy, offset) in expected {
    let mut allocator = holes(strategy);
    let free: Vec<usize> = allocator.dump().iter().filter(|span| span.is_free()).map(|span| span.size).collect();
    assert_eq!(free, vec![50, 30, 80, 30]);

    let allocation = allocator.allocate(20, 99).unwrap();
    assert_eq!(allocation.offset, offset, "{}", strategy.name());
  }
}

#[test]
fn test_split_threshold() {
  let size = 64;

  let mut whole = FreeListAllocator::new(size + MIN_SPLIT_THRESHOLD - 1, FitStrategy::FirstFit).unwrap();
  let allocation = whole.allocate(size, 1).unwrap();
  assert_eq!(allocation.size, size + MIN_SPLIT_THRESHOLD - 1);
  assert_eq!(whole.dump().len(), 1);
  assert_eq!(whole.stats().internal_frag_bytes, MIN_SPLIT_THRESHOLD - 1);

  let mut split = FreeListAllocator::new(size + MIN_SPLIT_THRESHOLD, FitStrategy::FirstFit).unwrap();
  split.allocate(size, 1).unwrap();
  let sizes: Vec<usize> = split.dump().iter().map(|span| span.size).collect();
  assert_eq!(sizes, vec![size, MIN_SPLIT_THRESHOLD]);
}

#[test]
fn test_buddy_rounds_to_power_of_two() {
  let mut simulator = Simulator::new();
  simulator.init(1024).unwrap();
  simulator.set_strategy(AllocatorKind::Buddy).unwrap();

  let allocation = simulator.allocate(100, 1).unwrap().unwrap();
  assert_eq!(allocation.size, 128);

  let dump = simulator.dump().unwrap();
  assert_eq!(
    dump[0].state,
    SpanState::Used {
      id: 1,
      requested: 100
    }
  );
  assert_eq!(simulator.stats().unwrap().internal_frag_bytes, 28);
}

fn cache(
  associativity: usize,
  policy: ReplacementPolicy,
) -> Cache {
  Cache::new(CacheConfig {
    size: 64 * 4 * associativity,
    block_size: 64,
    associativity,
    policy,
  })
  .unwrap()
}

#[test]
fn test_address_decomposition() {
  let cache = cache(2, ReplacementPolicy::Lru);

  for address in [0u64, 63, 64, 1000, 0xdead_beef] {
    let parts = cache.geometry().decompose(address);
    assert_eq!(parts.set_index as u64, (address / 64) % 4);
    assert_eq!(parts.tag, (address / 64) / 4);
  }

  let mut cache = cache;
  assert!(!cache.access(0x1234));
  assert!(cache.access(0x1234));
}

#[test]
fn test_lru_evicts_least_recent() {
  let mut cache = cache(2, ReplacementPolicy::Lru);
  let (a, b, c) = (0x000, 0x100, 0x200);

  for address in [a, b, c] {
    assert!(!cache.access(address));
  }

  assert!(!cache.contains(a));
  assert!(cache.contains(b));
  assert!(cache.contains(c));
}

#[test]
fn test_fifo_and_lru_diverge() {
  let (a, b, c) = (0x000, 0x100, 0x200);

  for (policy, survivor, evicted) in [(ReplacementPolicy::Fifo, b, a), (ReplacementPolicy::Lru, a, b)] {
    let mut cache = cache(2, policy);
    cache.access(a);
    cache.access(b);
    assert!(cache.access(a));
    cache.access(c);

    assert!(cache.contains(survivor), "{policy}");
    assert!(!cache.contains(evicted), "{policy}");
  }
}

#[test]
fn test_hit_rate_accounting() {
  let mut cache = cache(4, ReplacementPolicy::Lfu);
  assert_eq!(cache.hit_rate(), 0.0);

  for address in [0x0, 0x0, 0x40, 0x0, 0x80, 0x40, 0x0] {
    cache.access(address);
  }

  let report = cache.report(1);
  assert_eq!((report.hits, report.misses), (4, 3));
  assert!((report.hit_rate_pct - 100.0 * 4.0 / 7.0).abs() < 1e-9);
  assert_eq!(report.miss_rate_pct, 100.0 - report.hit_rate_pct);
}

#[test]
fn test_l2_hit_is_visible_in_l1_next_time() {
  let mut simulator = Simulator::new();
  simulator.init_cache(1, 128, 64, 1, ReplacementPolicy::Lru).unwrap();
  simulator.init_cache(2, 2048, 64, 4, ReplacementPolicy::Fifo).unwrap();

  // 0x000 and 0x080 map to the same one-way L1 set.
  let (a, b) = (0x000, 0x080);

  assert_eq!(simulator.access(a), HierarchyOutcome::Memory);
  assert_eq!(simulator.access(b), HierarchyOutcome::Memory);
  assert_eq!(simulator.access(a), HierarchyOutcome::L2Hit { promoted: true });
  assert_eq!(simulator.access(a), HierarchyOutcome::L1Hit);
}
