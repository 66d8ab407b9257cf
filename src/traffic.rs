use rand::{Rng, SeedableRng, rngs::StdRng};

use crate::{OwnerId, align_down, cache::AccessKind};

/// Simulated address of the allocator's free-list metadata.
pub const FREE_LIST_METADATA: u64 = 0x1000;
/// Base and per-id stride of simulated block headers.
pub const HEADER_BASE: u64 = 0x2000;
pub const HEADER_STRIDE: u64 = 64;
/// Base and per-id stride of simulated payload data.
pub const DATA_BASE: u64 = 0x3000;
pub const DATA_STRIDE: u64 = 256;

/// The memory traffic an allocator's bookkeeping would generate, used to
/// drive the caches alongside `malloc`/`free`.
#[derive(Debug, Clone, Copy)]
pub struct AllocationTraffic {
  block_size: usize,
}

impl AllocationTraffic {
  pub fn new(block_size: usize) -> Self {
    Self {
      block_size: block_size.max(1),
    }
  }

  fn header(id: OwnerId) -> u64 {
    HEADER_BASE + u64::from(id) * HEADER_STRIDE
  }

  /// Read the free list, write the header, then zero the payload one
  /// cache block at a time. The walk is lazy and stops instead of
  /// wrapping when an address would overflow.
  pub fn on_allocate(
    self,
    id: OwnerId,
    size: usize,
  ) -> impl Iterator<Item = (u64, AccessKind)> {
    let data = DATA_BASE + u64::from(id) * DATA_STRIDE;
    let payload = (0..size as u64)
      .step_by(self.block_size)
      .map_while(move |offset| data.checked_add(offset))
      .map(|address| (address, AccessKind::Write));

    [
      (FREE_LIST_METADATA, AccessKind::Read),
      (Self::header(id), AccessKind::Write),
    ]
    .into_iter()
    .chain(payload)
  }

  /// Read the header, then update the free list.
  pub fn on_free(
    self,
    id: OwnerId,
  ) -> impl Iterator<Item = (u64, AccessKind)> {
    [
      (Self::header(id), AccessKind::Read),
      (FREE_LIST_METADATA, AccessKind::Write),
    ]
    .into_iter()
  }
}

/// Uniformly random, block-aligned addresses. One generator keeps
/// drawing across calls, so repeated runs continue the same stream.
#[derive(Debug, Clone)]
pub struct RandomTraffic {
  rng: StdRng,
}

impl RandomTraffic {
  pub fn new(seed: Option<u64>) -> Self {
    let rng = match seed {
      Some(seed) => StdRng::seed_from_u64(seed),
      None => StdRng::from_entropy(),
    };

    Self { rng }
  }

  /// One address in `[0, memory_size - block_size]`, aligned down to
  /// `block_size`.
  pub fn sample(
    &mut self,
    memory_size: usize,
    block_size: usize,
  ) -> u64 {
    let highest = memory_size.saturating_sub(block_size) as u64;
    let address = self.rng.gen_range(0..=highest);
    align_down!(address, block_size.max(1) as u64)
  }

  pub fn samples(
    &mut self,
    memory_size: usize,
    block_size: usize,
    count: usize,
  ) -> impl Iterator<Item = u64> + '_ {
    (0..count).map(move |_| self.sample(memory_size, block_size))
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn test_allocation_traffic() {
    let traffic = AllocationTraffic::new(64);
    let accesses: Vec<_> = traffic.on_allocate(2, 130).collect();

    assert_eq!(
      accesses,
      vec![
        (0x1000, AccessKind::Read),
        (0x2080, AccessKind::Write),
        (0x3200, AccessKind::Write),
        (0x3240, AccessKind::Write),
        (0x3280, AccessKind::Write),
      ]
    );

    assert_eq!(
      traffic.on_free(2).collect::<Vec<_>>(),
      vec![(0x2080, AccessKind::Read), (0x1000, AccessKind::Write)]
    );
  }

  #[test]
  fn test_allocation_traffic_huge_request() {
    let traffic = AllocationTraffic::new(64);

    let first: Vec<_> = traffic.on_allocate(OwnerId::MAX, usize::MAX).take(4).collect();
    assert_eq!(first.len(), 4);
    assert_eq!(first[2].0, DATA_BASE + u64::from(OwnerId::MAX) * DATA_STRIDE);

    assert_eq!(AllocationTraffic::new(1 << 60).on_allocate(1, usize::MAX).count(), 2 + 16);
  }

  #[test]
  fn test_random_traffic_is_aligned_and_bounded() {
    let addresses: Vec<u64> = RandomTraffic::new(Some(7)).samples(4096, 64, 500).collect();

    assert!(addresses.iter().all(|address| address % 64 == 0 && *address <= 4096 - 64));
    assert_eq!(addresses, RandomTraffic::new(Some(7)).samples(4096, 64, 500).collect::<Vec<_>>());
  }

  #[test]
  fn test_random_traffic_continues_across_runs() {
    let mut traffic = RandomTraffic::new(Some(7));
    let first: Vec<u64> = traffic.samples(1 << 16, 64, 50).collect();
    let second: Vec<u64> = traffic.samples(1 << 16, 64, 50).collect();

    assert_ne!(first, second);
  }

  #[test]
  fn test_random_traffic_small_arena() {
    let mut traffic = RandomTraffic::new(Some(1));
    assert_eq!(traffic.sample(16, 64), 0);
  }
}
