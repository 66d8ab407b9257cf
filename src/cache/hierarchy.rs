use std::fmt;

use serde::Serialize;

use super::{AccessKind, Cache, CacheConfig};
use crate::{CacheReport, Result, SimError};

/// Highest cache level that can be configured.
pub const MAX_LEVELS: usize = 3;

/// Where an access through the hierarchy was satisfied.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum HierarchyOutcome {
  /// No cache level is configured.
  Uncached,
  L1Hit,
  /// Hit in L2. `promoted` is set when an L1 exists and the line was
  /// copied into it.
  L2Hit { promoted: bool },
  /// Missed every configured level and went to backing memory.
  Memory,
}

impl fmt::Display for HierarchyOutcome {
  fn fmt(
    &self,
    f: &mut fmt::Formatter<'_>,
  ) -> fmt::Result {
    f.write_str(match self {
      HierarchyOutcome::Uncached => "uncached",
      HierarchyOutcome::L1Hit => "L1 hit",
      HierarchyOutcome::L2Hit { promoted: true } => "L2 hit (promoted to L1)",
      HierarchyOutcome::L2Hit { promoted: false } => "L2 hit",
      HierarchyOutcome::Memory => "miss (memory)",
    })
  }
}

/// Up to three configured cache levels. Accesses walk L1 then L2; a
/// configured L3 keeps its own state and report but is not on the path.
#[derive(Debug, Clone, Default)]
pub struct CacheHierarchy {
  levels: [Option<Cache>; MAX_LEVELS],
}

fn slot(level: usize) -> Result<usize> {
  if (1..=MAX_LEVELS).contains(&level) {
    Ok(level - 1)
  } else {
    Err(SimError::InvalidCacheLevel(level))
  }
}

impl CacheHierarchy {
  pub fn new() -> Self {
    Self::default()
  }

  /// Replaces `level` with a fresh, empty cache.
  pub fn configure(
    &mut self,
    level: usize,
    config: CacheConfig,
  ) -> Result<()> {
    let index = slot(level)?;
    let cache = Cache::new(config)?;

    log::debug!("CacheHierarchy::configure(L{level})");
    self.levels[index] = Some(cache);
    Ok(())
  }

  pub fn level(
    &self,
    level: usize,
  ) -> Result<&Cache> {
    self.levels[slot(level)?].as_ref().ok_or(SimError::CacheNotConfigured(level))
  }

  pub fn is_configured(
    &self,
    level: usize,
  ) -> bool {
    self.level(level).is_ok()
  }

  pub fn is_empty(&self) -> bool {
    self.levels.iter().all(Option::is_none)
  }

  pub fn access(
    &mut self,
    address: u64,
  ) -> HierarchyOutcome {
    self.access_with(address, AccessKind::Read)
  }

  pub fn access_with(
    &mut self,
    address: u64,
    kind: AccessKind,
  ) -> HierarchyOutcome {
    let [l1, l2, _] = &mut self.levels;

    if l1.is_none() && l2.is_none() {
      return HierarchyOutcome::Uncached;
    }

    if let Some(l1) = l1.as_mut() {
      if l1.access_with(address, kind).is_hit() {
        return HierarchyOutcome::L1Hit;
      }
    }

    if let Some(l2) = l2.as_mut() {
      if l2.access_with(address, kind).is_hit() {
        let promoted = match l1.as_mut() {
          Some(l1) => {
            log::trace!("CacheHierarchy: promoting {address:#x} from L2 to L1");
            l1.access_with(address, kind);
            true
          }
          None => false,
        };
        return HierarchyOutcome::L2Hit { promoted };
      }
    }

    HierarchyOutcome::Memory
  }

  pub fn report(
    &self,
    level: usize,
  ) -> Result<CacheReport> {
    Ok(self.level(level)?.report(level))
  }

  /// Reports for every configured level, L1 first.
  pub fn reports(&self) -> Vec<CacheReport> {
    self
      .levels
      .iter()
      .enumerate()
      .filter_map(|(index, cache)| cache.as_ref().map(|cache| cache.report(index + 1)))
      .collect()
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::cache::ReplacementPolicy;

  fn config(
    size: usize,
    associativity: usize,
  ) -> CacheConfig {
    CacheConfig {
      size,
      block_size: 64,
      associativity,
      policy: ReplacementPolicy::Lru,
    }
  }

  #[test]
  fn test_empty_hierarchy_is_uncached() {
    let mut hierarchy = CacheHierarchy::new();

    assert!(hierarchy.is_empty());
    assert_eq!(hierarchy.access(0x40), HierarchyOutcome::Uncached);
    assert_eq!(hierarchy.report(1).unwrap_err(), SimError::CacheNotConfigured(1));
  }

  #[test]
  fn test_level_bounds() {
    let mut hierarchy = CacheHierarchy::new();

    assert_eq!(hierarchy.configure(0, config(256, 1)), Err(SimError::InvalidCacheLevel(0)));
    assert_eq!(hierarchy.configure(4, config(256, 1)), Err(SimError::InvalidCacheLevel(4)));
    assert!(matches!(hierarchy.configure(1, config(100, 1)), Err(SimError::InvalidGeometry { .. })));
    assert!(hierarchy.is_empty());

    hierarchy.configure(3, config(256, 1)).unwrap();
    assert!(hierarchy.is_configured(3));
  }

  #[test]
  fn test_l2_hit_promotes_into_l1() {
    let mut hierarchy = CacheHierarchy::new();
    hierarchy.configure(1, config(64, 1)).unwrap();
    hierarchy.configure(2, config(1024, 4)).unwrap();

    let (a, b) = (0x0, 0x40);

    assert_eq!(hierarchy.access(a), HierarchyOutcome::Memory);
    assert_eq!(hierarchy.access(b), HierarchyOutcome::Memory);
    assert!(!hierarchy.level(1).unwrap().contains(a));

    assert_eq!(hierarchy.access(a), HierarchyOutcome::L2Hit { promoted: true });
    assert!(hierarchy.level(1).unwrap().contains(a));
    assert_eq!(hierarchy.access(a), HierarchyOutcome::L1Hit);

    let l1 = hierarchy.report(1).unwrap();
    let l2 = hierarchy.report(2).unwrap();
    // The miss on the third access already installed `a`, so the promotion
    // access lands as an L1 hit.
    assert_eq!((l1.hits, l1.misses), (2, 3));
    assert_eq!((l2.hits, l2.misses), (1, 2));
  }

  #[test]
  fn test_l3_is_not_on_the_access_path() {
    let mut hierarchy = CacheHierarchy::new();
    hierarchy.configure(1, config(256, 2)).unwrap();
    hierarchy.configure(3, config(1024, 2)).unwrap();

    hierarchy.access(0x80);
    hierarchy.access(0x80);

    assert_eq!(hierarchy.report(3).unwrap().total, 0);
    assert_eq!(hierarchy.reports().iter().map(|report| report.level).collect::<Vec<_>>(), vec![1, 3]);
  }

  #[test]
  fn test_l2_without_l1() {
    let mut hierarchy = CacheHierarchy::new();
    hierarchy.configure(2, config(256, 2)).unwrap();

    assert_eq!(hierarchy.access(0x100), HierarchyOutcome::Memory);
    let outcome = hierarchy.access(0x100);
    assert_eq!(outcome, HierarchyOutcome::L2Hit { promoted: false });
    assert_eq!(outcome.to_string(), "L2 hit");
    assert_eq!(HierarchyOutcome::L2Hit { promoted: true }.to_string(), "L2 hit (promoted to L1)");
  }
}
