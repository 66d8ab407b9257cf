use std::fmt;

use serde::Serialize;

use crate::{AllocatorKind, Span, cache::ReplacementPolicy};

/// Percentage of `part` in `whole`, or 0 when `whole` is 0.
pub(crate) fn percent(
  part: u64,
  whole: u64,
) -> f64 {
  if whole == 0 {
    0.0
  } else {
    100.0 * part as f64 / whole as f64
  }
}

/// Request outcome counters kept by every allocator.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct AllocationCounters {
  pub requests: u64,
  pub successes: u64,
  pub failures: u64,
}

impl AllocationCounters {
  pub fn record_success(&mut self) {
    self.requests += 1;
    self.successes += 1;
  }

  pub fn record_failure(&mut self) {
    self.requests += 1;
    self.failures += 1;
  }

  pub fn success_rate(&self) -> f64 {
    percent(self.successes, self.requests)
  }

  pub fn failure_rate(&self) -> f64 {
    percent(self.failures, self.requests)
  }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MemoryStats {
  pub allocator: AllocatorKind,
  pub total: usize,
  pub used: usize,
  pub free: usize,
  /// Bytes of the arena no block covers (the tail past a buddy arena).
  pub unmanaged: usize,
  pub largest_free: usize,
  pub internal_frag_bytes: usize,
  pub external_frag_pct: f64,
  pub utilization_pct: f64,
  pub requests: u64,
  pub successes: u64,
  pub failures: u64,
  pub success_rate_pct: f64,
  pub failure_rate_pct: f64,
}

impl MemoryStats {
  pub fn from_spans(
    allocator: AllocatorKind,
    total: usize,
    spans: &[Span],
    counters: AllocationCounters,
  ) -> Self {
    let mut used = 0;
    let mut free = 0;
    let mut largest_free = 0;
    let mut internal_frag_bytes = 0;

    for span in spans {
      if span.is_free() {
        free += span.size;
        largest_free = largest_free.max(span.size);
      } else {
        used += span.size;
        internal_frag_bytes += span.slack();
      }
    }

    let external_frag_pct = if free == 0 {
      0.0
    } else {
      100.0 * (1.0 - largest_free as f64 / free as f64)
    };

    Self {
      allocator,
      total,
      used,
      free,
      unmanaged: total - used - free,
      largest_free,
      internal_frag_bytes,
      external_frag_pct,
      utilization_pct: percent(used as u64, total as u64),
      requests: counters.requests,
      successes: counters.successes,
      failures: counters.failures,
      success_rate_pct: counters.success_rate(),
      failure_rate_pct: counters.failure_rate(),
    }
  }
}

impl fmt::Display for MemoryStats {
  fn fmt(
    &self,
    f: &mut fmt::Formatter<'_>,
  ) -> fmt::Result {
    writeln!(f, "===== Memory Statistics =====")?;
    writeln!(f, "Allocator: {}", self.allocator)?;
    writeln!(f, "Total memory: {}", self.total)?;
    writeln!(f, "Used memory: {}", self.used)?;
    writeln!(f, "Free memory: {}", self.free)?;
    if self.unmanaged > 0 {
      writeln!(f, "Unmanaged memory: {}", self.unmanaged)?;
    }
    writeln!(f, "Memory utilization: {:.2}%", self.utilization_pct)?;
    writeln!(f, "Internal fragmentation: {} bytes", self.internal_frag_bytes)?;
    writeln!(f, "External fragmentation: {:.2}%", self.external_frag_pct)?;
    writeln!(
      f,
      "Allocation requests: {} ({} ok, {} failed)",
      self.requests, self.successes, self.failures
    )?;
    writeln!(f, "Allocation success rate: {:.2}%", self.success_rate_pct)?;
    writeln!(f, "Allocation failure rate: {:.2}%", self.failure_rate_pct)?;
    write!(f, "==============================")
  }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CacheReport {
  pub level: usize,
  pub policy: ReplacementPolicy,
  pub size: usize,
  pub block_size: usize,
  pub associativity: usize,
  pub num_sets: usize,
  pub hits: u64,
  pub misses: u64,
  pub total: u64,
  pub writebacks: u64,
  pub hit_rate_pct: f64,
  pub miss_rate_pct: f64,
}

impl fmt::Display for CacheReport {
  fn fmt(
    &self,
    f: &mut fmt::Formatter<'_>,
  ) -> fmt::Result {
    writeln!(f, "===== L{} Cache Statistics =====", self.level)?;
    writeln!(
      f,
      "Geometry: {} bytes, {} sets, {}-way, {} byte blocks",
      self.size, self.num_sets, self.associativity, self.block_size
    )?;
    writeln!(f, "Hits: {}", self.hits)?;
    writeln!(f, "Misses: {}", self.misses)?;
    writeln!(f, "Total accesses: {}", self.total)?;
    writeln!(f, "Hit rate: {:.2}%", self.hit_rate_pct)?;
    writeln!(f, "Miss rate: {:.2}%", self.miss_rate_pct)?;
    writeln!(f, "Writebacks: {}", self.writebacks)?;
    writeln!(f, "Policy: {}", self.policy)?;
    write!(f, "=================================")
  }
}
