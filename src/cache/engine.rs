use serde::Serialize;

use super::{CacheGeometry, CacheLine, ReplacementPolicy, policy::PolicyState};
use crate::{CacheReport, Result, stats::percent};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct CacheConfig {
  pub size: usize,
  pub block_size: usize,
  pub associativity: usize,
  pub policy: ReplacementPolicy,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum AccessKind {
  #[default]
  Read,
  Write,
}

/// A valid line pushed out of its set by a miss.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Eviction {
  pub tag: u64,
  pub dirty: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AccessOutcome {
  Hit {
    set: usize,
    way: usize,
  },
  Miss {
    set: usize,
    way: usize,
    evicted: Option<Eviction>,
  },
}

impl AccessOutcome {
  pub fn is_hit(&self) -> bool {
    matches!(self, AccessOutcome::Hit { .. })
  }
}

#[derive(Debug, Clone)]
struct CacheSet {
  lines: Vec<CacheLine>,
  state: PolicyState,
}

/// One set-associative cache level with its own replacement state and
/// hit/miss counters.
#[derive(Debug, Clone)]
pub struct Cache {
  geometry: CacheGeometry,
  policy: ReplacementPolicy,
  sets: Vec<CacheSet>,
  clock: u64,
  hits: u64,
  misses: u64,
  writebacks: u64,
}

impl Cache {
  pub fn new(config: CacheConfig) -> Result<Self> {
    let geometry = CacheGeometry::new(config.size, config.block_size, config.associativity)?;

    let sets = (0..geometry.num_sets)
      .map(|_| CacheSet {
        lines: vec![CacheLine::default(); geometry.associativity],
        state: PolicyState::new(config.policy, geometry.associativity),
      })
      .collect();

    log::debug!(
      "Cache::new: {} sets, {}-way, {} byte blocks, policy {}",
      geometry.num_sets,
      geometry.associativity,
      geometry.block_size,
      config.policy
    );

    Ok(Self {
      geometry,
      policy: config.policy,
      sets,
      clock: 0,
      hits: 0,
      misses: 0,
      writebacks: 0,
    })
  }

  pub fn geometry(&self) -> CacheGeometry {
    self.geometry
  }

  pub fn policy(&self) -> ReplacementPolicy {
    self.policy
  }

  pub fn block_size(&self) -> usize {
    self.geometry.block_size
  }

  pub fn hits(&self) -> u64 {
    self.hits
  }

  pub fn misses(&self) -> u64 {
    self.misses
  }

  pub fn writebacks(&self) -> u64 {
    self.writebacks
  }

  pub fn hit_rate(&self) -> f64 {
    percent(self.hits, self.hits + self.misses)
  }

  /// Reads `address`, returning whether it hit.
  pub fn access(
    &mut self,
    address: u64,
  ) -> bool {
    self.access_with(address, AccessKind::Read).is_hit()
  }

  pub fn access_with(
    &mut self,
    address: u64,
    kind: AccessKind,
  ) -> AccessOutcome {
    self.clock += 1;

    let parts = self.geometry.decompose(address);
    let set = &mut self.sets[parts.set_index];
    let dirty = kind == AccessKind::Write;

    if let Some(way) = set.lines.iter().position(|line| line.holds(parts.tag)) {
      self.hits += 1;
      set.lines[way].dirty |= dirty;
      set.state.on_hit(&mut set.lines, way);

      log::trace!("Cache::access({address:#x}) -> hit set={} way={way}", parts.set_index);
      return AccessOutcome::Hit {
        set: parts.set_index,
        way,
      };
    }

    self.misses += 1;

    let way = match set.lines.iter().position(|line| !line.valid) {
      Some(way) => way,
      None => set.state.victim(&set.lines),
    };

    let line = &mut set.lines[way];
    let evicted = line.valid.then_some(Eviction {
      tag: line.tag,
      dirty: line.dirty,
    });
    if evicted.is_some_and(|eviction| eviction.dirty) {
      self.writebacks += 1;
    }

    line.install(parts.tag, self.clock, dirty);
    set.state.on_install(way);

    log::trace!(
      "Cache::access({address:#x}) -> miss set={} way={way} evicted={:?}",
      parts.set_index,
      evicted.map(|eviction| eviction.tag)
    );

    AccessOutcome::Miss {
      set: parts.set_index,
      way,
      evicted,
    }
  }

  /// Whether `address` is resident, without touching any state.
  pub fn contains(
    &self,
    address: u64,
  ) -> bool {
    let parts = self.geometry.decompose(address);
    self.sets[parts.set_index].lines.iter().any(|line| line.holds(parts.tag))
  }

  pub fn line(
    &self,
    set: usize,
    way: usize,
  ) -> Option<&CacheLine> {
    self.sets.get(set)?.lines.get(way)
  }

  pub fn report(
    &self,
    level: usize,
  ) -> CacheReport {
    let total = self.hits + self.misses;
    let hit_rate_pct = self.hit_rate();

    CacheReport {
      level,
      policy: self.policy,
      size: self.geometry.size,
      block_size: self.geometry.block_size,
      associativity: self.geometry.associativity,
      num_sets: self.geometry.num_sets,
      hits: self.hits,
      misses: self.misses,
      total,
      writebacks: self.writebacks,
      hit_rate_pct,
      miss_rate_pct: if total == 0 { 0.0 } else { 100.0 - hit_rate_pct },
    }
  }
}
