use std::{collections::VecDeque, fmt, str::FromStr};

use serde::Serialize;

use super::CacheLine;
use crate::SimError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum ReplacementPolicy {
  #[default]
  Lru,
  Lfu,
  Fifo,
}

impl ReplacementPolicy {
  /// Parses a policy name, falling back to LRU for anything unrecognised.
  pub fn from_name_or_default(name: &str) -> Self {
    name.parse().unwrap_or_else(|_| {
      log::warn!("unknown replacement policy `{name}`, using LRU");
      ReplacementPolicy::Lru
    })
  }

  pub fn name(self) -> &'static str {
    match self {
      ReplacementPolicy::Lru => "LRU",
      ReplacementPolicy::Lfu => "LFU",
      ReplacementPolicy::Fifo => "FIFO",
    }
  }
}

impl FromStr for ReplacementPolicy {
  type Err = SimError;

  fn from_str(name: &str) -> Result<Self, Self::Err> {
    match name.to_ascii_uppercase().as_str() {
      "LRU" => Ok(ReplacementPolicy::Lru),
      "LFU" => Ok(ReplacementPolicy::Lfu),
      "FIFO" => Ok(ReplacementPolicy::Fifo),
      _ => Err(SimError::UnknownPolicy(name.to_string())),
    }
  }
}

impl fmt::Display for ReplacementPolicy {
  fn fmt(
    &self,
    f: &mut fmt::Formatter<'_>,
  ) -> fmt::Result {
    f.write_str(self.name())
  }
}

/// Replacement bookkeeping for one set.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum PolicyState {
  /// Valid ways ordered from least to most recently used.
  Recency(VecDeque<usize>),
  /// Valid ways ordered from oldest to newest arrival.
  Arrival(VecDeque<usize>),
  /// LFU keeps its counts on the lines.
  Frequency,
}

impl PolicyState {
  pub(crate) fn new(
    policy: ReplacementPolicy,
    associativity: usize,
  ) -> Self {
    match policy {
      ReplacementPolicy::Lru => PolicyState::Recency(VecDeque::with_capacity(associativity)),
      ReplacementPolicy::Fifo => PolicyState::Arrival(VecDeque::with_capacity(associativity)),
      ReplacementPolicy::Lfu => PolicyState::Frequency,
    }
  }

  pub(crate) fn on_hit(
    &mut self,
    lines: &mut [CacheLine],
    way: usize,
  ) {
    match self {
      PolicyState::Recency(order) => {
        order.retain(|candidate| *candidate != way);
        order.push_back(way);
      }
      PolicyState::Frequency => lines[way].freq += 1,
      PolicyState::Arrival(_) => {}
    }
  }

  /// Picks and forgets the way to evict from a full set.
  pub(crate) fn victim(
    &mut self,
    lines: &[CacheLine],
  ) -> usize {
    match self {
      PolicyState::Recency(order) | PolicyState::Arrival(order) => {
        debug_assert_eq!(order.len(), lines.len());
        order.pop_front().unwrap_or_default()
      }
      PolicyState::Frequency => lines
        .iter()
        .enumerate()
        .min_by_key(|(way, line)| (line.freq, *way))
        .map_or(0, |(way, _)| way),
    }
  }

  pub(crate) fn on_install(
    &mut self,
    way: usize,
  ) {
    match self {
      PolicyState::Recency(order) | PolicyState::Arrival(order) => {
        order.retain(|candidate| *candidate != way);
        order.push_back(way);
      }
      PolicyState::Frequency => {}
    }
  }

  /// Ways tracked by the ordering, front first. Empty for LFU.
  pub(crate) fn order(&self) -> Vec<usize> {
    match self {
      PolicyState::Recency(order) | PolicyState::Arrival(order) => order.iter().copied().collect(),
      PolicyState::Frequency => Vec::new(),
    }
  }
}
