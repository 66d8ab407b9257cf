use std::{fmt, str::FromStr};

use serde::Serialize;

use crate::{SimError, block::BlockIndex};

/// A free block that is large enough for the request being served.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Candidate {
  pub index: BlockIndex,
  pub offset: usize,
  pub size: usize,
}

/// Rule for picking one free block among all that can hold a request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FitStrategy {
  #[default]
  FirstFit,
  BestFit,
  WorstFit,
}

impl FitStrategy {
  /// Decides between the block kept so far and one found later in chain
  /// order. Only a strictly better challenger wins, so ties keep the
  /// earlier block.
  pub fn choose(
    self,
    incumbent: Candidate,
    challenger: Candidate,
  ) -> Candidate {
    let challenger_wins = match self {
      FitStrategy::FirstFit => false,
      FitStrategy::BestFit => challenger.size < incumbent.size,
      FitStrategy::WorstFit => challenger.size > incumbent.size,
    };

    if challenger_wins { challenger } else { incumbent }
  }

  /// First-fit never replaces its first candidate, so the scan can stop.
  pub fn settles_on_first(self) -> bool {
    matches!(self, FitStrategy::FirstFit)
  }

  pub fn name(self) -> &'static str {
    match self {
      FitStrategy::FirstFit => "first_fit",
      FitStrategy::BestFit => "best_fit",
      FitStrategy::WorstFit => "worst_fit",
    }
  }
}

/// Every allocator the simulator can run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum AllocatorKind {
  #[default]
  FirstFit,
  BestFit,
  WorstFit,
  Buddy,
}

impl AllocatorKind {
  pub fn fit_strategy(self) -> Option<FitStrategy> {
    match self {
      AllocatorKind::FirstFit => Some(FitStrategy::FirstFit),
      AllocatorKind::BestFit => Some(FitStrategy::BestFit),
      AllocatorKind::WorstFit => Some(FitStrategy::WorstFit),
      AllocatorKind::Buddy => None,
    }
  }

  pub fn name(self) -> &'static str {
    match self.fit_strategy() {
      Some(strategy) => strategy.name(),
      None => "buddy",
    }
  }
}

impl From<FitStrategy> for AllocatorKind {
  fn from(strategy: FitStrategy) -> Self {
    match strategy {
      FitStrategy::FirstFit => AllocatorKind::FirstFit,
      FitStrategy::BestFit => AllocatorKind::BestFit,
      FitStrategy::WorstFit => AllocatorKind::WorstFit,
    }
  }
}

impl FromStr for AllocatorKind {
  type Err = SimError;

  fn from_str(name: &str) -> Result<Self, Self::Err> {
    match name.to_ascii_lowercase().as_str() {
      "first_fit" => Ok(AllocatorKind::FirstFit),
      "best_fit" => Ok(AllocatorKind::BestFit),
      "worst_fit" => Ok(AllocatorKind::WorstFit),
      "buddy" => Ok(AllocatorKind::Buddy),
      _ => Err(SimError::UnknownAllocator(name.to_string())),
    }
  }
}

impl fmt::Display for AllocatorKind {
  fn fmt(
    &self,
    f: &mut fmt::Formatter<'_>,
  ) -> fmt::Result {
    f.write_str(self.name())
  }
}
