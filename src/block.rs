use std::fmt;

use serde::Serialize;

/// Identifier a caller attaches to an allocation so it can free it later.
pub type OwnerId = u32;

/// Position of a block inside an allocator's slot arena.
pub type BlockIndex = usize;

/// Metadata for one contiguous span of the simulated arena.
///
/// Blocks never hold payload bytes; the offset of a block is implied by
/// the sum of the sizes of the blocks before it in the chain.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Block {
  pub size: usize,
  pub requested_size: usize,
  pub is_free: bool,
  pub owner: Option<OwnerId>,
  pub next: Option<BlockIndex>,
}

impl Block {
  pub fn new(
    size: usize,
    is_free: bool,
    next: Option<BlockIndex>,
  ) -> Self {
    Self {
      size,
      requested_size: 0,
      is_free,
      owner: None,
      next,
    }
  }

  pub fn claim(
    &mut self,
    owner: OwnerId,
    requested_size: usize,
  ) {
    debug_assert!(requested_size <= self.size);
    self.is_free = false;
    self.owner = Some(owner);
    self.requested_size = requested_size;
  }

  pub fn release(&mut self) {
    self.is_free = true;
    self.owner = None;
    self.requested_size = 0;
  }

  pub fn is_owned_by(
    &self,
    owner: OwnerId,
  ) -> bool {
    !self.is_free && self.owner == Some(owner)
  }
}

/// A successful allocation, as handed back to the caller.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Allocation {
  pub id: OwnerId,
  pub offset: usize,
  pub size: usize,
  pub requested_size: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "state", rename_all = "lowercase")]
pub enum SpanState {
  Free,
  Used { id: OwnerId, requested: usize },
}

/// One line of a memory dump: an inclusive `[start, end]` byte range.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Span {
  pub start: usize,
  pub end: usize,
  pub size: usize,
  #[serde(flatten)]
  pub state: SpanState,
}

impl Span {
  pub fn new(
    start: usize,
    size: usize,
    state: SpanState,
  ) -> Self {
    Self {
      start,
      end: start + size.saturating_sub(1),
      size,
      state,
    }
  }

  pub fn is_free(&self) -> bool {
    matches!(self.state, SpanState::Free)
  }

  /// Bytes handed out beyond what the owner asked for.
  pub fn slack(&self) -> usize {
    match self.state {
      SpanState::Free => 0,
      SpanState::Used { requested, .. } => self.size - requested,
    }
  }
}

impl fmt::Display for Span {
  fn fmt(
    &self,
    f: &mut fmt::Formatter<'_>,
  ) -> fmt::Result {
    write!(f, "[{:#x} - {:#x}] ", self.start, self.end)?;
    match self.state {
      SpanState::Free => write!(f, "FREE"),
      SpanState::Used { id, requested } => write!(f, "USED (id={id}, req={requested})"),
    }
  }
}
