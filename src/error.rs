use thiserror::Error;

pub type Result<T> = std::result::Result<T, SimError>;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SimError {
  #[error("arena size must be greater than zero")]
  ZeroArena,
  #[error(
    "invalid cache geometry (size={size}, block_size={block_size}, associativity={associativity}): {reason}"
  )]
  InvalidGeometry {
    size: usize,
    block_size: usize,
    associativity: usize,
    reason: &'static str,
  },
  #[error("cache level {0} is out of range (expected 1-3)")]
  InvalidCacheLevel(usize),
  #[error("cache level L{0} is not configured")]
  CacheNotConfigured(usize),
  #[error("memory is not initialized")]
  MemoryNotInitialized,
  #[error("unknown allocator `{0}` (expected first_fit, best_fit, worst_fit or buddy)")]
  UnknownAllocator(String),
  #[error("unknown replacement policy `{0}` (expected LRU, LFU or FIFO)")]
  UnknownPolicy(String),
}
