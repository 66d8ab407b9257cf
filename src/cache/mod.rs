//! Set-associative cache model.
//!
//! ```text
//!   address ──► block_address = address / block_size
//!                      │
//!          ┌───────────┴────────────┐
//!          ▼                        ▼
//!   set = block % num_sets   tag = block / num_sets
//! ```
//!
//! [`Cache`] owns one table of sets plus the replacement state for its
//! [`ReplacementPolicy`]; [`CacheHierarchy`] chains an L1 in front of an
//! optional L2 and copies L2 hits up into L1.

mod engine;
mod geometry;
mod hierarchy;
mod line;
mod policy;

pub use engine::{AccessKind, AccessOutcome, Cache, CacheConfig, Eviction};
pub use geometry::{AddressParts, CacheGeometry};
pub use hierarchy::{CacheHierarchy, HierarchyOutcome, MAX_LEVELS};
pub use line::CacheLine;
pub use policy::ReplacementPolicy;
