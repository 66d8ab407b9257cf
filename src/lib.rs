//! # memsim - A Memory Management Simulator
//!
//! This crate simulates two pieces of a memory system without touching
//! real process memory: a **heap allocator** carving a byte-addressable
//! arena into blocks, and a **set-associative cache** driven by address
//! traffic. Every "address" is an offset into the simulated arena.
//!
//! ## Overview
//!
//! The fit allocators keep the arena as one ordered chain of blocks:
//!
//! ```text
//!   Block Chain (first_fit / best_fit / worst_fit):
//!
//!   ┌──────────────────────────────────────────────────────────────────────┐
//!   │                          SIMULATED ARENA                             │
//!   │                                                                      │
//!   │   ┌──────────┬──────────┬──────┬──────────┬───────────────────────┐  │
//!   │   │ USED id1 │ FREE     │ USED │ USED id4 │         FREE          │  │
//!   │   │ 100 B    │ 64 B     │ id2  │ 200 B    │                       │  │
//!   │   └────┬─────┴────┬─────┴──┬───┴────┬─────┴───────────────────────┘  │
//!   │        └─next─────┘        └─next───┘                                │
//!   │                                                                      │
//!   └──────────────────────────────────────────────────────────────────────┘
//!
//!   allocate: pick a free block (strategy), split off the tail if it is
//!             at least MIN_SPLIT_THRESHOLD bytes.
//!   free:     mark the block free, then merge every run of free blocks.
//! ```
//!
//! The buddy allocator instead keeps one free list per power-of-two order
//! and halves blocks until the request fits:
//!
//! ```text
//!   allocate(100) from 1024:
//!
//!   order 10  [ 1024                                              ]
//!   order  9  [ 512                        ][ 512 (free)          ]
//!   order  8  [ 256          ][ 256 (free) ]
//!   order  7  [ 128 ][ 128 f ]
//!             ▲
//!             └── returned block: 128 bytes, 28 bytes of slack
//! ```
//!
//! The cache splits every address into a tag and a set index and keeps
//! `associativity` lines per set:
//!
//! ```text
//!   ┌───────────────────────────────┬──────────────┬──────────────┐
//!   │              tag              │  set index   │    offset    │
//!   └───────────────────────────────┴──────────────┴──────────────┘
//!
//!   L1 miss ──► L2 ──hit──► copy line into L1
//!                  └─miss─► backing memory
//! ```
//!
//! ## Crate Structure
//!
//! ```text
//!   memsim
//!   ├── align      - Rounding macros (align_down!, align_up!)
//!   ├── block      - Block metadata, allocations and dump spans
//!   ├── strategy   - Fit strategies and allocator kinds
//!   ├── free_list  - FreeListAllocator (block chain)
//!   ├── buddy      - BuddyAllocator (per-order free lists)
//!   ├── allocator  - Allocator, the active engine of either kind
//!   ├── cache      - Cache engine, replacement policies, hierarchy
//!   ├── stats      - Memory statistics and cache reports
//!   ├── simulator  - Simulator, the arena + caches facade
//!   ├── traffic    - Random and allocation-driven address streams
//!   └── shell      - Text command shell
//! ```
//!
//! ## Quick Start
//!
//! ```rust
//! use memsim::{AllocatorKind, Simulator, cache::ReplacementPolicy};
//!
//! let mut sim = Simulator::new();
//! sim.init(1024).unwrap();
//! sim.set_strategy(AllocatorKind::BestFit).unwrap();
//!
//! let block = sim.allocate(100, 1).unwrap().expect("fits");
//! assert_eq!(block.offset, 0);
//! sim.deallocate(1).unwrap();
//!
//! sim.init_cache(1, 1024, 64, 2, ReplacementPolicy::Lru).unwrap();
//! sim.access(0x40);
//! sim.access(0x40);
//! assert_eq!(sim.report(1).unwrap().hit_rate_pct, 50.0);
//! ```
//!
//! ## Limitations
//!
//! - **Single-threaded only**: no internal synchronization
//! - **Metadata only**: blocks record sizes and owners, never payload bytes
//! - **Unknown ids**: freeing an id that owns nothing is silently ignored
//! - **Two-level path**: an L3 can be configured but accesses stop at L2

pub mod align;
mod allocator;
mod block;
mod buddy;
pub mod cache;
mod error;
mod free_list;
pub mod shell;
mod simulator;
mod stats;
mod strategy;
pub mod traffic;

pub use allocator::Allocator;
pub use block::{Allocation, Block, BlockIndex, OwnerId, Span, SpanState};
pub use buddy::{BuddyAllocator, BuddyConfig};
pub use error::{Result, SimError};
pub use free_list::{Chain, FreeListAllocator, MIN_SPLIT_THRESHOLD};
pub use simulator::Simulator;
pub use stats::{AllocationCounters, CacheReport, MemoryStats};
pub use strategy::{AllocatorKind, Candidate, FitStrategy};
