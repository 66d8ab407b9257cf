//! Line-oriented command shell over a [`Simulator`].
//!
//! Every command is one line of whitespace separated words. Errors are
//! reported on the output stream and the session keeps going; only I/O
//! failures end it.

use std::{
  io::{self, BufRead, Write},
  str::FromStr,
};

use serde_json::json;
use thiserror::Error;

use crate::{
  AllocatorKind, OwnerId, SimError, Simulator,
  cache::{AccessKind, ReplacementPolicy},
  traffic::{AllocationTraffic, RandomTraffic},
};

pub const HELP: &str = "\
Commands:
  init memory <size>
  set allocator <first_fit|best_fit|worst_fit|buddy>
  malloc <size>
  free <id>
  dump memory
  stats
  init cache <level> <size> <block_size> <associativity> <LRU|LFU|FIFO>
  cache read <hex_address>
  cache write <hex_address>
  cache stats
  cache test <num_accesses>
  help
  exit";

#[derive(Debug, Error)]
pub enum ShellError {
  #[error("{0}")]
  Parse(String),
  #[error(transparent)]
  Sim(#[from] SimError),
  #[error("io: {0}")]
  Io(#[from] io::Error),
  #[error("json: {0}")]
  Json(#[from] serde_json::Error),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
  Help,
  Exit,
  InitMemory(usize),
  SetAllocator(AllocatorKind),
  Malloc(usize),
  Free(OwnerId),
  DumpMemory,
  Stats,
  InitCache {
    level: usize,
    size: usize,
    block_size: usize,
    associativity: usize,
    policy: ReplacementPolicy,
  },
  CacheRead(u64),
  CacheWrite(u64),
  CacheStats,
  CacheTest(usize),
}

fn parse_hex(word: &str) -> Result<u64, ShellError> {
  let digits = word.strip_prefix("0x").or_else(|| word.strip_prefix("0X")).unwrap_or(word);
  u64::from_str_radix(digits, 16).map_err(|_| ShellError::Parse(format!("invalid hex address `{word}`")))
}

struct Words<'a> {
  inner: std::str::SplitWhitespace<'a>,
}

impl<'a> Words<'a> {
  fn word(
    &mut self,
    what: &str,
  ) -> Result<&'a str, ShellError> {
    self.inner.next().ok_or_else(|| ShellError::Parse(format!("missing {what}")))
  }

  fn value<T: FromStr>(
    &mut self,
    what: &str,
  ) -> Result<T, ShellError> {
    let word = self.word(what)?;
    word.parse().map_err(|_| ShellError::Parse(format!("invalid {what} `{word}`")))
  }

  fn finish(
    mut self,
    command: Command,
  ) -> Result<Command, ShellError> {
    match self.inner.next() {
      Some(extra) => Err(ShellError::Parse(format!("unexpected argument `{extra}`"))),
      None => Ok(command),
    }
  }
}

impl FromStr for Command {
  type Err = ShellError;

  fn from_str(line: &str) -> Result<Self, Self::Err> {
    let mut words = Words {
      inner: line.split_whitespace(),
    };

    let command = match words.word("command")? {
      "help" => Command::Help,
      "exit" | "quit" => Command::Exit,
      "malloc" => Command::Malloc(words.value("size")?),
      "free" => Command::Free(words.value("id")?),
      "stats" => Command::Stats,
      "init" => match words.word("init target")? {
        "memory" => Command::InitMemory(words.value("memory size")?),
        "cache" => Command::InitCache {
          level: words.value("cache level")?,
          size: words.value("cache size")?,
          block_size: words.value("block size")?,
          associativity: words.value("associativity")?,
          policy: ReplacementPolicy::from_name_or_default(words.word("policy")?),
        },
        other => return Err(ShellError::Parse(format!("unknown init target `{other}`"))),
      },
      "set" => match words.word("setting")? {
        "allocator" => Command::SetAllocator(words.word("allocator")?.parse()?),
        other => return Err(ShellError::Parse(format!("unknown setting `{other}`"))),
      },
      "dump" => match words.word("dump target")? {
        "memory" => Command::DumpMemory,
        other => return Err(ShellError::Parse(format!("unknown dump target `{other}`"))),
      },
      "cache" => match words.word("cache command")? {
        "read" => Command::CacheRead(parse_hex(words.word("address")?)?),
        "write" => Command::CacheWrite(parse_hex(words.word("address")?)?),
        "stats" => Command::CacheStats,
        "test" => Command::CacheTest(words.value("number of accesses")?),
        other => return Err(ShellError::Parse(format!("unknown cache command `{other}`"))),
      },
      other => return Err(ShellError::Parse(format!("unknown command `{other}`"))),
    };

    words.finish(command)
  }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OutputFormat {
  #[default]
  Text,
  Json,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flow {
  Continue,
  Exit,
}

/// Shell state: the simulator, the id counter for `malloc` and the
/// address stream for `cache test`. `init memory` restarts the stream
/// from the seed.
#[derive(Debug, Clone)]
pub struct Session {
  simulator: Simulator,
  next_id: OwnerId,
  seed: Option<u64>,
  traffic: RandomTraffic,
  format: OutputFormat,
}

impl Session {
  pub fn new(
    simulator: Simulator,
    seed: Option<u64>,
    format: OutputFormat,
  ) -> Self {
    Self {
      simulator,
      next_id: 1,
      seed,
      traffic: RandomTraffic::new(seed),
      format,
    }
  }

  pub fn simulator(&self) -> &Simulator {
    &self.simulator
  }

  /// Runs one line. Blank lines and `#` comments do nothing.
  pub fn run_line<W: Write>(
    &mut self,
    line: &str,
    out: &mut W,
  ) -> Result<Flow, ShellError> {
    let line = line.trim();
    if line.is_empty() || line.starts_with('#') {
      return Ok(Flow::Continue);
    }

    let command = line.parse()?;
    self.execute(command, out)
  }

  /// Reads commands until `exit` or end of input.
  pub fn run<R: BufRead, W: Write>(
    &mut self,
    input: R,
    out: &mut W,
  ) -> io::Result<()> {
    for line in input.lines() {
      match self.run_line(&line?, out) {
        Ok(Flow::Continue) => {}
        Ok(Flow::Exit) => break,
        Err(ShellError::Io(err)) => return Err(err),
        Err(err) => writeln!(out, "Error: {err}")?,
      }
    }

    writeln!(out, "Exiting simulator.")
  }

  fn drive_caches(
    &mut self,
    accesses: impl IntoIterator<Item = (u64, AccessKind)>,
  ) {
    for (address, kind) in accesses {
      let outcome = self.simulator.access_with(address, kind);
      log::trace!("{kind:?} {address:#x}: {outcome}");
    }
  }

  fn l1_block_size(&self) -> Option<usize> {
    self.simulator.caches().level(1).ok().map(|cache| cache.block_size())
  }

  pub fn execute<W: Write>(
    &mut self,
    command: Command,
    out: &mut W,
  ) -> Result<Flow, ShellError> {
    match command {
      Command::Help => writeln!(out, "{HELP}")?,
      Command::Exit => return Ok(Flow::Exit),
      Command::InitMemory(size) => {
        self.simulator.init(size)?;
        self.traffic = RandomTraffic::new(self.seed);
        writeln!(out, "Memory initialized with size {size}")?;
      }
      Command::SetAllocator(kind) => {
        self.simulator.set_strategy(kind)?;
        writeln!(out, "Allocator set to {kind}")?;
      }
      Command::Malloc(size) => {
        let arena = self.simulator.arena_size().ok_or(SimError::MemoryNotInitialized)?;

        // A request larger than the arena only touches as much payload
        // as the arena could hold.
        let id = self.next_id;
        if let Some(block_size) = self.l1_block_size() {
          let accesses = AllocationTraffic::new(block_size).on_allocate(id, size.min(arena));
          self.drive_caches(accesses);
        }

        match self.simulator.allocate(size, id)? {
          Some(allocation) => {
            self.next_id += 1;
            writeln!(
              out,
              "Allocated block id={id} at address={:#x} (size={})",
              allocation.offset, allocation.size
            )?;
          }
          None => writeln!(out, "Allocation failed")?,
        }
      }
      Command::Free(id) => {
        if !self.simulator.is_initialized() {
          return Err(SimError::MemoryNotInitialized.into());
        }

        if let Some(block_size) = self.l1_block_size() {
          let accesses = AllocationTraffic::new(block_size).on_free(id);
          self.drive_caches(accesses);
        }

        if self.simulator.deallocate(id)? {
          writeln!(out, "Block {id} freed and merged")?;
        } else if self.simulator.strategy() == AllocatorKind::Buddy && !self.simulator.buddy_config().coalesce {
          writeln!(out, "Block {id} not released (buddy merging disabled)")?;
        } else {
          writeln!(out, "No block with id {id}")?;
        }
      }
      Command::DumpMemory => {
        let spans = self.simulator.dump()?;
        match self.format {
          OutputFormat::Text => {
            for span in spans {
              writeln!(out, "{span}")?;
            }
          }
          OutputFormat::Json => writeln!(out, "{}", serde_json::to_string_pretty(&spans)?)?,
        }
      }
      Command::Stats => {
        let memory = self.simulator.stats()?;
        let caches = self.simulator.caches().reports();
        match self.format {
          OutputFormat::Text => {
            writeln!(out, "{memory}")?;
            for report in caches {
              writeln!(out, "{report}")?;
            }
          }
          OutputFormat::Json => {
            let value = json!({ "memory": memory, "caches": caches });
            writeln!(out, "{}", serde_json::to_string_pretty(&value)?)?;
          }
        }
      }
      Command::InitCache {
        level,
        size,
        block_size,
        associativity,
        policy,
      } => {
        self.simulator.init_cache(level, size, block_size, associativity, policy)?;
        let geometry = self.simulator.caches().level(level)?.geometry();
        writeln!(
          out,
          "Cache L{level} initialized: {} sets, {}-way, block size: {} bytes, Policy: {policy}",
          geometry.num_sets, geometry.associativity, geometry.block_size
        )?;
      }
      Command::CacheRead(address) | Command::CacheWrite(address) => {
        let (kind, verb) = match command {
          Command::CacheWrite(_) => (AccessKind::Write, "write"),
          _ => (AccessKind::Read, "read"),
        };
        self.simulator.caches().level(1)?;

        let outcome = self.simulator.access_with(address, kind);
        writeln!(out, "Cache {verb} at {address:#x}: {outcome}")?;
      }
      Command::CacheStats => {
        self.simulator.caches().level(1)?;
        let reports = self.simulator.caches().reports();
        match self.format {
          OutputFormat::Text => {
            for report in reports {
              writeln!(out, "{report}")?;
            }
          }
          OutputFormat::Json => writeln!(out, "{}", serde_json::to_string_pretty(&reports)?)?,
        }
      }
      Command::CacheTest(count) => {
        let arena = self.simulator.arena_size().ok_or(SimError::MemoryNotInitialized)?;
        let block_size = self.simulator.caches().level(1)?.block_size();

        writeln!(out, "Generating {count} random cache accesses...")?;
        for _ in 0..count {
          let address = self.traffic.sample(arena, block_size);
          self.simulator.access(address);
        }

        let l1 = self.simulator.report(1)?;
        writeln!(out, "Cache test completed. L1 hit rate: {:.2}%", l1.hit_rate_pct)?;
      }
    }

    Ok(Flow::Continue)
  }
}
