//! CLI entrypoint for the memory simulator shell.

use std::{
  fs::File,
  io::{self, BufRead, BufReader, Write},
  path::PathBuf,
  process::ExitCode,
};

use clap::Parser;
use memsim::{
  AllocatorKind, BuddyConfig, Simulator,
  shell::{OutputFormat, Session},
};

/// Interactive heap allocator and cache simulator.
#[derive(Debug, Parser)]
#[command(name = "memsim")]
#[command(about = "Memory management simulator: heap allocators and set-associative caches")]
struct Cli {
  /// Initialize the arena with this many bytes before reading commands.
  #[arg(long)]
  memory: Option<usize>,
  /// Allocator to start with (first_fit, best_fit, worst_fit, buddy).
  #[arg(long, default_value = "first_fit")]
  allocator: AllocatorKind,
  /// Seed for `cache test`; omitted means a fresh random stream.
  #[arg(long)]
  seed: Option<u64>,
  /// Read commands from a file instead of stdin.
  #[arg(long)]
  script: Option<PathBuf>,
  /// Print dumps and statistics as JSON.
  #[arg(long)]
  json: bool,
  /// Keep buddy blocks split after free instead of merging them.
  #[arg(long)]
  no_buddy_merge: bool,
  /// Log verbosity (-v debug, -vv trace). RUST_LOG overrides.
  #[arg(short, long, action = clap::ArgAction::Count)]
  verbose: u8,
}

fn init_logging(verbose: u8) {
  let level = match verbose {
    0 => log::LevelFilter::Warn,
    1 => log::LevelFilter::Debug,
    _ => log::LevelFilter::Trace,
  };

  env_logger::Builder::new()
    .filter_level(level)
    .parse_default_env()
    .init();
}

/// Without `--memory` the allocator choice is kept for the first
/// `init memory`.
fn build_simulator(cli: &Cli) -> memsim::Result<Simulator> {
  let mut simulator = Simulator::with_config(
    cli.allocator,
    BuddyConfig {
      coalesce: !cli.no_buddy_merge,
    },
  );

  if let Some(memory) = cli.memory {
    simulator.init(memory)?;
  }

  Ok(simulator)
}

fn run(cli: Cli) -> Result<(), Box<dyn std::error::Error>> {
  let simulator = build_simulator(&cli)?;
  let format = if cli.json { OutputFormat::Json } else { OutputFormat::Text };
  let mut session = Session::new(simulator, cli.seed, format);

  let stdout = io::stdout();
  let mut out = stdout.lock();

  let input: Box<dyn BufRead> = match &cli.script {
    Some(path) => Box::new(BufReader::new(File::open(path)?)),
    None => {
      writeln!(out, "Memory Management Simulator CLI")?;
      writeln!(out, "Type 'help' for commands, 'exit' to quit.")?;
      Box::new(io::stdin().lock())
    }
  };

  session.run(input, &mut out)?;
  out.flush()?;
  Ok(())
}

fn main() -> ExitCode {
  let cli = Cli::parse();
  init_logging(cli.verbose);

  match run(cli) {
    Ok(()) => ExitCode::SUCCESS,
    Err(err) => {
      eprintln!("memsim: {err}");
      ExitCode::FAILURE
    }
  }
}
