use memsim::{AllocatorKind, Simulator, cache::ReplacementPolicy};

fn print_dump(
  label: &str,
  simulator: &Simulator,
) -> memsim::Result<()> {
  println!("\n[{label}] memory layout:");
  for span in simulator.dump()? {
    println!("  {span}");
  }
  Ok(())
}

fn main() -> memsim::Result<()> {
  let mut simulator = Simulator::new();

  // --------------------------------------------------------------------
  // 1) A 1 KiB arena under first fit. Three allocations carve the chain
  //    from the front; the tail stays one free block.
  // --------------------------------------------------------------------
  simulator.init(1024)?;
  for (id, size) in [(1, 100), (2, 200), (3, 50)] {
    if let Some(block) = simulator.allocate(size, id)? {
      println!("[1] id={id} -> offset {:#x}, {} bytes", block.offset, block.size);
    }
  }
  print_dump("1", &simulator)?;

  // --------------------------------------------------------------------
  // 2) Free the middle block. The hole it leaves is not adjacent to the
  //    free tail, so external fragmentation appears.
  // --------------------------------------------------------------------
  simulator.deallocate(2)?;
  print_dump("2", &simulator)?;
  println!("{}", simulator.stats()?);

  // --------------------------------------------------------------------
  // 3) Best fit picks the 200-byte hole for a 150-byte request, and the
  //    50-byte remainder is split off since it is at least 32 bytes.
  // --------------------------------------------------------------------
  simulator.set_strategy(AllocatorKind::BestFit)?;
  simulator.allocate(150, 4)?;
  print_dump("3", &simulator)?;

  // --------------------------------------------------------------------
  // 4) Buddy system on the same arena: sizes round up to powers of two.
  // --------------------------------------------------------------------
  simulator.set_strategy(AllocatorKind::Buddy)?;
  simulator.allocate(100, 1)?;
  simulator.allocate(300, 2)?;
  print_dump("4", &simulator)?;
  println!("{}", simulator.stats()?);

  // --------------------------------------------------------------------
  // 5) Two cache levels. A line evicted from the tiny L1 is still in L2,
  //    so the second touch of `a` is an L2 hit that refills L1.
  // --------------------------------------------------------------------
  simulator.init_cache(1, 128, 64, 1, ReplacementPolicy::Lru)?;
  simulator.init_cache(2, 1024, 64, 4, ReplacementPolicy::Lfu)?;

  let (a, b, c) = (0x000, 0x080, 0x040);
  for address in [a, b, a, a, c] {
    println!("[5] access {address:#05x}: {}", simulator.access(address));
  }

  for report in simulator.caches().reports() {
    println!("{report}");
  }

  Ok(())
}
