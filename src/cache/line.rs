#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CacheLine {
  pub tag: u64,
  pub valid: bool,
  pub dirty: bool,
  /// Logical clock value of the access that installed the line.
  pub timestamp: u64,
  /// Hits since the line was installed.
  pub freq: u64,
}

impl CacheLine {
  pub fn install(
    &mut self,
    tag: u64,
    now: u64,
    dirty: bool,
  ) {
    *self = Self {
      tag,
      valid: true,
      dirty,
      timestamp: now,
      freq: 0,
    };
  }

  pub fn holds(
    &self,
    tag: u64,
  ) -> bool {
    self.valid && self.tag == tag
  }
}
