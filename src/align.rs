/// Rounds `value` down to the previous multiple of `to`.
///
/// `to` does not have to be a power of two; cache block sizes and arena
/// granules are arbitrary positive integers in the simulator.
///
/// # Examples
///
/// ```rust
/// use memsim::align_down;
///
/// assert_eq!(align_down!(200, 64), 192);
/// assert_eq!(align_down!(192, 64), 192);
/// assert_eq!(align_down!(10, 3), 9);
/// ```
#[macro_export]
macro_rules! align_down {
  ($value:expr, $to:expr) => {
    ($value) - (($value) % ($to))
  };
}

/// Rounds `value` up to the next multiple of `to`.
///
/// # Examples
///
/// ```rust
/// use memsim::align_up;
///
/// assert_eq!(align_up!(200, 64), 256);
/// assert_eq!(align_up!(256, 64), 256);
/// assert_eq!(align_up!(0, 64), 0);
/// ```
#[macro_export]
macro_rules! align_up {
  ($value:expr, $to:expr) => {
    $crate::align_down!(($value) + ($to) - 1, $to)
  };
}
