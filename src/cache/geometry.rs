use serde::Serialize;

use crate::{Result, SimError};

/// Shape of a set-associative cache.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct CacheGeometry {
  pub size: usize,
  pub block_size: usize,
  pub associativity: usize,
  pub num_sets: usize,
}

/// An address split into the fields the cache indexes by.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AddressParts {
  pub tag: u64,
  pub set_index: usize,
  pub offset: usize,
}

impl CacheGeometry {
  pub fn new(
    size: usize,
    block_size: usize,
    associativity: usize,
  ) -> Result<Self> {
    let invalid = |reason| SimError::InvalidGeometry {
      size,
      block_size,
      associativity,
      reason,
    };

    if size == 0 || block_size == 0 || associativity == 0 {
      return Err(invalid("size, block size and associativity must all be non-zero"));
    }

    let set_bytes = block_size
      .checked_mul(associativity)
      .ok_or_else(|| invalid("block size times associativity overflows"))?;

    if size % set_bytes != 0 {
      return Err(invalid("block size times associativity must evenly divide the cache size"));
    }

    Ok(Self {
      size,
      block_size,
      associativity,
      num_sets: size / set_bytes,
    })
  }

  pub fn lines(&self) -> usize {
    self.num_sets * self.associativity
  }

  pub fn decompose(
    &self,
    address: u64,
  ) -> AddressParts {
    let block_size = self.block_size as u64;
    let num_sets = self.num_sets as u64;
    let block_address = address / block_size;

    AddressParts {
      tag: block_address / num_sets,
      set_index: (block_address % num_sets) as usize,
      offset: (address % block_size) as usize,
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn test_geometry() {
    let geometry = CacheGeometry::new(1024, 64, 4).unwrap();

    assert_eq!(geometry.num_sets, 4);
    assert_eq!(geometry.lines(), 16);
  }

  #[test]
  fn test_rejects_bad_geometry() {
    for (size, block_size, associativity) in [(0, 64, 2), (1024, 0, 2), (1024, 64, 0), (1000, 64, 2), (64, 64, 2)] {
      let err = CacheGeometry::new(size, block_size, associativity).unwrap_err();
      assert!(matches!(err, SimError::InvalidGeometry { .. }), "{err}");
    }

    assert!(CacheGeometry::new(usize::MAX, usize::MAX, 2).is_err());
  }

  #[test]
  fn test_decompose() {
    let geometry = CacheGeometry::new(512, 64, 2).unwrap();
    assert_eq!(geometry.num_sets, 4);

    for address in [0u64, 1, 63, 64, 255, 256, 1000, 0xdead_beef] {
      let parts = geometry.decompose(address);

      assert_eq!(parts.set_index as u64, (address / 64) % 4);
      assert_eq!(parts.tag, (address / 64) / 4);
      assert_eq!(parts.offset as u64, address % 64);
    }
  }
}
