//! Monero's VarInt (variable-length integer) encoding.
//!
//! A compact format for small values, matching Monero's C++ implementation.
//!
//! See: https://github.com/monero-project/monero/blob/8e9ab9677f90492bca3c7555a246f2a8677bd570/src/common/varint.h

#[allow(unused_imports)]
use std_shims::prelude::*;
use std_shims::io::{self, Read, Write};

use crate::{read_byte, write_byte};

const VARINT_CONTINUATION_FLAG: u8 = 0b1000_0000;
const VARINT_VALUE_MASK: u8 = !VARINT_CONTINUATION_FLAG;

mod sealed {
  /// A seal to prevent implementing `VarInt` on foreign types.
  pub trait Sealed {
    /// Lossless, guaranteed conversion into a `u64`.
    ///
    /// This is due to internally implementing encoding for `u64` alone and `usize` not implementing
    /// `From<u64>`.
    // This is placed here so it's not within our public API commitment.
    fn into_u64(self) -> u64;
  }
}

/// Compute the maximum encoded length of a VarInt for the given bit width (evaluated at compile
/// time).
#[allow(clippy::cast_possible_truncation)]
const fn upper_bound(bits: u32) -> usize {
  // Never expected to exceed a u256
  assert!(bits <= 256, "defining a number exceeding u256 as a VarInt");
  // 7 bits encoded per byte, rounded up
  ((bits + (7 - 1)) / 7) as usize
}

/// A trait for types which can be read/written as a VarInt (sealed).
///
/// Only implemented for primitive integer types, to prevent misuse on unintended types.
pub trait VarInt: TryFrom<u64> + Copy + sealed::Sealed {
  /// The minimum encoded length, in bytes.
  const LOWER_BOUND: usize;

  /// The maximum encoded length, in bytes.
  const UPPER_BOUND: usize;

  /// The length, in bytes, of this value's VarInt encoding.
  fn varint_len(self) -> usize {
    let varint_u64 = self.into_u64();
    usize::try_from(u64::BITS - varint_u64.leading_zeros()).expect("64 > usize::MAX?").div_ceil(7)
  }

  /// Read a canonically-encoded VarInt.
  fn read<R: Read>(r: &mut R) -> io::Result<Self> {
    let mut bits = 0;
    let mut res = 0;
    while {
      let b = read_byte(r)?;
      // Reject non-canonical (extraneous leading-zero) encodings
      if (bits != 0) && (b == 0) {
        Err(io::Error::other("non-canonical varint"))?;
      }

      // Detect overflow relative to the size of the type this VarInt is being read into
      #[allow(non_snake_case)]
      let U_BITS = core::mem::size_of::<Self>() * 8;
      if ((bits + 7) >= U_BITS) && (b >= (1 << (U_BITS - bits))) {
        Err(io::Error::other("varint overflow"))?;
      }

      res += u64::from(b & VARINT_VALUE_MASK) << bits;
      bits += 7;
      (b & VARINT_CONTINUATION_FLAG) == VARINT_CONTINUATION_FLAG
    } {}
    res.try_into().map_err(|_| io::Error::other("VarInt does not fit into integer type"))
  }

  /// Encode and write a VarInt.
  ///
  /// This takes `&Self` rather than `self` so callers are explicit about invoking `VarInt::write`.
  fn write<W: Write>(varint: &Self, w: &mut W) -> io::Result<()> {
    let mut varint: u64 = varint.into_u64();

    // A do-while loop, as at least one byte must always be written
    while {
      // Take the next 7 bits
      let mut b = u8::try_from(varint & u64::from(VARINT_VALUE_MASK))
        .expect("& 0b0111_1111 left more than 8 bits set");
      varint >>= 7;

      // Set the continuation bit if there's more to encode
      if varint != 0 {
        b |= VARINT_CONTINUATION_FLAG;
      }

      write_byte(&b, w)?;

      varint != 0
    } {}

    Ok(())
  }
}

impl sealed::Sealed for u8 {
  fn into_u64(self) -> u64 {
    self.into()
  }
}
impl VarInt for u8 {
  const LOWER_BOUND: usize = 1;
  const UPPER_BOUND: usize = upper_bound(Self::BITS);
}

impl sealed::Sealed for u32 {
  fn into_u64(self) -> u64 {
    self.into()
  }
}
impl VarInt for u32 {
  const LOWER_BOUND: usize = 1;
  const UPPER_BOUND: usize = upper_bound(Self::BITS);
}

impl sealed::Sealed for u64 {
  fn into_u64(self) -> u64 {
    self
  }
}
impl VarInt for u64 {
  const LOWER_BOUND: usize = 1;
  const UPPER_BOUND: usize = upper_bound(Self::BITS);
}

impl sealed::Sealed for usize {
  fn into_u64(self) -> u64 {
    // Ensure the falling conversion is infallible
    const _NO_128_BIT_PLATFORMS: [(); (u64::BITS - usize::BITS) as usize] =
      [(); (u64::BITS - usize::BITS) as usize];

    self.try_into().expect("compiling on platform with <64-bit usize yet value didn't fit in u64")
  }
}
impl VarInt for usize {
  const LOWER_BOUND: usize = 1;
  const UPPER_BOUND: usize = upper_bound(Self::BITS);
}
