//! Decomposing an amount into canonical "pretty" denominations.
//!
//! Every amount this crate ever puts into an output (change or otherwise) is of the form
//! `d * 10^k` with `d` a single nonzero decimal digit. This keeps on-chain amounts from leaking
//! information about a wallet's exact balance beyond what the denomination reveals.

use std::sync::LazyLock;
use std::collections::HashSet;

use crate::constants::MAX_OUTPUT_SIZE_CLIENT;

/// The largest decimal position this crate will ever consider, bounded so `9 * 10^k` doesn't
/// overflow a `u64`.
const MAX_DIGIT_POSITION: u32 = 19;

/// The canonical set of amounts a built transaction's outputs may use.
///
/// Built once, lazily, by walking the same `(digit, position)` space
/// [`split_into_denominations`] itself walks: every oversized denomination the splitter would
/// otherwise emit is divided into ten equal chunks of the next position down, which is itself
/// already a member of this set, so the set doesn't need a separate entry for split chunks.
pub static PRETTY_AMOUNTS: LazyLock<HashSet<u64>> = LazyLock::new(|| {
  let mut set = HashSet::new();
  for position in 0..MAX_DIGIT_POSITION {
    let scale = 10u64.pow(position);
    for digit in 1..=9u64 {
      set.insert(digit * scale);
    }
  }
  set
});

/// Returns whether `amount` is a member of [`PRETTY_AMOUNTS`].
///
/// `0` is treated as pretty: the empty decomposition of `0` is trivially valid.
pub fn is_pretty_amount(amount: u64) -> bool {
  amount == 0 || PRETTY_AMOUNTS.contains(&amount)
}

/// Decompose `amount` into a sequence of canonical denominations summing back to `amount`.
///
/// Digits are read least-significant first; each nonzero digit `d` at position `k` emits
/// `d * 10^k`, in ascending-`k` order. When `prevent_too_large` is set and a digit would emit a
/// denomination above [`MAX_OUTPUT_SIZE_CLIENT`], that denomination is split into ten equal
/// chunks instead (each one position down), recursing until every chunk fits.
pub fn split_into_denominations(amount: u64, prevent_too_large: bool) -> Vec<u64> {
  let mut out = Vec::new();
  let mut remaining = amount;
  let mut scale = 1u64;
  while remaining > 0 {
    let digit = remaining % 10;
    if digit != 0 {
      emit_denomination(digit * scale, prevent_too_large, &mut out);
    }
    remaining /= 10;
    scale *= 10;
  }
  out
}

fn emit_denomination(denomination: u64, prevent_too_large: bool, out: &mut Vec<u64>) {
  if prevent_too_large && denomination > MAX_OUTPUT_SIZE_CLIENT {
    let chunk = denomination / 10;
    for _ in 0..10 {
      emit_denomination(chunk, prevent_too_large, out);
    }
  } else {
    out.push(denomination);
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use proptest::prelude::*;

  #[test]
  fn known_decompositions() {
    assert_eq!(split_into_denominations(500_000, true), vec![500_000]);
    assert_eq!(
      split_into_denominations(499_990, true),
      vec![90, 900, 9_000, 90_000, 400_000]
    );
    assert_eq!(split_into_denominations(0, true), Vec::<u64>::new());
    assert_eq!(split_into_denominations(1200, true), vec![200, 1000]);
  }

  #[test]
  fn every_pretty_amount_is_recognized() {
    assert!(is_pretty_amount(1));
    assert!(is_pretty_amount(9));
    assert!(is_pretty_amount(10));
    assert!(is_pretty_amount(9_000_000_000_000_000_000));
    assert!(!is_pretty_amount(11));
    assert!(!is_pretty_amount(25));
  }

  #[test]
  fn oversized_denomination_is_split_under_the_limit() {
    let oversized = MAX_OUTPUT_SIZE_CLIENT * 10;
    for chunk in split_into_denominations(oversized, true) {
      assert!(chunk <= MAX_OUTPUT_SIZE_CLIENT);
      assert!(is_pretty_amount(chunk));
    }
    assert_eq!(split_into_denominations(oversized, true).iter().sum::<u64>(), oversized);
  }

  proptest! {
    #[test]
    fn decomposition_sums_to_the_original_amount(amount in 0u64..10_000_000_000_000_000_000) {
      let parts = split_into_denominations(amount, true);
      prop_assert_eq!(parts.iter().sum::<u64>(), amount);
      for part in parts {
        prop_assert!(is_pretty_amount(part));
      }
    }
  }
}
