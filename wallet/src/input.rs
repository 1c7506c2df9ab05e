//! Input finalization: deriving each ring's private ephemeral and producing the wire-encoded
//! `KeyInput` (relative-indexed ring offsets).

use zeroize::Zeroizing;

use monero_oxide::primitives::{derive_secret_key, generate_key_derivation};
use monero_oxide_ed25519::Scalar;

use crate::types::ObscuredInput;

/// A finalized input: its wire-ready relative-offset ring plus the private ephemeral needed to
/// sign it.
pub struct FinalizedInput {
  /// This input's amount, in atomic units.
  pub amount: u64,
  /// This input's key image.
  pub key_image: monero_oxide_ed25519::CompressedPoint,
  /// The ring offsets, relative-encoded: the first is absolute, each later one a delta from its
  /// predecessor.
  pub relative_offsets: Vec<u64>,
  /// The ring of public keys, in the same (sorted) order `relative_offsets` was derived from.
  pub ring: Vec<monero_oxide_ed25519::CompressedPoint>,
  /// The position within `ring` of the real output.
  pub real_output_position: usize,
  /// The private ephemeral matching the real output, needed to sign this input's ring.
  pub private_ephemeral: Zeroizing<Scalar>,
}

/// Finalize every obscured input: derive or reuse each one's private ephemeral, and relative-
/// encode its sorted ring.
///
/// Reports, via a single `tracing::debug!`, how many ephemerals were reused from sync versus
/// freshly derived here.
pub fn finalize_inputs(
  obscured: Vec<ObscuredInput>,
  private_view_key: &Scalar,
) -> Vec<FinalizedInput> {
  let mut pre_generated = 0usize;
  let mut on_demand = 0usize;

  let finalized = obscured
    .into_iter()
    .map(|input| {
      let private_ephemeral = match input.private_ephemeral {
        Some(ephemeral) => {
          pre_generated += 1;
          ephemeral
        }
        None => {
          on_demand += 1;
          let derivation =
            generate_key_derivation(&input.real_tx_public_key.decompress().expect("real output's tx public key wasn't a valid point"), private_view_key);
          Zeroizing::new(derive_secret_key(
            &derivation,
            input.real_output_tx_index,
            &input.owner_private_spend_key,
          ))
        }
      };

      let absolute_indexes: Vec<u64> = input.outputs.iter().map(|(index, _)| *index).collect();
      let ring = input.outputs.iter().map(|(_, key)| *key).collect();

      FinalizedInput {
        amount: input.amount,
        key_image: input.key_image,
        relative_offsets: relative_encode(&absolute_indexes),
        ring,
        real_output_position: input.real_output_position,
        private_ephemeral,
      }
    })
    .collect();

  tracing::debug!(pre_generated, on_demand, "finalized input batch");

  finalized
}

/// Relative-encode a sequence already sorted ascending: the first element is absolute, each
/// later one is the delta to its predecessor.
fn relative_encode(absolute: &[u64]) -> Vec<u64> {
  let mut out = Vec::with_capacity(absolute.len());
  let mut previous = 0u64;
  for &index in absolute {
    out.push(index - previous);
    previous = index;
  }
  out
}

/// Decode a relative-encoded sequence back to absolute indexes.
///
/// A left inverse of [`relative_encode`]: the first decoded index equals the first absolute
/// index the encoder was given.
pub fn relative_decode(relative: &[u64]) -> Vec<u64> {
  let mut out = Vec::with_capacity(relative.len());
  let mut running = 0u64;
  for &delta in relative {
    running += delta;
    out.push(running);
  }
  out
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn relative_encoding_round_trips() {
    let absolute = vec![5u64, 5, 12, 40];
    let relative = relative_encode(&absolute);
    assert_eq!(relative, vec![5, 0, 7, 28]);
    assert_eq!(relative_decode(&relative), absolute);
  }

  #[test]
  fn relative_encoding_of_single_element_is_itself() {
    let absolute = vec![42u64];
    assert_eq!(relative_encode(&absolute), vec![42]);
    assert_eq!(relative_decode(&[42]), vec![42]);
  }
}
