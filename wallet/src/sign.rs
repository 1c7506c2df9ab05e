//! Signing: hashing the transaction prefix and generating (then self-verifying) a ring signature
//! per input.

use rand_core::{CryptoRng, RngCore};

use monero_oxide::ring_signatures::RingSignature;
use monero_oxide::transaction::{Transaction, TransactionPrefix};

use crate::error::SendError;
use crate::input::FinalizedInput;

/// Sign every input in `prefix` against `finalized_inputs`, self-verifying each ring signature
/// before returning.
///
/// `finalized_inputs` must be aligned with `prefix.inputs`, in the same order.
pub fn sign_transaction(
  prefix: TransactionPrefix,
  finalized_inputs: &[FinalizedInput],
  rng: &mut (impl RngCore + CryptoRng),
) -> Result<Transaction, SendError> {
  let unsigned = Transaction { prefix, signatures: Vec::new() };
  let prefix_hash = unsigned
    .signature_hash()
    .expect("a transaction built from at least one ToKey input always has a signature hash");

  let mut signatures = Vec::with_capacity(finalized_inputs.len());
  for input in finalized_inputs {
    let signature = RingSignature::sign(
      rng,
      &prefix_hash,
      &input.ring,
      input.real_output_position,
      &input.private_ephemeral,
      &input.key_image,
    )
    .map_err(|_| SendError::FailedToCreateRingSignature)?;

    if !signature.verify(&prefix_hash, &input.ring, &input.key_image) {
      return Err(SendError::FailedToCreateRingSignature);
    }

    signatures.push(signature);
  }

  Ok(Transaction { prefix: unsigned.prefix, signatures })
}

#[cfg(test)]
mod tests {
  use super::*;
  use rand_core::OsRng;

  use monero_oxide::primitives::generate_key_image;
  use monero_oxide::transaction::{Input, Output, Timelock};
  use monero_oxide_ed25519::{CompressedPoint, Scalar};
  use zeroize::Zeroizing;

  fn keypair(rng: &mut (impl RngCore + CryptoRng)) -> (Scalar, CompressedPoint) {
    let secret = Scalar::random(rng);
    let public =
      CompressedPoint::from(curve25519_dalek::EdwardsPoint::mul_base(&secret.into()).compress().to_bytes());
    (secret, public)
  }

  #[test]
  fn signed_transaction_self_verifies() {
    let mut rng = OsRng;
    let (secret, spent) = keypair(&mut rng);
    let mut ring = vec![keypair(&mut rng).1, keypair(&mut rng).1, spent];
    let signing_index = 2;
    ring[signing_index] = spent;
    let key_image = generate_key_image(&spent, &secret);

    let prefix = TransactionPrefix {
      additional_timelock: Timelock::None,
      inputs: vec![Input::ToKey { amount: Some(1000), key_offsets: vec![1, 2, 3], key_image }],
      outputs: vec![Output { amount: 1000, key: keypair(&mut rng).1 }],
      extra: vec![1],
    };

    let finalized = vec![FinalizedInput {
      amount: 1000,
      key_image,
      relative_offsets: vec![1, 2, 3],
      ring,
      real_output_position: signing_index,
      private_ephemeral: Zeroizing::new(secret),
    }];

    let tx = sign_transaction(prefix, &finalized, &mut rng).unwrap();
    assert_eq!(tx.signatures.len(), 1);
    let prefix_hash = tx.signature_hash().unwrap();
    assert!(tx.signatures[0].verify(&prefix_hash, &finalized[0].ring, &key_image));
  }
}
