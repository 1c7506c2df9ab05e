//! Output building: deriving fresh one-time keys for every destination under a fresh per-
//! transaction key pair.

use zeroize::Zeroizing;

use rand_core::{CryptoRng, RngCore};

use monero_oxide::primitives::{derive_public_key, generate_key_derivation};
use monero_oxide_ed25519::{CompressedPoint, Scalar};

use crate::types::{Destination, KeyOutput};

/// The outcome of building a transaction's outputs: the one-time keys plus the transaction key
/// pair that derived them.
pub struct BuiltOutputs {
  /// The outputs, in the same (sorted-by-amount) order they'll be wire-encoded in.
  pub outputs: Vec<KeyOutput>,
  /// The fresh transaction public key.
  pub tx_public_key: CompressedPoint,
  /// The fresh transaction secret key.
  pub tx_secret_key: Zeroizing<Scalar>,
}

/// Build one-time outputs for `destinations`.
///
/// Destinations are sorted ascending by amount before derivation so the wire order doesn't leak
/// which destination a caller listed first; the sort index is what's fed into key derivation, so
/// it must be assigned after sorting.
pub fn build_outputs(
  destinations: &[Destination],
  rng: &mut (impl RngCore + CryptoRng),
) -> BuiltOutputs {
  let mut sorted = destinations.to_vec();
  sorted.sort_by_key(|destination| destination.amount);

  let tx_secret_key = Zeroizing::new(Scalar::random(rng));
  let tx_public_key =
    CompressedPoint::from((curve25519_dalek::EdwardsPoint::mul_base(&(*tx_secret_key).into())).compress().to_bytes());

  let outputs = sorted
    .iter()
    .enumerate()
    .map(|(index, destination)| {
      let derivation = generate_key_derivation(
        &destination
          .receiver_public_view_key
          .decompress()
          .expect("destination's public view key wasn't a valid point"),
        &tx_secret_key,
      );
      let one_time_public_key = derive_public_key(
        &derivation,
        index as u64,
        &destination.receiver_public_spend_key,
      )
      .expect("destination's public spend key wasn't a valid point");
      KeyOutput { one_time_public_key, amount: destination.amount }
    })
    .collect();

  BuiltOutputs { outputs, tx_public_key, tx_secret_key }
}

#[cfg(test)]
mod tests {
  use super::*;
  use rand_core::OsRng;

  fn keypair(rng: &mut (impl RngCore + CryptoRng)) -> (Scalar, CompressedPoint) {
    let secret = Scalar::random(rng);
    let public =
      CompressedPoint::from(curve25519_dalek::EdwardsPoint::mul_base(&secret.into()).compress().to_bytes());
    (secret, public)
  }

  #[test]
  fn outputs_are_sorted_ascending_by_amount() {
    let mut rng = OsRng;
    let (_, spend_a) = keypair(&mut rng);
    let (_, view_a) = keypair(&mut rng);
    let (_, spend_b) = keypair(&mut rng);
    let (_, view_b) = keypair(&mut rng);

    let destinations = vec![
      Destination { receiver_public_spend_key: spend_a, receiver_public_view_key: view_a, amount: 900 },
      Destination { receiver_public_spend_key: spend_b, receiver_public_view_key: view_b, amount: 100 },
    ];

    let built = build_outputs(&destinations, &mut rng);
    assert_eq!(built.outputs.len(), 2);
    assert_eq!(built.outputs[0].amount, 100);
    assert_eq!(built.outputs[1].amount, 900);
  }

  #[test]
  fn one_time_keys_derive_from_the_fresh_tx_key_pair() {
    let mut rng = OsRng;
    let (view_secret, view_public) = keypair(&mut rng);
    let (_spend_secret, spend_public) = keypair(&mut rng);

    let destinations = vec![Destination {
      receiver_public_spend_key: spend_public,
      receiver_public_view_key: view_public,
      amount: 42,
    }];
    let built = build_outputs(&destinations, &mut rng);

    let derivation = generate_key_derivation(&built.tx_public_key.decompress().unwrap(), &view_secret);
    let expected = derive_public_key(&derivation, 0, &spend_public).unwrap();
    assert_eq!(built.outputs[0].one_time_public_key, expected);
  }
}
