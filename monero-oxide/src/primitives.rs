//! Small protocol-wide primitives shared by the transaction and ring-signature modules.
//!
//! This mirrors the slice of `monero-primitives` this crate actually needs: a Keccak-256 hash
//! helper and the key-derivation functions used to turn a shared secret into a one-time key or
//! key image. Everything here operates on the curve types from [`crate::ed25519`].

#[allow(unused_imports)]
use std_shims::prelude::*;

use sha3::{Digest, Keccak256};

use crate::{
  io::VarInt,
  ed25519::{Scalar, Point, CompressedPoint},
};

/// Hash arbitrary bytes with Keccak-256.
pub fn keccak256(data: impl AsRef<[u8]>) -> [u8; 32] {
  Keccak256::digest(data.as_ref()).into()
}

/// Derive the shared secret (`8 * r * A` or `8 * a * R`, depending on which side calls this) used
/// to derive one-time keys and key images for a single transaction.
///
/// `scalar` is the caller's half of the Diffie-Hellman exchange (the transaction secret key when
/// building, the private view key when scanning); `point` is the other half.
pub fn generate_key_derivation(point: &Point, scalar: &Scalar) -> [u8; 32] {
  let point: curve25519_dalek::EdwardsPoint = (*point).into();
  let scalar: curve25519_dalek::Scalar = (*scalar).into();
  let shared = Point::from((point * scalar).mul_by_cofactor());
  shared.compress().to_bytes()
}

fn derivation_scalar(derivation: &[u8; 32], output_index: u64) -> Scalar {
  let mut buf = Vec::with_capacity(32 + 8);
  buf.extend_from_slice(derivation);
  VarInt::write(&output_index, &mut buf).expect("write failed but Vec doesn't fail");
  Scalar::hash(buf)
}

/// Derive the one-time public key for output `output_index` given the derivation and the
/// receiver's public spend key.
///
/// `one_time_public_key = Hs(derivation || output_index) * G + spend_key`.
pub fn derive_public_key(
  derivation: &[u8; 32],
  output_index: u64,
  spend_key: &CompressedPoint,
) -> Option<CompressedPoint> {
  let spend_key: curve25519_dalek::EdwardsPoint = spend_key.decompress()?.into();
  let scalar = derivation_scalar(derivation, output_index);
  let one_time = curve25519_dalek::EdwardsPoint::mul_base(&scalar.into()) + spend_key;
  Some(Point::from(one_time).compress())
}

/// Derive the private ephemeral (one-time secret) for output `output_index` given the derivation
/// and the owner's private spend key.
///
/// `private_ephemeral = Hs(derivation || output_index) + spend_secret`.
pub fn derive_secret_key(derivation: &[u8; 32], output_index: u64, spend_secret: &Scalar) -> Scalar {
  let scalar = derivation_scalar(derivation, output_index);
  Scalar::from(scalar.into() + (*spend_secret).into())
}

/// Recover the candidate public spend key an output would have been sent to, reversing
/// [`derive_public_key`]. Used to check whether a freshly-built output pays back to one of the
/// wallet's own public spend keys (the change output, most commonly).
pub fn underive_public_key(
  derivation: &[u8; 32],
  output_index: u64,
  one_time_public_key: &CompressedPoint,
) -> Option<CompressedPoint> {
  let one_time_public_key: curve25519_dalek::EdwardsPoint = one_time_public_key.decompress()?.into();
  let scalar = derivation_scalar(derivation, output_index);
  Some(
    Point::from(
      one_time_public_key - curve25519_dalek::EdwardsPoint::mul_base(&scalar.into()),
    )
    .compress(),
  )
}

/// Generate the key image for a one-time key, given its private ephemeral.
///
/// `key_image = private_ephemeral * Hp(one_time_public_key)`.
pub fn generate_key_image(one_time_public_key: &CompressedPoint, private_ephemeral: &Scalar) -> CompressedPoint {
  let hash_point = Point::biased_hash(one_time_public_key.to_bytes());
  Point::from(hash_point.into() * (*private_ephemeral).into()).compress()
}

#[cfg(test)]
mod tests {
  use super::*;
  use rand_core::OsRng;

  #[test]
  fn derive_and_underive_round_trip() {
    let spend_secret = Scalar::random(&mut OsRng);
    let spend_public =
      Point::from(curve25519_dalek::EdwardsPoint::mul_base(&spend_secret.into())).compress();

    let tx_secret = Scalar::random(&mut OsRng);
    let view_secret = Scalar::random(&mut OsRng);
    let view_public =
      Point::from(curve25519_dalek::EdwardsPoint::mul_base(&view_secret.into())).compress();

    let derivation_send = generate_key_derivation(&view_public.decompress().unwrap(), &tx_secret);
    let tx_public =
      Point::from(curve25519_dalek::EdwardsPoint::mul_base(&tx_secret.into())).compress();
    let derivation_recv = generate_key_derivation(&tx_public.decompress().unwrap(), &view_secret);
    assert_eq!(derivation_send, derivation_recv);

    let one_time = derive_public_key(&derivation_send, 0, &spend_public).unwrap();
    let recovered_spend = underive_public_key(&derivation_recv, 0, &one_time).unwrap();
    assert_eq!(recovered_spend, spend_public);

    let private_ephemeral = derive_secret_key(&derivation_send, 0, &spend_secret);
    let expected_one_time =
      Point::from(curve25519_dalek::EdwardsPoint::mul_base(&private_ephemeral.into())).compress();
    assert_eq!(expected_one_time, one_time);
  }
}
