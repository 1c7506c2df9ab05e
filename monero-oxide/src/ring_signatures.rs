// Classic (pre-RingCT) ring signatures: a plain Schnorr-style ring signature over a key image.
use std_shims::{
  io::{self, *},
  vec::Vec,
};

use zeroize::Zeroize;

use rand_core::{RngCore, CryptoRng};

use crate::{io::*, ed25519::*};

/// A single ring member's signature share, `(c, s)`.
#[derive(Clone, PartialEq, Eq, Debug, Zeroize)]
pub(crate) struct Signature {
  #[cfg(test)]
  pub(crate) c: Scalar,
  #[cfg(test)]
  pub(crate) s: Scalar,
  #[cfg(not(test))]
  c: Scalar,
  #[cfg(not(test))]
  s: Scalar,
}

impl Signature {
  fn write<W: Write>(&self, w: &mut W) -> io::Result<()> {
    self.c.write(w)?;
    self.s.write(w)?;
    Ok(())
  }

  fn read<R: Read>(r: &mut R) -> io::Result<Signature> {
    Ok(Signature { c: Scalar::read(r)?, s: Scalar::read(r)? })
  }
}

/// A ring signature, one `Signature` per ring member.
#[derive(Clone, PartialEq, Eq, Debug, Zeroize)]
pub struct RingSignature {
  #[cfg(test)]
  pub(crate) sigs: Vec<Signature>,
  #[cfg(not(test))]
  sigs: Vec<Signature>,
}

impl RingSignature {
  /// Write the RingSignature.
  pub fn write<W: Write>(&self, w: &mut W) -> io::Result<()> {
    for sig in &self.sigs {
      sig.write(w)?;
    }
    Ok(())
  }

  /// Read a RingSignature with the given number of ring members.
  pub fn read<R: Read>(members: usize, r: &mut R) -> io::Result<RingSignature> {
    Ok(RingSignature { sigs: read_raw_vec(Signature::read, members, r)? })
  }

  /// Generate a ring signature spending the output at `signing_index` within `ring`.
  ///
  /// `msg_hash` must be the transaction's signature hash; `private_ephemeral` the one-time
  /// private key matching `ring[signing_index]`; `key_image` its key image. Every other position
  /// in `ring` is a decoy and contributes no secret material to the signature.
  ///
  /// This is the classic Schnorr-style ring signature CryptoNote used before CLSAG: a random
  /// `(c, s)` pair is sampled for every decoy, and the real position's pair is the one solved
  /// algebraically so the Fiat-Shamir challenges close the ring.
  pub fn sign(
    rng: &mut (impl RngCore + CryptoRng),
    msg_hash: &[u8; 32],
    ring: &[CompressedPoint],
    signing_index: usize,
    private_ephemeral: &Scalar,
    key_image: &CompressedPoint,
  ) -> io::Result<Self> {
    if signing_index >= ring.len() {
      Err(io::Error::other("signing index out of bounds for ring"))?;
    }

    let key_image = key_image
      .decompress()
      .and_then(Point::key_image)
      .ok_or_else(|| io::Error::other("key image wasn't a valid point"))?;

    let mut decompressed = Vec::with_capacity(ring.len());
    for member in ring {
      decompressed
        .push(member.decompress().ok_or_else(|| io::Error::other("ring member wasn't a valid point"))?);
    }

    let k = Scalar::random(&mut *rng);
    let mut cs = vec![Scalar::ZERO; ring.len()];
    let mut ss = vec![Scalar::ZERO; ring.len()];

    let mut buf = Vec::with_capacity(32 + (2 * 32 * ring.len()));
    buf.extend_from_slice(msg_hash);

    let mut sum_of_decoy_cs = curve25519_dalek::Scalar::ZERO;
    for (i, ring_member) in ring.iter().enumerate() {
      let hashed_point: curve25519_dalek::EdwardsPoint = Point::biased_hash(ring_member.to_bytes()).into();

      #[allow(non_snake_case)]
      let (Li, Ri) = if i == signing_index {
        (
          curve25519_dalek::EdwardsPoint::mul_base(&k.into()),
          hashed_point * k.into(),
        )
      } else {
        let c = Scalar::random(&mut *rng);
        let s = Scalar::random(&mut *rng);
        sum_of_decoy_cs += c.into();

        #[allow(non_snake_case)]
        let Li = curve25519_dalek::EdwardsPoint::vartime_double_scalar_mul_basepoint(
          &c.into(),
          &decompressed[i].into(),
          &s.into(),
        );
        #[allow(non_snake_case)]
        let Ri = (hashed_point * s.into()) +
          (c.into() * key_image);

        cs[i] = c;
        ss[i] = s;
        (Li, Ri)
      };

      buf.extend_from_slice(Li.compress().as_bytes());
      buf.extend_from_slice(Ri.compress().as_bytes());
    }

    let c: curve25519_dalek::Scalar = Scalar::hash(buf).into();
    let c_signing_index = c - sum_of_decoy_cs;
    let s_signing_index =
      k.into() - (c_signing_index * (*private_ephemeral).into());

    cs[signing_index] = Scalar::from(c_signing_index);
    ss[signing_index] = Scalar::from(s_signing_index);

    Ok(RingSignature {
      sigs: cs.into_iter().zip(ss).map(|(c, s)| Signature { c, s }).collect(),
    })
  }

  /// Verify a ring signature.
  ///
  /// This follows Monero's Fiat-Shamir transcript layout, which assumes a specific construction
  /// for `msg_hash`; using an incorrect `msg_hash` silently produces a meaningless check.
  pub fn verify(
    &self,
    msg_hash: &[u8; 32],
    ring: &[CompressedPoint],
    key_image: &CompressedPoint,
  ) -> bool {
    if ring.len() != self.sigs.len() {
      return false;
    }

    let Some(key_image) = key_image.decompress() else {
      return false;
    };
    let Some(key_image) = key_image.key_image() else {
      return false;
    };

    let mut buf = Vec::with_capacity(32 + (2 * 32 * ring.len()));
    buf.extend_from_slice(msg_hash);

    let mut sum = curve25519_dalek::Scalar::ZERO;
    for (ring_member, sig) in ring.iter().zip(&self.sigs) {
      let Some(decomp_ring_member) = ring_member.decompress() else {
        return false;
      };

      #[allow(non_snake_case)]
      let Li = curve25519_dalek::EdwardsPoint::vartime_double_scalar_mul_basepoint(
        &sig.c.into(),
        &decomp_ring_member.into(),
        &sig.s.into(),
      );
      buf.extend_from_slice(Li.compress().as_bytes());
      #[allow(non_snake_case)]
      let Ri = (sig.s.into() * Point::biased_hash(ring_member.to_bytes()).into()) +
        (sig.c.into() * key_image);
      buf.extend_from_slice(Ri.compress().as_bytes());

      sum += sig.c.into();
    }
    Scalar::from(sum) == Scalar::hash(buf)
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use rand_core::OsRng;

  fn keypair(rng: &mut (impl RngCore + CryptoRng)) -> (Scalar, CompressedPoint) {
    let secret = Scalar::random(rng);
    let public =
      Point::from(curve25519_dalek::EdwardsPoint::mul_base(&secret.into())).compress();
    (secret, public)
  }

  #[test]
  fn sign_and_verify_round_trip() {
    let mut rng = OsRng;

    let (secret, spent) = keypair(&mut rng);
    let mut ring = vec![keypair(&mut rng).1, keypair(&mut rng).1, spent, keypair(&mut rng).1];
    let signing_index = 2;
    ring[signing_index] = spent;

    let key_image = crate::primitives::generate_key_image(&spent, &secret);
    let msg_hash = [7u8; 32];

    let signature =
      RingSignature::sign(&mut rng, &msg_hash, &ring, signing_index, &secret, &key_image).unwrap();

    assert!(signature.verify(&msg_hash, &ring, &key_image));
  }

  #[test]
  fn tampered_message_fails_verification() {
    let mut rng = OsRng;

    let (secret, spent) = keypair(&mut rng);
    let ring = vec![keypair(&mut rng).1, spent, keypair(&mut rng).1];
    let key_image = crate::primitives::generate_key_image(&spent, &secret);
    let msg_hash = [1u8; 32];

    let signature = RingSignature::sign(&mut rng, &msg_hash, &ring, 1, &secret, &key_image).unwrap();

    assert!(!signature.verify(&[2u8; 32], &ring, &key_image));
  }
}
