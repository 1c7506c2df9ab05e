//! Building the `tx_extra` blob: an optional nonce (payment ID and/or arbitrary data) followed by
//! the transaction public key.

use monero_oxide::io::VarInt;
use monero_oxide_ed25519::CompressedPoint;

use crate::constants::{ARBITRARY_DATA_ID, EXTRA_NONCE_ID, EXTRA_PUBKEY_ID, PAYMENT_ID_ID};

/// Assemble `tx_extra` for a single transaction.
///
/// `payment_id` is a 32-byte tag (already hashed/encrypted by the caller, if at all); empty
/// `arbitrary_data` is treated as absent, same as `payment_id` being `None`.
pub fn build_extra(
  tx_public_key: &CompressedPoint,
  payment_id: Option<[u8; 32]>,
  arbitrary_data: &[u8],
) -> Vec<u8> {
  let mut extra = Vec::new();

  let mut nonce = Vec::new();
  if let Some(payment_id) = payment_id {
    nonce.push(PAYMENT_ID_ID);
    nonce.extend_from_slice(&payment_id);
  }
  if !arbitrary_data.is_empty() {
    nonce.push(ARBITRARY_DATA_ID);
    VarInt::write(&arbitrary_data.len(), &mut nonce).expect("write failed but Vec doesn't fail");
    nonce.extend_from_slice(arbitrary_data);
  }
  if !nonce.is_empty() {
    extra.push(EXTRA_NONCE_ID);
    VarInt::write(&nonce.len(), &mut extra).expect("write failed but Vec doesn't fail");
    extra.extend_from_slice(&nonce);
  }

  extra.push(EXTRA_PUBKEY_ID);
  extra.extend_from_slice(&tx_public_key.to_bytes());

  extra
}
