//! Relay and bookkeeping: submitting a built transaction to the node and atomically updating the
//! wallet's local spent/locked/unconfirmed state.

use std::collections::HashMap;

use monero_oxide::primitives::{generate_key_derivation, underive_public_key};
use monero_oxide_ed25519::CompressedPoint;

use crate::error::SendError;
use crate::traits::{NodeClient, SubwalletContainer};
use crate::types::{SpendableInput, TransactionResult, UnconfirmedIncoming, UnconfirmedTransaction};

const ALREADY_SPENT_SUBSTRING: &str = "Transaction contains an input which has already been spent - Key image: ";

/// Extract the key image hex that follows [`ALREADY_SPENT_SUBSTRING`] in a daemon error message,
/// if present.
///
/// Defensive by construction: an exact prefix match, then a strict-length hex decode, so a
/// similar-looking but malformed message is simply not recognized rather than mis-parsed.
fn extract_already_spent_key_image(message: &str) -> Option<CompressedPoint> {
  let hex = message.strip_prefix(ALREADY_SPENT_SUBSTRING)?.trim();
  if hex.len() != 64 {
    return None;
  }
  let mut bytes = [0u8; 32];
  for (i, byte) in bytes.iter_mut().enumerate() {
    *byte = u8::from_str_radix(hex.get(i * 2..i * 2 + 2)?, 16).ok()?;
  }
  Some(CompressedPoint::from(bytes))
}

/// Relay `result`, spending `inputs`, then record the outcome in `container`.
///
/// Every output that derives back to one of the wallet's own public spend keys (the change
/// output, most commonly) is recorded as unconfirmed incoming under that spend key, mirroring
/// how a receiver would scan the transaction later.
///
/// On a remote "already spent" rejection, the offending key image is marked locally before the
/// error is surfaced, so a retry doesn't attempt to reuse it. All other failures leave the
/// container untouched.
///
/// `change_address_spend_key`/`change_amount` describe any self-addressed change this transaction
/// produced (§4.H); they feed the recorded transaction's transfers map alongside `-amount` for
/// each of `inputs`' owning spend keys.
pub fn relay_and_record(
  result: &TransactionResult,
  inputs: &[SpendableInput],
  change_address_spend_key: Option<CompressedPoint>,
  change_amount: u64,
  node: &dyn NodeClient,
  container: &dyn SubwalletContainer,
) -> Result<(), SendError> {
  match node.send_transaction(&result.transaction) {
    Ok(()) => {}
    Err((true, _)) => return Err(SendError::DaemonOffline),
    Err((false, message)) => {
      if let Some(key_image) = extract_already_spent_key_image(&message) {
        container.mark_input_as_spent(&key_image, 0);
      }
      return Err(SendError::DaemonError(message));
    }
  }

  for input in inputs {
    container.mark_input_as_locked(&input.key_image, &input.owner_public_spend_key);
  }

  let parent_tx_hash = result.transaction.hash();
  let (tx_public_key, tx_secret_key) = &result.tx_key_pair;
  let derivation = generate_key_derivation(
    &tx_public_key.decompress().expect("our own freshly generated tx public key wasn't a valid point"),
    &container.private_view_key(),
  );
  let owned_spend_keys = container.public_spend_keys();

  for (index, output) in result.outputs.iter().enumerate() {
    let Some(candidate_spend_key) =
      underive_public_key(&derivation, index as u64, &output.one_time_public_key)
    else {
      continue;
    };
    if let Some(owner) = owned_spend_keys.iter().find(|key| **key == candidate_spend_key) {
      container.store_unconfirmed_incoming_input(
        UnconfirmedIncoming {
          amount: output.amount,
          one_time_pk: output.one_time_public_key,
          parent_tx_hash,
        },
        owner,
      );
    }
  }

  container.store_tx_private_key(tx_secret_key.clone(), parent_tx_hash);

  let mut transfers: HashMap<CompressedPoint, i64> = HashMap::new();
  for input in inputs {
    let amount = i64::try_from(input.amount).unwrap_or(i64::MAX);
    *transfers.entry(input.owner_public_spend_key).or_insert(0) -= amount;
  }
  if let Some(change_spend_key) = change_address_spend_key {
    let amount = i64::try_from(change_amount).unwrap_or(i64::MAX);
    *transfers.entry(change_spend_key).or_insert(0) += amount;
  }

  container.add_unconfirmed_transaction(
    UnconfirmedTransaction { transfers, timestamp: 0, block_height: 0, unlock_time: 0, is_coinbase: false },
    parent_tx_hash,
  );

  Ok(())
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn extracts_key_image_from_a_well_formed_message() {
    let hex = "a".repeat(64);
    let message = format!("{ALREADY_SPENT_SUBSTRING}{hex}");
    let key_image = extract_already_spent_key_image(&message).unwrap();
    assert_eq!(key_image.to_bytes(), [0xaa; 32]);
  }

  #[test]
  fn rejects_messages_without_the_exact_prefix() {
    assert!(extract_already_spent_key_image("some other daemon error").is_none());
  }

  #[test]
  fn rejects_a_malformed_key_image_length() {
    let message = format!("{ALREADY_SPENT_SUBSTRING}deadbeef");
    assert!(extract_already_spent_key_image(&message).is_none());
  }
}
