//! Ring assembly: pulling decoy outputs from the node and merging the real output into a
//! sorted, mixin-wide ring for each input being spent.

use std::collections::HashMap;

use monero_oxide_ed25519::CompressedPoint;

use crate::error::SendError;
use crate::traits::NodeClient;
use crate::types::{ObscuredInput, SpendableInput};

/// Build one [`ObscuredInput`] per real input, each carrying a sorted ring of `mixin + 1`
/// members (decoys plus the real output).
///
/// `inputs` should already be in the caller's selection order; this function doesn't reorder
/// them relative to each other, only the ring members within each one.
pub fn assemble_rings(
  inputs: &[SpendableInput],
  mixin: usize,
  node: &dyn NodeClient,
) -> Result<Vec<ObscuredInput>, SendError> {
  if mixin == 0 {
    return Ok(inputs.iter().map(self_only_ring).collect());
  }

  let mut distinct_amounts: Vec<u64> = inputs.iter().map(|input| input.amount).collect();
  distinct_amounts.sort_unstable();
  distinct_amounts.dedup();

  let groups = node
    .get_random_outs_by_amounts(&distinct_amounts, mixin + 1)
    .map_err(|()| SendError::DaemonOffline)?;

  let mut decoys_by_amount: HashMap<u64, Vec<(u64, CompressedPoint)>> = HashMap::new();
  for group in groups {
    decoys_by_amount.entry(group.amount).or_default().extend(group.outs);
  }

  for &amount in &distinct_amounts {
    let count = decoys_by_amount.get(&amount).map_or(0, Vec::len);
    if count < mixin {
      return Err(SendError::NotEnoughFakeOutputs(format!(
        "amount {amount} had only {count} candidate decoys, needed at least {mixin}"
      )));
    }
  }

  inputs.iter().map(|input| obscure_input(input, mixin, &decoys_by_amount)).collect()
}

fn self_only_ring(input: &SpendableInput) -> ObscuredInput {
  ObscuredInput {
    outputs: vec![(
      input.global_output_index.unwrap_or_default(),
      input.one_time_public_key,
    )],
    real_output_position: 0,
    real_tx_public_key: input.tx_public_key,
    real_output_tx_index: input.index_within_tx,
    amount: input.amount,
    owner_public_spend_key: input.owner_public_spend_key,
    owner_private_spend_key: input.owner_private_spend_key.clone(),
    key_image: input.key_image,
    private_ephemeral: input.private_ephemeral.clone(),
  }
}

fn obscure_input(
  input: &SpendableInput,
  mixin: usize,
  decoys_by_amount: &HashMap<u64, Vec<(u64, CompressedPoint)>>,
) -> Result<ObscuredInput, SendError> {
  let real_index = input.global_output_index.ok_or_else(|| {
    SendError::NotEnoughFakeOutputs(format!(
      "input with key image {:?} entered ring assembly without a global output index",
      input.key_image.to_bytes()
    ))
  })?;

  let candidates = decoys_by_amount.get(&input.amount).ok_or_else(|| {
    SendError::NotEnoughFakeOutputs(format!("no decoys returned for amount {}", input.amount))
  })?;

  let mut ring: Vec<(u64, CompressedPoint)> = candidates
    .iter()
    .filter(|(global_index, _)| *global_index != real_index)
    .take(mixin)
    .copied()
    .collect();

  if ring.len() < mixin {
    return Err(SendError::NotEnoughFakeOutputs(format!(
      "amount {} had only {} usable decoys after excluding the real output, needed {mixin}",
      input.amount,
      ring.len()
    )));
  }

  ring.push((real_index, input.one_time_public_key));
  ring.sort_unstable_by_key(|(global_index, _)| *global_index);
  let real_output_position = ring
    .iter()
    .position(|(global_index, key)| *global_index == real_index && *key == input.one_time_public_key)
    .expect("just inserted the real output into this ring");

  Ok(ObscuredInput {
    outputs: ring,
    real_output_position,
    real_tx_public_key: input.tx_public_key,
    real_output_tx_index: input.index_within_tx,
    amount: input.amount,
    owner_public_spend_key: input.owner_public_spend_key,
    owner_private_spend_key: input.owner_private_spend_key.clone(),
    key_image: input.key_image,
    private_ephemeral: input.private_ephemeral.clone(),
  })
}

#[cfg(test)]
mod tests {
  use super::*;

  struct FakeNode {
    decoys: Vec<(u64, Vec<(u64, CompressedPoint)>)>,
  }

  impl NodeClient for FakeNode {
    fn network_block_count(&self) -> Result<u64, String> {
      Ok(0)
    }

    fn node_fee(&self) -> Result<(u64, Option<String>), String> {
      Ok((0, None))
    }

    fn get_random_outs_by_amounts(
      &self,
      amounts: &[u64],
      _count: usize,
    ) -> Result<Vec<crate::traits::DecoyOutputsForAmount>, ()> {
      Ok(
        self
          .decoys
          .iter()
          .filter(|(amount, _)| amounts.contains(amount))
          .map(|(amount, outs)| crate::traits::DecoyOutputsForAmount { amount: *amount, outs: outs.clone() })
          .collect(),
      )
    }

    fn send_transaction(&self, _transaction: &monero_oxide::transaction::Transaction) -> Result<(), (bool, String)> {
      Ok(())
    }
  }

  fn point(byte: u8) -> CompressedPoint {
    let mut bytes = [0u8; 32];
    bytes[0] = byte;
    CompressedPoint::from(bytes)
  }

  fn input(amount: u64, global_index: u64) -> SpendableInput {
    use zeroize::Zeroizing;
    SpendableInput {
      key_image: point(global_index as u8),
      amount,
      parent_tx_hash: [0; 32],
      tx_public_key: point(1),
      index_within_tx: 0,
      global_output_index: Some(global_index),
      one_time_public_key: point(200),
      unlock_height_or_time: 0,
      owner_public_spend_key: point(2),
      owner_private_spend_key: Zeroizing::new(monero_oxide_ed25519::Scalar::ZERO),
      private_ephemeral: None,
    }
  }

  #[test]
  fn mixin_zero_gives_self_only_rings() {
    let inputs = vec![input(1_000, 5)];
    let rings = assemble_rings(&inputs, 0, &FakeNode { decoys: vec![] }).unwrap();
    assert_eq!(rings.len(), 1);
    assert_eq!(rings[0].outputs.len(), 1);
    assert_eq!(rings[0].real_output_position, 0);
  }

  #[test]
  fn ring_is_sorted_and_real_position_tracked() {
    let decoys = vec![(1_000, vec![(1, point(10)), (3, point(11)), (9, point(12))])];
    let inputs = vec![input(1_000, 5)];
    let rings = assemble_rings(&inputs, 3, &FakeNode { decoys }).unwrap();
    let ring = &rings[0];
    assert_eq!(ring.outputs.len(), 4);
    let indexes: Vec<u64> = ring.outputs.iter().map(|(i, _)| *i).collect();
    let mut sorted = indexes.clone();
    sorted.sort_unstable();
    assert_eq!(indexes, sorted);
    assert_eq!(ring.outputs[ring.real_output_position], (5, point(200)));
  }

  #[test]
  fn not_enough_decoys_fails() {
    let decoys = vec![(1_000, vec![(1, point(10))])];
    let inputs = vec![input(1_000, 5)];
    let err = assemble_rings(&inputs, 3, &FakeNode { decoys }).unwrap_err();
    assert!(matches!(err, SendError::NotEnoughFakeOutputs(_)));
  }
}
