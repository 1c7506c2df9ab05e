//! The fee/size feedback loop: selecting inputs, estimating a size-dependent fee, and re-
//! iterating when the actually-signed size demands more than was estimated.
//!
//! Also home to the fusion (consolidation) variant, which shares the same build pipeline but
//! replaces fee/change accounting with a fixed input/output ratio and size ceiling.

use rand_core::{CryptoRng, RngCore};

use monero_oxide_ed25519::{CompressedPoint, Scalar};
use monero_oxide::transaction::{Input, Output, Timelock, TransactionPrefix};

use crate::amounts::split_into_denominations;
use crate::constants::{
  FEE_PER_BYTE_CHUNK_SIZE, FUSION_TX_MAX_SIZE, FUSION_TX_MIN_INPUT_COUNT,
  FUSION_TX_MIN_IN_OUT_COUNT_RATIO, MAX_FEE_ADJUSTMENT_ITERATIONS, MINIMUM_FEE,
  MINIMUM_FEE_PER_BYTE_V1, MINIMUM_FEE_PER_BYTE_V1_HEIGHT,
};
use crate::decoys::assemble_rings;
use crate::error::SendError;
use crate::extra::build_extra;
use crate::input::finalize_inputs;
use crate::output::build_outputs;
use crate::sign::sign_transaction;
use crate::traits::NodeClient;
use crate::types::{Destination, FeeSpec, SpendableInput, TransactionResult};

/// A closed-form estimate of a built transaction's wire size, in bytes.
///
/// Mirrors the well-known approximation for the classic (non-RingCT) protocol: a fixed per-ring-
/// member cost for each input (covering the Schnorr-style signature share plus the key offset),
/// a fixed per-output cost, and the exact size of `extra`.
fn estimate_size(
  mixin: usize,
  num_inputs: usize,
  num_destinations: usize,
  has_payment_id: bool,
  arbitrary_data_size: usize,
) -> usize {
  const APPROXIMATE_INPUT_BYTES: usize = 80;
  const APPROXIMATE_OUTPUT_BYTES: usize = 34;
  const EXTRA_PUBKEY_BYTES: usize = 33;
  const EXTRA_NONCE_OVERHEAD_BYTES: usize = 4;
  const PAYMENT_ID_BYTES: usize = 33;

  let input_bytes = num_inputs * (mixin + 1) * APPROXIMATE_INPUT_BYTES;
  let output_bytes = num_destinations * APPROXIMATE_OUTPUT_BYTES;
  let mut extra_bytes = EXTRA_PUBKEY_BYTES;
  if has_payment_id || arbitrary_data_size != 0 {
    extra_bytes += EXTRA_NONCE_OVERHEAD_BYTES;
  }
  if has_payment_id {
    extra_bytes += PAYMENT_ID_BYTES;
  }
  extra_bytes += arbitrary_data_size;

  input_bytes + output_bytes + extra_bytes
}

/// Compute the fee for `size` bytes at `rate` atomic units per byte.
///
/// `size` is rounded up to a multiple of [`FEE_PER_BYTE_CHUNK_SIZE`] bytes first, so the fee
/// doesn't reveal a transaction's exact byte size, only which chunk it falls in.
fn fee_for_size(rate: f64, size: usize) -> u64 {
  let chunked_size = (size as u64).div_ceil(FEE_PER_BYTE_CHUNK_SIZE) * FEE_PER_BYTE_CHUNK_SIZE;
  #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
  let fee = (rate * (chunked_size as f64)).ceil() as u64;
  fee
}

/// The floor a [`FeeSpec::Fixed`] fee must clear at `current_height`.
///
/// Below [`MINIMUM_FEE_PER_BYTE_V1_HEIGHT`] the network only enforced the flat [`MINIMUM_FEE`];
/// at or above it, the per-byte rate took over (see §8 law on fee floors).
fn minimum_fixed_fee(current_height: u64, actual_size: usize) -> u64 {
  if current_height < MINIMUM_FEE_PER_BYTE_V1_HEIGHT {
    MINIMUM_FEE
  } else {
    fee_for_size(MINIMUM_FEE_PER_BYTE_V1, actual_size)
  }
}

/// Everything the build pipeline needs beyond inputs, destinations, and fee policy.
pub struct BuildContext<'a> {
  /// The ring width (decoys per input).
  pub mixin: usize,
  /// The optional payment-ID tag to embed.
  pub payment_id: Option<[u8; 32]>,
  /// Optional arbitrary data to embed alongside (or instead of) the payment ID.
  pub arbitrary_data: &'a [u8],
  /// Where change (or, for fusion, the consolidated outputs) should be sent.
  pub change_public_spend_key: CompressedPoint,
  /// The view key half of `change_public_spend_key`'s address.
  pub change_public_view_key: CompressedPoint,
  /// This wallet's private view key, used to finalize inputs.
  pub private_view_key: Scalar,
}

/// Build, sign, and measure a transaction for a fixed set of inputs and destinations.
fn build_and_sign(
  inputs: &[SpendableInput],
  destinations: &[Destination],
  ctx: &BuildContext<'_>,
  node: &dyn NodeClient,
  rng: &mut (impl RngCore + CryptoRng),
) -> Result<(TransactionResult, usize), SendError> {
  let mut sorted_inputs = inputs.to_vec();
  sorted_inputs.sort_by_key(|input| input.amount);

  let obscured = assemble_rings(&sorted_inputs, ctx.mixin, node)?;
  let finalized = finalize_inputs(obscured, &ctx.private_view_key);

  let built_outputs = build_outputs(destinations, rng);
  let extra = build_extra(&built_outputs.tx_public_key, ctx.payment_id, ctx.arbitrary_data);

  let prefix = TransactionPrefix {
    additional_timelock: Timelock::None,
    inputs: finalized
      .iter()
      .map(|input| Input::ToKey {
        amount: Some(input.amount),
        key_offsets: input.relative_offsets.clone(),
        key_image: input.key_image,
      })
      .collect(),
    outputs: built_outputs
      .outputs
      .iter()
      .map(|output| Output { amount: output.amount, key: output.one_time_public_key })
      .collect(),
    extra,
  };

  let transaction = sign_transaction(prefix, &finalized, rng)?;
  let size = transaction.serialize().len();

  Ok((
    TransactionResult {
      transaction,
      outputs: built_outputs.outputs,
      tx_key_pair: (built_outputs.tx_public_key, built_outputs.tx_secret_key),
    },
    size,
  ))
}

fn change_destination(ctx: &BuildContext<'_>, amount: u64) -> Destination {
  Destination {
    receiver_public_spend_key: ctx.change_public_spend_key,
    receiver_public_view_key: ctx.change_public_view_key,
    amount,
  }
}

/// Split `amount` into its canonical denominations and return one change [`Destination`] per
/// denomination, all paid to the wallet's own change address (§8 law 1).
fn change_destinations(ctx: &BuildContext<'_>, amount: u64) -> Vec<Destination> {
  split_into_denominations(amount, true).into_iter().map(|denomination| change_destination(ctx, denomination)).collect()
}

/// Split every destination's amount into its canonical denominations, one output per
/// denomination, each still paid to that destination's original receiver (§8 law 1).
fn denominate_destinations(destinations: &[Destination]) -> Vec<Destination> {
  destinations
    .iter()
    .flat_map(|destination| {
      split_into_denominations(destination.amount, true).into_iter().map(move |amount| Destination {
        receiver_public_spend_key: destination.receiver_public_spend_key,
        receiver_public_view_key: destination.receiver_public_view_key,
        amount,
      })
    })
    .collect()
}

enum AdjustOutcome {
  Done(TransactionResult, u64, u64),
  NeedMoreInputs(u64),
}

/// The bounded sub-loop (§4.G, §9 open question 2) that reconciles an estimated fee against the
/// actually-signed size.
#[allow(clippy::too_many_arguments)]
fn adjust_to_actual(
  selected_inputs: &[SpendableInput],
  destinations: &[Destination],
  send_all: bool,
  rate: f64,
  mut estimated_fee: u64,
  sum_of_inputs: u64,
  ctx: &BuildContext<'_>,
  node: &dyn NodeClient,
  rng: &mut (impl RngCore + CryptoRng),
) -> Result<AdjustOutcome, SendError> {
  let mut amount_pre_fee: u64 = destinations.iter().map(|destination| destination.amount).sum();

  for _ in 0..MAX_FEE_ADJUSTMENT_ITERATIONS {
    let amount_including_fee = amount_pre_fee + estimated_fee;
    let change = sum_of_inputs - amount_including_fee;

    let mut logical_destinations = destinations.to_vec();
    if send_all {
      logical_destinations[0].amount = amount_pre_fee;
    }
    let mut built_destinations = denominate_destinations(&logical_destinations);
    if change > 0 {
      built_destinations.extend(change_destinations(ctx, change));
    }

    let (tx_result, actual_size) = build_and_sign(selected_inputs, &built_destinations, ctx, node, rng)?;
    let actual_fee = fee_for_size(rate, actual_size);

    if amount_including_fee - amount_pre_fee >= actual_fee {
      // `estimated_fee`, not `actual_fee`, is what the built transaction actually reserved for
      // the fee (`amount_including_fee - change == sum(outputs) + estimated_fee`); reporting
      // `actual_fee` here would understate it whenever the estimate overshot the minimum.
      return Ok(AdjustOutcome::Done(tx_result, estimated_fee, change));
    }

    if send_all {
      amount_pre_fee = amount_including_fee - actual_fee;
    }
    if amount_pre_fee + actual_fee > sum_of_inputs {
      return Ok(AdjustOutcome::NeedMoreInputs(amount_pre_fee + actual_fee));
    }
    estimated_fee = actual_fee;
  }

  tracing::warn!(
    iterations = MAX_FEE_ADJUSTMENT_ITERATIONS,
    "fee/size adjustment loop exceeded its iteration bound without converging"
  );
  Err(SendError::NotEnoughBalance { needed: amount_pre_fee + estimated_fee })
}

/// Run the fee/size loop for a normal (non-fusion) send.
///
/// `available_inputs` supplies additional inputs, in the subwallet container's selection order,
/// if the currently-selected set can't cover the destinations (plus fee).
#[allow(clippy::too_many_arguments)]
pub fn build_with_fee_loop(
  mut selected_inputs: Vec<SpendableInput>,
  mut available_inputs: impl Iterator<Item = SpendableInput>,
  destinations: Vec<Destination>,
  fee_spec: FeeSpec,
  send_all: bool,
  current_height: u64,
  ctx: &BuildContext<'_>,
  node: &dyn NodeClient,
  rng: &mut (impl RngCore + CryptoRng),
) -> Result<(TransactionResult, u64, u64, Vec<SpendableInput>), SendError> {
  let total_pre_fee: u64 = destinations.iter().map(|destination| destination.amount).sum();
  let fixed_fee_component = if let FeeSpec::Fixed(fixed) = fee_spec { fixed } else { 0 };
  let total = total_pre_fee + fixed_fee_component;
  let has_payment_id = ctx.payment_id.is_some();

  loop {
    let sum_of_inputs: u64 = selected_inputs.iter().map(|input| input.amount).sum();

    if sum_of_inputs < total {
      if let Some(next) = available_inputs.next() {
        selected_inputs.push(next);
        continue;
      }
      let estimated_size = estimate_size(
        ctx.mixin,
        selected_inputs.len(),
        destinations.len(),
        has_payment_id,
        ctx.arbitrary_data.len(),
      );
      let estimated_fee = match fee_spec {
        FeeSpec::Fixed(_) => 0,
        FeeSpec::FeePerByte(rate) => fee_for_size(rate, estimated_size),
        FeeSpec::Minimum => fee_for_size(MINIMUM_FEE_PER_BYTE_V1, estimated_size),
      };
      return Err(SendError::NotEnoughBalance { needed: total_pre_fee + estimated_fee });
    }

    match fee_spec {
      FeeSpec::Fixed(fixed) => {
        let change = sum_of_inputs - total;
        let mut built_destinations = denominate_destinations(&destinations);
        if change > 0 {
          built_destinations.extend(change_destinations(ctx, change));
        }
        let (tx_result, actual_size) = build_and_sign(&selected_inputs, &built_destinations, ctx, node, rng)?;
        let minimum = minimum_fixed_fee(current_height, actual_size);
        if fixed < minimum {
          return Err(SendError::FeeTooSmall);
        }
        return Ok((tx_result, fixed, change, selected_inputs));
      }

      FeeSpec::Minimum | FeeSpec::FeePerByte(_) => {
        let rate = match fee_spec {
          FeeSpec::FeePerByte(rate) => rate,
          _ => MINIMUM_FEE_PER_BYTE_V1,
        };

        let estimated_size =
          estimate_size(ctx.mixin, selected_inputs.len(), destinations.len(), has_payment_id, ctx.arbitrary_data.len());
        let estimated_fee = fee_for_size(rate, estimated_size);

        if send_all && estimated_fee > destinations[0].amount {
          return Err(SendError::NotEnoughBalance { needed: estimated_fee });
        }

        // When sending the whole balance, the fee nets out of the first destination rather than
        // being added on top; recompute the total owed from the (possibly reduced) destinations
        // so the funding check below doesn't double-count it.
        let mut send_destinations = destinations.clone();
        if send_all {
          send_destinations[0].amount -= estimated_fee;
        }
        let total_for_attempt: u64 = send_destinations.iter().map(|destination| destination.amount).sum();

        if sum_of_inputs >= total_for_attempt + estimated_fee {
          match adjust_to_actual(
            &selected_inputs,
            &send_destinations,
            send_all,
            rate,
            estimated_fee,
            sum_of_inputs,
            ctx,
            node,
            rng,
          )? {
            AdjustOutcome::Done(tx_result, fee, change) => {
              return Ok((tx_result, fee, change, selected_inputs))
            }
            AdjustOutcome::NeedMoreInputs(required) => {
              if let Some(next) = available_inputs.next() {
                selected_inputs.push(next);
                continue;
              }
              return Err(SendError::NotEnoughBalance { needed: required });
            }
          }
        }

        if let Some(next) = available_inputs.next() {
          selected_inputs.push(next);
          continue;
        }
        return Err(SendError::NotEnoughBalance { needed: total_for_attempt + estimated_fee });
      }
    }
  }
}

/// Build a fusion (consolidation) transaction: no fee, no recipient-chosen destinations, just
/// the denomination splitter applied to the sum of the selected inputs, paid back to the
/// wallet's own change address.
pub fn build_fusion_transaction(
  mut candidates: Vec<SpendableInput>,
  ctx: &BuildContext<'_>,
  node: &dyn NodeClient,
  rng: &mut (impl RngCore + CryptoRng),
) -> Result<(TransactionResult, Vec<SpendableInput>), SendError> {
  loop {
    if candidates.len() < FUSION_TX_MIN_INPUT_COUNT {
      return Err(SendError::FullyOptimized);
    }

    let sum: u64 = candidates.iter().map(|input| input.amount).sum();
    let denominations = split_into_denominations(sum, true);

    if candidates.len() / denominations.len() < FUSION_TX_MIN_IN_OUT_COUNT_RATIO {
      candidates.pop();
      continue;
    }

    let destinations: Vec<Destination> = denominations
      .iter()
      .map(|&amount| change_destination(ctx, amount))
      .collect();

    match build_and_sign(&candidates, &destinations, ctx, node, rng) {
      Ok((tx_result, size)) => {
        if size > FUSION_TX_MAX_SIZE {
          candidates.pop();
          continue;
        }
        return Ok((tx_result, candidates));
      }
      Err(SendError::NotEnoughFakeOutputs(_)) => return Err(SendError::FusionMixinTooLarge),
      Err(other) => return Err(other),
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn fee_rounds_up_to_the_chunk_size() {
    assert_eq!(fee_for_size(1.0, 1), FEE_PER_BYTE_CHUNK_SIZE);
    assert_eq!(fee_for_size(1.0, 256), FEE_PER_BYTE_CHUNK_SIZE);
    assert_eq!(fee_for_size(1.0, 257), FEE_PER_BYTE_CHUNK_SIZE * 2);
  }

  #[test]
  fn larger_rings_and_more_outputs_increase_the_estimate() {
    let small = estimate_size(1, 1, 1, false, 0);
    let bigger_ring = estimate_size(5, 1, 1, false, 0);
    let more_outputs = estimate_size(1, 1, 5, false, 0);
    assert!(bigger_ring > small);
    assert!(more_outputs > small);
  }
}
