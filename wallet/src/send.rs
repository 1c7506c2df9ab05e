//! Top-level send orchestration: wiring the fee/size loop, the fusion variant, and the prepared-
//! transaction flow together over the external collaborators (§6).
//!
//! State machine (per send attempt): `Validating -> SelectingInputs -> (AdjustingFee <-> Signing)
//! -> Verifying -> Relaying -> Recording -> Done`, with early exits to `Failed` from any stage.
//! The loop inside [`fee::build_with_fee_loop`] is the only cycle; everything else here advances
//! monotonically.

use rand_core::{CryptoRng, RngCore};

use monero_oxide::transaction::Transaction;
use monero_oxide_ed25519::CompressedPoint;

use crate::amounts::is_pretty_amount;
use crate::constants::NORMAL_TX_MAX_OUTPUT_COUNT_V1;
use crate::error::SendError;
use crate::fee::{self, BuildContext};
use crate::relay::relay_and_record;
use crate::traits::{AddressCodec, ContainerLock, NodeClient, SubwalletContainer};
use crate::types::{Destination, FeeSpec, PreparedTransactionInfo, SpendableInput, TransactionResult};

/// Everything needed to build a normal (non-fusion) send.
pub struct SendRequest {
  /// Who to pay, and how much.
  pub destinations: Vec<Destination>,
  /// How the fee is determined.
  pub fee_spec: FeeSpec,
  /// The ring width (decoys per input).
  pub mixin: usize,
  /// Use every input the caller can spend, rather than only as many as needed.
  pub use_all_inputs: bool,
  /// Treat the (sole) destination's amount as the full balance to send, netting the fee out of
  /// it rather than adding the fee on top.
  pub send_all: bool,
  /// An optional payment-ID tag to embed in `tx_extra`.
  pub payment_id: Option<[u8; 32]>,
  /// Optional arbitrary data to embed in `tx_extra`.
  pub arbitrary_data: Vec<u8>,
  /// Restrict spending to this subset of the wallet's public spend keys; empty means "all of
  /// them".
  pub subset: Vec<CompressedPoint>,
}

/// Defense-in-depth verification of a just-built transaction, run between the fee/size loop and
/// handing a transaction back to the caller (§2). Re-confirms every output is still a canonical
/// denomination, that the declared fee is exactly what the inputs and outputs conserve, that the
/// output count hasn't grown past the protocol's per-transaction limit, and that the transaction
/// still fits within a block.
fn verify_built_transaction(tx_result: &TransactionResult, inputs: &[SpendableInput], fee: u64) -> Result<(), SendError> {
  for output in &tx_result.outputs {
    if !is_pretty_amount(output.amount) {
      return Err(SendError::AmountsNotPretty);
    }
  }

  if tx_result.outputs.len() > NORMAL_TX_MAX_OUTPUT_COUNT_V1 {
    return Err(SendError::OutputDecomposition);
  }

  let input_total: u64 = inputs.iter().map(|input| input.amount).sum();
  let output_total: u64 = tx_result.outputs.iter().map(|output| output.amount).sum();
  if input_total.checked_sub(output_total) != Some(fee) {
    return Err(SendError::UnexpectedFee);
  }

  let size = tx_result.transaction.serialize().len();
  if size > Transaction::NON_MINER_SIZE_UPPER_BOUND {
    return Err(SendError::TooManyInputsToFitInBlock(format!(
      "{} inputs produced a {size}-byte transaction, over the {}-byte block limit",
      inputs.len(),
      Transaction::NON_MINER_SIZE_UPPER_BOUND
    )));
  }

  Ok(())
}

fn change_address_keys(
  container: &dyn SubwalletContainer,
  codec: &dyn AddressCodec,
) -> (CompressedPoint, CompressedPoint) {
  let address = container.primary_address();
  codec
    .address_to_keys(&address)
    .expect("a wallet's own primary address must always decode under its own codec")
}

/// Run the fee/size loop and return a built, signed transaction without relaying it.
pub fn prepare(
  request: SendRequest,
  node: &dyn NodeClient,
  container: &dyn SubwalletContainer,
  lock: &ContainerLock,
  codec: &dyn AddressCodec,
  rng: &mut (impl RngCore + CryptoRng),
) -> Result<PreparedTransactionInfo, SendError> {
  let _guard = lock.acquire();

  let current_height = node.network_block_count().map_err(|_| SendError::DaemonOffline)?;
  let (change_spend_key, change_view_key) = change_address_keys(container, codec);

  let mut candidates =
    container.get_spendable_transaction_inputs(request.use_all_inputs, &request.subset, current_height).into_iter();

  let ctx = BuildContext {
    mixin: request.mixin,
    payment_id: request.payment_id,
    arbitrary_data: &request.arbitrary_data,
    change_public_spend_key: change_spend_key,
    change_public_view_key: change_view_key,
    private_view_key: *container.private_view_key(),
  };

  let initial: Vec<SpendableInput> = Vec::new();
  let (tx_result, fee, change_amount, inputs) = fee::build_with_fee_loop(
    initial,
    &mut candidates,
    request.destinations,
    request.fee_spec,
    request.send_all,
    current_height,
    &ctx,
    node,
    rng,
  )?;

  verify_built_transaction(&tx_result, &inputs, fee)?;

  let transaction_hash = tx_result.transaction.hash();
  Ok(PreparedTransactionInfo {
    fee,
    payment_id: request.payment_id,
    inputs,
    change_address_spend_key: if change_amount > 0 { Some(change_spend_key) } else { None },
    change_amount,
    tx_result,
    transaction_hash,
  })
}

/// Relay a previously [`prepare`]d transaction, re-checking that every input it spends is still
/// spendable before doing so.
pub fn send_prepared(
  prepared: PreparedTransactionInfo,
  node: &dyn NodeClient,
  container: &dyn SubwalletContainer,
  lock: &ContainerLock,
) -> Result<[u8; 32], SendError> {
  let _guard = lock.acquire();

  let current_height = node.network_block_count().map_err(|_| SendError::DaemonOffline)?;

  for input in &prepared.inputs {
    if !container.have_spendable_input(&input.key_image, current_height) {
      return Err(SendError::PreparedTransactionExpired);
    }
  }

  relay_and_record(
    &prepared.tx_result,
    &prepared.inputs,
    prepared.change_address_spend_key,
    prepared.change_amount,
    node,
    container,
  )?;
  Ok(prepared.transaction_hash)
}

/// Build, sign, and relay a transaction in one call.
pub fn send(
  request: SendRequest,
  node: &dyn NodeClient,
  container: &dyn SubwalletContainer,
  lock: &ContainerLock,
  codec: &dyn AddressCodec,
  rng: &mut (impl RngCore + CryptoRng),
) -> Result<[u8; 32], SendError> {
  let prepared = prepare(request, node, container, lock, codec, rng)?;
  send_prepared(prepared, node, container, lock)
}

/// Build, sign, and relay a fusion (consolidation) transaction spending some of the wallet's own
/// dust/low-value outputs back to itself.
pub fn send_fusion(
  mixin: usize,
  subset: Vec<CompressedPoint>,
  optimize_target: Option<u64>,
  node: &dyn NodeClient,
  container: &dyn SubwalletContainer,
  lock: &ContainerLock,
  codec: &dyn AddressCodec,
  rng: &mut (impl RngCore + CryptoRng),
) -> Result<[u8; 32], SendError> {
  let _guard = lock.acquire();

  let current_height = node.network_block_count().map_err(|_| SendError::DaemonOffline)?;
  let (change_spend_key, change_view_key) = change_address_keys(container, codec);

  let (candidates, _max_inputs_possible, found_money) =
    container.get_fusion_transaction_inputs(true, &subset, mixin, current_height, optimize_target);
  if !found_money {
    return Err(SendError::FullyOptimized);
  }

  let ctx = BuildContext {
    mixin,
    payment_id: None,
    arbitrary_data: &[],
    change_public_spend_key: change_spend_key,
    change_public_view_key: change_view_key,
    private_view_key: *container.private_view_key(),
  };

  let (tx_result, inputs) = fee::build_fusion_transaction(candidates, &ctx, node, rng)?;
  verify_built_transaction(&tx_result, &inputs, 0)?;
  let consolidated: u64 = inputs.iter().map(|input| input.amount).sum();
  relay_and_record(&tx_result, &inputs, Some(change_spend_key), consolidated, node, container)?;
  Ok(tx_result.transaction.hash())
}
