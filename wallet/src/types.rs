//! The data model shared by every stage of transaction construction.

use std::collections::HashMap;

use zeroize::{Zeroize, Zeroizing};

use monero_oxide_ed25519::{CompressedPoint, Scalar};
use monero_oxide::transaction::Transaction;

/// A previously received output this wallet can spend.
#[derive(Clone)]
pub struct SpendableInput {
  /// This output's key image, once derived. Uniquely identifies it within the wallet.
  pub key_image: CompressedPoint,
  /// The output's amount, in atomic units.
  pub amount: u64,
  /// The hash of the transaction that created this output.
  pub parent_tx_hash: [u8; 32],
  /// The public key of the transaction that created this output.
  pub tx_public_key: CompressedPoint,
  /// This output's index within its parent transaction.
  pub index_within_tx: u64,
  /// This output's index within the chain's global per-amount output list.
  ///
  /// Must be populated before the input can enter ring assembly (§4.B).
  pub global_output_index: Option<u64>,
  /// The output's one-time public key.
  pub one_time_public_key: CompressedPoint,
  /// The height or timestamp below which this output can't yet be spent.
  pub unlock_height_or_time: u64,
  /// The public spend key of the wallet address that received this output.
  pub owner_public_spend_key: CompressedPoint,
  /// The private spend key matching `owner_public_spend_key`.
  pub owner_private_spend_key: Zeroizing<Scalar>,
  /// This output's private ephemeral, if it was already derived during sync.
  ///
  /// When absent, the input finalizer (§4.C) derives it on demand.
  pub private_ephemeral: Option<Zeroizing<Scalar>>,
}

/// A payment destination: who to pay, and how much.
#[derive(Clone, PartialEq, Eq, Debug)]
pub struct Destination {
  /// The receiver's public spend key.
  pub receiver_public_spend_key: CompressedPoint,
  /// The receiver's public view key.
  pub receiver_public_view_key: CompressedPoint,
  /// The amount to pay, in atomic units. Must be positive.
  pub amount: u64,
}

/// An output after key derivation, prior to being wire-encoded.
#[derive(Clone, PartialEq, Eq, Debug)]
pub struct KeyOutput {
  /// The one-time public key this output can be spent with.
  pub one_time_public_key: CompressedPoint,
  /// The output's amount, in atomic units.
  pub amount: u64,
}

/// Ring membership for a single real input.
pub struct ObscuredInput {
  /// The ring, sorted ascending by `global_index`; one entry per ring member.
  pub outputs: Vec<(u64, CompressedPoint)>,
  /// The index within `outputs` of the real member.
  pub real_output_position: usize,
  /// The transaction public key of the real output's parent transaction.
  pub real_tx_public_key: CompressedPoint,
  /// The real output's index within its parent transaction.
  pub real_output_tx_index: u64,
  /// This input's amount, in atomic units.
  pub amount: u64,
  /// The public spend key of the wallet address that owns the real output.
  pub owner_public_spend_key: CompressedPoint,
  /// The private spend key matching `owner_public_spend_key`.
  pub owner_private_spend_key: Zeroizing<Scalar>,
  /// The real output's key image.
  pub key_image: CompressedPoint,
  /// The real output's private ephemeral, if already known.
  pub private_ephemeral: Option<Zeroizing<Scalar>>,
}

/// The result of building a transaction: the wire transaction plus the context needed to record
/// it in the wallet's own bookkeeping.
pub struct TransactionResult {
  /// The signed, wire-ready transaction.
  pub transaction: Transaction,
  /// The outputs this transaction created, pre-wire, in the same order as `transaction`'s.
  pub outputs: Vec<KeyOutput>,
  /// The fresh per-transaction key pair generated for this build.
  pub tx_key_pair: (CompressedPoint, Zeroizing<Scalar>),
}

/// A transaction that has been fully built and signed, but not yet relayed.
pub struct PreparedTransactionInfo {
  /// The fee this transaction pays.
  pub fee: u64,
  /// The payment ID this transaction carries, if any.
  pub payment_id: Option<[u8; 32]>,
  /// The inputs this transaction spends.
  pub inputs: Vec<SpendableInput>,
  /// The change address's public spend key, if this transaction produced change.
  pub change_address_spend_key: Option<CompressedPoint>,
  /// The change amount, if any.
  pub change_amount: u64,
  /// The signed build.
  pub tx_result: TransactionResult,
  /// The transaction's hash, cached so `send_prepared` doesn't need to re-hash.
  pub transaction_hash: [u8; 32],
}

/// How the fee for a transaction is determined.
#[derive(Clone, Copy, PartialEq, Debug)]
pub enum FeeSpec {
  /// Use the network's minimum fee-per-byte rate.
  Minimum,
  /// Use a caller-supplied fee-per-byte rate, in atomic units per byte.
  FeePerByte(f64),
  /// Use an exact, caller-supplied fee.
  Fixed(u64),
}

/// The wallet's own bookkeeping record for a just-relayed transaction, distinct from the signed
/// wire [`Transaction`].
///
/// `transfers` carries this transaction's effect on each of the wallet's own public spend keys:
/// `-input_amount` for every owning spend key an input was drawn from, merged with `+change` for
/// the spend key change was paid back to. A transaction with no self-addressed change carries no
/// positive entry. Amounts are signed because a single address can appear on both sides (spending
/// from, and receiving change into, the same spend key).
#[derive(Clone, PartialEq, Eq, Debug)]
pub struct UnconfirmedTransaction {
  /// Net effect on each of the wallet's own public spend keys, in atomic units.
  pub transfers: HashMap<CompressedPoint, i64>,
  /// Always `0` until the transaction is seen confirmed on-chain.
  pub timestamp: u64,
  /// Always `0` until the transaction is seen confirmed on-chain.
  pub block_height: u64,
  /// Always `0`; outgoing transactions this wallet builds carry no additional timelock.
  pub unlock_time: u64,
  /// Always `false`; this wallet never builds coinbase transactions.
  pub is_coinbase: bool,
}

/// An incoming output this wallet hasn't yet seen confirmed on-chain.
#[derive(Clone, PartialEq, Eq, Debug, Zeroize)]
pub struct UnconfirmedIncoming {
  /// The output's amount, in atomic units.
  pub amount: u64,
  /// The output's one-time public key.
  pub one_time_pk: CompressedPoint,
  /// The hash of the transaction that created this output.
  pub parent_tx_hash: [u8; 32],
}
