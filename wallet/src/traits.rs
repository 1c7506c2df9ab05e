//! External collaborators this crate depends on but doesn't implement.
//!
//! Wallet persistence, RPC transport, and address encoding are out of scope (§1); these traits
//! give this crate's build pipeline a contract to call against without pulling in a concrete
//! implementation of any of them.

use zeroize::Zeroizing;

use monero_oxide_ed25519::{CompressedPoint, Scalar};
use monero_oxide::transaction::Transaction;

use crate::types::{SpendableInput, UnconfirmedIncoming, UnconfirmedTransaction};

/// One distinct amount's worth of decoy candidates, as returned by the node.
pub struct DecoyOutputsForAmount {
  /// The amount every `out` in this group shares.
  pub amount: u64,
  /// Candidate decoys: `(global_amount_index, one_time_public_key)`.
  pub outs: Vec<(u64, CompressedPoint)>,
}

/// A connection to a remote node.
pub trait NodeClient {
  /// The current chain height, in blocks.
  fn network_block_count(&self) -> Result<u64, String>;

  /// The node's preferred fee, and the address to pay it to, if it charges one.
  ///
  /// Out of scope for this core beyond exposing the shape (§1); callers that don't pay node fees
  /// may return `(0, None)`.
  fn node_fee(&self) -> Result<(u64, Option<String>), String>;

  /// Request `count` decoy candidates for each distinct amount in `amounts`.
  ///
  /// Returns `Err` on transport failure (mapped to [`crate::error::SendError::DaemonOffline`]).
  fn get_random_outs_by_amounts(
    &self,
    amounts: &[u64],
    count: usize,
  ) -> Result<Vec<DecoyOutputsForAmount>, ()>;

  /// Submit a finished transaction.
  ///
  /// `Ok(())` means the node accepted it. `Err((connection_error, message))` distinguishes a
  /// transport failure (`connection_error = true`) from a remote rejection.
  fn send_transaction(&self, transaction: &Transaction) -> Result<(), (bool, String)>;
}

/// The wallet's local record of spendable and in-flight outputs.
///
/// Mutation methods are expected to serialize internally (§5): this crate never assumes it has
/// exclusive access and never caches a container's data across RPC calls.
pub trait SubwalletContainer {
  /// This wallet's primary address, used as the default change destination.
  fn primary_address(&self) -> String;

  /// This wallet's private view key.
  fn private_view_key(&self) -> Zeroizing<Scalar>;

  /// Every public spend key this wallet controls.
  fn public_spend_keys(&self) -> Vec<CompressedPoint>;

  /// Spendable inputs, ordered by this container's own selection policy (most containers prefer
  /// older, larger, or otherwise-unlocked-soonest outputs first).
  fn get_spendable_transaction_inputs(
    &self,
    all: bool,
    subset: &[CompressedPoint],
    current_height: u64,
  ) -> Vec<SpendableInput>;

  /// Inputs eligible for a fusion (consolidation) transaction.
  ///
  /// Returns the candidate inputs, the maximum number of inputs a fusion transaction could have
  /// spent given the wallet's current holdings, and whether spendable value was found at all.
  fn get_fusion_transaction_inputs(
    &self,
    all: bool,
    subset: &[CompressedPoint],
    mixin: usize,
    current_height: u64,
    optimize_target: Option<u64>,
  ) -> (Vec<SpendableInput>, usize, bool);

  /// Whether this key image is currently spendable (known, unlocked, unspent).
  fn have_spendable_input(&self, key_image: &CompressedPoint, current_height: u64) -> bool;

  /// Mark a key image as locked (spent but unconfirmed) against its owning spend key.
  fn mark_input_as_locked(&self, key_image: &CompressedPoint, owner_spend_key: &CompressedPoint);

  /// Mark a key image as spent as of `height` (`0` meaning unconfirmed).
  fn mark_input_as_spent(&self, key_image: &CompressedPoint, height: u64);

  /// Record change or other self-addressed output as unconfirmed, pending confirmation.
  fn store_unconfirmed_incoming_input(
    &self,
    incoming: UnconfirmedIncoming,
    owner_spend_key: &CompressedPoint,
  );

  /// Record a just-relayed transaction as unconfirmed.
  fn add_unconfirmed_transaction(&self, transaction: UnconfirmedTransaction, tx_hash: [u8; 32]);

  /// Persist a transaction's secret key, keyed by the transaction's hash.
  fn store_tx_private_key(&self, secret: Zeroizing<Scalar>, tx_hash: [u8; 32]);
}

/// Serializes concurrent sends against the same [`SubwalletContainer`] (§5): input selection and
/// the final lock/record step must observe a consistent snapshot even when multiple sends race
/// against the same container. Cryptographic work (ring assembly, signing) is not serialized —
/// only the critical section bracketing it.
///
/// A bare `Mutex<()>` guarding a critical section, rather than wrapping the container itself,
/// mirrors how this ecosystem guards UTXO selection elsewhere.
pub struct ContainerLock(std::sync::Mutex<()>);

impl ContainerLock {
  /// Create a fresh, unlocked guard.
  pub fn new() -> Self {
    Self(std::sync::Mutex::new(()))
  }

  /// Acquire the lock for a single send's selection-through-commit critical section.
  pub fn acquire(&self) -> std::sync::MutexGuard<'_, ()> {
    self.0.lock().unwrap_or_else(std::sync::PoisonError::into_inner)
  }
}

impl Default for ContainerLock {
  fn default() -> Self {
    Self::new()
  }
}

/// Address string encoding and decoding.
///
/// Modeled minimally so this crate compiles and tests without a real base58 implementation; a
/// production caller supplies the genuine codec (out of scope, §1).
pub trait AddressCodec {
  /// Decode an address into its public spend and view keys.
  fn address_to_keys(&self, address: &str) -> Result<(CompressedPoint, CompressedPoint), String>;

  /// Split an integrated address into its base address and embedded payment ID.
  fn extract_integrated_address_data(
    &self,
    address: &str,
  ) -> Result<(String, Option<[u8; 32]>), String>;

  /// Resolve a list of addresses to their public spend keys.
  fn addresses_to_spend_keys(&self, addresses: &[String]) -> Result<Vec<CompressedPoint>, String>;
}
