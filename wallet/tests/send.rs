//! End-to-end scenarios against in-memory fake `NodeClient`/`SubwalletContainer`/`AddressCodec`
//! implementations: a single-destination send, a send-all, an underfunded send, a fusion happy
//! path, a fully-optimized fusion, and a daemon already-spent rejection.

use std::collections::HashMap;
use std::sync::Mutex;

use rand_core::{CryptoRng, OsRng, RngCore};
use zeroize::Zeroizing;

use monero_oxide::primitives::{derive_public_key, derive_secret_key, generate_key_derivation, generate_key_image};
use monero_oxide::transaction::Transaction;
use monero_oxide_ed25519::{CompressedPoint, Scalar};

use zentwallet_core::error::SendError;
use zentwallet_core::traits::{AddressCodec, ContainerLock, DecoyOutputsForAmount, NodeClient, SubwalletContainer};
use zentwallet_core::types::{Destination, FeeSpec, SpendableInput, UnconfirmedIncoming, UnconfirmedTransaction};
use zentwallet_core::{send, send_fusion, SendRequest};

fn keypair(rng: &mut (impl RngCore + CryptoRng)) -> (Scalar, CompressedPoint) {
  let secret = Scalar::random(rng);
  let public = CompressedPoint::from(curve25519_dalek::EdwardsPoint::mul_base(&secret.into()).compress().to_bytes());
  (secret, public)
}

fn point(byte: u8) -> CompressedPoint {
  let mut bytes = [0u8; 32];
  bytes[0] = byte;
  CompressedPoint::from(bytes)
}

/// Build a `SpendableInput` owned by `(spend_secret, spend_public)` under view key
/// `(view_secret, view_public)`, consistent enough that the finalizer's on-demand derivation
/// recovers the same private ephemeral and key image used here.
fn owned_output(
  rng: &mut (impl RngCore + CryptoRng),
  view_public: &CompressedPoint,
  spend_secret: &Scalar,
  spend_public: &CompressedPoint,
  amount: u64,
  global_index: u64,
) -> SpendableInput {
  let tx_secret = Scalar::random(rng);
  let tx_public = CompressedPoint::from(curve25519_dalek::EdwardsPoint::mul_base(&tx_secret.into()).compress().to_bytes());

  let derivation = generate_key_derivation(&view_public.decompress().unwrap(), &tx_secret);
  let one_time_public_key = derive_public_key(&derivation, 0, spend_public).unwrap();
  let private_ephemeral = derive_secret_key(&derivation, 0, spend_secret);
  let key_image = generate_key_image(&one_time_public_key, &private_ephemeral);

  SpendableInput {
    key_image,
    amount,
    parent_tx_hash: [0; 32],
    tx_public_key: tx_public,
    index_within_tx: 0,
    global_output_index: Some(global_index),
    one_time_public_key,
    unlock_height_or_time: 0,
    owner_public_spend_key: *spend_public,
    owner_private_spend_key: Zeroizing::new(*spend_secret),
    private_ephemeral: None,
  }
}

struct FakeNode {
  decoys: HashMap<u64, Vec<(u64, CompressedPoint)>>,
  height: u64,
  send_result: Mutex<Option<Result<(), (bool, String)>>>,
  sent: Mutex<Vec<Transaction>>,
}

impl FakeNode {
  fn new(decoys: HashMap<u64, Vec<(u64, CompressedPoint)>>) -> Self {
    Self { decoys, height: 1_000_000, send_result: Mutex::new(None), sent: Mutex::new(Vec::new()) }
  }

  fn rejecting(decoys: HashMap<u64, Vec<(u64, CompressedPoint)>>, result: (bool, String)) -> Self {
    Self { decoys, height: 1_000_000, send_result: Mutex::new(Some(Err(result))), sent: Mutex::new(Vec::new()) }
  }
}

impl NodeClient for FakeNode {
  fn network_block_count(&self) -> Result<u64, String> {
    Ok(self.height)
  }

  fn node_fee(&self) -> Result<(u64, Option<String>), String> {
    Ok((0, None))
  }

  fn get_random_outs_by_amounts(&self, amounts: &[u64], _count: usize) -> Result<Vec<DecoyOutputsForAmount>, ()> {
    Ok(
      amounts
        .iter()
        .filter_map(|amount| self.decoys.get(amount).map(|outs| DecoyOutputsForAmount { amount: *amount, outs: outs.clone() }))
        .collect(),
    )
  }

  fn send_transaction(&self, transaction: &Transaction) -> Result<(), (bool, String)> {
    self.sent.lock().unwrap().push(transaction.clone());
    self.send_result.lock().unwrap().clone().unwrap_or(Ok(()))
  }
}

#[derive(Default)]
struct FakeContainerState {
  locked: Vec<(CompressedPoint, CompressedPoint)>,
  spent: Vec<(CompressedPoint, u64)>,
  unconfirmed_incoming: Vec<(UnconfirmedIncoming, CompressedPoint)>,
  unconfirmed_txs: Vec<(UnconfirmedTransaction, [u8; 32])>,
  tx_secret_keys: Vec<([u8; 32], Zeroizing<Scalar>)>,
}

struct FakeContainer {
  primary_address: String,
  private_view_key: Zeroizing<Scalar>,
  public_spend_keys: Vec<CompressedPoint>,
  spendable: Vec<SpendableInput>,
  fusion_candidates: Vec<SpendableInput>,
  state: Mutex<FakeContainerState>,
}

impl SubwalletContainer for FakeContainer {
  fn primary_address(&self) -> String {
    self.primary_address.clone()
  }

  fn private_view_key(&self) -> Zeroizing<Scalar> {
    self.private_view_key.clone()
  }

  fn public_spend_keys(&self) -> Vec<CompressedPoint> {
    self.public_spend_keys.clone()
  }

  fn get_spendable_transaction_inputs(
    &self,
    _all: bool,
    _subset: &[CompressedPoint],
    _current_height: u64,
  ) -> Vec<SpendableInput> {
    self.spendable.clone()
  }

  fn get_fusion_transaction_inputs(
    &self,
    _all: bool,
    _subset: &[CompressedPoint],
    _mixin: usize,
    _current_height: u64,
    _optimize_target: Option<u64>,
  ) -> (Vec<SpendableInput>, usize, bool) {
    let candidates = self.fusion_candidates.clone();
    let len = candidates.len();
    (candidates, len, true)
  }

  fn have_spendable_input(&self, key_image: &CompressedPoint, _current_height: u64) -> bool {
    !self.state.lock().unwrap().spent.iter().any(|(spent, _)| spent == key_image)
  }

  fn mark_input_as_locked(&self, key_image: &CompressedPoint, owner_spend_key: &CompressedPoint) {
    self.state.lock().unwrap().locked.push((*key_image, *owner_spend_key));
  }

  fn mark_input_as_spent(&self, key_image: &CompressedPoint, height: u64) {
    self.state.lock().unwrap().spent.push((*key_image, height));
  }

  fn store_unconfirmed_incoming_input(&self, incoming: UnconfirmedIncoming, owner_spend_key: &CompressedPoint) {
    self.state.lock().unwrap().unconfirmed_incoming.push((incoming, *owner_spend_key));
  }

  fn add_unconfirmed_transaction(&self, transaction: UnconfirmedTransaction, tx_hash: [u8; 32]) {
    self.state.lock().unwrap().unconfirmed_txs.push((transaction, tx_hash));
  }

  fn store_tx_private_key(&self, secret: Zeroizing<Scalar>, tx_hash: [u8; 32]) {
    self.state.lock().unwrap().tx_secret_keys.push((tx_hash, secret));
  }
}

struct FakeCodec {
  addresses: HashMap<String, (CompressedPoint, CompressedPoint)>,
}

impl AddressCodec for FakeCodec {
  fn address_to_keys(&self, address: &str) -> Result<(CompressedPoint, CompressedPoint), String> {
    self.addresses.get(address).copied().ok_or_else(|| "unknown address".to_string())
  }

  fn extract_integrated_address_data(&self, address: &str) -> Result<(String, Option<[u8; 32]>), String> {
    Ok((address.to_string(), None))
  }

  fn addresses_to_spend_keys(&self, addresses: &[String]) -> Result<Vec<CompressedPoint>, String> {
    addresses.iter().map(|address| self.address_to_keys(address).map(|(spend, _)| spend)).collect()
  }
}

struct Wallet {
  view_secret: Scalar,
  view_public: CompressedPoint,
  spend_secret: Scalar,
  spend_public: CompressedPoint,
  address: String,
}

fn new_wallet(rng: &mut (impl RngCore + CryptoRng)) -> Wallet {
  let (view_secret, view_public) = keypair(rng);
  let (spend_secret, spend_public) = keypair(rng);
  Wallet { view_secret, view_public, spend_secret, spend_public, address: "wallet-primary-address".to_string() }
}

fn codec_for(wallet: &Wallet) -> FakeCodec {
  let mut addresses = HashMap::new();
  addresses.insert(wallet.address.clone(), (wallet.spend_public, wallet.view_public));
  FakeCodec { addresses }
}

fn container_for(wallet: &Wallet, spendable: Vec<SpendableInput>, fusion_candidates: Vec<SpendableInput>) -> FakeContainer {
  FakeContainer {
    primary_address: wallet.address.clone(),
    private_view_key: Zeroizing::new(wallet.view_secret),
    public_spend_keys: vec![wallet.spend_public],
    spendable,
    fusion_candidates,
    state: Mutex::new(FakeContainerState::default()),
  }
}

#[test]
fn single_destination_mixin_three_fixed_fee() {
  let mut rng = OsRng;
  let wallet = new_wallet(&mut rng);
  let (_recipient_view_secret, recipient_view_public) = keypair(&mut rng);
  let (_recipient_spend_secret, recipient_spend_public) = keypair(&mut rng);

  let input = owned_output(&mut rng, &wallet.view_public, &wallet.spend_secret, &wallet.spend_public, 1_000_000, 1_000);
  let decoys = HashMap::from([(1_000_000, vec![(1, point(10)), (2, point(11)), (3, point(12)), (4, point(13))])]);
  let node = FakeNode::new(decoys);
  let codec = codec_for(&wallet);
  let container = container_for(&wallet, vec![input], vec![]);
  let lock = ContainerLock::new();

  let request = SendRequest {
    destinations: vec![Destination {
      receiver_public_spend_key: recipient_spend_public,
      receiver_public_view_key: recipient_view_public,
      amount: 500_000,
    }],
    fee_spec: FeeSpec::Fixed(10),
    mixin: 3,
    use_all_inputs: false,
    send_all: false,
    payment_id: None,
    arbitrary_data: Vec::new(),
    subset: Vec::new(),
  };

  let hash = send(request, &node, &container, &lock, &codec, &mut rng).unwrap();

  let sent = node.sent.lock().unwrap();
  assert_eq!(sent.len(), 1);
  let tx = &sent[0];
  assert_eq!(tx.hash(), hash);
  assert_eq!(tx.prefix.inputs.len(), 1);
  match &tx.prefix.inputs[0] {
    monero_oxide::transaction::Input::ToKey { key_offsets, .. } => assert_eq!(key_offsets.len(), 4),
    other => panic!("expected a ToKey input, got {other:?}"),
  }

  let mut amounts: Vec<u64> = tx.prefix.outputs.iter().map(|output| output.amount).collect();
  amounts.sort_unstable();
  assert_eq!(amounts, vec![90, 900, 9_000, 90_000, 400_000, 500_000]);
  for &amount in &amounts {
    assert!(zentwallet_core::amounts::is_pretty_amount(amount));
  }
  assert_eq!(amounts.iter().sum::<u64>() + 10, 1_000_000);

  let state = container.state.lock().unwrap();
  assert_eq!(state.unconfirmed_txs.len(), 1);
  let (recorded, recorded_hash) = &state.unconfirmed_txs[0];
  assert_eq!(*recorded_hash, hash);
  // The input and its change are both owned by the same spend key, so the net transfer is just
  // the fee leaving the wallet.
  assert_eq!(recorded.transfers, HashMap::from([(wallet.spend_public, -10)]));
  assert_eq!(recorded.timestamp, 0);
  assert_eq!(recorded.block_height, 0);
  assert_eq!(recorded.unlock_time, 0);
  assert!(!recorded.is_coinbase);
}

#[test]
fn send_all_with_fee_per_byte() {
  let mut rng = OsRng;
  let wallet = new_wallet(&mut rng);
  let (_recipient_view_secret, recipient_view_public) = keypair(&mut rng);
  let (_recipient_spend_secret, recipient_spend_public) = keypair(&mut rng);

  let input = owned_output(&mut rng, &wallet.view_public, &wallet.spend_secret, &wallet.spend_public, 1_234_567, 1_000);
  let decoys = HashMap::from([(1_234_567, vec![(1, point(10)), (2, point(11)), (3, point(12)), (4, point(13))])]);
  let node = FakeNode::new(decoys);
  let codec = codec_for(&wallet);
  let container = container_for(&wallet, vec![input], vec![]);
  let lock = ContainerLock::new();

  let request = SendRequest {
    destinations: vec![Destination {
      receiver_public_spend_key: recipient_spend_public,
      receiver_public_view_key: recipient_view_public,
      amount: 1_234_567,
    }],
    fee_spec: FeeSpec::FeePerByte(0.1),
    mixin: 3,
    use_all_inputs: false,
    send_all: true,
    payment_id: None,
    arbitrary_data: Vec::new(),
    subset: Vec::new(),
  };

  send(request, &node, &container, &lock, &codec, &mut rng).unwrap();

  let sent = node.sent.lock().unwrap();
  let tx = &sent[0];
  let amounts: Vec<u64> = tx.prefix.outputs.iter().map(|output| output.amount).collect();
  for &amount in &amounts {
    assert!(zentwallet_core::amounts::is_pretty_amount(amount));
  }
  let total_out: u64 = amounts.iter().sum();
  let fee = 1_234_567 - total_out;
  assert!(fee > 0, "send_all with exact input/destination amounts leaves no room for change");
  assert_eq!(total_out + fee, 1_234_567);
}

#[test]
fn not_enough_balance_surfaces_required_amount() {
  let mut rng = OsRng;
  let wallet = new_wallet(&mut rng);
  let (_recipient_view_secret, recipient_view_public) = keypair(&mut rng);
  let (_recipient_spend_secret, recipient_spend_public) = keypair(&mut rng);

  let input = owned_output(&mut rng, &wallet.view_public, &wallet.spend_secret, &wallet.spend_public, 100, 1);
  let node = FakeNode::new(HashMap::new());
  let codec = codec_for(&wallet);
  let container = container_for(&wallet, vec![input], vec![]);
  let lock = ContainerLock::new();

  let request = SendRequest {
    destinations: vec![Destination {
      receiver_public_spend_key: recipient_spend_public,
      receiver_public_view_key: recipient_view_public,
      amount: 1_000_000,
    }],
    fee_spec: FeeSpec::Minimum,
    mixin: 3,
    use_all_inputs: false,
    send_all: false,
    payment_id: None,
    arbitrary_data: Vec::new(),
    subset: Vec::new(),
  };

  let err = send(request, &node, &container, &lock, &codec, &mut rng).unwrap_err();
  match err {
    SendError::NotEnoughBalance { needed } => assert!(needed > 1_000_000),
    other => panic!("expected NotEnoughBalance, got {other:?}"),
  }
  assert!(node.sent.lock().unwrap().is_empty());
}

#[test]
fn fusion_happy_path() {
  let mut rng = OsRng;
  let wallet = new_wallet(&mut rng);

  let candidates: Vec<SpendableInput> = (0..12)
    .map(|i| owned_output(&mut rng, &wallet.view_public, &wallet.spend_secret, &wallet.spend_public, 100, 1_000 + i))
    .collect();
  let decoys = HashMap::from([(100, vec![(1, point(10)), (2, point(11)), (3, point(12))])]);
  let node = FakeNode::new(decoys);
  let codec = codec_for(&wallet);
  let container = container_for(&wallet, vec![], candidates);
  let lock = ContainerLock::new();

  let hash = send_fusion(3, vec![], None, &node, &container, &lock, &codec, &mut rng).unwrap();

  let sent = node.sent.lock().unwrap();
  let tx = &sent[0];
  assert_eq!(tx.hash(), hash);
  assert_eq!(tx.prefix.inputs.len(), 12);
  let mut amounts: Vec<u64> = tx.prefix.outputs.iter().map(|output| output.amount).collect();
  amounts.sort_unstable();
  assert_eq!(amounts, vec![200, 1_000]);
  assert!(tx.serialize().len() <= zentwallet_core::constants::FUSION_TX_MAX_SIZE);
  assert!(12 / tx.prefix.outputs.len() >= zentwallet_core::constants::FUSION_TX_MIN_IN_OUT_COUNT_RATIO);
}

#[test]
fn fusion_fully_optimized_makes_no_rpc_call() {
  let mut rng = OsRng;
  let wallet = new_wallet(&mut rng);

  let candidates: Vec<SpendableInput> = (0..11)
    .map(|i| owned_output(&mut rng, &wallet.view_public, &wallet.spend_secret, &wallet.spend_public, 100, 1_000 + i))
    .collect();
  let node = FakeNode::new(HashMap::new());
  let codec = codec_for(&wallet);
  let container = container_for(&wallet, vec![], candidates);
  let lock = ContainerLock::new();

  let err = send_fusion(3, vec![], None, &node, &container, &lock, &codec, &mut rng).unwrap_err();
  assert!(matches!(err, SendError::FullyOptimized));
  assert!(node.sent.lock().unwrap().is_empty());
}

#[test]
fn daemon_reports_already_spent() {
  let mut rng = OsRng;
  let wallet = new_wallet(&mut rng);
  let (_recipient_view_secret, recipient_view_public) = keypair(&mut rng);
  let (_recipient_spend_secret, recipient_spend_public) = keypair(&mut rng);

  let input = owned_output(&mut rng, &wallet.view_public, &wallet.spend_secret, &wallet.spend_public, 1_000_000, 1_000);
  let key_image_hex = hex_encode(&input.key_image.to_bytes());
  let decoys = HashMap::from([(1_000_000, vec![(1, point(10)), (2, point(11)), (3, point(12)), (4, point(13))])]);
  let message = format!("Transaction contains an input which has already been spent - Key image: {key_image_hex}");
  let node = FakeNode::rejecting(decoys, (false, message));
  let codec = codec_for(&wallet);
  let container = container_for(&wallet, vec![input.clone()], vec![]);
  let lock = ContainerLock::new();

  let request = SendRequest {
    destinations: vec![Destination {
      receiver_public_spend_key: recipient_spend_public,
      receiver_public_view_key: recipient_view_public,
      amount: 500_000,
    }],
    fee_spec: FeeSpec::Fixed(1_000),
    mixin: 3,
    use_all_inputs: false,
    send_all: false,
    payment_id: None,
    arbitrary_data: Vec::new(),
    subset: Vec::new(),
  };

  let err = send(request, &node, &container, &lock, &codec, &mut rng).unwrap_err();
  assert!(matches!(err, SendError::DaemonError(_)));

  let state = container.state.lock().unwrap();
  assert_eq!(state.spent, vec![(input.key_image, 0)]);
  assert!(state.unconfirmed_txs.is_empty(), "a rejected relay must not record an unconfirmed transaction");
  assert!(state.locked.is_empty(), "a rejected relay must not lock any input");
}

fn hex_encode(bytes: &[u8]) -> String {
  bytes.iter().map(|byte| format!("{byte:02x}")).collect()
}
