use core::cmp::Ordering;
#[allow(unused_imports)]
use std_shims::prelude::*;
use std_shims::io::{self, Read, Write};

use zeroize::Zeroize;

use crate::{io::*, ed25519::*, primitives::keccak256, ring_signatures::RingSignature};

/// An input in the classic (non-RingCT) Monero protocol.
#[derive(Clone, PartialEq, Eq, Debug)]
pub enum Input {
  /// An input for a miner transaction, which is generating new coins.
  Gen(usize),
  /// An input spending an output on-chain.
  ToKey {
    /// The amount of the output this input spends.
    ///
    /// Always `Some` for a classic (version-1) transaction; a `0` on the wire round-trips to
    /// `None` as only RingCT transactions may spend a zero-amount output.
    amount: Option<u64>,
    /// The decoys used by this input's ring, specified as their offset distance from each other.
    key_offsets: Vec<u64>,
    /// The key image (linking tag, nullifier) for the spent output.
    key_image: CompressedPoint,
  },
}

impl Input {
  /// Write the Input.
  pub fn write<W: Write>(&self, w: &mut W) -> io::Result<()> {
    match self {
      Input::Gen(height) => {
        w.write_all(&[255])?;
        VarInt::write(height, w)
      }

      Input::ToKey { amount, key_offsets, key_image } => {
        w.write_all(&[2])?;
        VarInt::write(&amount.unwrap_or(0), w)?;
        write_vec(VarInt::write, key_offsets, w)?;
        key_image.write(w)
      }
    }
  }

  /// Serialize the Input to a `Vec<u8>`.
  pub fn serialize(&self) -> Vec<u8> {
    let mut res = vec![];
    self.write(&mut res).expect("write failed but <Vec as io::Write> doesn't fail");
    res
  }

  /// Read an Input.
  pub fn read<R: Read>(r: &mut R) -> io::Result<Input> {
    Ok(match read_byte(r)? {
      255 => Input::Gen(VarInt::read(r)?),
      2 => {
        let amount = VarInt::read(r)?;
        // A non-RCT 0-amount input can't exist because only RCT outputs may carry a 0 amount, so
        // collapsing to `None` on a 0 read is safe without knowing the transaction's version.
        let amount = if amount == 0 { None } else { Some(amount) };
        Input::ToKey {
          amount,
          key_offsets: read_vec(VarInt::read, Some(Transaction::NON_MINER_SIZE_UPPER_BOUND), r)?,
          key_image: CompressedPoint::read(r)?,
        }
      }
      _ => Err(io::Error::other("tried to deserialize unknown/unused input type"))?,
    })
  }
}

/// An output in the classic (non-RingCT) Monero protocol.
#[derive(Clone, PartialEq, Eq, Debug)]
pub struct Output {
  /// The amount of this output, in atomic units.
  ///
  /// Classic transactions always carry an explicit amount; there is no Pedersen commitment or
  /// encrypted amount to hide it.
  pub amount: u64,
  /// The one-time key which can spend this output.
  pub key: CompressedPoint,
}

impl Output {
  /// The lower bound on the size of an output.
  pub const SIZE_LOWER_BOUND: usize = <u64 as VarInt>::LOWER_BOUND + 1 + 32;

  /// Write the Output.
  pub fn write<W: Write>(&self, w: &mut W) -> io::Result<()> {
    VarInt::write(&self.amount, w)?;
    w.write_all(&[2])?;
    w.write_all(&self.key.to_bytes())
  }

  /// Write the Output to a `Vec<u8>`.
  pub fn serialize(&self) -> Vec<u8> {
    let mut res = Vec::with_capacity(<u64 as VarInt>::UPPER_BOUND + 1 + 32);
    self.write(&mut res).expect("write failed but <Vec as io::Write> doesn't fail");
    res
  }

  /// Read an Output.
  pub fn read<R: Read>(r: &mut R) -> io::Result<Output> {
    let amount = VarInt::read(r)?;
    match read_byte(r)? {
      2 => {}
      3 => Err(io::Error::other("output carried a view tag, which this protocol doesn't use"))?,
      _ => Err(io::Error::other("tried to deserialize unknown/unused output type"))?,
    }
    Ok(Output { amount, key: CompressedPoint::read(r)? })
  }
}

/// An additional timelock for a transaction.
///
/// Every output is locked by a default confirmation window. If a timelock is explicitly
/// specified, the longer of the two applies.
#[derive(Clone, Copy, PartialEq, Eq, Debug, Zeroize)]
pub enum Timelock {
  /// No additional timelock.
  None,
  /// Additionally locked until this block.
  Block(usize),
  /// Additionally locked until this many seconds since the epoch.
  Time(u64),
}

impl Timelock {
  /// Write the Timelock.
  pub fn write<W: Write>(&self, w: &mut W) -> io::Result<()> {
    match self {
      Timelock::None => VarInt::write(&0u8, w),
      Timelock::Block(block) => VarInt::write(block, w),
      Timelock::Time(time) => VarInt::write(time, w),
    }
  }

  /// Serialize the Timelock to a `Vec<u8>`.
  pub fn serialize(&self) -> Vec<u8> {
    let mut res = Vec::with_capacity(1);
    self.write(&mut res).expect("write failed but <Vec as io::Write> doesn't fail");
    res
  }

  /// Read a Timelock.
  pub fn read<R: Read>(r: &mut R) -> io::Result<Self> {
    const TIMELOCK_BLOCK_THRESHOLD: usize = 500_000_000;

    let raw = <u64 as VarInt>::read(r)?;
    Ok(if raw == 0 {
      Timelock::None
    } else if raw <
      u64::try_from(TIMELOCK_BLOCK_THRESHOLD)
        .expect("TIMELOCK_BLOCK_THRESHOLD didn't fit in a u64")
    {
      Timelock::Block(usize::try_from(raw).expect(
        "timelock overflowed usize despite being less than a const representable with a usize",
      ))
    } else {
      Timelock::Time(raw)
    })
  }
}

impl PartialOrd for Timelock {
  fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
    match (self, other) {
      (Timelock::None, Timelock::None) => Some(Ordering::Equal),
      (Timelock::None, _) => Some(Ordering::Less),
      (_, Timelock::None) => Some(Ordering::Greater),
      (Timelock::Block(a), Timelock::Block(b)) => a.partial_cmp(b),
      (Timelock::Time(a), Timelock::Time(b)) => a.partial_cmp(b),
      _ => None,
    }
  }
}

/// The transaction prefix.
///
/// This is the part of the transaction common to both its hash and its signing hash; it excludes
/// the ring signatures themselves.
#[derive(Clone, PartialEq, Eq, Debug)]
pub struct TransactionPrefix {
  /// The timelock this transaction is additionally constrained by.
  pub additional_timelock: Timelock,
  /// The inputs for this transaction.
  pub inputs: Vec<Input>,
  /// The outputs for this transaction.
  pub outputs: Vec<Output>,
  /// The additional data included within the transaction (payment ID, tx public key, ...).
  pub extra: Vec<u8>,
}

impl TransactionPrefix {
  /// Write a TransactionPrefix.
  ///
  /// This is distinct from the on-chain encoding in that it won't write the version.
  fn write<W: Write>(&self, w: &mut W) -> io::Result<()> {
    self.additional_timelock.write(w)?;
    write_vec(Input::write, &self.inputs, w)?;
    write_vec(Output::write, &self.outputs, w)?;
    VarInt::write(&self.extra.len(), w)?;
    w.write_all(&self.extra)
  }

  /// Read a TransactionPrefix.
  ///
  /// This is distinct from the on-chain encoding in that the version must be read and passed in
  /// separately, as it's shared with the prunable part of the transaction.
  pub fn read<R: Read>(r: &mut R) -> io::Result<TransactionPrefix> {
    let additional_timelock = Timelock::read(r)?;

    let inputs = read_vec(|r| Input::read(r), Some(Transaction::NON_MINER_SIZE_UPPER_BOUND), r)?;
    if inputs.is_empty() {
      Err(io::Error::other("transaction had no inputs"))?;
    }
    let is_miner_tx = matches!(inputs[0], Input::Gen { .. });

    let max_outputs = if is_miner_tx { None } else { Some(Transaction::NON_MINER_SIZE_UPPER_BOUND) };
    let outputs = read_vec(|r| Output::read(r), max_outputs, r)?;

    let max_extra = if is_miner_tx { None } else { Some(Transaction::NON_MINER_SIZE_UPPER_BOUND) };
    let extra = read_vec(read_byte, max_extra, r)?;

    Ok(TransactionPrefix { additional_timelock, inputs, outputs, extra })
  }
}

/// A classic (version 1) Monero transaction.
///
/// This protocol has no Pedersen commitments, no encrypted amounts, and no CLSAG: every input is
/// spent with a plain Schnorr-style ring signature, and every output carries its amount in the
/// clear.
#[derive(Clone, PartialEq, Eq, Debug)]
pub struct Transaction {
  /// The transaction's prefix.
  pub prefix: TransactionPrefix,
  /// One ring signature per [`Input::ToKey`] input, in input order.
  pub signatures: Vec<RingSignature>,
}

impl Transaction {
  /// The maximum size for a non-miner transaction.
  pub const NON_MINER_SIZE_UPPER_BOUND: usize = 1_000_000;

  /// Write the Transaction.
  pub fn write<W: Write>(&self, w: &mut W) -> io::Result<()> {
    VarInt::write(&1u8, w)?;
    self.prefix.write(w)?;
    for signature in &self.signatures {
      signature.write(w)?;
    }
    Ok(())
  }

  /// Write the Transaction to a `Vec<u8>`.
  pub fn serialize(&self) -> Vec<u8> {
    let mut res = Vec::with_capacity(2048);
    self.write(&mut res).expect("write failed but <Vec as io::Write> doesn't fail");
    res
  }

  /// Read a Transaction.
  pub fn read<R: Read>(r: &mut R) -> io::Result<Self> {
    let version = VarInt::read(r)?;
    if version != 1u64 {
      Err(io::Error::other("tried to deserialize a non-v1 transaction"))?;
    }

    let prefix = TransactionPrefix::read(r)?;
    let signatures = if (prefix.inputs.len() == 1) && matches!(prefix.inputs[0], Input::Gen(_)) {
      vec![]
    } else {
      let mut signatures = Vec::with_capacity(prefix.inputs.len());
      for input in &prefix.inputs {
        match input {
          Input::ToKey { key_offsets, .. } => {
            signatures.push(RingSignature::read(key_offsets.len(), r)?)
          }
          Input::Gen(_) => Err(io::Error::other("Gen input mixed with ToKey inputs"))?,
        }
      }
      signatures
    };

    Ok(Transaction { prefix, signatures })
  }

  /// The hash of the transaction, as would be used to reference it on-chain.
  pub fn hash(&self) -> [u8; 32] {
    let mut buf = Vec::with_capacity(512);
    self.write(&mut buf).expect("write failed but <Vec as io::Write> doesn't fail");
    keccak256(buf)
  }

  /// The hash signed over by each of this transaction's ring signatures.
  ///
  /// Returns `None` for a miner transaction, which carries no signatures.
  pub fn signature_hash(&self) -> Option<[u8; 32]> {
    if (self.prefix.inputs.len() == 1) && matches!(self.prefix.inputs[0], Input::Gen(_)) {
      return None;
    }

    let mut buf = Vec::with_capacity(512);
    VarInt::write(&1u8, &mut buf).expect("write failed but <Vec as io::Write> doesn't fail");
    self.prefix.write(&mut buf).expect("write failed but <Vec as io::Write> doesn't fail");
    Some(keccak256(buf))
  }
}
