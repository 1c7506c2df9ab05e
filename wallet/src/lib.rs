#![cfg_attr(docsrs, feature(doc_cfg))]
#![doc = "Transaction construction core for a classic (non-RingCT) CryptoNote-family wallet: amount denomination, decoy selection, input finalization, output and extra-field building, signing, the fee/size feedback loop, and relay bookkeeping."]
#![deny(missing_docs)]

/// Client-side chain parameters (fee rate, mixin bounds, fusion thresholds, `tx_extra` tags).
pub mod constants;

/// Decomposing amounts into canonical "pretty" denominations.
pub mod amounts;

/// The data model shared by every stage of transaction construction.
pub mod types;

/// Error type returned by every fallible operation in this crate.
pub mod error;
pub use error::SendError;

/// External collaborators (node RPC, wallet persistence, address encoding) this crate calls
/// against without implementing.
pub mod traits;

/// Ring assembly: pulling decoys and merging the real output into a sorted ring.
pub mod decoys;

/// Input finalization: private ephemeral derivation and relative-offset encoding.
pub mod input;

/// Output building: one-time key derivation under a fresh transaction key pair.
pub mod output;

/// Building the `tx_extra` blob.
pub mod extra;

/// Signing a built transaction and self-verifying the result.
pub mod sign;

/// The fee/size feedback loop, and the fusion (consolidation) build variant.
pub mod fee;

/// Relaying a built transaction and recording the outcome in the wallet's local state.
pub mod relay;

/// Top-level orchestration: `prepare`, `send`, `send_prepared`, `send_fusion`.
pub mod send;

pub use send::{send, send_fusion, prepare, send_prepared, SendRequest};
pub use types::{Destination, FeeSpec, PreparedTransactionInfo, SpendableInput, UnconfirmedTransaction};
pub use traits::ContainerLock;
