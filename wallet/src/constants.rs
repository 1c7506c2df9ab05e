//! Chain parameters for the single active fork this crate targets.
//!
//! These are client-side constants, not consensus rules this crate enforces; a production caller
//! is expected to keep them in sync with whatever the connected node actually accepts.

/// The network's absolute floor for a transaction fee, in atomic units.
pub const MINIMUM_FEE: u64 = 10;

/// The minimum fee-per-byte rate, in atomic units per byte.
pub const MINIMUM_FEE_PER_BYTE_V1: f64 = 25.6 / 256.0;

/// The height at which the per-byte floor replaces the flat [`MINIMUM_FEE`].
///
/// Below this height, a [`crate::types::FeeSpec::Fixed`] fee only has to clear the flat floor;
/// at or above it, the per-byte rate applies instead.
pub const MINIMUM_FEE_PER_BYTE_V1_HEIGHT: u64 = 2_200_000;

/// Fee-per-byte calculations are rounded up to a multiple of this many bytes.
pub const FEE_PER_BYTE_CHUNK_SIZE: u64 = 256;

/// The fewest inputs a fusion (consolidation) transaction may spend.
pub const FUSION_TX_MIN_INPUT_COUNT: usize = 12;

/// The minimum ratio of inputs to outputs a fusion transaction must maintain.
pub const FUSION_TX_MIN_IN_OUT_COUNT_RATIO: usize = 4;

/// The largest a fusion transaction may be, in bytes.
pub const FUSION_TX_MAX_SIZE: usize = 30_000;

/// The most outputs a non-fusion transaction may carry.
pub const NORMAL_TX_MAX_OUTPUT_COUNT_V1: usize = 90;

/// The largest denomination a client will ever emit as a single output.
///
/// Anything the splitter would otherwise emit above this is divided into ten equal chunks,
/// recursively, until every chunk fits.
pub const MAX_OUTPUT_SIZE_CLIENT: u64 = 40_000_000_000;

/// The largest output amount a node will accept, independent of the client's own cap.
pub const MAX_OUTPUT_SIZE_NODE: u64 = 187_500_000_000;

/// The mixin (decoys per input) used when the caller doesn't request one explicitly.
pub const DEFAULT_MIXIN: usize = 3;

/// The smallest mixin this crate will build a ring for.
pub const MINIMUM_MIXIN: usize = 1;

/// The largest mixin this crate will build a ring for.
pub const MAXIMUM_MIXIN: usize = 100;

/// The length, in characters, of a base58-encoded integrated address.
pub const INTEGRATED_ADDRESS_LENGTH: usize = 97 + (64 * 11) / 8;

/// Tag byte identifying a payment-ID sub-field within an extra-nonce blob.
pub const PAYMENT_ID_ID: u8 = 0x00;

/// Tag byte identifying an arbitrary-data sub-field within an extra-nonce blob.
pub const ARBITRARY_DATA_ID: u8 = 0x7f;

/// Tag byte identifying the extra-nonce sub-blob within `tx_extra`.
pub const EXTRA_NONCE_ID: u8 = 0x02;

/// Tag byte identifying the transaction public key within `tx_extra`.
pub const EXTRA_PUBKEY_ID: u8 = 0x01;

/// The bound on the adjust-to-actual sub-loop (§4.G); exceeding it fails the build rather than
/// looping forever on a pathological size/fee oscillation.
pub const MAX_FEE_ADJUSTMENT_ITERATIONS: usize = 8;
