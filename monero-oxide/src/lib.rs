#![cfg_attr(docsrs, feature(doc_cfg))]
#![doc = "Classic (non-RingCT) CryptoNote transaction primitives: wire types, ring signatures, and the small set of curve-level helpers a wallet needs to build and verify them."]
#![deny(missing_docs)]
#![cfg_attr(not(feature = "std"), no_std)]

pub use monero_oxide_io as io;
pub use monero_oxide_ed25519 as ed25519;

/// Keccak-256 hashing and key-derivation helpers shared by the modules below.
pub mod primitives;

/// Ring signature generation and verification.
pub mod ring_signatures;

/// Transaction wire types (version 1, plain ring signatures).
pub mod transaction;
