#![cfg_attr(docsrs, feature(doc_cfg))]
#![doc = "Ed25519 curve operations as used by the Monero protocol."]
#![deny(missing_docs)]
#![cfg_attr(not(feature = "std"), no_std)]

mod scalar;
pub use scalar::Scalar;

mod point;
pub use point::Point;

mod compressed_point;
pub use compressed_point::CompressedPoint;
