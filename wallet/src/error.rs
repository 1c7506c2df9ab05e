/// An error encountered while building, signing, or relaying a transaction.
#[derive(Clone, PartialEq, Eq, Debug, thiserror::Error)]
pub enum SendError {
  /// The node could not be reached at all.
  #[error("daemon is offline")]
  DaemonOffline,
  /// The node was reached but returned an error relaying the transaction.
  #[error("daemon error: {0}")]
  DaemonError(String),
  /// The selected inputs don't cover the destinations (and fee, if known).
  ///
  /// `needed` is the total amount, including fee, the build would have required.
  #[error("not enough balance, needed {needed}")]
  NotEnoughBalance {
    /// The amount, in atomic units, that would have been required to proceed.
    needed: u64,
  },
  /// The node could not supply enough decoy outputs for the requested mixin.
  #[error("not enough fake outputs: {0}")]
  NotEnoughFakeOutputs(String),
  /// A fusion transaction couldn't reach the required mixin for its input/output ratio.
  #[error("mixin too large for a fusion transaction")]
  FusionMixinTooLarge,
  /// There are too few unspent outputs left to fuse; nothing to do.
  #[error("wallet is already fully optimized")]
  FullyOptimized,
  /// A `FeeSpec::Fixed` fee was below the network minimum for the built size.
  #[error("fee too small")]
  FeeTooSmall,
  /// The self-checked fee did not match what was expected post-build.
  #[error("unexpected fee")]
  UnexpectedFee,
  /// An output amount fell outside the canonical `PRETTY_AMOUNTS` set.
  #[error("output amounts weren't all pretty amounts")]
  AmountsNotPretty,
  /// A freshly generated ring signature failed its own self-verification.
  #[error("failed to create ring signature")]
  FailedToCreateRingSignature,
  /// The denomination splitter produced an inconsistent decomposition.
  #[error("output decomposition error")]
  OutputDecomposition,
  /// The transaction would not fit within the block/relay size limit.
  #[error("too many inputs to fit in a block: {0}")]
  TooManyInputsToFitInBlock(String),
  /// A previously prepared transaction is no longer valid (an input was spent elsewhere).
  #[error("prepared transaction expired")]
  PreparedTransactionExpired,
  /// The daemon reported one of this transaction's key images as already spent.
  #[error("input key image already spent")]
  InputKeyImageAlreadySpent,
}
