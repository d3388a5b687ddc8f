//! Error types for building user operations.

use alloy_primitives::Bytes;
use thiserror::Error;

/// Result type for builder operations
pub type BuilderResult<T> = Result<T, BuilderError>;

/// Errors returned by a [`ChainClient`](crate::ChainClient) or
/// [`BundlerClient`](crate::BundlerClient).
#[derive(Debug, Error)]
pub enum ClientError {
    /// The RPC request could not be completed
    #[error("RPC request `{method}` failed: {message}")]
    Transport { method: &'static str, message: String },

    /// The RPC response could not be decoded
    #[error("Failed to decode `{method}` response: {message}")]
    Decode { method: &'static str, message: String },
}

impl ClientError {
    /// Create a transport error for `method`
    pub fn transport(method: &'static str, message: impl ToString) -> Self {
        Self::Transport { method, message: message.to_string() }
    }

    /// Create a decode error for `method`
    pub fn decode(method: &'static str, message: impl ToString) -> Self {
        Self::Decode { method, message: message.to_string() }
    }
}

/// Why the counterfactual sender address could not be learned.
#[derive(Debug, Error)]
pub enum AddressLookupFailure {
    /// The lookup never reached the entry point
    #[error(transparent)]
    Client(#[from] ClientError),

    /// `getSenderAddress` reverted without a `SenderAddressResult` payload
    #[error("getSenderAddress reverted without a sender address: {0}")]
    UnrecognizedRevert(Bytes),

    /// `getSenderAddress` returned instead of reverting
    #[error("getSenderAddress returned instead of reverting: {0}")]
    ReturnedNormally(Bytes),
}

/// Input rejected before any network call is made.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    /// `executeBatch` received differently sized target and calldata lists
    #[error("executeBatch length mismatch: {targets} targets, {calls} calldata entries")]
    BatchLengthMismatch { targets: usize, calls: usize },

    /// A middleware was registered after the signature step
    #[error("middleware `{step}` registered after signature middleware `{signer}`")]
    MiddlewareAfterSignature { step: &'static str, signer: &'static str },
}

/// Errors raised by a single middleware step.
#[derive(Debug, Error)]
pub enum MiddlewareError {
    /// Chain, bundler or paymaster client failure
    #[error(transparent)]
    Client(#[from] ClientError),

    /// Signer failure
    #[error("Signer error: {0}")]
    Signer(#[from] alloy_signer::Error),

    /// Both the EIP-1559 and the legacy gas price lookups failed
    #[error("Gas price unavailable: {eip1559}, {legacy}")]
    GasPriceUnavailable { eip1559: ClientError, legacy: ClientError },

    /// Any other step specific failure
    #[error("{0}")]
    Other(String),
}

/// Errors that can occur while constructing an account or building an operation
#[derive(Debug, Error)]
pub enum BuilderError {
    /// The counterfactual sender address could not be resolved
    #[error("Failed to resolve sender address: {0}")]
    AddressResolution(AddressLookupFailure),

    /// `getSenderAddress` did not revert. The node is not honouring the protocol
    #[error("EntryPoint protocol invariant violated: getSenderAddress returned {0}")]
    ProtocolInvariantViolation(Bytes),

    /// Caller input was rejected
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),

    /// A middleware step failed and the pipeline was aborted
    #[error("Middleware `{step}` failed: {source}")]
    Middleware {
        step: &'static str,
        #[source]
        source: MiddlewareError,
    },

    /// A client call outside of the pipeline failed
    #[error(transparent)]
    Client(#[from] ClientError),

    /// Signing outside of the pipeline failed
    #[error("Signer error: {0}")]
    Signer(#[from] alloy_signer::Error),
}

impl BuilderError {
    /// Wrap a middleware failure with the name of the step that produced it
    pub fn middleware(step: &'static str, source: MiddlewareError) -> Self {
        Self::Middleware { step, source }
    }

    /// Name of the failed step, if the error came from the pipeline
    pub fn failed_step(&self) -> Option<&'static str> {
        match self {
            Self::Middleware { step, .. } => Some(step),
            _ => None,
        }
    }

    /// Check if this error was raised before any network call
    pub fn is_validation_error(&self) -> bool {
        matches!(self, Self::Validation(_))
    }
}

impl From<AddressLookupFailure> for BuilderError {
    fn from(failure: AddressLookupFailure) -> Self {
        match failure {
            AddressLookupFailure::ReturnedNormally(data) => Self::ProtocolInvariantViolation(data),
            other => Self::AddressResolution(other),
        }
    }
}
