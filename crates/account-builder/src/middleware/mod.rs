//! User operation middleware.
//!
//! A middleware is one asynchronous resolution step of the build pipeline. Steps run
//! strictly one after another, in registration order, over a single mutable
//! [`UserOperation`]. The order used by [`MultisigAccount`](crate::MultisigAccount) is:
//!
//! 1. [`ResolveAccount`]: nonce and `initCode`
//! 2. [`GasPrice`]: fee fields
//! 3. [`EstimateUserOperationGas`] or a sponsorship step such as [`VerifyingPaymaster`]
//! 4. [`EoaSignature`]: always last, see [`Middleware::is_terminal`]

mod gas_limit;
mod gas_price;
mod nonce;
mod paymaster;
mod signature;

pub use gas_limit::EstimateUserOperationGas;
pub use gas_price::GasPrice;
pub use nonce::ResolveAccount;
pub use paymaster::VerifyingPaymaster;
pub use signature::{EoaSignature, placeholder_signature};

use std::{fmt, sync::Arc};

use alloy_primitives::{Address, B256};
use async_trait::async_trait;

use crate::error::MiddlewareError;
use crate::types::UserOperation;

/// Read-only state shared by every step of one build
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MiddlewareContext {
    /// `EntryPoint` the operation targets
    pub entry_point: Address,
    /// Chain the operation is valid on
    pub chain_id: u64,
}

impl MiddlewareContext {
    /// Create a new context
    pub const fn new(entry_point: Address, chain_id: u64) -> Self {
        Self { entry_point, chain_id }
    }

    /// Hash of `op` as the entry point will compute it
    pub fn user_op_hash(&self, op: &UserOperation) -> B256 {
        op.hash(self.entry_point, self.chain_id)
    }
}

/// One step of the build pipeline
#[async_trait]
pub trait Middleware: Send + Sync {
    /// Name used in logs and errors
    fn name(&self) -> &'static str;

    /// Whether no step may run after this one.
    ///
    /// Signature steps are terminal: anything changed after signing would
    /// invalidate the signature.
    fn is_terminal(&self) -> bool {
        false
    }

    /// Resolve the fields this step owns
    async fn process(
        &self,
        op: &mut UserOperation,
        ctx: &MiddlewareContext,
    ) -> Result<(), MiddlewareError>;
}

/// How gas limits are resolved, chosen when the pipeline is assembled
#[derive(Clone)]
pub enum GasLimitStrategy {
    /// Self-funded: ask the bundler for estimates
    Estimate(Arc<EstimateUserOperationGas>),
    /// Sponsored: the paymaster step sets gas limits and `paymasterAndData`
    Sponsor(Arc<dyn Middleware>),
}

impl GasLimitStrategy {
    /// The step implementing this strategy
    pub fn into_middleware(self) -> Arc<dyn Middleware> {
        match self {
            Self::Estimate(estimator) => estimator as Arc<dyn Middleware>,
            Self::Sponsor(sponsor) => sponsor,
        }
    }

    /// Returns true if gas is sponsored by a paymaster
    pub const fn is_sponsored(&self) -> bool {
        matches!(self, Self::Sponsor(_))
    }
}

impl fmt::Debug for GasLimitStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Estimate(estimator) => {
                f.debug_tuple("Estimate").field(&estimator.name()).finish()
            }
            Self::Sponsor(sponsor) => f.debug_tuple("Sponsor").field(&sponsor.name()).finish(),
        }
    }
}
