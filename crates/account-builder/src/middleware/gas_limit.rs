use std::sync::Arc;

use async_trait::async_trait;
use tracing::debug;

use super::{Middleware, MiddlewareContext};
use crate::client::BundlerClient;
use crate::error::MiddlewareError;
use crate::types::UserOperation;

/// Resolves `preVerificationGas`, `verificationGasLimit` and `callGasLimit` through
/// the bundler's `eth_estimateUserOperationGas`.
pub struct EstimateUserOperationGas {
    bundler: Arc<dyn BundlerClient>,
}

impl EstimateUserOperationGas {
    /// Create an estimator backed by `bundler`
    pub fn new(bundler: Arc<dyn BundlerClient>) -> Self {
        Self { bundler }
    }
}

#[async_trait]
impl Middleware for EstimateUserOperationGas {
    fn name(&self) -> &'static str {
        "estimate_user_operation_gas"
    }

    async fn process(
        &self,
        op: &mut UserOperation,
        ctx: &MiddlewareContext,
    ) -> Result<(), MiddlewareError> {
        let estimate = self.bundler.estimate_user_operation_gas(op, ctx.entry_point).await?;

        debug!(
            target: "account-builder",
            pre_verification_gas = %estimate.pre_verification_gas,
            verification_gas_limit = %estimate.verification_gas_limit,
            call_gas_limit = %estimate.call_gas_limit,
            "Estimated user operation gas"
        );

        op.apply(estimate.into());
        Ok(())
    }
}
