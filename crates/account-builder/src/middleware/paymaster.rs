use std::sync::Arc;

use async_trait::async_trait;
use serde_json::Value;
use tracing::debug;

use super::{Middleware, MiddlewareContext};
use crate::client::BundlerClient;
use crate::error::MiddlewareError;
use crate::types::UserOperation;

/// Sponsors the operation through a verifying paymaster (`pm_sponsorUserOperation`).
///
/// The paymaster signs over the gas limits it returns, so this step replaces gas
/// estimation entirely and writes `paymasterAndData` together with the three gas
/// limit fields.
pub struct VerifyingPaymaster {
    paymaster: Arc<dyn BundlerClient>,
    context: Value,
}

impl VerifyingPaymaster {
    /// Create a sponsorship step. `context` is forwarded verbatim to the paymaster.
    pub fn new(paymaster: Arc<dyn BundlerClient>, context: Value) -> Self {
        Self { paymaster, context }
    }
}

#[async_trait]
impl Middleware for VerifyingPaymaster {
    fn name(&self) -> &'static str {
        "verifying_paymaster"
    }

    async fn process(
        &self,
        op: &mut UserOperation,
        ctx: &MiddlewareContext,
    ) -> Result<(), MiddlewareError> {
        let sponsorship =
            self.paymaster.sponsor_user_operation(op, ctx.entry_point, &self.context).await?;

        debug!(
            target: "account-builder",
            paymaster_and_data_len = sponsorship.paymaster_and_data.len(),
            call_gas_limit = %sponsorship.call_gas_limit,
            "Operation sponsored by paymaster"
        );

        op.apply(sponsorship.into());
        Ok(())
    }
}
