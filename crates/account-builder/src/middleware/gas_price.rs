use std::sync::Arc;

use alloy_primitives::U256;
use async_trait::async_trait;
use tracing::{debug, warn};

use super::{Middleware, MiddlewareContext};
use crate::client::ChainClient;
use crate::error::{ClientError, MiddlewareError};
use crate::types::UserOperation;

/// Buffer added on top of the suggested priority fee, in percent
const PRIORITY_FEE_BUFFER_PERCENT: u64 = 13;

/// Resolves `maxFeePerGas` and `maxPriorityFeePerGas`.
///
/// Uses EIP-1559 pricing when the node supports `eth_maxPriorityFeePerGas`, falling
/// back to the legacy gas price for both fields otherwise.
pub struct GasPrice {
    client: Arc<dyn ChainClient>,
}

/// Resolved fee fields
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Fees {
    max_fee_per_gas: U256,
    max_priority_fee_per_gas: U256,
}

impl GasPrice {
    /// Create a gas price resolver backed by `client`
    pub fn new(client: Arc<dyn ChainClient>) -> Self {
        Self { client }
    }

    async fn eip1559_fees(&self) -> Result<Fees, ClientError> {
        let tip = U256::from(self.client.max_priority_fee_per_gas().await?);
        let base_fee = self.client.latest_base_fee().await?;

        let max_priority_fee_per_gas =
            tip + tip / U256::from(100) * U256::from(PRIORITY_FEE_BUFFER_PERCENT);
        let max_fee_per_gas = match base_fee {
            Some(base_fee) => U256::from(base_fee) * U256::from(2) + max_priority_fee_per_gas,
            None => max_priority_fee_per_gas,
        };

        Ok(Fees { max_fee_per_gas, max_priority_fee_per_gas })
    }

    async fn legacy_fees(&self) -> Result<Fees, ClientError> {
        let gas_price = U256::from(self.client.gas_price().await?);
        Ok(Fees { max_fee_per_gas: gas_price, max_priority_fee_per_gas: gas_price })
    }
}

#[async_trait]
impl Middleware for GasPrice {
    fn name(&self) -> &'static str {
        "gas_price"
    }

    async fn process(
        &self,
        op: &mut UserOperation,
        _ctx: &MiddlewareContext,
    ) -> Result<(), MiddlewareError> {
        let fees = match self.eip1559_fees().await {
            Ok(fees) => fees,
            Err(eip1559) => {
                warn!(
                    target: "account-builder",
                    error = %eip1559,
                    "eth_maxPriorityFeePerGas failed, falling back to legacy gas price"
                );
                self.legacy_fees()
                    .await
                    .map_err(|legacy| MiddlewareError::GasPriceUnavailable { eip1559, legacy })?
            }
        };

        op.max_fee_per_gas = fees.max_fee_per_gas;
        op.max_priority_fee_per_gas = fees.max_priority_fee_per_gas;

        debug!(
            target: "account-builder",
            max_fee_per_gas = %fees.max_fee_per_gas,
            max_priority_fee_per_gas = %fees.max_priority_fee_per_gas,
            "Resolved gas price"
        );

        Ok(())
    }
}
