//! JSON-RPC backed implementation of [`ChainClient`] and [`BundlerClient`].
//!
//! ERC-4337 bundlers proxy the standard `eth_*` namespace, so a single HTTP endpoint
//! usually serves both traits. Paymasters are reached through a second instance
//! pointed at the paymaster URL.

use alloy_primitives::{Address, B256, Bytes};
use alloy_provider::{Provider, ProviderBuilder, RootProvider};
use alloy_rpc_types_eth::{BlockNumberOrTag, TransactionRequest};
use alloy_transport::TransportError;
use async_trait::async_trait;
use serde_json::Value;
use tracing::debug;
use url::Url;

use crate::client::{BundlerClient, ChainClient, SimulationCallResult};
use crate::error::ClientError;
use crate::types::{GasEstimate, SponsorshipResult, UserOperation};

/// Client for a node or bundler reachable over HTTP JSON-RPC
#[derive(Debug, Clone)]
pub struct RpcClient {
    provider: RootProvider,
}

impl RpcClient {
    /// Creates a new client connected to the specified URL
    pub fn new(url: Url) -> Self {
        let provider = ProviderBuilder::new().disable_recommended_fillers().connect_http(url);

        Self { provider }
    }

    /// Wraps an existing provider
    pub const fn from_provider(provider: RootProvider) -> Self {
        Self { provider }
    }

    /// Extract revert data from a JSON-RPC error response, if it carries any
    fn revert_data(err: &TransportError) -> Option<Bytes> {
        err.as_error_resp().and_then(|payload| payload.as_revert_data())
    }
}

#[async_trait]
impl ChainClient for RpcClient {
    async fn eth_call(
        &self,
        to: Address,
        data: Bytes,
    ) -> Result<SimulationCallResult, ClientError> {
        let tx = TransactionRequest::default().to(to).input(data.into());

        match self.provider.call(tx).await {
            Ok(result) => {
                debug!(
                    target: "account-builder",
                    to = %to,
                    result_len = result.len(),
                    "eth_call returned success"
                );
                Ok(SimulationCallResult::Success(result))
            }
            Err(e) => match Self::revert_data(&e) {
                Some(revert) => {
                    debug!(
                        target: "account-builder",
                        to = %to,
                        revert_len = revert.len(),
                        "eth_call reverted"
                    );
                    Ok(SimulationCallResult::Revert(revert))
                }
                None => Err(ClientError::transport("eth_call", e)),
            },
        }
    }

    async fn chain_id(&self) -> Result<u64, ClientError> {
        self.provider.get_chain_id().await.map_err(|e| ClientError::transport("eth_chainId", e))
    }

    async fn gas_price(&self) -> Result<u128, ClientError> {
        self.provider.get_gas_price().await.map_err(|e| ClientError::transport("eth_gasPrice", e))
    }

    async fn max_priority_fee_per_gas(&self) -> Result<u128, ClientError> {
        self.provider
            .get_max_priority_fee_per_gas()
            .await
            .map_err(|e| ClientError::transport("eth_maxPriorityFeePerGas", e))
    }

    async fn latest_base_fee(&self) -> Result<Option<u128>, ClientError> {
        let block = self
            .provider
            .get_block_by_number(BlockNumberOrTag::Latest)
            .await
            .map_err(|e| ClientError::transport("eth_getBlockByNumber", e))?
            .ok_or_else(|| ClientError::decode("eth_getBlockByNumber", "latest block not found"))?;

        Ok(block.header.base_fee_per_gas.map(u128::from))
    }
}

#[async_trait]
impl BundlerClient for RpcClient {
    async fn estimate_user_operation_gas(
        &self,
        user_op: &UserOperation,
        entry_point: Address,
    ) -> Result<GasEstimate, ClientError> {
        self.provider
            .raw_request("eth_estimateUserOperationGas".into(), (user_op.clone(), entry_point))
            .await
            .map_err(|e| ClientError::transport("eth_estimateUserOperationGas", e))
    }

    async fn sponsor_user_operation(
        &self,
        user_op: &UserOperation,
        entry_point: Address,
        context: &Value,
    ) -> Result<SponsorshipResult, ClientError> {
        self.provider
            .raw_request(
                "pm_sponsorUserOperation".into(),
                (user_op.clone(), entry_point, context.clone()),
            )
            .await
            .map_err(|e| ClientError::transport("pm_sponsorUserOperation", e))
    }

    async fn send_user_operation(
        &self,
        user_op: &UserOperation,
        entry_point: Address,
    ) -> Result<B256, ClientError> {
        self.provider
            .raw_request("eth_sendUserOperation".into(), (user_op.clone(), entry_point))
            .await
            .map_err(|e| ClientError::transport("eth_sendUserOperation", e))
    }
}
