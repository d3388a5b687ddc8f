//! Chain and bundler capabilities consumed by the builder.
//!
//! The builder never talks to a node directly. Everything it needs from the chain goes
//! through [`ChainClient`], and everything it needs from an ERC-4337 bundler or
//! paymaster goes through [`BundlerClient`]. [`RpcClient`](crate::RpcClient) implements
//! both over JSON-RPC; tests provide their own implementations.

use alloy_primitives::{Address, B256, Bytes};
use async_trait::async_trait;
use serde_json::Value;

use crate::error::ClientError;
use crate::types::{GasEstimate, SponsorshipResult, UserOperation};

/// Result of an `eth_call`
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SimulationCallResult {
    /// Call succeeded with return data
    Success(Bytes),
    /// Call reverted with revert data
    Revert(Bytes),
}

/// Read-only access to the chain the account lives on
#[async_trait]
pub trait ChainClient: Send + Sync {
    /// Execute an `eth_call` against the latest block.
    ///
    /// Returns `Success(data)` if the call returns normally, or `Revert(data)` if the
    /// call reverts with revert data. Any other failure is an error.
    async fn eth_call(&self, to: Address, data: Bytes) -> Result<SimulationCallResult, ClientError>;

    /// Chain id of the connected network
    async fn chain_id(&self) -> Result<u64, ClientError>;

    /// Legacy gas price (`eth_gasPrice`)
    async fn gas_price(&self) -> Result<u128, ClientError>;

    /// Suggested priority fee (`eth_maxPriorityFeePerGas`)
    async fn max_priority_fee_per_gas(&self) -> Result<u128, ClientError>;

    /// Base fee of the latest block, `None` before London
    async fn latest_base_fee(&self) -> Result<Option<u128>, ClientError>;
}

/// ERC-4337 bundler and paymaster RPC methods
#[async_trait]
pub trait BundlerClient: Send + Sync {
    /// `eth_estimateUserOperationGas`
    async fn estimate_user_operation_gas(
        &self,
        user_op: &UserOperation,
        entry_point: Address,
    ) -> Result<GasEstimate, ClientError>;

    /// `pm_sponsorUserOperation`
    async fn sponsor_user_operation(
        &self,
        user_op: &UserOperation,
        entry_point: Address,
        context: &Value,
    ) -> Result<SponsorshipResult, ClientError>;

    /// `eth_sendUserOperation`, returning the user operation hash
    async fn send_user_operation(
        &self,
        user_op: &UserOperation,
        entry_point: Address,
    ) -> Result<B256, ClientError>;
}
