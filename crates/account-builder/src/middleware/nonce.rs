use std::sync::Arc;

use alloy_primitives::{Address, Bytes, U256, aliases::U192};
use alloy_sol_types::SolCall;
use async_trait::async_trait;
use tracing::debug;

use super::{Middleware, MiddlewareContext};
use crate::client::{ChainClient, SimulationCallResult};
use crate::contracts::IEntryPoint;
use crate::error::{ClientError, MiddlewareError};
use crate::types::UserOperation;

/// Resolves `nonce` and `initCode`.
///
/// The nonce is read fresh from the entry point on every build. A zero nonce means the
/// account has never executed an operation, so the deployment code is attached;
/// otherwise `initCode` is cleared.
pub struct ResolveAccount {
    client: Arc<dyn ChainClient>,
    init_code: Bytes,
}

impl ResolveAccount {
    /// Create a resolver attaching `init_code` to operations of undeployed accounts
    pub fn new(client: Arc<dyn ChainClient>, init_code: Bytes) -> Self {
        Self { client, init_code }
    }

    async fn get_nonce(&self, entry_point: Address, sender: Address) -> Result<U256, ClientError> {
        let call = IEntryPoint::getNonceCall { sender, key: U192::ZERO };
        match self.client.eth_call(entry_point, call.abi_encode().into()).await? {
            SimulationCallResult::Success(data) => {
                IEntryPoint::getNonceCall::abi_decode_returns(&data)
                    .map_err(|e| ClientError::decode("getNonce", e))
            }
            SimulationCallResult::Revert(data) => Err(ClientError::transport(
                "getNonce",
                format!("reverted: 0x{}", alloy_primitives::hex::encode(&data)),
            )),
        }
    }
}

#[async_trait]
impl Middleware for ResolveAccount {
    fn name(&self) -> &'static str {
        "resolve_account"
    }

    async fn process(
        &self,
        op: &mut UserOperation,
        ctx: &MiddlewareContext,
    ) -> Result<(), MiddlewareError> {
        op.nonce = self.get_nonce(ctx.entry_point, op.sender).await?;
        op.init_code = if op.nonce.is_zero() { self.init_code.clone() } else { Bytes::new() };

        debug!(
            target: "account-builder",
            sender = %op.sender,
            nonce = %op.nonce,
            deploying = op.deploys_account(),
            "Resolved account nonce"
        );

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use alloy_primitives::{address, bytes};

    use super::*;
    use crate::test_utils::MockChainClient;

    const SENDER: Address = address!("abcdabcdabcdabcdabcdabcdabcdabcdabcdabcd");

    async fn resolve(nonce: u64) -> UserOperation {
        let client = Arc::new(MockChainClient::new(SENDER, nonce));
        let step = ResolveAccount::new(client, bytes!("c0ffee"));
        let ctx = MiddlewareContext::new(Address::ZERO, 1);

        let mut op = UserOperation { sender: SENDER, ..Default::default() };
        step.process(&mut op, &ctx).await.unwrap();
        op
    }

    #[tokio::test]
    async fn test_zero_nonce_attaches_init_code() {
        let op = resolve(0).await;

        assert_eq!(op.nonce, U256::ZERO);
        assert_eq!(op.init_code, bytes!("c0ffee"));
    }

    #[tokio::test]
    async fn test_nonzero_nonce_clears_init_code() {
        for nonce in [1, 42] {
            let op = resolve(nonce).await;

            assert_eq!(op.nonce, U256::from(nonce));
            assert!(op.init_code.is_empty());
        }
    }

    #[tokio::test]
    async fn test_nonce_is_never_cached() {
        let client = Arc::new(MockChainClient::new(SENDER, 0));
        let step = ResolveAccount::new(client.clone(), bytes!("c0ffee"));
        let ctx = MiddlewareContext::new(Address::ZERO, 1);

        let mut op = UserOperation { sender: SENDER, ..Default::default() };
        step.process(&mut op, &ctx).await.unwrap();
        assert!(op.deploys_account());

        client.set_nonce(1);
        step.process(&mut op, &ctx).await.unwrap();
        assert!(!op.deploys_account());
        assert_eq!(client.call_count(), 2);
    }
}
