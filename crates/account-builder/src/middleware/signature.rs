use alloy_primitives::{Bytes, keccak256};
use alloy_signer::Signer;
use async_trait::async_trait;
use tracing::debug;

use super::{Middleware, MiddlewareContext};
use crate::error::MiddlewareError;
use crate::types::UserOperation;

/// Signs the user operation hash with an externally owned key.
///
/// The signature is an EIP-191 personal message signature over the 32-byte user
/// operation hash, which is what the multisig account's owner check recovers.
/// This step is terminal.
pub struct EoaSignature<S> {
    signer: S,
}

impl<S> EoaSignature<S> {
    /// Create a signature step for `signer`
    pub const fn new(signer: S) -> Self {
        Self { signer }
    }
}

/// Signature with the length and shape of a real one, for operations that are not
/// signed yet.
///
/// Bundlers charge verification gas by simulating the account's signature check, so
/// estimating with an empty signature under-prices the operation.
pub async fn placeholder_signature<S>(signer: &S) -> Result<Bytes, alloy_signer::Error>
where
    S: Signer + Send + Sync,
{
    let signature = signer.sign_message(keccak256([0xde, 0xad]).as_slice()).await?;
    Ok(Bytes::from(signature.as_bytes()))
}

#[async_trait]
impl<S> Middleware for EoaSignature<S>
where
    S: Signer + Send + Sync,
{
    fn name(&self) -> &'static str {
        "eoa_signature"
    }

    fn is_terminal(&self) -> bool {
        true
    }

    async fn process(
        &self,
        op: &mut UserOperation,
        ctx: &MiddlewareContext,
    ) -> Result<(), MiddlewareError> {
        let hash = ctx.user_op_hash(op);
        let signature = self.signer.sign_message(hash.as_slice()).await?;
        op.signature = Bytes::from(signature.as_bytes());

        debug!(
            target: "account-builder",
            user_op_hash = %hash,
            signer = %self.signer.address(),
            "Signed user operation"
        );

        Ok(())
    }
}
