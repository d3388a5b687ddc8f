//! Calldata encoding for the multisig account's execution entry points.

use alloy_primitives::{Address, Bytes, U256};
use alloy_sol_types::SolCall;

use crate::contracts::IMultisigAccount;
use crate::error::ValidationError;

/// What the account should do when the user operation executes
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CallIntent {
    /// A single call
    Call { to: Address, value: U256, data: Bytes },
    /// Several value-less calls executed in order
    Batch { to: Vec<Address>, data: Vec<Bytes> },
}

impl CallIntent {
    /// Encode into account calldata
    pub fn encode(self) -> Result<Bytes, ValidationError> {
        match self {
            Self::Call { to, value, data } => Ok(encode_execute(to, value, data)),
            Self::Batch { to, data } => encode_execute_batch(to, data),
        }
    }
}

/// Encode `execute(to, value, data)`
pub fn encode_execute(to: Address, value: U256, data: Bytes) -> Bytes {
    IMultisigAccount::executeCall { dest: to, value, func: data }.abi_encode().into()
}

/// Encode `executeBatch(to, data)`.
///
/// Both lists must have the same length.
pub fn encode_execute_batch(to: Vec<Address>, data: Vec<Bytes>) -> Result<Bytes, ValidationError> {
    if to.len() != data.len() {
        return Err(ValidationError::BatchLengthMismatch { targets: to.len(), calls: data.len() });
    }

    Ok(IMultisigAccount::executeBatchCall { dest: to, func: data }.abi_encode().into())
}
