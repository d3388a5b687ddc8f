//! Core types for ERC-4337 v0.6 user operations.

use alloy_primitives::{Address, B256, Bytes, ChainId, U256, keccak256};
use alloy_sol_types::{SolValue, sol};
use serde::{Deserialize, Serialize};

/// Default verification gas limit of a fresh user operation.
pub const DEFAULT_VERIFICATION_GAS_LIMIT: u64 = 70_000;
/// Default call gas limit of a fresh user operation.
pub const DEFAULT_CALL_GAS_LIMIT: u64 = 35_000;
/// Default pre-verification gas of a fresh user operation.
pub const DEFAULT_PRE_VERIFICATION_GAS: u64 = 21_000;

/// User operation as defined by ERC-4337 v0.6.
///
/// Serializes to the JSON shape accepted by bundlers (`eth_sendUserOperation`,
/// `eth_estimateUserOperationGas`): camelCase keys, hex quantities and hex bytes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserOperation {
    /// The account making the operation.
    pub sender: Address,
    /// Anti-replay nonce, as reported by the entry point.
    pub nonce: U256,
    /// Factory address followed by the factory calldata. Empty once deployed.
    pub init_code: Bytes,
    /// Calldata executed by the account.
    pub call_data: Bytes,
    /// Gas limit for the execution phase.
    pub call_gas_limit: U256,
    /// Gas limit for the validation phase.
    pub verification_gas_limit: U256,
    /// Gas paid to the bundler to cover calldata and overhead.
    pub pre_verification_gas: U256,
    /// EIP-1559 max fee per gas.
    pub max_fee_per_gas: U256,
    /// EIP-1559 max priority fee per gas.
    pub max_priority_fee_per_gas: U256,
    /// Paymaster address followed by paymaster specific data. Empty when self-funded.
    pub paymaster_and_data: Bytes,
    /// Signature over [`UserOperation::hash`].
    pub signature: Bytes,
}

impl Default for UserOperation {
    fn default() -> Self {
        Self {
            sender: Address::ZERO,
            nonce: U256::ZERO,
            init_code: Bytes::new(),
            call_data: Bytes::new(),
            call_gas_limit: U256::from(DEFAULT_CALL_GAS_LIMIT),
            verification_gas_limit: U256::from(DEFAULT_VERIFICATION_GAS_LIMIT),
            pre_verification_gas: U256::from(DEFAULT_PRE_VERIFICATION_GAS),
            max_fee_per_gas: U256::ZERO,
            max_priority_fee_per_gas: U256::ZERO,
            paymaster_and_data: Bytes::new(),
            signature: Bytes::new(),
        }
    }
}

sol! {
    #[derive(Default, Debug, PartialEq, Eq)]
    struct UserOperationHashEncoded {
        bytes32 encodedHash;
        address entryPoint;
        uint256 chainId;
    }

    #[derive(Default, Debug, PartialEq, Eq)]
    struct UserOperationPackedForHash {
        address sender;
        uint256 nonce;
        bytes32 hashInitCode;
        bytes32 hashCallData;
        uint256 callGasLimit;
        uint256 verificationGasLimit;
        uint256 preVerificationGas;
        uint256 maxFeePerGas;
        uint256 maxPriorityFeePerGas;
        bytes32 hashPaymasterAndData;
    }
}

impl From<&UserOperation> for UserOperationPackedForHash {
    fn from(op: &UserOperation) -> Self {
        Self {
            sender: op.sender,
            nonce: op.nonce,
            hashInitCode: keccak256(&op.init_code),
            hashCallData: keccak256(&op.call_data),
            callGasLimit: op.call_gas_limit,
            verificationGasLimit: op.verification_gas_limit,
            preVerificationGas: op.pre_verification_gas,
            maxFeePerGas: op.max_fee_per_gas,
            maxPriorityFeePerGas: op.max_priority_fee_per_gas,
            hashPaymasterAndData: keccak256(&op.paymaster_and_data),
        }
    }
}

impl UserOperation {
    /// Computes the hash of this user operation as defined by ERC-4337 v0.6.
    ///
    /// Every field except the signature is committed to, together with the entry
    /// point address and the chain id.
    pub fn hash(&self, entry_point: Address, chain_id: ChainId) -> B256 {
        let packed = UserOperationPackedForHash::from(self);
        let encoded = UserOperationHashEncoded {
            encodedHash: keccak256(packed.abi_encode()),
            entryPoint: entry_point,
            chainId: U256::from(chain_id),
        };
        keccak256(encoded.abi_encode())
    }

    /// Returns true if the operation carries deployment code.
    pub fn deploys_account(&self) -> bool {
        !self.init_code.is_empty()
    }

    /// Overwrites every field set in `partial`.
    pub fn apply(&mut self, partial: UserOperationPartial) {
        let UserOperationPartial {
            sender,
            nonce,
            init_code,
            call_data,
            call_gas_limit,
            verification_gas_limit,
            pre_verification_gas,
            max_fee_per_gas,
            max_priority_fee_per_gas,
            paymaster_and_data,
            signature,
        } = partial;

        if let Some(v) = sender {
            self.sender = v;
        }
        if let Some(v) = nonce {
            self.nonce = v;
        }
        if let Some(v) = init_code {
            self.init_code = v;
        }
        if let Some(v) = call_data {
            self.call_data = v;
        }
        if let Some(v) = call_gas_limit {
            self.call_gas_limit = v;
        }
        if let Some(v) = verification_gas_limit {
            self.verification_gas_limit = v;
        }
        if let Some(v) = pre_verification_gas {
            self.pre_verification_gas = v;
        }
        if let Some(v) = max_fee_per_gas {
            self.max_fee_per_gas = v;
        }
        if let Some(v) = max_priority_fee_per_gas {
            self.max_priority_fee_per_gas = v;
        }
        if let Some(v) = paymaster_and_data {
            self.paymaster_and_data = v;
        }
        if let Some(v) = signature {
            self.signature = v;
        }
    }
}

/// A user operation where every field is optional.
///
/// Used to seed builder defaults and to carry multi-field updates.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UserOperationPartial {
    /// See [`UserOperation::sender`].
    pub sender: Option<Address>,
    /// See [`UserOperation::nonce`].
    pub nonce: Option<U256>,
    /// See [`UserOperation::init_code`].
    pub init_code: Option<Bytes>,
    /// See [`UserOperation::call_data`].
    pub call_data: Option<Bytes>,
    /// See [`UserOperation::call_gas_limit`].
    pub call_gas_limit: Option<U256>,
    /// See [`UserOperation::verification_gas_limit`].
    pub verification_gas_limit: Option<U256>,
    /// See [`UserOperation::pre_verification_gas`].
    pub pre_verification_gas: Option<U256>,
    /// See [`UserOperation::max_fee_per_gas`].
    pub max_fee_per_gas: Option<U256>,
    /// See [`UserOperation::max_priority_fee_per_gas`].
    pub max_priority_fee_per_gas: Option<U256>,
    /// See [`UserOperation::paymaster_and_data`].
    pub paymaster_and_data: Option<Bytes>,
    /// See [`UserOperation::signature`].
    pub signature: Option<Bytes>,
}

/// Gas limits reported by `eth_estimateUserOperationGas`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GasEstimate {
    /// Estimated pre-verification gas.
    pub pre_verification_gas: U256,
    /// Estimated verification gas limit. Older bundlers report it as `verificationGas`.
    #[serde(alias = "verificationGas")]
    pub verification_gas_limit: U256,
    /// Estimated call gas limit.
    pub call_gas_limit: U256,
}

/// Response of `pm_sponsorUserOperation`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SponsorshipResult {
    /// Paymaster address followed by its signed approval.
    pub paymaster_and_data: Bytes,
    /// Pre-verification gas the paymaster signed over.
    pub pre_verification_gas: U256,
    /// Verification gas limit the paymaster signed over.
    pub verification_gas_limit: U256,
    /// Call gas limit the paymaster signed over.
    pub call_gas_limit: U256,
}

impl From<SponsorshipResult> for UserOperationPartial {
    fn from(result: SponsorshipResult) -> Self {
        Self {
            paymaster_and_data: Some(result.paymaster_and_data),
            pre_verification_gas: Some(result.pre_verification_gas),
            verification_gas_limit: Some(result.verification_gas_limit),
            call_gas_limit: Some(result.call_gas_limit),
            ..Default::default()
        }
    }
}

impl From<GasEstimate> for UserOperationPartial {
    fn from(estimate: GasEstimate) -> Self {
        Self {
            pre_verification_gas: Some(estimate.pre_verification_gas),
            verification_gas_limit: Some(estimate.verification_gas_limit),
            call_gas_limit: Some(estimate.call_gas_limit),
            ..Default::default()
        }
    }
}
