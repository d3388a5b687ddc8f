//! Mock clients for unit tests.

use std::sync::{
    Mutex,
    atomic::{AtomicUsize, Ordering},
};

use alloy_primitives::{Address, B256, Bytes, U256};
use alloy_sol_types::{SolCall, SolError, SolValue};
use async_trait::async_trait;
use serde_json::Value;

use crate::client::{BundlerClient, ChainClient, SimulationCallResult};
use crate::contracts::{IEntryPoint, SenderAddressResult};
use crate::error::ClientError;
use crate::types::{GasEstimate, SponsorshipResult, UserOperation};

pub(crate) const TEST_BASE_FEE: u128 = 1_000_000_000;
pub(crate) const TEST_PRIORITY_FEE: u128 = 100_000_000;
pub(crate) const TEST_GAS_PRICE: u128 = 3_000_000_000;

/// Entry point that reports a fixed counterfactual sender and nonce
pub(crate) struct MockChainClient {
    pub predicted: Address,
    pub nonce: Mutex<U256>,
    pub priority_fee: u128,
    pub eip1559_supported: bool,
    pub legacy_supported: bool,
    pub calls: AtomicUsize,
}

impl MockChainClient {
    pub(crate) fn new(predicted: Address, nonce: u64) -> Self {
        Self {
            predicted,
            nonce: Mutex::new(U256::from(nonce)),
            priority_fee: TEST_PRIORITY_FEE,
            eip1559_supported: true,
            legacy_supported: true,
            calls: AtomicUsize::new(0),
        }
    }

    pub(crate) fn set_nonce(&self, nonce: u64) {
        *self.nonce.lock().unwrap() = U256::from(nonce);
    }

    pub(crate) fn call_count(&self) -> usize {
        self.calls.load(Ordering::Relaxed)
    }

    fn record(&self) {
        self.calls.fetch_add(1, Ordering::Relaxed);
    }
}

#[async_trait]
impl ChainClient for MockChainClient {
    async fn eth_call(
        &self,
        _to: Address,
        data: Bytes,
    ) -> Result<SimulationCallResult, ClientError> {
        self.record();
        let selector: [u8; 4] = data[..4].try_into().unwrap();
        if selector == IEntryPoint::getSenderAddressCall::SELECTOR {
            let revert = SenderAddressResult { sender: self.predicted }.abi_encode();
            return Ok(SimulationCallResult::Revert(revert.into()));
        }
        if selector == IEntryPoint::getNonceCall::SELECTOR {
            let nonce = *self.nonce.lock().unwrap();
            return Ok(SimulationCallResult::Success(nonce.abi_encode().into()));
        }
        Ok(SimulationCallResult::Revert(Bytes::new()))
    }

    async fn chain_id(&self) -> Result<u64, ClientError> {
        self.record();
        Ok(1337)
    }

    async fn gas_price(&self) -> Result<u128, ClientError> {
        self.record();
        if self.legacy_supported {
            Ok(TEST_GAS_PRICE)
        } else {
            Err(ClientError::transport("eth_gasPrice", "unsupported"))
        }
    }

    async fn max_priority_fee_per_gas(&self) -> Result<u128, ClientError> {
        self.record();
        if self.eip1559_supported {
            Ok(self.priority_fee)
        } else {
            Err(ClientError::transport("eth_maxPriorityFeePerGas", "method not found"))
        }
    }

    async fn latest_base_fee(&self) -> Result<Option<u128>, ClientError> {
        self.record();
        Ok(Some(TEST_BASE_FEE))
    }
}

/// Bundler returning fixed estimates and recording what it was asked
pub(crate) struct MockBundlerClient {
    pub estimate: GasEstimate,
    pub sponsorship: SponsorshipResult,
    pub last_op: Mutex<Option<UserOperation>>,
    pub calls: AtomicUsize,
}

impl MockBundlerClient {
    pub(crate) fn new() -> Self {
        Self {
            estimate: GasEstimate {
                pre_verification_gas: U256::from(50_000),
                verification_gas_limit: U256::from(400_000),
                call_gas_limit: U256::from(60_000),
            },
            sponsorship: SponsorshipResult {
                paymaster_and_data: Bytes::from_static(&[0xaa; 20]),
                pre_verification_gas: U256::from(55_000),
                verification_gas_limit: U256::from(450_000),
                call_gas_limit: U256::from(65_000),
            },
            last_op: Mutex::new(None),
            calls: AtomicUsize::new(0),
        }
    }

    pub(crate) fn call_count(&self) -> usize {
        self.calls.load(Ordering::Relaxed)
    }

    pub(crate) fn last_op(&self) -> Option<UserOperation> {
        self.last_op.lock().unwrap().clone()
    }

    fn record(&self, op: &UserOperation) {
        self.calls.fetch_add(1, Ordering::Relaxed);
        *self.last_op.lock().unwrap() = Some(op.clone());
    }
}

#[async_trait]
impl BundlerClient for MockBundlerClient {
    async fn estimate_user_operation_gas(
        &self,
        user_op: &UserOperation,
        _entry_point: Address,
    ) -> Result<GasEstimate, ClientError> {
        self.record(user_op);
        Ok(self.estimate.clone())
    }

    async fn sponsor_user_operation(
        &self,
        user_op: &UserOperation,
        _entry_point: Address,
        _context: &Value,
    ) -> Result<SponsorshipResult, ClientError> {
        self.record(user_op);
        Ok(self.sponsorship.clone())
    }

    async fn send_user_operation(
        &self,
        user_op: &UserOperation,
        _entry_point: Address,
    ) -> Result<B256, ClientError> {
        self.record(user_op);
        Ok(B256::repeat_byte(0x42))
    }
}
