//! Counterfactual address prediction.
//!
//! A multisig account is created lazily by the first user operation that carries its
//! `initCode`. Before that, the account address is learned from the entry point's
//! `getSenderAddress(initCode)`, which by protocol never returns: it reverts with
//! `SenderAddressResult(sender)`. A revert carrying that payload is the success case.

use alloy_primitives::{Address, Bytes, U256};
use alloy_sol_types::{SolCall, SolError};
use tracing::{debug, warn};

use crate::client::{ChainClient, SimulationCallResult};
use crate::contracts::{IEntryPoint, IMultisigAccountFactory, SenderAddressResult};
use crate::error::{AddressLookupFailure, BuilderResult, ClientError};

/// Outcome of a `getSenderAddress` simulation
#[derive(Debug)]
pub enum SenderAddressOutcome {
    /// The entry point reported the counterfactual sender
    Predicted(Address),
    /// No address could be extracted
    Failed(AddressLookupFailure),
}

impl SenderAddressOutcome {
    /// Classify the raw `eth_call` result of `getSenderAddress`
    pub fn from_call_result(result: Result<SimulationCallResult, ClientError>) -> Self {
        match result {
            Ok(SimulationCallResult::Revert(data)) => match SenderAddressResult::abi_decode(&data) {
                Ok(decoded) => Self::Predicted(decoded.sender),
                Err(_) => Self::Failed(AddressLookupFailure::UnrecognizedRevert(data)),
            },
            Ok(SimulationCallResult::Success(data)) => {
                Self::Failed(AddressLookupFailure::ReturnedNormally(data))
            }
            Err(e) => Self::Failed(AddressLookupFailure::Client(e)),
        }
    }

    /// Returns the predicted address, or the failure as a builder error
    pub fn into_result(self) -> BuilderResult<Address> {
        match self {
            Self::Predicted(address) => Ok(address),
            Self::Failed(failure) => Err(failure.into()),
        }
    }
}

/// Everything needed to deploy the account on first use
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Deployment {
    /// Factory deploying the account
    pub factory: Address,
    /// Owner passed to `createAccount`
    pub owner: Address,
    /// Salt passed to `createAccount`
    pub salt: U256,
    /// `factory ++ createAccount(owner, salt)`
    pub init_code: Bytes,
    /// Address the account will be deployed at
    pub sender: Address,
}

/// Build the `initCode` deploying an account for `owner` through `factory`
pub fn encode_init_code(factory: Address, owner: Address, salt: U256) -> Bytes {
    let call = IMultisigAccountFactory::createAccountCall { owner, salt };
    let calldata = call.abi_encode();

    let mut init_code = Vec::with_capacity(20 + calldata.len());
    init_code.extend_from_slice(factory.as_slice());
    init_code.extend_from_slice(&calldata);
    Bytes::from(init_code)
}

/// Simulate `getSenderAddress(init_code)` on `entry_point`
pub async fn simulate_sender_address<C>(
    client: &C,
    entry_point: Address,
    init_code: Bytes,
) -> SenderAddressOutcome
where
    C: ChainClient + ?Sized,
{
    let call = IEntryPoint::getSenderAddressCall { initCode: init_code };
    let result = client.eth_call(entry_point, Bytes::from(call.abi_encode())).await;
    SenderAddressOutcome::from_call_result(result)
}

/// Compute the deployment descriptor and counterfactual address of an account
pub async fn predict_account<C>(
    client: &C,
    entry_point: Address,
    factory: Address,
    owner: Address,
) -> BuilderResult<Deployment>
where
    C: ChainClient + ?Sized,
{
    let salt = U256::ZERO;
    let init_code = encode_init_code(factory, owner, salt);

    let outcome = simulate_sender_address(client, entry_point, init_code.clone()).await;
    if let SenderAddressOutcome::Failed(failure) = &outcome {
        warn!(
            target: "account-builder",
            factory = %factory,
            owner = %owner,
            error = %failure,
            "Could not resolve counterfactual sender"
        );
    }
    let sender = outcome.into_result()?;

    debug!(
        target: "account-builder",
        factory = %factory,
        owner = %owner,
        sender = %sender,
        "Resolved counterfactual sender"
    );

    Ok(Deployment { factory, owner, salt, init_code, sender })
}
