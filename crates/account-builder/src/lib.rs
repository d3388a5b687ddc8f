#![doc = include_str!("../README.md")]
#![doc(issue_tracker_base_url = "https://github.com/base/base/issues/")]
#![cfg_attr(docsrs, feature(doc_cfg, doc_auto_cfg))]
#![cfg_attr(not(test), warn(unused_crate_dependencies))]

mod account;
mod builder;
pub mod client;
mod config;
pub mod contracts;
pub mod encoding;
mod error;
pub mod middleware;
pub mod predictor;
mod provider;
pub mod types;

#[cfg(test)]
mod test_utils;

pub use account::MultisigAccount;
pub use builder::UserOperationBuilder;
pub use client::{BundlerClient, ChainClient, SimulationCallResult};
pub use config::{AccountArgs, AccountConfig, ConfigError, PaymasterConfig};
pub use contracts::ENTRYPOINT_V06_ADDRESS;
pub use encoding::{CallIntent, encode_execute, encode_execute_batch};
pub use error::{
    AddressLookupFailure, BuilderError, BuilderResult, ClientError, MiddlewareError,
    ValidationError,
};
pub use middleware::{GasLimitStrategy, Middleware, MiddlewareContext};
pub use predictor::{Deployment, SenderAddressOutcome, predict_account};
pub use provider::RpcClient;
pub use types::{GasEstimate, SponsorshipResult, UserOperation, UserOperationPartial};
