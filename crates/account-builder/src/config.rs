//! Multisig account configuration
//!
//! Configuration is provided via CLI flags or the matching environment variables and
//! validated into an [`AccountConfig`] before any network call is made.
//!
//! The RPC endpoint must serve both the chain methods (`eth_call`, fee queries) and the
//! ERC-4337 bundler methods, as bundler endpoints usually proxy the former.

use alloy_primitives::Address;
use alloy_signer_local::PrivateKeySigner;
use serde_json::Value;
use thiserror::Error;
use url::Url;

use crate::contracts::ENTRYPOINT_V06_ADDRESS;

/// Errors that can occur when validating config
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Config validation failed: {0}")]
    ValidationError(String),

    #[error("Invalid URL '{url}': {reason}")]
    InvalidUrl { url: String, reason: String },
}

/// Multisig account CLI arguments
///
/// # Example usage:
///
/// ```bash
/// userop \
///     --account.signing-key $SIGNING_KEY \
///     --account.rpc-url https://bundler.example.org/rpc \
///     --account.factory 0x9406Cc6185a346906296840746125a0E44976454 \
///     --to 0x1111111111111111111111111111111111111111
/// ```
#[derive(Debug, Clone, PartialEq, Eq, clap::Args)]
#[command(next_help_heading = "Multisig Account")]
pub struct AccountArgs {
    /// Hex-encoded private key of the account owner
    #[arg(long = "account.signing-key", env = "ACCOUNT_SIGNING_KEY", hide_env_values = true)]
    pub signing_key: String,

    /// JSON-RPC endpoint serving chain and bundler methods
    #[arg(long = "account.rpc-url", env = "ACCOUNT_RPC_URL")]
    pub rpc_url: String,

    /// EntryPoint contract address
    #[arg(
        long = "account.entry-point",
        env = "ACCOUNT_ENTRY_POINT",
        default_value_t = ENTRYPOINT_V06_ADDRESS
    )]
    pub entry_point: Address,

    /// Factory deploying the multisig account
    #[arg(long = "account.factory", env = "ACCOUNT_FACTORY")]
    pub factory: Address,

    /// Verifying paymaster endpoint. Gas is self-funded when unset.
    #[arg(long = "account.paymaster-url", env = "ACCOUNT_PAYMASTER_URL")]
    pub paymaster_url: Option<String>,

    /// JSON context forwarded to `pm_sponsorUserOperation`
    #[arg(long = "account.paymaster-context", env = "ACCOUNT_PAYMASTER_CONTEXT")]
    pub paymaster_context: Option<String>,
}

/// Verifying paymaster settings
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PaymasterConfig {
    /// Paymaster JSON-RPC endpoint
    pub url: Url,
    /// Context passed along with every sponsorship request
    pub context: Value,
}

/// Validated account configuration
#[derive(Debug, Clone)]
pub struct AccountConfig {
    /// Owner key, used for the deployment call and the signature
    pub signer: PrivateKeySigner,
    /// Chain and bundler endpoint
    pub rpc_url: Url,
    /// EntryPoint contract address
    pub entry_point: Address,
    /// Factory deploying the account
    pub factory: Address,
    /// Paymaster sponsoring gas, if any
    pub paymaster: Option<PaymasterConfig>,
}

impl AccountArgs {
    /// Validate the configuration
    pub fn validate(&self) -> Result<AccountConfig, ConfigError> {
        let key = self.signing_key.trim();
        if key.is_empty() {
            return Err(ConfigError::ValidationError(
                "--account.signing-key cannot be empty".to_string(),
            ));
        }
        let signer = key.parse::<PrivateKeySigner>().map_err(|e| {
            ConfigError::ValidationError(format!("Invalid --account.signing-key: {e}"))
        })?;

        let rpc_url = parse_url(&self.rpc_url)?;

        if self.factory.is_zero() {
            return Err(ConfigError::ValidationError(
                "--account.factory cannot be the zero address".to_string(),
            ));
        }

        let paymaster = match &self.paymaster_url {
            Some(url) => Some(PaymasterConfig { url: parse_url(url)?, context: self.context()? }),
            None if self.paymaster_context.is_some() => {
                return Err(ConfigError::ValidationError(
                    "--account.paymaster-context requires --account.paymaster-url".to_string(),
                ));
            }
            None => None,
        };

        Ok(AccountConfig {
            signer,
            rpc_url,
            entry_point: self.entry_point,
            factory: self.factory,
            paymaster,
        })
    }

    fn context(&self) -> Result<Value, ConfigError> {
        match &self.paymaster_context {
            Some(raw) => serde_json::from_str(raw).map_err(|e| {
                ConfigError::ValidationError(format!("Invalid --account.paymaster-context: {e}"))
            }),
            None => Ok(Value::Object(Default::default())),
        }
    }
}

fn parse_url(url: &str) -> Result<Url, ConfigError> {
    if url.trim().is_empty() {
        return Err(ConfigError::ValidationError("URL cannot be empty".to_string()));
    }
    Url::parse(url)
        .map_err(|e| ConfigError::InvalidUrl { url: url.to_string(), reason: e.to_string() })
}

#[cfg(test)]
mod tests {
    use alloy_primitives::address;
    use serde_json::json;

    use super::*;

    const KEY: &str = "ac0974bec39a17e36ba4a6b4d238ff944bacb478cbed5efcae784d7bf4f2ff80";

    fn base_args() -> AccountArgs {
        AccountArgs {
            signing_key: KEY.to_string(),
            rpc_url: "http://localhost:8545".to_string(),
            entry_point: ENTRYPOINT_V06_ADDRESS,
            factory: address!("9406Cc6185a346906296840746125a0E44976454"),
            paymaster_url: None,
            paymaster_context: None,
        }
    }

    #[test]
    fn test_valid_config() {
        let config = base_args().validate().unwrap();

        assert_eq!(config.signer.address(), address!("f39Fd6e51aad88F6F4ce6aB8827279cffFb92266"));
        assert_eq!(config.rpc_url.as_str(), "http://localhost:8545/");
        assert_eq!(config.entry_point, ENTRYPOINT_V06_ADDRESS);
        assert!(config.paymaster.is_none());
    }

    #[test]
    fn test_empty_signing_key_fails() {
        let mut args = base_args();
        args.signing_key = "  ".to_string();

        assert!(matches!(args.validate(), Err(ConfigError::ValidationError(_))));
    }

    #[test]
    fn test_malformed_signing_key_fails() {
        let mut args = base_args();
        args.signing_key = "0xnothex".to_string();

        assert!(matches!(args.validate(), Err(ConfigError::ValidationError(_))));
    }

    #[test]
    fn test_invalid_url_fails() {
        let mut args = base_args();
        args.rpc_url = "not-a-valid-url".to_string();

        assert!(matches!(args.validate(), Err(ConfigError::InvalidUrl { .. })));
    }

    #[test]
    fn test_zero_factory_fails() {
        let mut args = base_args();
        args.factory = Address::ZERO;

        assert!(matches!(args.validate(), Err(ConfigError::ValidationError(_))));
    }

    #[test]
    fn test_paymaster_with_context() {
        let mut args = base_args();
        args.paymaster_url = Some("https://paymaster.example.org".to_string());
        args.paymaster_context = Some(r#"{"type":"payg"}"#.to_string());

        let paymaster = args.validate().unwrap().paymaster.unwrap();
        assert_eq!(paymaster.url.as_str(), "https://paymaster.example.org/");
        assert_eq!(paymaster.context, json!({ "type": "payg" }));
    }

    #[test]
    fn test_paymaster_context_defaults_to_empty_object() {
        let mut args = base_args();
        args.paymaster_url = Some("https://paymaster.example.org".to_string());

        let paymaster = args.validate().unwrap().paymaster.unwrap();
        assert_eq!(paymaster.context, json!({}));
    }

    #[test]
    fn test_context_without_paymaster_fails() {
        let mut args = base_args();
        args.paymaster_context = Some("{}".to_string());

        assert!(matches!(args.validate(), Err(ConfigError::ValidationError(_))));
    }

    #[test]
    fn test_malformed_context_fails() {
        let mut args = base_args();
        args.paymaster_url = Some("https://paymaster.example.org".to_string());
        args.paymaster_context = Some("{not json".to_string());

        assert!(matches!(args.validate(), Err(ConfigError::ValidationError(_))));
    }
}
