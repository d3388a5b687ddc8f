//! Counterfactual multisig account.

use std::{fmt, sync::Arc};

use alloy_primitives::{Address, B256, Bytes, U256};
use alloy_signer::Signer;
use tracing::info;

use crate::builder::UserOperationBuilder;
use crate::client::{BundlerClient, ChainClient};
use crate::config::AccountConfig;
use crate::encoding::{CallIntent, encode_execute};
use crate::error::BuilderResult;
use crate::middleware::{
    EoaSignature, EstimateUserOperationGas, GasLimitStrategy, GasPrice, Middleware,
    MiddlewareContext, ResolveAccount, VerifyingPaymaster, placeholder_signature,
};
use crate::predictor::{Deployment, predict_account};
use crate::provider::RpcClient;
use crate::types::{UserOperation, UserOperationPartial};

/// A multisig account owned by a single key, deployed on first use.
///
/// Every builder handed out by the account carries the same pipeline:
/// [`ResolveAccount`], [`GasPrice`], the configured [`GasLimitStrategy`] and finally
/// [`EoaSignature`].
pub struct MultisigAccount {
    owner: Address,
    deployment: Deployment,
    bundler: Arc<dyn BundlerClient>,
    context: MiddlewareContext,
    gas_limits: GasLimitStrategy,
    template: UserOperationBuilder,
}

impl MultisigAccount {
    /// Connect to the configured endpoints and resolve the account.
    ///
    /// `paymaster` replaces gas estimation with a custom sponsorship step. When it is
    /// `None` and the config names a paymaster, a [`VerifyingPaymaster`] is used.
    pub async fn init(
        config: AccountConfig,
        paymaster: Option<Arc<dyn Middleware>>,
    ) -> BuilderResult<Self> {
        let client = Arc::new(RpcClient::new(config.rpc_url));

        let paymaster = paymaster.or_else(|| {
            config.paymaster.map(|pm| {
                let sponsor = VerifyingPaymaster::new(Arc::new(RpcClient::new(pm.url)), pm.context);
                Arc::new(sponsor) as Arc<dyn Middleware>
            })
        });

        Self::init_with(
            config.signer,
            client.clone(),
            client,
            config.entry_point,
            config.factory,
            paymaster,
        )
        .await
    }

    /// Resolve the account through the given clients
    pub async fn init_with<S>(
        signer: S,
        chain: Arc<dyn ChainClient>,
        bundler: Arc<dyn BundlerClient>,
        entry_point: Address,
        factory: Address,
        paymaster: Option<Arc<dyn Middleware>>,
    ) -> BuilderResult<Self>
    where
        S: Signer + Send + Sync + 'static,
    {
        let owner = signer.address();
        let chain_id = chain.chain_id().await?;
        let deployment = predict_account(chain.as_ref(), entry_point, factory, owner).await?;
        let placeholder = placeholder_signature(&signer).await?;

        let context = MiddlewareContext::new(entry_point, chain_id);
        let gas_limits = match paymaster {
            Some(sponsor) => GasLimitStrategy::Sponsor(sponsor),
            None => GasLimitStrategy::Estimate(Arc::new(EstimateUserOperationGas::new(
                bundler.clone(),
            ))),
        };

        let mut template = UserOperationBuilder::new(context);
        template.use_defaults(UserOperationPartial {
            sender: Some(deployment.sender),
            signature: Some(placeholder),
            ..Default::default()
        });
        template
            .use_middleware(Arc::new(ResolveAccount::new(
                chain.clone(),
                deployment.init_code.clone(),
            )))?
            .use_middleware(Arc::new(GasPrice::new(chain)))?
            .use_middleware(gas_limits.clone().into_middleware())?
            .use_middleware(Arc::new(EoaSignature::new(signer)))?;

        info!(
            target: "account-builder",
            sender = %deployment.sender,
            owner = %owner,
            chain_id,
            sponsored = gas_limits.is_sponsored(),
            "Initialized multisig account"
        );

        Ok(Self { owner, deployment, bundler, context, gas_limits, template })
    }

    /// Address of the account
    pub const fn sender(&self) -> Address {
        self.deployment.sender
    }

    /// Address of the owner key
    pub const fn owner(&self) -> Address {
        self.owner
    }

    /// Deployment code attached while the account is not deployed
    pub const fn init_code(&self) -> &Bytes {
        &self.deployment.init_code
    }

    /// Factory, owner and salt the account is deployed with
    pub const fn deployment(&self) -> &Deployment {
        &self.deployment
    }

    /// Entry point and chain every operation targets
    pub const fn context(&self) -> &MiddlewareContext {
        &self.context
    }

    /// How gas limits are resolved
    pub const fn gas_limits(&self) -> &GasLimitStrategy {
        &self.gas_limits
    }

    /// A fresh builder with the account defaults and pipeline
    pub fn builder(&self) -> UserOperationBuilder {
        self.template.clone()
    }

    /// A fresh builder executing `intent`.
    ///
    /// Invalid intents are rejected without any network call.
    pub fn prepare(&self, intent: CallIntent) -> BuilderResult<UserOperationBuilder> {
        let call_data = intent.encode()?;
        let mut builder = self.builder();
        builder.set_call_data(call_data);
        Ok(builder)
    }

    /// A fresh builder calling `to` with `value` and `data`
    pub fn execute(&self, to: Address, value: U256, data: Bytes) -> UserOperationBuilder {
        let mut builder = self.builder();
        builder.set_call_data(encode_execute(to, value, data));
        builder
    }

    /// A fresh builder calling every target in order, without value
    pub fn execute_batch(
        &self,
        to: Vec<Address>,
        data: Vec<Bytes>,
    ) -> BuilderResult<UserOperationBuilder> {
        self.prepare(CallIntent::Batch { to, data })
    }

    /// Submit a built operation, returning the hash reported by the bundler
    pub async fn send_user_operation(&self, op: &UserOperation) -> BuilderResult<B256> {
        let hash = self.bundler.send_user_operation(op, self.context.entry_point).await?;

        info!(
            target: "account-builder",
            sender = %op.sender,
            nonce = %op.nonce,
            user_op_hash = %hash,
            "Submitted user operation"
        );

        Ok(hash)
    }
}

impl fmt::Debug for MultisigAccount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MultisigAccount")
            .field("owner", &self.owner)
            .field("deployment", &self.deployment)
            .field("context", &self.context)
            .field("gas_limits", &self.gas_limits)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use alloy_primitives::{Signature, address, bytes};
    use alloy_signer_local::PrivateKeySigner;
    use serde_json::json;

    use super::*;
    use crate::contracts::ENTRYPOINT_V06_ADDRESS;
    use crate::error::{BuilderError, ValidationError};
    use crate::predictor::encode_init_code;
    use crate::test_utils::{MockBundlerClient, MockChainClient};

    const PREDICTED: Address = address!("abcdabcdabcdabcdabcdabcdabcdabcdabcdabcd");
    const FACTORY: Address = address!("9406Cc6185a346906296840746125a0E44976454");
    const TEST_KEY: &str = "ac0974bec39a17e36ba4a6b4d238ff944bacb478cbed5efcae784d7bf4f2ff80";

    async fn account(
        nonce: u64,
        paymaster: Option<Arc<dyn Middleware>>,
    ) -> (MultisigAccount, Arc<MockChainClient>, Arc<MockBundlerClient>) {
        let chain = Arc::new(MockChainClient::new(PREDICTED, nonce));
        let bundler = Arc::new(MockBundlerClient::new());
        let account = MultisigAccount::init_with(
            TEST_KEY.parse::<PrivateKeySigner>().unwrap(),
            chain.clone(),
            bundler.clone(),
            ENTRYPOINT_V06_ADDRESS,
            FACTORY,
            paymaster,
        )
        .await
        .unwrap();
        (account, chain, bundler)
    }

    fn transfer(account: &MultisigAccount) -> UserOperationBuilder {
        account.execute(Address::repeat_byte(0x11), U256::ZERO, Bytes::new())
    }

    #[tokio::test]
    async fn test_init_resolves_account() {
        let (account, _, _) = account(0, None).await;

        assert_eq!(account.sender(), PREDICTED);
        assert_eq!(account.init_code(), &encode_init_code(FACTORY, account.owner(), U256::ZERO));
        assert_eq!(account.context().chain_id, 1337);
        assert!(!account.gas_limits().is_sponsored());

        let builder = account.builder();
        assert_eq!(builder.sender(), &PREDICTED);
        assert_eq!(builder.signature().len(), 65);
        assert_eq!(
            builder.middleware_names(),
            vec!["resolve_account", "gas_price", "estimate_user_operation_gas", "eoa_signature"]
        );
    }

    #[tokio::test]
    async fn test_built_operation_is_signed_by_owner() {
        let (account, _, _) = account(0, None).await;

        let op = transfer(&account).build().await.unwrap();

        assert_eq!(op.nonce, U256::ZERO);
        assert_eq!(&op.init_code, account.init_code());
        let signature = Signature::try_from(op.signature.as_ref()).unwrap();
        let hash = account.context().user_op_hash(&op);
        assert_eq!(signature.recover_address_from_msg(hash.as_slice()).unwrap(), account.owner());
    }

    #[tokio::test]
    async fn test_estimator_sees_resolved_nonce_and_fees() {
        let (account, _, bundler) = account(0, None).await;

        let op = transfer(&account).build().await.unwrap();

        let estimated = bundler.last_op().unwrap();
        assert_eq!(bundler.call_count(), 1);
        assert_eq!(&estimated.init_code, account.init_code());
        assert!(!estimated.init_code.is_empty());
        assert!(!estimated.max_fee_per_gas.is_zero());
        assert!(!estimated.max_priority_fee_per_gas.is_zero());
        assert_eq!(estimated.max_fee_per_gas, op.max_fee_per_gas);
        assert_eq!(estimated.signature.len(), 65);
        assert_ne!(estimated.signature, op.signature);
    }

    #[tokio::test]
    async fn test_deployed_account_omits_init_code() {
        let (account, _, _) = account(7, None).await;

        let op = transfer(&account).build().await.unwrap();

        assert_eq!(op.nonce, U256::from(7));
        assert!(op.init_code.is_empty());
    }

    #[tokio::test]
    async fn test_batch_length_mismatch_makes_no_network_calls() {
        let (account, chain, bundler) = account(0, None).await;
        let chain_calls = chain.call_count();

        let err = account
            .execute_batch(
                vec![Address::repeat_byte(0x11), Address::repeat_byte(0x22)],
                vec![bytes!("01")],
            )
            .unwrap_err();

        assert!(matches!(
            err,
            BuilderError::Validation(ValidationError::BatchLengthMismatch { targets: 2, calls: 1 })
        ));
        assert_eq!(chain.call_count(), chain_calls);
        assert_eq!(bundler.call_count(), 0);
    }

    #[tokio::test]
    async fn test_cloned_builder_builds_identical_operations() {
        let (account, _, _) = account(0, None).await;
        let builder = account
            .execute_batch(vec![Address::repeat_byte(0x11)], vec![bytes!("deadbeef")])
            .unwrap();

        let first = builder.clone().build().await.unwrap();
        let second = builder.build().await.unwrap();

        assert_eq!(first, second);
    }

    #[tokio::test]
    async fn test_sponsorship_replaces_estimation() {
        let paymaster_client = Arc::new(MockBundlerClient::new());
        let sponsor: Arc<dyn Middleware> =
            Arc::new(VerifyingPaymaster::new(paymaster_client.clone(), json!({})));
        let (account, _, bundler) = account(0, Some(sponsor)).await;

        let op = transfer(&account).build().await.unwrap();

        assert!(account.gas_limits().is_sponsored());
        assert_eq!(op.paymaster_and_data, Bytes::from_static(&[0xaa; 20]));
        assert_eq!(op.call_gas_limit, U256::from(65_000));
        assert_eq!(paymaster_client.call_count(), 1);
        assert_eq!(bundler.call_count(), 0);
    }

    #[tokio::test]
    async fn test_send_user_operation_returns_bundler_hash() {
        let (account, _, bundler) = account(0, None).await;
        let op = transfer(&account).build().await.unwrap();

        let hash = account.send_user_operation(&op).await.unwrap();

        assert_eq!(hash, B256::repeat_byte(0x42));
        assert_eq!(bundler.last_op().unwrap(), op);
    }
}
