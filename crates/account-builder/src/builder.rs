//! User operation builder.

use std::{fmt, sync::Arc};

use alloy_primitives::{Address, Bytes, U256};
use tracing::debug;

use crate::error::{BuilderError, BuilderResult, ValidationError};
use crate::middleware::{Middleware, MiddlewareContext};
use crate::types::{UserOperation, UserOperationPartial};

macro_rules! field_accessors {
    ($($field:ident, $setter:ident: $ty:ty;)*) => {
        $(
            #[doc = concat!("Current `", stringify!($field), "` of the operation")]
            pub fn $field(&self) -> &$ty {
                &self.current.$field
            }

            #[doc = concat!("Set `", stringify!($field), "`. The last write wins")]
            pub fn $setter(&mut self, value: $ty) -> &mut Self {
                self.current.$field = value;
                self
            }
        )*
    };
}

/// Accumulates user operation fields and the middleware resolving the rest.
///
/// Cloning a builder copies its fields and shares its middleware, so one configured
/// builder can be built any number of times.
#[derive(Clone)]
pub struct UserOperationBuilder {
    defaults: UserOperation,
    current: UserOperation,
    middleware: Vec<Arc<dyn Middleware>>,
    context: MiddlewareContext,
}

impl UserOperationBuilder {
    /// Create an empty builder for operations targeting `context`
    pub fn new(context: MiddlewareContext) -> Self {
        Self {
            defaults: UserOperation::default(),
            current: UserOperation::default(),
            middleware: Vec::new(),
            context,
        }
    }

    /// Context every step of [`Self::build`] will receive
    pub const fn context(&self) -> &MiddlewareContext {
        &self.context
    }

    /// Merge `partial` into the defaults and into the current operation
    pub fn use_defaults(&mut self, partial: UserOperationPartial) -> &mut Self {
        self.defaults.apply(partial.clone());
        self.current.apply(partial);
        self
    }

    /// Restore the current operation to the defaults
    pub fn reset_op(&mut self) -> &mut Self {
        self.current = self.defaults.clone();
        self
    }

    /// Append a step to the pipeline.
    ///
    /// Fails if a terminal step is already registered.
    pub fn use_middleware(&mut self, step: Arc<dyn Middleware>) -> BuilderResult<&mut Self> {
        if let Some(signer) = self.middleware.iter().find(|m| m.is_terminal()) {
            return Err(ValidationError::MiddlewareAfterSignature {
                step: step.name(),
                signer: signer.name(),
            }
            .into());
        }
        self.middleware.push(step);
        Ok(self)
    }

    /// Remove every registered step
    pub fn reset_middleware(&mut self) -> &mut Self {
        self.middleware.clear();
        self
    }

    /// Names of the registered steps, in execution order
    pub fn middleware_names(&self) -> Vec<&'static str> {
        self.middleware.iter().map(|m| m.name()).collect()
    }

    /// Snapshot of the operation as configured so far, before any middleware ran
    pub fn op(&self) -> &UserOperation {
        &self.current
    }

    field_accessors! {
        sender, set_sender: Address;
        nonce, set_nonce: U256;
        init_code, set_init_code: Bytes;
        call_data, set_call_data: Bytes;
        call_gas_limit, set_call_gas_limit: U256;
        verification_gas_limit, set_verification_gas_limit: U256;
        pre_verification_gas, set_pre_verification_gas: U256;
        max_fee_per_gas, set_max_fee_per_gas: U256;
        max_priority_fee_per_gas, set_max_priority_fee_per_gas: U256;
        paymaster_and_data, set_paymaster_and_data: Bytes;
        signature, set_signature: Bytes;
    }

    /// Run every step in registration order and return the finished operation.
    ///
    /// The first failing step aborts the build.
    pub async fn build(self) -> BuilderResult<UserOperation> {
        let Self { mut current, middleware, context, .. } = self;

        for step in &middleware {
            debug!(target: "account-builder", step = step.name(), "Running middleware");
            step.process(&mut current, &context)
                .await
                .map_err(|e| BuilderError::middleware(step.name(), e))?;
        }

        debug!(
            target: "account-builder",
            sender = %current.sender,
            nonce = %current.nonce,
            user_op_hash = %context.user_op_hash(&current),
            "Built user operation"
        );

        Ok(current)
    }
}

impl fmt::Debug for UserOperationBuilder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("UserOperationBuilder")
            .field("current", &self.current)
            .field("middleware", &self.middleware_names())
            .field("context", &self.context)
            .finish()
    }
}
