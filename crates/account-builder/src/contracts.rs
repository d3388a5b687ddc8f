//! Contract interfaces used while building user operations.
//!
//! Only the selectors the builder needs are declared: the v0.6 `EntryPoint` nonce and
//! counterfactual address lookups, the multisig account factory, and the account's
//! execution entry points.

use alloy_primitives::{Address, address};
use alloy_sol_types::sol;

/// Canonical address of the ERC-4337 v0.6 `EntryPoint` contract.
pub const ENTRYPOINT_V06_ADDRESS: Address = address!("5FF137D4b0FDCD49DcA30c7CF57E578a026d2789");

sol! {
    /// Revert used by `getSenderAddress` to report the counterfactual sender.
    #[derive(Debug, PartialEq, Eq)]
    error SenderAddressResult(address sender);

    /// EntryPoint v0.6 interface, reduced to the calls made by the builder.
    interface IEntryPoint {
        /// Next nonce for `sender` in the sequence identified by `key`.
        function getNonce(address sender, uint192 key) external view returns (uint256 nonce);

        /// Always reverts with `SenderAddressResult`.
        function getSenderAddress(bytes calldata initCode) external;
    }

    /// Deterministic deployer for multisig accounts.
    interface IMultisigAccountFactory {
        function createAccount(address owner, uint256 salt) external returns (address ret);
    }

    /// Execution surface of the multisig account.
    interface IMultisigAccount {
        function execute(address dest, uint256 value, bytes calldata func) external;

        function executeBatch(address[] calldata dest, bytes[] calldata func) external;
    }
}
