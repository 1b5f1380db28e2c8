//! Injected chain access.
//!
//! Every operation in this workspace takes an explicit [`ChainClient`] rather
//! than picking up an ambient provider, so the protocol logic runs unchanged
//! against a live RPC provider or an in-memory test double.

use alloy_primitives::{Address, B256, Bytes};
use alloy_sol_types::{Revert, SolError};
use async_trait::async_trait;

use crate::error::CallError;

/// Hash of a submitted transaction.
pub type TxHash = B256;

/// Read and write access to one chain on behalf of one account.
#[async_trait]
pub trait ChainClient: Send + Sync {
    /// Executes a read-only call (`eth_call`) against current state.
    ///
    /// Reverts surface as [`CallError::Revert`] with the raw revert data.
    async fn call(&self, to: Address, data: Bytes) -> Result<Bytes, CallError>;

    /// Signs and submits a transaction through the account's wallet.
    ///
    /// A declined wallet prompt surfaces as [`CallError::Rejected`].
    async fn send_transaction(&self, to: Address, data: Bytes) -> Result<TxHash, CallError>;

    /// Returns the deployed bytecode at `address` (empty if undeployed).
    async fn code_at(&self, address: Address) -> Result<Bytes, CallError>;

    /// The account this client acts for.
    fn sender(&self) -> Address;
}

/// Extracts a human-readable reason from standard `Error(string)` revert
/// data, if present.
pub fn revert_reason(data: &[u8]) -> Option<String> {
    Revert::abi_decode(data).ok().map(|r| r.reason)
}
