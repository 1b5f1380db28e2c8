//! Injected typed-data signing.

use alloy_primitives::{Address, Signature};
use async_trait::async_trait;

use crate::error::SignerError;
use crate::offchain::OffchainWriteRequest;

/// Signs gateway write messages as EIP-712 typed data.
///
/// Implementations bridge to a wallet prompt (browser/hardware) or to a local
/// key in tests; a declined prompt is [`SignerError::Rejected`].
#[async_trait]
pub trait TypedDataSigner: Send + Sync {
    /// The address whose key produces the signatures.
    fn address(&self) -> Address;

    /// Signs the redirect's message under its revert-supplied domain.
    async fn sign_write(&self, request: &OffchainWriteRequest) -> Result<Signature, SignerError>;
}
