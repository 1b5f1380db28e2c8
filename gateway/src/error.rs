use alloy_primitives::Bytes;
use thiserror::Error;

/// Failure of a read-only call or a submitted transaction.
#[derive(Debug, Clone, Error)]
pub enum CallError {
    /// The call reverted; the raw revert data is preserved so callers can
    /// recognize structured reverts such as the off-chain redirect signal.
    #[error("execution reverted")]
    Revert(Bytes),

    /// The user declined the wallet prompt for this call.
    #[error("signature request rejected by user")]
    Rejected,

    /// Provider/transport level failure.
    #[error("transport error: {0}")]
    Transport(String),
}

/// Failure while producing an EIP-712 signature.
#[derive(Debug, Clone, Error)]
pub enum SignerError {
    /// The user declined the typed-data prompt.
    #[error("signature request rejected by user")]
    Rejected,

    #[error("signer error: {0}")]
    Other(String),
}

/// Failure at the HTTP transport underneath the gateway client.
#[derive(Debug, Clone, Error)]
pub enum TransportError {
    #[error("invalid gateway url: {0}")]
    InvalidUrl(String),

    #[error("http error: {0}")]
    Http(String),
}

/// Failures of the write-redirect protocol itself.
///
/// A non-200 gateway response is deliberately *not* represented here: that
/// path soft-fails to an empty proof sentinel so callers check for emptiness
/// rather than catching an error.
#[derive(Debug, Error)]
pub enum WriteError {
    /// The pre-flight simulation failed for a reason other than the
    /// recognized off-chain redirect signal.
    #[error("simulation failed: {0}")]
    Simulation(String),

    /// The redirect revert carried data that does not decode as the expected
    /// domain/url/message tuple.
    #[error("malformed off-chain redirect: {0}")]
    BadRedirect(String),

    /// The user declined the typed-data prompt.
    #[error("signature request rejected by user")]
    SignatureRejected,

    /// Non-rejection signer failure.
    #[error("signer error: {0}")]
    Signer(String),

    /// The finalizing callback transaction reverted on-chain.
    #[error("callback transaction reverted: {0}")]
    CallbackRevert(String),

    #[error("gateway transport error: {0}")]
    Transport(String),
}
