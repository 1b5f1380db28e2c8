//! The structured revert a resolver raises when a record lives in the
//! off-chain database, and the typed-data message derived from it.

use std::borrow::Cow;

use alloy_primitives::B256;
use alloy_sol_types::{Eip712Domain, SolError, SolStruct, sol};

sol! {
    /// EIP-712 domain fields carried inside the redirect revert.
    #[derive(Debug, PartialEq, serde::Serialize)]
    struct DomainData {
        string name;
        string version;
        uint256 chainId;
        address verifyingContract;
    }

    /// The message the caller must sign and submit to the gateway.
    #[derive(Debug, PartialEq, serde::Serialize)]
    struct MessageData {
        bytes data;
        address sender;
        uint256 expirationTimestamp;
    }

    /// Raised by a resolver in place of performing the write directly.
    #[derive(Debug, PartialEq)]
    error StorageHandledByOffChainDatabase(DomainData domain, string url, MessageData message);
}

/// A decoded off-chain redirect: where to post, what to sign.
///
/// Constructed transiently from a simulation revert and consumed exactly
/// once; the gateway server enforces single use and expiry.
#[derive(Debug)]
pub struct OffchainWriteRequest {
    pub domain: DomainData,
    pub url: String,
    pub message: MessageData,
}

impl OffchainWriteRequest {
    /// Decodes revert data into a redirect, or `None` when the revert is not
    /// the recognized signal (any other revert must propagate to the caller).
    pub fn from_revert(data: &[u8]) -> Option<Self> {
        if data.len() < 4 || data[..4] != StorageHandledByOffChainDatabase::SELECTOR {
            return None;
        }
        let decoded = StorageHandledByOffChainDatabase::abi_decode(data).ok()?;
        Some(Self {
            domain: decoded.domain,
            url: decoded.url,
            message: decoded.message,
        })
    }

    /// The EIP-712 domain under which [`Self::signing_hash`] is computed.
    pub fn eip712_domain(&self) -> Eip712Domain {
        Eip712Domain::new(
            Some(Cow::Owned(self.domain.name.clone())),
            Some(Cow::Owned(self.domain.version.clone())),
            Some(self.domain.chainId),
            Some(self.domain.verifyingContract),
            None,
        )
    }

    /// Typed-data hash of the message under the revert-supplied domain.
    pub fn signing_hash(&self) -> B256 {
        self.message.eip712_signing_hash(&self.eip712_domain())
    }
}
