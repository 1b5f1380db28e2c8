//! The write-resolution client: simulate, recognize the off-chain redirect,
//! sign and post to the gateway, optionally finalize on-chain.

use alloy_primitives::{Address, Bytes};
use alloy_sol_types::SolValue;
use async_trait::async_trait;
use serde::Serialize;
use tracing::{debug, info, warn};

use alloy_sol_types::SolError;

use crate::chain::{ChainClient, TxHash, revert_reason};
use crate::error::{CallError, SignerError, TransportError, WriteError};
use crate::offchain::{DomainData, MessageData, OffchainWriteRequest, StorageHandledByOffChainDatabase};
use crate::signer::TypedDataSigner;

/// A fully-encoded contract write to attempt.
#[derive(Debug, Clone)]
pub struct WriteRequest {
    pub to: Address,
    pub data: Bytes,
}

/// Optional on-chain finalization once the gateway has accepted the write.
///
/// `encode_call` receives `(response_bytes, proof)` and returns the complete
/// calldata for the callback target, so any callback ABI can append the two
/// trailing arguments its signature expects.
pub struct CallbackRequest {
    pub to: Address,
    pub encode_call: Box<dyn Fn(&Bytes, &Bytes) -> Bytes + Send + Sync>,
}

/// Result of [`execute_write`].
#[derive(Debug, Clone, PartialEq)]
pub enum WriteOutcome {
    /// A transaction was submitted (direct write, or gateway + callback).
    Submitted(TxHash),
    /// The gateway's proof bytes, for the caller to inspect or relay.
    ///
    /// Empty when the gateway answered non-200: that path soft-fails, so
    /// callers must check [`WriteOutcome::is_empty_proof`].
    Proof(Bytes),
}

impl WriteOutcome {
    pub fn is_empty_proof(&self) -> bool {
        matches!(self, WriteOutcome::Proof(b) if b.is_empty())
    }
}

/// JSON body posted to the gateway.
#[derive(Debug, Serialize)]
pub struct GatewayRequestBody {
    pub data: String,
    pub signature: SignaturePayload,
    pub sender: Address,
}

#[derive(Debug, Serialize)]
pub struct SignaturePayload {
    pub message: MessageData,
    pub domain: DomainData,
    pub signature: String,
}

/// Raw gateway answer; anything but status 200 is a failure.
#[derive(Debug, Clone)]
pub struct GatewayResponse {
    pub status: u16,
    pub body: String,
}

/// Transport underneath the gateway POST, injected for testability.
#[async_trait]
pub trait GatewayTransport: Send + Sync {
    async fn post(
        &self,
        url: &str,
        body: &GatewayRequestBody,
    ) -> Result<GatewayResponse, TransportError>;
}

/// Production transport over reqwest.
///
/// An optional base override rewrites the scheme/host/port of the
/// revert-supplied URL while keeping its path and query, as a deployment
/// escape hatch for gateways reachable under a different host.
pub struct HttpGateway {
    client: reqwest::Client,
    base_override: Option<reqwest::Url>,
}

impl HttpGateway {
    pub fn new() -> Self {
        Self {
            client: reqwest::Client::new(),
            base_override: None,
        }
    }

    pub fn with_base_override(base: &str) -> Result<Self, TransportError> {
        let base = reqwest::Url::parse(base)
            .map_err(|e| TransportError::InvalidUrl(format!("{base}: {e}")))?;
        Ok(Self {
            client: reqwest::Client::new(),
            base_override: Some(base),
        })
    }

    fn resolve_url(&self, url: &str) -> Result<reqwest::Url, TransportError> {
        let parsed =
            reqwest::Url::parse(url).map_err(|e| TransportError::InvalidUrl(format!("{url}: {e}")))?;
        match &self.base_override {
            None => Ok(parsed),
            Some(base) => {
                let mut resolved = base.clone();
                resolved.set_path(parsed.path());
                resolved.set_query(parsed.query());
                Ok(resolved)
            }
        }
    }
}

impl Default for HttpGateway {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl GatewayTransport for HttpGateway {
    async fn post(
        &self,
        url: &str,
        body: &GatewayRequestBody,
    ) -> Result<GatewayResponse, TransportError> {
        let url = self.resolve_url(url)?;
        debug!(%url, "posting signed write to gateway");
        let response = self
            .client
            .post(url)
            .json(body)
            .send()
            .await
            .map_err(|e| TransportError::Http(e.to_string()))?;
        let status = response.status().as_u16();
        let body = response
            .text()
            .await
            .map_err(|e| TransportError::Http(e.to_string()))?;
        Ok(GatewayResponse { status, body })
    }
}

/// Executes a contract write, redirecting through the off-chain gateway when
/// the target signals that the record lives in the off-chain database.
///
/// The flow, in order:
/// 1. simulate the write; a clean simulation means a plain on-chain write,
///    which is submitted as-is;
/// 2. a `StorageHandledByOffChainDatabase` revert is decoded into an
///    [`OffchainWriteRequest`]; any other failure propagates as
///    [`WriteError::Simulation`] without touching the network;
/// 3. the message is signed as EIP-712 typed data and posted to the
///    revert-supplied URL;
/// 4. on HTTP 200 the response bytes are returned directly, or, when a
///    `callback` is given, relayed on-chain together with the proof
///    `abi_encode_params(message.data, signer_address)`;
/// 5. any other HTTP status yields an empty proof sentinel, never an error.
pub async fn execute_write(
    chain: &dyn ChainClient,
    signer: &dyn TypedDataSigner,
    transport: &dyn GatewayTransport,
    request: WriteRequest,
    callback: Option<CallbackRequest>,
) -> Result<WriteOutcome, WriteError> {
    let redirect = match chain.call(request.to, request.data.clone()).await {
        Ok(_) => {
            debug!(to = %request.to, "simulation clean, submitting direct write");
            let hash = chain
                .send_transaction(request.to, request.data)
                .await
                .map_err(submission_error)?;
            return Ok(WriteOutcome::Submitted(hash));
        }
        Err(CallError::Revert(data)) => match OffchainWriteRequest::from_revert(&data) {
            Some(redirect) => redirect,
            None if data.len() >= 4
                && data[..4] == StorageHandledByOffChainDatabase::SELECTOR =>
            {
                return Err(WriteError::BadRedirect(format!("0x{}", hex::encode(&data))));
            }
            None => {
                return Err(WriteError::Simulation(
                    revert_reason(&data).unwrap_or_else(|| format!("0x{}", hex::encode(&data))),
                ));
            }
        },
        Err(CallError::Rejected) => return Err(WriteError::SignatureRejected),
        Err(CallError::Transport(e)) => return Err(WriteError::Simulation(e)),
    };

    info!(url = %redirect.url, sender = %redirect.message.sender, "write redirected off-chain");

    let signature = signer.sign_write(&redirect).await.map_err(|e| match e {
        SignerError::Rejected => WriteError::SignatureRejected,
        SignerError::Other(m) => WriteError::Signer(m),
    })?;

    let body = GatewayRequestBody {
        data: format!("0x{}", hex::encode(&redirect.message.data)),
        signature: SignaturePayload {
            message: redirect.message.clone(),
            domain: redirect.domain.clone(),
            signature: format!("0x{}", hex::encode(signature.as_bytes())),
        },
        sender: redirect.message.sender,
    };

    let response = transport
        .post(&redirect.url, &body)
        .await
        .map_err(|e| WriteError::Transport(e.to_string()))?;

    if response.status != 200 {
        warn!(status = response.status, "gateway refused write, returning empty proof");
        return Ok(WriteOutcome::Proof(Bytes::new()));
    }

    let response_bytes = body_bytes(&response.body);

    match callback {
        None => Ok(WriteOutcome::Proof(response_bytes)),
        Some(cb) => {
            let proof: Bytes = (redirect.message.data.clone(), signer.address())
                .abi_encode_params()
                .into();
            let calldata = (cb.encode_call)(&response_bytes, &proof);
            let hash = chain
                .send_transaction(cb.to, calldata)
                .await
                .map_err(submission_error)?;
            Ok(WriteOutcome::Submitted(hash))
        }
    }
}

fn submission_error(e: CallError) -> WriteError {
    match e {
        CallError::Rejected => WriteError::SignatureRejected,
        CallError::Revert(data) => WriteError::CallbackRevert(
            revert_reason(&data).unwrap_or_else(|| format!("0x{}", hex::encode(&data))),
        ),
        CallError::Transport(m) => WriteError::Transport(m),
    }
}

/// Interprets a gateway response body as proof bytes: 0x-hex when it parses
/// as such, raw text bytes otherwise.
fn body_bytes(body: &str) -> Bytes {
    let trimmed = body.trim();
    if let Some(stripped) = trimmed.strip_prefix("0x")
        && let Ok(raw) = hex::decode(stripped)
    {
        return Bytes::from(raw);
    }
    Bytes::from(trimmed.as_bytes().to_vec())
}
