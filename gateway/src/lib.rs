//! Client-side protocol for entity resolver contracts that keep record data
//! in an off-chain database behind a signed HTTP gateway.
//!
//! A write against such a resolver is first simulated; when the contract
//! signals the off-chain redirect through a structured revert, the client
//! signs the revert-supplied message as EIP-712 typed data, posts it to the
//! gateway, and optionally finalizes on-chain with the returned proof bytes.
//!
//! All chain, wallet and HTTP access goes through the injected traits in
//! [`chain`], [`signer`] and [`client`], so the protocol is testable without
//! a live provider.

pub mod chain;
pub mod client;
pub mod error;
pub mod offchain;
pub mod signer;

pub use chain::{ChainClient, TxHash, revert_reason};
pub use client::{
    CallbackRequest, GatewayRequestBody, GatewayResponse, GatewayTransport, HttpGateway,
    SignaturePayload, WriteOutcome, WriteRequest, execute_write,
};
pub use error::{CallError, SignerError, TransportError, WriteError};
pub use offchain::{DomainData, MessageData, OffchainWriteRequest};
pub use signer::TypedDataSigner;
