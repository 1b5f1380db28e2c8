//! Governance client for entity records: browse and mutate multisig-governed
//! profiles whose data lives partly on-chain and partly in an off-chain
//! database behind a signed gateway.
//!
//! The crate is organized leaves-first:
//!
//! - [`actions`]: pure decoding of transaction payloads into
//!   human-readable audit records;
//! - [`roles`]: role resolution (bootstrap blob or batched on-chain
//!   lookups) and the per-account callable-method map;
//! - [`ledger`]: read-only projection of the multisig ledger;
//! - [`lifecycle`]: the propose → confirm → execute controller, routing
//!   off-chain-backed writes through [`entity_gateway`].

pub mod abi;
pub mod actions;
pub mod config;
pub mod error;
pub mod ledger;
pub mod lifecycle;
pub mod roles;

pub use actions::{ActionDecodeResult, ActionItem, ActionValue, Selector, decode};
pub use config::GovernanceConfig;
pub use error::GovernanceError;
pub use ledger::{LedgerReader, LedgerSnapshot, PendingTransaction, TxStatus};
pub use lifecycle::{ActionResult, LifecycleController, SessionState};
pub use roles::{
    CallableMethodMap, Member, Role, RoleResolver, RoleSet, resolve_callable_methods,
};
