//! Deployment configuration for one governed entity.

use std::collections::HashSet;

use alloy_primitives::Address;
use serde::Deserialize;

use entity_gateway::{HttpGateway, TransportError};

/// Addresses and knobs for one entity's governance deployment.
#[derive(Debug, Clone, Deserialize)]
pub struct GovernanceConfig {
    /// The multisig governance contract.
    pub governance: Address,
    /// The member-manager contract serving the bootstrap membership blob.
    pub member_manager: Address,
    /// The governed entity record.
    pub entity: Address,
    /// Resolver contracts whose records live in the off-chain database;
    /// executing against these routes through the write gateway.
    #[serde(default)]
    pub offchain_resolvers: HashSet<Address>,
    /// Optional gateway host override (deployment escape hatch); takes
    /// precedence over the URL carried in redirect reverts.
    #[serde(default)]
    pub gateway_base_override: Option<String>,
}

impl GovernanceConfig {
    pub fn is_offchain_target(&self, target: Address) -> bool {
        self.offchain_resolvers.contains(&target)
    }

    /// Builds the HTTP transport for this deployment, honoring the
    /// configured override.
    pub fn transport(&self) -> Result<HttpGateway, TransportError> {
        match &self.gateway_base_override {
            Some(base) => HttpGateway::with_base_override(base),
            None => Ok(HttpGateway::new()),
        }
    }
}
