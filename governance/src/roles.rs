//! Role resolution and per-method permission computation.
//!
//! Roles are a fixed, externally-defined enumeration identified by 32-byte
//! hashes; the client never invents new ones. Two resolution strategies
//! exist behind [`RoleResolver`]: decoding the member-manager's bootstrap
//! byte-blob before the entity has executed any governance transaction, and
//! batched on-chain lookups afterwards. Every failure path resolves to "no
//! roles" / "nothing callable"; permission checks fail closed, never open.

use std::collections::{HashMap, HashSet};
use std::sync::LazyLock;

use alloy_primitives::{Address, B256, Bytes, U256, keccak256};
use alloy_sol_types::{SolCall, SolValue};
use async_trait::async_trait;
use tracing::{debug, warn};

use entity_gateway::ChainClient;

use crate::abi::IEntityGovernance;
use crate::actions::Selector;
use crate::ledger::{LedgerSnapshot, PendingTransaction};

/// 32-byte hash identifying a named governance capability.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Role(pub B256);

impl Role {
    pub fn named(name: &str) -> Self {
        Role(keccak256(name.as_bytes()))
    }
}

pub static MANAGER: LazyLock<Role> = LazyLock::new(|| Role::named("manager"));
pub static SIGNER: LazyLock<Role> = LazyLock::new(|| Role::named("signer"));
pub static HOLDER: LazyLock<Role> = LazyLock::new(|| Role::named("holder"));

/// The fixed role enumeration.
pub fn known_roles() -> [Role; 3] {
    [*MANAGER, *SIGNER, *HOLDER]
}

pub type RoleSet = HashSet<Role>;

/// Which pending methods the account may currently confirm/execute.
/// Recomputed from authoritative sources whenever the ledger or role set
/// changes; never trusted across a mutating action without a refresh.
pub type CallableMethodMap = HashMap<Selector, bool>;

/// One row of the member-manager's bootstrap blob.
#[derive(Debug, Clone, PartialEq)]
pub struct Member {
    pub address: Address,
    pub shares: U256,
    pub roles: RoleSet,
}

/// Resolves the set of roles an account holds.
#[async_trait]
pub trait RoleResolver: Send + Sync {
    async fn resolve_roles(&self, chain: &dyn ChainClient, account: Address) -> RoleSet;
}

/// Picks the strategy for the ledger's current bootstrap state: the local
/// blob decode while nothing beyond genesis has executed, batched on-chain
/// lookups once real governance activity exists.
pub fn resolver_for(
    ledger: &LedgerSnapshot,
    member_manager: Address,
    governance: Address,
) -> Box<dyn RoleResolver> {
    if ledger.is_bootstrap() {
        Box::new(BootstrapRoles { member_manager })
    } else {
        Box::new(ChainRoles { governance })
    }
}

/// Bootstrap strategy: one `userDataBytes()` fetch, decoded locally.
pub struct BootstrapRoles {
    pub member_manager: Address,
}

#[async_trait]
impl RoleResolver for BootstrapRoles {
    async fn resolve_roles(&self, chain: &dyn ChainClient, account: Address) -> RoleSet {
        let call = IEntityGovernance::userDataBytesCall {}.abi_encode();
        let blob = match chain.call(self.member_manager, call.into()).await {
            Ok(ret) => match IEntityGovernance::userDataBytesCall::abi_decode_returns(&ret) {
                Ok(blob) => blob,
                Err(e) => {
                    warn!(error = %e, "member blob return did not decode, resolving no roles");
                    return RoleSet::new();
                }
            },
            Err(e) => {
                debug!(error = %e, "member blob fetch failed, resolving no roles");
                return RoleSet::new();
            }
        };

        decode_members(&blob)
            .into_iter()
            .find(|m| m.address == account)
            .map(|m| m.roles)
            .unwrap_or_default()
    }
}

/// Decodes the bootstrap blob: `(address, shares, role bytes)` rows.
pub fn decode_members(blob: &[u8]) -> Vec<Member> {
    let Ok(rows) = <Vec<(Address, U256, Bytes)>>::abi_decode(blob) else {
        return Vec::new();
    };
    rows.into_iter()
        .map(|(address, shares, raw)| Member {
            address,
            shares,
            roles: roles_from_raw(&raw, shares),
        })
        .collect()
}

/// Derives held roles from a member's raw role bytes by scanning 32-byte
/// words for each known role hash. Positive shares imply `holder` even when
/// not explicitly granted.
fn roles_from_raw(raw: &[u8], shares: U256) -> RoleSet {
    let mut roles = RoleSet::new();
    for word in raw.chunks_exact(32) {
        for role in known_roles() {
            if word == role.0.as_slice() {
                roles.insert(role);
            }
        }
    }
    if shares > U256::ZERO {
        roles.insert(*HOLDER);
    }
    roles
}

/// Steady-state strategy: one batched `multicallView` probing
/// `userRoleLookup` per known role.
pub struct ChainRoles {
    pub governance: Address,
}

#[async_trait]
impl RoleResolver for ChainRoles {
    async fn resolve_roles(&self, chain: &dyn ChainClient, account: Address) -> RoleSet {
        let probes: Vec<Bytes> = known_roles()
            .iter()
            .map(|role| {
                IEntityGovernance::userRoleLookupCall {
                    account,
                    role: role.0,
                }
                .abi_encode()
                .into()
            })
            .collect();

        let Some(results) = multicall_view(chain, self.governance, probes).await else {
            return RoleSet::new();
        };

        known_roles()
            .into_iter()
            .zip(results)
            .filter(|(_, word)| decoded_bool(word))
            .map(|(role, _)| role)
            .collect()
    }
}

/// Cross-references every pending method against every held role through
/// `methodCallableByRole`; a method is callable if any held role authorizes
/// it, and defaults to `false` on any failure.
pub async fn resolve_callable_methods(
    chain: &dyn ChainClient,
    governance: Address,
    pending: &[PendingTransaction],
    roles: &RoleSet,
) -> CallableMethodMap {
    let mut map: CallableMethodMap = pending.iter().map(|tx| (tx.method, false)).collect();
    if map.is_empty() || roles.is_empty() {
        return map;
    }

    let mut pairs = Vec::new();
    let mut probes = Vec::new();
    for method in map.keys().copied().collect::<Vec<_>>() {
        for role in roles {
            pairs.push(method);
            probes.push(
                IEntityGovernance::methodCallableByRoleCall {
                    method,
                    role: role.0,
                }
                .abi_encode()
                .into(),
            );
        }
    }

    let Some(results) = multicall_view(chain, governance, probes).await else {
        return map;
    };

    for (method, word) in pairs.into_iter().zip(results) {
        if decoded_bool(&word) {
            map.insert(method, true);
        }
    }
    map
}

/// Issues one `multicallView` batch; `None` on revert or a malformed return.
async fn multicall_view(
    chain: &dyn ChainClient,
    governance: Address,
    calls: Vec<Bytes>,
) -> Option<Vec<Bytes>> {
    let call = IEntityGovernance::multicallViewCall {
        target: governance,
        calls,
    }
    .abi_encode();
    match chain.call(governance, call.into()).await {
        Ok(ret) => match IEntityGovernance::multicallViewCall::abi_decode_returns(&ret) {
            Ok(results) => Some(results),
            Err(e) => {
                warn!(error = %e, "multicallView return did not decode, failing closed");
                None
            }
        },
        Err(e) => {
            debug!(error = %e, "multicallView reverted, failing closed");
            None
        }
    }
}

fn decoded_bool(word: &Bytes) -> bool {
    bool::abi_decode(word).unwrap_or(false)
}
