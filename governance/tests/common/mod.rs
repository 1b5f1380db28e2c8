//! In-memory governance chain double plus signer/transport doubles shared by
//! the integration tests.

use std::collections::HashSet;
use std::sync::Mutex;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

use alloy_primitives::{Address, B256, Bytes, Signature, U256};
use alloy_signer::SignerSync;
use alloy_signer_local::PrivateKeySigner;
use alloy_sol_types::{Revert, SolCall, SolError, SolValue};
use async_trait::async_trait;

use entity_gateway::offchain::{DomainData, MessageData, StorageHandledByOffChainDatabase};
use entity_gateway::{
    CallError, ChainClient, GatewayRequestBody, GatewayResponse, GatewayTransport,
    OffchainWriteRequest, SignerError, TransportError, TxHash, TypedDataSigner,
};
use entity_governance::GovernanceConfig;
use entity_governance::abi::{IEntityGovernance, IEntityGovernanceOffchain};
use entity_governance::actions::{MULTICALL, Selector};
use entity_governance::roles::Role;

#[derive(Debug, Clone)]
pub struct TxRecord {
    pub target: Address,
    pub title: String,
    pub method: Selector,
    pub data: Bytes,
    pub executed: bool,
    pub sigs_made: u64,
    pub sigs_needed: u64,
}

#[derive(Default)]
struct GovState {
    transactions: Vec<TxRecord>,
    confirmations: HashSet<(u64, Address)>,
    role_grants: HashSet<(Address, B256)>,
    method_roles: HashSet<(Selector, B256)>,
    members: Vec<(Address, U256, Bytes)>,
}

/// One-contract chain double enforcing the multisig rules the real
/// governance contract owns: confirmation uniqueness, signature counting and
/// the terminal executed flag.
pub struct MockGovChain {
    pub sender: Address,
    pub governance: Address,
    pub member_manager: Address,
    pub entity: Address,
    pub offchain_resolver: Address,
    state: Mutex<GovState>,
    decline_next: AtomicBool,
    sends: AtomicUsize,
}

impl MockGovChain {
    pub fn new() -> Self {
        Self {
            sender: Address::repeat_byte(0x11),
            governance: Address::repeat_byte(0xa1),
            member_manager: Address::repeat_byte(0xa2),
            entity: Address::repeat_byte(0xe1),
            offchain_resolver: Address::repeat_byte(0x0f),
            state: Mutex::new(GovState::default()),
            decline_next: AtomicBool::new(false),
            sends: AtomicUsize::new(0),
        }
    }

    pub fn config(&self) -> GovernanceConfig {
        GovernanceConfig {
            governance: self.governance,
            member_manager: self.member_manager,
            entity: self.entity,
            offchain_resolvers: HashSet::from([self.offchain_resolver]),
            gateway_base_override: None,
        }
    }

    /// Grants a role both in the steady-state lookup table and the
    /// bootstrap membership blob, so either resolution strategy sees it.
    pub fn grant_role(&self, account: Address, role: Role) {
        let mut st = self.state.lock().unwrap();
        st.role_grants.insert((account, role.0));
        match st.members.iter_mut().find(|(a, _, _)| *a == account) {
            Some((_, _, raw)) => {
                let mut bytes = raw.to_vec();
                bytes.extend_from_slice(role.0.as_slice());
                *raw = bytes.into();
            }
            None => {
                st.members
                    .push((account, U256::ZERO, role.0.as_slice().to_vec().into()));
            }
        }
    }

    pub fn set_shares(&self, account: Address, shares: U256) {
        let mut st = self.state.lock().unwrap();
        match st.members.iter_mut().find(|(a, _, _)| *a == account) {
            Some((_, s, _)) => *s = shares,
            None => st.members.push((account, shares, Bytes::new())),
        }
    }

    pub fn allow_method(&self, method: Selector, role: Role) {
        self.state
            .lock()
            .unwrap()
            .method_roles
            .insert((method, role.0));
    }

    pub fn push_tx(&self, record: TxRecord) -> u64 {
        let mut st = self.state.lock().unwrap();
        st.transactions.push(record);
        (st.transactions.len() - 1) as u64
    }

    pub fn record_confirmation(&self, tx_index: u64, account: Address) {
        self.state
            .lock()
            .unwrap()
            .confirmations
            .insert((tx_index, account));
    }

    pub fn decline_next_prompt(&self) {
        self.decline_next.store(true, Ordering::SeqCst);
    }

    pub fn sends(&self) -> usize {
        self.sends.load(Ordering::SeqCst)
    }

    pub fn tx(&self, tx_index: u64) -> TxRecord {
        self.state.lock().unwrap().transactions[tx_index as usize].clone()
    }

    pub fn tx_count(&self) -> usize {
        self.state.lock().unwrap().transactions.len()
    }

    fn view_dispatch(&self, data: &[u8]) -> Result<Bytes, CallError> {
        if data.len() < 4 {
            return Err(revert("calldata too short"));
        }
        let selector: [u8; 4] = data[..4].try_into().unwrap();
        let st = self.state.lock().unwrap();

        if selector == IEntityGovernance::multicallViewCall::SELECTOR {
            let call = IEntityGovernance::multicallViewCall::abi_decode(data)
                .map_err(|_| revert("bad multicallView"))?;
            drop(st);
            let mut results = Vec::new();
            for inner in &call.calls {
                results.push(self.view_dispatch(inner)?);
            }
            return Ok(results.abi_encode().into());
        }

        if selector == IEntityGovernance::isConfirmedCall::SELECTOR {
            let call = IEntityGovernance::isConfirmedCall::abi_decode(data)
                .map_err(|_| revert("bad isConfirmed"))?;
            let idx = u64::try_from(call.txIndex).unwrap_or(u64::MAX);
            let confirmed = st.confirmations.contains(&(idx, call.account));
            return Ok(confirmed.abi_encode().into());
        }

        if selector == IEntityGovernance::methodCallableByRoleCall::SELECTOR {
            let call = IEntityGovernance::methodCallableByRoleCall::abi_decode(data)
                .map_err(|_| revert("bad methodCallableByRole"))?;
            let callable = st.method_roles.contains(&(call.method, call.role));
            return Ok(callable.abi_encode().into());
        }

        if selector == IEntityGovernance::entityToTransactionsCall::SELECTOR {
            let call = IEntityGovernance::entityToTransactionsCall::abi_decode(data)
                .map_err(|_| revert("bad entityToTransactions"))?;
            let idx = u64::try_from(call.txIndex).unwrap_or(u64::MAX) as usize;
            let Some(tx) = st.transactions.get(idx) else {
                return Err(revert("transaction index out of range"));
            };
            let encoded = (
                tx.target,
                tx.title.clone(),
                tx.method,
                tx.data.clone(),
                tx.executed,
                U256::from(tx.sigs_made),
                U256::from(tx.sigs_needed),
            )
                .abi_encode_params();
            return Ok(encoded.into());
        }

        if selector == IEntityGovernance::entityToTransactionNonceCall::SELECTOR {
            return Ok(U256::from(st.transactions.len()).abi_encode().into());
        }

        if selector == IEntityGovernance::userRoleLookupCall::SELECTOR {
            let call = IEntityGovernance::userRoleLookupCall::abi_decode(data)
                .map_err(|_| revert("bad userRoleLookup"))?;
            let held = st.role_grants.contains(&(call.account, call.role));
            return Ok(held.abi_encode().into());
        }

        if selector == IEntityGovernance::userDataBytesCall::SELECTOR {
            let blob: Bytes = st.members.abi_encode().into();
            return Ok(blob.abi_encode().into());
        }

        Err(revert("unknown view"))
    }
}

#[async_trait]
impl ChainClient for MockGovChain {
    async fn call(&self, to: Address, data: Bytes) -> Result<Bytes, CallError> {
        if to == self.offchain_resolver {
            // Resolver records live off-chain; every write simulation is
            // answered with the structured redirect.
            let redirect = StorageHandledByOffChainDatabase {
                domain: DomainData {
                    name: "EntityResolver".to_string(),
                    version: "1".to_string(),
                    chainId: U256::from(8453u64),
                    verifyingContract: to,
                },
                url: "https://gateway.example/write".to_string(),
                message: MessageData {
                    data,
                    sender: self.sender,
                    expirationTimestamp: U256::from(1_900_000_000u64),
                },
            };
            return Err(CallError::Revert(redirect.abi_encode().into()));
        }
        self.view_dispatch(&data)
    }

    async fn send_transaction(&self, to: Address, data: Bytes) -> Result<TxHash, CallError> {
        if self.decline_next.swap(false, Ordering::SeqCst) {
            return Err(CallError::Rejected);
        }
        if to != self.governance {
            return Err(revert("unexpected write target"));
        }
        if data.len() < 4 {
            return Err(revert("calldata too short"));
        }
        let selector: [u8; 4] = data[..4].try_into().unwrap();
        let mut st = self.state.lock().unwrap();

        if selector == IEntityGovernance::confirmTransactionCall::SELECTOR {
            let call = IEntityGovernance::confirmTransactionCall::abi_decode(&data)
                .map_err(|_| revert("bad confirmTransaction"))?;
            let idx = u64::try_from(call.txIndex).unwrap_or(u64::MAX);
            if !st.role_grants.contains(&(self.sender, call.role)) {
                return Err(revert("role not held"));
            }
            if st.confirmations.contains(&(idx, self.sender)) {
                return Err(revert("already confirmed"));
            }
            let Some(tx) = st.transactions.get_mut(idx as usize) else {
                return Err(revert("transaction index out of range"));
            };
            if tx.executed {
                return Err(revert("already executed"));
            }
            if tx.sigs_made >= tx.sigs_needed {
                return Err(revert("signature cap reached"));
            }
            tx.sigs_made += 1;
            st.confirmations.insert((idx, self.sender));
        } else if selector == IEntityGovernance::executeTransactionCall::SELECTOR {
            let call = IEntityGovernance::executeTransactionCall::abi_decode(&data)
                .map_err(|_| revert("bad executeTransaction"))?;
            let idx = u64::try_from(call.txIndex).unwrap_or(u64::MAX);
            execute_at(&mut st, idx)?;
        } else if selector == IEntityGovernanceOffchain::executeTransactionCall::SELECTOR {
            let call = IEntityGovernanceOffchain::executeTransactionCall::abi_decode(&data)
                .map_err(|_| revert("bad proof-carrying executeTransaction"))?;
            if call.response.is_empty() || call.proof.is_empty() {
                return Err(revert("missing gateway proof"));
            }
            let idx = u64::try_from(call.txIndex).unwrap_or(u64::MAX);
            execute_at(&mut st, idx)?;
        } else if selector == IEntityGovernance::submitMulticallTransactionCall::SELECTOR {
            let call = IEntityGovernance::submitMulticallTransactionCall::abi_decode(&data)
                .map_err(|_| revert("bad submitMulticallTransaction"))?;
            st.transactions.push(TxRecord {
                target: call.target,
                title: call.title,
                method: MULTICALL,
                data: (call.calls,).abi_encode_params().into(),
                executed: false,
                sigs_made: 0,
                sigs_needed: 2,
            });
        } else {
            return Err(revert("unknown write"));
        }

        let count = self.sends.fetch_add(1, Ordering::SeqCst) as u8;
        Ok(B256::repeat_byte(0xf0 ^ count))
    }

    async fn code_at(&self, address: Address) -> Result<Bytes, CallError> {
        if address == self.governance
            || address == self.member_manager
            || address == self.offchain_resolver
        {
            Ok(Bytes::from(vec![0x60, 0x80]))
        } else {
            Ok(Bytes::new())
        }
    }

    fn sender(&self) -> Address {
        self.sender
    }
}

fn execute_at(st: &mut GovState, idx: u64) -> Result<(), CallError> {
    let Some(tx) = st.transactions.get_mut(idx as usize) else {
        return Err(revert("transaction index out of range"));
    };
    if tx.executed {
        return Err(revert("already executed"));
    }
    if tx.sigs_made < tx.sigs_needed {
        return Err(revert("not enough confirmations"));
    }
    tx.executed = true;
    Ok(())
}

fn revert(reason: &str) -> CallError {
    CallError::Revert(
        Revert {
            reason: reason.to_string(),
        }
        .abi_encode()
        .into(),
    )
}

/// Typed-data signer over a throwaway local key.
pub struct KeySigner(pub PrivateKeySigner);

impl KeySigner {
    pub fn random() -> Self {
        Self(PrivateKeySigner::random())
    }
}

#[async_trait]
impl TypedDataSigner for KeySigner {
    fn address(&self) -> Address {
        self.0.address()
    }

    async fn sign_write(&self, request: &OffchainWriteRequest) -> Result<Signature, SignerError> {
        self.0
            .sign_hash_sync(&request.signing_hash())
            .map_err(|e| SignerError::Other(e.to_string()))
    }
}

/// Gateway transport double with a scripted answer.
pub struct ScriptedTransport {
    status: u16,
    body: String,
    posts: Mutex<Vec<String>>,
}

impl ScriptedTransport {
    pub fn ok(body: &str) -> Self {
        Self {
            status: 200,
            body: body.to_string(),
            posts: Mutex::new(Vec::new()),
        }
    }

    pub fn refusing(status: u16) -> Self {
        Self {
            status,
            body: String::new(),
            posts: Mutex::new(Vec::new()),
        }
    }

    pub fn post_count(&self) -> usize {
        self.posts.lock().unwrap().len()
    }
}

#[async_trait]
impl GatewayTransport for ScriptedTransport {
    async fn post(
        &self,
        url: &str,
        _body: &GatewayRequestBody,
    ) -> Result<GatewayResponse, TransportError> {
        self.posts.lock().unwrap().push(url.to_string());
        Ok(GatewayResponse {
            status: self.status,
            body: self.body.clone(),
        })
    }
}
