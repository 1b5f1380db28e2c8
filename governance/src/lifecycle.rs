//! The propose → confirm → execute state machine.
//!
//! The controller never trusts its cached projection for a permission
//! decision: every mutating action re-resolves roles and the callable-method
//! map first, and refreshes the full session state afterwards. The on-chain
//! contract remains the authority for signature counts and the terminal
//! `executed` flag; the client only refuses actions it can already prove
//! invalid.

use std::sync::Arc;

use alloy_primitives::{Address, Bytes, U256};
use alloy_sol_types::SolCall;
use tracing::{debug, info};

use entity_gateway::{
    CallError, CallbackRequest, ChainClient, GatewayTransport, TxHash, TypedDataSigner,
    WriteError, WriteOutcome, WriteRequest, execute_write, revert_reason,
};

use crate::abi::{IEntityGovernance, IEntityGovernanceOffchain};
use crate::actions::Selector;
use crate::config::GovernanceConfig;
use crate::error::GovernanceError;
use crate::ledger::{LedgerReader, LedgerSnapshot, TxStatus};
use crate::roles::{
    CallableMethodMap, MANAGER, Role, RoleSet, known_roles, resolve_callable_methods,
    resolver_for,
};

/// Refreshed projection of ledger, roles and permissions for one account.
#[derive(Debug, Default)]
pub struct SessionState {
    pub ledger: LedgerSnapshot,
    pub roles: RoleSet,
    pub callable: CallableMethodMap,
}

/// Orchestrates the multisig lifecycle for one entity on behalf of one
/// account. All I/O goes through the injected clients.
pub struct LifecycleController {
    config: GovernanceConfig,
    chain: Arc<dyn ChainClient>,
    signer: Arc<dyn TypedDataSigner>,
    transport: Arc<dyn GatewayTransport>,
    state: SessionState,
}

/// Mutating actions resolve to `Some(hash)` when submitted, or `None` when
/// the user declined the wallet prompt (a no-op, deliberately not an error).
pub type ActionResult = Result<Option<TxHash>, GovernanceError>;

impl LifecycleController {
    pub fn new(
        config: GovernanceConfig,
        chain: Arc<dyn ChainClient>,
        signer: Arc<dyn TypedDataSigner>,
        transport: Arc<dyn GatewayTransport>,
    ) -> Self {
        Self {
            config,
            chain,
            signer,
            transport,
            state: SessionState::default(),
        }
    }

    /// Builds a controller over the production HTTP gateway transport
    /// derived from the config's gateway settings.
    pub fn with_http_transport(
        config: GovernanceConfig,
        chain: Arc<dyn ChainClient>,
        signer: Arc<dyn TypedDataSigner>,
    ) -> Result<Self, GovernanceError> {
        let transport = config
            .transport()
            .map_err(|e| GovernanceError::Chain(e.to_string()))?;
        Ok(Self::new(config, chain, signer, Arc::new(transport)))
    }

    pub fn state(&self) -> &SessionState {
        &self.state
    }

    fn reader(&self) -> LedgerReader {
        LedgerReader {
            governance: self.config.governance,
            entity: self.config.entity,
        }
    }

    /// Rebuilds the ledger snapshot, role set and callable-method map from
    /// authoritative sources.
    pub async fn refresh(&mut self) -> Result<(), GovernanceError> {
        let ledger = self.reader().snapshot(&*self.chain).await?;
        let resolver = resolver_for(&ledger, self.config.member_manager, self.config.governance);
        let roles = resolver
            .resolve_roles(&*self.chain, self.chain.sender())
            .await;
        let callable = resolve_callable_methods(
            &*self.chain,
            self.config.governance,
            &ledger.transactions,
            &roles,
        )
        .await;
        debug!(
            transactions = ledger.transactions.len(),
            roles = roles.len(),
            "session state refreshed"
        );
        self.state = SessionState {
            ledger,
            roles,
            callable,
        };
        Ok(())
    }

    /// Proposes a batch of calls against `target`. Manager-only; the
    /// proposal itself does not count as a confirmation.
    pub async fn propose(
        &mut self,
        target: Address,
        role: Role,
        title: &str,
        calls: Vec<Bytes>,
    ) -> ActionResult {
        self.refresh().await?;
        if !self.state.roles.contains(&*MANAGER) {
            return Err(GovernanceError::PermissionDenied(
                "proposing a transaction requires the manager role".to_string(),
            ));
        }

        info!(%target, title, calls = calls.len(), "proposing transaction");
        let data = IEntityGovernance::submitMulticallTransactionCall {
            target,
            role: role.0,
            title: title.to_string(),
            calls,
        }
        .abi_encode();
        self.submit_and_refresh(self.config.governance, data.into())
            .await
    }

    /// Confirms a pending transaction. Only valid while the transaction is
    /// still gathering signatures: a fully-confirmed entry must be executed,
    /// not signed past its threshold. Also requires the callable-method map
    /// to allow the method for this account and the authoritative on-chain
    /// check to show no prior confirmation from it.
    pub async fn confirm(&mut self, tx_index: u64) -> ActionResult {
        self.refresh().await?;
        let tx = self
            .state
            .ledger
            .get(tx_index)
            .ok_or(GovernanceError::UnknownTransaction(tx_index))?
            .clone();
        match tx.status() {
            TxStatus::Executed => return Err(GovernanceError::AlreadyExecuted(tx_index)),
            TxStatus::Executable => return Err(GovernanceError::FullyConfirmed(tx_index)),
            TxStatus::Confirming => {}
        }
        self.require_callable(tx.method)?;

        if self.already_confirmed(tx_index).await? {
            return Err(GovernanceError::AlreadyConfirmed(tx_index));
        }

        let role = self.authorizing_role(tx.method).await?;
        info!(tx_index, "confirming transaction");
        let data = IEntityGovernance::confirmTransactionCall {
            txIndex: U256::from(tx_index),
            role: role.0,
        }
        .abi_encode();
        self.submit_and_refresh(self.config.governance, data.into())
            .await
    }

    /// Executes a transaction that has gathered enough confirmations. When
    /// the target is an off-chain-backed resolver the write routes through
    /// the gateway first, and its proof finalizes the on-chain execute.
    pub async fn execute(&mut self, tx_index: u64) -> ActionResult {
        self.refresh().await?;
        let tx = self
            .state
            .ledger
            .get(tx_index)
            .ok_or(GovernanceError::UnknownTransaction(tx_index))?
            .clone();
        match tx.status() {
            TxStatus::Executed => return Err(GovernanceError::AlreadyExecuted(tx_index)),
            TxStatus::Confirming => return Err(GovernanceError::NotExecutable(tx_index)),
            TxStatus::Executable => {}
        }
        self.require_callable(tx.method)?;
        let role = self.authorizing_role(tx.method).await?;

        if self.config.is_offchain_target(tx.target) {
            info!(tx_index, target = %tx.target, "executing through off-chain write gateway");
            let request = WriteRequest {
                to: tx.target,
                data: tx.calldata(),
            };
            let role_word = role.0;
            let callback = CallbackRequest {
                to: self.config.governance,
                encode_call: Box::new(move |response, proof| {
                    IEntityGovernanceOffchain::executeTransactionCall {
                        txIndex: U256::from(tx_index),
                        role: role_word,
                        response: response.clone(),
                        proof: proof.clone(),
                    }
                    .abi_encode()
                    .into()
                }),
            };
            let outcome = execute_write(
                &*self.chain,
                &*self.signer,
                &*self.transport,
                request,
                Some(callback),
            )
            .await;
            return match outcome {
                Ok(WriteOutcome::Submitted(hash)) => {
                    self.refresh().await?;
                    Ok(Some(hash))
                }
                // With a callback attached a proof can only surface as the
                // non-200 soft-fail sentinel.
                Ok(WriteOutcome::Proof(_)) => Err(GovernanceError::Chain(
                    "gateway declined the off-chain write".to_string(),
                )),
                Err(WriteError::SignatureRejected) => {
                    debug!(tx_index, "wallet prompt declined, no-op");
                    Ok(None)
                }
                Err(e) => Err(e.into()),
            };
        }

        info!(tx_index, "executing transaction");
        let data = IEntityGovernance::executeTransactionCall {
            txIndex: U256::from(tx_index),
            role: role.0,
        }
        .abi_encode();
        self.submit_and_refresh(self.config.governance, data.into())
            .await
    }

    fn require_callable(&self, method: Selector) -> Result<(), GovernanceError> {
        match self.state.callable.get(&method) {
            Some(true) => Ok(()),
            _ => Err(GovernanceError::PermissionDenied(format!(
                "method 0x{} is not callable with the held roles",
                hex::encode(method)
            ))),
        }
    }

    /// Authoritative on-chain probe: has this account already signed?
    async fn already_confirmed(&self, tx_index: u64) -> Result<bool, GovernanceError> {
        let call = IEntityGovernance::isConfirmedCall {
            entity: self.config.entity,
            txIndex: U256::from(tx_index),
            account: self.chain.sender(),
        }
        .abi_encode();
        let ret = self
            .chain
            .call(self.config.governance, call.into())
            .await
            .map_err(|e| GovernanceError::Chain(e.to_string()))?;
        IEntityGovernance::isConfirmedCall::abi_decode_returns(&ret)
            .map_err(|e| GovernanceError::Chain(format!("isConfirmed return: {e}")))
    }

    /// Picks the first held role the contract reports as authorizing the
    /// method.
    async fn authorizing_role(&self, method: Selector) -> Result<Role, GovernanceError> {
        for role in known_roles() {
            if !self.state.roles.contains(&role) {
                continue;
            }
            let call = IEntityGovernance::methodCallableByRoleCall {
                method,
                role: role.0,
            }
            .abi_encode();
            let Ok(ret) = self.chain.call(self.config.governance, call.into()).await else {
                continue;
            };
            if IEntityGovernance::methodCallableByRoleCall::abi_decode_returns(&ret)
                .unwrap_or(false)
            {
                return Ok(role);
            }
        }
        Err(GovernanceError::PermissionDenied(format!(
            "no held role authorizes method 0x{}",
            hex::encode(method)
        )))
    }

    async fn submit_and_refresh(&mut self, to: Address, data: Bytes) -> ActionResult {
        match self.chain.send_transaction(to, data).await {
            Ok(hash) => {
                self.refresh().await?;
                Ok(Some(hash))
            }
            Err(CallError::Rejected) => {
                debug!("wallet prompt declined, no-op");
                Ok(None)
            }
            Err(CallError::Revert(data)) => Err(GovernanceError::ExecutionRevert(
                revert_reason(&data).unwrap_or_else(|| format!("0x{}", hex::encode(&data))),
            )),
            Err(CallError::Transport(m)) => Err(GovernanceError::Chain(m)),
        }
    }
}
