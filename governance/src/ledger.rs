//! Read-only projection of the on-chain multisig ledger.
//!
//! The governance contract owns this data; a [`LedgerSnapshot`] is refreshed
//! after every mutating call and never treated as authoritative for
//! permission decisions.

use alloy_primitives::{Address, Bytes, U256};
use alloy_sol_types::SolCall;
use tracing::{debug, warn};

use entity_gateway::{ChainClient, revert_reason};

use crate::abi::IEntityGovernance;
use crate::actions::{self, ActionDecodeResult, Selector};
use crate::error::GovernanceError;

/// One entry of the multisig ledger.
#[derive(Debug, Clone, PartialEq)]
pub struct PendingTransaction {
    pub target: Address,
    pub title: String,
    pub method: Selector,
    pub data: Bytes,
    pub executed: bool,
    pub sigs_made: U256,
    pub sigs_needed: U256,
    /// Strictly increasing per-entity nonce, assigned at creation and never
    /// reused.
    pub tx_index: u64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TxStatus {
    /// `0 <= sigs_made < sigs_needed`, not executed.
    Confirming,
    /// Enough confirmations, awaiting execution.
    Executable,
    /// Terminal; never reverts to unexecuted.
    Executed,
}

impl PendingTransaction {
    pub fn status(&self) -> TxStatus {
        if self.executed {
            TxStatus::Executed
        } else if self.sigs_made >= self.sigs_needed {
            TxStatus::Executable
        } else {
            TxStatus::Confirming
        }
    }

    /// Full calldata of the proposed call (selector plus payload).
    pub fn calldata(&self) -> Bytes {
        actions::calldata(self.method, self.data.to_vec())
    }

    /// Human-readable decode of the payload for audit display.
    pub fn describe(&self) -> ActionDecodeResult {
        actions::decode(self.method, &self.data)
    }
}

/// All ledger entries for one entity at one point in time.
#[derive(Debug, Clone, Default)]
pub struct LedgerSnapshot {
    pub transactions: Vec<PendingTransaction>,
}

impl LedgerSnapshot {
    pub fn get(&self, tx_index: u64) -> Option<&PendingTransaction> {
        self.transactions.iter().find(|tx| tx.tx_index == tx_index)
    }

    pub fn confirming(&self) -> Vec<&PendingTransaction> {
        self.by_status(TxStatus::Confirming)
    }

    pub fn executable(&self) -> Vec<&PendingTransaction> {
        self.by_status(TxStatus::Executable)
    }

    pub fn executed(&self) -> Vec<&PendingTransaction> {
        self.by_status(TxStatus::Executed)
    }

    fn by_status(&self, status: TxStatus) -> Vec<&PendingTransaction> {
        self.transactions
            .iter()
            .filter(|tx| tx.status() == status)
            .collect()
    }

    /// Bootstrap state: nothing beyond the genesis entry has executed, so
    /// membership still comes from the member-manager's bootstrap blob.
    pub fn is_bootstrap(&self) -> bool {
        !self
            .transactions
            .iter()
            .any(|tx| tx.executed && tx.tx_index > 0)
    }
}

/// Enumerates the ledger of one entity's governance contract.
#[derive(Debug, Clone)]
pub struct LedgerReader {
    pub governance: Address,
    pub entity: Address,
}

impl LedgerReader {
    pub async fn snapshot(
        &self,
        chain: &dyn ChainClient,
    ) -> Result<LedgerSnapshot, GovernanceError> {
        // Brand-new entities may not have a deployed governance contract
        // yet; an explicit existence check keeps that case out of the error
        // path instead of probing reverts.
        let code = chain
            .code_at(self.governance)
            .await
            .map_err(|e| GovernanceError::Chain(e.to_string()))?;
        if code.is_empty() {
            debug!(governance = %self.governance, "governance contract not deployed, empty ledger");
            return Ok(LedgerSnapshot::default());
        }

        let nonce = self.nonce(chain).await?;
        let mut transactions = Vec::with_capacity(nonce as usize);
        for tx_index in 0..nonce {
            transactions.push(self.read_transaction(chain, tx_index).await?);
        }
        Ok(LedgerSnapshot { transactions })
    }

    async fn nonce(&self, chain: &dyn ChainClient) -> Result<u64, GovernanceError> {
        let call = IEntityGovernance::entityToTransactionNonceCall {
            entity: self.entity,
        }
        .abi_encode();
        let ret = self.view(chain, call.into()).await?;
        let nonce = IEntityGovernance::entityToTransactionNonceCall::abi_decode_returns(&ret)
            .map_err(|e| GovernanceError::Chain(format!("nonce return: {e}")))?;
        u64::try_from(nonce).map_err(|_| GovernanceError::Chain("nonce out of range".to_string()))
    }

    async fn read_transaction(
        &self,
        chain: &dyn ChainClient,
        tx_index: u64,
    ) -> Result<PendingTransaction, GovernanceError> {
        let call = IEntityGovernance::entityToTransactionsCall {
            entity: self.entity,
            txIndex: U256::from(tx_index),
        }
        .abi_encode();
        let ret = self.view(chain, call.into()).await?;
        let row = IEntityGovernance::entityToTransactionsCall::abi_decode_returns(&ret)
            .map_err(|e| GovernanceError::Chain(format!("transaction {tx_index} return: {e}")))?;

        let tx = PendingTransaction {
            target: row.target,
            title: row.title,
            method: row.method,
            data: row.dataBytes,
            executed: row.executed,
            sigs_made: row.sigsMade,
            sigs_needed: row.sigsNeeded,
            tx_index,
        };
        if !tx.executed && tx.sigs_made > tx.sigs_needed {
            warn!(tx_index, "ledger entry reports more signatures than required");
        }
        Ok(tx)
    }

    async fn view(
        &self,
        chain: &dyn ChainClient,
        data: Bytes,
    ) -> Result<Bytes, GovernanceError> {
        chain.call(self.governance, data).await.map_err(|e| match e {
            entity_gateway::CallError::Revert(data) => GovernanceError::Chain(
                revert_reason(&data).unwrap_or_else(|| format!("0x{}", hex::encode(&data))),
            ),
            other => GovernanceError::Chain(other.to_string()),
        })
    }
}
