use entity_gateway::WriteError;
use thiserror::Error;

/// Errors surfaced by the governance subsystem.
///
/// Declined wallet prompts never appear here: the controller swallows them
/// into an `Ok(None)` no-op. Everything else carries the most specific
/// reason available.
#[derive(Debug, Error)]
pub enum GovernanceError {
    #[error("permission denied: {0}")]
    PermissionDenied(String),

    #[error("unknown transaction index {0}")]
    UnknownTransaction(u64),

    #[error("transaction {0} already confirmed by this account")]
    AlreadyConfirmed(u64),

    #[error("transaction {0} already executed")]
    AlreadyExecuted(u64),

    #[error("transaction {0} already has enough confirmations; execute it instead")]
    FullyConfirmed(u64),

    #[error("transaction {0} does not have enough confirmations to execute")]
    NotExecutable(u64),

    #[error("execution reverted: {0}")]
    ExecutionRevert(String),

    #[error("chain error: {0}")]
    Chain(String),

    #[error(transparent)]
    Write(#[from] WriteError),
}

impl GovernanceError {
    /// Single user-facing line, preferring the short specific reason over
    /// the wrapped error chain.
    pub fn user_message(&self) -> String {
        match self {
            GovernanceError::ExecutionRevert(reason) | GovernanceError::Chain(reason) => {
                reason.clone()
            }
            GovernanceError::Write(WriteError::Simulation(reason))
            | GovernanceError::Write(WriteError::CallbackRevert(reason)) => reason.clone(),
            other => other.to_string(),
        }
    }
}
