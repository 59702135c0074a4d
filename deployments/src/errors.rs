//! Definitions of errors that can occur while resolving, deploying, and recording tasks

use std::path::PathBuf;

use thiserror::Error;

use crate::{mode::TaskMode, network::Network, store::OutputTarget};

/// The error type reported by chain client implementations
pub type ChainError = Box<dyn std::error::Error + Send + Sync>;

/// Errors that can occur while running a task
#[derive(Debug, Error)]
pub enum DeployError {
    /// An operation was invoked in a mode that disallows it
    #[error("cannot {operation} in tasks of mode {mode}")]
    InvalidMode {
        /// The disallowed operation
        operation: &'static str,
        /// The mode of the task
        mode: TaskMode,
    },
    /// A task's output lacks a field another task depends on
    #[error("task `{task}` has no output `{field}` on {target}")]
    UnresolvedDependency {
        /// The referenced task
        task: String,
        /// The record that was searched
        target: OutputTarget,
        /// The missing field
        field: String,
    },
    /// A required input is missing or has the wrong shape
    #[error("invalid input `{key}` for task `{task}`: {reason}")]
    InvalidInput {
        /// The task whose input is invalid
        task: String,
        /// The offending input key
        key: String,
        /// Why the input is invalid
        reason: String,
    },
    /// No output record exists where one was required
    #[error("no output record for task `{task}` on {target}")]
    NotFound {
        /// The task whose record is missing
        task: String,
        /// The record that was searched for
        target: OutputTarget,
    },
    /// A deployment transaction failed
    #[error("error deploying `{contract}`: {source}")]
    Transaction {
        /// The contract being deployed
        contract: String,
        /// The underlying chain client error
        #[source]
        source: ChainError,
    },
    /// A static deployability check failed
    #[error("check failed for `{contract}`: {reason}")]
    Check {
        /// The contract being checked
        contract: String,
        /// Why the check failed
        reason: String,
    },
    /// A compiled artifact could not be loaded or linked
    #[error("error loading artifact `{contract}`: {reason}")]
    Artifact {
        /// The contract whose artifact is invalid
        contract: String,
        /// Why the artifact is invalid
        reason: String,
    },
    /// No task with the given id is declared
    #[error("unknown task `{0}`")]
    UnknownTask(String),
    /// The network of the chain client does not match the task's network
    #[error("chain client is connected to chain {chain_id}, but the task targets {network}")]
    NetworkMismatch {
        /// The chain id reported by the client
        chain_id: u64,
        /// The network of the task
        network: Network,
    },
    /// A capability the operation needs was not configured
    #[error("no {0} configured")]
    MissingCapability(&'static str),
    /// A non-deployment call to the chain client failed
    #[error("chain client error: {0}")]
    Chain(#[source] ChainError),
    /// Error reading or writing a record file
    #[error("error accessing {}: {source}", path.display())]
    Io {
        /// The file being accessed
        path: PathBuf,
        /// The underlying IO error
        #[source]
        source: std::io::Error,
    },
    /// Error de/serializing a record file
    #[error("error de/serializing {}: {source}", path.display())]
    Serde {
        /// The file being de/serialized
        path: PathBuf,
        /// The underlying serde error
        #[source]
        source: serde_json::Error,
    },
}

impl DeployError {
    /// Whether the error may be tolerated by a run that opted into continuing on error.
    ///
    /// Only failed deployment transactions qualify; store, reference, and input errors
    /// always abort the run.
    pub fn is_recoverable(&self) -> bool {
        matches!(self, DeployError::Transaction { .. })
    }

    /// Construct an [`DeployError::InvalidInput`]
    pub(crate) fn invalid_input(task: &str, key: &str, reason: impl Into<String>) -> Self {
        DeployError::InvalidInput {
            task: task.to_string(),
            key: key.to_string(),
            reason: reason.into(),
        }
    }

    /// Construct an [`DeployError::Artifact`]
    pub(crate) fn artifact(contract: &str, reason: impl Into<String>) -> Self {
        DeployError::Artifact {
            contract: contract.to_string(),
            reason: reason.into(),
        }
    }
}
