//! Definitions of errors that can occur during the execution of the deployment scripts

use deployments::{network::UnknownNetwork, DeployError};
use thiserror::Error;

/// Errors that can occur during the execution of the deployment scripts
#[derive(Debug, Error)]
pub enum ScriptError {
    /// Error initializing the RPC client
    #[error("error initializing client: {0}")]
    ClientInitialization(String),
    /// The RPC endpoint reported a chain id no known network has
    #[error("no known network has chain id {0}")]
    UnknownChain(u64),
    /// A network name could not be parsed
    #[error(transparent)]
    UnknownNetwork(#[from] UnknownNetwork),
    /// Error constructing calldata or constructor arguments
    #[error("error constructing calldata: {0}")]
    CalldataConstruction(String),
    /// Error calling a contract method
    #[error("error interacting with contract: {0}")]
    ContractInteraction(String),
    /// Error de/serializing data
    #[error("error de/serializing: {0}")]
    Serde(String),
    /// A task failed
    #[error(transparent)]
    Deploy(#[from] DeployError),
}
