//! The chain client capability through which tasks submit deployments

use std::fmt::{self, Display};

use alloy_primitives::{Address, Bytes, TxHash};
use async_trait::async_trait;

use crate::{artifact::Artifact, errors::ChainError, input::Param};

/// A logical contract name bound to an on-chain address
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ContractHandle {
    /// The contract name, as used in output records
    pub name: String,
    /// The address of the contract
    pub address: Address,
}

impl ContractHandle {
    /// Bind `name` to `address`
    pub fn new(name: impl Into<String>, address: Address) -> Self {
        Self {
            name: name.into(),
            address,
        }
    }
}

impl Display for ContractHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.name, self.address)
    }
}

/// Everything a chain client needs to deploy a single contract
#[derive(Clone, Copy, Debug)]
pub struct DeployRequest<'a> {
    /// The contract name
    pub name: &'a str,
    /// The compiled artifact, whose ABI the constructor arguments are encoded against
    pub artifact: &'a Artifact,
    /// The creation bytecode, with libraries already linked
    pub bytecode: &'a Bytes,
    /// The constructor arguments
    pub args: &'a [Param],
    /// The account to deploy from, the client's signer if unset
    pub from: Option<Address>,
}

/// The result of a mined deployment transaction
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct DeployReceipt {
    /// The address of the new contract
    pub address: Address,
    /// The hash of the deployment transaction
    pub tx_hash: TxHash,
}

/// A connection to a chain able to deploy contracts and bind handles to addresses.
///
/// Gas estimation, nonce management, signing, and ABI encoding of constructor
/// arguments are the client's concern.
#[async_trait]
pub trait ChainClient: Send + Sync {
    /// Deploy a contract and wait for the transaction to be mined
    async fn deploy(&self, request: DeployRequest<'_>) -> Result<DeployReceipt, ChainError>;

    /// The address of the account deployments are signed with
    fn signer(&self) -> Address;

    /// Bind `name` to `address`, without deploying anything
    async fn instance_at(&self, name: &str, address: Address)
        -> Result<ContractHandle, ChainError>;

    /// Execute a read-only call against `to`, returning the raw return data
    async fn call(&self, to: Address, calldata: Bytes) -> Result<Bytes, ChainError>;

    /// The number of transactions sent from `account`
    async fn transaction_count(&self, account: Address) -> Result<u64, ChainError>;

    /// The EIP-155 chain id of the connected chain
    async fn chain_id(&self) -> Result<u64, ChainError>;
}
