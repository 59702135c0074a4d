//! Mock collaborators and fixtures shared by the integration tests

#![allow(dead_code)]

use std::{
    collections::BTreeSet,
    fs,
    path::Path,
    sync::{
        atomic::{AtomicU64, AtomicUsize, Ordering},
        Arc, Mutex,
    },
    time::Duration,
};

use alloy_primitives::{address, Address, Bytes, B256};
use async_trait::async_trait;
use deployments::{
    client::{ChainClient, ContractHandle, DeployReceipt, DeployRequest},
    errors::ChainError,
    settings::{DeploySettings, VerificationSettings},
    verifier::{VerificationError, VerificationRequest, VerificationStatus, Verifier},
    Network, TaskCatalog, TaskEnv,
};
use tempfile::TempDir;

/// The deployer account of the mock client
pub const DEPLOYER: Address = address!("f39fd6e51aad88f6f4ce6ab8827279cfffb92266");

/// An in-memory chain that assigns CREATE addresses to deployments
pub struct MockChainClient {
    chain_id: u64,
    nonce: AtomicU64,
    deploys: Mutex<Vec<String>>,
    failing: Mutex<BTreeSet<String>>,
}

impl MockChainClient {
    /// A client connected to `network`
    pub fn new(network: Network) -> Self {
        Self {
            chain_id: network.chain_id(),
            nonce: AtomicU64::new(0),
            deploys: Mutex::new(Vec::new()),
            failing: Mutex::new(BTreeSet::new()),
        }
    }

    /// Make every deployment of `name` revert
    pub fn fail_on(&self, name: &str) {
        self.failing.lock().unwrap().insert(name.to_string());
    }

    /// The names of the contracts deployed so far, in order
    pub fn deploys(&self) -> Vec<String> {
        self.deploys.lock().unwrap().clone()
    }

    /// The number of deployments of `name`
    pub fn deploy_count(&self, name: &str) -> usize {
        self.deploys().iter().filter(|n| *n == name).count()
    }
}

#[async_trait]
impl ChainClient for MockChainClient {
    async fn deploy(&self, request: DeployRequest<'_>) -> Result<DeployReceipt, ChainError> {
        if self.failing.lock().unwrap().contains(request.name) {
            return Err(format!("{} reverted", request.name).into());
        }
        assert_eq!(request.args.len(), request.artifact.constructor_arity());

        let nonce = self.nonce.fetch_add(1, Ordering::SeqCst);
        let from = request.from.unwrap_or(DEPLOYER);
        self.deploys.lock().unwrap().push(request.name.to_string());

        Ok(DeployReceipt {
            address: from.create(nonce),
            tx_hash: B256::with_last_byte(nonce as u8 + 1),
        })
    }

    fn signer(&self) -> Address {
        DEPLOYER
    }

    async fn instance_at(
        &self,
        name: &str,
        address: Address,
    ) -> Result<ContractHandle, ChainError> {
        Ok(ContractHandle::new(name, address))
    }

    async fn call(&self, to: Address, _calldata: Bytes) -> Result<Bytes, ChainError> {
        Err(format!("no contract at {to}").into())
    }

    async fn transaction_count(&self, _account: Address) -> Result<u64, ChainError> {
        Ok(self.nonce.load(Ordering::SeqCst))
    }

    async fn chain_id(&self) -> Result<u64, ChainError> {
        Ok(self.chain_id)
    }
}

/// How a [`MockVerifier`] responds
#[derive(Clone, Copy, Debug)]
pub enum VerifierBehavior {
    /// Verify every submission
    Verify,
    /// Report every contract as already verified
    AlreadyVerified,
    /// Fail every submission transiently
    Unavailable,
    /// Reject every submission
    Reject,
}

/// A verifier that responds with a fixed behavior and counts submissions
pub struct MockVerifier {
    behavior: VerifierBehavior,
    calls: AtomicUsize,
}

impl MockVerifier {
    /// A verifier with the given behavior
    pub fn new(behavior: VerifierBehavior) -> Self {
        Self {
            behavior,
            calls: AtomicUsize::new(0),
        }
    }

    /// The number of submissions received
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Verifier for MockVerifier {
    async fn verify(
        &self,
        request: VerificationRequest<'_>,
    ) -> Result<VerificationStatus, VerificationError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        match self.behavior {
            VerifierBehavior::Verify => Ok(VerificationStatus::Verified {
                url: format!("https://explorer/address/{}#code", request.address),
            }),
            VerifierBehavior::AlreadyVerified => {
                Ok(VerificationStatus::AlreadyVerified { url: None })
            }
            VerifierBehavior::Unavailable => {
                Err(VerificationError::Transient("503 Service Unavailable".to_string()))
            }
            VerifierBehavior::Reject => {
                Err(VerificationError::Rejected("Fail - Unable to verify".to_string()))
            }
        }
    }
}

/// Write a hardhat artifact for `name` into the artifact directory of `task_id`,
/// with a constructor taking `arity` addresses
pub fn write_artifact(root: &Path, task_id: &str, name: &str, arity: usize) {
    let inputs: Vec<_> = (0..arity)
        .map(|i| {
            serde_json::json!({
                "name": format!("arg{i}"),
                "type": "address",
                "internalType": "address"
            })
        })
        .collect();
    let artifact = serde_json::json!({
        "contractName": name,
        "sourceName": format!("contracts/{name}.sol"),
        "abi": [{ "type": "constructor", "stateMutability": "nonpayable", "inputs": inputs }],
        "bytecode": "0x608060405234801561001057600080fd5b50",
        "deployedBytecode": "0x6080604052",
        "linkReferences": {}
    });

    let dir = root.join(task_id).join("artifact");
    fs::create_dir_all(&dir).unwrap();
    fs::write(
        dir.join(format!("{name}.json")),
        serde_json::to_string_pretty(&artifact).unwrap(),
    )
    .unwrap();
}

/// The settings used by the tests: goerli, a temporary deployments directory,
/// and two verification attempts with no delay between them
pub fn settings(dir: &TempDir) -> DeploySettings {
    DeploySettings::new(Network::Goerli)
        .with_deployments_dir(dir.path())
        .with_verification(VerificationSettings {
            attempts: 2,
            retry_delay: Duration::ZERO,
        })
}

/// An environment over `dir` with the given catalog and collaborators
pub fn env(
    dir: &TempDir,
    catalog: TaskCatalog,
    client: Option<Arc<MockChainClient>>,
    verifier: Option<Arc<MockVerifier>>,
) -> Arc<TaskEnv> {
    let mut env = TaskEnv::new(settings(dir)).with_catalog(catalog);
    if let Some(client) = client {
        env = env.with_client(client);
    }
    if let Some(verifier) = verifier {
        env = env.with_verifier(verifier);
    }
    Arc::new(env)
}
