//! Tasks: named deployment units bound to a network and a mode.
//!
//! A [`Task`] is a disposable view over durable state. Two tasks with the same
//! id and network read and write the same output record no matter how many
//! times they are instantiated; all the state they share lives in the
//! [`OutputStore`] of their [`TaskEnv`].

use std::{
    fmt,
    path::PathBuf,
    sync::{
        atomic::{AtomicU64, Ordering},
        Arc, Mutex,
    },
};

use alloy_primitives::Address;
use tracing::{debug, error, info, info_span, warn, Instrument};

use crate::{
    artifact::{Artifact, Libraries},
    catalog::{RunOptions, TaskCatalog},
    client::{ChainClient, ContractHandle, DeployRequest},
    constants::{ARTIFACT_DIR, JSON_EXTENSION},
    dispatcher::{plan, DeployAction},
    errors::DeployError,
    input::{Input, Param},
    mode::TaskMode,
    network::Network,
    settings::DeploySettings,
    store::{Output, OutputStore, OutputTarget},
    verifier::{verify_with_retries, VerificationRequest, VerificationStatus, Verifier},
};

/// The environment shared by every task of a run
pub struct TaskEnv {
    /// The run's settings
    settings: DeploySettings,
    /// The store of output records under the deployments directory
    store: OutputStore,
    /// The declared tasks
    catalog: TaskCatalog,
    /// The chain client, required by tasks that deploy or check
    client: Option<Arc<dyn ChainClient>>,
    /// The verification service, verification is skipped without one
    verifier: Option<Arc<dyn Verifier>>,
}

impl TaskEnv {
    /// Create an environment with an empty catalog and no capabilities
    pub fn new(settings: DeploySettings) -> Self {
        let store = OutputStore::new(settings.deployments_dir.clone());
        Self {
            settings,
            store,
            catalog: TaskCatalog::new(),
            client: None,
            verifier: None,
        }
    }

    /// Use the given task catalog
    pub fn with_catalog(mut self, catalog: TaskCatalog) -> Self {
        self.catalog = catalog;
        self
    }

    /// Use the given chain client
    pub fn with_client(mut self, client: Arc<dyn ChainClient>) -> Self {
        self.client = Some(client);
        self
    }

    /// Use the given verification service
    pub fn with_verifier(mut self, verifier: Arc<dyn Verifier>) -> Self {
        self.verifier = Some(verifier);
        self
    }

    /// The run's settings
    pub fn settings(&self) -> &DeploySettings {
        &self.settings
    }

    /// The output store
    pub fn store(&self) -> &OutputStore {
        &self.store
    }

    /// The declared tasks
    pub fn catalog(&self) -> &TaskCatalog {
        &self.catalog
    }

    /// The chain client, failing if none is configured
    pub fn client(&self) -> Result<&Arc<dyn ChainClient>, DeployError> {
        self.client
            .as_ref()
            .ok_or(DeployError::MissingCapability("chain client"))
    }

    /// The verification service, if any
    pub fn verifier(&self) -> Option<&Arc<dyn Verifier>> {
        self.verifier.as_ref()
    }

    /// Instantiate a task on the configured network
    pub fn task(self: &Arc<Self>, id: &str, mode: TaskMode) -> Task {
        Task::new(self.clone(), id, mode, None)
    }

    /// Instantiate a task on `network`
    pub fn task_on(self: &Arc<Self>, id: &str, mode: TaskMode, network: Network) -> Task {
        Task::new(self.clone(), id, mode, Some(network))
    }
}

impl fmt::Debug for TaskEnv {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TaskEnv")
            .field("settings", &self.settings)
            .field("catalog", &self.catalog)
            .field("client", &self.client.is_some())
            .field("verifier", &self.verifier.is_some())
            .finish()
    }
}

/// Which output record to read, and whether it must exist
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct OutputQuery {
    /// Fail with [`DeployError::NotFound`] if the record does not exist
    pub ensure: bool,
    /// Read the record of this network rather than the task's own record
    pub network: Option<Network>,
}

impl Default for OutputQuery {
    fn default() -> Self {
        Self {
            ensure: true,
            network: None,
        }
    }
}

impl OutputQuery {
    /// Read the task's own record, returning an empty output if it does not exist
    pub fn optional() -> Self {
        Self {
            ensure: false,
            network: None,
        }
    }

    /// Read the record of `network`, which must exist
    pub fn ensure_on(network: Network) -> Self {
        Self {
            ensure: true,
            network: Some(network),
        }
    }
}

/// Options for a single deployment
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct DeployOptions {
    /// The account to deploy from, the chain client's signer if unset
    pub from: Option<Address>,
    /// Redeploy even if the contract is already recorded
    pub force: bool,
    /// The libraries to link the bytecode against
    pub libs: Libraries,
}

impl DeployOptions {
    /// Link the library `name` at `address`
    pub fn with_library(mut self, name: impl Into<String>, address: Address) -> Self {
        self.libs.insert(name.into(), address);
        self
    }
}

/// A named deployment unit bound to a network and a mode
pub struct Task {
    /// The id of the task
    id: String,
    /// The execution mode
    mode: TaskMode,
    /// The network the task runs on
    network: Network,
    /// The shared environment
    env: Arc<TaskEnv>,
    /// The resolved input, once resolved
    input: Mutex<Option<Arc<Input>>>,
    /// The number of contracts checked so far, used to predict CREATE addresses
    checked: AtomicU64,
}

impl Task {
    /// Instantiate a task. Without an explicit network, the task runs on the
    /// network configured in `env`.
    pub fn new(env: Arc<TaskEnv>, id: &str, mode: TaskMode, network: Option<Network>) -> Self {
        let network = network.unwrap_or(env.settings().network);
        Self {
            id: id.to_string(),
            mode,
            network,
            env,
            input: Mutex::new(None),
            checked: AtomicU64::new(0),
        }
    }

    /// The id of the task
    pub fn id(&self) -> &str {
        &self.id
    }

    /// The execution mode of the task
    pub fn mode(&self) -> TaskMode {
        self.mode
    }

    /// The network the task runs on
    pub fn network(&self) -> Network {
        self.network
    }

    /// The shared environment
    pub fn env(&self) -> &Arc<TaskEnv> {
        &self.env
    }

    /// The directory of the task
    pub fn dir(&self) -> PathBuf {
        self.env.store().task_dir(&self.id)
    }

    /// The record the task's own saves are written to
    fn own_target(&self) -> OutputTarget {
        match self.mode {
            TaskMode::Test => OutputTarget::Test,
            _ => OutputTarget::Network(self.network),
        }
    }

    /// The task's input, resolved on first access
    pub fn input(&self) -> Result<Arc<Input>, DeployError> {
        let mut cached = self.input.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
        if let Some(input) = cached.as_ref() {
            return Ok(input.clone());
        }

        let definition = self
            .env
            .catalog()
            .get(&self.id)
            .ok_or_else(|| DeployError::UnknownTask(self.id.clone()))?;
        let input = Arc::new(definition.input().resolve(&self.env, &self.id, self.network)?);
        *cached = Some(input.clone());
        Ok(input)
    }

    /// Read one of the task's output records.
    ///
    /// Without an explicit network, reads the test record in TEST mode and the
    /// record of the task's network otherwise.
    pub fn output(&self, query: OutputQuery) -> Result<Output, DeployError> {
        let target = query
            .network
            .map(OutputTarget::Network)
            .unwrap_or_else(|| self.own_target());
        self.env.store().read(&self.id, target, query.ensure)
    }

    /// Merge `entries` into the task's own output record
    pub fn save(&self, entries: &Output) -> Result<(), DeployError> {
        match self.mode {
            TaskMode::Check => {
                debug!("not saving {:?} in CHECK mode", entries.keys());
                Ok(())
            }
            TaskMode::ReadOnly => Err(DeployError::InvalidMode {
                operation: "save",
                mode: self.mode,
            }),
            TaskMode::Live | TaskMode::Test => {
                self.env.store().merge(&self.id, self.own_target(), entries)?;
                Ok(())
            }
        }
    }

    /// Load the compiled artifact of `name` from the task's directory
    pub fn artifact(&self, name: &str) -> Result<Artifact, DeployError> {
        let path = self
            .dir()
            .join(ARTIFACT_DIR)
            .join(format!("{name}.{JSON_EXTENSION}"));
        Artifact::load(name, &path)
    }

    /// Deploy `name` with the given constructor arguments.
    ///
    /// If the contract is already recorded and redeployment is not forced, the
    /// recorded address is reused without sending a transaction. In CHECK mode the
    /// contract is statically checked and a handle at its predicted address is
    /// returned.
    pub async fn deploy(
        &self,
        name: &str,
        args: &[Param],
        options: &DeployOptions,
    ) -> Result<ContractHandle, DeployError> {
        let existing = if self.mode.can_deploy() {
            self.output(OutputQuery::optional())?.get(name).copied()
        } else {
            None
        };

        match plan(self.mode, existing, options.force)? {
            DeployAction::Check => self.check(name, args, options).await,
            DeployAction::Reuse(address) => {
                info!("{name} already deployed at {address}");
                self.instance_at(name, address).await
            }
            DeployAction::Deploy => self.deploy_new(name, args, options).await,
        }
    }

    /// Deploy `name` and then verify its source.
    ///
    /// Verification failures are logged and never fail the deployment.
    pub async fn deploy_and_verify(
        &self,
        name: &str,
        args: &[Param],
        options: &DeployOptions,
    ) -> Result<ContractHandle, DeployError> {
        let handle = self.deploy(name, args, options).await?;
        self.verify(name, handle.address, args, &options.libs).await;
        Ok(handle)
    }

    /// Verify the source of `name` at `address`.
    ///
    /// Only LIVE tasks verify. Failures are logged and reported as `None`.
    pub async fn verify(
        &self,
        name: &str,
        address: Address,
        args: &[Param],
        libs: &Libraries,
    ) -> Option<VerificationStatus> {
        if !self.mode.verifies() {
            return None;
        }
        let Some(verifier) = self.env.verifier() else {
            warn!("no verifier configured, skipping verification of {name}");
            return None;
        };

        let artifact = match self.artifact(name) {
            Ok(artifact) => artifact,
            Err(e) => {
                error!("failed to verify {name} at {address}: {e}");
                return None;
            }
        };
        let request = VerificationRequest {
            task_id: &self.id,
            network: self.network,
            name,
            address,
            artifact: &artifact,
            args,
            libs,
        };

        let settings = &self.env.settings().verification;
        match verify_with_retries(verifier.as_ref(), request, settings).await {
            Ok(status) => {
                info!("{name} {status}");
                Some(status)
            }
            Err(e) => {
                error!("failed to verify {name} at {address}: {e}");
                None
            }
        }
    }

    /// Bind `name` to `address` without deploying
    pub async fn instance_at(
        &self,
        name: &str,
        address: Address,
    ) -> Result<ContractHandle, DeployError> {
        match self.env.client() {
            Ok(client) => client
                .instance_at(name, address)
                .await
                .map_err(DeployError::Chain),
            Err(_) => Ok(ContractHandle::new(name, address)),
        }
    }

    /// A handle to the recorded deployment of `name`
    pub async fn deployed_instance(&self, name: &str) -> Result<ContractHandle, DeployError> {
        let output = self.output(OutputQuery::default())?;
        let address = output.get(name).copied().ok_or_else(|| DeployError::NotFound {
            task: self.id.clone(),
            target: self.own_target(),
        })?;
        self.instance_at(name, address).await
    }

    /// Run the task's declared deployment procedure
    pub async fn run(&self, options: &RunOptions) -> Result<(), DeployError> {
        if self.mode == TaskMode::ReadOnly {
            return Err(DeployError::InvalidMode {
                operation: "run",
                mode: self.mode,
            });
        }
        let definition = self
            .env
            .catalog()
            .get(&self.id)
            .ok_or_else(|| DeployError::UnknownTask(self.id.clone()))?;

        let span = info_span!("task", id = %self.id, network = %self.network, mode = %self.mode);
        async {
            info!("running task");
            definition.run(self, options).await?;
            info!("task complete");
            Ok::<_, DeployError>(())
        }
        .instrument(span)
        .await
    }

    /// Submit a deployment transaction and record the new address
    async fn deploy_new(
        &self,
        name: &str,
        args: &[Param],
        options: &DeployOptions,
    ) -> Result<ContractHandle, DeployError> {
        let client = self.env.client()?;
        if self.mode == TaskMode::Live {
            self.ensure_network(client.as_ref()).await?;
        }

        let artifact = self.artifact(name)?;
        let bytecode = artifact.linked_bytecode(&options.libs)?;
        let request = DeployRequest {
            name,
            artifact: &artifact,
            bytecode: &bytecode,
            args,
            from: options.from,
        };
        let receipt = client
            .deploy(request)
            .await
            .map_err(|source| DeployError::Transaction {
                contract: name.to_string(),
                source,
            })?;
        info!("deployed {name} at {}", receipt.address);

        // Persist before anything else can fail
        self.save(&Output::from([(name.to_string(), receipt.address)]))?;
        if self.mode == TaskMode::Live {
            self.env
                .store()
                .record_transaction(&self.id, self.network, name, receipt.tx_hash)?;
        }

        Ok(ContractHandle::new(name, receipt.address))
    }

    /// Statically check that `name` could be deployed with `args`, returning a
    /// handle at the address it would be deployed to
    async fn check(
        &self,
        name: &str,
        args: &[Param],
        options: &DeployOptions,
    ) -> Result<ContractHandle, DeployError> {
        let check_err = |reason: String| DeployError::Check {
            contract: name.to_string(),
            reason,
        };

        let artifact = self.artifact(name).map_err(|e| check_err(e.to_string()))?;
        artifact
            .linked_bytecode(&options.libs)
            .map_err(|e| check_err(e.to_string()))?;
        let arity = artifact.constructor_arity();
        if arity != args.len() {
            return Err(check_err(format!(
                "constructor takes {arity} arguments, {} given",
                args.len()
            )));
        }

        let client = self.env.client()?;
        let from = options.from.unwrap_or_else(|| client.signer());
        let nonce = client
            .transaction_count(from)
            .await
            .map_err(DeployError::Chain)?;
        let offset = self.checked.fetch_add(1, Ordering::SeqCst);
        let address = from.create(nonce + offset);

        info!("{name} can be deployed, predicted address {address}");
        Ok(ContractHandle::new(name, address))
    }

    /// Fail if the chain client is connected to a different network than the task's
    async fn ensure_network(&self, client: &dyn ChainClient) -> Result<(), DeployError> {
        let chain_id = client.chain_id().await.map_err(DeployError::Chain)?;
        if chain_id != self.network.chain_id() {
            return Err(DeployError::NetworkMismatch {
                chain_id,
                network: self.network,
            });
        }
        Ok(())
    }
}

impl fmt::Debug for Task {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Task")
            .field("id", &self.id)
            .field("mode", &self.mode)
            .field("network", &self.network)
            .finish()
    }
}
