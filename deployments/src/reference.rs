//! Lazy references to the outputs of other tasks

use std::{
    fmt,
    sync::{Arc, OnceLock},
};

use alloy_primitives::Address;

use crate::{
    errors::DeployError,
    mode::TaskMode,
    network::Network,
    store::OutputTarget,
    task::{OutputQuery, Task, TaskEnv},
};

/// How a reference chooses the network whose record it reads
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum NetworkBinding {
    /// Read the record of whichever network the resolving task is running on
    Inherit,
    /// Always read the record of the given network
    Pinned(Network),
}

/// A reference to a field of another task's output.
///
/// Resolving the reference instantiates a read-only view of the referenced task,
/// which never deploys, and reads the requested field from its output record.
pub struct TaskRef {
    /// The id of the referenced task
    task_id: String,
    /// The network whose record is read
    binding: NetworkBinding,
    /// The output field to read, defaulting to the input key the reference appears under
    field: Option<String>,
    /// The read-only view of the referenced task, instantiated on first resolution
    view: OnceLock<Task>,
}

impl TaskRef {
    /// Create a reference with an explicit network binding
    pub fn new(task_id: impl Into<String>, binding: NetworkBinding) -> Self {
        Self {
            task_id: task_id.into(),
            binding,
            field: None,
            view: OnceLock::new(),
        }
    }

    /// Create a reference reading the record of the resolving task's network
    pub fn inherit(task_id: impl Into<String>) -> Self {
        Self::new(task_id, NetworkBinding::Inherit)
    }

    /// Create a reference that always reads the record of `network`
    pub fn pinned(task_id: impl Into<String>, network: Network) -> Self {
        Self::new(task_id, NetworkBinding::Pinned(network))
    }

    /// Read `field` instead of the input key the reference appears under
    pub fn field(mut self, field: impl Into<String>) -> Self {
        self.field = Some(field.into());
        self
    }

    /// The id of the referenced task
    pub fn task_id(&self) -> &str {
        &self.task_id
    }

    /// The network binding of the reference
    pub fn binding(&self) -> NetworkBinding {
        self.binding
    }

    /// The mode the referenced task is instantiated in
    pub fn mode(&self) -> TaskMode {
        TaskMode::ReadOnly
    }

    /// The network whose record is read when resolved by a task on `caller_network`
    pub fn network(&self, caller_network: Network) -> Network {
        match self.binding {
            NetworkBinding::Inherit => caller_network,
            NetworkBinding::Pinned(network) => network,
        }
    }

    /// Resolve the reference on behalf of a task running on `caller_network`.
    ///
    /// Reads the explicit field if one was given, `default_field` otherwise. Fails
    /// with [`DeployError::NotFound`] if the referenced task has no record on the
    /// network, and with [`DeployError::UnresolvedDependency`] if the record lacks
    /// the field.
    pub fn resolve(
        &self,
        env: &Arc<TaskEnv>,
        caller_network: Network,
        default_field: &str,
    ) -> Result<Address, DeployError> {
        let network = self.network(caller_network);
        let field = self.field.as_deref().unwrap_or(default_field);

        let fresh;
        let view = match self.view.get() {
            Some(view) if view.network() == network => view,
            Some(_) => {
                fresh = Task::new(env.clone(), &self.task_id, self.mode(), Some(network));
                &fresh
            }
            None => self
                .view
                .get_or_init(|| Task::new(env.clone(), &self.task_id, self.mode(), Some(network))),
        };

        let output = view.output(OutputQuery::ensure_on(network))?;
        output
            .get(field)
            .copied()
            .ok_or_else(|| DeployError::UnresolvedDependency {
                task: self.task_id.clone(),
                target: OutputTarget::Network(network),
                field: field.to_string(),
            })
    }
}

impl Clone for TaskRef {
    fn clone(&self) -> Self {
        Self {
            task_id: self.task_id.clone(),
            binding: self.binding,
            field: self.field.clone(),
            view: OnceLock::new(),
        }
    }
}

impl fmt::Debug for TaskRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TaskRef")
            .field("task_id", &self.task_id)
            .field("binding", &self.binding)
            .field("field", &self.field)
            .finish()
    }
}

impl PartialEq for TaskRef {
    fn eq(&self, other: &Self) -> bool {
        self.task_id == other.task_id && self.binding == other.binding && self.field == other.field
    }
}
