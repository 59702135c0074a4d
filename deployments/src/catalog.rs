//! The task declaration interface and the catalog of declared tasks

use std::{fmt, sync::Arc};

use alloy_primitives::Address;
use async_trait::async_trait;
use tracing::error;

use crate::{
    errors::DeployError,
    input::RawInput,
    task::{DeployOptions, Task},
};

/// Options controlling a single task run
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct RunOptions {
    /// Redeploy contracts even if they are already recorded
    pub force: bool,
    /// The account to deploy from, the chain client's signer if unset
    pub from: Option<Address>,
    /// Continue past failed deployment transactions instead of aborting the run
    pub continue_on_error: bool,
}

impl RunOptions {
    /// The deploy options carrying `force` and `from`
    pub fn deploy_options(&self) -> DeployOptions {
        DeployOptions {
            from: self.from,
            force: self.force,
            ..Default::default()
        }
    }

    /// Apply the failure policy to the result of a deployment step.
    ///
    /// A recoverable error is logged and swallowed if the run opted into
    /// continuing on error; every other error propagates.
    pub fn tolerate<T>(&self, result: Result<T, DeployError>) -> Result<Option<T>, DeployError> {
        match result {
            Ok(value) => Ok(Some(value)),
            Err(e) if self.continue_on_error && e.is_recoverable() => {
                error!("continuing after failed step: {e}");
                Ok(None)
            }
            Err(e) => Err(e),
        }
    }
}

/// A deployment procedure, declared once and driven by [`Task::run`]
#[async_trait]
pub trait TaskDefinition: Send + Sync {
    /// The id of the task
    fn id(&self) -> &str;

    /// The raw input specification of the task
    fn input(&self) -> RawInput {
        RawInput::new()
    }

    /// Deploy the task's contracts through `task`
    async fn run(&self, task: &Task, options: &RunOptions) -> Result<(), DeployError>;
}

/// The declared tasks, in declaration order
#[derive(Clone, Default)]
pub struct TaskCatalog {
    /// The task definitions
    tasks: Vec<Arc<dyn TaskDefinition>>,
}

impl TaskCatalog {
    /// Create an empty catalog
    pub fn new() -> Self {
        Self::default()
    }

    /// Declare a task, replacing any previous declaration with the same id
    pub fn register(&mut self, task: impl TaskDefinition + 'static) {
        let task: Arc<dyn TaskDefinition> = Arc::new(task);
        match self.tasks.iter_mut().find(|t| t.id() == task.id()) {
            Some(existing) => *existing = task,
            None => self.tasks.push(task),
        }
    }

    /// Declare a task, builder style
    pub fn with(mut self, task: impl TaskDefinition + 'static) -> Self {
        self.register(task);
        self
    }

    /// Look up a task definition by id
    pub fn get(&self, id: &str) -> Option<Arc<dyn TaskDefinition>> {
        self.tasks.iter().find(|t| t.id() == id).cloned()
    }

    /// The ids of the declared tasks, in declaration order
    pub fn ids(&self) -> impl Iterator<Item = &str> {
        self.tasks.iter().map(|t| t.id())
    }

    /// Whether no task is declared
    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }
}

impl fmt::Debug for TaskCatalog {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.ids()).finish()
    }
}

#[cfg(test)]
mod tests {
    use async_trait::async_trait;

    use super::{RunOptions, TaskCatalog, TaskDefinition};
    use crate::{errors::DeployError, task::Task};

    struct Noop(&'static str);

    #[async_trait]
    impl TaskDefinition for Noop {
        fn id(&self) -> &str {
            self.0
        }

        async fn run(&self, _task: &Task, _options: &RunOptions) -> Result<(), DeployError> {
            Ok(())
        }
    }

    fn failed_tx() -> DeployError {
        DeployError::Transaction {
            contract: "Vault".to_string(),
            source: "reverted".into(),
        }
    }

    #[test]
    fn test_catalog_preserves_declaration_order() {
        let catalog = TaskCatalog::new()
            .with(Noop("20230117-vault"))
            .with(Noop("20230117-weighted-pool-v2"))
            .with(Noop("20230117-vault"));

        let ids: Vec<_> = catalog.ids().collect();
        assert_eq!(ids, ["20230117-vault", "20230117-weighted-pool-v2"]);
        assert!(catalog.get("20230117-weighted-pool-v2").is_some());
        assert!(catalog.get("20230124-fee-distributor").is_none());
    }

    #[test]
    fn test_tolerate_aborts_by_default() {
        let options = RunOptions::default();
        assert!(options.tolerate::<()>(Err(failed_tx())).is_err());
        assert_eq!(options.tolerate(Ok(1)).unwrap(), Some(1));
    }

    #[test]
    fn test_tolerate_continues_on_transaction_errors() {
        let options = RunOptions {
            continue_on_error: true,
            ..Default::default()
        };
        assert_eq!(options.tolerate::<()>(Err(failed_tx())).unwrap(), None);

        let unrecoverable = DeployError::UnknownTask("x".to_string());
        assert!(options.tolerate::<()>(Err(unrecoverable)).is_err());
    }
}
