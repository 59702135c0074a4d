//! Implementations of the CLI commands

use std::sync::Arc;

use deployments::{
    store::OutputTarget, DeployError, OutputQuery, RunOptions, TaskCatalog, TaskEnv, TaskMode,
};
use tracing::{error, info};

use crate::errors::ScriptError;

/// Run the given tasks in order, stopping at the first failure.
///
/// Every id is checked against the catalog before any task runs.
pub async fn run_tasks(
    env: &Arc<TaskEnv>,
    ids: &[String],
    mode: TaskMode,
    options: &RunOptions,
) -> Result<(), ScriptError> {
    if let Some(unknown) = ids.iter().find(|id| env.catalog().get(id).is_none()) {
        return Err(DeployError::UnknownTask(unknown.clone()).into());
    }

    for id in ids {
        let task = env.task(id, mode);
        if let Err(e) = task.run(options).await {
            error!("task {id} failed: {e}");
            return Err(e.into());
        }
    }

    info!("ran {} task(s)", ids.len());
    Ok(())
}

/// Print the output record of a task as pretty JSON
pub fn print_output(env: &Arc<TaskEnv>, id: &str, test: bool) -> Result<(), ScriptError> {
    println!("{}", output_json(env, id, test)?);
    Ok(())
}

/// Print the ids of the declared tasks
pub fn list(catalog: &TaskCatalog) {
    for id in catalog.ids() {
        println!("{id}");
    }
}

/// The output record of a task, read without deploying, as pretty JSON
fn output_json(env: &Arc<TaskEnv>, id: &str, test: bool) -> Result<String, ScriptError> {
    let output = if test {
        env.store().read(id, OutputTarget::Test, true /* ensure */)?
    } else {
        env.task(id, TaskMode::ReadOnly).output(OutputQuery::default())?
    };
    serde_json::to_string_pretty(&output).map_err(|e| ScriptError::Serde(e.to_string()))
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use alloy_primitives::{address, Address};
    use deployments::{
        settings::DeploySettings,
        store::{Output, OutputTarget},
        DeployError, Network, RunOptions, TaskEnv, TaskMode,
    };

    use super::{output_json, run_tasks};
    use crate::{errors::ScriptError, tasks::catalog};

    const VAULT: Address = address!("ba12222222228d8ba445958a75a0704d566bf2c8");

    fn env(dir: &std::path::Path) -> Arc<TaskEnv> {
        let settings = DeploySettings::new(Network::Goerli).with_deployments_dir(dir);
        Arc::new(TaskEnv::new(settings).with_catalog(catalog()))
    }

    #[tokio::test]
    async fn test_unknown_ids_fail_before_running() {
        let dir = tempfile::tempdir().unwrap();
        let env = env(dir.path());
        let ids = ["20230117-vault".to_string(), "no-such-task".to_string()];

        let err = run_tasks(&env, &ids, TaskMode::Live, &RunOptions::default()).await.unwrap_err();
        assert!(matches!(
            err,
            ScriptError::Deploy(DeployError::UnknownTask(ref id)) if id == "no-such-task"
        ));
        // The vault task never ran, so nothing was recorded
        assert!(!dir.path().join("20230117-vault").join("output").exists());
    }

    #[test]
    fn test_output_json() {
        let dir = tempfile::tempdir().unwrap();
        let env = env(dir.path());
        let record = Output::from([("Vault".to_string(), VAULT)]);
        let target = OutputTarget::Network(Network::Goerli);
        env.store().merge("20230117-vault", target, &record).unwrap();

        let json = output_json(&env, "20230117-vault", false /* test */).unwrap();
        let parsed: Output = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, record);
    }

    #[test]
    fn test_missing_output() {
        let dir = tempfile::tempdir().unwrap();
        let env = env(dir.path());

        let err = output_json(&env, "20230117-vault", true /* test */).unwrap_err();
        assert!(matches!(err, ScriptError::Deploy(DeployError::NotFound { .. })));
    }
}
