//! The weighted pool factory

use async_trait::async_trait;
use deployments::{DeployError, Param, RawInput, RunOptions, Task, TaskDefinition, TaskRef};

use crate::{
    constants::DAY,
    tasks::{PROTOCOL_FEES_PROVIDER_TASK, VAULT_TASK, WEIGHTED_POOL_TASK},
};

/// Deploys `WeightedPoolFactory`
pub struct WeightedPoolTask;

#[async_trait]
impl TaskDefinition for WeightedPoolTask {
    fn id(&self) -> &str {
        WEIGHTED_POOL_TASK
    }

    fn input(&self) -> RawInput {
        RawInput::new()
            .with("Vault", TaskRef::inherit(VAULT_TASK))
            .with(
                "ProtocolFeePercentagesProvider",
                TaskRef::inherit(PROTOCOL_FEES_PROVIDER_TASK),
            )
            .with("initialPauseWindowDuration", 270 * DAY)
            .with("bufferPeriodDuration", 90 * DAY)
    }

    async fn run(&self, task: &Task, options: &RunOptions) -> Result<(), DeployError> {
        let input = task.input()?;
        let args: [Param; 4] = [
            input.address("Vault")?.into(),
            input.address("ProtocolFeePercentagesProvider")?.into(),
            input.uint("initialPauseWindowDuration")?.into(),
            input.uint("bufferPeriodDuration")?.into(),
        ];
        let deployed = task
            .deploy_and_verify("WeightedPoolFactory", &args, &options.deploy_options())
            .await;
        options.tolerate(deployed)?;
        Ok(())
    }
}
