//! The provider of protocol fee percentages

use alloy_primitives::U256;
use async_trait::async_trait;
use deployments::{DeployError, Param, RawInput, RunOptions, Task, TaskDefinition, TaskRef};

use crate::{
    constants::ONE_FP,
    tasks::{PROTOCOL_FEES_PROVIDER_TASK, VAULT_TASK},
};

/// Deploys `ProtocolFeePercentagesProvider`
pub struct ProtocolFeesProviderTask;

#[async_trait]
impl TaskDefinition for ProtocolFeesProviderTask {
    fn id(&self) -> &str {
        PROTOCOL_FEES_PROVIDER_TASK
    }

    fn input(&self) -> RawInput {
        // 50% caps on both fee types
        let half = U256::from(ONE_FP / 2);
        RawInput::new()
            .with("Vault", TaskRef::inherit(VAULT_TASK))
            .with("maxYieldValue", half)
            .with("maxAUMValue", half)
    }

    async fn run(&self, task: &Task, options: &RunOptions) -> Result<(), DeployError> {
        let input = task.input()?;
        let args: [Param; 3] = [
            input.address("Vault")?.into(),
            input.uint("maxYieldValue")?.into(),
            input.uint("maxAUMValue")?.into(),
        ];
        let deployed = task
            .deploy_and_verify("ProtocolFeePercentagesProvider", &args, &options.deploy_options())
            .await;
        options.tolerate(deployed)?;
        Ok(())
    }
}
