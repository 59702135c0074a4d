//! The fee distributor paying out protocol fees to vote-escrow holders

use async_trait::async_trait;
use deployments::{
    DeployError, Network, Param, RawInput, RunOptions, Task, TaskDefinition, TaskRef,
};

use crate::tasks::{FEE_DISTRIBUTOR_TASK, VOTING_ESCROW_TASK};

/// Deploys `FeeDistributor`, which starts distributing at a per-network time
pub struct FeeDistributorTask;

#[async_trait]
impl TaskDefinition for FeeDistributorTask {
    fn id(&self) -> &str {
        FEE_DISTRIBUTOR_TASK
    }

    fn input(&self) -> RawInput {
        RawInput::new()
            .with("VotingEscrow", TaskRef::inherit(VOTING_ESCROW_TASK))
            .with_override(Network::Arbitrum, "startTime", 1_681_948_800u64)
            .with_override(Network::Bsc, "startTime", 1_674_691_200u64)
            .with_override(Network::Goerli, "startTime", 1_674_455_329u64)
            .require("startTime")
    }

    async fn run(&self, task: &Task, options: &RunOptions) -> Result<(), DeployError> {
        let input = task.input()?;
        let args: [Param; 2] = [
            input.address("VotingEscrow")?.into(),
            input.uint("startTime")?.into(),
        ];
        let deployed = task
            .deploy_and_verify("FeeDistributor", &args, &options.deploy_options())
            .await;
        options.tolerate(deployed)?;
        Ok(())
    }
}
