//! The vote-escrow token of the gauge system

use alloy_primitives::address;
use async_trait::async_trait;
use deployments::{
    DeployError, Network, Param, RawInput, RunOptions, Task, TaskDefinition, TaskRef,
};

use crate::tasks::{AUTHORIZERS_TASK, VOTING_ESCROW_TASK};

/// Deploys `VotingEscrow` over the network's 80/20 pool token
pub struct VotingEscrowTask;

#[async_trait]
impl TaskDefinition for VotingEscrowTask {
    fn id(&self) -> &str {
        VOTING_ESCROW_TASK
    }

    fn input(&self) -> RawInput {
        RawInput::new()
            .with("AuthorizerAdaptor", TaskRef::inherit(AUTHORIZERS_TASK))
            .with("name", "Vote Escrowed Vertek VPT")
            .with("symbol", "veVRTK")
            .with_override(
                Network::Bsc,
                "BPT",
                address!("dd64e2ec144571b4320f7bfb14a56b2b2cbf37ad"),
            )
            .with_override(
                Network::Goerli,
                "BPT",
                address!("d0f30b415c65b99904caf716abc3da23f57d3cdd"),
            )
            .require("BPT")
    }

    async fn run(&self, task: &Task, options: &RunOptions) -> Result<(), DeployError> {
        let input = task.input()?;
        let args: [Param; 4] = [
            input.address("BPT")?.into(),
            input.string("name")?.into(),
            input.string("symbol")?.into(),
            input.address("AuthorizerAdaptor")?.into(),
        ];
        let deployed = task
            .deploy_and_verify("VotingEscrow", &args, &options.deploy_options())
            .await;
        options.tolerate(deployed)?;
        Ok(())
    }
}
