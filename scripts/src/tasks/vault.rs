//! The vault, its temporary authorizer, and the fees collector it creates

use alloy_primitives::address;
use async_trait::async_trait;
use deployments::{
    artifact::Libraries, store::Output, DeployError, Network, Param, RawInput, RunOptions, Task,
    TaskDefinition,
};

use crate::{
    constants::MONTH,
    solidity::getProtocolFeesCollectorCall,
    tasks::VAULT_TASK,
    utils::{read_address, reads_side_effects},
};

/// Deploys `MockBasicAuthorizer` and `Vault`, and records `ProtocolFeesCollector`
pub struct VaultTask;

#[async_trait]
impl TaskDefinition for VaultTask {
    fn id(&self) -> &str {
        VAULT_TASK
    }

    fn input(&self) -> RawInput {
        RawInput::new()
            .with("pauseWindowDuration", 3 * MONTH)
            .with("bufferPeriodDuration", MONTH)
            .with_override(
                Network::Bsc,
                "WETH",
                address!("bb4cdb9cbd36b01bd1cbaebf2de08d9173bc095c"),
            )
            .with_override(
                Network::Goerli,
                "WETH",
                address!("e4e96cf369d4d604bedc4d7962f94d53e4b5e3c6"),
            )
            .with_override(
                Network::Arbitrum,
                "WETH",
                address!("82af49447d8a07e3bd95bd0d56f35241523fbab1"),
            )
            .require("WETH")
    }

    async fn run(&self, task: &Task, options: &RunOptions) -> Result<(), DeployError> {
        let input = task.input()?;
        let deploy = options.deploy_options();
        let admin = match deploy.from {
            Some(from) => from,
            None => task.env().client()?.signer(),
        };

        let authorizer = task
            .deploy("MockBasicAuthorizer", &[Param::from(admin)], &deploy)
            .await;
        let Some(authorizer) = options.tolerate(authorizer)? else {
            return Ok(());
        };

        let args: [Param; 4] = [
            authorizer.address.into(),
            input.address("WETH")?.into(),
            input.uint("pauseWindowDuration")?.into(),
            input.uint("bufferPeriodDuration")?.into(),
        ];
        let vault = task.deploy_and_verify("Vault", &args, &deploy).await;
        let Some(vault) = options.tolerate(vault)? else {
            return Ok(());
        };
        if !reads_side_effects(task) {
            return Ok(());
        }
        // The vault creates the fees collector in its constructor
        let collector =
            read_address(task, vault.address, getProtocolFeesCollectorCall {}).await?;
        task.save(&Output::from([("ProtocolFeesCollector".to_string(), collector)]))?;
        task.verify(
            "ProtocolFeesCollector",
            collector,
            &[Param::from(vault.address)],
            &Libraries::new(),
        )
        .await;

        Ok(())
    }
}
