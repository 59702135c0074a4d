//! The timelock authorizer and its adaptors

use async_trait::async_trait;
use deployments::{
    artifact::Libraries, store::Output, DeployError, Param, RawInput, RunOptions, Task,
    TaskDefinition, TaskRef,
};

use crate::{
    solidity::getExecutorCall,
    tasks::{AUTHORIZERS_TASK, VAULT_TASK},
    utils::{read_address, reads_side_effects},
};

/// Deploys `AuthorizerAdaptor`, `AuthorizerAdaptorEntrypoint`, and
/// `TimelockAuthorizer`, and records the `TimelockExecutor` the latter creates.
///
/// Every address is saved before any contract is verified.
pub struct AuthorizersTask;

#[async_trait]
impl TaskDefinition for AuthorizersTask {
    fn id(&self) -> &str {
        AUTHORIZERS_TASK
    }

    fn input(&self) -> RawInput {
        RawInput::new()
            .with("Vault", TaskRef::inherit(VAULT_TASK))
            .with("rootTransferDelay", 0u64)
    }

    async fn run(&self, task: &Task, options: &RunOptions) -> Result<(), DeployError> {
        let input = task.input()?;
        let deploy = options.deploy_options();
        let admin = match deploy.from {
            Some(from) => from,
            None => task.env().client()?.signer(),
        };
        let vault = input.address("Vault")?;

        let adaptor_args: [Param; 1] = [vault.into()];
        let adaptor = task
            .deploy("AuthorizerAdaptor", &adaptor_args, &deploy)
            .await;
        let Some(adaptor) = options.tolerate(adaptor)? else {
            return Ok(());
        };

        let entrypoint_args: [Param; 1] = [adaptor.address.into()];
        let entrypoint = task
            .deploy("AuthorizerAdaptorEntrypoint", &entrypoint_args, &deploy)
            .await;
        let Some(entrypoint) = options.tolerate(entrypoint)? else {
            return Ok(());
        };

        let authorizer_args: [Param; 3] = [
            admin.into(),
            entrypoint.address.into(),
            input.uint("rootTransferDelay")?.into(),
        ];
        let authorizer = task
            .deploy("TimelockAuthorizer", &authorizer_args, &deploy)
            .await;
        let Some(authorizer) = options.tolerate(authorizer)? else {
            return Ok(());
        };

        let executor = if reads_side_effects(task) {
            let executor = read_address(task, authorizer.address, getExecutorCall {}).await?;
            task.save(&Output::from([("TimelockExecutor".to_string(), executor)]))?;
            Some(executor)
        } else {
            None
        };

        let libs = Libraries::new();
        task.verify("AuthorizerAdaptor", adaptor.address, &adaptor_args, &libs)
            .await;
        task.verify(
            "AuthorizerAdaptorEntrypoint",
            entrypoint.address,
            &entrypoint_args,
            &libs,
        )
        .await;
        task.verify(
            "TimelockAuthorizer",
            authorizer.address,
            &authorizer_args,
            &libs,
        )
        .await;
        if let Some(executor) = executor {
            task.verify("TimelockExecutor", executor, &[], &libs).await;
        }

        Ok(())
    }
}
