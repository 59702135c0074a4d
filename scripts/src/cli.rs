//! Definitions of CLI arguments and commands for deploy scripts

use std::{path::PathBuf, sync::Arc};

use alloy_primitives::Address;
use clap::{Args, Parser, Subcommand, ValueEnum};
use deployments::{
    constants::DEFAULT_DEPLOYMENTS_DIR, settings::DeploySettings, Network, RunOptions, TaskEnv,
    TaskMode,
};

use crate::{
    commands::{list, print_output, run_tasks},
    constants::DEFAULT_RPC_URL,
    errors::ScriptError,
    etherscan::EtherscanVerifier,
    tasks::catalog,
    utils::{resolve_network, setup_client},
};

/// Run deployment tasks and inspect their outputs
#[derive(Parser, Debug)]
pub struct Cli {
    /// Network RPC URL
    #[arg(short, long, env = "RPC_URL", default_value = DEFAULT_RPC_URL)]
    pub rpc_url: String,

    /// Private key of the deployer
    #[arg(short, long, env = "PKEY", hide_env_values = true)]
    pub pkey: Option<String>,

    /// The network to run against, inferred from the RPC endpoint if omitted
    #[arg(short, long)]
    pub network: Option<Network>,

    /// The directory holding one subdirectory per task
    #[arg(long, default_value = DEFAULT_DEPLOYMENTS_DIR)]
    pub deployments_dir: PathBuf,

    /// API key of the network's block explorer, verification is skipped without one
    #[arg(long, env = "ETHERSCAN_API_KEY", hide_env_values = true)]
    pub etherscan_api_key: Option<String>,

    /// The command to execute
    #[command(subcommand)]
    pub command: Command,
}

/// The commands of the deploy scripts
#[derive(Subcommand, Debug)]
pub enum Command {
    /// Run tasks in the given order
    Run(RunArgs),
    /// Print the output record of a task
    Output(OutputArgs),
    /// List the declared tasks in declaration order
    List,
}

/// Run one or more tasks
#[derive(Args, Debug)]
pub struct RunArgs {
    /// The ids of the tasks to run, in order
    #[arg(short, long = "task", required = true, num_args = 1..)]
    pub tasks: Vec<String>,

    /// The mode to run the tasks in
    #[arg(short, long, value_enum, default_value_t = ModeArg::Live)]
    pub mode: ModeArg,

    /// Redeploy contracts even if they are already recorded
    #[arg(long)]
    pub force: bool,

    /// Continue past failed deployment transactions
    #[arg(long)]
    pub continue_on_error: bool,

    /// The account to deploy from, the deployer if unset
    #[arg(long)]
    pub from: Option<Address>,
}

impl RunArgs {
    /// The run options the arguments describe
    pub fn options(&self) -> RunOptions {
        RunOptions {
            force: self.force,
            from: self.from,
            continue_on_error: self.continue_on_error,
        }
    }
}

/// Print the output record of a task
#[derive(Args, Debug)]
pub struct OutputArgs {
    /// The id of the task
    #[arg(short, long)]
    pub task: String,

    /// Print the test record instead of the network's
    #[arg(long)]
    pub test: bool,
}

/// The modes a task can be run in from the command line
#[derive(ValueEnum, Copy, Clone, Debug, PartialEq, Eq)]
pub enum ModeArg {
    /// Deploy to the network and verify
    Live,
    /// Deploy, recording outputs in the test record
    Test,
    /// Check deployability without sending transactions
    Check,
}

impl From<ModeArg> for TaskMode {
    fn from(mode: ModeArg) -> Self {
        match mode {
            ModeArg::Live => TaskMode::Live,
            ModeArg::Test => TaskMode::Test,
            ModeArg::Check => TaskMode::Check,
        }
    }
}

impl Cli {
    /// Execute the parsed command
    pub async fn run(self) -> Result<(), ScriptError> {
        match &self.command {
            Command::List => {
                list(&catalog());
                Ok(())
            }
            Command::Output(args) => {
                let env = self.env().await?;
                print_output(&Arc::new(env), &args.task, args.test)
            }
            Command::Run(args) => {
                let pkey = self.pkey.as_deref().ok_or_else(|| {
                    ScriptError::ClientInitialization("no private key to run tasks with".into())
                })?;
                let client = setup_client(pkey, &self.rpc_url)?;
                let mut env = self.env().await?.with_client(Arc::new(client));
                if let Some(api_key) = self.etherscan_api_key.as_deref() {
                    let verifier = EtherscanVerifier::new(api_key, self.deployments_dir.clone());
                    env = env.with_verifier(Arc::new(verifier));
                }

                run_tasks(&Arc::new(env), &args.tasks, args.mode.into(), &args.options()).await
            }
        }
    }

    /// The task environment for the configured network and deployments directory
    async fn env(&self) -> Result<TaskEnv, ScriptError> {
        let network = resolve_network(self.network, &self.rpc_url).await?;
        let settings = DeploySettings::new(network).with_deployments_dir(&self.deployments_dir);
        Ok(TaskEnv::new(settings).with_catalog(catalog()))
    }
}

#[cfg(test)]
mod tests {
    use alloy_primitives::address;
    use clap::Parser;
    use deployments::{Network, TaskMode};

    use super::{Cli, Command, ModeArg};

    #[test]
    fn test_parse_run() {
        let cli = Cli::try_parse_from([
            "scripts",
            "--network",
            "goerli",
            "run",
            "--task",
            "20230117-vault",
            "--task",
            "20230117-authorizers",
            "--mode",
            "check",
            "--force",
            "--from",
            "0xf39fd6e51aad88f6f4ce6ab8827279cfffb92266",
        ])
        .unwrap();

        assert_eq!(cli.network, Some(Network::Goerli));
        let Command::Run(args) = cli.command else { panic!("expected run") };
        assert_eq!(args.tasks, ["20230117-vault", "20230117-authorizers"]);
        assert_eq!(TaskMode::from(args.mode), TaskMode::Check);

        let options = args.options();
        assert!(options.force);
        assert!(!options.continue_on_error);
        assert_eq!(options.from, Some(address!("f39fd6e51aad88f6f4ce6ab8827279cfffb92266")));
    }

    #[test]
    fn test_run_defaults_to_live() {
        let cli = Cli::try_parse_from(["scripts", "run", "--task", "20230117-vault"]).unwrap();
        let Command::Run(args) = cli.command else { panic!("expected run") };
        assert_eq!(args.mode, ModeArg::Live);
        assert!(!args.force);
        assert_eq!(cli.deployments_dir.to_str(), Some("tasks"));
    }

    #[test]
    fn test_run_requires_a_task() {
        assert!(Cli::try_parse_from(["scripts", "run"]).is_err());
    }

    #[test]
    fn test_read_only_is_not_a_run_mode() {
        let res = Cli::try_parse_from(["scripts", "run", "--task", "t", "--mode", "read-only"]);
        assert!(res.is_err());
    }

    #[test]
    fn test_parse_output() {
        let cli = Cli::try_parse_from(["scripts", "output", "--task", "20230117-vault", "--test"])
            .unwrap();
        let Command::Output(args) = cli.command else { panic!("expected output") };
        assert_eq!(args.task, "20230117-vault");
        assert!(args.test);
    }

    #[test]
    fn test_unknown_network() {
        assert!(Cli::try_parse_from(["scripts", "--network", "ropsten", "list"]).is_err());
    }
}
