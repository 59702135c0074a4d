//! Mode-aware choice between deploying a contract, reusing an existing
//! deployment, and statically checking deployability

use alloy_primitives::Address;

use crate::{errors::DeployError, mode::TaskMode};

/// What a task should do when asked to deploy a contract
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DeployAction {
    /// Validate deployability without submitting a transaction or touching the store
    Check,
    /// Bind to the already-recorded address
    Reuse(Address),
    /// Submit a deployment transaction and record the new address
    Deploy,
}

/// Decide how to deploy a contract given the task's mode, the address already
/// recorded for the contract (if any), and whether redeployment is forced
pub fn plan(
    mode: TaskMode,
    existing: Option<Address>,
    force: bool,
) -> Result<DeployAction, DeployError> {
    match (mode, existing) {
        (TaskMode::ReadOnly, _) => Err(DeployError::InvalidMode {
            operation: "deploy",
            mode,
        }),
        (TaskMode::Check, _) => Ok(DeployAction::Check),
        (_, Some(address)) if !force => Ok(DeployAction::Reuse(address)),
        _ => Ok(DeployAction::Deploy),
    }
}

#[cfg(test)]
mod tests {
    use alloy_primitives::{address, Address};

    use super::{plan, DeployAction};
    use crate::{errors::DeployError, mode::TaskMode};

    const VAULT: Address = address!("ba12222222228d8ba445958a75a0704d566bf2c8");

    #[test]
    fn test_read_only_never_deploys() {
        for (existing, force) in [(None, false), (Some(VAULT), false), (Some(VAULT), true)] {
            assert!(matches!(
                plan(TaskMode::ReadOnly, existing, force),
                Err(DeployError::InvalidMode { .. })
            ));
        }
    }

    #[test]
    fn test_check_ignores_existing_entries() {
        assert_eq!(
            plan(TaskMode::Check, Some(VAULT), false).unwrap(),
            DeployAction::Check
        );
        assert_eq!(plan(TaskMode::Check, None, true).unwrap(), DeployAction::Check);
    }

    #[test]
    fn test_existing_entry_is_reused() {
        for mode in [TaskMode::Live, TaskMode::Test] {
            assert_eq!(
                plan(mode, Some(VAULT), false).unwrap(),
                DeployAction::Reuse(VAULT)
            );
        }
    }

    #[test]
    fn test_force_redeploys() {
        assert_eq!(
            plan(TaskMode::Live, Some(VAULT), true).unwrap(),
            DeployAction::Deploy
        );
    }

    #[test]
    fn test_missing_entry_deploys() {
        assert_eq!(plan(TaskMode::Test, None, false).unwrap(), DeployAction::Deploy);
    }
}
