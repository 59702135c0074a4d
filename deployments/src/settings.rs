//! Process-wide configuration of the deployment engine

use std::{
    path::{Path, PathBuf},
    time::Duration,
};

use crate::{
    constants::{
        DEFAULT_DEPLOYMENTS_DIR, DEFAULT_VERIFICATION_ATTEMPTS,
        DEFAULT_VERIFICATION_RETRY_DELAY_SECS,
    },
    network::Network,
};

/// How verification is retried
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct VerificationSettings {
    /// The maximum number of attempts per contract
    pub attempts: usize,
    /// The delay between attempts
    pub retry_delay: Duration,
}

impl Default for VerificationSettings {
    fn default() -> Self {
        Self {
            attempts: DEFAULT_VERIFICATION_ATTEMPTS,
            retry_delay: Duration::from_secs(DEFAULT_VERIFICATION_RETRY_DELAY_SECS),
        }
    }
}

/// Settings shared by every task of a run
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DeploySettings {
    /// The network tasks run on unless constructed with an explicit one
    pub network: Network,
    /// The directory holding one subdirectory per task
    pub deployments_dir: PathBuf,
    /// The verification retry policy
    pub verification: VerificationSettings,
}

impl DeploySettings {
    /// Settings for `network` with every other value defaulted
    pub fn new(network: Network) -> Self {
        Self {
            network,
            deployments_dir: PathBuf::from(DEFAULT_DEPLOYMENTS_DIR),
            verification: VerificationSettings::default(),
        }
    }

    /// Use `dir` as the deployments directory
    pub fn with_deployments_dir(mut self, dir: impl AsRef<Path>) -> Self {
        self.deployments_dir = dir.as_ref().to_path_buf();
        self
    }

    /// Use the given verification retry policy
    pub fn with_verification(mut self, verification: VerificationSettings) -> Self {
        self.verification = verification;
        self
    }
}

#[cfg(test)]
mod tests {
    use std::{path::PathBuf, time::Duration};

    use super::{DeploySettings, VerificationSettings};
    use crate::network::Network;

    #[test]
    fn test_defaults() {
        let settings = DeploySettings::new(Network::Mainnet);
        assert_eq!(settings.deployments_dir, PathBuf::from("tasks"));
        assert_eq!(settings.verification.attempts, 3);
        assert_eq!(settings.verification.retry_delay, Duration::from_secs(5));
    }

    #[test]
    fn test_overrides() {
        let verification = VerificationSettings {
            attempts: 1,
            retry_delay: Duration::ZERO,
        };
        let settings = DeploySettings::new(Network::Goerli)
            .with_deployments_dir("/tmp/deployments")
            .with_verification(verification.clone());

        assert_eq!(settings.network, Network::Goerli);
        assert_eq!(settings.deployments_dir, PathBuf::from("/tmp/deployments"));
        assert_eq!(settings.verification, verification);
    }
}
