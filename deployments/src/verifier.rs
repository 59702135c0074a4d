//! The source verification capability and its retry policy

use std::fmt::{self, Display};

use alloy_primitives::Address;
use async_trait::async_trait;
use thiserror::Error;
use tracing::warn;

use crate::{
    artifact::{Artifact, Libraries},
    input::Param,
    network::Network,
    settings::VerificationSettings,
};

/// A request to verify the source of a deployed contract
#[derive(Clone, Copy, Debug)]
pub struct VerificationRequest<'a> {
    /// The task that deployed the contract
    pub task_id: &'a str,
    /// The network the contract lives on
    pub network: Network,
    /// The contract name
    pub name: &'a str,
    /// The address of the contract
    pub address: Address,
    /// The compiled artifact of the contract
    pub artifact: &'a Artifact,
    /// The constructor arguments the contract was deployed with
    pub args: &'a [Param],
    /// The libraries the contract was linked against
    pub libs: &'a Libraries,
}

/// A successful verification outcome
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum VerificationStatus {
    /// The source was verified by this request
    Verified {
        /// Where the verified source can be browsed
        url: String,
    },
    /// The source had already been verified
    AlreadyVerified {
        /// Where the verified source can be browsed, if known
        url: Option<String>,
    },
}

impl Display for VerificationStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            VerificationStatus::Verified { url } => write!(f, "verified at {url}"),
            VerificationStatus::AlreadyVerified { url: Some(url) } => {
                write!(f, "already verified at {url}")
            }
            VerificationStatus::AlreadyVerified { url: None } => write!(f, "already verified"),
        }
    }
}

/// A failed verification attempt
#[derive(Debug, Error)]
pub enum VerificationError {
    /// The verification service rejected the submission
    #[error("verification rejected: {0}")]
    Rejected(String),
    /// The attempt failed in a way that may succeed on retry
    #[error("transient verification error: {0}")]
    Transient(String),
}

impl VerificationError {
    /// Whether the attempt may be retried
    pub fn is_retryable(&self) -> bool {
        matches!(self, VerificationError::Transient(_))
    }
}

/// A block-explorer-like service that verifies contract sources
#[async_trait]
pub trait Verifier: Send + Sync {
    /// Submit a contract for verification and wait for the outcome
    async fn verify(
        &self,
        request: VerificationRequest<'_>,
    ) -> Result<VerificationStatus, VerificationError>;
}

/// Verify a contract, retrying transient failures as configured by `settings`
pub async fn verify_with_retries(
    verifier: &dyn Verifier,
    request: VerificationRequest<'_>,
    settings: &VerificationSettings,
) -> Result<VerificationStatus, VerificationError> {
    let attempts = settings.attempts.max(1);
    let mut attempt = 1;
    loop {
        match verifier.verify(request).await {
            Err(e) if e.is_retryable() && attempt < attempts => {
                warn!(
                    "verification of {} failed (attempt {attempt}/{attempts}): {e}",
                    request.name
                );
                tokio::time::sleep(settings.retry_delay).await;
                attempt += 1;
            }
            res => return res,
        }
    }
}

#[cfg(test)]
mod tests {
    use std::{
        sync::atomic::{AtomicUsize, Ordering},
        time::Duration,
    };

    use alloy_primitives::Address;
    use async_trait::async_trait;

    use super::{
        verify_with_retries, VerificationError, VerificationRequest, VerificationStatus, Verifier,
    };
    use crate::{
        artifact::{Artifact, Libraries},
        network::Network,
        settings::VerificationSettings,
    };

    /// Fails with the configured error until `failures` calls have been made
    struct Flaky {
        failures: usize,
        retryable: bool,
        calls: AtomicUsize,
    }

    impl Flaky {
        fn new(failures: usize, retryable: bool) -> Self {
            Self {
                failures,
                retryable,
                calls: AtomicUsize::new(0),
            }
        }
    }

    #[async_trait]
    impl Verifier for Flaky {
        async fn verify(
            &self,
            _request: VerificationRequest<'_>,
        ) -> Result<VerificationStatus, VerificationError> {
            let call = self.calls.fetch_add(1, Ordering::SeqCst);
            if call < self.failures {
                let msg = "explorer unavailable".to_string();
                return Err(if self.retryable {
                    VerificationError::Transient(msg)
                } else {
                    VerificationError::Rejected(msg)
                });
            }
            Ok(VerificationStatus::AlreadyVerified { url: None })
        }
    }

    fn artifact() -> Artifact {
        serde_json::from_value(serde_json::json!({
            "contractName": "Vault",
            "sourceName": "contracts/Vault.sol",
            "abi": [],
            "bytecode": "0x6080"
        }))
        .unwrap()
    }

    fn settings(attempts: usize) -> VerificationSettings {
        VerificationSettings {
            attempts,
            retry_delay: Duration::ZERO,
        }
    }

    async fn run(
        verifier: &Flaky,
        attempts: usize,
    ) -> Result<VerificationStatus, VerificationError> {
        let artifact = artifact();
        let libs = Libraries::new();
        let request = VerificationRequest {
            task_id: "20230117-vault",
            network: Network::Goerli,
            name: "Vault",
            address: Address::ZERO,
            artifact: &artifact,
            args: &[],
            libs: &libs,
        };
        verify_with_retries(verifier, request, &settings(attempts)).await
    }

    #[tokio::test]
    async fn test_transient_errors_are_retried() {
        let verifier = Flaky::new(2, true);
        assert!(run(&verifier, 3).await.is_ok());
        assert_eq!(verifier.calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn test_retries_are_bounded() {
        let verifier = Flaky::new(5, true);
        assert!(matches!(
            run(&verifier, 3).await,
            Err(VerificationError::Transient(_))
        ));
        assert_eq!(verifier.calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn test_rejections_are_not_retried() {
        let verifier = Flaky::new(1, false);
        assert!(matches!(
            run(&verifier, 3).await,
            Err(VerificationError::Rejected(_))
        ));
        assert_eq!(verifier.calls.load(Ordering::SeqCst), 1);
    }
}
