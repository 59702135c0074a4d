//! A verifier submitting contract sources to Etherscan-compatible explorers

use std::{fs, path::PathBuf, time::Duration};

use async_trait::async_trait;
use deployments::{
    constants::{BUILD_INFO_DIR, JSON_EXTENSION},
    verifier::{VerificationError, VerificationRequest, VerificationStatus, Verifier},
};
use reqwest::Client;
use serde::Deserialize;
use tracing::{debug, info};

use crate::{
    constants::{
        ALREADY_VERIFIED_FRAGMENT, CHECK_STATUS_ACTION, ETHERSCAN_CONTRACT_MODULE,
        ETHERSCAN_OK_STATUS, MAX_VERIFICATION_POLLS, PENDING_RESULT, STANDARD_JSON_CODE_FORMAT,
        VERIFICATION_POLL_INTERVAL_SECS, VERIFIED_RESULT, VERIFY_SOURCE_ACTION,
    },
    utils::encode_constructor_args,
};

/// The envelope of every Etherscan API response
#[derive(Debug, Deserialize)]
struct EtherscanResponse {
    /// "1" on success, "0" otherwise
    status: String,
    /// A short description of the status
    message: String,
    /// The payload: a GUID, a status message, or an error message
    result: String,
}

/// The solc build info of a contract, in the format emitted by hardhat
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct BuildInfo {
    /// The full compiler version, e.g. `0.7.1+commit.f4a555be`
    solc_long_version: String,
    /// The solc standard-json input
    input: serde_json::Value,
}

/// The outcome of a verification submission
#[derive(Debug, PartialEq, Eq)]
enum Submission {
    /// The submission was queued under the given GUID
    Queued(String),
    /// The source is already verified
    AlreadyVerified,
}

/// The outcome of polling a queued verification
#[derive(Debug, PartialEq, Eq)]
enum PollOutcome {
    /// Still in the explorer's queue
    Pending,
    /// Verified by this submission
    Verified,
    /// Verified before this submission
    AlreadyVerified,
}

/// Submits contract sources to the explorer of the contract's network
pub struct EtherscanVerifier {
    /// The HTTP client
    client: Client,
    /// The explorer API key
    api_key: String,
    /// The deployments directory, holding each task's build info
    deployments_dir: PathBuf,
    /// The delay between polls of a queued verification
    poll_interval: Duration,
}

impl EtherscanVerifier {
    /// Create a verifier authenticating with `api_key`
    pub fn new(api_key: &str, deployments_dir: impl Into<PathBuf>) -> Self {
        Self {
            client: Client::new(),
            api_key: api_key.to_string(),
            deployments_dir: deployments_dir.into(),
            poll_interval: Duration::from_secs(VERIFICATION_POLL_INTERVAL_SECS),
        }
    }

    /// Read the build info of the requested contract
    fn build_info(
        &self,
        request: &VerificationRequest<'_>,
    ) -> Result<BuildInfo, VerificationError> {
        let path = self
            .deployments_dir
            .join(request.task_id)
            .join(BUILD_INFO_DIR)
            .join(format!("{}.{JSON_EXTENSION}", request.name));
        let contents = fs::read_to_string(&path)
            .map_err(|e| VerificationError::Rejected(format!("{}: {e}", path.display())))?;
        serde_json::from_str(&contents)
            .map_err(|e| VerificationError::Rejected(format!("{}: {e}", path.display())))
    }

    /// Submit the source of the requested contract
    async fn submit(
        &self,
        api_url: &str,
        request: &VerificationRequest<'_>,
    ) -> Result<Submission, VerificationError> {
        let build_info = self.build_info(request)?;
        let constructor_args = encode_constructor_args(request.artifact, request.args)
            .map_err(|e| VerificationError::Rejected(e.to_string()))?;

        let mut form = vec![
            ("apikey".to_string(), self.api_key.clone()),
            ("module".to_string(), ETHERSCAN_CONTRACT_MODULE.to_string()),
            ("action".to_string(), VERIFY_SOURCE_ACTION.to_string()),
            ("contractaddress".to_string(), request.address.to_string()),
            ("sourceCode".to_string(), build_info.input.to_string()),
            ("codeformat".to_string(), STANDARD_JSON_CODE_FORMAT.to_string()),
            ("contractname".to_string(), request.artifact.fully_qualified_name()),
            ("compilerversion".to_string(), format!("v{}", build_info.solc_long_version)),
            // Etherscan's spelling
            ("constructorArguements".to_string(), hex::encode(constructor_args)),
        ];
        for (i, (name, address)) in request.libs.iter().enumerate() {
            let name = name.rsplit(':').next().unwrap_or(name);
            form.push((format!("libraryname{}", i + 1), name.to_string()));
            form.push((format!("libraryaddress{}", i + 1), address.to_string()));
        }

        let response: EtherscanResponse = self
            .client
            .post(api_url)
            .form(&form)
            .send()
            .await
            .map_err(transient)?
            .json()
            .await
            .map_err(transient)?;
        debug!("submitted {} for verification: {}", request.name, response.result);

        classify_submission(&response)
    }

    /// Poll a queued verification
    async fn poll(&self, api_url: &str, guid: &str) -> Result<PollOutcome, VerificationError> {
        let response: EtherscanResponse = self
            .client
            .get(api_url)
            .query(&[
                ("apikey", self.api_key.as_str()),
                ("module", ETHERSCAN_CONTRACT_MODULE),
                ("action", CHECK_STATUS_ACTION),
                ("guid", guid),
            ])
            .send()
            .await
            .map_err(transient)?
            .json()
            .await
            .map_err(transient)?;

        classify_status(&response)
    }
}

#[async_trait]
impl Verifier for EtherscanVerifier {
    async fn verify(
        &self,
        request: VerificationRequest<'_>,
    ) -> Result<VerificationStatus, VerificationError> {
        let explorer = request.network.explorer().ok_or_else(|| {
            VerificationError::Rejected(format!("{} has no block explorer", request.network))
        })?;
        let url = format!("{}/address/{}#code", explorer.browser_url, request.address);

        let guid = match self.submit(explorer.api_url, &request).await? {
            Submission::AlreadyVerified => {
                return Ok(VerificationStatus::AlreadyVerified { url: Some(url) })
            }
            Submission::Queued(guid) => guid,
        };

        for _ in 0..MAX_VERIFICATION_POLLS {
            tokio::time::sleep(self.poll_interval).await;
            match self.poll(explorer.api_url, &guid).await? {
                PollOutcome::Pending => continue,
                PollOutcome::Verified => {
                    info!("verified {} at {}", request.name, request.address);
                    return Ok(VerificationStatus::Verified { url });
                }
                PollOutcome::AlreadyVerified => {
                    return Ok(VerificationStatus::AlreadyVerified { url: Some(url) })
                }
            }
        }

        Err(VerificationError::Transient(format!(
            "verification of {} still pending after {MAX_VERIFICATION_POLLS} polls",
            request.name
        )))
    }
}

/// Classify transport failures as transient
fn transient(e: reqwest::Error) -> VerificationError {
    VerificationError::Transient(e.to_string())
}

/// Whether a result message reports that the source is already verified
fn is_already_verified(result: &str) -> bool {
    result.to_lowercase().contains(ALREADY_VERIFIED_FRAGMENT)
}

/// Whether a result message reports a condition that may clear on retry
fn is_rate_limited(result: &str) -> bool {
    let result = result.to_lowercase();
    ["rate limit", "try again", "unable to locate contractcode"]
        .iter()
        .any(|fragment| result.contains(fragment))
}

/// Interpret the response to a verification submission
fn classify_submission(response: &EtherscanResponse) -> Result<Submission, VerificationError> {
    if response.status == ETHERSCAN_OK_STATUS {
        return Ok(Submission::Queued(response.result.clone()));
    }
    if is_already_verified(&response.result) {
        return Ok(Submission::AlreadyVerified);
    }
    if is_rate_limited(&response.result) {
        return Err(VerificationError::Transient(response.result.clone()));
    }
    Err(VerificationError::Rejected(response.result.clone()))
}

/// Interpret the response to a verification status poll
fn classify_status(response: &EtherscanResponse) -> Result<PollOutcome, VerificationError> {
    match response.result.as_str() {
        PENDING_RESULT => Ok(PollOutcome::Pending),
        VERIFIED_RESULT => Ok(PollOutcome::Verified),
        result if is_already_verified(result) => Ok(PollOutcome::AlreadyVerified),
        result if is_rate_limited(result) => {
            Err(VerificationError::Transient(result.to_string()))
        }
        result => Err(VerificationError::Rejected(format!(
            "{}: {result}",
            response.message
        ))),
    }
}
