//! Constants used throughout the deployment engine

/// The default directory, relative to the working directory, holding one
/// subdirectory per task
pub const DEFAULT_DEPLOYMENTS_DIR: &str = "tasks";

/// The directory within a task's directory holding its output records
pub const OUTPUT_DIR: &str = "output";

/// The directory within a task's directory holding its deployment transaction records
pub const DEPLOYMENT_TXS_DIR: &str = "deployment-txs";

/// The directory within a task's directory holding compiled contract artifacts
pub const ARTIFACT_DIR: &str = "artifact";

/// The directory within a task's directory holding solc build info, used for verification
pub const BUILD_INFO_DIR: &str = "build-info";

/// The file stem of the output record written by tasks run in test mode
pub const TEST_OUTPUT_FILE_STEM: &str = "test";

/// The extension of every record and artifact file
pub const JSON_EXTENSION: &str = "json";

/// The default number of attempts made when verifying a contract
pub const DEFAULT_VERIFICATION_ATTEMPTS: usize = 3;

/// The default delay between verification attempts, in seconds
pub const DEFAULT_VERIFICATION_RETRY_DELAY_SECS: u64 = 5;

/// The number of bytes in an Ethereum address
pub const NUM_BYTES_ADDRESS: usize = 20;

/// The prefix of hex-encoded bytecode
pub const HEX_PREFIX: &str = "0x";
