//! Constants used in the deploy scripts

/// The RPC endpoint used when none is configured
pub const DEFAULT_RPC_URL: &str = "http://localhost:8545";

/// The default log filter
pub const DEFAULT_LOG_FILTER: &str = "info";

/// The number of seconds in a day
pub const DAY: u64 = 24 * 60 * 60;

/// The number of seconds in a month, as counted by the protocol
pub const MONTH: u64 = 30 * DAY;

/// Fixed-point one, at 18 decimals
pub const ONE_FP: u64 = 1_000_000_000_000_000_000;

// -------------
// | Etherscan |
// -------------

/// The Etherscan module holding contract endpoints
pub const ETHERSCAN_CONTRACT_MODULE: &str = "contract";

/// The action submitting a contract for verification
pub const VERIFY_SOURCE_ACTION: &str = "verifysourcecode";

/// The action polling the status of a verification
pub const CHECK_STATUS_ACTION: &str = "checkverifystatus";

/// The code format of solc standard-json input
pub const STANDARD_JSON_CODE_FORMAT: &str = "solidity-standard-json-input";

/// The status Etherscan reports for successful requests
pub const ETHERSCAN_OK_STATUS: &str = "1";

/// The poll result of a verification that has not completed
pub const PENDING_RESULT: &str = "Pending in queue";

/// The poll result of a successful verification
pub const VERIFIED_RESULT: &str = "Pass - Verified";

/// The substring Etherscan includes in "already verified" results
pub const ALREADY_VERIFIED_FRAGMENT: &str = "already verified";

/// The delay between polls of a pending verification, in seconds
pub const VERIFICATION_POLL_INTERVAL_SECS: u64 = 5;

/// The number of polls after which a pending verification is abandoned
pub const MAX_VERIFICATION_POLLS: usize = 12;
