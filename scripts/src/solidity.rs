//! Definitions of Solidity functions called during deployment

use alloy_sol_types::sol;

sol! {
    function getProtocolFeesCollector() external view returns (address);
    function getExecutor() external view returns (address);
}
