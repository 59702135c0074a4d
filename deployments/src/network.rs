//! Definitions of the networks the protocol is deployed to

use std::{
    fmt::{self, Display},
    str::FromStr,
};

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// A network that tasks can be deployed to.
///
/// The lowercase name of a network is used both as the key of network-scoped
/// input overrides and as the file stem of the task's output record.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Network {
    /// Ethereum mainnet
    Mainnet,
    /// The Goerli testnet
    Goerli,
    /// Polygon PoS
    Polygon,
    /// Arbitrum One
    Arbitrum,
    /// OP mainnet
    Optimism,
    /// Gnosis chain
    Gnosis,
    /// BNB smart chain
    Bsc,
    /// A local development node
    Localhost,
}

/// Every known network, in declaration order
pub const NETWORKS: [Network; 8] = [
    Network::Mainnet,
    Network::Goerli,
    Network::Polygon,
    Network::Arbitrum,
    Network::Optimism,
    Network::Gnosis,
    Network::Bsc,
    Network::Localhost,
];

/// The block explorer endpoints of a network
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Explorer {
    /// The Etherscan-compatible API endpoint
    pub api_url: &'static str,
    /// The base URL of the human-facing explorer
    pub browser_url: &'static str,
}

/// The error returned when parsing an unknown network name
#[derive(Debug, Error, PartialEq, Eq)]
#[error("unknown network `{0}`")]
pub struct UnknownNetwork(
    /// The name that was given
    pub String,
);

impl Network {
    /// The lowercase name of the network
    pub fn name(&self) -> &'static str {
        match self {
            Network::Mainnet => "mainnet",
            Network::Goerli => "goerli",
            Network::Polygon => "polygon",
            Network::Arbitrum => "arbitrum",
            Network::Optimism => "optimism",
            Network::Gnosis => "gnosis",
            Network::Bsc => "bsc",
            Network::Localhost => "localhost",
        }
    }

    /// The EIP-155 chain id of the network
    pub fn chain_id(&self) -> u64 {
        match self {
            Network::Mainnet => 1,
            Network::Goerli => 5,
            Network::Polygon => 137,
            Network::Arbitrum => 42161,
            Network::Optimism => 10,
            Network::Gnosis => 100,
            Network::Bsc => 56,
            Network::Localhost => 31337,
        }
    }

    /// Look up the network with the given chain id
    pub fn from_chain_id(chain_id: u64) -> Option<Network> {
        NETWORKS.into_iter().find(|n| n.chain_id() == chain_id)
    }

    /// The block explorer of the network, if it has one
    pub fn explorer(&self) -> Option<Explorer> {
        let (api_url, browser_url) = match self {
            Network::Mainnet => ("https://api.etherscan.io/api", "https://etherscan.io"),
            Network::Goerli => (
                "https://api-goerli.etherscan.io/api",
                "https://goerli.etherscan.io",
            ),
            Network::Polygon => ("https://api.polygonscan.com/api", "https://polygonscan.com"),
            Network::Arbitrum => ("https://api.arbiscan.io/api", "https://arbiscan.io"),
            Network::Optimism => (
                "https://api-optimistic.etherscan.io/api",
                "https://optimistic.etherscan.io",
            ),
            Network::Gnosis => ("https://api.gnosisscan.io/api", "https://gnosisscan.io"),
            Network::Bsc => ("https://api.bscscan.com/api", "https://bscscan.com"),
            Network::Localhost => return None,
        };

        Some(Explorer {
            api_url,
            browser_url,
        })
    }
}

impl Display for Network {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

impl FromStr for Network {
    type Err = UnknownNetwork;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let name = s.trim().to_lowercase();
        NETWORKS
            .into_iter()
            .find(|n| n.name() == name)
            .ok_or(UnknownNetwork(s.to_string()))
    }
}
