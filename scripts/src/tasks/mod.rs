//! The deployment tasks of the protocol, in the order they are meant to run

mod authorizers;
mod fee_distributor;
mod protocol_fees_provider;
mod vault;
mod voting_escrow;
mod weighted_pool;

pub use authorizers::AuthorizersTask;
pub use fee_distributor::FeeDistributorTask;
pub use protocol_fees_provider::ProtocolFeesProviderTask;
pub use vault::VaultTask;
pub use voting_escrow::VotingEscrowTask;
pub use weighted_pool::WeightedPoolTask;

use deployments::TaskCatalog;

/// The id of the vault task
pub const VAULT_TASK: &str = "20230117-vault";
/// The id of the protocol fee percentages provider task
pub const PROTOCOL_FEES_PROVIDER_TASK: &str = "20230117-protocol-fees-provider";
/// The id of the authorizers task
pub const AUTHORIZERS_TASK: &str = "20230117-authorizers";
/// The id of the weighted pool factory task
pub const WEIGHTED_POOL_TASK: &str = "20230117-weighted-pool-v2";
/// The id of the voting escrow task
pub const VOTING_ESCROW_TASK: &str = "20230124-voting-escrow";
/// The id of the fee distributor task
pub const FEE_DISTRIBUTOR_TASK: &str = "20230124-fee-distributor";

/// The catalog of every declared task
pub fn catalog() -> TaskCatalog {
    TaskCatalog::new()
        .with(VaultTask)
        .with(ProtocolFeesProviderTask)
        .with(AuthorizersTask)
        .with(WeightedPoolTask)
        .with(VotingEscrowTask)
        .with(FeeDistributorTask)
}
