//! Utilities for the deploy scripts.

use std::str::FromStr;

use alloy::{
    providers::{Provider, ProviderBuilder},
    signers::local::PrivateKeySigner,
    transports::http::reqwest::Url,
};
use alloy_dyn_abi::{DynSolType, DynSolValue, JsonAbiExt, Specifier};
use alloy_primitives::Address;
use alloy_sol_types::SolCall;
use deployments::{
    artifact::Artifact, errors::DeployError, network::Network, Param, Task, TaskMode,
};
use tracing::debug;

use crate::{chain::AlloyChainClient, errors::ScriptError};

/// Sets up a chain client signing with `priv_key` against the node at `rpc_url`
pub fn setup_client(priv_key: &str, rpc_url: &str) -> Result<AlloyChainClient, ScriptError> {
    let url = Url::parse(rpc_url).map_err(|e| ScriptError::ClientInitialization(e.to_string()))?;
    let signer = PrivateKeySigner::from_str(priv_key)
        .map_err(|e| ScriptError::ClientInitialization(e.to_string()))?;

    let address = signer.address();
    let provider = ProviderBuilder::new().wallet(signer).connect_http(url);
    Ok(AlloyChainClient::new(provider, address))
}

/// The network to run against: `network` if given, otherwise the network whose
/// chain id the node at `rpc_url` reports
pub async fn resolve_network(
    network: Option<Network>,
    rpc_url: &str,
) -> Result<Network, ScriptError> {
    if let Some(network) = network {
        return Ok(network);
    }

    let url = Url::parse(rpc_url).map_err(|e| ScriptError::ClientInitialization(e.to_string()))?;
    let chain_id = ProviderBuilder::new()
        .connect_http(url)
        .get_chain_id()
        .await
        .map_err(|e| ScriptError::ClientInitialization(e.to_string()))?;
    debug!("inferred chain id {chain_id} from {rpc_url}");

    Network::from_chain_id(chain_id).ok_or(ScriptError::UnknownChain(chain_id))
}

/// ABI-encode constructor arguments against the constructor in `artifact`
pub fn encode_constructor_args(
    artifact: &Artifact,
    args: &[Param],
) -> Result<Vec<u8>, ScriptError> {
    let Some(constructor) = artifact.abi.constructor.as_ref() else {
        if args.is_empty() {
            return Ok(Vec::new());
        }
        return Err(ScriptError::CalldataConstruction(format!(
            "{} has no constructor, but {} arguments were given",
            artifact.contract_name,
            args.len()
        )));
    };
    if constructor.inputs.len() != args.len() {
        return Err(ScriptError::CalldataConstruction(format!(
            "{} constructor takes {} arguments, {} given",
            artifact.contract_name,
            constructor.inputs.len(),
            args.len()
        )));
    }

    let values = constructor
        .inputs
        .iter()
        .zip(args)
        .map(|(input, arg)| {
            let ty: DynSolType = input
                .resolve()
                .map_err(|e| ScriptError::CalldataConstruction(e.to_string()))?;
            coerce_param(&ty, arg)
        })
        .collect::<Result<Vec<DynSolValue>, _>>()?;

    constructor
        .abi_encode_input(&values)
        .map_err(|e| ScriptError::CalldataConstruction(e.to_string()))
}

/// Coerce an input value into the given ABI type
fn coerce_param(ty: &DynSolType, param: &Param) -> Result<DynSolValue, ScriptError> {
    match (ty, param) {
        (DynSolType::Address, Param::Address(address)) => Ok(DynSolValue::Address(*address)),
        (DynSolType::Bool, Param::Bool(b)) => Ok(DynSolValue::Bool(*b)),
        (DynSolType::Uint(bits), Param::Uint(n)) => Ok(DynSolValue::Uint(*n, *bits)),
        (DynSolType::String, Param::Str(s)) => Ok(DynSolValue::String(s.clone())),
        _ => ty.coerce_str(&param.to_string()).map_err(|e| {
            ScriptError::CalldataConstruction(format!("{param} as {}: {e}", ty.sol_type_name()))
        }),
    }
}

/// Call a view method returning an address on the contract at `to`, through
/// the chain client of `task`
pub async fn read_address<C>(task: &Task, to: Address, call: C) -> Result<Address, DeployError>
where
    C: SolCall<Return = Address> + Send,
{
    let client = task.env().client()?;
    let data = client
        .call(to, call.abi_encode().into())
        .await
        .map_err(DeployError::Chain)?;
    C::abi_decode_returns(&data).map_err(|e| DeployError::Chain(Box::new(e)))
}

/// Whether side effects of deployments can be read from chain
pub fn reads_side_effects(task: &Task) -> bool {
    task.mode() != TaskMode::Check
}

#[cfg(test)]
mod tests {
    use alloy_primitives::{address, Address, U256};
    use deployments::{artifact::Artifact, Param};

    use super::encode_constructor_args;

    const VAULT: Address = address!("ba12222222228d8ba445958a75a0704d566bf2c8");

    fn artifact() -> Artifact {
        serde_json::from_value(serde_json::json!({
            "contractName": "VotingEscrow",
            "sourceName": "contracts/VotingEscrow.vy",
            "abi": [{
                "type": "constructor",
                "stateMutability": "nonpayable",
                "inputs": [
                    { "name": "token", "type": "address" },
                    { "name": "name", "type": "string" },
                    { "name": "symbol", "type": "string" },
                    { "name": "startTime", "type": "uint256" }
                ]
            }],
            "bytecode": "0x6080"
        }))
        .unwrap()
    }

    #[test]
    fn test_encode_constructor_args() {
        let args = [
            Param::Address(VAULT),
            Param::from("Vote Escrowed Token"),
            Param::from("veTKN"),
            Param::Uint(U256::from(1_674_455_329u64)),
        ];
        let encoded = encode_constructor_args(&artifact(), &args).unwrap();

        // Four head words, then length and data words of each string
        assert_eq!(encoded.len(), 32 * 8);
        assert_eq!(&encoded[12..32], VAULT.as_slice());
    }

    #[test]
    fn test_coerces_strings() {
        let args = [
            Param::from(VAULT.to_string()),
            Param::from("Vote Escrowed Token"),
            Param::from("veTKN"),
            Param::from("1674455329"),
        ];
        assert!(encode_constructor_args(&artifact(), &args).is_ok());
    }

    #[test]
    fn test_rejects_wrong_arity() {
        assert!(encode_constructor_args(&artifact(), &[Param::Address(VAULT)]).is_err());
    }
}
