//! A chain client backed by an alloy provider

use alloy::{
    network::TransactionBuilder,
    providers::{DynProvider, Provider},
    rpc::types::TransactionRequest,
};
use alloy_primitives::{Address, Bytes};
use async_trait::async_trait;
use deployments::{
    client::{ChainClient, ContractHandle, DeployReceipt, DeployRequest},
    errors::ChainError,
};
use tracing::debug;

use crate::utils::encode_constructor_args;

/// Deploys contracts through a signing alloy provider
#[derive(Clone)]
pub struct AlloyChainClient {
    /// The provider, with the deployer's wallet attached
    provider: DynProvider,
    /// The address of the deployer
    signer: Address,
}

impl AlloyChainClient {
    /// Wrap a signing provider whose wallet signs for `signer`
    pub fn new<P: Provider + 'static>(provider: P, signer: Address) -> Self {
        Self {
            provider: DynProvider::new(provider),
            signer,
        }
    }

    /// The underlying provider
    pub fn provider(&self) -> &DynProvider {
        &self.provider
    }
}

#[async_trait]
impl ChainClient for AlloyChainClient {
    async fn deploy(&self, request: DeployRequest<'_>) -> Result<DeployReceipt, ChainError> {
        let mut code = request.bytecode.to_vec();
        code.extend(encode_constructor_args(request.artifact, request.args)?);

        let mut tx = TransactionRequest::default().with_deploy_code(code);
        if let Some(from) = request.from {
            tx = tx.with_from(from);
        }

        let pending = self.provider.send_transaction(tx).await?;
        debug!("sent deployment of {}: {}", request.name, pending.tx_hash());
        let receipt = pending.get_receipt().await?;

        if !receipt.status() {
            return Err(format!(
                "deployment of {} reverted in {}",
                request.name, receipt.transaction_hash
            )
            .into());
        }
        let address = receipt.contract_address.ok_or_else(|| {
            format!("no contract address in receipt {}", receipt.transaction_hash)
        })?;

        Ok(DeployReceipt {
            address,
            tx_hash: receipt.transaction_hash,
        })
    }

    fn signer(&self) -> Address {
        self.signer
    }

    async fn instance_at(
        &self,
        name: &str,
        address: Address,
    ) -> Result<ContractHandle, ChainError> {
        let code = self.provider.get_code_at(address).await?;
        if code.is_empty() {
            return Err(format!("no code for {name} at {address}").into());
        }
        Ok(ContractHandle::new(name, address))
    }

    async fn call(&self, to: Address, calldata: Bytes) -> Result<Bytes, ChainError> {
        let tx = TransactionRequest::default()
            .with_to(to)
            .with_input(calldata);
        Ok(self.provider.call(tx).await?)
    }

    async fn transaction_count(&self, account: Address) -> Result<u64, ChainError> {
        Ok(self.provider.get_transaction_count(account).await?)
    }

    async fn chain_id(&self) -> Result<u64, ChainError> {
        Ok(self.provider.get_chain_id().await?)
    }
}
