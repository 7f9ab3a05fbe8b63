//! Chain access for deployments.
//!
//! [`ChainClient`] is the seam between the deployment runner and the network.
//! [`RpcClient`] is the production implementation, an alloy HTTP provider
//! with every configured signer registered in its wallet.

use alloy::network::{EthereumWallet, TransactionBuilder};
use alloy::primitives::{Address, Bytes, B256};
use alloy::providers::{DynProvider, Provider, ProviderBuilder};
use alloy::rpc::types::TransactionRequest;
use async_trait::async_trait;
use std::time::Duration;

use crate::config::{ConfigError, NetworkProfile};
use crate::error::DeployError;

/// Outcome of a confirmed contract-creation transaction
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DeployedContract {
    pub address: Address,
    pub transaction_hash: B256,
}

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ChainClient: Send + Sync {
    /// Signing accounts available for deployment, default first
    fn accounts(&self) -> Vec<Address>;

    /// Send `bytecode` as a contract creation from `from` and wait for it to
    /// be confirmed.
    async fn deploy(&self, from: Address, bytecode: Bytes) -> Result<DeployedContract, DeployError>;
}

pub struct RpcClient {
    provider: DynProvider,
    network: String,
    chain_id: Option<u64>,
    accounts: Vec<Address>,
    confirmations: u64,
    confirmation_timeout: Option<Duration>,
}

impl RpcClient {
    /// Build a client for the profile's endpoint. No request is made here;
    /// a pinned chain id is checked right before the first deployment.
    pub fn new(profile: &NetworkProfile) -> Result<Self, DeployError> {
        let mut signers = profile.signers.iter().cloned();
        let first = signers.next().ok_or(DeployError::NoAccounts)?;
        let mut wallet = EthereumWallet::new(first);
        for signer in signers {
            wallet.register_signer(signer);
        }

        let provider = ProviderBuilder::new()
            .wallet(wallet)
            .connect_http(profile.endpoint.clone())
            .erased();

        Ok(RpcClient {
            provider,
            network: profile.name.clone(),
            chain_id: profile.chain_id,
            accounts: profile.addresses(),
            confirmations: profile.confirmations,
            confirmation_timeout: profile.confirmation_timeout,
        })
    }

    async fn check_chain_id(&self) -> Result<(), DeployError> {
        let Some(expected) = self.chain_id else {
            return Ok(());
        };

        let actual = self.provider.get_chain_id().await?;
        if actual != expected {
            return Err(ConfigError::ChainIdMismatch {
                network: self.network.clone(),
                expected,
                actual,
            }
            .into());
        }
        tracing::debug!(chain_id = actual, "endpoint chain id verified");
        Ok(())
    }
}

#[async_trait]
impl ChainClient for RpcClient {
    fn accounts(&self) -> Vec<Address> {
        self.accounts.clone()
    }

    async fn deploy(&self, from: Address, bytecode: Bytes) -> Result<DeployedContract, DeployError> {
        self.check_chain_id().await?;

        let tx = TransactionRequest::default()
            .with_from(from)
            .with_deploy_code(bytecode);

        let pending = self.provider.send_transaction(tx).await?;
        let tx_hash = *pending.tx_hash();
        tracing::info!(%tx_hash, confirmations = self.confirmations, "deployment transaction sent, waiting for confirmation");

        let receipt = pending
            .with_required_confirmations(self.confirmations)
            .with_timeout(self.confirmation_timeout)
            .get_receipt()
            .await
            .map_err(|err| DeployError::Network(err.to_string()))?;

        if !receipt.status() {
            return Err(DeployError::Transaction(format!(
                "deployment transaction {tx_hash} reverted"
            )));
        }

        let address = receipt.contract_address.ok_or_else(|| {
            DeployError::Transaction(format!(
                "receipt for {tx_hash} carries no contract address"
            ))
        })?;

        Ok(DeployedContract {
            address,
            transaction_hash: receipt.transaction_hash,
        })
    }
}
