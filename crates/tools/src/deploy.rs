//! The deployment runner.

use alloy::primitives::{Address, B256};
use std::fmt;

use crate::artifacts::ArtifactStore;
use crate::client::ChainClient;
use crate::error::DeployError;

/// Contract template deployed when none is named
pub const DEFAULT_CONTRACT: &str = "NFTMint";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DeploymentResult {
    pub deployer: Address,
    pub address: Address,
    pub transaction_hash: B256,
}

/// Two lines: the deploying account, then the contract address.
impl fmt::Display for DeploymentResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Contract Deployed by Account {}", self.deployer)?;
        write!(f, "Contract Address {}", self.address)
    }
}

/// Resolve `contract`, deploy it from the client's first account and wait for
/// confirmation. Every call is a fresh deployment.
pub async fn run<C>(
    client: &C,
    store: &ArtifactStore,
    contract: &str,
) -> Result<DeploymentResult, DeployError>
where
    C: ChainClient + ?Sized,
{
    let factory = store.resolve(contract)?;

    let deployer = client
        .accounts()
        .into_iter()
        .next()
        .ok_or(DeployError::NoAccounts)?;

    tracing::info!(
        contract = %factory.name,
        source = %factory.source_name,
        %deployer,
        size = factory.bytecode.len(),
        functions = factory.abi.functions().count(),
        "deploying contract"
    );
    let deployed = client.deploy(deployer, factory.bytecode).await?;
    tracing::info!(address = %deployed.address, tx_hash = %deployed.transaction_hash, "contract deployed");

    Ok(DeploymentResult {
        deployer,
        address: deployed.address,
        transaction_hash: deployed.transaction_hash,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::artifacts::ResolutionError;
    use crate::client::{DeployedContract, MockChainClient};
    use std::path::Path;

    fn write_nft_mint(root: &Path) {
        let dir = root.join("contracts/NFTMint.sol");
        std::fs::create_dir_all(&dir).unwrap();
        let artifact = serde_json::json!({
            "_format": "hh-sol-artifact-1",
            "contractName": "NFTMint",
            "sourceName": "contracts/NFTMint.sol",
            "abi": [],
            "bytecode": "0x6080604052",
            "deployedBytecode": "0x6080",
            "linkReferences": {},
            "deployedLinkReferences": {}
        });
        std::fs::write(dir.join("NFTMint.json"), artifact.to_string()).unwrap();
    }

    #[tokio::test]
    async fn test_run_deploys_from_first_account() {
        let dir = tempfile::tempdir().unwrap();
        write_nft_mint(dir.path());
        let store = ArtifactStore::new(dir.path());

        let first = Address::repeat_byte(0x11);
        let second = Address::repeat_byte(0x22);
        let contract = Address::repeat_byte(0xaa);

        let mut client = MockChainClient::new();
        client
            .expect_accounts()
            .return_const(vec![first, second]);
        client
            .expect_deploy()
            .withf(move |from, code| *from == first && code.to_vec() == vec![0x60u8, 0x80, 0x60, 0x40, 0x52])
            .times(1)
            .returning(move |_, _| {
                Ok(DeployedContract {
                    address: contract,
                    transaction_hash: B256::repeat_byte(0x01),
                })
            });

        let result = run(&client, &store, DEFAULT_CONTRACT).await.unwrap();
        assert_eq!(result.deployer, first);
        assert_eq!(result.address, contract);

        let output = result.to_string();
        let lines: Vec<&str> = output.lines().collect();
        assert_eq!(lines.len(), 2);
        assert_eq!(lines[0], format!("Contract Deployed by Account {first}"));
        assert_eq!(lines[1], format!("Contract Address {contract}"));
    }

    #[tokio::test]
    async fn test_unknown_contract_is_not_deployed() {
        let dir = tempfile::tempdir().unwrap();
        write_nft_mint(dir.path());
        let store = ArtifactStore::new(dir.path());

        let mut client = MockChainClient::new();
        client
            .expect_accounts()
            .return_const(vec![Address::repeat_byte(0x11)]);
        client.expect_deploy().never();

        let err = run(&client, &store, "Missing").await.unwrap_err();
        assert!(matches!(
            err,
            DeployError::Resolution(ResolutionError::NotFound { .. })
        ));
    }

    #[tokio::test]
    async fn test_no_accounts() {
        let dir = tempfile::tempdir().unwrap();
        write_nft_mint(dir.path());
        let store = ArtifactStore::new(dir.path());

        let mut client = MockChainClient::new();
        client.expect_accounts().return_const(Vec::<Address>::new());
        client.expect_deploy().never();

        let err = run(&client, &store, DEFAULT_CONTRACT).await.unwrap_err();
        assert!(matches!(err, DeployError::NoAccounts));
    }

    #[tokio::test]
    async fn test_chain_rejection_propagates() {
        let dir = tempfile::tempdir().unwrap();
        write_nft_mint(dir.path());
        let store = ArtifactStore::new(dir.path());

        let mut client = MockChainClient::new();
        client
            .expect_accounts()
            .return_const(vec![Address::repeat_byte(0x11)]);
        client.expect_deploy().times(1).returning(|_, _| {
            Err(DeployError::Transaction(
                "insufficient funds for gas * price + value".to_string(),
            ))
        });

        let err = run(&client, &store, DEFAULT_CONTRACT).await.unwrap_err();
        assert_eq!(
            err.to_string(),
            "Transaction error: insufficient funds for gas * price + value"
        );
    }

    #[tokio::test]
    async fn test_each_run_deploys_again() {
        let dir = tempfile::tempdir().unwrap();
        write_nft_mint(dir.path());
        let store = ArtifactStore::new(dir.path());

        let mut next = 0u8;
        let mut client = MockChainClient::new();
        client
            .expect_accounts()
            .return_const(vec![Address::repeat_byte(0x11)]);
        client.expect_deploy().times(2).returning(move |_, _| {
            next += 1;
            Ok(DeployedContract {
                address: Address::repeat_byte(next),
                transaction_hash: B256::repeat_byte(next),
            })
        });

        let a = run(&client, &store, DEFAULT_CONTRACT).await.unwrap();
        let b = run(&client, &store, DEFAULT_CONTRACT).await.unwrap();
        assert_ne!(a.address, b.address);
    }
}
