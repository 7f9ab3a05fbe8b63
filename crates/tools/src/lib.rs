//! Uhuru deployment tools
//!
//! Loads the local settings file and the typed toolchain configuration,
//! resolves compiled contract artifacts and deploys them to an EVM network.

pub mod artifacts;
pub mod client;
pub mod config;
pub mod deploy;
pub mod error;
pub mod settings;

pub use artifacts::{ArtifactStore, ContractFactory, ResolutionError};
pub use client::{ChainClient, DeployedContract, RpcClient};
pub use config::{ConfigError, NetworkProfile, ToolchainConfig};
pub use deploy::DeploymentResult;
pub use error::DeployError;
pub use settings::Settings;
