//! Typed deployment toolchain configuration
//!
//! This module describes the compiler version and the named networks a
//! deployment can target. Configuration is resolved in priority order:
//!
//! 1. deploy.toml in the working directory (or the path given on the CLI)
//! 2. Built-in default: Goerli through Alchemy
//!
//! Secrets never live in the TOML file. A network names the variables that
//! hold its API key and signing keys, and [`ToolchainConfig::profile`] looks
//! them up in [`Settings`].
//!
//! # Examples
//!
//! ```rust,no_run
//! use uhuru_tools::config::ToolchainConfig;
//! use uhuru_tools::settings::Settings;
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let settings = Settings::load("config.env");
//! let config = ToolchainConfig::load("deploy.toml")?;
//! let profile = config.profile("goerli", &settings)?;
//! println!("Endpoint: {}", profile.endpoint);
//! # Ok(())
//! # }
//! ```

use alloy::primitives::Address;
use alloy::signers::local::PrivateKeySigner;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::path::Path;
use std::time::Duration;
use thiserror::Error;
use url::Url;

use crate::settings::Settings;

/// Default configuration file, relative to the working directory
pub const DEFAULT_CONFIG_FILE: &str = "deploy.toml";

/// Placeholder replaced by the API key in a network URL template
pub const API_KEY_PLACEHOLDER: &str = "{api_key}";

/// Network used when none is given on the command line
pub const DEFAULT_NETWORK: &str = "goerli";

/// Configuration error types
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("TOML parse error: {0}")]
    TomlError(#[from] toml::de::Error),

    #[error("Unknown network: {0}")]
    UnknownNetwork(String),

    #[error("Missing environment variable {var} required by network {network}")]
    MissingVar { network: String, var: String },

    #[error("Invalid private key in {var}")]
    InvalidKey { var: String },

    #[error("API key in {var} must only contain letters, digits, '-' and '_'")]
    InvalidApiKey { var: String },

    #[error("Invalid endpoint URL for network {network}: {reason}")]
    InvalidUrl { network: String, reason: String },

    #[error("Network {network} expects chain id {expected} but the endpoint reports {actual}")]
    ChainIdMismatch {
        network: String,
        expected: u64,
        actual: u64,
    },

    #[error("Configuration validation failed: {0}")]
    ValidationError(String),
}

/// One named network from deploy.toml
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct NetworkConfig {
    /// Endpoint URL, optionally containing `{api_key}`
    pub url: String,
    /// Variable holding the API key substituted into `url`
    #[serde(default)]
    pub api_key_env: Option<String>,
    /// Variables holding the signing keys, first one deploys
    pub accounts_env: Vec<String>,
    /// Chain id the endpoint must report
    #[serde(default)]
    pub chain_id: Option<u64>,
    #[serde(default = "default_confirmations")]
    pub confirmations: u64,
    /// Upper bound on the confirmation wait; unbounded when absent
    #[serde(default)]
    pub confirmation_timeout_secs: Option<u64>,
}

fn default_confirmations() -> u64 {
    1
}

/// Complete toolchain configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ToolchainConfig {
    /// Solidity compiler version the artifacts were built with
    pub solidity: String,
    #[serde(default)]
    pub networks: BTreeMap<String, NetworkConfig>,
}

impl Default for ToolchainConfig {
    fn default() -> Self {
        let goerli = NetworkConfig {
            url: format!("https://eth-goerli.alchemyapi.io/v2/{API_KEY_PLACEHOLDER}"),
            api_key_env: Some("ALCHEMY_API_KEY".to_string()),
            accounts_env: vec!["WALLET_PRIVATE_KEY".to_string()],
            chain_id: Some(5),
            confirmations: default_confirmations(),
            confirmation_timeout_secs: None,
        };

        ToolchainConfig {
            solidity: "0.8.10".to_string(),
            networks: BTreeMap::from([(DEFAULT_NETWORK.to_string(), goerli)]),
        }
    }
}

/// Resolved connection profile for one network
#[derive(Debug, Clone)]
pub struct NetworkProfile {
    pub name: String,
    /// Endpoint with the API key substituted
    pub endpoint: Url,
    pub signers: Vec<PrivateKeySigner>,
    pub chain_id: Option<u64>,
    pub confirmations: u64,
    pub confirmation_timeout: Option<Duration>,
}

impl NetworkProfile {
    /// Addresses of the configured signers, in configuration order
    pub fn addresses(&self) -> Vec<Address> {
        self.signers.iter().map(PrivateKeySigner::address).collect()
    }
}

impl fmt::Display for NetworkProfile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({} signer(s))", self.name, self.signers.len())
    }
}

impl ToolchainConfig {
    /// Load configuration from `path`, falling back to the built-in default
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if the file exists but cannot be read, parsed or
    /// validated.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let config = if path.exists() {
            let content = std::fs::read_to_string(path)?;
            tracing::debug!(path = %path.display(), "loaded toolchain configuration");
            toml::from_str(&content)?
        } else {
            tracing::debug!(path = %path.display(), "no configuration file, using defaults");
            ToolchainConfig::default()
        };

        config.validate()?;
        Ok(config)
    }

    /// Validate configuration values
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !is_version(&self.solidity) {
            return Err(ConfigError::ValidationError(format!(
                "solidity version must look like MAJOR.MINOR.PATCH: {}",
                self.solidity
            )));
        }

        if self.networks.is_empty() {
            return Err(ConfigError::ValidationError(
                "at least one network must be defined".to_string(),
            ));
        }

        for (name, network) in &self.networks {
            network.validate(name)?;
        }

        Ok(())
    }

    /// Resolve the network called `name` against `settings`
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if:
    /// - The network is not defined
    /// - The API key or a signing key variable is unset or empty
    /// - The endpoint is not a valid http(s) URL
    /// - A signing key does not parse
    pub fn profile(&self, name: &str, settings: &Settings) -> Result<NetworkProfile, ConfigError> {
        let network = self
            .networks
            .get(name)
            .ok_or_else(|| ConfigError::UnknownNetwork(name.to_string()))?;

        let lookup = move |var: &str| {
            settings.get(var).ok_or_else(|| ConfigError::MissingVar {
                network: name.to_string(),
                var: var.to_string(),
            })
        };

        let url = match &network.api_key_env {
            Some(var) => {
                let key = lookup(var.as_str())?;
                if !is_url_safe(key) {
                    return Err(ConfigError::InvalidApiKey { var: var.clone() });
                }
                network.url.replace(API_KEY_PLACEHOLDER, key)
            }
            None => network.url.clone(),
        };
        let endpoint = parse_endpoint(name, &url)?;

        let signers = network
            .accounts_env
            .iter()
            .map(|var| {
                lookup(var.as_str())?
                    .trim()
                    .parse::<PrivateKeySigner>()
                    .map_err(|_| ConfigError::InvalidKey { var: var.clone() })
            })
            .collect::<Result<Vec<_>, _>>()?;

        Ok(NetworkProfile {
            name: name.to_string(),
            endpoint,
            signers,
            chain_id: network.chain_id,
            confirmations: network.confirmations,
            confirmation_timeout: network.confirmation_timeout_secs.map(Duration::from_secs),
        })
    }

    /// Resolve every network against `settings` for display. Networks that
    /// fail to resolve are reported with the reason instead of failing.
    pub fn summary(&self, settings: &Settings) -> ConfigSummary {
        let networks = self
            .networks
            .iter()
            .map(|(name, network)| {
                let (accounts, error) = match self.profile(name, settings) {
                    Ok(profile) => (
                        profile.addresses().iter().map(Address::to_string).collect(),
                        None,
                    ),
                    Err(err) => (Vec::new(), Some(err.to_string())),
                };

                NetworkSummary {
                    name: name.clone(),
                    url: network.url.replace(API_KEY_PLACEHOLDER, MASK),
                    chain_id: network.chain_id,
                    confirmations: network.confirmations,
                    confirmation_timeout_secs: network.confirmation_timeout_secs,
                    accounts,
                    error,
                }
            })
            .collect();

        ConfigSummary {
            solidity: self.solidity.clone(),
            networks,
        }
    }
}

const MASK: &str = "***";

/// Resolved configuration, safe to print
#[derive(Debug, Clone, Serialize)]
pub struct ConfigSummary {
    pub solidity: String,
    pub networks: Vec<NetworkSummary>,
}

#[derive(Debug, Clone, Serialize)]
pub struct NetworkSummary {
    pub name: String,
    /// Endpoint with the API key masked
    pub url: String,
    pub chain_id: Option<u64>,
    pub confirmations: u64,
    pub confirmation_timeout_secs: Option<u64>,
    /// Signer addresses, deployer first
    pub accounts: Vec<String>,
    pub error: Option<String>,
}

impl ConfigSummary {
    /// Print the resolved configuration. Secrets are never shown.
    pub fn print_summary(&self) {
        println!("Solidity:            {}", self.solidity);
        for network in &self.networks {
            println!("Network {}:", network.name);
            println!("  URL:               {}", network.url);
            match network.chain_id {
                Some(id) => println!("  Chain ID:          {id}"),
                None => println!("  Chain ID:          (not pinned)"),
            }
            println!("  Confirmations:     {}", network.confirmations);
            if let Some(secs) = network.confirmation_timeout_secs {
                println!("  Confirm timeout:   {secs}s");
            }
            if let Some(ref err) = network.error {
                println!("  Accounts:          (unresolved: {err})");
            } else {
                for (i, account) in network.accounts.iter().enumerate() {
                    let label = if i == 0 { "Accounts:" } else { "" };
                    println!("  {label:<19}{account}");
                }
            }
        }
    }

    /// Get configuration as JSON
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }
}

impl NetworkConfig {
    fn validate(&self, name: &str) -> Result<(), ConfigError> {
        let invalid = |reason: String| ConfigError::ValidationError(format!("network {name}: {reason}"));

        if self.url.is_empty() {
            return Err(invalid("url must not be empty".to_string()));
        }

        let has_placeholder = self.url.contains(API_KEY_PLACEHOLDER);
        match (&self.api_key_env, has_placeholder) {
            (Some(var), false) => {
                return Err(invalid(format!(
                    "api_key_env {var} is set but url has no {API_KEY_PLACEHOLDER} placeholder"
                )))
            }
            (None, true) => {
                return Err(invalid(format!(
                    "url contains {API_KEY_PLACEHOLDER} but api_key_env is not set"
                )))
            }
            _ => {}
        }

        if !self.url.starts_with("http://") && !self.url.starts_with("https://") {
            return Err(invalid(format!(
                "url must start with http:// or https://: {}",
                self.url
            )));
        }

        if self.accounts_env.is_empty() {
            return Err(invalid("accounts_env must name at least one variable".to_string()));
        }

        if self.confirmations == 0 {
            return Err(invalid("confirmations must be at least 1".to_string()));
        }

        Ok(())
    }
}

fn parse_endpoint(network: &str, url: &str) -> Result<Url, ConfigError> {
    let invalid = |reason: String| ConfigError::InvalidUrl {
        network: network.to_string(),
        reason,
    };

    let endpoint = Url::parse(url).map_err(|err| invalid(err.to_string()))?;
    match endpoint.scheme() {
        "http" | "https" => Ok(endpoint),
        other => Err(invalid(format!("unsupported scheme {other}"))),
    }
}

fn is_url_safe(key: &str) -> bool {
    key.chars()
        .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
}

fn is_version(s: &str) -> bool {
    let parts: Vec<&str> = s.split('.').collect();
    parts.len() == 3
        && parts
            .iter()
            .all(|part| !part.is_empty() && part.chars().all(|c| c.is_ascii_digit()))
}
