//! Contract factory resolution from compiled artifacts.
//!
//! The compiler toolchain writes one JSON artifact per contract, laid out as
//! `artifacts/contracts/<File>.sol/<Name>.json`. A [`ContractFactory`] is the
//! deployable part of such an artifact, looked up by contract name.

use alloy::json_abi::JsonAbi;
use alloy::primitives::Bytes;
use serde::Deserialize;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Default artifacts directory, relative to the working directory
pub const DEFAULT_ARTIFACTS_DIR: &str = "artifacts";

const BUILD_INFO_DIR: &str = "build-info";

#[derive(Error, Debug)]
pub enum ResolutionError {
    #[error("Artifact for contract {name} not found in {}", root.display())]
    NotFound { name: String, root: PathBuf },

    #[error("Multiple artifacts for contract {name}: {}", sources.join(", "))]
    Ambiguous { name: String, sources: Vec<String> },

    #[error("Contract {0} has no bytecode (abstract contract or interface)")]
    NotDeployable(String),

    #[error("Contract {name} must be linked against libraries: {}", libraries.join(", "))]
    UnlinkedLibraries { name: String, libraries: Vec<String> },

    #[error("Contract {name} constructor expects {count} argument(s), none given")]
    ConstructorArgs { name: String, count: usize },

    #[error("Malformed artifact {}: {source}", path.display())]
    Malformed {
        path: PathBuf,
        source: serde_json::Error,
    },

    #[error("IO error reading {}: {source}", path.display())]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Artifact {
    contract_name: String,
    source_name: String,
    abi: JsonAbi,
    bytecode: Bytes,
    #[serde(default)]
    link_references: BTreeMap<String, BTreeMap<String, serde_json::Value>>,
}

/// A named, precompiled contract ready for deployment
#[derive(Debug, Clone)]
pub struct ContractFactory {
    pub name: String,
    pub source_name: String,
    pub abi: JsonAbi,
    pub bytecode: Bytes,
}

/// Read-only view over an artifacts directory
#[derive(Debug, Clone)]
pub struct ArtifactStore {
    root: PathBuf,
}

impl ArtifactStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        ArtifactStore { root: root.into() }
    }

    /// Resolve the contract called `name` into a deployable factory
    pub fn resolve(&self, name: &str) -> Result<ContractFactory, ResolutionError> {
        let file_name = format!("{name}.json");
        let mut candidates = Vec::new();
        if self.root.is_dir() {
            collect(&self.root, &file_name, &mut candidates)?;
        }
        candidates.sort();

        let mut matches = Vec::new();
        for path in candidates {
            let content = std::fs::read_to_string(&path).map_err(|source| ResolutionError::Io {
                path: path.clone(),
                source,
            })?;
            let artifact: Artifact = serde_json::from_str(&content)
                .map_err(|source| ResolutionError::Malformed { path, source })?;
            if artifact.contract_name == name {
                matches.push(artifact);
            }
        }

        let artifact = match matches.len() {
            0 => {
                return Err(ResolutionError::NotFound {
                    name: name.to_string(),
                    root: self.root.clone(),
                })
            }
            1 => matches.remove(0),
            _ => {
                return Err(ResolutionError::Ambiguous {
                    name: name.to_string(),
                    sources: matches.into_iter().map(|a| a.source_name).collect(),
                })
            }
        };

        tracing::debug!(name, source = %artifact.source_name, "resolved contract artifact");
        artifact.into_factory()
    }
}

impl Artifact {
    fn into_factory(self) -> Result<ContractFactory, ResolutionError> {
        if self.bytecode.is_empty() {
            return Err(ResolutionError::NotDeployable(self.contract_name));
        }

        if !self.link_references.is_empty() {
            let libraries = self
                .link_references
                .iter()
                .flat_map(|(source, libs)| libs.keys().map(move |lib| format!("{source}:{lib}")))
                .collect();
            return Err(ResolutionError::UnlinkedLibraries {
                name: self.contract_name,
                libraries,
            });
        }

        let count = self.abi.constructor.as_ref().map_or(0, |c| c.inputs.len());
        if count > 0 {
            return Err(ResolutionError::ConstructorArgs {
                name: self.contract_name,
                count,
            });
        }

        Ok(ContractFactory {
            name: self.contract_name,
            source_name: self.source_name,
            abi: self.abi,
            bytecode: self.bytecode,
        })
    }
}

fn collect(dir: &Path, file_name: &str, out: &mut Vec<PathBuf>) -> Result<(), ResolutionError> {
    let io_err = |source| ResolutionError::Io {
        path: dir.to_path_buf(),
        source,
    };

    for entry in std::fs::read_dir(dir).map_err(io_err)? {
        let entry = entry.map_err(io_err)?;
        let path = entry.path();
        if entry.file_type().map_err(io_err)?.is_dir() {
            if path.file_name().is_some_and(|n| n == BUILD_INFO_DIR) {
                continue;
            }
            collect(&path, file_name, out)?;
        } else if path.file_name().is_some_and(|n| n == file_name) {
            out.push(path);
        }
    }

    Ok(())
}
