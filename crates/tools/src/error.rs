use alloy::transports::TransportError;
use thiserror::Error;

use crate::artifacts::ResolutionError;
use crate::config::ConfigError;

/// Errors surfaced by a deployment run
#[derive(Error, Debug)]
pub enum DeployError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Resolution error: {0}")]
    Resolution(#[from] ResolutionError),

    #[error("Configuration error: no signing accounts configured")]
    NoAccounts,

    /// Endpoint unreachable or the wait for confirmation failed
    #[error("Network error: {0}")]
    Network(String),

    /// The node or the chain rejected the deployment
    #[error("Transaction error: {0}")]
    Transaction(String),
}

impl From<TransportError> for DeployError {
    fn from(err: TransportError) -> Self {
        match err.as_error_resp() {
            Some(payload) => DeployError::Transaction(payload.to_string()),
            None => DeployError::Network(err.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloy::rpc::json_rpc::ErrorPayload;
    use alloy::transports::{RpcError, TransportErrorKind};

    #[test]
    fn test_transport_failure_is_network_error() {
        let err: DeployError = TransportErrorKind::backend_gone().into();
        assert!(matches!(err, DeployError::Network(_)));
    }

    #[test]
    fn test_node_error_response_is_transaction_error() {
        let err: TransportError = RpcError::ErrorResp(ErrorPayload {
            code: -32000,
            message: "insufficient funds".into(),
            data: None,
        });

        match DeployError::from(err) {
            DeployError::Transaction(text) => assert!(text.contains("insufficient funds")),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_resolution_error_passes_text_through() {
        let err: DeployError = ResolutionError::NotDeployable("IERC721".to_string()).into();
        assert_eq!(
            err.to_string(),
            "Resolution error: Contract IERC721 has no bytecode (abstract contract or interface)"
        );
    }
}
