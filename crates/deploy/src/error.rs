//! Error taxonomy for deployment runs.

use std::{path::PathBuf, time::Duration};

use thiserror::Error;

use crate::pipeline::OutputRef;

/// Errors raised while executing or orchestrating deployment steps.
///
/// None of these are retried. Any of them aborts the scenario run it occurs in.
#[derive(Debug, Error)]
pub enum DeployError {
    /// The chain client failed: network/RPC failure or a transaction rejected by the chain.
    #[error("chain request `{operation}` failed: {source:#}")]
    ChainRequest {
        operation: &'static str,
        #[source]
        source: anyhow::Error,
    },

    /// A step references a field that no earlier step produced.
    #[error("step `{step}` references missing output `{reference}`")]
    MissingDependency { step: String, reference: OutputRef },

    /// The bytecode for a logical contract name is absent (or empty) at run time.
    #[error("artifact `{name}` not found at {}", .path.display())]
    ArtifactNotFound { name: String, path: PathBuf },

    /// A native amount of zero was requested for an execute call.
    #[error("native amount attached to `{contract}` must be greater than zero")]
    InvalidFunds { contract: String },

    /// A contract message failed validation before submission.
    #[error("invalid message for step `{step}`: {reason}")]
    InvalidMessage { step: String, reason: String },

    /// The scenario definition itself is malformed.
    #[error("invalid scenario `{scenario}`: {reason}")]
    InvalidScenario { scenario: String, reason: String },

    /// A chain operation did not complete within the configured timeout.
    #[error("chain request `{operation}` timed out after {after:?}")]
    Timeout {
        operation: &'static str,
        after: Duration,
    },

    /// The message payload could not be serialized.
    #[error("failed to build payload for step `{step}`: {source}")]
    Payload {
        step: String,
        #[source]
        source: serde_json::Error,
    },
}

impl DeployError {
    pub(crate) fn chain(operation: &'static str, source: anyhow::Error) -> Self {
        Self::ChainRequest { operation, source }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::OutputField;

    #[test]
    fn test_missing_dependency_format() {
        let err = DeployError::MissingDependency {
            step: "instantiate-collector".to_string(),
            reference: OutputRef::new("instantiate-feed", OutputField::ContractAddress),
        };
        assert_eq!(
            err.to_string(),
            "step `instantiate-collector` references missing output `instantiate-feed.contract_address`"
        );
    }

    #[test]
    fn test_chain_request_keeps_context() {
        let source = anyhow::anyhow!("insufficient fees").context("broadcast rejected");
        let err = DeployError::chain("upload", source);
        assert_eq!(
            err.to_string(),
            "chain request `upload` failed: broadcast rejected: insufficient fees"
        );
    }
}
