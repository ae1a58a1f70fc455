//! cosmup-deploy - Deployment library for CosmWasm contracts.
//!
//! This crate uploads, instantiates and wires together CosmWasm contracts by running
//! declarative scenarios: ordered step lists whose later steps consume the code ids and
//! contract addresses produced by earlier ones.

mod artifacts;
pub use artifacts::{Artifact, ArtifactStore};

mod builder;
pub use builder::DeployerBuilder;

pub mod chain;
pub use chain::{ChainClient, Coin, Fee, GasPrice, JsonRpcChainClient};

mod config;
pub use config::{CONFIG_FILENAME, DeployConfig, DeploySettings, ENV_PREFIX, NetworkConfig};

pub mod contracts;

mod deployer;
pub use deployer::Deployer;

mod error;
pub use error::DeployError;

mod executor;
pub use executor::{DeployContext, StepExecutor};

pub mod pipeline;
pub use pipeline::{
    Binding, DeploymentStep, Orchestrator, OutputField, RunAborted, RunReport, RunState,
    Scenario, StepKind, StepResult,
};

pub mod scenarios;
pub use scenarios::{ScenarioKind, ScenarioParams};
