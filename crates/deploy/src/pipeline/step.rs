//! Declarative deployment steps.

use serde::Serialize;

use super::{Binding, Bindable, OutputField, OutputRef, PipelineContext};
use crate::{
    DeployError,
    contracts::{ExecuteMsg, InstantiateMsg, QueryMsg},
};

/// The primitive chain operation a step performs.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, strum::Display, strum::EnumString,
)]
#[serde(rename_all = "kebab-case")]
#[strum(serialize_all = "kebab-case")]
pub enum StepKind {
    Upload,
    Instantiate,
    Execute,
    Query,
}

/// What a step does, with its inputs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Operation {
    /// Store the bytecode of a logical contract name.
    Upload { artifact: String },
    /// Instantiate stored code.
    Instantiate {
        code_id: Binding<u64>,
        msg: InstantiateMsg,
        label: Option<String>,
        admin: Option<Binding<String>>,
    },
    /// Execute a message, optionally paying native currency.
    Execute {
        contract: Binding<String>,
        msg: ExecuteMsg,
        native_amount: Option<u128>,
    },
    /// Read-only smart query.
    Query {
        contract: Binding<String>,
        msg: QueryMsg,
    },
}

impl Operation {
    pub fn kind(&self) -> StepKind {
        match self {
            Operation::Upload { .. } => StepKind::Upload,
            Operation::Instantiate { .. } => StepKind::Instantiate,
            Operation::Execute { .. } => StepKind::Execute,
            Operation::Query { .. } => StepKind::Query,
        }
    }

    /// Whether a successful run of this operation yields `field`.
    pub fn produces(&self, field: &OutputField) -> bool {
        matches!(
            (self.kind(), field),
            (StepKind::Upload, OutputField::CodeId | OutputField::TransactionHash)
                | (
                    StepKind::Instantiate,
                    OutputField::ContractAddress | OutputField::TransactionHash
                )
                | (StepKind::Execute, OutputField::TransactionHash | OutputField::Data(_))
                | (StepKind::Query, OutputField::Data(_))
        )
    }

    /// One-line description used in plans and logs.
    pub fn describe(&self) -> String {
        match self {
            Operation::Upload { artifact } => format!("upload {}.wasm", artifact),
            Operation::Instantiate { code_id, msg, .. } => {
                format!("instantiate {} from code {}", msg.contract_name(), code_id)
            }
            Operation::Execute {
                contract,
                msg,
                native_amount,
            } => {
                let mut description =
                    format!("{}::{} on {}", msg.contract_name(), msg.method(), contract);
                if let Some(amount) = native_amount {
                    description.push_str(&format!(" paying {}", amount));
                }
                description
            }
            Operation::Query { contract, msg } => {
                format!("query {}::{} on {}", msg.contract_name(), msg.method(), contract)
            }
        }
    }
}

impl Bindable for Operation {
    fn references(&self) -> Vec<&OutputRef> {
        match self {
            Operation::Upload { .. } => Vec::new(),
            Operation::Instantiate {
                code_id,
                msg,
                admin,
                ..
            } => {
                let mut refs = code_id.references();
                refs.extend(msg.references());
                refs.extend(admin.references());
                refs
            }
            Operation::Execute { contract, msg, .. } => {
                let mut refs = contract.references();
                refs.extend(msg.references());
                refs
            }
            Operation::Query { contract, msg } => {
                let mut refs = contract.references();
                refs.extend(msg.references());
                refs
            }
        }
    }

    fn bind(&mut self, step: &str, ctx: &PipelineContext) -> Result<(), DeployError> {
        match self {
            Operation::Upload { .. } => Ok(()),
            Operation::Instantiate {
                code_id,
                msg,
                admin,
                ..
            } => {
                code_id.bind(step, ctx)?;
                msg.bind(step, ctx)?;
                admin.bind(step, ctx)
            }
            Operation::Execute { contract, msg, .. } => {
                contract.bind(step, ctx)?;
                msg.bind(step, ctx)
            }
            Operation::Query { contract, msg } => {
                contract.bind(step, ctx)?;
                msg.bind(step, ctx)
            }
        }
    }
}

/// One named stage of a scenario.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeploymentStep {
    pub name: String,
    pub operation: Operation,
}

impl DeploymentStep {
    pub fn upload(name: impl Into<String>, artifact: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            operation: Operation::Upload {
                artifact: artifact.into(),
            },
        }
    }

    pub fn instantiate(
        name: impl Into<String>,
        code_id: impl Into<Binding<u64>>,
        msg: impl Into<InstantiateMsg>,
    ) -> Self {
        Self {
            name: name.into(),
            operation: Operation::Instantiate {
                code_id: code_id.into(),
                msg: msg.into(),
                label: None,
                admin: None,
            },
        }
    }

    pub fn execute(
        name: impl Into<String>,
        contract: impl Into<Binding<String>>,
        msg: impl Into<ExecuteMsg>,
    ) -> Self {
        Self {
            name: name.into(),
            operation: Operation::Execute {
                contract: contract.into(),
                msg: msg.into(),
                native_amount: None,
            },
        }
    }

    pub fn query(
        name: impl Into<String>,
        contract: impl Into<Binding<String>>,
        msg: impl Into<QueryMsg>,
    ) -> Self {
        Self {
            name: name.into(),
            operation: Operation::Query {
                contract: contract.into(),
                msg: msg.into(),
            },
        }
    }

    /// Attach a native-currency amount. Only meaningful for execute steps.
    pub fn with_funds(mut self, amount: u128) -> Self {
        if let Operation::Execute { native_amount, .. } = &mut self.operation {
            *native_amount = Some(amount);
        }
        self
    }

    /// Set the instantiation label. Only meaningful for instantiate steps.
    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        if let Operation::Instantiate { label: current, .. } = &mut self.operation {
            *current = Some(label.into());
        }
        self
    }

    /// Set the contract admin. Only meaningful for instantiate steps.
    pub fn with_admin(mut self, admin: impl Into<Binding<String>>) -> Self {
        if let Operation::Instantiate { admin: current, .. } = &mut self.operation {
            *current = Some(admin.into());
        }
        self
    }

    pub fn kind(&self) -> StepKind {
        self.operation.kind()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::contracts::price_feed;

    #[test]
    fn test_produces() {
        let upload = DeploymentStep::upload("upload-feed", "price_feed");
        assert!(upload.operation.produces(&OutputField::CodeId));
        assert!(!upload.operation.produces(&OutputField::ContractAddress));

        let query = DeploymentStep::query(
            "round",
            "aura1s9e6r0qv8nvfgzhdw9z23rpvgzzdwavu2qfjdd",
            price_feed::QueryMsg::LatestRoundData {},
        );
        assert!(query.operation.produces(&OutputField::Data("/answer".to_string())));
        assert!(!query.operation.produces(&OutputField::TransactionHash));
    }

    #[test]
    fn test_with_funds_only_applies_to_execute() {
        let upload = DeploymentStep::upload("upload-feed", "price_feed").with_funds(10);
        assert_eq!(
            upload.operation,
            Operation::Upload {
                artifact: "price_feed".to_string()
            }
        );

        let execute = DeploymentStep::execute(
            "update",
            Binding::contract_address_of("instantiate-feed"),
            price_feed::ExecuteMsg::UpdateRoundData { answer: 1 },
        )
        .with_funds(10);
        assert!(matches!(
            execute.operation,
            Operation::Execute {
                native_amount: Some(10),
                ..
            }
        ));
        assert_eq!(
            execute.operation.describe(),
            "price_feed::update_round_data on <instantiate-feed.contract_address> paying 10"
        );
    }

    #[test]
    fn test_references() {
        let step = DeploymentStep::execute(
            "update-controller",
            Binding::contract_address_of("instantiate-feed"),
            price_feed::ExecuteMsg::UpdateController {
                controller: Binding::contract_address_of("instantiate-collector"),
            },
        );

        let refs: Vec<String> = step
            .operation
            .references()
            .iter()
            .map(|r| r.to_string())
            .collect();
        assert_eq!(
            refs,
            vec![
                "instantiate-feed.contract_address",
                "instantiate-collector.contract_address"
            ]
        );
    }
}
