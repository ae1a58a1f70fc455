//! A named, ordered list of deployment steps.

use std::collections::HashMap;

use super::{Bindable, DeploymentStep, Operation};
use crate::DeployError;

/// A fixed deployment scenario.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Scenario {
    pub name: String,
    pub steps: Vec<DeploymentStep>,
}

impl Scenario {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            steps: Vec::new(),
        }
    }

    /// Append a step.
    pub fn step(mut self, step: DeploymentStep) -> Self {
        self.steps.push(step);
        self
    }

    /// Check the step graph without touching the chain.
    ///
    /// Every reference must name a strictly earlier step that can produce the referenced
    /// field. Step names must be unique and execute steps may not request a zero amount.
    pub fn validate(&self) -> Result<(), DeployError> {
        if self.steps.is_empty() {
            return Err(self.invalid("scenario has no steps"));
        }

        let mut earlier: HashMap<&str, &Operation> = HashMap::new();

        for step in &self.steps {
            if step.name.trim().is_empty() {
                return Err(self.invalid("step names must not be empty"));
            }

            for reference in step.operation.references() {
                let produced = earlier
                    .get(reference.step.as_str())
                    .is_some_and(|op| op.produces(&reference.field));
                if !produced {
                    return Err(DeployError::MissingDependency {
                        step: step.name.clone(),
                        reference: reference.clone(),
                    });
                }
            }

            if let Operation::Execute {
                contract,
                native_amount: Some(0),
                ..
            } = &step.operation
            {
                return Err(DeployError::InvalidFunds {
                    contract: contract.to_string(),
                });
            }

            if earlier.insert(&step.name, &step.operation).is_some() {
                return Err(self.invalid(format!("duplicate step name `{}`", step.name)));
            }
        }

        Ok(())
    }

    fn invalid(&self, reason: impl Into<String>) -> DeployError {
        DeployError::InvalidScenario {
            scenario: self.name.clone(),
            reason: reason.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        contracts::{price_collector, price_feed},
        pipeline::{Binding, OutputField},
    };

    const CONTROLLER: &str = "aura1s9e6r0qv8nvfgzhdw9z23rpvgzzdwavu2qfjdd";

    fn feed_init() -> price_feed::InstantiateMsg {
        price_feed::InstantiateMsg {
            controller: CONTROLLER.into(),
            decimals: 6,
            description: "AURA / VND".to_string(),
        }
    }

    #[test]
    fn test_valid_chain() {
        let scenario = Scenario::new("feed")
            .step(DeploymentStep::upload("upload-feed", "price_feed"))
            .step(DeploymentStep::instantiate(
                "instantiate-feed",
                Binding::code_id_of("upload-feed"),
                feed_init(),
            ));
        assert!(scenario.validate().is_ok());
    }

    #[test]
    fn test_empty_scenario() {
        assert!(matches!(
            Scenario::new("empty").validate(),
            Err(DeployError::InvalidScenario { .. })
        ));
    }

    #[test]
    fn test_forward_reference_is_missing_dependency() {
        let scenario = Scenario::new("backwards")
            .step(DeploymentStep::instantiate(
                "instantiate-feed",
                Binding::code_id_of("upload-feed"),
                feed_init(),
            ))
            .step(DeploymentStep::upload("upload-feed", "price_feed"));

        match scenario.validate() {
            Err(DeployError::MissingDependency { step, reference }) => {
                assert_eq!(step, "instantiate-feed");
                assert_eq!(reference.step, "upload-feed");
            }
            other => panic!("unexpected result: {other:?}"),
        }
    }

    #[test]
    fn test_reference_to_unproduced_field() {
        let scenario = Scenario::new("wrong-field")
            .step(DeploymentStep::upload("upload-feed", "price_feed"))
            .step(DeploymentStep::instantiate(
                "instantiate-collector",
                Binding::code_id_of("upload-feed"),
                price_collector::InstantiateMsg {
                    price_feed: Binding::output("upload-feed", OutputField::ContractAddress),
                    decimals: 6,
                },
            ));

        assert!(matches!(
            scenario.validate(),
            Err(DeployError::MissingDependency { .. })
        ));
    }

    #[test]
    fn test_duplicate_step_names() {
        let scenario = Scenario::new("dup")
            .step(DeploymentStep::upload("upload", "price_feed"))
            .step(DeploymentStep::upload("upload", "price_collector"));

        assert!(matches!(
            scenario.validate(),
            Err(DeployError::InvalidScenario { .. })
        ));
    }

    #[test]
    fn test_zero_native_amount_rejected() {
        let scenario = Scenario::new("zero").step(
            DeploymentStep::execute(
                "update",
                CONTROLLER,
                price_feed::ExecuteMsg::UpdateRoundData { answer: 1 },
            )
            .with_funds(0),
        );

        assert!(matches!(
            scenario.validate(),
            Err(DeployError::InvalidFunds { .. })
        ));
    }
}
