//! References from step inputs to outputs of earlier steps.

use std::fmt;

use serde::{Serialize, Serializer, ser::Error as _};

use super::{PipelineContext, StepResult};
use crate::DeployError;

/// A field of a [`StepResult`] that later steps can bind to.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum OutputField {
    CodeId,
    ContractAddress,
    TransactionHash,
    /// A JSON pointer into the data returned by an execute or query step.
    Data(String),
}

impl fmt::Display for OutputField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OutputField::CodeId => write!(f, "code_id"),
            OutputField::ContractAddress => write!(f, "contract_address"),
            OutputField::TransactionHash => write!(f, "transaction_hash"),
            OutputField::Data(pointer) => write!(f, "data{}", pointer),
        }
    }
}

/// Names one field of one earlier step.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct OutputRef {
    pub step: String,
    pub field: OutputField,
}

impl OutputRef {
    pub fn new(step: impl Into<String>, field: OutputField) -> Self {
        Self {
            step: step.into(),
            field,
        }
    }
}

impl fmt::Display for OutputRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.step, self.field)
    }
}

/// Values that can be read out of a [`StepResult`].
pub trait FromStepResult: Sized {
    fn from_step_result(result: &StepResult, field: &OutputField) -> Option<Self>;
}

impl FromStepResult for String {
    fn from_step_result(result: &StepResult, field: &OutputField) -> Option<Self> {
        match field {
            OutputField::CodeId => result.code_id().map(|id| id.to_string()),
            OutputField::ContractAddress => result.contract_address().map(str::to_owned),
            OutputField::TransactionHash => result.transaction_hash().map(str::to_owned),
            OutputField::Data(pointer) => match result.data()?.pointer(pointer)? {
                serde_json::Value::String(s) => Some(s.clone()),
                serde_json::Value::Number(n) => Some(n.to_string()),
                _ => None,
            },
        }
    }
}

impl FromStepResult for u64 {
    fn from_step_result(result: &StepResult, field: &OutputField) -> Option<Self> {
        match field {
            OutputField::CodeId => result.code_id(),
            OutputField::Data(pointer) => match result.data()?.pointer(pointer)? {
                serde_json::Value::Number(n) => n.as_u64(),
                serde_json::Value::String(s) => s.parse().ok(),
                _ => None,
            },
            OutputField::ContractAddress | OutputField::TransactionHash => None,
        }
    }
}

/// A step input: either a literal or a reference to an earlier step's output.
///
/// An unbound reference refuses to serialize, so a payload can never leave with one inside.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Binding<T> {
    Literal(T),
    Output(OutputRef),
}

impl<T> Binding<T> {
    /// Reference `field` of the step named `step`.
    pub fn output(step: impl Into<String>, field: OutputField) -> Self {
        Binding::Output(OutputRef::new(step, field))
    }

    pub fn contract_address_of(step: impl Into<String>) -> Self {
        Self::output(step, OutputField::ContractAddress)
    }

    pub fn code_id_of(step: impl Into<String>) -> Self {
        Self::output(step, OutputField::CodeId)
    }

    pub fn as_literal(&self) -> Option<&T> {
        match self {
            Binding::Literal(value) => Some(value),
            Binding::Output(_) => None,
        }
    }

    pub fn reference(&self) -> Option<&OutputRef> {
        match self {
            Binding::Literal(_) => None,
            Binding::Output(reference) => Some(reference),
        }
    }

    /// Take the bound value out, failing if the reference was never resolved.
    pub fn into_value(self, step: &str) -> Result<T, DeployError> {
        match self {
            Binding::Literal(value) => Ok(value),
            Binding::Output(reference) => Err(DeployError::MissingDependency {
                step: step.to_string(),
                reference,
            }),
        }
    }
}

impl<T> From<T> for Binding<T> {
    fn from(value: T) -> Self {
        Binding::Literal(value)
    }
}

impl From<&str> for Binding<String> {
    fn from(value: &str) -> Self {
        Binding::Literal(value.to_string())
    }
}

impl<T: fmt::Display> fmt::Display for Binding<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Binding::Literal(value) => value.fmt(f),
            Binding::Output(reference) => write!(f, "<{}>", reference),
        }
    }
}

impl<T: Serialize> Serialize for Binding<T> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Binding::Literal(value) => value.serialize(serializer),
            Binding::Output(reference) => Err(S::Error::custom(format!(
                "unresolved reference `{}`",
                reference
            ))),
        }
    }
}

/// Step inputs that may contain references to earlier outputs.
pub trait Bindable {
    /// Every reference still waiting to be bound.
    fn references(&self) -> Vec<&OutputRef>;

    /// Replace every reference with the value found in `ctx`.
    fn bind(&mut self, step: &str, ctx: &PipelineContext) -> Result<(), DeployError>;
}

impl<T: FromStepResult> Bindable for Binding<T> {
    fn references(&self) -> Vec<&OutputRef> {
        self.reference().into_iter().collect()
    }

    fn bind(&mut self, step: &str, ctx: &PipelineContext) -> Result<(), DeployError> {
        if let Binding::Output(reference) = self {
            let value = ctx
                .resolve::<T>(reference)
                .ok_or_else(|| DeployError::MissingDependency {
                    step: step.to_string(),
                    reference: reference.clone(),
                })?;
            tracing::debug!(step, reference = %reference, "Bound step input");
            *self = Binding::Literal(value);
        }
        Ok(())
    }
}

impl<B: Bindable> Bindable for Option<B> {
    fn references(&self) -> Vec<&OutputRef> {
        self.as_ref().map(B::references).unwrap_or_default()
    }

    fn bind(&mut self, step: &str, ctx: &PipelineContext) -> Result<(), DeployError> {
        match self {
            Some(inner) => inner.bind(step, ctx),
            None => Ok(()),
        }
    }
}

impl<B: Bindable> Bindable for Vec<B> {
    fn references(&self) -> Vec<&OutputRef> {
        self.iter().flat_map(B::references).collect()
    }

    fn bind(&mut self, step: &str, ctx: &PipelineContext) -> Result<(), DeployError> {
        self.iter_mut().try_for_each(|inner| inner.bind(step, ctx))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chain::TxInfo;

    fn tx(hash: &str) -> TxInfo {
        TxInfo {
            transaction_hash: hash.to_string(),
            gas_wanted: 200_000,
            gas_used: 150_000,
        }
    }

    fn context() -> PipelineContext {
        let mut ctx = PipelineContext::default();
        ctx.insert(
            "upload-feed",
            StepResult::Uploaded {
                tx: tx("AA"),
                code_id: 17,
                checksum: "00".to_string(),
            },
        )
        .unwrap();
        ctx.insert(
            "instantiate-feed",
            StepResult::Instantiated {
                tx: tx("BB"),
                contract_address: "aura1feed".to_string(),
            },
        )
        .unwrap();
        ctx.insert(
            "query-info",
            StepResult::Queried {
                data: serde_json::json!({ "token_address": "aura1token", "round": 3 }),
            },
        )
        .unwrap();
        ctx
    }

    #[test]
    fn test_bind_contract_address() {
        let ctx = context();
        let mut binding: Binding<String> = Binding::contract_address_of("instantiate-feed");
        binding.bind("instantiate-collector", &ctx).unwrap();
        assert_eq!(binding, Binding::Literal("aura1feed".to_string()));
    }

    #[test]
    fn test_bind_code_id() {
        let ctx = context();
        let mut binding: Binding<u64> = Binding::code_id_of("upload-feed");
        binding.bind("instantiate-feed", &ctx).unwrap();
        assert_eq!(binding.as_literal(), Some(&17));
    }

    #[test]
    fn test_bind_query_data() {
        let ctx = context();
        let mut address: Binding<String> =
            Binding::output("query-info", OutputField::Data("/token_address".to_string()));
        address.bind("mint", &ctx).unwrap();
        assert_eq!(address.as_literal().map(String::as_str), Some("aura1token"));

        let mut round: Binding<u64> =
            Binding::output("query-info", OutputField::Data("/round".to_string()));
        round.bind("mint", &ctx).unwrap();
        assert_eq!(round.as_literal(), Some(&3));
    }

    #[test]
    fn test_bind_wrong_field_is_missing_dependency() {
        let ctx = context();
        let mut binding: Binding<String> = Binding::contract_address_of("upload-feed");
        let err = binding.bind("instantiate-feed", &ctx).unwrap_err();
        assert!(matches!(err, DeployError::MissingDependency { .. }));
    }

    #[test]
    fn test_unbound_reference_does_not_serialize() {
        let binding: Binding<String> = Binding::contract_address_of("instantiate-feed");
        assert!(serde_json::to_value(&binding).is_err());

        let literal: Binding<String> = "aura1feed".into();
        assert_eq!(serde_json::to_value(&literal).unwrap(), "aura1feed");
    }
}
