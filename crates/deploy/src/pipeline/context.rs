//! Step results and the per-run context that accumulates them.

use serde::Serialize;
use serde_json::Value;

use super::{FromStepResult, OutputRef, StepKind};
use crate::chain::TxInfo;

/// Outcome of one chain operation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum StepResult {
    Uploaded {
        tx: TxInfo,
        code_id: u64,
        checksum: String,
    },
    Instantiated {
        tx: TxInfo,
        contract_address: String,
    },
    Executed {
        tx: TxInfo,
        data: Option<Value>,
    },
    Queried {
        data: Value,
    },
}

impl StepResult {
    /// The kind of step that produced this result.
    pub fn kind(&self) -> StepKind {
        match self {
            StepResult::Uploaded { .. } => StepKind::Upload,
            StepResult::Instantiated { .. } => StepKind::Instantiate,
            StepResult::Executed { .. } => StepKind::Execute,
            StepResult::Queried { .. } => StepKind::Query,
        }
    }

    pub fn tx(&self) -> Option<&TxInfo> {
        match self {
            StepResult::Uploaded { tx, .. }
            | StepResult::Instantiated { tx, .. }
            | StepResult::Executed { tx, .. } => Some(tx),
            StepResult::Queried { .. } => None,
        }
    }

    pub fn transaction_hash(&self) -> Option<&str> {
        self.tx().map(|tx| tx.transaction_hash.as_str())
    }

    pub fn code_id(&self) -> Option<u64> {
        match self {
            StepResult::Uploaded { code_id, .. } => Some(*code_id),
            _ => None,
        }
    }

    pub fn contract_address(&self) -> Option<&str> {
        match self {
            StepResult::Instantiated {
                contract_address, ..
            } => Some(contract_address),
            _ => None,
        }
    }

    pub fn data(&self) -> Option<&Value> {
        match self {
            StepResult::Executed { data, .. } => data.as_ref(),
            StepResult::Queried { data } => Some(data),
            _ => None,
        }
    }

    /// Short human readable summary of the operation-specific payload.
    pub fn summary(&self) -> String {
        match self {
            StepResult::Uploaded { code_id, .. } => format!("code id {}", code_id),
            StepResult::Instantiated {
                contract_address, ..
            } => contract_address.clone(),
            StepResult::Executed { data: Some(data), .. } | StepResult::Queried { data } => {
                data.to_string()
            }
            StepResult::Executed { data: None, .. } => "-".to_string(),
        }
    }
}

/// Results of the steps completed so far in one run, in completion order.
///
/// Entries are only ever appended. The context is dropped when the run ends.
#[derive(Debug, Clone, Default)]
pub struct PipelineContext {
    entries: Vec<(String, StepResult)>,
}

impl PipelineContext {
    /// Record the result of a step. Fails if a result is already recorded under `name`.
    pub fn insert(&mut self, name: impl Into<String>, result: StepResult) -> Result<(), String> {
        let name = name.into();
        if self.get(&name).is_some() {
            return Err(name);
        }
        self.entries.push((name, result));
        Ok(())
    }

    pub fn get(&self, name: &str) -> Option<&StepResult> {
        self.entries
            .iter()
            .find(|(entry, _)| entry == name)
            .map(|(_, result)| result)
    }

    /// Look up the value a reference points at.
    pub fn resolve<T: FromStepResult>(&self, reference: &OutputRef) -> Option<T> {
        self.get(&reference.step)
            .and_then(|result| T::from_step_result(result, &reference.field))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn last(&self) -> Option<&str> {
        self.entries.last().map(|(name, _)| name.as_str())
    }

    pub fn into_entries(self) -> Vec<(String, StepResult)> {
        self.entries
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_context_rejects_duplicates() {
        let mut ctx = PipelineContext::default();
        let result = StepResult::Queried {
            data: serde_json::json!("owner"),
        };

        ctx.insert("owner", result.clone()).unwrap();
        assert_eq!(ctx.insert("owner", result), Err("owner".to_string()));
        assert_eq!(ctx.len(), 1);
        assert_eq!(ctx.last(), Some("owner"));
    }

    #[test]
    fn test_accessors() {
        let result = StepResult::Uploaded {
            tx: TxInfo {
                transaction_hash: "CAFE".to_string(),
                gas_wanted: 10,
                gas_used: 9,
            },
            code_id: 4,
            checksum: "ff".to_string(),
        };

        assert_eq!(result.code_id(), Some(4));
        assert_eq!(result.transaction_hash(), Some("CAFE"));
        assert_eq!(result.contract_address(), None);
        assert_eq!(result.summary(), "code id 4");
    }
}
