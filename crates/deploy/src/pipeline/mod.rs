//! Declarative scenarios and the orchestrator that runs them.

mod binding;
mod context;
mod orchestrator;
mod scenario;
mod step;

pub use binding::{Bindable, Binding, FromStepResult, OutputField, OutputRef};
pub use context::{PipelineContext, StepResult};
pub use orchestrator::{Orchestrator, RunAborted, RunReport, RunState, StepRecord};
pub use scenario::Scenario;
pub use step::{DeploymentStep, Operation, StepKind};
