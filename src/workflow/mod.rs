// Workflow Module - data-driven finite-state engine
//
// The registry holds the transition table, contexts hold entities, and the
// executor is the only thing that moves a context between states.

pub mod types;
pub mod errors;
pub mod registry;
pub mod definition;
pub mod history;
pub mod context;
pub mod snapshot;
pub mod executor;


pub use types::{ActionId, EffectPhase, StateId, TransitionInfo};
pub use errors::{DefinitionError, RegistryError, TransitionError};
pub use registry::{RegistryBuilder, StateRegistry, StateSpec};
pub use definition::{StateDefinition, WorkflowDefinition};
pub use history::{TransitionLog, TransitionRecord};
pub use context::WorkflowContext;
pub use snapshot::{Caretaker, ContextSnapshot};
pub use executor::{Effect, ExecutorBuilder, GuardFn, TransitionExecutor};
