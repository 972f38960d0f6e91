// Tollgate Library - data-driven finite-state workflow engine
// This exposes the engine, its built-in workflows and the ambient setup helpers

pub mod workflow;
pub mod presets;
pub mod telemetry;
pub mod observability;
pub mod config;

// Re-export key types for easy access
pub use workflow::{
    ActionId, Caretaker, ContextSnapshot, DefinitionError, EffectPhase, ExecutorBuilder,
    RegistryBuilder, RegistryError, StateId, StateRegistry, TransitionError, TransitionExecutor,
    TransitionInfo, TransitionLog, TransitionRecord, WorkflowContext, WorkflowDefinition,
};
pub use presets::Preset;
pub use telemetry::{init_telemetry, generate_correlation_id, create_transition_span};
pub use observability::{EngineMetrics, EngineStats, OperationTimer};
pub use crate::config::{EngineConfig, HistoryConfig, TelemetryConfig, config, init_config};

/// Load the global configuration and install the tracing subscriber it describes
pub fn init() -> anyhow::Result<&'static EngineConfig> {
    let config = init_config()?;
    init_telemetry(&config.telemetry)?;
    Ok(config)
}
