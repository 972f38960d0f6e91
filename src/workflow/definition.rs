// Declarative workflow definitions loaded from TOML

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::path::Path;
use std::sync::Arc;

use super::errors::DefinitionError;
use super::registry::StateRegistry;

/// Serializable description of a registry.
///
/// ```toml
/// name = "order"
/// initial = "new"
///
/// [[states]]
/// name = "new"
/// transitions = { pay = "paid", cancel = "cancelled" }
///
/// [[states]]
/// name = "paid"
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorkflowDefinition {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    pub initial: String,
    #[serde(default)]
    pub states: Vec<StateDefinition>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StateDefinition {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// action -> next state
    #[serde(default)]
    pub transitions: BTreeMap<String, String>,
}

impl WorkflowDefinition {
    pub fn from_toml_str(source: &str) -> Result<Self, DefinitionError> {
        Ok(toml::from_str(source)?)
    }

    pub fn from_path<P: AsRef<Path>>(path: P) -> Result<Self, DefinitionError> {
        let source = std::fs::read_to_string(path.as_ref())?;
        let definition = Self::from_toml_str(&source)?;
        tracing::debug!(
            workflow = ?definition.name,
            path = %path.as_ref().display(),
            states = definition.states.len(),
            "Loaded workflow definition"
        );
        Ok(definition)
    }

    /// Validate and build the transition table. Each state may appear only once.
    pub fn to_registry(&self) -> Result<StateRegistry, DefinitionError> {
        let mut builder = StateRegistry::builder().initial(self.initial.as_str());
        if let Some(name) = &self.name {
            builder = builder.name(name.as_str());
        }

        let mut declared = BTreeSet::new();
        for state in &self.states {
            if !declared.insert(state.name.as_str()) {
                return Err(DefinitionError::DuplicateState(state.name.clone()));
            }
            builder = builder.state(state.name.as_str());
            if let Some(description) = &state.description {
                builder = builder.describe(state.name.as_str(), description.as_str());
            }
            for (action, next) in &state.transitions {
                builder = builder.define(state.name.as_str(), action.as_str(), next.as_str());
            }
        }

        Ok(builder.build()?)
    }

    pub fn into_shared_registry(self) -> Result<Arc<StateRegistry>, DefinitionError> {
        self.to_registry().map(Arc::new)
    }

    /// Inverse of `to_registry`, e.g. for exporting a registry built in code
    pub fn from_registry(registry: &StateRegistry) -> Self {
        let states = registry
            .states()
            .filter_map(|id| registry.state(id.as_str()).map(|spec| (id, spec)))
            .map(|(id, spec)| StateDefinition {
                name: id.to_string(),
                description: spec.description.clone(),
                transitions: spec
                    .transitions
                    .iter()
                    .map(|(action, next)| (action.to_string(), next.to_string()))
                    .collect(),
            })
            .collect();

        Self {
            name: registry.name().map(str::to_string),
            initial: registry.initial_state().to_string(),
            states,
        }
    }

    pub fn to_toml_string(&self) -> Result<String, toml::ser::Error> {
        toml::to_string_pretty(self)
    }
}
