// Built-in workflow definitions

use std::fmt;
use std::sync::Arc;

use crate::workflow::{DefinitionError, StateRegistry, WorkflowDefinition};

const ORDER: &str = include_str!("../workflows/order.toml");
const DOCUMENT: &str = include_str!("../workflows/document.toml");
const VENDING_MACHINE: &str = include_str!("../workflows/vending_machine.toml");

/// Ready-made workflows shipped with the crate
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Preset {
    /// new -> paid -> shipped -> delivered, cancellable until shipped
    Order,
    /// draft -> moderation -> published, with rejection back to draft
    Document,
    /// idle -> has_funds -> dispensing -> idle, plus a maintenance loop
    VendingMachine,
}

impl Preset {
    pub fn all() -> [Preset; 3] {
        [Preset::Order, Preset::Document, Preset::VendingMachine]
    }

    pub fn name(&self) -> &'static str {
        match self {
            Preset::Order => "order",
            Preset::Document => "document",
            Preset::VendingMachine => "vending_machine",
        }
    }

    pub fn source(&self) -> &'static str {
        match self {
            Preset::Order => ORDER,
            Preset::Document => DOCUMENT,
            Preset::VendingMachine => VENDING_MACHINE,
        }
    }

    pub fn from_name(name: &str) -> Option<Preset> {
        Self::all().into_iter().find(|p| p.name() == name)
    }

    pub fn definition(&self) -> Result<WorkflowDefinition, DefinitionError> {
        WorkflowDefinition::from_toml_str(self.source())
    }

    pub fn registry(&self) -> Result<Arc<StateRegistry>, DefinitionError> {
        self.definition()?.into_shared_registry()
    }
}

impl fmt::Display for Preset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}
