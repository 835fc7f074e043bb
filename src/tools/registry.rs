//! Tool registry.
//!
//! Holds the registered [`MapTool`]s, provides lookup by name, and exports
//! the declarations sent with every model request.

use std::collections::HashMap;

use super::MapTool;
use crate::model::ToolDefinition;

/// Registry of available map tools.
#[derive(Default)]
pub struct ToolRegistry {
    tools: HashMap<String, Box<dyn MapTool>>,
}

impl ToolRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a tool. Replaces any existing tool with the same name.
    pub fn register(&mut self, tool: Box<dyn MapTool>) {
        self.tools.insert(tool.name().to_owned(), tool);
    }

    /// Get a tool by name.
    pub fn get(&self, name: &str) -> Option<&dyn MapTool> {
        self.tools.get(name).map(Box::as_ref)
    }

    /// Export declarations for all registered tools, sorted by name so the
    /// request payload is stable across turns.
    pub fn declarations(&self) -> Vec<ToolDefinition> {
        let mut declarations: Vec<ToolDefinition> = self
            .tools
            .values()
            .map(|t| ToolDefinition::new(t.name(), t.description(), t.schema()))
            .collect();
        declarations.sort_by(|a, b| a.name.cmp(&b.name));
        declarations
    }
}
