use crate::error::ToolError;
use crate::traits::{Tool, ToolSpec};
use serde_json::{Map, Value};
use std::sync::Arc;

/// A named group of tools, registered as a unit.
#[derive(Clone)]
pub struct ToolServer {
    pub name: String,
    pub tools: Vec<Arc<dyn Tool>>,
}

impl ToolServer {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            tools: Vec::new(),
        }
    }

    pub fn with_tool(mut self, tool: impl Tool + 'static) -> Self {
        self.tools.push(Arc::new(tool));
        self
    }
}

/// Tools grouped by server, looked up across servers in registration order.
///
/// Servers are registered during start-up; afterwards the registry is shared
/// read-only (usually behind an `Arc`) between submissions.
#[derive(Default, Clone)]
pub struct ToolRegistry {
    servers: Vec<ToolServer>,
}

impl ToolRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register_server(&mut self, server: ToolServer) {
        tracing::debug!(
            "Registered tool server '{}' with {} tools",
            server.name,
            server.tools.len()
        );
        self.servers.push(server);
    }

    pub fn servers(&self) -> &[ToolServer] {
        &self.servers
    }

    pub fn tool_count(&self) -> usize {
        self.servers.iter().map(|s| s.tools.len()).sum()
    }

    /// Every registered tool in registration order. Empty when nothing is
    /// registered, which tells the transport to leave tools out.
    pub fn export_schemas(&self) -> Vec<ToolSpec> {
        self.servers
            .iter()
            .flat_map(|server| server.tools.iter().map(|t| t.spec()))
            .collect()
    }

    fn find(&self, name: &str) -> Option<Arc<dyn Tool>> {
        // First registered server wins on a name collision.
        self.servers
            .iter()
            .find_map(|server| server.tools.iter().find(|t| t.name() == name))
            .cloned()
    }

    pub async fn execute(&self, name: &str, args: Map<String, Value>) -> Result<Value, ToolError> {
        let tool = self
            .find(name)
            .ok_or_else(|| ToolError::NotFound(name.to_string()))?;

        tool.execute(args)
            .await
            .map_err(|e| ToolError::Execution(e.to_string()))
    }
}
