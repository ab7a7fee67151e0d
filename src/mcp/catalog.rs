//! Tool catalog
//!
//! The set of tools the endpoint advertises. Every catalog tool takes no
//! arguments; its response depends only on who is calling.

use crate::config::ToolDefinition;
use crate::mcp::types::{ListToolsResponse, McpTool};

/// The tools exposed by the server, in configuration order.
///
/// # Examples
///
/// ```
/// use toolgate::config::Config;
/// use toolgate::mcp::catalog::ToolCatalog;
///
/// let catalog = ToolCatalog::from_definitions(&Config::default().tools);
/// assert!(catalog.contains("fetch_net_worth"));
/// assert!(!catalog.contains("drop_tables"));
/// ```
#[derive(Debug, Clone, Default)]
pub struct ToolCatalog {
    tools: Vec<McpTool>,
}

impl ToolCatalog {
    /// Builds the catalog from configured tool definitions.
    pub fn from_definitions(definitions: &[ToolDefinition]) -> Self {
        let tools = definitions
            .iter()
            .map(|def| McpTool {
                name: def.name.clone(),
                description: if def.description.is_empty() {
                    None
                } else {
                    Some(def.description.clone())
                },
                input_schema: serde_json::json!({
                    "type": "object",
                    "properties": {}
                }),
            })
            .collect();
        Self { tools }
    }

    /// Whether `name` is an advertised tool.
    pub fn contains(&self, name: &str) -> bool {
        self.tools.iter().any(|t| t.name == name)
    }

    /// Number of tools.
    pub fn len(&self) -> usize {
        self.tools.len()
    }

    /// Whether the catalog is empty.
    pub fn is_empty(&self) -> bool {
        self.tools.is_empty()
    }

    /// The `tools/list` result.
    pub fn list(&self) -> ListToolsResponse {
        ListToolsResponse {
            tools: self.tools.clone(),
            next_cursor: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_description_is_omitted() {
        let catalog = ToolCatalog::from_definitions(&[ToolDefinition {
            name: "fetch_net_worth".to_string(),
            description: String::new(),
        }]);
        let value = serde_json::to_value(catalog.list()).unwrap();
        assert!(value["tools"][0].get("description").is_none());
        assert_eq!(value["tools"][0]["inputSchema"]["type"], "object");
        assert!(value.get("nextCursor").is_none());
    }

    #[test]
    fn test_list_preserves_order() {
        let defs: Vec<ToolDefinition> = ["b", "a", "c"]
            .iter()
            .map(|n| ToolDefinition {
                name: n.to_string(),
                description: "d".to_string(),
            })
            .collect();
        let names: Vec<String> = ToolCatalog::from_definitions(&defs)
            .list()
            .tools
            .into_iter()
            .map(|t| t.name)
            .collect();
        assert_eq!(names, vec!["b", "a", "c"]);
    }
}
