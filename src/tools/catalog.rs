pub struct CategoryInfo {
    pub id: &'static str,
    pub name: &'static str,
    pub description: &'static str,
    /// Base duration of a locally simulated run, before jitter.
    pub base_duration_ms: u64,
}

pub struct ToolInfo {
    pub id: &'static str,
    pub name: &'static str,
    pub category: &'static str,
    pub description: &'static str,
}

/// Duration used for categories missing from the table.
pub const DEFAULT_DURATION_MS: u64 = 1000;

pub static CATEGORIES: &[CategoryInfo] = &[
    CategoryInfo { id: "development", name: "Development", description: "Code generation and maintenance", base_duration_ms: 2000 },
    CategoryInfo { id: "security", name: "Security", description: "Scanning and secret hygiene", base_duration_ms: 4000 },
    CategoryInfo { id: "agents", name: "Agents", description: "Fleet coordination helpers", base_duration_ms: 800 },
    CategoryInfo { id: "analytics", name: "Analytics", description: "Metric aggregation and forecasting", base_duration_ms: 1500 },
    CategoryInfo { id: "infrastructure", name: "Infrastructure", description: "Build and environment provisioning", base_duration_ms: 3000 },
    CategoryInfo { id: "documentation", name: "Documentation", description: "Guides and reference generation", base_duration_ms: 1000 },
    CategoryInfo { id: "integration", name: "Integration", description: "Third-party sync and relays", base_duration_ms: 2500 },
];

pub static TOOLS: &[ToolInfo] = &[
    ToolInfo { id: "tool-001", name: "Code Generator", category: "development", description: "Scaffold modules from a template" },
    ToolInfo { id: "tool-002", name: "Refactoring Assistant", category: "development", description: "Apply mechanical refactors across a codebase" },
    ToolInfo { id: "tool-003", name: "Dependency Auditor", category: "development", description: "Report outdated or conflicting dependencies" },
    ToolInfo { id: "tool-004", name: "Vulnerability Scanner", category: "security", description: "Scan services for known vulnerabilities" },
    ToolInfo { id: "tool-005", name: "Secret Detector", category: "security", description: "Find credentials committed to repositories" },
    ToolInfo { id: "tool-006", name: "Agent Spawner", category: "agents", description: "Prepare a new worker slot for the fleet" },
    ToolInfo { id: "tool-007", name: "Agent Messenger", category: "agents", description: "Relay a message between agents" },
    ToolInfo { id: "tool-008", name: "Metrics Aggregator", category: "analytics", description: "Roll up raw samples into summaries" },
    ToolInfo { id: "tool-009", name: "Trend Forecaster", category: "analytics", description: "Project metric trends forward" },
    ToolInfo { id: "tool-010", name: "Container Builder", category: "infrastructure", description: "Build and tag service images" },
    ToolInfo { id: "tool-011", name: "Environment Provisioner", category: "infrastructure", description: "Create an isolated environment" },
    ToolInfo { id: "tool-012", name: "Doc Generator", category: "documentation", description: "Render guides from annotated sources" },
    ToolInfo { id: "tool-013", name: "API Reference Builder", category: "documentation", description: "Produce endpoint reference pages" },
    ToolInfo { id: "tool-014", name: "Webhook Relay", category: "integration", description: "Forward events to external subscribers" },
    ToolInfo { id: "tool-015", name: "Schema Sync", category: "integration", description: "Reconcile schemas with a partner system" },
];

pub fn get_category(id: &str) -> Option<&'static CategoryInfo> {
    CATEGORIES.iter().find(|c| c.id == id)
}

pub fn get_tool(id: &str) -> Option<&'static ToolInfo> {
    TOOLS.iter().find(|t| t.id == id)
}

pub fn base_duration_ms(category: &str) -> u64 {
    get_category(category)
        .map(|c| c.base_duration_ms)
        .unwrap_or(DEFAULT_DURATION_MS)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_every_tool_has_known_category() {
        for tool in TOOLS {
            assert!(get_category(tool.category).is_some(), "{} has unknown category", tool.id);
        }
    }

    #[test]
    fn test_tool_ids_unique() {
        let mut ids: Vec<&str> = TOOLS.iter().map(|t| t.id).collect();
        ids.sort();
        ids.dedup();
        assert_eq!(ids.len(), TOOLS.len());
    }

    #[test]
    fn test_category_durations() {
        assert_eq!(base_duration_ms("security"), 4000);
        assert_eq!(base_duration_ms("agents"), 800);
        assert_eq!(base_duration_ms("mystery"), DEFAULT_DURATION_MS);
    }

    #[test]
    fn test_tool_001_is_development() {
        assert_eq!(get_tool("tool-001").unwrap().category, "development");
    }
}
