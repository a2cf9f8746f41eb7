use serde_json::{json, Value};
use std::sync::LazyLock;

pub static CONFIG_SCHEMA: LazyLock<Value> = LazyLock::new(|| {
    json!({
        "$schema": "http://json-schema.org/draft-07/schema#",
        "type": "object",
        "properties": {
            "agents": {
                "type": "array",
                "items": {
                    "type": "object",
                    "required": ["id", "name", "role"],
                    "properties": {
                        "id": { "type": "string" },
                        "name": { "type": "string" },
                        "role": { "type": "string" },
                        "capabilities": { "type": "array", "items": { "type": "string" } },
                        "progress": { "type": "number", "minimum": 0, "maximum": 100 },
                        "estimated_completion": { "type": "string" }
                    }
                }
            },
            "executor": {
                "type": "object",
                "properties": {
                    "enabled": { "type": "boolean" },
                    "base_url": { "type": "string" },
                    "health_timeout_ms": { "type": "integer", "minimum": 1 },
                    "execution_timeout_ms": { "type": "integer", "minimum": 1 }
                }
            },
            "pipeline": {
                "type": "object",
                "properties": {
                    "reporting_agent": { "type": ["string", "null"] }
                }
            },
            "tools": {
                "type": "object",
                "properties": {
                    "disabled": { "type": "array", "items": { "type": "string" } }
                }
            },
            "commands": {
                "type": "array",
                "items": {
                    "type": "object",
                    "required": ["id", "type", "category"],
                    "properties": {
                        "id": { "type": "string" },
                        "type": { "type": "string", "enum": ["parallel", "recursive", "persistent"] },
                        "category": { "type": "string" },
                        "description": { "type": "string" }
                    }
                }
            },
            "rules": {
                "type": "array",
                "items": {
                    "type": "object",
                    "required": ["id", "description"],
                    "properties": {
                        "id": { "type": "string" },
                        "description": { "type": "string" },
                        "active": { "type": "boolean" }
                    }
                }
            },
            "project": {
                "type": "object",
                "properties": {
                    "name": { "type": "string" },
                    "launch_date": { "type": "string" },
                    "velocity_window_days": { "type": "integer", "minimum": 1 },
                    "health_threshold": { "type": "number", "minimum": 0, "maximum": 100 },
                    "blocker_progress_threshold": { "type": "number", "minimum": 0, "maximum": 100 }
                }
            },
            "schedule": {
                "type": "object",
                "additionalProperties": { "type": "integer", "minimum": 1 }
            },
            "limits": {
                "type": "object",
                "additionalProperties": { "type": "integer", "minimum": 1 }
            },
            "simulation": {
                "type": "object",
                "properties": {
                    "time_scale": { "type": "number", "minimum": 0 },
                    "rule_pass_rate": { "type": "number", "minimum": 0, "maximum": 1 },
                    "stage_failure_rate": { "type": "number", "minimum": 0, "maximum": 1 },
                    "tool_failure_rate": { "type": "number", "minimum": 0, "maximum": 1 },
                    "seed": { "type": ["integer", "null"] }
                }
            }
        }
    })
});
