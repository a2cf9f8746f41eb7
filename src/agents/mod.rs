pub mod registry;
pub mod health;

pub use registry::{Agent, AgentMetrics, AgentRegistry, AgentStatus};
pub use health::{HealthReading, PerformanceSnapshot};
