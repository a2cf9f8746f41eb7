pub mod state;
pub mod phase;
pub mod runner;
pub mod metrics;
pub mod orchestrator;

pub use state::{Deployment, DeploymentConfig, DeploymentStatus, PipelineSummary, StageName, StageOutcome, StageRecord, StageStatus};
pub use runner::{SimulatedStageRunner, StageRunner};
pub use orchestrator::PipelineEngine;
