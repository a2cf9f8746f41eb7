//! Coordination core for an agent fleet: roster and health, a staged
//! deployment pipeline, tool dispatch with remote delegation, and project
//! metrics derived from all three.

pub mod agents;
pub mod api;
pub mod cli;
pub mod commands;
pub mod config;
pub mod coordination;
pub mod errors;
pub mod events;
pub mod pipeline;
pub mod simulation;
pub mod tools;

pub use coordination::{CommandCenter, CommandCenterBuilder};
pub use errors::CoreError;
pub use events::{CoreEvent, EventBus};
