pub mod agents;
pub mod commands;
pub mod deployments;
pub mod events;
pub mod health;
pub mod insights;
pub mod tasks;
pub mod tools;
