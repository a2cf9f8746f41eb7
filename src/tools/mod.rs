pub mod broker;
pub mod catalog;
pub mod delegate;
pub mod state;

pub use broker::{BrokerStats, CategorySummary, ToolBroker};
pub use delegate::{HttpExecutor, RemoteExecutor, RemoteRequest};
pub use state::{
    ConnectivityState, Execution, ExecutionPath, ExecutionStatus, Priority, Tool, ToolStatus,
};
