use clap::{Parser, Subcommand, Args};

#[derive(Parser)]
#[command(name = "command-center", version, about = "Coordination core for agent fleets, deployments and tools")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Increase log verbosity (repeat for more)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress non-essential output
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Disable colored output
    #[arg(long, global = true)]
    pub no_color: bool,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Start the HTTP API with background ticks
    Serve(ServeArgs),
    /// Print a one-shot project status snapshot as JSON
    Status(StatusArgs),
    /// Run one deployment through the pipeline
    Deploy(DeployArgs),
    /// Run one catalog tool
    Tool(ToolArgs),
    /// Validate a configuration file
    Validate(ValidateArgs),
}

#[derive(Args, Clone)]
pub struct ServeArgs {
    /// YAML configuration file
    #[arg(short, long)]
    pub config: Option<String>,

    /// Port to listen on
    #[arg(long, default_value = "8080")]
    pub port: u16,

    /// Host to bind to
    #[arg(long, default_value = "0.0.0.0")]
    pub host: String,

    /// Bearer token required on API routes (or COMMAND_CENTER_API_TOKEN)
    #[arg(long)]
    pub token: Option<String>,
}

#[derive(Args, Clone)]
pub struct StatusArgs {
    /// YAML configuration file
    #[arg(short, long)]
    pub config: Option<String>,

    /// Compute metrics and blockers before printing
    #[arg(long)]
    pub with_metrics: bool,
}

#[derive(Args, Clone)]
pub struct DeployArgs {
    /// YAML configuration file
    #[arg(short, long)]
    pub config: Option<String>,

    /// Target environment
    #[arg(short, long, default_value = "staging")]
    pub environment: String,

    /// Version label recorded with the deployment
    #[arg(long)]
    pub version: Option<String>,

    /// Source branch recorded with the deployment
    #[arg(long)]
    pub branch: Option<String>,
}

#[derive(Args, Clone)]
pub struct ToolArgs {
    /// Tool id, e.g. tool-001
    pub tool_id: String,

    /// YAML configuration file
    #[arg(short, long)]
    pub config: Option<String>,

    /// JSON parameters passed to the tool
    #[arg(long, default_value = "{}")]
    pub params: String,

    /// Priority: low, normal, high, critical
    #[arg(long, default_value = "normal")]
    pub priority: String,

    /// List the catalog instead of running a tool
    #[arg(long)]
    pub list: bool,
}

#[derive(Args, Clone)]
pub struct ValidateArgs {
    /// Path to configuration file
    pub config: String,
}
