use clap::Parser;
use command_center::cli;
use command_center::errors::CoreError;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() {
    let cli = cli::Cli::parse();

    // Initialize logging
    let log_level = match (cli.quiet, cli.verbose) {
        (true, _) => "warn",
        (false, 0) => "info",
        (false, 1) => "debug",
        _ => "trace",
    };

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(log_level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_ansi(!cli.no_color)
        .with_writer(std::io::stderr)
        .init();

    if cli.no_color {
        console::set_colors_enabled(false);
    }

    let quiet = cli.quiet;
    let result = match cli.command {
        cli::Commands::Serve(args) => cli::serve::handle_serve(args).await,
        cli::Commands::Status(args) => cli::status::handle_status(args).await,
        cli::Commands::Deploy(args) => cli::deploy::handle_deploy(args, quiet).await,
        cli::Commands::Tool(args) => cli::tool::handle_tool(args, quiet).await,
        cli::Commands::Validate(args) => cli::handle_validate(args).await,
    };

    if let Err(e) = result {
        eprintln!("Error: {}", e);
        let exit_code = match &e {
            CoreError::Config(_)
            | CoreError::Yaml(_)
            | CoreError::UnknownCommandType(_)
            | CoreError::InvalidInput(_) => 2,
            CoreError::NotFound { .. } => 3,
            CoreError::StageFailed { .. } | CoreError::ValidationFailed { .. } => 4,
            CoreError::ExecutionFailed { .. } | CoreError::ToolDisabled(_) => 5,
            _ => 1,
        };
        std::process::exit(exit_code);
    }
}
