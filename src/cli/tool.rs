use console::style;
use serde_json::Value;
use crate::cli::commands::ToolArgs;
use crate::cli::progress::ToolProgressBar;
use crate::coordination::CommandCenter;
use crate::errors::CoreError;
use crate::events::CoreEvent;
use crate::tools::Priority;

pub async fn handle_tool(args: ToolArgs, quiet: bool) -> Result<(), CoreError> {
    let config = super::load_config(args.config.as_deref()).await?;
    let center = CommandCenter::from_config(config).await?;

    if args.list {
        for tool in center.tools(None).await {
            println!(
                "{:<10} {:<24} {:<16} {}",
                style(&tool.id).cyan(),
                tool.name,
                tool.category,
                tool.description
            );
        }
        return Ok(());
    }

    let params: Value = serde_json::from_str(&args.params)?;
    let priority: Priority = args.priority.parse()?;
    let tool = center.tool(&args.tool_id).await?;

    center.broker().probe_connectivity().await;

    let bar = ToolProgressBar::new(&tool.name, quiet);
    let mut rx = center.subscribe();
    let watcher = tokio::spawn(async move {
        while let Ok(event) = rx.recv().await {
            bar.handle_event(&event);
            if matches!(event, CoreEvent::ToolExecuted { .. } | CoreEvent::ToolFailed { .. }) {
                break;
            }
        }
    });

    let result = center.execute_tool(&tool.id, params, priority).await;
    match &result {
        Ok(_) | Err(CoreError::ExecutionFailed { .. }) => {
            let _ = watcher.await;
        }
        Err(_) => watcher.abort(),
    }

    let execution = result?;
    if !quiet {
        println!("{}", serde_json::to_string_pretty(&execution)?);
    }
    Ok(())
}
