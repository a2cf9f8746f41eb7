use crate::cli::commands::DeployArgs;
use crate::cli::progress::DeployProgress;
use crate::coordination::CommandCenter;
use crate::errors::CoreError;
use crate::events::CoreEvent;
use crate::pipeline::DeploymentConfig;

pub async fn handle_deploy(args: DeployArgs, quiet: bool) -> Result<(), CoreError> {
    let config = super::load_config(args.config.as_deref()).await?;
    let center = CommandCenter::from_config(config).await?;

    let deployment = DeploymentConfig {
        version: args.version,
        branch: args.branch,
        requested_by: Some("cli".to_string()),
        ..DeploymentConfig::for_environment(&args.environment)
    };

    let progress = DeployProgress::new(&args.environment, quiet);
    let mut rx = center.subscribe();
    let watcher = tokio::spawn(async move {
        while let Ok(event) = rx.recv().await {
            progress.handle_event(&event);
            if matches!(event, CoreEvent::DeploymentFinished { .. }) {
                break;
            }
        }
    });

    let result = center.deploy(deployment).await;
    // Every run that reaches a terminal state publishes DeploymentFinished
    match &result {
        Ok(_) | Err(CoreError::StageFailed { .. }) => {
            let _ = watcher.await;
        }
        Err(_) => watcher.abort(),
    }

    match result {
        Ok(deployment) => {
            if !quiet {
                println!("{}", serde_json::to_string_pretty(&deployment)?);
            }
            Ok(())
        }
        Err(e) => {
            if let CoreError::StageFailed { deployment_id, .. } = &e {
                if !quiet {
                    let failed = center.deployment(deployment_id)?;
                    println!("{}", serde_json::to_string_pretty(&failed)?);
                }
            }
            Err(e)
        }
    }
}
