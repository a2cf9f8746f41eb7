use chrono::Utc;
use crate::cli::commands::StatusArgs;
use crate::coordination::CommandCenter;
use crate::errors::CoreError;

pub async fn handle_status(args: StatusArgs) -> Result<(), CoreError> {
    let config = super::load_config(args.config.as_deref()).await?;
    let center = CommandCenter::from_config(config).await?;

    if args.with_metrics {
        center.recompute_metrics(Utc::now().date_naive()).await;
        center.compute_velocity(Utc::now()).await;
    }

    let status = center.project_status().await;
    println!("{}", serde_json::to_string_pretty(&status)?);
    Ok(())
}
