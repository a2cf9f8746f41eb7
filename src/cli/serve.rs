use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use crate::api::{self, AppState};
use crate::cli::commands::ServeArgs;
use crate::coordination::{CommandCenter, Scheduler};
use crate::errors::CoreError;
use tracing::info;

pub async fn handle_serve(args: ServeArgs) -> Result<(), CoreError> {
    let config = super::load_config(args.config.as_deref()).await?;
    let center = Arc::new(CommandCenter::from_config(config).await?);

    let cancel = CancellationToken::new();
    let scheduler = Scheduler::start(center.clone(), cancel.clone());

    let mut state = AppState::new(center.clone());
    if args.token.is_some() {
        state = state.with_token(args.token);
    }
    let app = api::build_router(state);

    let addr = format!("{}:{}", args.host, args.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    info!(host = %args.host, port = args.port, "Listening on {}", addr);

    let shutdown = cancel.clone();
    let served = axum::serve(listener, app)
        .with_graceful_shutdown(async move {
            tokio::select! {
                _ = tokio::signal::ctrl_c() => info!("Shutdown requested"),
                _ = shutdown.cancelled() => {}
            }
        })
        .await
        .map_err(|e| CoreError::Internal(format!("Server error: {}", e)));

    center.shutdown();
    scheduler.shutdown().await;
    served
}
