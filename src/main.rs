use studygroup_reaper::{reaper::Scheduler, state::AppState};
use tokio_util::sync::CancellationToken;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    let env_filter = std::env::var("RUST_LOG")
        .unwrap_or_else(|_| "studygroup_reaper=debug,sqlx=warn".to_string());
    let json_logs = std::env::var("LOG_FORMAT")
        .map(|v| v == "json")
        .unwrap_or(false);

    if json_logs {
        tracing_subscriber::fmt()
            .with_env_filter(env_filter)
            .with_target(false)
            .json()
            .init();
    } else {
        tracing_subscriber::fmt().with_env_filter(env_filter).init();
    }

    let app_state = AppState::init().await?;
    let scheduler = Scheduler::from_state(&app_state);
    let cancel = CancellationToken::new();

    if app_state.config.reaper.run_once {
        match scheduler.tick(&cancel).await? {
            Some(summary) => tracing::info!(processed = summary.results.len(), "single run complete"),
            None => tracing::info!("lease held elsewhere, nothing to do"),
        }
        return Ok(());
    }

    tokio::spawn({
        let cancel = cancel.clone();
        async move {
            if let Err(e) = tokio::signal::ctrl_c().await {
                tracing::error!(error = %e, "failed to listen for shutdown signal");
                return;
            }
            tracing::info!("shutdown signal received");
            cancel.cancel();
        }
    });

    scheduler.run_forever(cancel).await;
    Ok(())
}
