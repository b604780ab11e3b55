use std::sync::Arc;

use anyhow::Result;
use ironvault_common::{Config, RuleBasedModel};
use ironvault_engine::{EventLogger, LoanPipeline, RecordStore, RetryPolicy, TimeoutStore};
use supabase_client::SupabaseClient;
use tracing::info;
use tracing_subscriber::EnvFilter;

use ironvault_api::{router, AppState};

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive("ironvault=info".parse()?))
        .init();

    let config = Config::from_env()?;

    let client = SupabaseClient::new(&config.supabase_url, &config.supabase_key)?;
    let store: Arc<dyn RecordStore> = Arc::new(TimeoutStore::new(client, config.store_timeout));

    let logger = EventLogger::new(store.clone(), config.logs_table.clone()).with_policy(RetryPolicy {
        max_attempts: 3,
        retry_delay: config.log_retry_delay,
        escalation_cap: config.log_escalation_cap,
        fallback_capacity: config.log_fallback_capacity,
    });

    let pipeline = LoanPipeline::new(
        store,
        Arc::new(RuleBasedModel),
        Arc::new(logger),
        config.loans_table.clone(),
    )
    .with_concurrency(config.batch_concurrency);

    let state = Arc::new(AppState { pipeline });
    let app = router(state);

    let addr = format!("{}:{}", config.api_host, config.api_port);
    info!("IronVault API starting on {addr}");

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("IronVault API stopped");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::warn!(error = %e, "Failed to listen for Ctrl-C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                tracing::warn!(error = %e, "Failed to listen for SIGTERM");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
    info!("Shutdown signal received, draining connections");
}
