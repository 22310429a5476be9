use std::sync::Arc;

use anyhow::Context;
use tokio::sync::mpsc;
use tracing::info;

use vendordesk_api::{
    attachments::InMemoryAttachmentStore,
    config,
    db,
    events::{process_events, EventSender},
    handlers::{self, AppServices},
    notifications::LogNotifier,
    AppState,
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cfg = config::load_config().context("failed to load configuration")?;
    config::init_tracing(cfg.log_level(), cfg.log_json);
    handlers::health::init_start_time();

    info!(environment = %cfg.environment, "starting vendordesk-api");

    let pool = db::establish_connection_from_app_config(&cfg)
        .await
        .context("failed to connect to the database")?;
    if cfg.auto_migrate {
        db::run_migrations(&pool).await.context("migrations failed")?;
    }
    let pool = Arc::new(pool);

    let (tx, rx) = mpsc::channel(1024);
    let event_sender = EventSender::new(tx);
    tokio::spawn(process_events(rx, Arc::new(LogNotifier)));

    let services = AppServices::new(
        pool,
        event_sender.clone(),
        Arc::new(InMemoryAttachmentStore::default()),
        cfg.payment_due_days,
    );
    let state = AppState {
        config: cfg.clone(),
        event_sender,
        services,
    };

    let app = handlers::app_router(state);
    let listener = tokio::net::TcpListener::bind(cfg.bind_address())
        .await
        .with_context(|| format!("failed to bind {}", cfg.bind_address()))?;
    info!("listening on {}", cfg.bind_address());

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("server error")?;
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
    info!("shutdown signal received");
}
