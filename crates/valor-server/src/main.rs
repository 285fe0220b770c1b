use std::sync::Arc;

use tokio::net::TcpListener;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use valor_openai::client::OpenAiProvider;
use valor_openai::provider::ChatProvider;
use valor_server::config::ServerConfig;
use valor_server::page;
use valor_server::state::AppState;
use valor_storage::flush::{flush_now, restore_from, spawn_flush_task};
use valor_storage::snapshot::{JsonFileSnapshotStore, NoopSnapshotStore, SnapshotStore};
use valor_storage::store::{MemorySessionStore, SessionStore};

#[tokio::main]
async fn main() -> eyre::Result<()> {
    let config = ServerConfig::from_env()?;
    init_tracing(config.log_json);

    let provider = OpenAiProvider::new(config.provider.clone())?;
    if !provider.is_configured() {
        warn!("OPENAI_API_KEY is not set; AI requests will fail until it is configured");
    }

    let sessions: Arc<dyn SessionStore> = Arc::new(MemorySessionStore::new(
        config.system_prompt.clone(),
        config.session_capacity,
    )?);

    let snapshots: Arc<dyn SnapshotStore> = match &config.snapshot_path {
        Some(path) => Arc::new(JsonFileSnapshotStore::new(path)),
        None => Arc::new(NoopSnapshotStore),
    };

    // An unreadable snapshot is set aside by `restore_from`. Any other
    // failure leaves the file in place, so saving over it is disabled.
    let persist = match restore_from(sessions.as_ref(), snapshots.as_ref()).await {
        Ok(_) => config.snapshot_path.is_some(),
        Err(e) => {
            warn!(
                error = %e,
                "could not restore session snapshot; starting empty with snapshots disabled"
            );
            false
        }
    };

    let flush_task = match &config.snapshot_path {
        Some(path) if persist => {
            info!(
                path = %path.display(),
                interval_secs = config.flush_interval.as_secs(),
                "session snapshots enabled"
            );
            Some(spawn_flush_task(
                Arc::clone(&sessions),
                Arc::clone(&snapshots),
                config.flush_interval,
            ))
        }
        _ => None,
    };

    let page = page::render_index(&config.assistant_name, &config.tagline)?;

    let state = AppState {
        sessions: Arc::clone(&sessions),
        provider: Arc::new(provider),
        system_prompt: config.system_prompt.as_str().into(),
        page: page.into(),
    };

    let listener = TcpListener::bind(config.listen_addr()).await?;
    info!(
        addr = %listener.local_addr()?,
        model = %config.provider.model,
        "{} server listening",
        config.assistant_name
    );

    axum::serve(listener, valor_server::router(state))
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    if let Some(task) = flush_task {
        task.shutdown().await;
        match flush_now(sessions.as_ref(), snapshots.as_ref()).await {
            Ok(count) => info!(sessions = count, "final session snapshot written"),
            Err(e) => warn!(error = %e, "final session snapshot failed"),
        }
    }

    info!("server stopped");
    Ok(())
}

fn init_tracing(json: bool) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    if json {
        tracing_subscriber::fmt().with_env_filter(filter).json().init();
    } else {
        tracing_subscriber::fmt().with_env_filter(filter).init();
    }
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            warn!(error = %e, "failed to listen for ctrl-c");
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
                warn!(error = %e, "failed to listen for SIGTERM");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {},
        () = terminate => {},
    }

    info!("shutdown signal received");
}
