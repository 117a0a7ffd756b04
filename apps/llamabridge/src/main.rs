use std::sync::Arc;

use llamabridge_core::{Gateway, UpstreamClientConfig, WreqUpstreamClient, bootstrap};
use llamabridge_router::proxy_router;
use llamabridge_transform::ModelTable;
use tracing::info;

#[tokio::main]
async fn main() {
    init_tracing();
    if let Err(err) = run().await {
        eprintln!("llamabridge failed: {err:#}");
        std::process::exit(1);
    }
}

async fn run() -> anyhow::Result<()> {
    let settings = bootstrap::settings_from_env()?;
    info!(
        port = settings.port,
        api_version = %settings.api_version,
        api_endpoint = %settings.api_endpoint,
        default_model = %settings.default_model,
        request_timeout_secs = settings.request_timeout.as_secs(),
        "config loaded"
    );

    let models = Arc::new(ModelTable::builtin(settings.default_model.clone()));
    info!(
        aliases = models.len(),
        fallback = %models.default_model(),
        "model table ready"
    );

    let transport = WreqUpstreamClient::new(UpstreamClientConfig::with_request_timeout(
        settings.request_timeout,
    ))?;
    let bind = format!("0.0.0.0:{}", settings.port);
    let gateway = Gateway::new(Arc::new(settings), models, Arc::new(transport));
    let app = proxy_router(Arc::new(gateway));

    let listener = tokio::net::TcpListener::bind(&bind).await?;
    info!(addr = %bind, "listening");
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;
    info!("shutdown complete");

    Ok(())
}

fn init_tracing() {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("llamabridge=info,tower_http=warn"));
    tracing_subscriber::fmt().with_env_filter(filter).init();
}

async fn shutdown_signal() {
    let ctrl_c = async {
        let _ = tokio::signal::ctrl_c().await;
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(_) => std::future::pending::<()>().await,
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
    info!("shutdown signal received");
}
