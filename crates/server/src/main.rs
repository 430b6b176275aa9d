use clap::Parser;
use tracing_subscriber::EnvFilter;
use vecvault_core::{config, HnswParams, VaultIndex};
use vecvault_server::api::create_router;
use vecvault_server::api::handlers::AppState;

#[derive(Parser)]
#[command(name = "vecvault", about = "In-memory approximate nearest-neighbor vector index")]
struct Args {
    /// Port to listen on
    #[arg(long, default_value_t = config::DEFAULT_PORT)]
    port: u16,

    /// Vector dimension for the index
    #[arg(long, default_value_t = config::DEFAULT_DIMENSION)]
    dim: usize,

    /// Host address to bind
    #[arg(long, default_value = config::DEFAULT_HOST)]
    host: String,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::from_default_env()
                .add_directive(
                    "vecvault_server=info"
                        .parse()
                        .expect("valid directive literal"),
                )
                .add_directive(
                    "tower_http=info".parse().expect("valid directive literal"),
                ),
        )
        .init();

    let args = Args::parse();

    let index = match VaultIndex::new(args.dim, HnswParams::default()) {
        Ok(index) => index,
        Err(e) => {
            eprintln!("Error: {e}");
            std::process::exit(1);
        }
    };

    let app = create_router(AppState {
        index: index.clone(),
    });

    let addr = format!("{}:{}", args.host, args.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;

    tracing::info!(
        version = env!("CARGO_PKG_VERSION"),
        %addr,
        dim = args.dim,
        simd = vecvault_core::hnsw::DistanceCalculator::new(index.params().metric).uses_simd(),
        "vecvault ready"
    );

    axum::serve(listener, app)
        .with_graceful_shutdown(wait_for_signal())
        .await?;

    Ok(())
}

async fn wait_for_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!("Failed to install Ctrl+C handler: {}", e);
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut sig) => {
                sig.recv().await;
            }
            Err(e) => {
                tracing::error!("Failed to install SIGTERM handler: {}", e);
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => tracing::info!("Received SIGINT"),
        _ = terminate => tracing::info!("Received SIGTERM"),
    }

    tracing::info!("Shutting down gracefully, draining in-flight requests...");
}
