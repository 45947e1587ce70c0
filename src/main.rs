use std::net::SocketAddr;
use std::sync::Arc;

use clap::Parser;
use tracing::info;
use tracing_subscriber::EnvFilter;

use agri_sage::{config::Config, router, AppContext};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenv::dotenv().ok();
    let config = Config::parse();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_target(false)
        .compact()
        .init();

    info!("Agri-Sage v{}", env!("CARGO_PKG_VERSION"));

    let ctx = Arc::new(AppContext::load(&config).await?);
    info!(
        model_loaded = ctx.model_loaded(),
        llm_configured = ctx.llm_configured(),
        "application context ready"
    );

    let app = router(ctx, config.body_limit_bytes());

    let addr: SocketAddr = format!("{}:{}", config.host, config.port).parse()?;
    info!("Listening on http://{}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
