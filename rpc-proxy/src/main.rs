use tracing::{error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use swap_quote::proxy;
use swap_quote::ProxyConfig;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let _ = dotenvy::from_filename_override("rpc-proxy/.env");
    let _ = dotenvy::dotenv_override();

    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| "info".into()),
        ))
        .with(tracing_subscriber::fmt::layer().json())
        .init();

    let config = ProxyConfig::from_env();
    if let Err(err) = config.validate() {
        error!(error = %err, "invalid proxy configuration");
        return Err(anyhow::anyhow!("configuration error: {err}"));
    }

    info!(
        listen = %config.socket_addr(),
        allowed_origin = %config.allowed_origin,
        cached_methods = ?config.cached_methods,
        "starting rpc proxy"
    );
    proxy::serve(config).await?;
    Ok(())
}
