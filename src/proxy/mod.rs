mod cache;
mod handler;

use std::sync::Arc;

use axum::http::HeaderValue;
use axum::middleware;
use axum::routing::any;
use axum::Router;
use tokio::net::TcpListener;
use tracing::{info, warn};

use crate::config::ProxyConfig;
use crate::error::{Result, SwapError};
use crate::transport::HttpTransport;

pub use cache::ResponseCache;
pub use handler::handle_rpc;

pub const RPC_PROXY_PATH: &str = "/api/rpc-proxy";

pub struct ProxyState {
    transport: HttpTransport,
    cache: ResponseCache,
    allowed_origin: HeaderValue,
}

impl ProxyState {
    pub fn new(transport: HttpTransport, cache: ResponseCache, allowed_origin: &str) -> Result<Self> {
        let allowed_origin = HeaderValue::from_str(allowed_origin)
            .map_err(|err| SwapError::Config(format!("invalid allowed origin: {err}")))?;
        Ok(Self {
            transport,
            cache,
            allowed_origin,
        })
    }

    pub fn from_config(config: &ProxyConfig) -> Result<Self> {
        let transport = HttpTransport::new(config.upstream_url.clone(), config.upstream_timeout)?;
        let cache = ResponseCache::new(config.cached_methods.clone(), config.cache_ttl);
        Self::new(transport, cache, &config.allowed_origin)
    }
}

pub fn router(state: Arc<ProxyState>) -> Router {
    Router::new()
        .route("/", any(handle_rpc))
        .route(RPC_PROXY_PATH, any(handle_rpc))
        .layer(middleware::from_fn_with_state(state.clone(), handler::cors))
        .with_state(state)
}

pub async fn serve(config: ProxyConfig) -> Result<()> {
    config.validate()?;
    let state = Arc::new(ProxyState::from_config(&config)?);
    let addr = config.socket_addr();

    let listener = TcpListener::bind(&addr)
        .await
        .map_err(|err| SwapError::Transport(format!("failed to bind {addr}: {err}")))?;
    info!(%addr, upstream = %config.upstream_url, "rpc proxy listening");

    axum::serve(listener, router(state))
        .with_graceful_shutdown(shutdown_signal())
        .await
        .map_err(|err| SwapError::Transport(format!("proxy server failed: {err}")))?;

    info!("rpc proxy stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        warn!(error = %err, "failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
}
