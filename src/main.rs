//! Binary entry point: parse CLI flags, set up logging, bind, and serve.
//! The router and its supporting modules live in the library crate so
//! integration tests can exercise the real HTTP surface in-process.

use std::net::SocketAddr;

use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use relay_server::config::Config;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = Config::load()?;
    init_tracing(config.debug);

    info!(folder = %config.folder.display(), port = config.port, "relay configuration loaded");

    let host = config.host.clone();
    let port = config.port;
    let app = relay_server::build_app(config)?;

    let addr: SocketAddr = format!("{host}:{port}").parse()?;
    info!(%addr, "starting relay server");
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app.into_make_service()).await?;

    Ok(())
}

fn init_tracing(debug: bool) {
    let default_filter = if debug {
        "relay_server=debug,tower_http=debug"
    } else {
        "relay_server=info,tower_http=info"
    };

    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| default_filter.into()))
        .with(tracing_subscriber::fmt::layer())
        .init();
}
