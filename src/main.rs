use std::net::SocketAddr;

use anyhow::Context;
use tokio::net::TcpListener;

use katago_backend::api;
use katago_backend::config::EngineConfig;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt::init();

    dotenv::dotenv().ok();

    let config = EngineConfig::from_env()?;

    let max_sessions = match std::env::var("KATAGO_MAX_SESSIONS") {
        Ok(value) => value
            .parse()
            .context("KATAGO_MAX_SESSIONS must be an integer")?,
        Err(_) => 2,
    };
    let port = match std::env::var("PORT") {
        Ok(value) => value.parse().context("PORT must be a port number")?,
        Err(_) => 8001,
    };

    let app = api::router(config, max_sessions);
    let addr = SocketAddr::from(([127, 0, 0, 1], port));
    println!("API listening on {}", addr);
    let listener = TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
