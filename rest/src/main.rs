mod error;
mod router;

use std::{net::SocketAddr, sync::Arc};

use anyhow::Context;
use store::{PgStore, Store};
use tracing::info;

const DEFAULT_ADDR: &str = "127.0.0.1:3003";
const DEFAULT_POOL_SIZE: u32 = 10;

#[derive(Clone)]
pub struct AppState {
    store: Arc<dyn Store>,
}

fn init_store() -> anyhow::Result<PgStore> {
    let database_url = std::env::var("DATABASE_URL").context("DATABASE_URL from .env file")?;
    let pool_size = match std::env::var("DATABASE_POOL_SIZE") {
        Ok(value) => value
            .parse()
            .context(format!("DATABASE_POOL_SIZE={value}"))?,
        Err(_) => DEFAULT_POOL_SIZE,
    };

    return PgStore::connect(&database_url, pool_size).context("Creating PgPool");
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt::init();
    let state = AppState {
        store: Arc::new(init_store()?),
    };

    let addr: SocketAddr = std::env::var("REST_ADDR")
        .unwrap_or_else(|_| DEFAULT_ADDR.to_owned())
        .parse()
        .context("REST_ADDR")?;
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .context(format!("Binding {addr}"))?;
    info!("listening on {addr}");
    let app = router::create_router(state);
    axum::serve(listener, app).await.context("Serving")?;
    return Ok(());
}
