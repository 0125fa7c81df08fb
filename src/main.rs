//! Santa tracker server.
//!
//! Run the server with
//! ```not_rust
//! cargo run
//! ```
//!
//! Open a screen by connecting a websocket client to `ws://localhost:3000/ws`,
//! then move Santa and ring the bells with
//! ```not_rust
//! curl -X PUT -H 'content-type: application/json' -d '{"lat":39.10,"lng":-84.51}' localhost:3000/db/current_location
//! curl -X PUT -H 'content-type: application/json' -d 'true' localhost:3000/db/ho_ho_hoing
//! ```

use std::net::SocketAddr;
use std::sync::Arc;
use axum::Server;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use santa_tracker::config::CONFIG;
use santa_tracker::handlers::routes::{router, AppState};
use santa_tracker::handlers::source::MemoryStore;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "santa_tracker=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = CONFIG.clone();
    let addr: SocketAddr = format!("{}:{}", config.host, config.port).parse()?;

    let app = router(AppState {
        store: Arc::new(MemoryStore::new()),
        config,
    });

    info!("listening on {}", addr);
    Server::bind(&addr)
        .serve(app.into_make_service_with_connect_info::<SocketAddr>())
        .await?;
    Ok(())
}
