use clap::Parser;
use inkroom_server::config::{Args, ServerConfig};
use inkroom_server::reaper::spawn_reaper;
use inkroom_server::router;
use inkroom_server::state::AppState;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> std::io::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "inkroom_server=info,tower_http=info".into()),
        )
        .init();

    let config = ServerConfig::from(Args::parse());
    let state = AppState::new(&config);

    if let Some(ttl) = config.idle_session_ttl {
        spawn_reaper(state.engine.clone(), ttl, config.reap_interval);
    }

    let app = router(state, &config);
    let listener = tokio::net::TcpListener::bind(config.addr).await?;
    info!("Whiteboard sync server running at http://{}", listener.local_addr()?);
    axum::serve(listener, app).await
}
