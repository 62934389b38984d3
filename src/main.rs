use assessment_dashboard::{
    config::{get_config, init_config},
    database::pool::create_store,
    routes, AppState,
};
use std::net::SocketAddr;
use tokio::net::TcpListener;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_config()?;
    let config = get_config();

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    if config.log_json {
        tracing_subscriber::fmt().with_env_filter(filter).json().init();
    } else {
        tracing_subscriber::fmt().with_env_filter(filter).init();
    }

    if config.gemini_api_key.is_none() {
        tracing::warn!("GEMINI_API_KEY not set, AI grading and voice chat are disabled");
    }
    if config.cloudinary.is_none() {
        tracing::warn!("Cloudinary credentials not set, voice uploads will fail");
    }

    let store = create_store(config).await?;
    let app_state = AppState::new(config.clone(), store)?;
    let app = routes::create_router(app_state);

    let addr: SocketAddr = config.server_address.parse()?;
    info!("Server listening on {}", addr);
    let listener = TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
