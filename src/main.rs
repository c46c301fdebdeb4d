//! FASHUN.CO storefront service

use anyhow::Result;
use fashun_store::{api, config, events::EventBus};
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .with(tracing_subscriber::fmt::layer())
        .init();

    let settings = config::load_settings();
    let mut events = EventBus::default();
    if let Some(url) = &settings.nats_url {
        match async_nats::connect(url.as_str()).await {
            Ok(client) => {
                info!(%url, "forwarding domain events to NATS");
                events = events.with_nats(client);
            }
            Err(e) => warn!(%url, error = %e, "NATS unavailable, events stay in-process"),
        }
    }

    let state = api::AppState::new(&settings, events)?;
    let app = api::router(state);

    let addr = settings.bind_addr();
    info!("FASHUN.CO storefront listening on {}", addr);
    axum::serve(tokio::net::TcpListener::bind(&addr).await?, app).await?;
    Ok(())
}
