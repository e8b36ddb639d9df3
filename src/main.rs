use std::sync::Arc;

use formflow::catalog::FieldCatalog;
use formflow::channels::bluebubbles::{self, BlueBubblesChannel, BlueBubblesClient};
use formflow::channels::{ChannelManager, CliChannel};
use formflow::config::Config;
use formflow::engine::FlowEngine;
use formflow::flow::store::FlowStore;
use formflow::flow::{FlowRouteState, flow_routes};
use tower_http::trace::TraceLayer;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_target(false)
        .init();

    let config = Config::from_env().unwrap_or_else(|e| {
        eprintln!("Error: {}", e);
        eprintln!("  export SERVER_PASSWORD=...");
        std::process::exit(1);
    });

    let bind_addr = config.bind_addr();

    eprintln!("📋 FormFlow v{}", env!("CARGO_PKG_VERSION"));
    eprintln!("   BlueBubbles: {}", config.bluebubbles_url);
    eprintln!("   Webhook: http://{}/webhook", bind_addr);
    eprintln!("   Flow API: http://{}/flows", bind_addr);
    eprintln!("   Triggers: {}", config.trigger_keywords.join(", "));
    eprintln!("   Type a message and press Enter. Ctrl+C to exit.\n");

    let catalog = FieldCatalog::customer_intake()?;
    let store = FlowStore::new();

    // ── Channels ─────────────────────────────────────────────────────────
    // The webhook router must be built before the channel moves into
    // the manager.
    let bb_channel = BlueBubblesChannel::new(
        BlueBubblesClient::from_config(&config),
        config.webhook_secret.clone(),
    );
    let webhook_router = bb_channel.router();

    let mut channels = ChannelManager::new();
    channels.add(Box::new(bb_channel));
    channels.add(Box::new(CliChannel::new()));
    eprintln!("   Channels: {}\n", channels.names().join(", "));

    // ── Engine ───────────────────────────────────────────────────────────
    let engine = FlowEngine::new(
        catalog,
        store,
        Arc::new(channels),
        config.trigger_keywords.clone(),
        bluebubbles::CHANNEL_NAME,
    );

    // ── HTTP server: webhook + flow control API ──────────────────────────
    let app = flow_routes(FlowRouteState {
        engine: Arc::clone(&engine),
    })
    .merge(webhook_router)
    .layer(TraceLayer::new_for_http());

    tokio::spawn(async move {
        let listener = tokio::net::TcpListener::bind(&bind_addr)
            .await
            .expect("Failed to bind webhook server port");
        tracing::info!(addr = %bind_addr, "Webhook server started");
        axum::serve(listener, app).await.ok();
    });

    engine.run().await?;

    Ok(())
}
