// WhatsUp Server - social platform API over a volatile in-memory store

use std::net::SocketAddr;
use tokio::net::TcpListener;
use tower_http::cors::CorsLayer;

use whatsup::{api::create_router, app_state::AppState, config::Config};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt::init();

    // Load configuration
    let config = Config::from_env()?;

    // Initialize application state (store is re-seeded on every boot)
    let app_state = AppState::new(config.clone()).await?;

    // Build application router
    let app = create_router(app_state).layer(CorsLayer::permissive());

    // Start server
    let addr: SocketAddr = config.server_address().parse()?;
    println!("🚀 WhatsUp server starting on http://{}", addr);
    println!("📋 API overview:");
    println!("  POST   /api/auth/register            - Create account");
    println!("  POST   /api/auth/login               - Log in");
    println!("  GET    /api/posts/feed               - Post feed");
    println!("  POST   /api/messages                 - Send message");
    println!("  POST   /api/ai/chat                  - AI chat");
    println!("  GET    /api/friends                  - Friends");
    println!("  GET    /api/notifications            - Notifications");
    println!("  GET    /ws                           - Realtime websocket");

    let listener = TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
