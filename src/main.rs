use std::net::SocketAddr;

use sandbox_chat::server::config::configure_app;
use sandbox_chat::server::configuration::get_configuration;
use tracing::info;

#[tokio::main]
async fn main() {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    // Load environment variables
    dotenvy::dotenv().ok();

    let settings = get_configuration().expect("Failed to load configuration");
    let addr = SocketAddr::from((
        settings
            .application
            .host
            .parse::<std::net::IpAddr>()
            .expect("Invalid host address"),
        settings.application.port,
    ));

    // Create and configure the app
    let app = configure_app(settings);

    info!("Starting server on {}", addr);

    // Start the server
    let listener = tokio::net::TcpListener::bind(addr).await.unwrap();
    info!("✨ Server ready:");
    info!("  🌎 http://{}", listener.local_addr().unwrap());

    axum::serve(listener, app).await.unwrap();
}
