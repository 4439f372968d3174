use std::sync::Arc;

use axum::{
    extract::Request,
    middleware::{self, Next},
    response::Response,
    routing::get,
    Router,
};
use tower_http::cors::CorsLayer;
use tracing::info;

use crate::routes::{chat_ui, health_check, root};
use crate::server::{
    configuration::Settings,
    handlers::chat::{chat, debug_info},
    services::{
        auth::{ClientCredentials, TokenCache, TokenCredential},
        azure_chat::{AzureChatService, COGNITIVE_SERVICES_SCOPE},
        session_pool::{SessionPoolService, DYNAMIC_SESSIONS_SCOPE},
    },
};

#[derive(Clone)]
pub struct AppState {
    pub chat: Arc<AzureChatService>,
    pub sessions: Arc<SessionPoolService>,
}

pub fn configure_app(settings: Settings) -> Router {
    // One credential shared by both scoped token caches
    let credential: Arc<dyn TokenCredential> =
        Arc::new(ClientCredentials::from_settings(&settings.credentials));

    let chat_service = Arc::new(AzureChatService::new(
        settings.azure_openai.clone(),
        TokenCache::new(credential.clone(), COGNITIVE_SERVICES_SCOPE),
    ));
    let session_service = Arc::new(SessionPoolService::new(
        settings.session_pool.clone(),
        TokenCache::new(credential, DYNAMIC_SESSIONS_SCOPE),
    ));

    let state = AppState {
        chat: chat_service,
        sessions: session_service,
    };

    app_router(state)
}

async fn log_request(request: Request, next: Next) -> Response {
    info!("{} {}", request.method(), request.uri().path());
    next.run(request).await
}

pub fn app_router(state: AppState) -> Router {
    Router::new()
        .route("/", get(root))
        .route("/health", get(health_check))
        .route("/ui", get(chat_ui))
        .route("/debug", get(debug_info))
        .route("/chat", get(chat))
        .layer(middleware::from_fn(log_request))
        .layer(CorsLayer::permissive())
        .with_state(state)
}
