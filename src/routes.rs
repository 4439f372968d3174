use askama::Template;
use axum::{
    response::{Html, IntoResponse, Redirect, Response},
    Json,
};
use chrono::Utc;
use serde_json::json;

#[derive(Template)]
#[template(path = "chat.html")]
struct ChatTemplate<'a> {
    title: &'a str,
}

pub async fn root() -> Redirect {
    Redirect::temporary("/ui")
}

pub async fn health_check() -> Json<serde_json::Value> {
    Json(json!({
        "status": "healthy",
        "timestamp": Utc::now().to_rfc3339(),
    }))
}

pub async fn chat_ui() -> Response {
    let template = ChatTemplate { title: "Sandbox Chat" };
    Html(template.render().unwrap()).into_response()
}
