use axum::extract::{Query, State};
use axum::Json;
use serde::Deserialize;
use serde_json::{json, Value};
use tracing::{error, info};

use crate::server::config::AppState;
use crate::server::services::{code_extract, math_router};

#[derive(Debug, Deserialize)]
pub struct ChatParams {
    pub message: String,
}

/// Runs the full pipeline for one message: classify, prompt, complete,
/// extract, and conditionally execute. Always answers HTTP 200; upstream
/// failures become descriptive payloads.
pub async fn chat(
    State(state): State<AppState>,
    Query(params): Query<ChatParams>,
) -> Json<Value> {
    let message = params.message;
    info!(message = %message, "Received chat message");

    let intent = math_router::classify(&message);
    let is_math_question = intent.is_math_question();
    info!(
        has_keywords = intent.has_keywords,
        has_operators = intent.has_operators,
        has_numbers = intent.has_numbers,
        is_math_question,
        "Math detection"
    );

    let prompt = math_router::build_prompt(&message, is_math_question);

    let ai_response = match state.chat.chat(prompt).await {
        Ok(reply) => reply,
        Err(e) => {
            error!(error = %e, "Completion request failed");
            return Json(json!({
                "output": format!("Error: {:#}", e),
                "note": "There was an issue with the Azure OpenAI integration. Please check the logs.",
                "debug_info": {
                    "azure_openai_endpoint": state.chat.endpoint(),
                    "has_endpoint": state.chat.endpoint().is_some(),
                    "pool_endpoint": state.sessions.endpoint(),
                }
            }));
        }
    };

    let code = code_extract::extract_code(&ai_response);
    info!(
        response_length = ai_response.len(),
        extracted = !code.is_empty(),
        "Extraction finished"
    );

    let mut result = json!({
        "output": ai_response.clone(),
        "note": "Response from Azure OpenAI",
        "debug_extracted_code": if code.is_empty() {
            "No Python code detected".to_string()
        } else {
            code.clone()
        },
        "debug_pool_endpoint": state
            .sessions
            .endpoint()
            .unwrap_or("No pool endpoint configured"),
        "debug_ai_response_length": ai_response.len(),
        "debug_contains_code_blocks": ai_response.contains("```"),
    });
    let fields = result.as_object_mut().expect("result is an object");

    let pool_configured = state.sessions.endpoint().is_some();

    if !code.is_empty() && pool_configured && is_math_question {
        let execution = state.sessions.execute(&code).await;

        if execution.success {
            fields.insert("code_executed".to_string(), json!(code));
            fields.insert("execution_output".to_string(), json!(execution.output));
            fields.insert(
                "execution_error".to_string(),
                if execution.error.is_empty() {
                    Value::Null
                } else {
                    json!(execution.error)
                },
            );
            fields.insert(
                "session_id".to_string(),
                json!(execution.session_id.as_deref().unwrap_or("unknown")),
            );
            fields.insert(
                "note".to_string(),
                json!("AI response with Python code executed in session pool"),
            );
        } else {
            fields.insert(
                "debug_execution_result".to_string(),
                serde_json::to_value(&execution).unwrap_or(Value::Null),
            );
            fields.insert("code_extracted".to_string(), json!(code));
            fields.insert("execution_failed".to_string(), json!(execution.error));
            fields.insert(
                "note".to_string(),
                json!("AI response with Python code (execution failed)"),
            );
        }
    } else if !code.is_empty() {
        fields.insert("code_extracted".to_string(), json!(code));
        fields.insert(
            "note".to_string(),
            json!(format!(
                "AI response with Python code (session pool {})",
                if pool_configured { "available" } else { "not configured" }
            )),
        );
    }

    Json(result)
}

pub async fn debug_info(State(state): State<AppState>) -> Json<Value> {
    Json(json!({
        "pool_endpoint": state.sessions.endpoint(),
        "azure_openai_endpoint": state.chat.endpoint(),
        "has_credentials": state.sessions.endpoint().is_some() && state.chat.endpoint().is_some(),
    }))
}
