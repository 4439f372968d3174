pub mod auth;
pub mod azure_chat;
pub mod code_extract;
pub mod math_router;
pub mod session_pool;
