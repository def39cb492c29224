use crate::state::AppState;
use axum::{extract::DefaultBodyLimit, Router};

pub mod dto;
pub mod extract;
pub mod handlers;
pub mod prompt;

pub fn router(max_upload_bytes: Option<usize>) -> Router<AppState> {
    let limit = match max_upload_bytes {
        Some(max) => DefaultBodyLimit::max(max),
        None => DefaultBodyLimit::disable(),
    };
    handlers::analyze_routes().layer(limit)
}
