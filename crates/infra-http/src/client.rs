// Shared reqwest client construction and error mapping

use jobrelay_core::error::{AppError, Result};
use std::time::Duration;

/// Header carrying the entity store credential
pub const API_KEY_HEADER: &str = "api_key";

pub const LIST_TIMEOUT: Duration = Duration::from_secs(30);
pub const GET_TIMEOUT: Duration = Duration::from_secs(30);
pub const UPDATE_TIMEOUT: Duration = Duration::from_secs(60);
pub const FETCH_TIMEOUT: Duration = Duration::from_secs(300);

const CONNECT_TIMEOUT: Duration = Duration::from_secs(15);
const ERROR_BODY_MAX_CHARS: usize = 300;

/// Client shared by the store and the fetcher. Per-call timeouts are set on
/// each request.
pub fn build_client() -> Result<reqwest::Client> {
    reqwest::Client::builder()
        .connect_timeout(CONNECT_TIMEOUT)
        .user_agent(concat!("jobrelay/", env!("CARGO_PKG_VERSION")))
        .build()
        .map_err(|e| AppError::Config(format!("HTTP client: {}", e)))
}

/// Transport-level failure (connect, timeout, broken body) or a status error
pub fn map_reqwest_error(error: reqwest::Error) -> AppError {
    match error.status() {
        Some(status) => AppError::Remote {
            status: status.as_u16(),
            message: error.to_string(),
        },
        None => AppError::Network(error.to_string()),
    }
}

/// Pass 2xx responses through; turn anything else into [`AppError::Remote`]
/// carrying a truncated body
pub async fn check_status(response: reqwest::Response) -> Result<reqwest::Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let body = response.text().await.unwrap_or_default();
    Err(AppError::Remote {
        status: status.as_u16(),
        message: body.chars().take(ERROR_BODY_MAX_CHARS).collect(),
    })
}
