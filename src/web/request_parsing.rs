// Request parsing utilities for HTTP handlers

use hyper::{Body, Response, StatusCode};
use serde::de::DeserializeOwned;

use crate::{sys_debug, sys_error};

use super::response_helpers::json_error;

/// Parse JSON request body into a typed structure.
///
/// Returns the deserialized value on success, or an error Response (with
/// CORS headers and a JSON error message) ready to hand back to hyper.
///
/// # Example
/// ```ignore
/// let predict_request: PredictRequest = match parse_json_body(req.into_body()).await {
///     Ok(req) => req,
///     Err(error_response) => return Ok(error_response),
/// };
/// ```
pub async fn parse_json_body<T: DeserializeOwned>(body: Body) -> Result<T, Response<Body>> {
    let body_bytes = match hyper::body::to_bytes(body).await {
        Ok(bytes) => bytes,
        Err(_) => {
            return Err(json_error(
                StatusCode::BAD_REQUEST,
                "Failed to read request body",
            ));
        }
    };

    // Debug: log the received JSON for troubleshooting
    if let Ok(body_str) = std::str::from_utf8(&body_bytes) {
        if !body_str.is_empty() {
            sys_debug!("[REQUEST] Body: {}", body_str);
        }
    }

    match serde_json::from_slice::<T>(&body_bytes) {
        Ok(parsed) => Ok(parsed),
        Err(e) => {
            sys_error!("[REQUEST] JSON parsing error: {}", e);
            Err(json_error(StatusCode::BAD_REQUEST, "Invalid JSON format"))
        }
    }
}

/// URL-decode the tail of a path after `prefix`.
///
/// For `/file/sub%20dir/a.png` with prefix `/file/` this yields
/// `sub dir/a.png`. Falls back to the raw tail if decoding fails.
pub fn decode_path_tail(path: &str, prefix: &str) -> String {
    let tail = path.strip_prefix(prefix).unwrap_or(path);
    urlencoding::decode(tail)
        .map(|s| s.into_owned())
        .unwrap_or_else(|_| tail.to_string())
}
