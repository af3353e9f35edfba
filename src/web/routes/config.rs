// Configuration route handlers

use std::convert::Infallible;
use std::sync::Arc;

use hyper::{Body, Response, StatusCode};
use serde_json::Value;

use crate::web::context::ServerContext;
use crate::web::response_helpers::{json_error, json_raw, json_success};

/// GET /config — the app config blob, verbatim.
pub async fn handle_get_config(ctx: Arc<ServerContext>) -> Result<Response<Body>, Infallible> {
    let config = match ctx.app_config.lock() {
        Ok(guard) => guard.clone(),
        Err(_) => {
            return Ok(json_error(
                StatusCode::INTERNAL_SERVER_ERROR,
                "Configuration unavailable",
            ))
        }
    };

    match serde_json::to_string(&config) {
        Ok(json) => Ok(json_raw(StatusCode::OK, json)),
        Err(_) => Ok(json_error(
            StatusCode::INTERNAL_SERVER_ERROR,
            "Failed to serialize configuration",
        )),
    }
}

/// GET /enable_sharing/{path} — set the share URL in the app config. The
/// literal token `None` clears it; any other value is stored verbatim.
pub async fn handle_enable_sharing(
    path: String,
    ctx: Arc<ServerContext>,
) -> Result<Response<Body>, Infallible> {
    let share_url = if path == "None" {
        Value::Null
    } else {
        Value::String(path)
    };

    match ctx.app_config.lock() {
        Ok(mut guard) => {
            if let Value::Object(map) = &mut *guard {
                map.insert("share_url".to_string(), share_url);
            }
            Ok(json_success())
        }
        Err(_) => Ok(json_error(
            StatusCode::INTERNAL_SERVER_ERROR,
            "Configuration unavailable",
        )),
    }
}
