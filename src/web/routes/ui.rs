// UI shell and file serving route handlers

use std::convert::Infallible;
use std::sync::Arc;

use hyper::{Body, Response, StatusCode};
use tokio::fs;

use crate::web::config::PUBLIC_STATIC_ROOT;
use crate::web::context::ServerContext;
use crate::web::response_helpers::{file_response, html_response, json_error};

// Minimal shell; a packaged frontend replaces the body at build time.
const INDEX_TEMPLATE: &str = r#"<!DOCTYPE html>
<html>
<head>
<meta charset="utf-8">
<title>{title}</title>
<meta name="description" content="{description}">
<meta property="og:image" content="{thumbnail}">
<script>window.VENDOR_PREFIX = "{vendor_prefix}";</script>
<link rel="stylesheet" href="{vendor_prefix}/static/bundle.css">
</head>
<body>
<div id="root"></div>
<script src="{vendor_prefix}/static/bundle.js"></script>
</body>
</html>"#;

pub async fn handle_index(ctx: Arc<ServerContext>) -> Result<Response<Body>, Infallible> {
    // When sharing is on, assets come from the public root so the page works
    // through the tunnel; locally the prefix is empty.
    let vendor_prefix = if ctx.share_enabled() {
        PUBLIC_STATIC_ROOT
    } else {
        ""
    };

    let html = INDEX_TEMPLATE
        .replace("{title}", &ctx.title)
        .replace("{description}", &ctx.description)
        .replace("{thumbnail}", ctx.thumbnail.as_deref().unwrap_or(""))
        .replace("{vendor_prefix}", vendor_prefix);

    Ok(html_response(StatusCode::OK, html))
}

pub async fn handle_static_asset(
    path: &str,
    ctx: Arc<ServerContext>,
) -> Result<Response<Body>, Infallible> {
    let Some(root) = ctx.static_root.as_ref() else {
        return Ok(json_error(StatusCode::NOT_FOUND, "No static root configured"));
    };

    let file_path = root.join(path);
    match fs::read(&file_path).await {
        Ok(content) => Ok(file_response(content, content_type_for(path))),
        Err(_) => Ok(Response::builder()
            .status(StatusCode::NOT_FOUND)
            .body(Body::from("Asset not found"))
            .unwrap()),
    }
}

/// Serve an arbitrary file relative to the working directory captured at
/// startup. There is deliberately no containment check here; any relative
/// path under the working directory is servable (known unscoped behavior).
pub async fn handle_file(
    path: &str,
    ctx: Arc<ServerContext>,
) -> Result<Response<Body>, Infallible> {
    let file_path = ctx.cwd.join(path);
    match fs::read(&file_path).await {
        Ok(content) => Ok(file_response(content, content_type_for(path))),
        Err(_) => Ok(json_error(StatusCode::NOT_FOUND, "File not found")),
    }
}

fn content_type_for(path: &str) -> &'static str {
    if path.ends_with(".js") {
        "application/javascript"
    } else if path.ends_with(".css") {
        "text/css"
    } else if path.ends_with(".png") {
        "image/png"
    } else if path.ends_with(".jpg") || path.ends_with(".jpeg") {
        "image/jpeg"
    } else if path.ends_with(".svg") {
        "image/svg+xml"
    } else if path.ends_with(".json") {
        "application/json"
    } else if path.ends_with(".html") || path.ends_with(".htm") {
        "text/html"
    } else if path.ends_with(".txt") || path.ends_with(".csv") {
        "text/plain"
    } else {
        "application/octet-stream"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn content_types_cover_common_assets() {
        assert_eq!(content_type_for("bundle.js"), "application/javascript");
        assert_eq!(content_type_for("style.css"), "text/css");
        assert_eq!(content_type_for("flagged/log.csv"), "text/plain");
        assert_eq!(content_type_for("blob.bin"), "application/octet-stream");
    }
}
