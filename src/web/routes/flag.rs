// Flagging route handler

use std::convert::Infallible;
use std::sync::Arc;

use hyper::{Body, Request, Response, StatusCode};
use serde_json::Value;

use crate::web::context::ServerContext;
use crate::web::flagging::append_flag;
use crate::web::models::FlagRequest;
use crate::web::request_parsing::parse_json_body;
use crate::web::response_helpers::{json_error, json_success};

/// POST /api/flag — rebuild each input/output value for persistence and
/// append one CSV row to the demo's flag log.
pub async fn handle_flag(
    req: Request<Body>,
    ctx: Arc<ServerContext>,
) -> Result<Response<Body>, Infallible> {
    let request: FlagRequest = match parse_json_body(req.into_body()).await {
        Ok(request) => request,
        Err(error_response) => return Ok(error_response),
    };

    ctx.ping("flag");

    let flag_dir = ctx.cwd.join(ctx.interface.flagging_dir());
    if let Err(e) = std::fs::create_dir_all(&flag_dir) {
        return Ok(json_error(
            StatusCode::INTERNAL_SERVER_ERROR,
            &format!("Failed to create flag directory: {}", e),
        ));
    }

    let mut inputs: Vec<Value> = Vec::with_capacity(ctx.interface.input_count());
    for i in 0..ctx.interface.input_count() {
        let data = request.data.input_data.get(i).cloned().unwrap_or(Value::Null);
        match ctx.interface.rebuild_input(i, &flag_dir, &data) {
            Ok(value) => inputs.push(value),
            Err(e) => {
                return Ok(json_error(
                    StatusCode::INTERNAL_SERVER_ERROR,
                    &format!("Failed to rebuild input {}: {}", i, e),
                ))
            }
        }
    }

    let mut outputs: Vec<Value> = Vec::with_capacity(ctx.interface.output_count());
    for i in 0..ctx.interface.output_count() {
        let data = request.data.output_data.get(i).cloned().unwrap_or(Value::Null);
        match ctx.interface.rebuild_output(i, &flag_dir, &data) {
            Ok(value) => outputs.push(value),
            Err(e) => {
                return Ok(json_error(
                    StatusCode::INTERNAL_SERVER_ERROR,
                    &format!("Failed to rebuild output {}: {}", i, e),
                ))
            }
        }
    }

    match append_flag(&flag_dir, &inputs, &outputs) {
        Ok(()) => Ok(json_success()),
        Err(e) => Ok(json_error(
            StatusCode::INTERNAL_SERVER_ERROR,
            &format!("Failed to write flag log: {}", e),
        )),
    }
}
