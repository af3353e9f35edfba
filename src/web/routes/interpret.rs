// Interpretation route handler

use std::convert::Infallible;
use std::sync::Arc;

use hyper::{Body, Request, Response, StatusCode};

use crate::web::context::ServerContext;
use crate::web::models::{DataRequest, InterpretResponse};
use crate::web::request_parsing::parse_json_body;
use crate::web::response_helpers::{json_error, json_response};

/// POST /api/interpret — delegate to the interface's interpretation routine.
pub async fn handle_interpret(
    req: Request<Body>,
    ctx: Arc<ServerContext>,
) -> Result<Response<Body>, Infallible> {
    let request: DataRequest = match parse_json_body(req.into_body()).await {
        Ok(request) => request,
        Err(error_response) => return Ok(error_response),
    };

    ctx.ping("interpret");

    match ctx.interface.interpret(&request.data) {
        Ok((interpretation_scores, alternative_outputs)) => Ok(json_response(
            StatusCode::OK,
            &InterpretResponse {
                interpretation_scores,
                alternative_outputs,
            },
        )),
        Err(e) => Ok(json_error(
            StatusCode::INTERNAL_SERVER_ERROR,
            &format!("Interpretation failed: {}", e),
        )),
    }
}
