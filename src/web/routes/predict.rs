// Prediction route handlers

use std::convert::Infallible;
use std::sync::Arc;

use hyper::{Body, Request, Response, StatusCode};
use serde_json::{Map, Value};

use crate::sys_warn;
use crate::web::context::ServerContext;
use crate::web::models::{DataRequest, ExampleIdsRequest, PredictExamplesResponse, PredictResponse};
use crate::web::request_parsing::parse_json_body;
use crate::web::response_helpers::{json_error, json_response};

/// POST /api/predict — forward raw inputs to the interface, return
/// predictions plus timing.
pub async fn handle_predict(
    req: Request<Body>,
    ctx: Arc<ServerContext>,
) -> Result<Response<Body>, Infallible> {
    let request: DataRequest = match parse_json_body(req.into_body()).await {
        Ok(request) => request,
        Err(error_response) => return Ok(error_response),
    };

    match ctx.interface.process(&request.data) {
        Ok((data, durations)) => Ok(json_response(
            StatusCode::OK,
            &PredictResponse { data, durations },
        )),
        Err(e) => Ok(json_error(
            StatusCode::INTERNAL_SERVER_ERROR,
            &format!("Prediction failed: {}", e),
        )),
    }
}

/// POST /api/predict_examples — batch-run stored examples by id. A failing
/// example is skipped and the batch continues; its id is simply absent from
/// the result.
pub async fn handle_predict_examples(
    req: Request<Body>,
    ctx: Arc<ServerContext>,
) -> Result<Response<Body>, Infallible> {
    let request: ExampleIdsRequest = match parse_json_body(req.into_body()).await {
        Ok(request) => request,
        Err(error_response) => return Ok(error_response),
    };

    let examples = ctx.interface.examples();
    let mut predictions_set = Map::new();

    for example_id in request.data {
        let Some(example_row) = examples.get(example_id) else {
            sys_warn!("[PREDICT] Skipping unknown example id {}", example_id);
            continue;
        };

        let raw_inputs: Vec<Value> = example_row
            .iter()
            .enumerate()
            .map(|(i, example)| ctx.interface.preprocess_example(i, example))
            .collect();

        match ctx.interface.process(&raw_inputs) {
            Ok((predictions, _durations)) => {
                predictions_set.insert(example_id.to_string(), Value::Array(predictions));
            }
            Err(e) => {
                sys_warn!("[PREDICT] Example {} failed, skipping: {}", example_id, e);
            }
        }
    }

    Ok(json_response(
        StatusCode::OK,
        &PredictExamplesResponse {
            data: predictions_set,
        },
    ))
}
