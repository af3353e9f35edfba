// Embedding route handlers: similarity scoring and 2-D projection views

use std::convert::Infallible;
use std::sync::Arc;

use anyhow::Result;
use hyper::{Body, Request, Response, StatusCode};
use serde_json::Value;

use crate::web::context::ServerContext;
use crate::web::embedding::{calculate_similarity, Projection};
use crate::web::models::{
    DataRequest, OptionalDataRequest, ScoresResponse, UpdateEmbeddingsResponse,
    ViewEmbeddingsResponse,
};
use crate::web::request_parsing::parse_json_body;
use crate::web::response_helpers::{json_error, json_response};

/// POST /api/score_similarity — embed the submitted input and score it
/// against every stored example.
pub async fn handle_score_similarity(
    req: Request<Body>,
    ctx: Arc<ServerContext>,
) -> Result<Response<Body>, Infallible> {
    let request: DataRequest = match parse_json_body(req.into_body()).await {
        Ok(request) => request,
        Err(error_response) => return Ok(error_response),
    };

    let input_embedding = match embed_raw_input(&ctx, &request.data) {
        Ok(embedding) => embedding,
        Err(e) => return Ok(embedding_error(&e)),
    };

    let mut scores = Vec::new();
    for example_id in 0..ctx.interface.examples().len() {
        match embed_example(&ctx, example_id) {
            Ok(example_embedding) => {
                scores.push(calculate_similarity(&input_embedding, &example_embedding));
            }
            Err(e) => return Ok(embedding_error(&e)),
        }
    }

    ctx.ping("score_similarity");
    Ok(json_response(StatusCode::OK, &ScoresResponse { data: scores }))
}

/// POST /api/view_embeddings — embed the optional sample plus all examples,
/// fit a fresh 2-D projection and remember it for update calls.
pub async fn handle_view_embeddings(
    req: Request<Body>,
    ctx: Arc<ServerContext>,
) -> Result<Response<Body>, Infallible> {
    let request: OptionalDataRequest = match parse_json_body(req.into_body()).await {
        Ok(request) => request,
        Err(error_response) => return Ok(error_response),
    };

    let mut sample_embeddings = Vec::new();
    if let Some(raw_input) = &request.data {
        match embed_raw_input(&ctx, raw_input) {
            Ok(embedding) => sample_embeddings.push(embedding),
            Err(e) => return Ok(embedding_error(&e)),
        }
    }

    let mut example_embeddings = Vec::new();
    for example_id in 0..ctx.interface.examples().len() {
        match embed_example(&ctx, example_id) {
            Ok(embedding) => example_embeddings.push(embedding),
            Err(e) => return Ok(embedding_error(&e)),
        }
    }

    let mut all: Vec<Vec<f64>> = sample_embeddings.clone();
    all.extend(example_embeddings);

    let Some((projection, embeddings_2d)) = Projection::fit(&all) else {
        return Ok(json_error(
            StatusCode::BAD_REQUEST,
            "No embeddings to project",
        ));
    };

    let sample_embedding_2d = embeddings_2d[..sample_embeddings.len()].to_vec();
    let example_embeddings_2d = embeddings_2d[sample_embeddings.len()..].to_vec();

    // Last writer wins; concurrent fits race by design (see ServerContext)
    if let Ok(mut guard) = ctx.projection.lock() {
        *guard = Some(projection);
    }

    ctx.ping("view_embeddings");
    Ok(json_response(
        StatusCode::OK,
        &ViewEmbeddingsResponse {
            sample_embedding_2d,
            example_embeddings_2d,
        },
    ))
}

/// POST /api/update_embeddings — project a new sample with the projection
/// fitted by the last view call.
pub async fn handle_update_embeddings(
    req: Request<Body>,
    ctx: Arc<ServerContext>,
) -> Result<Response<Body>, Infallible> {
    let request: OptionalDataRequest = match parse_json_body(req.into_body()).await {
        Ok(request) => request,
        Err(error_response) => return Ok(error_response),
    };

    let mut sample_embedding_2d = Vec::new();
    if let Some(raw_input) = &request.data {
        let embedding = match embed_raw_input(&ctx, raw_input) {
            Ok(embedding) => embedding,
            Err(e) => return Ok(embedding_error(&e)),
        };

        let projection = match ctx.projection.lock() {
            Ok(guard) => guard.clone(),
            Err(_) => None,
        };
        let Some(projection) = projection else {
            return Ok(json_error(
                StatusCode::BAD_REQUEST,
                "No projection fitted; call view_embeddings first",
            ));
        };
        sample_embedding_2d.push(projection.transform(&embedding));
    }

    Ok(json_response(
        StatusCode::OK,
        &UpdateEmbeddingsResponse {
            sample_embedding_2d,
        },
    ))
}

/// Preprocess each raw input component, then embed the full set.
fn embed_raw_input(ctx: &ServerContext, raw_input: &[Value]) -> Result<Vec<f64>> {
    let mut preprocessed = Vec::with_capacity(raw_input.len());
    for (i, raw) in raw_input.iter().enumerate() {
        preprocessed.push(ctx.interface.preprocess(i, raw)?);
    }
    ctx.interface.embed(&preprocessed)
}

fn embed_example(ctx: &ServerContext, example_id: usize) -> Result<Vec<f64>> {
    let example_row = &ctx.interface.examples()[example_id];
    let mut preprocessed = Vec::with_capacity(example_row.len());
    for (i, example) in example_row.iter().enumerate() {
        let raw = ctx.interface.preprocess_example(i, example);
        preprocessed.push(ctx.interface.preprocess(i, &raw)?);
    }
    ctx.interface.embed(&preprocessed)
}

fn embedding_error(e: &anyhow::Error) -> Response<Body> {
    json_error(
        StatusCode::INTERNAL_SERVER_ERROR,
        &format!("Embedding failed: {}", e),
    )
}
