// Wire-format request/response structures shared by the route handlers

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// The generic `{"data": [...]}` envelope used by most /api routes.
#[derive(Deserialize)]
pub struct DataRequest {
    pub data: Vec<Value>,
}

/// Same envelope with the data field optional (embedding views accept
/// requests with no sample).
#[derive(Deserialize)]
pub struct OptionalDataRequest {
    #[serde(default)]
    pub data: Option<Vec<Value>>,
}

#[derive(Serialize)]
pub struct PredictResponse {
    pub data: Vec<Value>,
    pub durations: Vec<f64>,
}

#[derive(Deserialize)]
pub struct ExampleIdsRequest {
    pub data: Vec<usize>,
}

/// Keys are example ids; failing ids are absent, never null.
#[derive(Serialize)]
pub struct PredictExamplesResponse {
    pub data: Map<String, Value>,
}

#[derive(Serialize)]
pub struct ScoresResponse {
    pub data: Vec<f64>,
}

#[derive(Serialize)]
pub struct ViewEmbeddingsResponse {
    pub sample_embedding_2d: Vec<[f64; 2]>,
    pub example_embeddings_2d: Vec<[f64; 2]>,
}

#[derive(Serialize)]
pub struct UpdateEmbeddingsResponse {
    pub sample_embedding_2d: Vec<[f64; 2]>,
}

#[derive(Deserialize)]
pub struct FlagRequest {
    pub data: FlagData,
}

#[derive(Deserialize)]
pub struct FlagData {
    pub input_data: Vec<Value>,
    pub output_data: Vec<Value>,
}

#[derive(Serialize)]
pub struct InterpretResponse {
    pub interpretation_scores: Value,
    pub alternative_outputs: Value,
}
