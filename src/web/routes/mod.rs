// Route handler modules and the top-level dispatcher

pub mod config;
pub mod embeddings;
pub mod flag;
pub mod interpret;
pub mod predict;
pub mod ui;

use std::convert::Infallible;
use std::sync::Arc;

use hyper::{Body, Method, Request, Response, StatusCode};

use super::context::ServerContext;
use super::request_parsing::decode_path_tail;
use super::response_helpers::{cors_preflight, json_error};

/// Dispatch one request to its handler. Trailing slashes are ignored so
/// `/api/predict` and `/api/predict/` are the same route.
pub async fn dispatch(
    req: Request<Body>,
    ctx: Arc<ServerContext>,
) -> Result<Response<Body>, Infallible> {
    let path = req.uri().path();
    let route = if path.len() > 1 {
        path.trim_end_matches('/').to_string()
    } else {
        path.to_string()
    };

    match (req.method(), route.as_str()) {
        (&Method::OPTIONS, _) => Ok(cors_preflight()),

        (&Method::GET, "/") => ui::handle_index(ctx).await,
        (&Method::GET, "/config") => config::handle_get_config(ctx).await,

        (&Method::GET, p) if p.starts_with("/enable_sharing/") => {
            let share_path = decode_path_tail(&route, "/enable_sharing/");
            config::handle_enable_sharing(share_path, ctx).await
        }

        (&Method::POST, "/api/predict") => predict::handle_predict(req, ctx).await,
        (&Method::POST, "/api/predict_examples") => {
            predict::handle_predict_examples(req, ctx).await
        }
        (&Method::POST, "/api/score_similarity") => {
            embeddings::handle_score_similarity(req, ctx).await
        }
        (&Method::POST, "/api/view_embeddings") => {
            embeddings::handle_view_embeddings(req, ctx).await
        }
        (&Method::POST, "/api/update_embeddings") => {
            embeddings::handle_update_embeddings(req, ctx).await
        }
        (&Method::POST, "/api/flag") => flag::handle_flag(req, ctx).await,
        (&Method::POST, "/api/interpret") => interpret::handle_interpret(req, ctx).await,

        (&Method::GET, p) if p.starts_with("/static/") => {
            let asset_path = decode_path_tail(&route, "/static/");
            ui::handle_static_asset(&asset_path, ctx).await
        }
        (&Method::GET, p) if p.starts_with("/file/") => {
            let file_path = decode_path_tail(&route, "/file/");
            ui::handle_file(&file_path, ctx).await
        }

        _ => Ok(json_error(StatusCode::NOT_FOUND, "Not found")),
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::web::config::ServerConfig;
    use crate::web::interface::Interface;
    use anyhow::{anyhow, Result};
    use serde_json::{json, Value};

    /// Text demo used across the handler tests: output is the reversed
    /// input, embeddings are letter counts, and inputs containing "fail"
    /// error out of process().
    pub(crate) struct MockDemo {
        examples: Vec<Vec<Value>>,
        flag_dir: String,
    }

    impl MockDemo {
        pub(crate) fn new(examples: Vec<Vec<Value>>) -> Self {
            MockDemo {
                examples,
                flag_dir: "flagged".to_string(),
            }
        }

        fn with_flag_dir(examples: Vec<Vec<Value>>, flag_dir: String) -> Self {
            MockDemo { examples, flag_dir }
        }
    }

    impl Interface for MockDemo {
        fn input_count(&self) -> usize {
            1
        }

        fn output_count(&self) -> usize {
            1
        }

        fn process(&self, raw_inputs: &[Value]) -> Result<(Vec<Value>, Vec<f64>)> {
            let text = raw_inputs
                .first()
                .and_then(|v| v.as_str())
                .ok_or_else(|| anyhow!("expected a string input"))?;
            if text.contains("fail") {
                return Err(anyhow!("induced failure"));
            }
            let reversed: String = text.chars().rev().collect();
            Ok((vec![json!(reversed)], vec![0.001]))
        }

        fn preprocess(&self, _index: usize, raw: &Value) -> Result<Value> {
            Ok(raw.clone())
        }

        fn embed(&self, preprocessed: &[Value]) -> Result<Vec<f64>> {
            let text = preprocessed
                .first()
                .and_then(|v| v.as_str())
                .ok_or_else(|| anyhow!("expected a string input"))?;
            let mut counts = vec![0.0; 26];
            for c in text.chars().filter(|c| c.is_ascii_lowercase()) {
                counts[(c as u8 - b'a') as usize] += 1.0;
            }
            Ok(counts)
        }

        fn interpret(&self, raw_inputs: &[Value]) -> Result<(Value, Value)> {
            let text = raw_inputs
                .first()
                .and_then(|v| v.as_str())
                .unwrap_or_default();
            let scores: Vec<f64> = text.chars().map(|c| c as u32 as f64 / 1000.0).collect();
            Ok((json!([scores]), json!([])))
        }

        fn examples(&self) -> &[Vec<Value>] {
            &self.examples
        }

        fn flagging_dir(&self) -> &str {
            &self.flag_dir
        }

        fn analytics_enabled(&self) -> bool {
            false
        }
    }

    pub(crate) fn test_context(examples: Vec<Vec<Value>>) -> Arc<ServerContext> {
        let mut config = ServerConfig::from_env();
        config.title = "Mock demo".to_string();
        config.app_config = json!({"share_url": null, "layout": "horizontal"});
        ServerContext::new(Arc::new(MockDemo::new(examples)), &config)
    }

    fn post(path: &str, body: &str) -> Request<Body> {
        Request::builder()
            .method(Method::POST)
            .uri(path)
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    fn get(path: &str) -> Request<Body> {
        Request::builder()
            .method(Method::GET)
            .uri(path)
            .body(Body::empty())
            .unwrap()
    }

    async fn body_json(response: Response<Body>) -> Value {
        let bytes = hyper::body::to_bytes(response.into_body()).await.unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn predict_returns_data_and_durations() {
        let ctx = test_context(vec![]);
        let response = dispatch(post("/api/predict", r#"{"data":["abc"]}"#), ctx)
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let json = body_json(response).await;
        assert_eq!(json["data"][0], "cba");
        assert_eq!(json["durations"].as_array().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn predict_examples_skips_failing_ids() {
        let ctx = test_context(vec![
            vec![json!("good one")],
            vec![json!("this will fail")],
            vec![json!("also good")],
        ]);
        // id 7 is out of range, id 1 fails in process()
        let response = dispatch(post("/api/predict_examples", r#"{"data":[0,1,2,7]}"#), ctx)
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let json = body_json(response).await;
        let data = json["data"].as_object().unwrap();
        assert_eq!(data.len(), 2);
        assert!(data.contains_key("0"));
        assert!(data.contains_key("2"));
        assert!(!data.contains_key("1"));
        assert!(!data.contains_key("7"));
    }

    #[tokio::test]
    async fn config_returns_app_config_verbatim() {
        let ctx = test_context(vec![]);
        let response = dispatch(get("/config"), ctx).await.unwrap();
        let json = body_json(response).await;
        assert_eq!(json["layout"], "horizontal");
        assert_eq!(json["share_url"], Value::Null);
    }

    #[tokio::test]
    async fn enable_sharing_sets_and_clears_share_url() {
        let ctx = test_context(vec![]);

        let response = dispatch(
            get("/enable_sharing/https%3A%2F%2Fabc.mldemo.live"),
            ctx.clone(),
        )
        .await
        .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(
            ctx.app_config.lock().unwrap()["share_url"],
            "https://abc.mldemo.live"
        );
        assert!(ctx.share_enabled());

        // The literal token "None" clears the field
        let response = dispatch(get("/enable_sharing/None"), ctx.clone())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(ctx.app_config.lock().unwrap()["share_url"], Value::Null);
        assert!(!ctx.share_enabled());
    }

    #[tokio::test]
    async fn score_similarity_scores_every_example() {
        let ctx = test_context(vec![vec![json!("abc")], vec![json!("xyz")]]);
        let response = dispatch(post("/api/score_similarity", r#"{"data":["abc"]}"#), ctx)
            .await
            .unwrap();
        let json = body_json(response).await;
        let scores = json["data"].as_array().unwrap();
        assert_eq!(scores.len(), 2);
        // Identical text embeds identically
        assert!((scores[0].as_f64().unwrap() - 1.0).abs() < 1e-9);
        assert!(scores[1].as_f64().unwrap() < 0.5);
    }

    #[tokio::test]
    async fn view_then_update_embeddings_roundtrip() {
        let ctx = test_context(vec![
            vec![json!("aaa")],
            vec![json!("bbb")],
            vec![json!("ccc")],
        ]);

        let response = dispatch(
            post("/api/view_embeddings", r#"{"data":["abc"]}"#),
            ctx.clone(),
        )
        .await
        .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let json = body_json(response).await;
        assert_eq!(json["sample_embedding_2d"].as_array().unwrap().len(), 1);
        assert_eq!(json["example_embeddings_2d"].as_array().unwrap().len(), 3);

        let response = dispatch(
            post("/api/update_embeddings", r#"{"data":["abc"]}"#),
            ctx.clone(),
        )
        .await
        .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let json = body_json(response).await;
        assert_eq!(json["sample_embedding_2d"].as_array().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn update_embeddings_without_projection_is_an_error() {
        let ctx = test_context(vec![]);
        let response = dispatch(post("/api/update_embeddings", r#"{"data":["abc"]}"#), ctx)
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn interpret_returns_scores_and_alternatives() {
        let ctx = test_context(vec![]);
        let response = dispatch(post("/api/interpret", r#"{"data":["hi"]}"#), ctx)
            .await
            .unwrap();
        let json = body_json(response).await;
        assert!(json["interpretation_scores"].is_array());
        assert!(json["alternative_outputs"].is_array());
    }

    #[tokio::test]
    async fn index_renders_meta_and_vendor_prefix() {
        let ctx = test_context(vec![]);
        let response = dispatch(get("/"), ctx.clone()).await.unwrap();
        let bytes = hyper::body::to_bytes(response.into_body()).await.unwrap();
        let html = String::from_utf8(bytes.to_vec()).unwrap();
        assert!(html.contains("<title>Mock demo</title>"));
        // Sharing off: assets load locally
        assert!(html.contains(r#"window.VENDOR_PREFIX = """#));
    }

    #[tokio::test]
    async fn flag_appends_one_csv_row_per_call() {
        // Flag dir is absolute, so cwd joining leaves it untouched
        let dir = std::env::temp_dir().join(format!("mldemo-flag-route-{}", uuid::Uuid::new_v4()));
        let mut config = ServerConfig::from_env();
        config.app_config = json!({});
        let ctx = ServerContext::new(
            Arc::new(MockDemo::with_flag_dir(
                vec![],
                dir.to_string_lossy().into_owned(),
            )),
            &config,
        );

        let body = r#"{"data":{"input_data":["bad input"],"output_data":["tupni dab"]}}"#;
        for _ in 0..3 {
            let response = dispatch(post("/api/flag", body), ctx.clone()).await.unwrap();
            assert_eq!(response.status(), StatusCode::OK);
        }

        let content = std::fs::read_to_string(dir.join("log.csv")).unwrap();
        let lines: Vec<&str> = content.lines().collect();
        assert_eq!(lines[0], "input_0,output_0");
        assert_eq!(lines.len(), 4);

        std::fs::remove_dir_all(&dir).unwrap();
    }

    #[tokio::test]
    async fn unknown_route_is_404() {
        let ctx = test_context(vec![]);
        let response = dispatch(get("/api/unknown"), ctx).await.unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn invalid_json_is_400() {
        let ctx = test_context(vec![]);
        let response = dispatch(post("/api/predict", "not json"), ctx).await.unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }
}
