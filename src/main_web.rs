// Demo server binary: serves a builtin reverse-text demo.
//
// Mostly useful for poking at the API by hand; real demos depend on the
// library and supply their own Interface implementation.

use std::path::Path;
use std::sync::Arc;
use std::time::Instant;

use anyhow::{anyhow, Result};
use serde_json::{json, Value};

use mldemo::{start_server, url_ok, Interface, ServerConfig, TunnelClient};

/// Reverses its input text and reports the character count. Embeddings are
/// ASCII letter frequencies, which is enough to make the similarity and
/// projection endpoints do something visible.
struct ReverseTextDemo {
    examples: Vec<Vec<Value>>,
}

impl ReverseTextDemo {
    fn new() -> Self {
        ReverseTextDemo {
            examples: vec![
                vec![json!("hello world")],
                vec![json!("the quick brown fox")],
                vec![json!("machine learning demo")],
            ],
        }
    }

    fn input_text(raw_inputs: &[Value]) -> Result<&str> {
        raw_inputs
            .first()
            .and_then(|v| v.as_str())
            .ok_or_else(|| anyhow!("expected one string input"))
    }
}

impl Interface for ReverseTextDemo {
    fn input_count(&self) -> usize {
        1
    }

    fn output_count(&self) -> usize {
        2
    }

    fn process(&self, raw_inputs: &[Value]) -> Result<(Vec<Value>, Vec<f64>)> {
        let started = Instant::now();
        let text = Self::input_text(raw_inputs)?;
        let reversed: String = text.chars().rev().collect();
        let length = text.chars().count();
        let elapsed = started.elapsed().as_secs_f64();
        Ok((vec![json!(reversed), json!(length)], vec![elapsed]))
    }

    fn preprocess(&self, _index: usize, raw: &Value) -> Result<Value> {
        let text = raw.as_str().ok_or_else(|| anyhow!("expected a string"))?;
        Ok(json!(text.to_lowercase()))
    }

    fn embed(&self, preprocessed: &[Value]) -> Result<Vec<f64>> {
        let text = Self::input_text(preprocessed)?;
        let mut counts = vec![0.0; 26];
        for c in text.chars().filter(|c| c.is_ascii_lowercase()) {
            counts[(c as u8 - b'a') as usize] += 1.0;
        }
        Ok(counts)
    }

    fn interpret(&self, raw_inputs: &[Value]) -> Result<(Value, Value)> {
        // Leave-one-out: score each character by how much dropping it
        // changes the output length (always 1.0 here, but shaped correctly)
        let text = Self::input_text(raw_inputs)?;
        let scores: Vec<f64> = text.chars().map(|_| 1.0).collect();
        let alternatives: Vec<Value> = text
            .char_indices()
            .take(8)
            .map(|(i, _)| {
                let mut altered = String::with_capacity(text.len());
                altered.push_str(&text[..i]);
                altered.push_str(&text[i + text[i..].chars().next().map_or(0, |c| c.len_utf8())..]);
                json!(altered.chars().rev().collect::<String>())
            })
            .collect();
        Ok((json!([scores]), json!(alternatives)))
    }

    fn examples(&self) -> &[Vec<Value>] {
        &self.examples
    }

    fn rebuild_input(&self, _index: usize, _flag_dir: &Path, data: &Value) -> Result<Value> {
        Ok(data.clone())
    }
}

fn main() -> Result<()> {
    let share = std::env::args().any(|arg| arg == "--share");

    let mut config = ServerConfig::from_env();
    config.title = "Reverse Text".to_string();
    config.description = "Reverses whatever you type and counts characters".to_string();
    config.app_config = json!({
        "title": "Reverse Text",
        "input_interfaces": [["textbox", {}]],
        "output_interfaces": [["textbox", {}], ["label", {}]],
        "share_url": null,
    });

    let host = config.host.clone();
    let handle = start_server(Arc::new(ReverseTextDemo::new()), config)?;

    println!("Running locally at: {}", handle.local_url());
    println!("Available endpoints:");
    println!("  GET  /                      - Demo UI");
    println!("  GET  /config                - Demo configuration");
    println!("  POST /api/predict           - Run a prediction");
    println!("  POST /api/predict_examples  - Run stored examples by id");
    println!("  POST /api/score_similarity  - Score input against examples");
    println!("  POST /api/view_embeddings   - Project embeddings to 2-D");
    println!("  POST /api/flag              - Flag an input/output pair");
    println!("  POST /api/interpret         - Interpretation scores");

    if share {
        match TunnelClient::default().setup_tunnel(&host, handle.port()) {
            Ok(url) => {
                if url_ok(&url) {
                    println!("Running publicly at: {}", url);
                } else {
                    eprintln!("Share URL {} is not reachable yet", url);
                }
            }
            Err(e) => eprintln!("Sharing unavailable: {}", e),
        }
    }

    handle.wait();
    Ok(())
}
