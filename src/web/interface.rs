// The capability contract a demo object implements to be served.
//
// The server holds a non-owning handle to one of these for its whole run and
// delegates every /api route to it. Values cross the boundary as
// `serde_json::Value` since that is what the wire carries anyway.

use std::path::Path;

use anyhow::Result;
use serde_json::Value;

pub trait Interface: Send + Sync {
    /// Number of input components. Determines flag-log column count.
    fn input_count(&self) -> usize;

    /// Number of output components.
    fn output_count(&self) -> usize;

    /// Run the full prediction pipeline on raw UI inputs.
    ///
    /// Returns one value per output component plus per-stage durations in
    /// seconds (preprocess / predict / postprocess, whatever the demo
    /// measures).
    fn process(&self, raw_inputs: &[Value]) -> Result<(Vec<Value>, Vec<f64>)>;

    /// Convert the raw UI value for input `index` into model form.
    fn preprocess(&self, index: usize, raw: &Value) -> Result<Value>;

    /// Convert a stored example value for input `index` into raw UI form.
    fn preprocess_example(&self, _index: usize, example: &Value) -> Value {
        example.clone()
    }

    /// Embed one full set of preprocessed inputs into a single vector.
    fn embed(&self, preprocessed: &[Value]) -> Result<Vec<f64>>;

    /// Interpretation scores plus alternative outputs for the given inputs.
    fn interpret(&self, raw_inputs: &[Value]) -> Result<(Value, Value)>;

    /// Stored example rows, one value per input component.
    fn examples(&self) -> &[Vec<Value>];

    /// Directory for the flag log, relative to the working directory.
    fn flagging_dir(&self) -> &str {
        "flagged"
    }

    /// Serialize the raw value of input `index` for flag persistence. Demos
    /// with file-typed inputs write the payload under `flag_dir` and return
    /// the path; plain values pass through.
    fn rebuild_input(&self, _index: usize, _flag_dir: &Path, data: &Value) -> Result<Value> {
        Ok(data.clone())
    }

    /// Same as `rebuild_input`, for output `index`.
    fn rebuild_output(&self, _index: usize, _flag_dir: &Path, data: &Value) -> Result<Value> {
        Ok(data.clone())
    }

    /// Whether feature-usage pings may be sent for this demo.
    fn analytics_enabled(&self) -> bool {
        true
    }
}
