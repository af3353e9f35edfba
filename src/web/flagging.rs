// Append-only CSV log of flagged input/output pairs.
//
// Header is derived from the input/output cardinality on first write:
// input_0..input_{n-1},output_0..output_{m-1}. One row per flag call.

use std::fs::OpenOptions;
use std::path::Path;

use anyhow::{Context, Result};
use serde_json::Value;

pub const LOG_FILE_NAME: &str = "log.csv";

/// Append one flagged example to `flag_dir/log.csv`, creating the directory
/// and the header row on demand.
pub fn append_flag(flag_dir: &Path, inputs: &[Value], outputs: &[Value]) -> Result<()> {
    std::fs::create_dir_all(flag_dir)
        .with_context(|| format!("failed to create flag directory {}", flag_dir.display()))?;

    let log_path = flag_dir.join(LOG_FILE_NAME);
    let is_new = !log_path.exists();

    let file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(&log_path)
        .with_context(|| format!("failed to open {}", log_path.display()))?;

    let mut writer = csv::WriterBuilder::new()
        .has_headers(false)
        .from_writer(file);

    if is_new {
        let headers: Vec<String> = (0..inputs.len())
            .map(|i| format!("input_{}", i))
            .chain((0..outputs.len()).map(|i| format!("output_{}", i)))
            .collect();
        writer.write_record(&headers)?;
    }

    let row: Vec<String> = inputs.iter().chain(outputs.iter()).map(cell_value).collect();
    writer.write_record(&row)?;
    writer.flush()?;
    Ok(())
}

/// Plain strings are logged as-is; everything else as compact JSON.
fn cell_value(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::path::PathBuf;

    fn temp_flag_dir() -> PathBuf {
        std::env::temp_dir().join(format!("mldemo-flag-{}", uuid::Uuid::new_v4()))
    }

    #[test]
    fn first_write_creates_header_and_row() {
        let dir = temp_flag_dir();
        append_flag(&dir, &[json!("hello")], &[json!("olleh"), json!(5)]).unwrap();

        let content = std::fs::read_to_string(dir.join(LOG_FILE_NAME)).unwrap();
        let lines: Vec<&str> = content.lines().collect();
        assert_eq!(lines.len(), 2);
        assert_eq!(lines[0], "input_0,output_0,output_1");
        assert_eq!(lines[1], "hello,olleh,5");

        std::fs::remove_dir_all(&dir).unwrap();
    }

    #[test]
    fn repeated_flags_keep_single_header() {
        let dir = temp_flag_dir();
        for i in 0..4 {
            append_flag(&dir, &[json!(format!("in {}", i))], &[json!(i)]).unwrap();
        }

        let content = std::fs::read_to_string(dir.join(LOG_FILE_NAME)).unwrap();
        let lines: Vec<&str> = content.lines().collect();
        assert_eq!(lines.len(), 5);
        assert_eq!(lines[0], "input_0,output_0");
        assert!(lines[1..].iter().all(|l| !l.starts_with("input_0")));

        std::fs::remove_dir_all(&dir).unwrap();
    }

    #[test]
    fn non_string_values_serialize_as_json() {
        let dir = temp_flag_dir();
        append_flag(&dir, &[json!({"a": 1})], &[json!([1, 2])]).unwrap();

        let content = std::fs::read_to_string(dir.join(LOG_FILE_NAME)).unwrap();
        let lines: Vec<&str> = content.lines().collect();
        // csv quotes the embedded commas and doubles the inner quotes
        assert_eq!(lines[1], r#""{""a"":1}","[1,2]""#);

        std::fs::remove_dir_all(&dir).unwrap();
    }
}
