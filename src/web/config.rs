// Server configuration: bind parameters from the environment plus
// caller-supplied page metadata and the app config blob served at /config

use std::env;
use std::path::PathBuf;

use serde_json::{json, Value};

/// The http server will try to open on this port, then 7861, 7862, etc.
pub const DEFAULT_INITIAL_PORT: u16 = 7860;
/// Number of ports to try before giving up and returning an error.
pub const DEFAULT_NUM_PORTS: u16 = 100;
pub const DEFAULT_HOST: &str = "127.0.0.1";

/// Public asset host injected as `vendor_prefix` into the UI shell when the
/// demo is shared; an empty prefix makes the page load assets locally.
pub const PUBLIC_STATIC_ROOT: &str = "https://mldemo.app";

#[derive(Clone, Debug)]
pub struct ServerConfig {
    pub host: String,
    pub initial_port: u16,
    pub num_ports: u16,

    // Page metadata rendered into the UI shell
    pub title: String,
    pub description: String,
    pub thumbnail: Option<String>,

    /// Local directory served under /static/, if any.
    pub static_root: Option<PathBuf>,

    /// Returned verbatim by GET /config. Usually the component layout the
    /// frontend needs to render inputs and outputs.
    pub app_config: Value,
}

impl ServerConfig {
    /// Bind parameters from `MLDEMO_SERVER_PORT`, `MLDEMO_NUM_PORTS` and
    /// `MLDEMO_SERVER_NAME`, defaults applied for anything unset or invalid.
    pub fn from_env() -> Self {
        ServerConfig {
            host: env::var("MLDEMO_SERVER_NAME").unwrap_or_else(|_| DEFAULT_HOST.to_string()),
            initial_port: env_u16("MLDEMO_SERVER_PORT", DEFAULT_INITIAL_PORT),
            // A zero range can never bind; clamp to at least one candidate
            num_ports: env_u16("MLDEMO_NUM_PORTS", DEFAULT_NUM_PORTS).max(1),
            title: String::new(),
            description: String::new(),
            thumbnail: None,
            static_root: None,
            app_config: json!({}),
        }
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self::from_env()
    }
}

fn env_u16(key: &str, default: u16) -> u16 {
    env::var(key)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_without_env() {
        // Only assert on variables this test does not set; the env is shared
        // across the test process.
        let config = ServerConfig::from_env();
        assert!(config.num_ports >= 1);
        assert!(config.app_config.is_object());
    }

    #[test]
    fn env_u16_rejects_garbage() {
        std::env::set_var("MLDEMO_TEST_PORT_GARBAGE", "not-a-port");
        assert_eq!(env_u16("MLDEMO_TEST_PORT_GARBAGE", 7860), 7860);
        std::env::remove_var("MLDEMO_TEST_PORT_GARBAGE");
    }

    #[test]
    fn env_u16_parses_value() {
        std::env::set_var("MLDEMO_TEST_PORT_VALID", "8123");
        assert_eq!(env_u16("MLDEMO_TEST_PORT_VALID", 7860), 8123);
        std::env::remove_var("MLDEMO_TEST_PORT_VALID");
    }
}
