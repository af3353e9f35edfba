// Shared per-server state threaded through every connection service.
//
// This replaces process-wide app globals: each started server owns exactly
// one context, so restarting replaces rather than stacks state.

use std::path::PathBuf;
use std::sync::{Arc, Mutex};

use serde_json::Value;

use super::analytics;
use super::config::ServerConfig;
use super::embedding::Projection;
use super::interface::Interface;

pub struct ServerContext {
    pub interface: Arc<dyn Interface>,

    pub title: String,
    pub description: String,
    pub thumbnail: Option<String>,

    /// Served verbatim by GET /config; `share_url` inside it is the only
    /// field mutated after startup (via /enable_sharing).
    pub app_config: Mutex<Value>,

    /// 2-D projection fitted by /api/view_embeddings and reused by
    /// /api/update_embeddings. Whichever request fits last wins; there is no
    /// cross-request consistency guarantee (matches the source behavior).
    pub projection: Mutex<Option<Projection>>,

    /// Working directory captured at startup; /file/{path} resolves against
    /// it and the flag log lives under it.
    pub cwd: PathBuf,

    pub static_root: Option<PathBuf>,
}

impl ServerContext {
    pub fn new(interface: Arc<dyn Interface>, config: &ServerConfig) -> Arc<Self> {
        let cwd = std::env::current_dir().unwrap_or_else(|_| PathBuf::from("."));
        Arc::new(ServerContext {
            interface,
            title: config.title.clone(),
            description: config.description.clone(),
            thumbnail: config.thumbnail.clone(),
            app_config: Mutex::new(config.app_config.clone()),
            projection: Mutex::new(None),
            cwd,
            static_root: config.static_root.clone(),
        })
    }

    /// Whether a share URL is currently set in the app config.
    pub fn share_enabled(&self) -> bool {
        match self.app_config.lock() {
            Ok(config) => matches!(config.get("share_url"), Some(Value::String(_))),
            Err(_) => false,
        }
    }

    /// Feature ping, gated on the interface opting in.
    pub fn ping(&self, feature: &'static str) {
        if self.interface.analytics_enabled() {
            analytics::ping_feature(feature);
        }
    }
}
