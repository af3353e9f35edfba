// mldemo: local web serving for machine-learning demos.
//
// Binds an HTTP server to a free local port, serves a single-page UI and a
// JSON API that proxies to a caller-supplied prediction interface, appends
// flagged examples to a CSV log, and can negotiate an outbound tunnel for
// public sharing.

pub mod web;

pub use web::config::ServerConfig;
pub use web::context::ServerContext;
pub use web::error::{ServerError, TunnelError};
pub use web::interface::Interface;
pub use web::server::{close_server, start_server, ServerHandle};
pub use web::tunnel::{create_tunnel, url_ok, TunnelClient, TunnelPayload};
