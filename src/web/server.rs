// Server lifecycle: port allocation, background accept loop, shutdown.
//
// The accept loop runs on one background thread that owns its own tokio
// runtime, so callers can start a demo from synchronous code and keep their
// main thread. start_server returns only after the bind has succeeded.

use std::convert::Infallible;
use std::net::TcpListener;
use std::sync::Arc;
use std::thread::JoinHandle;

use hyper::service::{make_service_fn, service_fn};
use hyper::Server;
use tokio::sync::oneshot;

use crate::{sys_error, sys_info};

use super::config::ServerConfig;
use super::context::ServerContext;
use super::error::ServerError;
use super::interface::Interface;
use super::ports::first_available_port;
use super::routes;

/// A running demo server. Dropping the handle leaves the server thread
/// running until process exit; call `close` for a deterministic stop.
pub struct ServerHandle {
    port: u16,
    local_url: String,
    context: Arc<ServerContext>,
    shutdown: Option<oneshot::Sender<()>>,
    thread: Option<JoinHandle<()>>,
}

impl ServerHandle {
    pub fn port(&self) -> u16 {
        self.port
    }

    pub fn local_url(&self) -> &str {
        &self.local_url
    }

    pub fn context(&self) -> &Arc<ServerContext> {
        &self.context
    }

    /// Signal graceful shutdown and join the server thread. In-flight
    /// requests finish; no new connections are accepted.
    pub fn close(mut self) {
        if let Some(shutdown) = self.shutdown.take() {
            let _ = shutdown.send(());
        }
        if let Some(thread) = self.thread.take() {
            let _ = thread.join();
        }
    }

    /// Block until the server thread exits (process lifetime for a server
    /// that is never closed remotely).
    pub fn wait(mut self) {
        // Keep the shutdown sender alive while we wait, otherwise the
        // dropped channel would stop the accept loop immediately.
        if let Some(thread) = self.thread.take() {
            let _ = thread.join();
        }
    }
}

/// Allocate a port, start the accept loop on a background thread and return
/// once the server is reachable.
pub fn start_server(
    interface: Arc<dyn Interface>,
    config: ServerConfig,
) -> Result<ServerHandle, ServerError> {
    let initial = config.initial_port;
    let end = initial.saturating_add(config.num_ports);
    let port = first_available_port(&config.host, initial, end)?;

    // Bind here, before spawning, so "running" is observable the moment this
    // function returns.
    let listener =
        TcpListener::bind((config.host.as_str(), port)).map_err(|source| ServerError::Bind {
            addr: format!("{}:{}", config.host, port),
            source,
        })?;
    listener
        .set_nonblocking(true)
        .map_err(|source| ServerError::Bind {
            addr: format!("{}:{}", config.host, port),
            source,
        })?;

    let local_url = format!("http://{}:{}", config.host, port);
    let context = ServerContext::new(interface, &config);
    let (shutdown_tx, shutdown_rx) = oneshot::channel::<()>();

    let thread_context = context.clone();
    let thread_url = local_url.clone();
    let thread = std::thread::Builder::new()
        .name("mldemo-server".to_string())
        .spawn(move || {
            let runtime = match tokio::runtime::Builder::new_multi_thread()
                .enable_all()
                .build()
            {
                Ok(runtime) => runtime,
                Err(e) => {
                    sys_error!("[SERVER] Failed to build runtime: {}", e);
                    return;
                }
            };

            runtime.block_on(async move {
                let make_svc = make_service_fn({
                    let ctx = thread_context.clone();
                    move |_conn| {
                        let ctx = ctx.clone();
                        async move {
                            Ok::<_, Infallible>(service_fn(move |req| {
                                routes::dispatch(req, ctx.clone())
                            }))
                        }
                    }
                });

                let server = match Server::from_tcp(listener) {
                    Ok(builder) => builder.serve(make_svc),
                    Err(e) => {
                        sys_error!("[SERVER] Failed to adopt listener: {}", e);
                        return;
                    }
                };

                sys_info!("[SERVER] Serving on {}", thread_url);
                let graceful = server.with_graceful_shutdown(async {
                    // A dropped handle closes the channel with Err; only an
                    // explicit close() signal stops the accept loop.
                    if shutdown_rx.await.is_err() {
                        std::future::pending::<()>().await;
                    }
                });
                if let Err(e) = graceful.await {
                    sys_error!("[SERVER] Accept loop error: {}", e);
                }
                sys_info!("[SERVER] Stopped");
            });
        })
        .map_err(|source| ServerError::Bind {
            addr: local_url.clone(),
            source,
        })?;

    Ok(ServerHandle {
        port,
        local_url,
        context,
        shutdown: Some(shutdown_tx),
        thread: Some(thread),
    })
}

/// Terminate the server and join its thread.
pub fn close_server(handle: ServerHandle) {
    handle.close();
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::web::routes::tests::MockDemo;
    use serde_json::json;

    fn test_config(initial_port: u16) -> ServerConfig {
        let mut config = ServerConfig::from_env();
        config.host = "127.0.0.1".to_string();
        config.initial_port = initial_port;
        config.num_ports = 50;
        config.title = "lifecycle test".to_string();
        config.app_config = json!({"demo": "lifecycle"});
        config
    }

    #[test]
    fn start_serve_close_then_restart() {
        let first = start_server(Arc::new(MockDemo::new(vec![])), test_config(52860)).unwrap();
        let first_port = first.port();

        // Config endpoint is reachable and serves the latest config
        let body: serde_json::Value = ureq::get(&format!("{}/config", first.local_url()))
            .call()
            .unwrap()
            .into_json()
            .unwrap();
        assert_eq!(body["demo"], "lifecycle");

        close_server(first);

        // Restart allocates a fresh bindable port and is fully functional
        let second = start_server(Arc::new(MockDemo::new(vec![])), test_config(52860)).unwrap();
        assert_eq!(second.port(), first_port, "freed port should be reused");

        let response: serde_json::Value =
            ureq::post(&format!("{}/api/predict", second.local_url()))
                .send_json(json!({"data": ["ping"]}))
                .unwrap()
                .into_json()
                .unwrap();
        assert_eq!(response["data"][0], "gnip");

        second.close();
    }

    #[test]
    fn dropped_handle_leaves_server_running() {
        let handle = start_server(Arc::new(MockDemo::new(vec![])), test_config(54060)).unwrap();
        let url = format!("{}/config", handle.local_url());
        drop(handle);

        // The accept loop must survive the drop; only close() stops it
        std::thread::sleep(std::time::Duration::from_millis(300));
        let body: serde_json::Value = ureq::get(&url).call().unwrap().into_json().unwrap();
        assert_eq!(body["demo"], "lifecycle");
    }

    #[test]
    fn busy_base_port_moves_to_next() {
        let blocker = start_server(Arc::new(MockDemo::new(vec![])), test_config(53460)).unwrap();
        let second = start_server(Arc::new(MockDemo::new(vec![])), test_config(53460)).unwrap();
        assert!(second.port() > blocker.port());
        second.close();
        blocker.close();
    }
}
