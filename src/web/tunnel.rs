// Tunnel negotiation for public sharing.
//
// A single request to the coordination endpoint returns a JSON array whose
// first element describes the assigned tunnel endpoint. Establishment opens a
// control connection there, hands over credentials and the local port, and
// reads back the public URL. The control connection then stays open on a
// background thread: each `STREAM <token>` line it receives is serviced by
// pairing a fresh data connection to the remote with a fresh connection to
// the local server and piping both directions.
//
// One attempt, no retry. A failed tunnel leaves the local server untouched.

use std::io::{BufRead, BufReader, Write};
use std::net::{SocketAddr, TcpStream, ToSocketAddrs};
use std::time::Duration;

use serde::Deserialize;
use serde_json::json;

use crate::{sys_info, sys_warn};

use super::error::TunnelError;

pub const TUNNEL_API_URL: &str = "https://api.mldemo.app/v1/tunnel-request";

const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

/// Remote-assigned connection parameters for one tunnel session.
#[derive(Clone, Debug, Deserialize)]
pub struct TunnelPayload {
    pub host: String,
    pub port: u16,
    #[serde(default)]
    pub user: Option<String>,
    #[serde(default)]
    pub secret: Option<String>,
}

pub struct TunnelClient {
    api_url: String,
    timeout: Duration,
}

impl Default for TunnelClient {
    fn default() -> Self {
        TunnelClient {
            api_url: TUNNEL_API_URL.to_string(),
            timeout: REQUEST_TIMEOUT,
        }
    }
}

impl TunnelClient {
    /// Client against a non-default coordination endpoint.
    pub fn new(api_url: impl Into<String>) -> Self {
        Self::with_timeout(api_url, REQUEST_TIMEOUT)
    }

    /// Client with a non-default coordination timeout. A coordinator that
    /// accepts but never answers is a request failure once this elapses.
    pub fn with_timeout(api_url: impl Into<String>, timeout: Duration) -> Self {
        TunnelClient {
            api_url: api_url.into(),
            timeout,
        }
    }

    /// Request a tunnel assignment and establish the tunnel to
    /// `local_host:local_port`. Returns the public URL.
    pub fn setup_tunnel(&self, local_host: &str, local_port: u16) -> Result<String, TunnelError> {
        let payload = self.request_assignment()?;
        create_tunnel(&payload, local_host, local_port)
    }

    fn request_assignment(&self) -> Result<TunnelPayload, TunnelError> {
        let agent = ureq::AgentBuilder::new().timeout(self.timeout).build();
        // ureq surfaces non-2xx statuses as errors, which is exactly the
        // contract here: anything but 200 is a request failure.
        let response = agent
            .get(&self.api_url)
            .set("content-type", "application/json")
            .call()
            .map_err(|e| TunnelError::Request(e.to_string()))?;

        let assignments: Vec<TunnelPayload> = response
            .into_json()
            .map_err(|e| TunnelError::Request(format!("invalid assignment payload: {}", e)))?;

        assignments
            .into_iter()
            .next()
            .ok_or_else(|| TunnelError::Request("empty tunnel assignment list".to_string()))
    }
}

/// Establish the tunnel described by `payload`, forwarding to
/// `local_host:local_port`. Returns the public URL announced by the remote.
pub fn create_tunnel(
    payload: &TunnelPayload,
    local_host: &str,
    local_port: u16,
) -> Result<String, TunnelError> {
    let remote_addr = resolve(&payload.host, payload.port)?;
    let control = TcpStream::connect_timeout(&remote_addr, REQUEST_TIMEOUT)
        .map_err(|e| TunnelError::Setup(format!("control connection failed: {}", e)))?;
    control
        .set_read_timeout(Some(REQUEST_TIMEOUT))
        .map_err(|e| TunnelError::Setup(e.to_string()))?;

    let handshake = json!({
        "user": payload.user,
        "secret": payload.secret,
        "local_port": local_port,
    });

    let mut writer = control
        .try_clone()
        .map_err(|e| TunnelError::Setup(e.to_string()))?;
    writer
        .write_all(format!("{}\n", handshake).as_bytes())
        .map_err(|e| TunnelError::Setup(format!("handshake write failed: {}", e)))?;

    let mut reader = BufReader::new(control);
    let mut url_line = String::new();
    reader
        .read_line(&mut url_line)
        .map_err(|e| TunnelError::Setup(format!("handshake read failed: {}", e)))?;
    let public_url = url_line.trim().to_string();
    if public_url.is_empty() {
        return Err(TunnelError::Setup(
            "remote closed before announcing a public URL".to_string(),
        ));
    }

    sys_info!("[TUNNEL] Established, public URL: {}", public_url);

    // Session lifetime is bounded by the process: the control loop runs
    // until the remote closes or the process exits.
    let local_host = local_host.to_string();
    let remote_host = payload.host.clone();
    let remote_port = payload.port;
    std::thread::spawn(move || {
        run_control_loop(reader, &remote_host, remote_port, &local_host, local_port);
    });

    Ok(public_url)
}

/// Service stream requests from the control connection until it closes.
fn run_control_loop(
    reader: BufReader<TcpStream>,
    remote_host: &str,
    remote_port: u16,
    local_host: &str,
    local_port: u16,
) {
    // The control connection idles between streams
    let _ = reader.get_ref().set_read_timeout(None);

    for line in reader.lines() {
        let line = match line {
            Ok(line) => line,
            Err(e) => {
                sys_warn!("[TUNNEL] Control connection lost: {}", e);
                return;
            }
        };

        if let Some(token) = line.strip_prefix("STREAM ") {
            let token = token.trim().to_string();
            let remote_host = remote_host.to_string();
            let local_host = local_host.to_string();
            std::thread::spawn(move || {
                if let Err(e) =
                    service_stream(&token, &remote_host, remote_port, &local_host, local_port)
                {
                    sys_warn!("[TUNNEL] Stream {} failed: {}", token, e);
                }
            });
        }
    }

    sys_info!("[TUNNEL] Control connection closed by remote");
}

/// Pair one remote data connection with one local connection and pipe both
/// directions until either side closes.
fn service_stream(
    token: &str,
    remote_host: &str,
    remote_port: u16,
    local_host: &str,
    local_port: u16,
) -> std::io::Result<()> {
    let remote_addr = match resolve(remote_host, remote_port) {
        Ok(addr) => addr,
        Err(e) => {
            return Err(std::io::Error::new(
                std::io::ErrorKind::AddrNotAvailable,
                e.to_string(),
            ))
        }
    };

    let mut remote = TcpStream::connect_timeout(&remote_addr, REQUEST_TIMEOUT)?;
    remote.write_all(format!("DATA {}\n", token).as_bytes())?;

    let mut local = TcpStream::connect((local_host, local_port))?;

    let mut remote_read = remote.try_clone()?;
    let mut local_write = local.try_clone()?;
    let downstream = std::thread::spawn(move || {
        let _ = std::io::copy(&mut remote_read, &mut local_write);
        let _ = local_write.shutdown(std::net::Shutdown::Write);
    });

    let _ = std::io::copy(&mut local, &mut remote);
    let _ = remote.shutdown(std::net::Shutdown::Write);
    let _ = downstream.join();
    Ok(())
}

/// Whether `url` answers a HEAD request with a success status. Used to
/// sanity-check a freshly negotiated share URL before announcing it.
pub fn url_ok(url: &str) -> bool {
    let agent = ureq::AgentBuilder::new().timeout(REQUEST_TIMEOUT).build();
    agent.head(url).call().is_ok()
}

fn resolve(host: &str, port: u16) -> Result<SocketAddr, TunnelError> {
    (host, port)
        .to_socket_addrs()
        .map_err(|e| TunnelError::Setup(format!("cannot resolve {}:{}: {}", host, port, e)))?
        .next()
        .ok_or_else(|| TunnelError::Setup(format!("no address for {}:{}", host, port)))
}
