// Error taxonomy for server startup and tunnel negotiation

use thiserror::Error;

/// Errors surfaced while bringing a demo server up.
#[derive(Debug, Error)]
pub enum ServerError {
    /// Every candidate port in the scan range was busy.
    #[error("all ports from {initial} to {end} are in use; try closing other demo servers")]
    PortExhaustion { initial: u16, end: u16 },

    /// A port probed as free could not be bound after all.
    #[error("failed to bind {addr}: {source}")]
    Bind {
        addr: String,
        #[source]
        source: std::io::Error,
    },
}

/// Errors surfaced while negotiating a public share tunnel.
///
/// `Request` covers the coordination call (network failure, non-200 status,
/// unusable payload); `Setup` covers establishment against the assigned
/// endpoint. The distinction tells the caller whether the coordination
/// service or the tunnel endpoint is at fault.
#[derive(Debug, Error)]
pub enum TunnelError {
    #[error("could not get a tunnel assignment: {0}")]
    Request(String),

    #[error("tunnel setup failed: {0}")]
    Setup(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn port_exhaustion_names_the_range() {
        let err = ServerError::PortExhaustion {
            initial: 7860,
            end: 7960,
        };
        let message = err.to_string();
        assert!(message.contains("7860"));
        assert!(message.contains("7960"));
    }

    #[test]
    fn tunnel_errors_are_distinguishable() {
        let request = TunnelError::Request("status 500".to_string());
        let setup = TunnelError::Setup("connection refused".to_string());
        assert!(request.to_string().contains("assignment"));
        assert!(setup.to_string().contains("setup"));
    }
}
