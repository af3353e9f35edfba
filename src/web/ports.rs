// Port allocation: linear bind-probe over a bounded range

use std::net::TcpListener;

use super::error::ServerError;

/// Get the first open port in `initial..end` on `host`.
///
/// Each candidate is probed with an exclusive bind that is released
/// immediately, so the caller can re-bind the returned port. Selection is
/// deterministic: the lowest available port wins, so repeated runs on a busy
/// host behave predictably.
pub fn first_available_port(host: &str, initial: u16, end: u16) -> Result<u16, ServerError> {
    for port in initial..end {
        if TcpListener::bind((host, port)).is_ok() {
            return Ok(port);
        }
    }
    Err(ServerError::PortExhaustion { initial, end })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::net::TcpListener;

    const HOST: &str = "127.0.0.1";

    /// Bind `count` consecutive ports somewhere in the dynamic range,
    /// returning the base port and the guards keeping them busy.
    fn occupy_consecutive(count: u16) -> (u16, Vec<TcpListener>) {
        for base in (49400..65000).step_by(37) {
            let mut guards = Vec::new();
            for port in base..base + count {
                match TcpListener::bind((HOST, port)) {
                    Ok(listener) => guards.push(listener),
                    Err(_) => break,
                }
            }
            if guards.len() == count as usize {
                return (base, guards);
            }
        }
        panic!("no window of {} consecutive free ports found", count);
    }

    #[test]
    fn skips_occupied_ports() {
        let (base, _guards) = occupy_consecutive(2);
        let port = first_available_port(HOST, base, base + 50).unwrap();
        assert!(port >= base + 2);
        assert!(port < base + 50);
    }

    #[test]
    fn returns_lowest_free_port() {
        let (base, guards) = occupy_consecutive(3);
        drop(guards);
        let port = first_available_port(HOST, base, base + 50).unwrap();
        assert_eq!(port, base);
    }

    #[test]
    fn errors_when_range_exhausted() {
        let (base, _guards) = occupy_consecutive(3);
        let err = first_available_port(HOST, base, base + 3).unwrap_err();
        match err {
            ServerError::PortExhaustion { initial, end } => {
                assert_eq!(initial, base);
                assert_eq!(end, base + 3);
            }
            other => panic!("unexpected error: {other}"),
        }
    }
}
