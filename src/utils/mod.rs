//! Small shared helpers

use crate::error::{AppError, Result};
use std::net::TcpListener;

/// Ask the OS for a currently free loopback TCP port.
///
/// The listener is dropped before returning, so the port is only
/// probably-free; the caller binds it again promptly.
pub fn get_free_port() -> Result<u16> {
    let listener = TcpListener::bind(("127.0.0.1", 0))
        .map_err(|e| AppError::network(format!("failed to allocate a free port: {}", e)))?;
    let port = listener
        .local_addr()
        .map_err(|e| AppError::network(format!("failed to read allocated port: {}", e)))?
        .port();
    Ok(port)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_get_free_port_nonzero() {
        let port = get_free_port().unwrap();
        assert_ne!(port, 0);
    }

    #[test]
    fn test_port_is_bindable_after_release() {
        let port = get_free_port().unwrap();
        let listener = TcpListener::bind(("127.0.0.1", port));
        assert!(listener.is_ok());
    }
}
