//! Configuration validation.
//!
//! # Responsibilities
//! - Resolve listen addresses (Go-style `:port` means all interfaces,
//!   host names are looked up once at startup)
//! - Reject identical RPC and HTTP addresses
//! - Check the log level directive parses
//!
//! Returns all validation errors, not just the first.

use std::fmt;
use std::net::{SocketAddr, ToSocketAddrs};

use tracing_subscriber::EnvFilter;

use crate::config::schema::AppConfig;

/// A single semantic problem in the configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationError {
    pub field: &'static str,
    pub message: String,
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.field, self.message)
    }
}

impl std::error::Error for ValidationError {}

/// Socket addresses the two listeners bind to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ListenAddresses {
    pub grpc: SocketAddr,
    pub http: SocketAddr,
}

/// Parse a listen address, accepting `:port` shorthand and `host:port`.
///
/// A host name resolves to its first address.
pub fn parse_listen_address(value: &str) -> Result<SocketAddr, String> {
    let value = value.trim();
    let candidate = if value.starts_with(':') {
        format!("0.0.0.0{value}")
    } else {
        value.to_string()
    };
    if let Ok(addr) = candidate.parse() {
        return Ok(addr);
    }
    candidate
        .to_socket_addrs()
        .map_err(|e| format!("invalid listen address `{value}`: {e}"))?
        .next()
        .ok_or_else(|| format!("listen address `{value}` resolved to nothing"))
}

/// Validate the configuration and resolve the listen addresses.
pub fn validate_config(config: &AppConfig) -> Result<ListenAddresses, Vec<ValidationError>> {
    let mut errors = Vec::new();

    let grpc = parse_listen_address(&config.grpc_address)
        .map_err(|message| errors.push(ValidationError { field: "grpc_address", message }))
        .ok();
    let http = parse_listen_address(&config.http_address)
        .map_err(|message| errors.push(ValidationError { field: "http_address", message }))
        .ok();

    if let (Some(grpc), Some(http)) = (grpc, http) {
        if grpc == http {
            errors.push(ValidationError {
                field: "http_address",
                message: format!("conflicts with grpc_address ({grpc})"),
            });
        }
    }

    if let Err(e) = EnvFilter::try_new(&config.log.level) {
        errors.push(ValidationError {
            field: "log.level",
            message: e.to_string(),
        });
    }

    match (grpc, http) {
        (Some(grpc), Some(http)) if errors.is_empty() => Ok(ListenAddresses { grpc, http }),
        _ => Err(errors),
    }
}
