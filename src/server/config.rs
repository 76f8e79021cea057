use super::RequestsLoggingLevel;
use crate::config::{DEFAULT_MAX_BODY_BYTES, DEFAULT_MOUNT_PREFIXES};

#[derive(Clone, Debug)]
pub struct ServerConfig {
    pub requests_logging_level: RequestsLoggingLevel,
    pub port: u16,
    pub metrics_port: u16,
    /// Every prefix the sync routes are mounted under; "" is the root.
    pub mount_prefixes: Vec<String>,
    /// Largest request body accepted, in bytes.
    pub max_body_bytes: usize,
}

impl Default for ServerConfig {
    fn default() -> Self {
        ServerConfig {
            requests_logging_level: RequestsLoggingLevel::Path,
            port: 3000,
            metrics_port: 9091,
            mount_prefixes: DEFAULT_MOUNT_PREFIXES
                .iter()
                .map(|s| s.to_string())
                .collect(),
            max_body_bytes: DEFAULT_MAX_BODY_BYTES,
        }
    }
}
