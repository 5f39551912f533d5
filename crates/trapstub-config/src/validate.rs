use std::net::SocketAddr;

use crate::config::Config;
use crate::error::ConfigError;

/// Validate a [`Config`], returning all detected violations.
///
/// Returns `Ok(())` when the config is valid, or `Err` with a
/// vector of every validation error found.
pub fn validate(config: &Config) -> Result<(), Vec<ConfigError>> {
    let mut errors = Vec::new();

    // max_retries: 1–64
    let retries = config.transport.max_retries;
    if !(1..=64).contains(&retries) {
        errors.push(ConfigError::Validation {
            field: "transport.max_retries".to_string(),
            message: format!("must be 1\u{2013}64, got {retries}"),
        });
    }

    // packet_size: 64–65536
    let size = config.transport.packet_size;
    if !(64..=65536).contains(&size) {
        errors.push(ConfigError::Validation {
            field: "transport.packet_size".to_string(),
            message: format!("must be 64\u{2013}65536, got {size}"),
        });
    }

    if config
        .target
        .description
        .as_ref()
        .is_some_and(|path| path.as_os_str().is_empty())
    {
        errors.push(ConfigError::Validation {
            field: "target.description".to_string(),
            message: "must not be empty".to_string(),
        });
    }

    if config.listen.address.parse::<SocketAddr>().is_err() {
        errors.push(ConfigError::Validation {
            field: "listen.address".to_string(),
            message: format!("not a socket address: {:?}", config.listen.address),
        });
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}
