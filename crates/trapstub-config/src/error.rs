use std::path::PathBuf;
use thiserror::Error;

/// Why the stub's settings could not be loaded.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// An explicitly named config file does not exist.
    #[error("no trapstub config at {0}")]
    NotFound(PathBuf),

    /// The file is not valid TOML or does not match the config schema.
    #[error("malformed trapstub config: {0}")]
    Parse(String),

    /// A setting is outside the range the stub accepts.
    #[error("invalid setting `{field}`: {message}")]
    Validation {
        /// Dotted setting path, e.g. `transport.packet_size`.
        field: String,
        /// What the setting must satisfy.
        message: String,
    },

    /// The config file exists but could not be read.
    #[error("cannot read trapstub config: {0}")]
    Io(#[from] std::io::Error),
}
