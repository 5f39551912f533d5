use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// Log verbosity level.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LogLevel {
    /// Every frame on the wire.
    Trace,
    /// Dispatch decisions and negotiated features.
    Debug,
    /// Informational messages (default).
    #[default]
    Info,
    /// Warnings only.
    Warn,
    /// Errors only.
    Error,
}

impl LogLevel {
    /// The directive string understood by `tracing` filters.
    pub fn as_str(self) -> &'static str {
        match self {
            LogLevel::Trace => "trace",
            LogLevel::Debug => "debug",
            LogLevel::Info => "info",
            LogLevel::Warn => "warn",
            LogLevel::Error => "error",
        }
    }
}

/// How `qXfer` page data goes on the wire.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum XferEncodingSetting {
    /// Bytes copied as is.
    #[default]
    Raw,
    /// Framing bytes escaped with `}`.
    Escaped,
}

/// Packet transport limits.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TransportConfig {
    /// Retransmissions tolerated per packet (1–64).
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,
    /// Packet buffer capacity in bytes (64–65536).
    #[serde(default = "default_packet_size")]
    pub packet_size: usize,
}

fn default_max_retries() -> u32 {
    5
}

fn default_packet_size() -> usize {
    4096
}

impl Default for TransportConfig {
    fn default() -> Self {
        Self {
            max_retries: default_max_retries(),
            packet_size: default_packet_size(),
        }
    }
}

/// What the debugger is told about the target.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TargetConfig {
    /// Target description XML to serve; the built-in x86-64 document when
    /// unset.
    pub description: Option<PathBuf>,
    /// Encoding of `qXfer` pages.
    #[serde(default)]
    pub xfer_encoding: XferEncodingSetting,
}

/// Where the host harness waits for the debugger.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ListenConfig {
    /// TCP socket address, `host:port`.
    #[serde(default = "default_address")]
    pub address: String,
}

fn default_address() -> String {
    "127.0.0.1:1234".to_string()
}

impl Default for ListenConfig {
    fn default() -> Self {
        Self {
            address: default_address(),
        }
    }
}

/// Logging configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LogConfig {
    /// Log verbosity level.
    #[serde(default)]
    pub level: LogLevel,
    /// Optional path to a log file.
    pub file: Option<PathBuf>,
}

/// Top-level configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub transport: TransportConfig,
    #[serde(default)]
    pub target: TargetConfig,
    #[serde(default)]
    pub listen: ListenConfig,
    #[serde(default)]
    pub log: LogConfig,
}
