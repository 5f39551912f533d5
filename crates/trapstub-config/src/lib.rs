pub mod config;
pub mod error;
pub mod load;
pub mod validate;

pub use config::{
    Config, ListenConfig, LogConfig, LogLevel, TargetConfig, TransportConfig, XferEncodingSetting,
};
pub use error::ConfigError;
pub use load::{load_config, load_file, load_from_str};
pub use validate::validate;
