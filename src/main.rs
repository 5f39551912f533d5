mod logging;
mod sim;

use std::env;
use std::net::TcpListener;
use std::path::PathBuf;

use anyhow::{Context, Result};
use tracing::info;

use trapstub_arch::x86_64;
use trapstub_config::{load_config, load_file, Config, XferEncodingSetting};
use trapstub_core::{Stub, StubOptions, TargetDescription, XferEncoding};
use trapstub_proto::StreamChannel;

fn stub_options(config: &Config) -> StubOptions {
    StubOptions {
        max_retries: config.transport.max_retries,
        packet_size: config.transport.packet_size,
        xfer_encoding: match config.target.xfer_encoding {
            XferEncodingSetting::Raw => XferEncoding::Raw,
            XferEncodingSetting::Escaped => XferEncoding::Escaped,
        },
    }
}

fn target_description(config: &Config) -> Result<TargetDescription> {
    match &config.target.description {
        Some(path) => {
            let bytes = std::fs::read(path).with_context(|| {
                format!("failed to read target description: {}", path.display())
            })?;
            Ok(TargetDescription::from_vec(bytes))
        }
        None => Ok(x86_64::target_description()),
    }
}

fn run(config_path: Option<PathBuf>) -> Result<()> {
    let config = match config_path {
        Some(path) => load_file(&path)
            .with_context(|| format!("failed to load config: {}", path.display()))?,
        None => load_config(&logging::default_config_path()).context("failed to load config")?,
    };

    let log_path = config
        .log
        .file
        .clone()
        .unwrap_or_else(logging::default_log_file_path);
    logging::init(&log_path, config.log.level)?;

    let target = target_description(&config)?;
    let options = stub_options(&config);

    let listener = TcpListener::bind(&config.listen.address)
        .with_context(|| format!("failed to listen on {}", config.listen.address))?;
    eprintln!(
        "trapstub: waiting for debugger on {} (log: {})",
        config.listen.address,
        log_path.display()
    );
    info!(address = %config.listen.address, "listening for debugger");

    let (stream, peer) = listener.accept().context("failed to accept debugger")?;
    stream
        .set_nodelay(true)
        .context("failed to configure debugger socket")?;
    info!(%peer, "debugger connected");

    let reader = stream
        .try_clone()
        .context("failed to clone debugger socket")?;
    let mut stub = Stub::new(StreamChannel::new(reader, stream), target, options);
    stub.init().context("failed to initialize debug stub")?;

    let mut machine = sim::Machine::demo();
    let summary = machine
        .run(&mut stub)
        .context("simulated CPU raised a trap the debugger cannot handle")?;
    eprintln!(
        "trapstub: program finished after {} instructions, {} traps (rax = {})",
        summary.executed,
        summary.traps,
        machine.frame().rax
    );
    Ok(())
}

fn main() {
    let args: Vec<String> = env::args().collect();
    let config_path = args.get(1).map(PathBuf::from);

    if let Err(e) = run(config_path) {
        eprintln!("trapstub: {:#}", e);
        std::process::exit(1);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stub_options_follow_config() {
        let config = trapstub_config::load_from_str(
            "[transport]\nmax_retries = 9\npacket_size = 512\n[target]\nxfer_encoding = \"escaped\"\n",
        )
        .unwrap();
        let options = stub_options(&config);
        assert_eq!(options.max_retries, 9);
        assert_eq!(options.packet_size, 512);
        assert_eq!(options.xfer_encoding, XferEncoding::Escaped);
    }

    #[test]
    fn default_config_serves_builtin_description() {
        let target = target_description(&Config::default()).unwrap();
        assert_eq!(target.as_bytes(), x86_64::TARGET_XML);
    }

    #[test]
    fn description_loaded_from_file() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("target.xml");
        std::fs::write(&path, "<target/>").unwrap();
        let mut config = Config::default();
        config.target.description = Some(path);
        let target = target_description(&config).unwrap();
        assert_eq!(target.as_bytes(), b"<target/>");
    }

    #[test]
    fn missing_description_file_is_an_error() {
        let mut config = Config::default();
        config.target.description = Some(PathBuf::from("/nonexistent/target.xml"));
        let err = target_description(&config).unwrap_err();
        assert!(format!("{err:#}").contains("/nonexistent/target.xml"));
    }
}
