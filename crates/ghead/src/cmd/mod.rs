use std::net::SocketAddr;
use std::time::Duration;

use clap::{Args, Subcommand};
use ghead_frame::{FrameConfig, DEFAULT_MAX_BODY};

use crate::exit::{CliError, CliResult, USAGE};
use crate::output::OutputFormat;

pub mod listen;
pub mod read;
pub mod version;

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Accept TCP connections and print every frame received.
    Listen(ListenArgs),
    /// Read a single frame from stdin.
    Read(ReadArgs),
    /// Show version information.
    Version(VersionArgs),
}

pub fn run(command: Command, format: OutputFormat) -> CliResult<i32> {
    match command {
        Command::Listen(args) => listen::run(args, format),
        Command::Read(args) => read::run(args, format),
        Command::Version(args) => version::run(args),
    }
}

/// Limits shared by every command that reads frames.
#[derive(Args, Debug)]
pub struct ReadLimits {
    /// Budget for each read phase (e.g. 5s, 500ms). Use "none" to block.
    #[arg(long, default_value = "5s")]
    pub timeout: String,
    /// Largest body accepted, in bytes.
    #[arg(long, default_value_t = DEFAULT_MAX_BODY)]
    pub max_body: usize,
}

impl ReadLimits {
    pub fn frame_config(&self) -> CliResult<FrameConfig> {
        let read_timeout = if self.timeout.trim().eq_ignore_ascii_case("none") {
            None
        } else {
            Some(parse_duration(&self.timeout)?)
        };
        Ok(FrameConfig {
            max_body_len: self.max_body,
            read_timeout,
        })
    }
}

#[derive(Args, Debug)]
pub struct ListenArgs {
    /// TCP address to bind (e.g. 127.0.0.1:7000).
    pub addr: SocketAddr,
    #[command(flatten)]
    pub limits: ReadLimits,
    /// Exit after receiving N frames.
    #[arg(long)]
    pub count: Option<usize>,
}

#[derive(Args, Debug)]
pub struct ReadArgs {
    #[command(flatten)]
    pub limits: ReadLimits,
}

#[derive(Args, Debug)]
pub struct VersionArgs {
    /// Show extended build provenance.
    #[arg(long)]
    pub extended: bool,
}

pub fn parse_duration(input: &str) -> CliResult<Duration> {
    let input = input.trim();
    if input.is_empty() {
        return Err(CliError::new(USAGE, "duration must not be empty"));
    }

    let (number, unit) = if let Some(num) = input.strip_suffix("ms") {
        (num, "ms")
    } else if let Some(num) = input.strip_suffix('s') {
        (num, "s")
    } else {
        (input, "ms")
    };

    let value: u64 = number
        .parse()
        .map_err(|_| CliError::new(USAGE, format!("invalid duration value: {input}")))?;

    match unit {
        "ms" => Ok(Duration::from_millis(value)),
        _ => Ok(Duration::from_secs(value)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_duration_units() {
        assert_eq!(parse_duration("2s").unwrap(), Duration::from_secs(2));
        assert_eq!(parse_duration("150ms").unwrap(), Duration::from_millis(150));
        assert_eq!(parse_duration("40").unwrap(), Duration::from_millis(40));
        assert_eq!(parse_duration("0ms").unwrap(), Duration::ZERO);
    }

    #[test]
    fn parse_duration_rejects_invalid_values() {
        assert!(parse_duration("").is_err());
        assert!(parse_duration("bad").is_err());
        assert!(parse_duration("-5ms").is_err());
    }

    #[test]
    fn limits_build_frame_config() {
        let limits = ReadLimits {
            timeout: "250ms".into(),
            max_body: 64,
        };
        let cfg = limits.frame_config().unwrap();
        assert_eq!(cfg.read_timeout, Some(Duration::from_millis(250)));
        assert_eq!(cfg.max_body_len, 64);

        let blocking = ReadLimits {
            timeout: "none".into(),
            max_body: 64,
        };
        assert_eq!(blocking.frame_config().unwrap().read_timeout, None);
    }
}
