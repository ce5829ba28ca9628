use std::net::IpAddr;
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use clap::{Args, Subcommand};
use framelink_transport::{ClientConfig, Endpoint, TransportKind};

use crate::exit::{CliError, CliResult, INTERNAL, USAGE};

pub mod listen;
pub mod send;
pub mod stream;
pub mod version;

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Send a single payload to a collector.
    Send(SendArgs),
    /// Run a collector and print received payloads.
    Listen(ListenArgs),
    /// Send a directory of JPEG frames as a video stream.
    Stream(StreamArgs),
    /// Show version information.
    Version(VersionArgs),
}

pub fn run(command: Command, format: crate::output::OutputFormat) -> CliResult<i32> {
    match command {
        Command::Send(args) => send::run(args, format),
        Command::Listen(args) => listen::run(args, format),
        Command::Stream(args) => stream::run(args),
        Command::Version(args) => version::run(args),
    }
}

/// Collector address and socket options shared by the sending commands.
#[derive(Args, Debug)]
pub struct TargetArgs {
    /// Collector host name or IP address.
    #[arg(long, env = "FRAMELINK_HOST")]
    pub host: String,
    /// Collector port.
    #[arg(long, short = 'p', env = "FRAMELINK_PORT")]
    pub port: u16,
    /// Transport to use (stream|tcp, datagram|udp).
    #[arg(long, short = 't', env = "FRAMELINK_TRANSPORT", default_value = "stream")]
    pub transport: TransportKind,
    /// TCP connect timeout (e.g. 5s, 500ms).
    #[arg(long)]
    pub connect_timeout: Option<String>,
    /// Socket write timeout (e.g. 5s, 500ms).
    #[arg(long)]
    pub write_timeout: Option<String>,
    /// Disable Nagle's algorithm on stream connections.
    #[arg(long)]
    pub nodelay: bool,
}

impl TargetArgs {
    pub fn endpoint(&self) -> Endpoint {
        Endpoint::new(self.host.clone(), self.port)
    }

    pub fn client_config(&self) -> CliResult<ClientConfig> {
        Ok(ClientConfig {
            connect_timeout: parse_optional_duration(self.connect_timeout.as_deref())?,
            write_timeout: parse_optional_duration(self.write_timeout.as_deref())?,
            nodelay: self.nodelay,
            ..ClientConfig::default()
        })
    }
}

#[derive(Args, Debug)]
pub struct SendArgs {
    #[command(flatten)]
    pub target: TargetArgs,
    /// Raw string payload, sent as UTF-8 bytes.
    #[arg(long, conflicts_with_all = ["text", "file"])]
    pub data: Option<String>,
    /// Text payload, sent as UTF-16.
    #[arg(long, conflicts_with_all = ["data", "file"])]
    pub text: Option<String>,
    /// Read payload from file.
    #[arg(long, conflicts_with_all = ["data", "text"])]
    pub file: Option<PathBuf>,
    /// Wait for one reply payload and print it.
    #[arg(long)]
    pub wait: bool,
    /// Maximum time to wait for the reply when --wait is set (e.g. 5s, 500ms).
    #[arg(long, default_value = "5s")]
    pub wait_timeout: String,
}

#[derive(Args, Debug)]
pub struct ListenArgs {
    /// Local address to bind.
    #[arg(long, default_value = "0.0.0.0")]
    pub bind: IpAddr,
    /// Local port to bind.
    #[arg(long, short = 'p', env = "FRAMELINK_PORT")]
    pub port: u16,
    /// Transport to accept (stream|tcp, datagram|udp).
    #[arg(long, short = 't', env = "FRAMELINK_TRANSPORT", default_value = "stream")]
    pub transport: TransportKind,
    /// Decode payloads as UTF-16 text.
    #[arg(long)]
    pub text: bool,
    /// Exit after receiving N payloads.
    #[arg(long)]
    pub count: Option<usize>,
}

#[derive(Args, Debug)]
pub struct StreamArgs {
    #[command(flatten)]
    pub target: TargetArgs,
    /// Directory of .jpg/.jpeg frames, sent in file-name order.
    pub frames: PathBuf,
    /// Frames per second.
    #[arg(long, default_value = "10")]
    pub fps: u32,
    /// Start over from the first frame after the last one.
    #[arg(long = "loop")]
    pub repeat: bool,
}

#[derive(Args, Debug)]
pub struct VersionArgs {
    /// Show extended build provenance.
    #[arg(long)]
    pub extended: bool,
}

/// Install a Ctrl+C handler and return the flag it clears.
pub fn install_ctrlc_handler() -> CliResult<Arc<AtomicBool>> {
    let running = Arc::new(AtomicBool::new(true));
    let flag = running.clone();
    ctrlc::set_handler(move || {
        flag.store(false, Ordering::SeqCst);
    })
    .map_err(|err| CliError::new(INTERNAL, format!("signal handler setup failed: {err}")))?;
    Ok(running)
}

pub fn parse_optional_duration(input: Option<&str>) -> CliResult<Option<Duration>> {
    input.map(parse_duration).transpose()
}

pub fn parse_duration(input: &str) -> CliResult<Duration> {
    let input = input.trim();
    if input.is_empty() {
        return Err(CliError::new(USAGE, "duration must not be empty"));
    }

    let (number, millis) = if let Some(num) = input.strip_suffix("ms") {
        (num, true)
    } else if let Some(num) = input.strip_suffix('s') {
        (num, false)
    } else {
        (input, false)
    };

    let value: u64 = number
        .parse()
        .map_err(|_| CliError::new(USAGE, format!("invalid duration value: {input}")))?;

    if value == 0 {
        return Err(CliError::new(USAGE, "duration must be greater than zero"));
    }

    Ok(if millis {
        Duration::from_millis(value)
    } else {
        Duration::from_secs(value)
    })
}
