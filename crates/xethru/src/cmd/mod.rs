use std::time::Duration;

use clap::{Args, Subcommand, ValueEnum};
use xethru_module::{LedMode, ModuleConfig};
use xethru_transport::{SerialDevice, DEFAULT_BAUD_RATE};

use crate::exit::{CliError, CliResult, USAGE};
use crate::output::OutputFormat;

pub mod codec;
pub mod listen;
pub mod ports;
pub mod send;
pub mod version;

#[derive(Subcommand, Debug)]
pub enum Command {
    /// List serial ports.
    Ports(PortsArgs),
    /// Configure a module and print its telemetry.
    Listen(ListenArgs),
    /// Send one raw command payload.
    Send(SendArgs),
    /// Frame a hex payload without touching a device.
    Encode(CodecArgs),
    /// Decode a hex frame without touching a device.
    Decode(CodecArgs),
    /// Show version information.
    Version(VersionArgs),
}

pub fn run(command: Command, format: OutputFormat) -> CliResult<i32> {
    match command {
        Command::Ports(args) => ports::run(args, format),
        Command::Listen(args) => listen::run(args, format),
        Command::Send(args) => send::run(args, format),
        Command::Encode(args) => codec::encode(args, format),
        Command::Decode(args) => codec::decode(args, format),
        Command::Version(args) => version::run(args),
    }
}

#[derive(Args, Debug)]
pub struct DeviceArgs {
    /// Serial port (e.g. /dev/ttyACM0, COM3).
    pub port: String,
    /// Baud rate.
    #[arg(long, default_value_t = DEFAULT_BAUD_RATE)]
    pub baud: u32,
    /// Serial read timeout (e.g. 100ms, 1s).
    #[arg(long, default_value = "100ms")]
    pub timeout: String,
}

impl DeviceArgs {
    pub fn device(&self) -> CliResult<SerialDevice> {
        Ok(SerialDevice::new(self.port.as_str())
            .with_baud_rate(self.baud)
            .with_timeout(parse_duration(&self.timeout)?))
    }
}

#[derive(Args, Debug, Default)]
pub struct PortsArgs {}

#[derive(Copy, Clone, Debug, PartialEq, Eq, ValueEnum)]
pub enum TelemetryKind {
    Respiration,
    Baseband,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, ValueEnum)]
pub enum LedArg {
    Off,
    Simple,
    Full,
}

impl From<LedArg> for LedMode {
    fn from(arg: LedArg) -> Self {
        match arg {
            LedArg::Off => LedMode::Off,
            LedArg::Simple => LedMode::Simple,
            LedArg::Full => LedMode::Full,
        }
    }
}

#[derive(Args, Debug)]
pub struct ListenArgs {
    #[command(flatten)]
    pub device: DeviceArgs,
    /// Telemetry record type to decode.
    #[arg(long, value_enum, default_value = "respiration")]
    pub kind: TelemetryKind,
    /// Exit after printing N records.
    #[arg(long)]
    pub count: Option<usize>,
    /// Skip the configuration commands and just listen.
    #[arg(long)]
    pub no_configure: bool,
    /// LED mode.
    #[arg(long, value_enum, default_value = "off")]
    pub led: LedArg,
    /// Detection zone start, metres.
    #[arg(long, default_value_t = 0.4)]
    pub zone_start: f32,
    /// Detection zone end, metres.
    #[arg(long, default_value_t = 2.0)]
    pub zone_end: f32,
    /// Detection sensitivity.
    #[arg(long, default_value_t = 5)]
    pub sensitivity: u32,
    /// End the session after this much silence (e.g. 500ms, 2s).
    #[arg(long, default_value = "500ms")]
    pub idle_timeout: String,
    /// Wait this long for each command acknowledgement.
    #[arg(long, default_value = "1s")]
    pub ack_timeout: String,
}

impl ListenArgs {
    pub fn module_config(&self) -> CliResult<ModuleConfig> {
        if self.zone_start > self.zone_end {
            return Err(CliError::new(
                USAGE,
                "--zone-start must not be greater than --zone-end",
            ));
        }
        Ok(ModuleConfig::default()
            .with_led_mode(self.led.into())
            .with_detection_zone(self.zone_start, self.zone_end)
            .with_sensitivity(self.sensitivity)
            .with_ack_timeout(parse_duration(&self.ack_timeout)?)
            .with_idle_timeout(parse_duration(&self.idle_timeout)?))
    }
}

#[derive(Args, Debug)]
pub struct SendArgs {
    #[command(flatten)]
    pub device: DeviceArgs,
    /// Payload as hex bytes (e.g. "21 14 23 a2 d6").
    #[arg(long)]
    pub hex: String,
    /// Wait for one reply frame and print it.
    #[arg(long)]
    pub wait: bool,
    /// Maximum time to wait for the reply when --wait is set (e.g. 5s, 500ms).
    #[arg(long, default_value = "1s")]
    pub wait_timeout: String,
}

#[derive(Args, Debug)]
pub struct CodecArgs {
    /// Bytes as hex (spaces, commas and a 0x prefix are allowed).
    #[arg(long)]
    pub hex: String,
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
        (input, "s")
    };

    let value: u64 = number
        .parse()
        .map_err(|_| CliError::new(USAGE, format!("invalid duration value: {input}")))?;

    if value == 0 {
        return Err(CliError::new(USAGE, "duration must be greater than zero"));
    }

    match unit {
        "ms" => Ok(Duration::from_millis(value)),
        _ => Ok(Duration::from_secs(value)),
    }
}

pub fn parse_hex(input: &str) -> CliResult<Vec<u8>> {
    let digits: String = input
        .split(|c: char| c.is_whitespace() || c == ',' || c == ':')
        .filter(|token| !token.is_empty())
        .map(|token| token.trim_start_matches("0x").trim_start_matches("0X"))
        .map(|token| {
            if token.len() % 2 == 1 {
                format!("0{token}")
            } else {
                token.to_string()
            }
        })
        .collect();

    if digits.is_empty() {
        return Err(CliError::new(USAGE, "--hex must contain at least one byte"));
    }

    (0..digits.len())
        .step_by(2)
        .map(|i| {
            digits
                .get(i..i + 2)
                .and_then(|pair| u8::from_str_radix(pair, 16).ok())
                .ok_or_else(|| CliError::new(USAGE, format!("invalid hex: {input}")))
        })
        .collect()
}
