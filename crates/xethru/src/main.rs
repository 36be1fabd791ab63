mod cmd;
mod exit;
mod logging;
mod output;

use clap::Parser;

use crate::cmd::Command;
use crate::logging::{init_logging, LogFormat, LogLevel};
use crate::output::OutputFormat;

#[derive(Parser, Debug)]
#[command(name = "xethru", version, about = "XeThru X2M200 radar module CLI")]
struct Cli {
    /// Output format.
    #[arg(long, value_name = "FORMAT", global = true)]
    format: Option<OutputFormat>,

    /// Log output format (stderr).
    #[arg(long, value_name = "FORMAT", default_value = "text", global = true)]
    log_format: LogFormat,

    /// Minimum log level (stderr).
    #[arg(long, value_name = "LEVEL", default_value = "info", global = true)]
    log_level: LogLevel,

    #[command(subcommand)]
    command: Command,
}

fn main() {
    let cli = Cli::parse();
    init_logging(cli.log_format, cli.log_level);

    let format = cli.format.unwrap_or_else(OutputFormat::default_for_stdout);
    let result = cmd::run(cli.command, format);

    match result {
        Ok(code) => std::process::exit(code),
        Err(err) => {
            eprintln!("error: {err}");
            std::process::exit(err.code);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cmd::{LedArg, TelemetryKind};

    #[test]
    fn parses_listen_subcommand() {
        let cli = Cli::try_parse_from([
            "xethru",
            "listen",
            "/dev/ttyACM0",
            "--kind",
            "baseband",
            "--count",
            "10",
            "--led",
            "full",
            "--idle-timeout",
            "2s",
        ])
        .expect("listen args should parse");

        match cli.command {
            Command::Listen(args) => {
                assert_eq!(args.device.port, "/dev/ttyACM0");
                assert_eq!(args.kind, TelemetryKind::Baseband);
                assert_eq!(args.count, Some(10));
                assert_eq!(args.led, LedArg::Full);
                let config = args.module_config().unwrap();
                assert_eq!(config.poll.idle_timeout, std::time::Duration::from_secs(2));
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn listen_defaults_to_respiration() {
        let cli = Cli::try_parse_from(["xethru", "listen", "COM3"]).unwrap();
        match cli.command {
            Command::Listen(args) => {
                assert_eq!(args.kind, TelemetryKind::Respiration);
                assert_eq!(args.device.baud, 115_200);
                assert!(!args.no_configure);
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn rejects_unknown_kind() {
        let err = Cli::try_parse_from(["xethru", "listen", "COM3", "--kind", "amplitude"])
            .expect_err("unknown kind should fail");
        assert_eq!(err.kind(), clap::error::ErrorKind::InvalidValue);
    }

    #[test]
    fn send_requires_hex() {
        let err = Cli::try_parse_from(["xethru", "send", "/dev/ttyACM0"])
            .expect_err("missing --hex should fail");
        assert_eq!(err.kind(), clap::error::ErrorKind::MissingRequiredArgument);
    }

    #[test]
    fn parses_codec_subcommands() {
        let cli = Cli::try_parse_from(["xethru", "encode", "--hex", "01 02 00"]).unwrap();
        assert!(matches!(cli.command, Command::Encode(_)));

        let cli = Cli::try_parse_from(["xethru", "--format", "json", "decode", "--hex", "7d01"])
            .unwrap();
        assert!(matches!(cli.command, Command::Decode(_)));
        assert!(matches!(cli.format, Some(OutputFormat::Json)));
    }
}
