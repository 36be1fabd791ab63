use tracing::warn;
use xethru_transport::available_ports;

use crate::cmd::PortsArgs;
use crate::exit::{transport_error, CliResult, FAILURE, SUCCESS};
use crate::output::{print_ports, OutputFormat};

pub fn run(_args: PortsArgs, format: OutputFormat) -> CliResult<i32> {
    let ports = available_ports().map_err(|err| transport_error("port enumeration failed", err))?;
    if ports.is_empty() {
        warn!("no serial ports found");
        return Ok(FAILURE);
    }

    print_ports(&ports, format);
    Ok(SUCCESS)
}
