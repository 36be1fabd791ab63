use bytes::BytesMut;
use xethru_frame::encode_frame;
use xethru_module::{Module, ModuleConfig};

use crate::cmd::{parse_duration, parse_hex, SendArgs};
use crate::exit::{module_error, CliResult, SUCCESS};
use crate::output::{print_frame, OutputFormat};

pub fn run(args: SendArgs, format: OutputFormat) -> CliResult<i32> {
    let payload = parse_hex(&args.hex)?;
    let wait_timeout = parse_duration(&args.wait_timeout)?;
    let device = args.device.device()?;

    let config = ModuleConfig::default().with_ack_timeout(wait_timeout);
    let mut module = Module::open(&device, config).map_err(|err| module_error("open failed", err))?;

    module
        .send(&payload)
        .map_err(|err| module_error("send failed", err))?;

    if args.wait {
        let reply = module
            .recv_reply()
            .map_err(|err| module_error("receive failed", err))?;
        let mut wire = BytesMut::new();
        encode_frame(&reply.payload, &mut wire);
        print_frame(&reply, &wire, format);
    }

    Ok(SUCCESS)
}
