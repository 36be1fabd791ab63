use bytes::BytesMut;
use xethru_frame::{encode_frame, unframe, Frame};

use crate::cmd::{parse_hex, CodecArgs};
use crate::exit::{frame_error, CliResult, SUCCESS};
use crate::output::{print_frame, OutputFormat};

/// Frame a payload and print the wire bytes.
pub fn encode(args: CodecArgs, format: OutputFormat) -> CliResult<i32> {
    let payload = parse_hex(&args.hex)?;
    let mut wire = BytesMut::new();
    encode_frame(&payload, &mut wire);

    print_frame(&Frame::new(payload), &wire, format);
    Ok(SUCCESS)
}

/// Check one complete frame and print its payload.
pub fn decode(args: CodecArgs, format: OutputFormat) -> CliResult<i32> {
    let wire = parse_hex(&args.hex)?;
    let payload = unframe(&wire).map_err(|err| frame_error("decode failed", err))?;

    print_frame(&Frame::new(payload), &wire, format);
    Ok(SUCCESS)
}
