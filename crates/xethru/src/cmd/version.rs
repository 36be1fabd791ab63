use crate::cmd::VersionArgs;
use crate::exit::{CliResult, SUCCESS};

pub fn run(args: VersionArgs) -> CliResult<i32> {
    if !args.extended {
        println!("xethru {}", env!("CARGO_PKG_VERSION"));
        return Ok(SUCCESS);
    }

    println!("name: xethru");
    println!("version: {}", env!("CARGO_PKG_VERSION"));
    println!(
        "target: {}",
        option_env!("XETHRU_BUILD_TARGET").unwrap_or("unknown")
    );
    println!("target_os: {}", std::env::consts::OS);
    println!("target_arch: {}", std::env::consts::ARCH);
    println!(
        "features: module={}, async={}, cli=true",
        cfg!(feature = "module"),
        cfg!(feature = "async")
    );
    println!(
        "defaults: baud={}, idle_timeout={:?}, ack_timeout={:?}",
        xethru_transport::DEFAULT_BAUD_RATE,
        xethru_module::DEFAULT_IDLE_TIMEOUT,
        xethru_module::DEFAULT_ACK_TIMEOUT
    );

    Ok(SUCCESS)
}
