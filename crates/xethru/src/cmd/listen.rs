use tracing::info;
use xethru_module::{BaseBandIq, Module, PollExit, Respiration, StopHandle, Telemetry};
use xethru_transport::DeviceStream;

use crate::cmd::{ListenArgs, TelemetryKind};
use crate::exit::{frame_error, module_error, CliError, CliResult, INTERNAL, SUCCESS, TIMEOUT};
use crate::output::{print_record, OutputFormat, Record};

pub fn run(args: ListenArgs, format: OutputFormat) -> CliResult<i32> {
    let device = args.device.device()?;
    let config = args.module_config()?;
    let mut module = Module::open(&device, config).map_err(|err| module_error("open failed", err))?;

    if !args.no_configure {
        module
            .configure()
            .map_err(|err| module_error("configure failed", err))?;
    }

    match args.kind {
        TelemetryKind::Respiration => listen_as::<Respiration>(module, args.count, format),
        TelemetryKind::Baseband => listen_as::<BaseBandIq>(module, args.count, format),
    }
}

fn listen_as<T: Telemetry + Record>(
    module: Module<DeviceStream, DeviceStream>,
    count: Option<usize>,
    format: OutputFormat,
) -> CliResult<i32> {
    let idle_timeout = module.config().poll.idle_timeout;
    let (session, _writer) = module
        .start_polling::<T>()
        .map_err(|err| module_error("polling failed to start", err))?;
    install_ctrlc_handler(session.stop_handle())?;

    let mut printed = 0usize;
    for record in session.iter() {
        print_record(&record, format);
        printed = printed.saturating_add(1);

        if count.is_some_and(|count| printed >= count) {
            session.stop();
            break;
        }
    }

    let exit = session
        .join()
        .map_err(|err| module_error("polling failed", err))?;
    info!(printed, "listen finished");

    match exit {
        PollExit::Stopped | PollExit::Closed => Ok(SUCCESS),
        PollExit::TimedOut => Err(CliError::new(
            TIMEOUT,
            format!("no telemetry for {idle_timeout:?}"),
        )),
        PollExit::TransportFailed(err) => Err(frame_error("receive failed", err)),
    }
}

fn install_ctrlc_handler(stop: StopHandle) -> CliResult<()> {
    ctrlc::set_handler(move || stop.stop())
        .map_err(|err| CliError::new(INTERNAL, format!("signal handler setup failed: {err}")))
}
