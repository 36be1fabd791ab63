use std::fmt;
use std::io;

use xethru_frame::FrameError;
use xethru_module::ModuleError;
use xethru_transport::TransportError;

pub const SUCCESS: i32 = 0;
pub const FAILURE: i32 = 1;
pub const TRANSPORT_ERROR: i32 = 3;
pub const PERMISSION_DENIED: i32 = 50;
pub const DATA_INVALID: i32 = 60;
pub const USAGE: i32 = 64;
pub const TIMEOUT: i32 = 124;
pub const INTERNAL: i32 = 125;

pub type CliResult<T> = Result<T, CliError>;

#[derive(Debug)]
pub struct CliError {
    pub code: i32,
    pub message: String,
}

impl CliError {
    pub fn new(code: i32, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
        }
    }
}

impl fmt::Display for CliError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::error::Error for CliError {}

fn io_kind_code(kind: io::ErrorKind) -> i32 {
    match kind {
        io::ErrorKind::PermissionDenied => PERMISSION_DENIED,
        io::ErrorKind::TimedOut | io::ErrorKind::WouldBlock => TIMEOUT,
        io::ErrorKind::NotFound | io::ErrorKind::BrokenPipe => FAILURE,
        _ => INTERNAL,
    }
}

pub fn io_error(context: &str, err: io::Error) -> CliError {
    CliError::new(io_kind_code(err.kind()), format!("{context}: {err}"))
}

pub fn transport_error(context: &str, err: TransportError) -> CliError {
    let code = match (&err, err.io_kind()) {
        (TransportError::InvalidBaudRate(_), _) => USAGE,
        (_, Some(kind)) => io_kind_code(kind),
        (_, None) => TRANSPORT_ERROR,
    };
    CliError::new(code, format!("{context}: {err}"))
}

pub fn frame_error(context: &str, err: FrameError) -> CliError {
    match err {
        FrameError::Io(source) => io_error(context, source),
        FrameError::ConnectionClosed | FrameError::ShortWrite { .. } => {
            CliError::new(FAILURE, format!("{context}: {err}"))
        }
        other => CliError::new(DATA_INVALID, format!("{context}: {other}")),
    }
}

pub fn module_error(context: &str, err: ModuleError) -> CliError {
    match err {
        ModuleError::Transport(err) => transport_error(context, err),
        ModuleError::Frame(err) => frame_error(context, err),
        ModuleError::Parse(_) | ModuleError::NotAcknowledged { .. } => {
            CliError::new(DATA_INVALID, format!("{context}: {err}"))
        }
        ModuleError::Timeout(_) => CliError::new(TIMEOUT, format!("{context}: {err}")),
        ModuleError::Disconnected(_) => CliError::new(FAILURE, format!("{context}: {err}")),
        other => CliError::new(INTERNAL, format!("{context}: {other}")),
    }
}
