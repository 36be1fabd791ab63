/// Errors raised when a decoded payload does not match a telemetry layout.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ParseError {
    /// The payload is empty.
    #[error("baseband data is zero length")]
    NoData,

    /// The payload is shorter than the fixed header.
    #[error("payload too short ({len} bytes, need at least {min})")]
    NotEnoughBytes { len: usize, min: usize },

    /// The payload does not carry the application-data tag.
    #[error("baseband data does not start with the app-data tag (got {tag:#04x})")]
    NotBaseBand { tag: u8 },

    /// The application-data payload is not a baseband IQ message.
    #[error("app data is not baseband IQ (message id {id:#x})")]
    DataHeader { id: u32 },

    /// The header announces more samples than the payload carries.
    #[error("baseband packet incomplete ({bins} bins announced, {len} bytes present)")]
    IncompletePacket { bins: u32, len: usize },

    /// The payload does not carry the respiration tag.
    #[error("payload does not start with the respiration tag (got {tag:?})")]
    NoRespirationByte { tag: Option<u8> },
}

/// Errors that can occur in module operations.
#[derive(Debug, thiserror::Error)]
pub enum ModuleError {
    /// Transport-level error.
    #[error("transport error: {0}")]
    Transport(#[from] xethru_transport::TransportError),

    /// Frame-level error.
    #[error("frame error: {0}")]
    Frame(#[from] xethru_frame::FrameError),

    /// Telemetry payload error.
    #[error("parse error: {0}")]
    Parse(#[from] ParseError),

    /// The module answered a command with something other than an ack.
    #[error("{command} not acknowledged (reply tag {reply:?})")]
    NotAcknowledged {
        command: &'static str,
        reply: Option<u8>,
    },

    /// The module did not answer in time.
    #[error("no reply within {0:?}")]
    Timeout(std::time::Duration),

    /// The module went away.
    #[error("module disconnected: {0}")]
    Disconnected(String),

    /// A worker thread could not be started.
    #[error("failed to spawn worker thread: {0}")]
    Spawn(std::io::Error),

    /// A worker thread panicked.
    #[error("{0} thread panicked")]
    WorkerPanicked(&'static str),
}

pub type Result<T> = std::result::Result<T, ModuleError>;
