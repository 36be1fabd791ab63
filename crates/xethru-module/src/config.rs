use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::protocol::RESPIRATION_APP;

/// Default wait for a command acknowledgement.
pub const DEFAULT_ACK_TIMEOUT: Duration = Duration::from_secs(1);
/// Default silence after which a polling session ends.
pub const DEFAULT_IDLE_TIMEOUT: Duration = Duration::from_millis(500);
/// Default capacity of the record channel.
pub const DEFAULT_RECORD_BUFFER: usize = 64;

/// LED indication mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
#[repr(u8)]
pub enum LedMode {
    #[default]
    Off = 0,
    Simple = 1,
    Full = 2,
}

/// Settings applied to a module by [`crate::Module::configure`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModuleConfig {
    /// Application loaded at configure time.
    pub app_id: [u8; 4],
    pub led_mode: LedMode,
    /// Detection zone start, metres.
    pub zone_start: f32,
    /// Detection zone end, metres.
    pub zone_end: f32,
    pub sensitivity: u32,
    /// How long to wait for each command acknowledgement.
    pub ack_timeout: Duration,
    pub poll: PollConfig,
}

impl Default for ModuleConfig {
    fn default() -> Self {
        Self {
            app_id: RESPIRATION_APP,
            led_mode: LedMode::default(),
            zone_start: 0.4,
            zone_end: 2.0,
            sensitivity: 5,
            ack_timeout: DEFAULT_ACK_TIMEOUT,
            poll: PollConfig::default(),
        }
    }
}

impl ModuleConfig {
    pub fn with_app_id(mut self, app_id: [u8; 4]) -> Self {
        self.app_id = app_id;
        self
    }

    pub fn with_led_mode(mut self, mode: LedMode) -> Self {
        self.led_mode = mode;
        self
    }

    pub fn with_detection_zone(mut self, start: f32, end: f32) -> Self {
        self.zone_start = start;
        self.zone_end = end;
        self
    }

    pub fn with_sensitivity(mut self, sensitivity: u32) -> Self {
        self.sensitivity = sensitivity;
        self
    }

    pub fn with_ack_timeout(mut self, timeout: Duration) -> Self {
        self.ack_timeout = timeout;
        self
    }

    pub fn with_idle_timeout(mut self, timeout: Duration) -> Self {
        self.poll.idle_timeout = timeout;
        self
    }
}

/// Polling session settings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PollConfig {
    /// Silence after which the session ends with `PollExit::TimedOut`.
    pub idle_timeout: Duration,
    /// Records held before the session blocks on a slow consumer.
    pub record_buffer: usize,
}

impl Default for PollConfig {
    fn default() -> Self {
        Self {
            idle_timeout: DEFAULT_IDLE_TIMEOUT,
            record_buffer: DEFAULT_RECORD_BUFFER,
        }
    }
}

impl PollConfig {
    pub fn with_idle_timeout(mut self, timeout: Duration) -> Self {
        self.idle_timeout = timeout;
        self
    }

    pub fn with_record_buffer(mut self, capacity: usize) -> Self {
        self.record_buffer = capacity;
        self
    }
}
