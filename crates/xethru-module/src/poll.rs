use std::io::Read;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::{self, Receiver, RecvTimeoutError, Sender, SyncSender};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Duration;

use bytes::Bytes;
use tracing::{debug, error, info, warn};
use xethru_frame::{FrameError, FrameReader};

use crate::config::PollConfig;
use crate::error::{ModuleError, Result};
use crate::telemetry::Telemetry;

/// Why a polling session ended.
#[derive(Debug)]
pub enum PollExit {
    /// No frame arrived within the idle timeout.
    TimedOut,
    /// The transport failed; the error is attached.
    TransportFailed(FrameError),
    /// [`StopHandle::stop`] was called.
    Stopped,
    /// The consumer dropped the record receiver.
    Closed,
}

enum Event {
    Payload(Bytes),
    Corrupt(FrameError),
    Failed(FrameError),
    Stop,
}

/// Requests a polling session to stop. Cheap to clone and `Send`.
#[derive(Debug, Clone)]
pub struct StopHandle {
    stopped: Arc<AtomicBool>,
    wake: Sender<Event>,
}

impl StopHandle {
    /// Stop the session. Idempotent.
    pub fn stop(&self) {
        if !self.stopped.swap(true, Ordering::SeqCst) {
            let _ = self.wake.send(Event::Stop);
        }
    }

    /// Whether a stop was requested.
    pub fn is_stopped(&self) -> bool {
        self.stopped.load(Ordering::SeqCst)
    }
}

/// A running telemetry polling session.
///
/// One thread reads frames from the transport; another parses them into
/// `T` and delivers the records on a bounded channel. The session ends
/// when the module falls silent for the idle timeout, when the transport
/// fails, when it is stopped, or when the receiver is dropped. Either way
/// the record channel is closed, so iterating [`PollSession::iter`]
/// terminates.
pub struct PollSession<T> {
    records: Receiver<T>,
    stop: StopHandle,
    poller: JoinHandle<PollExit>,
}

impl<T: Telemetry> PollSession<T> {
    /// Start polling `reader`.
    ///
    /// The reader's transport should have a read timeout so the reader
    /// thread can observe a stop request.
    pub fn spawn<R>(reader: FrameReader<R>, config: PollConfig) -> Result<Self>
    where
        R: Read + Send + 'static,
    {
        let (event_tx, event_rx) = mpsc::channel();
        let (record_tx, record_rx) = mpsc::sync_channel(config.record_buffer);
        let stopped = Arc::new(AtomicBool::new(false));
        let stop = StopHandle {
            stopped: Arc::clone(&stopped),
            wake: event_tx.clone(),
        };

        thread::Builder::new()
            .name("xethru-reader".to_string())
            .spawn(move || read_frames(reader, event_tx, stopped))
            .map_err(ModuleError::Spawn)?;

        let poller = {
            let stop = stop.clone();
            thread::Builder::new()
                .name("xethru-poll".to_string())
                .spawn(move || deliver::<T>(event_rx, record_tx, config.idle_timeout, stop))
        };
        let poller = match poller {
            Ok(handle) => handle,
            Err(err) => {
                stop.stop();
                return Err(ModuleError::Spawn(err));
            }
        };

        info!(
            kind = T::KIND,
            idle_timeout_ms = config.idle_timeout.as_millis() as u64,
            "polling session started"
        );
        Ok(Self {
            records: record_rx,
            stop,
            poller,
        })
    }

    /// Receiver of parsed records.
    pub fn records(&self) -> &Receiver<T> {
        &self.records
    }

    /// Blocking iterator over records; ends with the session.
    pub fn iter(&self) -> mpsc::Iter<'_, T> {
        self.records.iter()
    }

    /// Wait up to `timeout` for the next record.
    pub fn recv_timeout(&self, timeout: Duration) -> std::result::Result<T, RecvTimeoutError> {
        self.records.recv_timeout(timeout)
    }

    /// A handle that can stop the session from another thread.
    pub fn stop_handle(&self) -> StopHandle {
        self.stop.clone()
    }

    /// Request the session to stop.
    pub fn stop(&self) {
        self.stop.stop();
    }

    /// Wait for the session to end and report why.
    ///
    /// Records not yet received are discarded.
    pub fn join(self) -> Result<PollExit> {
        drop(self.records);
        self.poller
            .join()
            .map_err(|_| ModuleError::WorkerPanicked("poll"))
    }
}

fn read_frames<R: Read>(mut reader: FrameReader<R>, events: Sender<Event>, stopped: Arc<AtomicBool>) {
    while !stopped.load(Ordering::SeqCst) {
        let event = match reader.read_frame() {
            Ok(frame) => Event::Payload(frame.payload),
            Err(err) if err.is_timeout() => continue,
            Err(err) if err.is_framing() => Event::Corrupt(err),
            Err(err) => {
                let _ = events.send(Event::Failed(err));
                return;
            }
        };
        if events.send(event).is_err() {
            return;
        }
    }
    debug!("reader thread stopped");
}

fn deliver<T: Telemetry>(
    events: Receiver<Event>,
    records: SyncSender<T>,
    idle_timeout: Duration,
    stop: StopHandle,
) -> PollExit {
    let mut delivered: u64 = 0;
    let exit = loop {
        match events.recv_timeout(idle_timeout) {
            Ok(Event::Payload(payload)) => match T::parse(&payload) {
                Ok(record) => {
                    if records.send(record).is_err() {
                        break if stop.is_stopped() {
                            PollExit::Stopped
                        } else {
                            PollExit::Closed
                        };
                    }
                    delivered += 1;
                }
                Err(err) => warn!(kind = T::KIND, error = %err, "dropping telemetry payload"),
            },
            Ok(Event::Corrupt(err)) => warn!(error = %err, "dropping corrupt frame"),
            Ok(Event::Failed(err)) => {
                error!(error = %err, "transport failed");
                break PollExit::TransportFailed(err);
            }
            Ok(Event::Stop) | Err(RecvTimeoutError::Disconnected) => break PollExit::Stopped,
            Err(RecvTimeoutError::Timeout) => break PollExit::TimedOut,
        }
    };

    stop.stop();
    info!(kind = T::KIND, delivered, exit = ?exit, "polling session ended");
    exit
}
