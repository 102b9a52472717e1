use std::fmt;

/// Errors surfaced by the tracker lifecycle and its collaborators.
///
/// The pose math itself never fails; everything here originates at a seam
/// (input source, filter, output protocol, worker thread, C callers).
#[derive(Debug, thiserror::Error)]
pub enum TrackError {
    #[error("Failed to spawn tracker thread: {0}")]
    Spawn(String),

    #[error("Input source fault: {0}")]
    Source(String),

    #[error("Protocol fault: {0}")]
    Protocol(String),

    #[error("Channel disconnected")]
    Disconnected,

    #[error("Tracker thread panicked")]
    WorkerPanicked,

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),
}

/// Thread-safe last-error storage for the C FFI layer.
pub(crate) struct LastError {
    message: std::sync::Mutex<String>,
}

impl LastError {
    pub const fn new() -> Self {
        Self {
            message: std::sync::Mutex::new(String::new()),
        }
    }

    pub fn set(&self, err: &TrackError) {
        if let Ok(mut msg) = self.message.lock() {
            *msg = fmt::format(format_args!("{}\0", err));
        }
    }

    pub fn as_ptr(&self) -> *const std::ffi::c_char {
        match self.message.lock() {
            Ok(msg) if !msg.is_empty() => msg.as_ptr() as *const std::ffi::c_char,
            _ => std::ptr::null(),
        }
    }
}
