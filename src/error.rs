//! Custom error types for the camera-ctl tool.
//!
//! Failures are split the way the control loop recovers from them: opening
//! the device is fatal, per-control queries and writes are best-effort, and
//! file errors are reported to the operator without touching the registry.

use std::io;
use std::path::PathBuf;

use thiserror::Error;

/// Crate-wide result alias.
pub type Result<T> = std::result::Result<T, CameraCtlError>;

/// Top-level error type for all camera-ctl operations.
#[derive(Debug, Error)]
pub enum CameraCtlError {
    /// The device node could not be opened.
    #[error("Device open failed: {path}: {source}")]
    DeviceOpen {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// The device opened but does not advertise video capture.
    #[error("{path} is no video capture device")]
    NotCaptureDevice { path: PathBuf },

    /// A query ioctl (capabilities, format, control, menu, value) failed.
    #[error("{what} failed: {source}")]
    DeviceQuery {
        what: &'static str,
        #[source]
        source: io::Error,
    },

    /// Setting a control or stream parameter failed.
    #[error("Setting control 0x{id:08x} to {value} failed: {source}")]
    DeviceWrite {
        id: u32,
        value: i32,
        #[source]
        source: io::Error,
    },

    /// A config or preset file could not be read or written.
    #[error("{}: {source}", path.display())]
    File {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// Invalid CLI argument value.
    #[error("Invalid value '{value}' for {arg}.\nValid values: {valid}")]
    InvalidArgument {
        arg: &'static str,
        value: String,
        valid: &'static str,
    },
}
