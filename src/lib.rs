//! V4L2 camera control panel library.
//!
//! Discovers the adjustable controls of a Linux video capture device,
//! keeps them in a [`ControlRegistry`], and saves or restores them as
//! plain `name=value` files and numbered presets.
//!
//! # Quick Start
//!
//! ```no_run
//! use camera_ctl::{InputEvent, Session, SessionConfig};
//!
//! let mut session = Session::open(SessionConfig::default())?;
//! for control in session.registry() {
//!     println!("{} = {}", control.variable_name, control.display_value());
//! }
//!
//! session.handle_event(InputEvent::StepUp);
//! session.handle_event(InputEvent::SaveConfig);
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

pub mod adjust;
mod device;
mod error;
pub mod filter;
pub mod names;
pub mod persist;
pub mod port;
pub mod presets;
pub mod protocol;
pub mod registry;
pub mod session;
pub mod ui;

pub use device::V4l2Device;
pub use error::{CameraCtlError, Result};
pub use port::{ControlInfo, ControlType, DeviceControlPort, FourCc, MenuItem, StreamFormat};
pub use presets::{Preset, PresetCatalog, PresetOrder};
pub use registry::{ControlDescriptor, ControlKind, ControlRegistry, FpsCeiling, IgnoreSet, RegistryBuilder};
pub use session::{EventOutcome, InputEvent, Session, SessionConfig};
