//! The device capability the control core talks through.
//!
//! [`DeviceControlPort`] is the seam between the registry/session logic and
//! the kernel.  [`V4l2Device`](crate::V4l2Device) implements it with raw
//! ioctls; tests implement it with a scripted in-memory device.

use std::fmt;

use crate::error::Result;
use crate::protocol::*;

// ---------------------------------------------------------------------------
// Public types
// ---------------------------------------------------------------------------

/// A V4L2 FourCC pixel format code.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct FourCc(pub u32);

impl FourCc {
    pub fn from_bytes(code: &[u8; 4]) -> Self {
        Self(u32::from_le_bytes(*code))
    }

    /// Any of the H.264 family formats.
    pub fn is_h264(&self) -> bool {
        matches!(
            self.0,
            V4L2_PIX_FMT_H264 | V4L2_PIX_FMT_H264_NO_SC | V4L2_PIX_FMT_H264_MVC
        )
    }

    pub fn is_mpeg4(&self) -> bool {
        self.0 == V4L2_PIX_FMT_MPEG4
    }
}

impl fmt::Display for FourCc {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for byte in self.0.to_le_bytes() {
            let c = if byte.is_ascii_graphic() || byte == b' ' { byte as char } else { '.' };
            write!(f, "{}", c)?;
        }
        Ok(())
    }
}

/// The negotiated capture format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct StreamFormat {
    pub pixel_format: FourCc,
    pub width: u32,
    pub height: u32,
}

/// Control type as reported by the device.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ControlType {
    Integer,
    Boolean,
    Menu,
    IntegerMenu,
    Unknown(u32),
}

impl From<u32> for ControlType {
    fn from(value: u32) -> Self {
        match value {
            V4L2_CTRL_TYPE_INTEGER => ControlType::Integer,
            V4L2_CTRL_TYPE_BOOLEAN => ControlType::Boolean,
            V4L2_CTRL_TYPE_MENU => ControlType::Menu,
            V4L2_CTRL_TYPE_INTEGER_MENU => ControlType::IntegerMenu,
            other => ControlType::Unknown(other),
        }
    }
}

impl ControlType {
    pub fn has_menu(&self) -> bool {
        matches!(self, Self::Menu | Self::IntegerMenu)
    }
}

/// One control as described by the device during enumeration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ControlInfo {
    pub id: u32,
    pub name: String,
    pub control_type: ControlType,
    pub minimum: i32,
    pub maximum: i32,
    pub step: i32,
    pub default_value: i32,
    pub flags: u32,
}

impl ControlInfo {
    pub fn is_disabled(&self) -> bool {
        self.flags & V4L2_CTRL_FLAG_DISABLED != 0
    }

    /// Value cannot currently be changed (depends on another control).
    pub fn is_inactive(&self) -> bool {
        self.flags & V4L2_CTRL_FLAG_INACTIVE != 0
    }

    pub fn is_read_only(&self) -> bool {
        self.flags & V4L2_CTRL_FLAG_READ_ONLY != 0
    }

    /// Disabled, inactive or read-only controls are never offered for adjustment.
    pub fn is_adjustable(&self) -> bool {
        !(self.is_disabled() || self.is_inactive() || self.is_read_only())
    }
}

/// Payload of a menu entry: a label for menus, a number for integer menus.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MenuItem {
    Name(String),
    Value(i64),
}

impl fmt::Display for MenuItem {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Name(name) => write!(f, "{}", name),
            Self::Value(value) => write!(f, "{}", value),
        }
    }
}

// ---------------------------------------------------------------------------
// Port trait
// ---------------------------------------------------------------------------

/// Control-level access to an opened capture device.
///
/// Opening happens in the implementor's constructor and closing in its
/// `Drop`, so a port value is always usable for as long as it exists.
pub trait DeviceControlPort {
    /// The currently negotiated capture format.
    fn query_format(&mut self) -> Result<StreamFormat>;

    /// Describe the first control whose id follows `after`, or `None` once
    /// the device has no further controls. Pass `0` to start a traversal.
    fn query_next_control(&mut self, after: u32) -> Option<ControlInfo>;

    /// Look up one entry of a menu or integer-menu control.
    fn query_menu(&mut self, control: &ControlInfo, index: i32) -> Result<MenuItem>;

    fn get_value(&mut self, id: u32) -> Result<i32>;

    fn set_value(&mut self, id: u32, value: i32) -> Result<()>;

    /// Current frame rate, 0 when the device reports an empty interval.
    fn frame_rate(&mut self) -> Result<i32>;

    /// Request `fps` and return the rate the device actually settled on.
    fn set_frame_rate(&mut self, fps: i32) -> Result<i32>;

    /// Lazily walk every control the device exposes, in id order.
    ///
    /// Each call starts a fresh traversal.
    fn controls(&mut self) -> Controls<'_, Self>
    where
        Self: Sized,
    {
        Controls { port: self, cursor: 0, done: false }
    }
}

/// Iterator returned by [`DeviceControlPort::controls`].
pub struct Controls<'a, P> {
    port: &'a mut P,
    cursor: u32,
    done: bool,
}

impl<P: DeviceControlPort> Iterator for Controls<'_, P> {
    type Item = ControlInfo;

    fn next(&mut self) -> Option<ControlInfo> {
        if self.done {
            return None;
        }
        match self.port.query_next_control(self.cursor) {
            // Ids must strictly increase or the device would loop forever.
            Some(info) if info.id > self.cursor => {
                self.cursor = info.id;
                Some(info)
            }
            _ => {
                self.done = true;
                None
            }
        }
    }
}

impl<P> Controls<'_, P> {
    /// Borrow the port while the traversal is paused.
    pub fn port(&mut self) -> &mut P {
        self.port
    }
}

// ---------------------------------------------------------------------------
// Scripted device for tests
// ---------------------------------------------------------------------------

#[cfg(test)]
pub(crate) mod fake {
    use std::collections::HashMap;
    use std::io;

    use super::*;
    use crate::error::CameraCtlError;

    /// In-memory device. Controls without an entry in `values` fail to read.
    #[derive(Debug, Default)]
    pub(crate) struct FakePort {
        pub format: StreamFormat,
        pub fail_format: bool,
        pub controls: Vec<ControlInfo>,
        pub values: HashMap<u32, i32>,
        pub menus: HashMap<(u32, i32), MenuItem>,
        pub reject_writes: bool,
        pub fps: i32,
        /// Rates the device can produce; empty means any rate is accepted.
        pub supported_fps: Vec<i32>,
        pub writes: Vec<(u32, i32)>,
        pub fps_requests: Vec<i32>,
    }

    fn query_error(what: &'static str) -> CameraCtlError {
        CameraCtlError::DeviceQuery {
            what,
            source: io::Error::from_raw_os_error(libc::EINVAL),
        }
    }

    impl FakePort {
        pub fn new() -> Self {
            Self { fps: 30, ..Self::default() }
        }

        /// Add a readable integer control.
        pub fn with_integer(mut self, id: u32, name: &str, range: (i32, i32, i32), default: i32, value: i32) -> Self {
            self.controls.push(ControlInfo {
                id,
                name: name.to_string(),
                control_type: ControlType::Integer,
                minimum: range.0,
                maximum: range.1,
                step: range.2,
                default_value: default,
                flags: 0,
            });
            self.values.insert(id, value);
            self
        }

        /// Add a readable control with arbitrary description.
        pub fn with_control(mut self, info: ControlInfo, value: Option<i32>) -> Self {
            if let Some(value) = value {
                self.values.insert(info.id, value);
            }
            self.controls.push(info);
            self
        }

        pub fn with_menu_item(mut self, id: u32, index: i32, item: MenuItem) -> Self {
            self.menus.insert((id, index), item);
            self
        }
    }

    impl DeviceControlPort for FakePort {
        fn query_format(&mut self) -> Result<StreamFormat> {
            if self.fail_format {
                return Err(query_error("VIDIOC_G_FMT"));
            }
            Ok(self.format)
        }

        fn query_next_control(&mut self, after: u32) -> Option<ControlInfo> {
            self.controls
                .iter()
                .filter(|c| c.id > after)
                .min_by_key(|c| c.id)
                .cloned()
        }

        fn query_menu(&mut self, control: &ControlInfo, index: i32) -> Result<MenuItem> {
            self.menus
                .get(&(control.id, index))
                .cloned()
                .ok_or_else(|| query_error("VIDIOC_QUERYMENU"))
        }

        fn get_value(&mut self, id: u32) -> Result<i32> {
            self.values.get(&id).copied().ok_or_else(|| query_error("VIDIOC_G_CTRL"))
        }

        fn set_value(&mut self, id: u32, value: i32) -> Result<()> {
            self.writes.push((id, value));
            if self.reject_writes {
                return Err(CameraCtlError::DeviceWrite {
                    id,
                    value,
                    source: io::Error::from_raw_os_error(libc::ERANGE),
                });
            }
            self.values.insert(id, value);
            Ok(())
        }

        fn frame_rate(&mut self) -> Result<i32> {
            Ok(self.fps)
        }

        fn set_frame_rate(&mut self, fps: i32) -> Result<i32> {
            self.fps_requests.push(fps);
            let achieved = if self.supported_fps.is_empty() {
                fps
            } else {
                self.supported_fps
                    .iter()
                    .copied()
                    .filter(|&rate| rate <= fps)
                    .max()
                    .or_else(|| self.supported_fps.iter().copied().min())
                    .unwrap_or(fps)
            };
            self.fps = achieved;
            Ok(achieved)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::fake::FakePort;
    use super::*;

    #[test]
    fn control_type_conversion() {
        assert_eq!(ControlType::from(1), ControlType::Integer);
        assert_eq!(ControlType::from(2), ControlType::Boolean);
        assert_eq!(ControlType::from(3), ControlType::Menu);
        assert_eq!(ControlType::from(9), ControlType::IntegerMenu);
        assert_eq!(ControlType::from(99), ControlType::Unknown(99));
    }

    #[test]
    fn fourcc_display_and_families() {
        let h264 = FourCc::from_bytes(b"H264");
        assert_eq!(h264.to_string(), "H264");
        assert!(h264.is_h264());
        assert!(FourCc::from_bytes(b"AVC1").is_h264());
        assert!(FourCc::from_bytes(b"MPG4").is_mpeg4());
        assert!(!FourCc::from_bytes(b"MJPG").is_h264());
        assert_eq!(FourCc(0).to_string(), "....");
    }

    #[test]
    fn adjustable_flags() {
        let mut info = ControlInfo {
            id: 1,
            name: "Brightness".into(),
            control_type: ControlType::Integer,
            minimum: 0,
            maximum: 10,
            step: 1,
            default_value: 5,
            flags: 0,
        };
        assert!(info.is_adjustable());
        for flag in [V4L2_CTRL_FLAG_DISABLED, V4L2_CTRL_FLAG_INACTIVE, V4L2_CTRL_FLAG_READ_ONLY] {
            info.flags = flag;
            assert!(!info.is_adjustable());
        }
    }

    #[test]
    fn controls_iterator_walks_in_id_order_and_restarts() {
        let mut port = FakePort::new()
            .with_integer(30, "C", (0, 1, 1), 0, 0)
            .with_integer(10, "A", (0, 1, 1), 0, 0)
            .with_integer(20, "B", (0, 1, 1), 0, 0);

        let names: Vec<String> = port.controls().map(|c| c.name).collect();
        assert_eq!(names, ["A", "B", "C"]);

        let again = port.controls().count();
        assert_eq!(again, 3);
    }
}
