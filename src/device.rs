//! V4L2 device opening, control ioctls, and lifecycle management.
//!
//! [`V4l2Device::open`] opens the video node, confirms through
//! `VIDIOC_QUERYCAP` that it is a capture device, and returns a handle that
//! implements [`DeviceControlPort`].  The node is closed when the handle is
//! dropped, so the port can never be used after close.

use std::fs::{File, OpenOptions};
use std::io;
use std::mem;
use std::os::unix::fs::OpenOptionsExt;
use std::os::unix::io::AsRawFd;
use std::path::{Path, PathBuf};

use tracing::{debug, info};

use crate::error::{CameraCtlError, Result};
use crate::port::{ControlInfo, ControlType, DeviceControlPort, FourCc, MenuItem, StreamFormat};
use crate::protocol::*;

// ===== V4L2 ioctl Structures =====

#[repr(C)]
struct V4l2Capability {
    driver: [u8; 16],
    card: [u8; 32],
    bus_info: [u8; 32],
    version: u32,
    capabilities: u32,
    device_caps: u32,
    reserved: [u32; 3],
}

#[repr(C)]
struct V4l2Control {
    id: u32,
    value: i32,
}

#[repr(C)]
struct V4l2Queryctrl {
    id: u32,
    ctrl_type: u32,
    name: [u8; V4L2_NAME_LEN],
    minimum: i32,
    maximum: i32,
    step: i32,
    default_value: i32,
    flags: u32,
    reserved: [u32; 2],
}

/// `name` doubles as the 64-bit `value` of integer-menu entries.
#[repr(C, packed)]
struct V4l2Querymenu {
    id: u32,
    index: u32,
    name: [u8; V4L2_NAME_LEN],
    reserved: u32,
}

#[repr(C)]
#[derive(Clone, Copy)]
struct V4l2PixFormat {
    width: u32,
    height: u32,
    pixelformat: u32,
    field: u32,
    bytesperline: u32,
    sizeimage: u32,
    colorspace: u32,
    private: u32,
    flags: u32,
    ycbcr_enc: u32,
    quantization: u32,
    xfer_func: u32,
}

/// The kernel union holds pointers (overlay clips), which sets its alignment.
#[repr(C)]
union V4l2FormatUnion {
    pix: V4l2PixFormat,
    raw_data: [u8; 200],
    _align: *mut libc::c_void,
}

#[repr(C)]
struct V4l2Format {
    buf_type: u32,
    fmt: V4l2FormatUnion,
}

#[repr(C)]
#[derive(Clone, Copy)]
struct V4l2Fract {
    numerator: u32,
    denominator: u32,
}

#[repr(C)]
#[derive(Clone, Copy)]
struct V4l2Captureparm {
    capability: u32,
    capturemode: u32,
    timeperframe: V4l2Fract,
    extendedmode: u32,
    readbuffers: u32,
    reserved: [u32; 4],
}

#[repr(C)]
union V4l2StreamparmUnion {
    capture: V4l2Captureparm,
    raw_data: [u8; 200],
}

#[repr(C)]
struct V4l2Streamparm {
    buf_type: u32,
    parm: V4l2StreamparmUnion,
}

const VIDIOC_QUERYCAP: libc::c_ulong = vidioc_r(NR_QUERYCAP, mem::size_of::<V4l2Capability>());
const VIDIOC_G_FMT: libc::c_ulong = vidioc_rw(NR_G_FMT, mem::size_of::<V4l2Format>());
const VIDIOC_G_PARM: libc::c_ulong = vidioc_rw(NR_G_PARM, mem::size_of::<V4l2Streamparm>());
const VIDIOC_S_PARM: libc::c_ulong = vidioc_rw(NR_S_PARM, mem::size_of::<V4l2Streamparm>());
const VIDIOC_G_CTRL: libc::c_ulong = vidioc_rw(NR_G_CTRL, mem::size_of::<V4l2Control>());
const VIDIOC_S_CTRL: libc::c_ulong = vidioc_rw(NR_S_CTRL, mem::size_of::<V4l2Control>());
const VIDIOC_QUERYCTRL: libc::c_ulong = vidioc_rw(NR_QUERYCTRL, mem::size_of::<V4l2Queryctrl>());
const VIDIOC_QUERYMENU: libc::c_ulong = vidioc_rw(NR_QUERYMENU, mem::size_of::<V4l2Querymenu>());

// ===== Helper Functions =====

/// Extract a null-terminated string from a fixed-size byte array.
fn extract_name(bytes: &[u8]) -> String {
    let name_len = bytes.iter().position(|&c| c == 0).unwrap_or(bytes.len());
    String::from_utf8_lossy(&bytes[..name_len]).to_string()
}

/// Frames per second for a time-per-frame fraction; 0 for an empty fraction.
fn fraction_to_fps(tf: V4l2Fract) -> i32 {
    if tf.numerator == 0 || tf.denominator == 0 {
        return 0;
    }
    (tf.denominator / tf.numerator) as i32
}

fn new_streamparm() -> V4l2Streamparm {
    // SAFETY: all-zero is a valid bit pattern for this plain-data struct.
    let mut parm: V4l2Streamparm = unsafe { mem::zeroed() };
    parm.buf_type = V4L2_BUF_TYPE_VIDEO_CAPTURE;
    parm
}

// ===== Device =====

/// Handle to an opened V4L2 capture device.
pub struct V4l2Device {
    file: File,
    path: PathBuf,
    card: String,
    driver: String,
}

impl V4l2Device {
    /// Open the node read-write and non-blocking, and check it can capture video.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref().to_path_buf();

        let file = OpenOptions::new()
            .read(true)
            .write(true)
            .custom_flags(libc::O_NONBLOCK)
            .open(&path)
            .map_err(|source| CameraCtlError::DeviceOpen { path: path.clone(), source })?;

        // SAFETY: all-zero is a valid bit pattern for this plain-data struct.
        let mut cap: V4l2Capability = unsafe { mem::zeroed() };
        ioctl(&file, VIDIOC_QUERYCAP, &mut cap)
            .map_err(|source| CameraCtlError::DeviceOpen { path: path.clone(), source })?;

        if cap.capabilities & V4L2_CAP_VIDEO_CAPTURE == 0 {
            return Err(CameraCtlError::NotCaptureDevice { path });
        }

        let card = extract_name(&cap.card);
        let driver = extract_name(&cap.driver);
        info!(path = %path.display(), card = %card, driver = %driver, "Opened capture device");

        Ok(Self { file, path, card, driver })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Human-readable card name reported by the driver.
    pub fn card(&self) -> &str {
        &self.card
    }

    pub fn driver(&self) -> &str {
        &self.driver
    }

    fn ioctl<T>(&self, request: libc::c_ulong, arg: &mut T) -> io::Result<()> {
        ioctl(&self.file, request, arg)
    }
}

fn ioctl<T>(file: &File, request: libc::c_ulong, arg: &mut T) -> io::Result<()> {
    // SAFETY: `arg` is a live, exclusively borrowed repr(C) struct whose size
    // is encoded in `request`, so the kernel reads and writes within bounds.
    let result = unsafe { libc::ioctl(file.as_raw_fd(), request as _, arg as *mut T) };
    if result < 0 {
        Err(io::Error::last_os_error())
    } else {
        Ok(())
    }
}

impl DeviceControlPort for V4l2Device {
    fn query_format(&mut self) -> Result<StreamFormat> {
        // SAFETY: all-zero is a valid bit pattern for this plain-data struct.
        let mut fmt: V4l2Format = unsafe { mem::zeroed() };
        fmt.buf_type = V4L2_BUF_TYPE_VIDEO_CAPTURE;

        self.ioctl(VIDIOC_G_FMT, &mut fmt)
            .map_err(|source| CameraCtlError::DeviceQuery { what: "VIDIOC_G_FMT", source })?;

        // SAFETY: for the capture buffer type the kernel fills the `pix` member.
        let pix = unsafe { fmt.fmt.pix };
        let format = StreamFormat {
            pixel_format: FourCc(pix.pixelformat),
            width: pix.width,
            height: pix.height,
        };
        info!(format = %format.pixel_format, width = format.width, height = format.height, "Negotiated format");
        Ok(format)
    }

    fn query_next_control(&mut self, after: u32) -> Option<ControlInfo> {
        // SAFETY: all-zero is a valid bit pattern for this plain-data struct.
        let mut qctrl: V4l2Queryctrl = unsafe { mem::zeroed() };
        qctrl.id = after | V4L2_CTRL_FLAG_NEXT_CTRL | V4L2_CTRL_FLAG_NEXT_COMPOUND;

        // EINVAL marks the end of the traversal.
        self.ioctl(VIDIOC_QUERYCTRL, &mut qctrl).ok()?;

        Some(ControlInfo {
            id: qctrl.id,
            name: extract_name(&qctrl.name),
            control_type: ControlType::from(qctrl.ctrl_type),
            minimum: qctrl.minimum,
            maximum: qctrl.maximum,
            step: qctrl.step,
            default_value: qctrl.default_value,
            flags: qctrl.flags,
        })
    }

    fn query_menu(&mut self, control: &ControlInfo, index: i32) -> Result<MenuItem> {
        let mut qmenu = V4l2Querymenu {
            id: control.id,
            index: index as u32,
            name: [0; V4L2_NAME_LEN],
            reserved: 0,
        };

        self.ioctl(VIDIOC_QUERYMENU, &mut qmenu)
            .map_err(|source| CameraCtlError::DeviceQuery { what: "VIDIOC_QUERYMENU", source })?;

        let raw = qmenu.name;
        Ok(match control.control_type {
            ControlType::IntegerMenu => {
                let mut value = [0u8; 8];
                value.copy_from_slice(&raw[..8]);
                MenuItem::Value(i64::from_ne_bytes(value))
            }
            _ => MenuItem::Name(extract_name(&raw)),
        })
    }

    fn get_value(&mut self, id: u32) -> Result<i32> {
        let mut ctrl = V4l2Control { id, value: 0 };
        self.ioctl(VIDIOC_G_CTRL, &mut ctrl)
            .map_err(|source| CameraCtlError::DeviceQuery { what: "VIDIOC_G_CTRL", source })?;
        Ok(ctrl.value)
    }

    fn set_value(&mut self, id: u32, value: i32) -> Result<()> {
        let mut ctrl = V4l2Control { id, value };
        self.ioctl(VIDIOC_S_CTRL, &mut ctrl)
            .map_err(|source| CameraCtlError::DeviceWrite { id, value, source })?;

        if ctrl.value != value {
            debug!(control_id = id, requested = value, actual = ctrl.value, "V4L2 control value was clamped");
        }
        Ok(())
    }

    fn frame_rate(&mut self) -> Result<i32> {
        let mut parm = new_streamparm();
        self.ioctl(VIDIOC_G_PARM, &mut parm)
            .map_err(|source| CameraCtlError::DeviceQuery { what: "VIDIOC_G_PARM", source })?;

        // SAFETY: for the capture buffer type the kernel fills the `capture` member.
        let tf = unsafe { parm.parm.capture.timeperframe };
        Ok(fraction_to_fps(tf))
    }

    fn set_frame_rate(&mut self, fps: i32) -> Result<i32> {
        let mut parm = new_streamparm();
        let requested = u32::try_from(fps).unwrap_or(0);
        parm.parm.capture = V4l2Captureparm {
            capability: 0,
            capturemode: 0,
            timeperframe: V4l2Fract {
                numerator: FRAME_INTERVAL_NUMERATOR,
                denominator: requested.saturating_mul(FRAME_INTERVAL_NUMERATOR),
            },
            extendedmode: 0,
            readbuffers: 0,
            reserved: [0; 4],
        };

        self.ioctl(VIDIOC_S_PARM, &mut parm).map_err(|source| CameraCtlError::DeviceWrite {
            id: FPS_ENTRY_ID,
            value: fps,
            source,
        })?;

        // SAFETY: the kernel writes back the interval it actually applied.
        let tf = unsafe { parm.parm.capture.timeperframe };
        let achieved = fraction_to_fps(tf);
        debug!(requested = fps, achieved, "Frame interval negotiated");
        Ok(achieved)
    }
}

impl Drop for V4l2Device {
    fn drop(&mut self) {
        // The descriptor itself is closed when `file` drops.
        debug!(path = %self.path.display(), "Closing capture device");
    }
}
