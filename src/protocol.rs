//! V4L2 protocol constants.
//!
//! All ioctl request numbers, flag bits, control type codes, FourCC pixel
//! formats and codec control ids are defined here so the rest of the codebase
//! references named constants instead of raw hex.

// ---------------------------------------------------------------------------
// ioctl request encoding
// Calculated as: (dir << 30) | (size << 16) | ('V' << 8) | nr
// where dir: 2=READ, 1=WRITE, 3=READ|WRITE
// ---------------------------------------------------------------------------

const IOC_WRITE: libc::c_ulong = 1;
const IOC_READ: libc::c_ulong = 2;

const fn vidioc(dir: libc::c_ulong, nr: libc::c_ulong, size: usize) -> libc::c_ulong {
    (dir << 30) | ((size as libc::c_ulong) << 16) | ((b'V' as libc::c_ulong) << 8) | nr
}

/// Request number for a device-to-host V4L2 ioctl carrying `size` bytes.
pub const fn vidioc_r(nr: libc::c_ulong, size: usize) -> libc::c_ulong {
    vidioc(IOC_READ, nr, size)
}

/// Request number for a bidirectional V4L2 ioctl carrying `size` bytes.
pub const fn vidioc_rw(nr: libc::c_ulong, size: usize) -> libc::c_ulong {
    vidioc(IOC_READ | IOC_WRITE, nr, size)
}

pub const NR_QUERYCAP: libc::c_ulong = 0;
pub const NR_G_FMT: libc::c_ulong = 4;
pub const NR_G_PARM: libc::c_ulong = 21;
pub const NR_S_PARM: libc::c_ulong = 22;
pub const NR_G_CTRL: libc::c_ulong = 27;
pub const NR_S_CTRL: libc::c_ulong = 28;
pub const NR_QUERYCTRL: libc::c_ulong = 36;
pub const NR_QUERYMENU: libc::c_ulong = 37;

// ---------------------------------------------------------------------------
// Capabilities and buffer types
// ---------------------------------------------------------------------------

/// Device supports the single-planar video capture API.
pub const V4L2_CAP_VIDEO_CAPTURE: u32 = 0x0000_0001;
/// Buffer type used for format and stream parameter queries.
pub const V4L2_BUF_TYPE_VIDEO_CAPTURE: u32 = 1;

// ---------------------------------------------------------------------------
// Control enumeration
// ---------------------------------------------------------------------------

/// OR'ed into the id to ask QUERYCTRL for the next control after `id`.
pub const V4L2_CTRL_FLAG_NEXT_CTRL: u32 = 0x8000_0000;
/// OR'ed into the id to include compound controls in the traversal.
pub const V4L2_CTRL_FLAG_NEXT_COMPOUND: u32 = 0x4000_0000;

pub const V4L2_CTRL_FLAG_DISABLED: u32 = 0x0001;
pub const V4L2_CTRL_FLAG_READ_ONLY: u32 = 0x0004;
pub const V4L2_CTRL_FLAG_INACTIVE: u32 = 0x0010;

pub const V4L2_CTRL_TYPE_INTEGER: u32 = 1;
pub const V4L2_CTRL_TYPE_BOOLEAN: u32 = 2;
pub const V4L2_CTRL_TYPE_MENU: u32 = 3;
pub const V4L2_CTRL_TYPE_INTEGER_MENU: u32 = 9;

/// Fixed length of name fields in queryctrl/querymenu.
pub const V4L2_NAME_LEN: usize = 32;

// ---------------------------------------------------------------------------
// Pixel formats (FourCC, little-endian packed)
// ---------------------------------------------------------------------------

const fn fourcc(code: &[u8; 4]) -> u32 {
    (code[0] as u32) | ((code[1] as u32) << 8) | ((code[2] as u32) << 16) | ((code[3] as u32) << 24)
}

/// H.264 with start codes.
pub const V4L2_PIX_FMT_H264: u32 = fourcc(b"H264");
/// H.264 without start codes.
pub const V4L2_PIX_FMT_H264_NO_SC: u32 = fourcc(b"AVC1");
/// H.264 multiview coding.
pub const V4L2_PIX_FMT_H264_MVC: u32 = fourcc(b"M264");
/// MPEG-4 part 2 elementary stream.
pub const V4L2_PIX_FMT_MPEG4: u32 = fourcc(b"MPG4");
/// Motion JPEG, the usual compressed capture format on UVC devices.
pub const V4L2_PIX_FMT_MJPEG: u32 = fourcc(b"MJPG");
/// Packed YUV 4:2:2, the usual raw capture format on UVC devices.
pub const V4L2_PIX_FMT_YUYV: u32 = fourcc(b"YUYV");

// ---------------------------------------------------------------------------
// Codec control ids
// ---------------------------------------------------------------------------

const V4L2_CTRL_CLASS_CODEC: u32 = 0x0099_0000;
const V4L2_CID_CODEC_BASE: u32 = V4L2_CTRL_CLASS_CODEC | 0x900;
const V4L2_CID_CODEC_MFC51_BASE: u32 = V4L2_CTRL_CLASS_CODEC | 0x1100;

/// Controls that only mean something while the device emits H.264.
pub const H264_ONLY_CONTROLS: &[u32] = &[
    // MFC 5.1 vendor controls
    V4L2_CID_CODEC_MFC51_BASE,      // DECODER_H264_DISPLAY_DELAY
    V4L2_CID_CODEC_MFC51_BASE + 1,  // DECODER_H264_DISPLAY_DELAY_ENABLE
    V4L2_CID_CODEC_MFC51_BASE + 50, // H264_ADAPTIVE_RC_ACTIVITY
    V4L2_CID_CODEC_MFC51_BASE + 51, // H264_ADAPTIVE_RC_DARK
    V4L2_CID_CODEC_MFC51_BASE + 52, // H264_ADAPTIVE_RC_SMOOTH
    V4L2_CID_CODEC_MFC51_BASE + 53, // H264_ADAPTIVE_RC_STATIC
    V4L2_CID_CODEC_MFC51_BASE + 54, // H264_NUM_REF_PIC_FOR_P
    // Generic H.264 encoder controls
    V4L2_CID_CODEC_BASE + 352, // B_FRAME_QP
    V4L2_CID_CODEC_BASE + 353, // MIN_QP
    V4L2_CID_CODEC_BASE + 354, // MAX_QP
    V4L2_CID_CODEC_BASE + 355, // 8X8_TRANSFORM
    V4L2_CID_CODEC_BASE + 356, // CPB_SIZE
    V4L2_CID_CODEC_BASE + 357, // ENTROPY_MODE
    V4L2_CID_CODEC_BASE + 358, // I_PERIOD
    V4L2_CID_CODEC_BASE + 359, // LEVEL
    V4L2_CID_CODEC_BASE + 360, // LOOP_FILTER_ALPHA
    V4L2_CID_CODEC_BASE + 361, // LOOP_FILTER_BETA
    V4L2_CID_CODEC_BASE + 362, // LOOP_FILTER_MODE
    V4L2_CID_CODEC_BASE + 363, // PROFILE
    V4L2_CID_CODEC_BASE + 364, // VUI_EXT_SAR_HEIGHT
    V4L2_CID_CODEC_BASE + 365, // VUI_EXT_SAR_WIDTH
    V4L2_CID_CODEC_BASE + 366, // VUI_SAR_ENABLE
    V4L2_CID_CODEC_BASE + 367, // VUI_SAR_IDC
    V4L2_CID_CODEC_BASE + 368, // SEI_FRAME_PACKING
    V4L2_CID_CODEC_BASE + 369, // SEI_FP_CURRENT_FRAME_0
    V4L2_CID_CODEC_BASE + 370, // SEI_FP_ARRANGEMENT_TYPE
    V4L2_CID_CODEC_BASE + 371, // FMO
    V4L2_CID_CODEC_BASE + 372, // FMO_MAP_TYPE
    V4L2_CID_CODEC_BASE + 373, // FMO_SLICE_GROUP
    V4L2_CID_CODEC_BASE + 374, // FMO_CHANGE_DIRECTION
    V4L2_CID_CODEC_BASE + 375, // FMO_CHANGE_RATE
    V4L2_CID_CODEC_BASE + 376, // FMO_RUN_LENGTH
    V4L2_CID_CODEC_BASE + 377, // ASO
    V4L2_CID_CODEC_BASE + 378, // ASO_SLICE_ORDER
    V4L2_CID_CODEC_BASE + 379, // HIERARCHICAL_CODING
    V4L2_CID_CODEC_BASE + 380, // HIERARCHICAL_CODING_TYPE
    V4L2_CID_CODEC_BASE + 381, // HIERARCHICAL_CODING_LAYER
    V4L2_CID_CODEC_BASE + 382, // HIERARCHICAL_CODING_LAYER_QP
];

/// Controls that only mean something while the device emits MPEG-4.
pub const MPEG4_ONLY_CONTROLS: &[u32] = &[
    V4L2_CID_CODEC_BASE + 400, // I_FRAME_QP
    V4L2_CID_CODEC_BASE + 401, // P_FRAME_QP
    V4L2_CID_CODEC_BASE + 402, // B_FRAME_QP
    V4L2_CID_CODEC_BASE + 405, // LEVEL
    V4L2_CID_CODEC_BASE + 406, // PROFILE
    V4L2_CID_CODEC_BASE + 407, // QPEL
];

/// H.264 encoder I-frame period, handy as a known H.264-only id.
pub const V4L2_CID_MPEG_VIDEO_H264_I_PERIOD: u32 = V4L2_CID_CODEC_BASE + 358;
/// MPEG-4 encoder profile, handy as a known MPEG-4-only id.
pub const V4L2_CID_MPEG_VIDEO_MPEG4_PROFILE: u32 = V4L2_CID_CODEC_BASE + 406;
/// Brightness (user class), relevant under every format.
pub const V4L2_CID_BRIGHTNESS: u32 = 0x0098_0900;

// ---------------------------------------------------------------------------
// Stream parameter defaults
// ---------------------------------------------------------------------------

/// Reserved id of the synthesized frame-rate entry. No real control uses 0.
pub const FPS_ENTRY_ID: u32 = 0;
/// Numerator used when requesting a frame interval of `numerator / (fps * numerator)`.
pub const FRAME_INTERVAL_NUMERATOR: u32 = 1000;
/// Default value of the frame-rate entry.
pub const FPS_DEFAULT: i32 = 30;
/// Highest accepted frame-rate ceiling.
pub const FPS_CEILING_MAX: i32 = 120;
