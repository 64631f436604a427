//! Codec-dependent control filtering.
//!
//! Encoder devices expose H.264 and MPEG-4 tuning controls regardless of the
//! format currently negotiated. Under strict filtering those controls are only
//! offered while the matching codec is selected.

use crate::port::FourCc;
use crate::protocol::{H264_ONLY_CONTROLS, MPEG4_ONLY_CONTROLS};

/// Decides whether a control is relevant for the negotiated pixel format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct CodecFilterPolicy {
    strict: bool,
}

impl CodecFilterPolicy {
    pub fn new(strict: bool) -> Self {
        Self { strict }
    }

    pub fn is_strict(&self) -> bool {
        self.strict
    }

    /// Relevance under this policy; with strict filtering off every control passes.
    pub fn allows(&self, control_id: u32, format: FourCc) -> bool {
        !self.strict || is_relevant(control_id, format)
    }
}

/// Whether `control_id` means anything while the device emits `format`.
pub fn is_relevant(control_id: u32, format: FourCc) -> bool {
    if H264_ONLY_CONTROLS.contains(&control_id) && !format.is_h264() {
        return false;
    }
    if MPEG4_ONLY_CONTROLS.contains(&control_id) && !format.is_mpeg4() {
        return false;
    }
    true
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::protocol::*;

    const H264: FourCc = FourCc(V4L2_PIX_FMT_H264);
    const MPEG4: FourCc = FourCc(V4L2_PIX_FMT_MPEG4);
    const MJPEG: FourCc = FourCc(V4L2_PIX_FMT_MJPEG);

    #[test]
    fn h264_control_follows_h264_family() {
        let id = V4L2_CID_MPEG_VIDEO_H264_I_PERIOD;
        assert!(!is_relevant(id, MPEG4));
        assert!(!is_relevant(id, MJPEG));
        assert!(is_relevant(id, H264));
        assert!(is_relevant(id, FourCc(V4L2_PIX_FMT_H264_NO_SC)));
        assert!(is_relevant(id, FourCc(V4L2_PIX_FMT_H264_MVC)));
    }

    #[test]
    fn mpeg4_control_follows_mpeg4() {
        let id = V4L2_CID_MPEG_VIDEO_MPEG4_PROFILE;
        assert!(is_relevant(id, MPEG4));
        assert!(!is_relevant(id, H264));
        assert!(!is_relevant(id, FourCc(V4L2_PIX_FMT_YUYV)));
    }

    #[test]
    fn generic_control_always_relevant() {
        for format in [H264, MPEG4, MJPEG] {
            assert!(is_relevant(V4L2_CID_BRIGHTNESS, format));
        }
    }

    #[test]
    fn lenient_policy_passes_everything() {
        let lenient = CodecFilterPolicy::new(false);
        assert!(lenient.allows(V4L2_CID_MPEG_VIDEO_H264_I_PERIOD, MPEG4));

        let strict = CodecFilterPolicy::new(true);
        assert!(!strict.allows(V4L2_CID_MPEG_VIDEO_H264_I_PERIOD, MPEG4));
        assert!(strict.allows(V4L2_CID_BRIGHTNESS, MPEG4));
    }
}
