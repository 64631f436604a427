//! Control label normalization.

/// Turn a device label such as `"Gain, Auto"` into a variable name (`"gain_auto"`).
///
/// Only ASCII alphanumerics survive, lower-cased. Each run of other
/// characters between two alphanumerics becomes one `_`; runs at either end
/// are dropped. Normalizing an already normalized name returns it unchanged.
pub fn normalize(label: &str) -> String {
    let mut out = String::with_capacity(label.len());
    let mut pending_separator = false;

    for c in label.chars() {
        if c.is_ascii_alphanumeric() {
            if pending_separator && !out.is_empty() {
                out.push('_');
            }
            pending_separator = false;
            out.push(c.to_ascii_lowercase());
        } else {
            pending_separator = true;
        }
    }

    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn collapses_separators() {
        assert_eq!(normalize("Gain, Auto"), "gain_auto");
        assert_eq!(normalize("White Balance Temperature"), "white_balance_temperature");
        assert_eq!(normalize("Exposure Time, Absolute"), "exposure_time_absolute");
        assert_eq!(normalize("H264 I-Frame Period"), "h264_i_frame_period");
    }

    #[test]
    fn drops_leading_and_trailing_runs() {
        assert_eq!(normalize("  (Power) Line Frequency!! "), "power_line_frequency");
        assert_eq!(normalize("---"), "");
        assert_eq!(normalize(""), "");
    }

    #[test]
    fn non_ascii_counts_as_separator() {
        assert_eq!(normalize("Zoom\u{00b5}Level"), "zoom_level");
    }

    #[test]
    fn idempotent() {
        for label in ["Gain, Auto", "---", "a__b", "_x_", "Video Bitrate Mode", "ISO Sensitivity, Auto"] {
            let once = normalize(label);
            assert_eq!(normalize(&once), once, "label {:?}", label);
        }
    }
}
