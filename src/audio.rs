//! Helpers for synthesized audio payloads: duration estimate, content types and filenames

use crate::constants::{DEFAULT_CONTENT_TYPE, DEFAULT_FORMAT};

/// Bitrate assumed when the output format string carries none
pub const FALLBACK_BITRATE_KBPS: u32 = 128;

/// Parse the bitrate out of a provider output format such as `mp3_44100_128`
///
/// The last underscore separated component is the bitrate in kbps.
pub fn bitrate_kbps(output_format: &str) -> u32 {
    output_format
        .rsplit('_')
        .next()
        .and_then(|s| s.parse::<u32>().ok())
        .filter(|&kbps| kbps > 0)
        .unwrap_or(FALLBACK_BITRATE_KBPS)
}

/// Container name for an output format (`mp3_44100_128` -> `mp3`)
pub fn container_format(output_format: &str) -> &str {
    match output_format.split('_').next() {
        Some(f) if !f.is_empty() => f,
        _ => DEFAULT_FORMAT,
    }
}

/// Estimate playback length from the payload size, assuming constant bitrate
///
/// Rounded to two decimals. Approximate: VBR or padded payloads will drift.
pub fn estimate_duration_seconds(byte_len: usize, output_format: &str) -> f64 {
    let bits_per_second = bitrate_kbps(output_format) as f64 * 1000.0;
    let seconds = (byte_len as f64 * 8.0) / bits_per_second;
    (seconds * 100.0).round() / 100.0
}

/// MIME type for a stored container format
pub fn content_type_for_format(format: &str) -> &'static str {
    match format {
        "mp3" => "audio/mpeg",
        "wav" => "audio/wav",
        "ogg" | "opus" => "audio/ogg",
        "pcm" => "audio/L16",
        "ulaw" => "audio/basic",
        _ => DEFAULT_CONTENT_TYPE,
    }
}

/// Attachment filename for a replayed generation
pub fn download_filename(id: i64, format: &str) -> String {
    format!("generation-{}.{}", id, format)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bitrate_parsing() {
        assert_eq!(bitrate_kbps("mp3_44100_128"), 128);
        assert_eq!(bitrate_kbps("mp3_22050_32"), 32);
        assert_eq!(bitrate_kbps("pcm"), FALLBACK_BITRATE_KBPS);
        assert_eq!(bitrate_kbps("mp3_44100_0"), FALLBACK_BITRATE_KBPS);
        assert_eq!(bitrate_kbps(""), FALLBACK_BITRATE_KBPS);
    }

    #[test]
    fn test_duration_estimate() {
        // 16000 bytes at 128kbps = 1 second
        assert_eq!(estimate_duration_seconds(16_000, "mp3_44100_128"), 1.0);
        assert_eq!(estimate_duration_seconds(0, "mp3_44100_128"), 0.0);
        // 10000 bytes at 128kbps = 0.625 -> 0.63
        assert_eq!(estimate_duration_seconds(10_000, "mp3_44100_128"), 0.63);
        assert_eq!(estimate_duration_seconds(4_000, "mp3_22050_32"), 1.0);
    }

    #[test]
    fn test_container_and_content_type() {
        assert_eq!(container_format("mp3_44100_128"), "mp3");
        assert_eq!(container_format(""), "mp3");
        assert_eq!(content_type_for_format("mp3"), "audio/mpeg");
        assert_eq!(content_type_for_format("unknown"), "audio/mpeg");
        assert_eq!(download_filename(7, "mp3"), "generation-7.mp3");
    }
}
