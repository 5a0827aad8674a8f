//! Common utilities and helpers

pub mod logging;

use std::time::Duration;

/// Display helpers
pub struct Utils;

impl Utils {
    /// Format duration for display
    pub fn format_duration(duration: Duration) -> String {
        let total_seconds = duration.as_secs();
        let hours = total_seconds / 3600;
        let minutes = (total_seconds % 3600) / 60;
        let seconds = total_seconds % 60;
        let milliseconds = duration.subsec_millis();

        if hours > 0 {
            format!("{:02}:{:02}:{:02}.{:03}", hours, minutes, seconds, milliseconds)
        } else {
            format!("{:02}:{:02}.{:03}", minutes, seconds, milliseconds)
        }
    }

    /// Format file size for display
    pub fn format_file_size(size: u64) -> String {
        const UNITS: &[&str] = &["B", "KB", "MB", "GB", "TB"];
        let mut size = size as f64;
        let mut unit_index = 0;

        while size >= 1024.0 && unit_index < UNITS.len() - 1 {
            size /= 1024.0;
            unit_index += 1;
        }

        if unit_index == 0 {
            format!("{} {}", size as u64, UNITS[unit_index])
        } else {
            format!("{:.2} {}", size, UNITS[unit_index])
        }
    }

    /// Format a bitrate in bits per second
    pub fn format_bitrate(bps: u64) -> String {
        if bps >= 1_000_000 {
            format!("{:.2} Mbps", bps as f64 / 1_000_000.0)
        } else if bps >= 1_000 {
            format!("{:.0} kbps", bps as f64 / 1_000.0)
        } else {
            format!("{} bps", bps)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_duration() {
        assert_eq!(Utils::format_duration(Duration::from_millis(61_250)), "01:01.250");
        assert_eq!(Utils::format_duration(Duration::from_secs(3_725)), "01:02:05.000");
    }

    #[test]
    fn test_format_file_size() {
        assert_eq!(Utils::format_file_size(512), "512 B");
        assert_eq!(Utils::format_file_size(1536), "1.50 KB");
    }

    #[test]
    fn test_format_bitrate() {
        assert_eq!(Utils::format_bitrate(2_500_000), "2.50 Mbps");
        assert_eq!(Utils::format_bitrate(128_000), "128 kbps");
        assert_eq!(Utils::format_bitrate(900), "900 bps");
    }
}
