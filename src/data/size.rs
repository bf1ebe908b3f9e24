/// Binary unit suffixes below TB, each step a factor of 1024.
const UNITS: &[&str] = &["KB", "MB", "GB"];

/// Format a byte count for display: "1023 B", "1.00 KB", "1.50 MB".
///
/// Anything at or above 1024 GB is reported in TB.
pub fn human_size(bytes: u64) -> String {
    if bytes < 1024 {
        return format!("{} B", bytes);
    }

    let mut size = bytes as f64 / 1024.0;
    for unit in UNITS {
        if size < 1024.0 {
            return format!("{:.2} {}", size, unit);
        }
        size /= 1024.0;
    }
    format!("{:.2} TB", size)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bytes() {
        assert_eq!(human_size(0), "0 B");
        assert_eq!(human_size(1023), "1023 B");
    }

    #[test]
    fn test_unit_boundaries() {
        assert_eq!(human_size(1024), "1.00 KB");
        assert_eq!(human_size(1536), "1.50 KB");
        assert_eq!(human_size(1_048_575), "1024.00 KB");
        assert_eq!(human_size(1_048_576), "1.00 MB");
        assert_eq!(human_size(1 << 30), "1.00 GB");
        assert_eq!(human_size(1 << 40), "1.00 TB");
    }

    #[test]
    fn test_large_values_stay_in_terabytes() {
        assert_eq!(human_size(1 << 50), "1024.00 TB");
    }
}
