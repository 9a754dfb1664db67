//! Human-readable sizes and file names for terminal output

/// Format a byte count with binary (1024) steps.
pub fn format_bytes(bytes: u64) -> String {
    const KB: u64 = 1024;
    const MB: u64 = KB * 1024;
    const GB: u64 = MB * 1024;
    const TB: u64 = GB * 1024;
    if bytes >= TB {
        format!("{:.1} TB", bytes as f64 / TB as f64)
    } else if bytes >= GB {
        format!("{:.1} GB", bytes as f64 / GB as f64)
    } else if bytes >= MB {
        format!("{:.1} MB", bytes as f64 / MB as f64)
    } else if bytes >= KB {
        format!("{:.1} KB", bytes as f64 / KB as f64)
    } else {
        format!("{} B", bytes)
    }
}

/// A byte count that displays through [`format_bytes`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct ByteSize(pub u64);

impl std::fmt::Display for ByteSize {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&format_bytes(self.0))
    }
}

/// Shorten `name` to roughly `max_len` characters, keeping the extension.
///
/// `a-very-long-report-name.pdf` with `max_len = 12` → `a-very-l....pdf`
pub fn shorten_file_name(name: &str, max_len: usize) -> String {
    if name.chars().count() <= max_len {
        return name.to_string();
    }
    let (stem, ext) = match name.rfind('.') {
        Some(pos) if pos > 0 => name.split_at(pos),
        _ => (name, ""),
    };
    let kept: String = stem.chars().take(max_len.saturating_sub(4)).collect();
    format!("{kept}...{ext}")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_bytes_units() {
        assert_eq!(format_bytes(0), "0 B");
        assert_eq!(format_bytes(1023), "1023 B");
        assert_eq!(format_bytes(1024), "1.0 KB");
        assert_eq!(format_bytes(1536), "1.5 KB");
        assert_eq!(format_bytes(10 * 1024 * 1024), "10.0 MB");
        assert_eq!(format_bytes(3 * 1024 * 1024 * 1024), "3.0 GB");
        assert_eq!(format_bytes(2 * 1024 * 1024 * 1024 * 1024), "2.0 TB");
    }

    #[test]
    fn test_byte_size_display() {
        assert_eq!(ByteSize(10_485_760).to_string(), "10.0 MB");
    }

    #[test]
    fn test_shorten_keeps_short_names() {
        assert_eq!(shorten_file_name("report.pdf", 20), "report.pdf");
    }

    #[test]
    fn test_shorten_keeps_extension() {
        assert_eq!(shorten_file_name("a-very-long-report-name.pdf", 12), "a-very-l....pdf");
    }

    #[test]
    fn test_shorten_without_extension() {
        assert_eq!(shorten_file_name("abcdefghijklmnop", 8), "abcd...");
        assert_eq!(shorten_file_name(".bashrc-extended-name", 8), ".bas...");
    }

    #[test]
    fn test_shorten_multibyte() {
        assert_eq!(shorten_file_name("日本語のファイル名です.txt", 8), "日本語の....txt");
    }
}
