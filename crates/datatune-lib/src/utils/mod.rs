//! Display helpers for file listings.

use chrono::{DateTime, NaiveDate, NaiveDateTime};

const SIZE_UNITS: [&str; 5] = ["B", "KB", "MB", "GB", "TB"];

/// Lowercased extension of `filename`, or `"unknown"` when it has none.
pub fn file_extension(filename: &str) -> String {
    match filename.rsplit_once('.') {
        Some((_, ext)) => ext.to_lowercase(),
        None => "unknown".to_string(),
    }
}

/// Human readable size with one decimal, e.g. `1.5 KB`.
pub fn format_file_size(bytes: u64) -> String {
    if bytes == 0 {
        return "0 B".to_string();
    }
    let mut size = bytes as f64;
    let mut unit = 0;
    while size >= 1024.0 && unit < SIZE_UNITS.len() - 1 {
        size /= 1024.0;
        unit += 1;
    }
    format!("{:.1} {}", size, SIZE_UNITS[unit])
}

/// Reduce a timestamp or date to `YYYY-MM-DD`.
///
/// Accepts RFC 3339 (including a `Z` suffix), a naive `YYYY-MM-DDTHH:MM:SS`
/// timestamp, or a plain date. Empty input gives `"Unknown"`; anything
/// unparsable is returned unchanged.
pub fn format_date(input: &str) -> String {
    if input.is_empty() {
        return "Unknown".to_string();
    }

    let date = if input.contains('T') {
        DateTime::parse_from_rfc3339(input)
            .map(|dt| dt.date_naive())
            .or_else(|_| NaiveDateTime::parse_from_str(input, "%Y-%m-%dT%H:%M:%S%.f").map(|dt| dt.date()))
            .ok()
    } else {
        NaiveDate::parse_from_str(input, "%Y-%m-%d").ok()
    };

    match date {
        Some(d) => d.format("%Y-%m-%d").to_string(),
        None => input.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_file_extension() {
        assert_eq!(file_extension("Report Q3.PDF"), "pdf");
        assert_eq!(file_extension("archive.tar.gz"), "gz");
        assert_eq!(file_extension("README"), "unknown");
    }

    #[test]
    fn test_format_file_size() {
        assert_eq!(format_file_size(0), "0 B");
        assert_eq!(format_file_size(512), "512.0 B");
        assert_eq!(format_file_size(1536), "1.5 KB");
        assert_eq!(format_file_size(5 * 1024 * 1024), "5.0 MB");
        assert_eq!(format_file_size(1024u64.pow(5) * 3), "3072.0 TB");
    }

    #[test]
    fn test_format_date() {
        assert_eq!(format_date("2025-03-14T09:26:53Z"), "2025-03-14");
        assert_eq!(format_date("2025-03-14T09:26:53.120+02:00"), "2025-03-14");
        assert_eq!(format_date("2025-03-14T09:26:53"), "2025-03-14");
        assert_eq!(format_date("2025-03-14"), "2025-03-14");
        assert_eq!(format_date(""), "Unknown");
        assert_eq!(format_date("last tuesday"), "last tuesday");
    }
}
