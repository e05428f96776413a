use crossterm::style::{Color, Stylize};

use crate::providers::FileRef;
use crate::search::AggregateResult;
use crate::utils::{file_extension, format_date, format_file_size};

/// Print a success message in green to stdout.
pub fn success(msg: &str) {
    println!("{}", msg.with(Color::Green));
}

/// Print an error message in red to stderr.
pub fn error(msg: &str) {
    eprintln!("{}", msg.with(Color::Red));
}

/// Print a warning message in yellow to stderr.
pub fn warning(msg: &str) {
    eprintln!("{}", msg.with(Color::Yellow));
}

/// Print an info message in cyan to stdout.
pub fn info(msg: &str) {
    println!("{}", msg.with(Color::Cyan));
}

/// One listing line: provider tag, name, extension, then size and date
/// when the provider reported them.
pub fn file_line(file: &FileRef) -> String {
    let mut line = format!("[{}] {} ({})", file.provider, file.name, file_extension(&file.name));
    if let Some(size) = file.size {
        line.push_str(&format!(" {}", format_file_size(size)));
    }
    if let Some(modified) = &file.modified {
        line.push_str(&format!(" {}", format_date(modified)));
    }
    line
}

/// How a report line is printed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LineKind {
    File,
    Ok,
    Failed,
    Total,
}

/// Lines for a search result: one per file, one per provider with its
/// count or error, then the total.
pub fn report_lines(result: &AggregateResult) -> Vec<(LineKind, String)> {
    let mut lines: Vec<(LineKind, String)> = result
        .files()
        .iter()
        .map(|f| (LineKind::File, file_line(f)))
        .collect();
    for r in result.results() {
        match r.error() {
            Some(err) => lines.push((LineKind::Failed, format!("{}: {}", r.provider(), err))),
            None => lines.push((
                LineKind::Ok,
                format!("{}: {} file(s)", r.provider(), r.files().len()),
            )),
        }
    }
    lines.push((LineKind::Total, format!("{} file(s) total", result.total())));
    lines
}

/// Print a search result with per-provider status coloring.
pub fn render_report(result: &AggregateResult) {
    for (kind, line) in report_lines(result) {
        match kind {
            LineKind::File => println!("  {}", line),
            LineKind::Ok => success(&line),
            LineKind::Failed => warning(&line),
            LineKind::Total => info(&line),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::providers::{FileRef, ProviderId};
    use crate::search::{FailureKind, SearchFailure, SearchResult};

    fn sample() -> AggregateResult {
        let mut file = FileRef::new("1", "Budget.XLSX", "one-drive");
        file.size = Some(2048);
        file.modified = Some("2025-01-02T03:04:05Z".into());
        AggregateResult::new(vec![
            SearchResult::succeeded(ProviderId::new("one-drive"), vec![file]),
            SearchResult::failed(
                ProviderId::new("google-drive"),
                SearchFailure::new(FailureKind::NotConnected, "Google Drive not connected."),
            ),
        ])
    }

    #[test]
    fn test_report_lines() {
        let lines = report_lines(&sample());
        let expected = vec![
            (LineKind::File, "[one-drive] Budget.XLSX (xlsx) 2.0 KB 2025-01-02"),
            (LineKind::Ok, "one-drive: 1 file(s)"),
            (LineKind::Failed, "google-drive: Google Drive not connected."),
            (LineKind::Total, "1 file(s) total"),
        ];
        let actual: Vec<(LineKind, &str)> =
            lines.iter().map(|(k, l)| (*k, l.as_str())).collect();
        assert_eq!(actual, expected);
    }

    #[test]
    fn test_render_report_does_not_panic() {
        render_report(&sample());
    }

    #[test]
    fn test_messages_do_not_panic() {
        success("Operation completed");
        error("Something went wrong");
        warning("Careful now");
        info("FYI");
    }
}
