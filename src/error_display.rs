//! User-facing error message formatting.
//!
//! Matches on typed errors (DoubleChartError variants, io::ErrorKind) rather than parsing
//! strings.

use std::io;
use std::path::Path;

use crate::error::DoubleChartError;

/// Format a DoubleChartError as a user-facing message by matching on its variant.
pub fn user_message_from_chart(err: &DoubleChartError) -> String {
    match err {
        DoubleChartError::MissingOption(key) => {
            let flag = match *key {
                "rowPaneId" => "--row-pane-id",
                "colPaneId" => "--col-pane-id",
                "tableId" => "--table-id",
                _ => return err.to_string(),
            };
            format!("{} is required. Pass it with {}.", key, flag)
        }
        DoubleChartError::ElementNotFound(id) => format!(
            "No element with id '{}' in the page. Check the id passed on the command line.",
            id
        ),
        DoubleChartError::LengthMismatch { keys, values } => format!(
            "The table is not rectangular: {} keys but {} values in the selected row or column.",
            keys, values
        ),
        DoubleChartError::UnknownHeader { axis, index } => {
            format!("The table has no {} header at index {}.", axis, index)
        }
        DoubleChartError::InvalidDimension(_) | DoubleChartError::InvalidColor(_) => {
            err.to_string()
        }
    }
}

/// Format an io::Error as a user-facing message by matching on ErrorKind.
pub fn user_message_from_io(err: &io::Error) -> String {
    use std::io::ErrorKind;

    match err.kind() {
        ErrorKind::NotFound => "File or directory not found.".to_string(),
        ErrorKind::PermissionDenied => "Permission denied. Check file access.".to_string(),
        ErrorKind::InvalidData | ErrorKind::InvalidInput => {
            "Invalid or corrupted data.".to_string()
        }
        ErrorKind::UnexpectedEof => "Unexpected end of file.".to_string(),
        ErrorKind::OutOfMemory => "Out of memory.".to_string(),
        ErrorKind::Other => {
            let msg = err.to_string();
            if msg.contains("No space left") {
                return "No space left on device. Free up disk space and try again.".to_string();
            }
            if msg.contains("Is a directory") {
                return "Path is a directory, not a file.".to_string();
            }
            msg
        }
        _ => err.to_string(),
    }
}

/// Format a color_eyre Report by downcasting to known error types.
/// Walks the cause chain to find DoubleChartError or io::Error.
pub fn user_message_from_report(report: &color_eyre::eyre::Report, path: Option<&Path>) -> String {
    let with_path = |msg: String| match path {
        Some(p) => format!("Failed to process {}: {}", p.display(), msg),
        None => msg,
    };

    for cause in report.chain() {
        if let Some(err) = cause.downcast_ref::<DoubleChartError>() {
            return with_path(user_message_from_chart(err));
        }
        if let Some(io_err) = cause.downcast_ref::<io::Error>() {
            return with_path(user_message_from_io(io_err));
        }
    }

    // Fallback: use first line of display to avoid long tracebacks
    let display = report.to_string();
    let first_line = display.lines().next().unwrap_or("An error occurred");
    with_path(first_line.trim().to_string())
}
