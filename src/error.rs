//! Typed failures raised by the table model, the link controller and the renderer.
//!
//! Everything is returned as a `color_eyre::Report`; callers that need to react to a
//! specific case downcast to [`DoubleChartError`].

use thiserror::Error;

use crate::controller::Axis;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum DoubleChartError {
    /// A required construction option was not supplied.
    #[error("{0} must be set in the chart options")]
    MissingOption(&'static str),

    /// An element id named in the options is not present in the document.
    #[error("no element with id '{0}' in the document")]
    ElementNotFound(String),

    /// The opposite-axis keys and the selected row/column disagree in length.
    #[error("key count {keys} != value count {values}")]
    LengthMismatch { keys: usize, values: usize },

    /// A click was dispatched for a header that has no link.
    #[error("no {axis} header at index {index}")]
    UnknownHeader { axis: Axis, index: usize },

    /// A chart dimension is not a pixel length.
    #[error("invalid chart dimension '{0}'. Expected a pixel length such as 400px")]
    InvalidDimension(String),

    /// A background colour is not a `#rrggbb` hex colour.
    #[error("invalid colour '{0}'. Expected a hex colour such as #ffffff")]
    InvalidColor(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn length_mismatch_names_both_lengths() {
        let msg = DoubleChartError::LengthMismatch { keys: 3, values: 2 }.to_string();
        assert!(msg.contains('3'), "{msg}");
        assert!(msg.contains('2'), "{msg}");
    }

    #[test]
    fn missing_option_names_key() {
        let msg = DoubleChartError::MissingOption("tableId").to_string();
        assert_eq!(msg, "tableId must be set in the chart options");
    }
}
