//! The chart request that travels from the pivot table to a chart pane inside a URL fragment.
//!
//! Wire format: `#<link token>&rows=<json>&xaxis=<text>&yaxis=<text>&title=<text>`, every
//! value percent-encoded. `rows` is JSON; the titles are plain text. The pane side may also
//! receive `bgcolor`. Decoding never fails: a value that is not JSON is taken as plain text,
//! and absent keys resolve through the defaults below.

use serde_json::{json, Value};
use std::collections::HashMap;
use percent_encoding::{percent_decode_str, utf8_percent_encode, AsciiSet, NON_ALPHANUMERIC};

pub const ROWS: &str = "rows";
pub const X_AXIS_TITLE: &str = "xaxis";
pub const Y_AXIS_TITLE: &str = "yaxis";
pub const TITLE: &str = "title";
pub const BACKGROUND_COLOR: &str = "bgcolor";

pub const DEFAULT_TITLE: &str = "Title";
pub const DEFAULT_X_AXIS_TITLE: &str = "Time";
pub const DEFAULT_Y_AXIS_TITLE: &str = "Value";
pub const DEFAULT_BACKGROUND_COLOR: &str = "#ffffff";

/// Y values of the built-in sample series; x is the index.
const SAMPLE_SERIES: [u32; 70] = [
    0, 10, 23, 17, 18, 9, 11, 27, 33, 40, 32, 35, 30, 40, 42, 47, 44, 48, 52, 54, 42, 55, 56, 57,
    60, 50, 52, 51, 49, 53, 55, 60, 61, 59, 62, 65, 62, 58, 55, 61, 64, 65, 63, 66, 67, 69, 69, 70,
    72, 68, 66, 65, 67, 70, 71, 72, 73, 75, 70, 68, 64, 60, 65, 67, 68, 69, 70, 72, 75, 80,
];

/// The series a pane draws when it is given no rows: `[[0, 0], [1, 10], ..., [69, 80]]`.
pub fn sample_rows() -> Vec<(Value, Value)> {
    SAMPLE_SERIES
        .iter()
        .enumerate()
        .map(|(x, &y)| (json!(x), json!(y)))
        .collect()
}

/// One chart request: the (key, value) pairs of the selected row or column plus titles.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct SelectionRequest {
    pub rows: Vec<(String, String)>,
    pub x_axis_title: String,
    pub y_axis_title: String,
    pub title: String,
}

impl SelectionRequest {
    /// Resolve a decoded fragment into a request. Missing rows fall back to the sample series.
    pub fn from_params(params: &FragmentParams) -> Self {
        let rows = params
            .rows(ROWS)
            .unwrap_or_else(sample_rows)
            .into_iter()
            .map(|(k, v)| (value_text(&k), value_text(&v)))
            .collect();
        Self {
            rows,
            x_axis_title: params.string_or(X_AXIS_TITLE, DEFAULT_X_AXIS_TITLE),
            y_axis_title: params.string_or(Y_AXIS_TITLE, DEFAULT_Y_AXIS_TITLE),
            title: params.string_or(TITLE, DEFAULT_TITLE),
        }
    }
}

/// Bytes left as-is in a fragment value. `+` is encoded so it never reads as a space.
const FRAGMENT_VALUE: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'_')
    .remove(b'.')
    .remove(b'*')
    .remove(b'@')
    .remove(b'/');

/// Percent-encode one value.
pub fn escape(value: &str) -> String {
    utf8_percent_encode(value, FRAGMENT_VALUE).to_string()
}

fn unescape(value: &str) -> String {
    percent_decode_str(value).decode_utf8_lossy().into_owned()
}

/// Plain text travels as-is unless it would read back as JSON, in which case it is sent as
/// a JSON string literal so the decoder returns the same text.
fn encode_text(value: &str) -> String {
    if serde_json::from_str::<Value>(value).is_ok() {
        Value::String(value.to_string()).to_string()
    } else {
        value.to_string()
    }
}

fn param(key: &str, text: &str) -> String {
    format!("{key}={}", escape(text))
}

/// Encode a request as `rows=...&xaxis=...&yaxis=...&title=...`.
pub fn encode(request: &SelectionRequest) -> String {
    let rows = Value::Array(
        request
            .rows
            .iter()
            .map(|(k, v)| json!([k, v]))
            .collect(),
    );
    [
        param(ROWS, &rows.to_string()),
        param(X_AXIS_TITLE, &encode_text(&request.x_axis_title)),
        param(Y_AXIS_TITLE, &encode_text(&request.y_axis_title)),
        param(TITLE, &encode_text(&request.title)),
    ]
    .join("&")
}

/// Opaque link address for a header: the keys then the values, each joined by `_`.
pub fn link_token(keys: &[String], values: &[String]) -> String {
    escape(&format!("{}{}", keys.join("_"), values.join("_")))
}

/// Address of a chart pane document carrying `request` in its fragment.
pub fn frame_url(base: &str, token: &str, request: &SelectionRequest) -> String {
    format!("{base}#{token}&{}", encode(request))
}

/// The fragment part of `src` (after `#`), or `""`.
pub fn fragment_of(src: &str) -> &str {
    src.split_once('#').map_or("", |(_, fragment)| fragment)
}

#[derive(Debug, Clone, PartialEq)]
struct Param {
    raw: String,
    value: Value,
}

/// Decoded fragment: key → value, JSON where the value parsed as JSON.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FragmentParams {
    params: HashMap<String, Param>,
}

impl FragmentParams {
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.params.get(key).map(|p| &p.value)
    }

    pub fn contains(&self, key: &str) -> bool {
        self.params.contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.params.len()
    }

    pub fn is_empty(&self) -> bool {
        self.params.is_empty()
    }

    /// Text of `key`, or `default` when absent. JSON strings yield their content; any other
    /// value yields the text that was sent.
    pub fn string_or(&self, key: &str, default: &str) -> String {
        match self.params.get(key) {
            Some(Param {
                value: Value::String(s),
                ..
            }) => s.clone(),
            Some(p) => p.raw.clone(),
            None => default.to_string(),
        }
    }

    /// `key` as a list of pairs. `None` when absent or not a JSON array.
    pub fn rows(&self, key: &str) -> Option<Vec<(Value, Value)>> {
        let Value::Array(items) = self.get(key)? else {
            return None;
        };
        Some(
            items
                .iter()
                .map(|item| match item {
                    Value::Array(pair) => (
                        pair.first().cloned().unwrap_or(Value::Null),
                        pair.get(1).cloned().unwrap_or(Value::Null),
                    ),
                    other => (other.clone(), Value::Null),
                })
                .collect(),
        )
    }

    /// `key` as a list of pairs, or `default` when absent, malformed or empty.
    pub fn rows_or(&self, key: &str, default: Vec<(Value, Value)>) -> Vec<(Value, Value)> {
        match self.rows(key) {
            Some(rows) if !rows.is_empty() => rows,
            _ => default,
        }
    }
}

/// Decode a fragment (with or without the leading `#`).
pub fn decode(fragment: &str) -> FragmentParams {
    let body = fragment.strip_prefix('#').unwrap_or(fragment);
    let mut params = HashMap::new();
    for segment in body.split('&') {
        // The link token carries no `=`.
        let Some((key, raw)) = segment.split_once('=') else {
            continue;
        };
        let (key, raw) = (unescape(key), unescape(raw));
        let value = match serde_json::from_str::<Value>(&raw) {
            Ok(value) => value,
            Err(_) => {
                tracing::trace!(key = %key, "fragment value is not JSON, keeping text");
                Value::String(raw.clone())
            }
        };
        params.insert(key, Param { raw, value });
    }
    FragmentParams { params }
}

/// Display text of a decoded JSON value.
pub fn value_text(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Null => String::new(),
        other => other.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request() -> SelectionRequest {
        SelectionRequest {
            rows: vec![
                ("Sales".to_string(), "100".to_string()),
                ("Costs & fees".to_string(), "40".to_string()),
            ],
            x_axis_title: "Column".to_string(),
            y_axis_title: "Row".to_string(),
            title: "Row = Jan".to_string(),
        }
    }

    #[test]
    fn encode_names_fields_in_order() {
        let encoded = encode(&request());
        let keys: Vec<&str> = encoded
            .split('&')
            .map(|s| s.split_once('=').map(|(k, _)| k).unwrap_or(s))
            .collect();
        assert_eq!(keys, vec!["rows", "xaxis", "yaxis", "title"]);
        assert!(!encoded.contains(' '));
    }

    #[test]
    fn round_trip_preserves_request() {
        let req = request();
        let decoded = SelectionRequest::from_params(&decode(&encode(&req)));
        assert_eq!(decoded, req);
    }

    #[test]
    fn round_trip_titles_that_look_like_json() {
        let req = SelectionRequest {
            rows: vec![("1".to_string(), "2".to_string())],
            x_axis_title: "123".to_string(),
            y_axis_title: "\"quoted\"".to_string(),
            title: "null".to_string(),
        };
        let decoded = SelectionRequest::from_params(&decode(&encode(&req)));
        assert_eq!(decoded, req);
    }

    #[test]
    fn round_trip_empty_and_unicode() {
        let req = SelectionRequest {
            rows: vec![("Zürich".to_string(), "".to_string())],
            x_axis_title: String::new(),
            y_axis_title: "a=b&c".to_string(),
            title: "50% + #1".to_string(),
        };
        let decoded = SelectionRequest::from_params(&decode(&encode(&req)));
        assert_eq!(decoded, req);
    }

    #[test]
    fn link_token_is_ignored_by_decoder() {
        let req = request();
        let token = link_token(
            &["Sales".to_string(), "Costs".to_string()],
            &["100".to_string(), "40".to_string()],
        );
        assert_eq!(token, "Sales_Costs100_40");
        let url = frame_url("iframe.html", &token, &req);
        assert!(url.starts_with("iframe.html#Sales_Costs100_40&rows="));
        let params = decode(fragment_of(&url));
        assert_eq!(params.len(), 4);
        assert_eq!(SelectionRequest::from_params(&params), req);
    }

    #[test]
    fn plain_text_values_fall_back_to_raw() {
        let params = decode("#title=Hello%20world&xaxis=[broken");
        assert_eq!(params.string_or(TITLE, DEFAULT_TITLE), "Hello world");
        assert_eq!(params.string_or(X_AXIS_TITLE, DEFAULT_X_AXIS_TITLE), "[broken");
    }

    #[test]
    fn missing_fields_use_defaults() {
        let params = decode("");
        assert!(params.is_empty());
        assert_eq!(params.string_or(TITLE, DEFAULT_TITLE), "Title");
        assert_eq!(params.string_or(X_AXIS_TITLE, DEFAULT_X_AXIS_TITLE), "Time");
        assert_eq!(params.string_or(Y_AXIS_TITLE, DEFAULT_Y_AXIS_TITLE), "Value");
        assert_eq!(
            params.string_or(BACKGROUND_COLOR, DEFAULT_BACKGROUND_COLOR),
            "#ffffff"
        );
    }

    #[test]
    fn missing_rows_yield_sample_series() {
        let params = decode("#title=x");
        let rows = params.rows_or(ROWS, sample_rows());
        assert_eq!(rows.len(), 70);
        assert_eq!(rows[0], (json!(0), json!(0)));
        assert_eq!(rows[1], (json!(1), json!(10)));
        assert_eq!(rows[69], (json!(69), json!(80)));
        assert_eq!(rows, sample_rows());
    }

    #[test]
    fn non_string_json_keeps_sent_text() {
        let params = decode("yaxis=1e3");
        assert_eq!(params.get(Y_AXIS_TITLE), Some(&json!(1000.0)));
        assert_eq!(params.string_or(Y_AXIS_TITLE, "x"), "1e3");
    }

    #[test]
    fn value_containing_equals_splits_on_first() {
        let params = decode("title=a=b");
        assert_eq!(params.string_or(TITLE, ""), "a=b");
    }

    #[test]
    fn plus_is_a_literal_character() {
        let params = decode("title=a+b&bgcolor=%23ff+ff");
        assert_eq!(params.string_or(TITLE, ""), "a+b");
        assert_eq!(params.string_or(BACKGROUND_COLOR, ""), "#ff+ff");

        assert_eq!(escape("a+b c"), "a%2Bb%20c");
        let params = decode(&param(TITLE, "1 + 1"));
        assert_eq!(params.string_or(TITLE, ""), "1 + 1");
    }
}
