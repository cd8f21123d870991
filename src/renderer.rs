//! Turns a decoded chart request into the chart widget's input and runs the widget.
//!
//! The widget itself is opaque: it receives a two-column typed table and drawing options
//! and returns the markup it painted. Nothing here retries or rescues a widget failure.

use color_eyre::Result;
use regex::Regex;
use serde_json::Value;
use std::fmt;
use std::sync::OnceLock;

use crate::channel::{sample_rows, value_text};
use crate::config::{parse_hex, parse_px, ChartSection};
use crate::document::{DocumentPort, NodeId};
use crate::panel::PanelParams;

/// Class of the element a chart is painted into.
pub const SURFACE_CLASS: &str = "doublechart-surface";

/// Declared type of a chart column.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ColumnType {
    #[default]
    Number,
    String,
}

impl ColumnType {
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "number" => Some(Self::Number),
            "string" => Some(Self::String),
            _ => None,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Number => "number",
            Self::String => "string",
        }
    }
}

impl fmt::Display for ColumnType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One coerced cell of the chart table.
#[derive(Debug, Clone, PartialEq)]
pub enum Datum {
    Number(f64),
    Text(String),
}

impl Datum {
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Datum::Number(n) => Some(*n),
            Datum::Text(_) => None,
        }
    }

    pub fn label(&self) -> String {
        match self {
            Datum::Number(n) => n.to_string(),
            Datum::Text(s) => s.clone(),
        }
    }
}

fn float_prefix_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"^\s*([+-]?(?:Infinity|(?:\d+\.?\d*|\.\d+)(?:[eE][+-]?\d+)?))")
            .expect("float pattern is valid")
    })
}

/// Longest numeric prefix of `text`, NaN when there is none (`"12px"` → 12, `"Sales"` → NaN).
pub fn parse_float(text: &str) -> f64 {
    let Some(number) = float_prefix_regex()
        .captures(text)
        .and_then(|caps| caps.get(1))
    else {
        return f64::NAN;
    };
    match number.as_str() {
        "Infinity" | "+Infinity" => f64::INFINITY,
        "-Infinity" => f64::NEG_INFINITY,
        s => s.parse::<f64>().unwrap_or(f64::NAN),
    }
}

/// Coerce a decoded value to the declared column type.
pub fn coerce(value: &Value, ty: ColumnType) -> Datum {
    match ty {
        ColumnType::Number => Datum::Number(match value {
            Value::Number(n) => n.as_f64().unwrap_or(f64::NAN),
            Value::String(s) => parse_float(s),
            Value::Null | Value::Bool(_) => f64::NAN,
            other => parse_float(&other.to_string()),
        }),
        ColumnType::String => Datum::Text(value_text(value)),
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Column {
    pub ty: ColumnType,
    pub label: String,
}

/// Typed two-column table handed to the widget. Rows keep request order.
#[derive(Debug, Clone, PartialEq)]
pub struct DataTable {
    pub x: Column,
    pub y: Column,
    pub rows: Vec<(Datum, Datum)>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DrawOptions {
    pub h_axis_title: String,
    pub v_axis_title: String,
    pub background: String,
    pub title: String,
}

/// Chart surface size and per-axis coercion.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderStyle {
    pub width: u32,
    pub height: u32,
    pub background: String,
    pub x_type: ColumnType,
    pub y_type: ColumnType,
}

impl Default for RenderStyle {
    fn default() -> Self {
        Self {
            width: 400,
            height: 320,
            background: crate::channel::DEFAULT_BACKGROUND_COLOR.to_string(),
            x_type: ColumnType::Number,
            y_type: ColumnType::Number,
        }
    }
}

impl RenderStyle {
    pub fn from_config(chart: &ChartSection) -> Result<Self> {
        parse_hex(&chart.background)?;
        Ok(Self {
            width: parse_px(&chart.width)?,
            height: parse_px(&chart.height)?,
            background: chart.background.trim().to_string(),
            x_type: ColumnType::parse(&chart.x_type).unwrap_or_default(),
            y_type: ColumnType::parse(&chart.y_type).unwrap_or_default(),
        })
    }
}

/// The external chart painter.
pub trait ChartWidget {
    /// Paint `table` at `size` (px) and return the produced markup.
    fn draw(&mut self, size: (u32, u32), table: &DataTable, options: &DrawOptions)
        -> Result<String>;
}

/// Element a chart was rendered into.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Surface {
    pub node: NodeId,
    pub width: u32,
    pub height: u32,
}

pub struct ChartRenderer<W> {
    widget: W,
}

impl<W: ChartWidget> ChartRenderer<W> {
    pub fn new(widget: W) -> Self {
        Self { widget }
    }

    pub fn widget(&self) -> &W {
        &self.widget
    }

    /// Replace `target`'s content with a fresh surface and draw `params` into it.
    pub fn render<D: DocumentPort + ?Sized>(
        &mut self,
        doc: &mut D,
        target: NodeId,
        params: &PanelParams,
        style: &RenderStyle,
    ) -> Result<Surface> {
        doc.remove_children(target);
        let node = doc.create_element("div");
        doc.add_class(node, SURFACE_CLASS);
        doc.set_style(node, "width", Some(format!("{}px", style.width).as_str()));
        doc.set_style(node, "height", Some(format!("{}px", style.height).as_str()));
        doc.set_style(node, "border", Some("0"));
        doc.append_child(target, node);

        let table = build_data_table(params, style);
        let options = draw_options(params, style);
        tracing::debug!(
            points = table.rows.len(),
            title = %options.title,
            "drawing chart"
        );
        let markup = self
            .widget
            .draw((style.width, style.height), &table, &options)?;
        doc.append_markup(node, &markup);

        Ok(Surface {
            node,
            width: style.width,
            height: style.height,
        })
    }
}

/// Axis titles, title and background for `params`; the style's background applies when the
/// request carries none.
pub fn draw_options(params: &PanelParams, style: &RenderStyle) -> DrawOptions {
    DrawOptions {
        h_axis_title: params.x_axis_title.clone(),
        v_axis_title: params.y_axis_title.clone(),
        background: params
            .background
            .clone()
            .unwrap_or_else(|| style.background.clone()),
        title: params.title.clone(),
    }
}

/// Coerce every pair of `params.rows` (or the sample series when there are none).
pub fn build_data_table(params: &PanelParams, style: &RenderStyle) -> DataTable {
    let fallback;
    let rows = if params.rows.is_empty() {
        fallback = sample_rows();
        &fallback
    } else {
        &params.rows
    };
    DataTable {
        x: Column {
            ty: style.x_type,
            label: "X".to_string(),
        },
        y: Column {
            ty: style.y_type,
            label: params.y_axis_title.clone(),
        },
        rows: rows
            .iter()
            .map(|(x, y)| (coerce(x, style.x_type), coerce(y, style.y_type)))
            .collect(),
    }
}
