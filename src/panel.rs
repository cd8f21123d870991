//! The chart pane: the document a chart frame points at.
//!
//! It reads the chart request out of its own URL fragment, resolves missing fields through
//! the defaults table and hands the result to a [`ChartRenderer`].

use color_eyre::eyre::eyre;
use color_eyre::Result;
use serde_json::Value;

use crate::channel::{
    self, sample_rows, FragmentParams, SelectionRequest, BACKGROUND_COLOR,
    DEFAULT_TITLE, DEFAULT_X_AXIS_TITLE, DEFAULT_Y_AXIS_TITLE, ROWS, TITLE, X_AXIS_TITLE,
    Y_AXIS_TITLE,
};
use crate::document::{DocumentPort, NodeId};
use crate::html::HtmlDocument;
use crate::renderer::{ChartRenderer, ChartWidget, RenderStyle, Surface};

/// Id of the element the pane document draws into.
pub const CHART_ELEMENT_ID: &str = "chart";

const PANEL_TEMPLATE: &str = "<!DOCTYPE html><html><head><meta charset=\"utf-8\"></head>\
    <body style=\"margin: 0\"><div id=\"chart\"></div></body></html>";

/// Chart parameters as the pane sees them, defaults applied.
#[derive(Debug, Clone, PartialEq)]
pub struct PanelParams {
    pub rows: Vec<(Value, Value)>,
    pub x_axis_title: String,
    pub y_axis_title: String,
    pub title: String,
    /// `bgcolor` when the fragment carries one; otherwise the style's background applies.
    pub background: Option<String>,
}

impl PanelParams {
    pub fn from_params(params: &FragmentParams) -> Self {
        Self {
            rows: params.rows_or(ROWS, sample_rows()),
            x_axis_title: params.string_or(X_AXIS_TITLE, DEFAULT_X_AXIS_TITLE),
            y_axis_title: params.string_or(Y_AXIS_TITLE, DEFAULT_Y_AXIS_TITLE),
            title: params.string_or(TITLE, DEFAULT_TITLE),
            background: params
                .contains(BACKGROUND_COLOR)
                .then(|| params.string_or(BACKGROUND_COLOR, "")),
        }
    }

    pub fn from_fragment(fragment: &str) -> Self {
        Self::from_params(&channel::decode(fragment))
    }

    /// Parameters for a request that never crossed a frame boundary.
    pub fn from_request(request: &SelectionRequest) -> Self {
        Self {
            rows: request
                .rows
                .iter()
                .map(|(k, v)| (Value::String(k.clone()), Value::String(v.clone())))
                .collect(),
            x_axis_title: request.x_axis_title.clone(),
            y_axis_title: request.y_axis_title.clone(),
            title: request.title.clone(),
            background: None,
        }
    }
}

/// Decode `fragment` and draw it into `target`.
pub fn draw_panel<D, W>(
    doc: &mut D,
    target: NodeId,
    fragment: &str,
    renderer: &mut ChartRenderer<W>,
    style: &RenderStyle,
) -> Result<Surface>
where
    D: DocumentPort + ?Sized,
    W: ChartWidget,
{
    let params = PanelParams::from_fragment(fragment);
    renderer.render(doc, target, &params, style)
}

/// Build the pane document for a frame whose `src` is `src` and draw its chart.
pub fn render_frame<W: ChartWidget>(
    src: &str,
    renderer: &mut ChartRenderer<W>,
    style: &RenderStyle,
) -> Result<HtmlDocument> {
    let mut doc = HtmlDocument::parse(PANEL_TEMPLATE);
    let target = doc
        .get_by_id(CHART_ELEMENT_ID)
        .ok_or_else(|| eyre!("pane template has no #{} element", CHART_ELEMENT_ID))?;
    draw_panel(&mut doc, target, channel::fragment_of(src), renderer, style)?;
    Ok(doc)
}
