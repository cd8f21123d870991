use color_eyre::Result;
use std::path::Path;

pub mod channel;
pub mod chart_export;
pub mod cli;
pub mod config;
pub mod controller;
pub mod document;
pub mod error;
pub mod error_display;
pub mod grid;
pub mod html;
pub mod panel;
pub mod renderer;

pub use cli::{Args, ChartFormat};
pub use config::{AppConfig, ChartConfig, ChartOptions, ConfigManager};
pub use controller::{Axis, HeaderLink, LinkController, Selection};
pub use document::{DocumentPort, NodeId};
pub use error::DoubleChartError;
pub use html::HtmlDocument;

use chart_export::{write_chart_png, PlottersLineChart};
use panel::PanelParams;
use renderer::{build_data_table, draw_options, ChartWidget, RenderStyle};

/// Application name used for the config directory and other app-specific paths
pub const APP_NAME: &str = "doublechart";

/// Parse `markup`, install the header links and activate `clicks` in order.
pub fn link_page(
    markup: &str,
    options: ChartOptions,
    clicks: &[(Axis, usize)],
) -> Result<(HtmlDocument, LinkController)> {
    let mut doc = HtmlDocument::parse(markup);
    let mut controller = LinkController::from_options(options)?;
    controller.load(&mut doc)?;
    for &(axis, index) in clicks {
        controller.click(&mut doc, axis, index)?;
    }
    Ok((doc, controller))
}

/// Draw the chart a frame address points at and write it to `path`.
pub fn write_chart(path: &Path, src: &str, style: &RenderStyle, format: ChartFormat) -> Result<()> {
    let params = PanelParams::from_fragment(channel::fragment_of(src));
    let table = build_data_table(&params, style);
    let options = draw_options(&params, style);
    let size = (style.width, style.height);
    match format {
        ChartFormat::Svg => {
            let svg = PlottersLineChart.draw(size, &table, &options)?;
            std::fs::write(path, svg)?;
            tracing::info!(path = %path.display(), "wrote chart");
        }
        ChartFormat::Png => write_chart_png(path, &table, &options, size)?,
    }
    Ok(())
}
