//! Shared CLI definitions for doublechart.
//!
//! Used by the main application and by the build script (manpage) and
//! gen_docs binary (command-line-options markdown).

use clap::{CommandFactory, Parser, ValueEnum};
use std::path::PathBuf;

/// Output format for rendered charts.
/// When `--format` is not specified, the `[chart] format` config value is used.
#[derive(Debug, Clone, Copy, ValueEnum, PartialEq, Eq)]
pub enum ChartFormat {
    /// Scalable vector graphics, embedded into the written page
    Svg,
    /// Portable network graphics bitmap
    Png,
}

impl ChartFormat {
    /// Parse format from extension string (e.g. "svg", "png").
    pub fn from_extension(ext: &str) -> Option<Self> {
        match ext.to_lowercase().as_str() {
            "svg" => Some(Self::Svg),
            "png" => Some(Self::Png),
            _ => None,
        }
    }

    /// Get file extension for this chart format
    pub fn extension(&self) -> &'static str {
        match self {
            Self::Svg => "svg",
            Self::Png => "png",
        }
    }
}

/// Command-line arguments for doublechart
#[derive(Clone, Parser, Debug)]
#[command(
    name = "doublechart",
    version,
    about = "Two-way pivot charts over static HTML tables",
    long_about = include_str!("../long_about.txt")
)]
pub struct Args {
    /// Path to the HTML page holding the table and the two chart panes
    /// (not required with --generate-config or --fragment)
    #[arg(required_unless_present_any = ["generate_config", "fragment"], value_name = "PAGE")]
    pub page: Option<PathBuf>,

    /// Element id of the source table
    #[arg(long = "table-id", value_name = "ID")]
    pub table_id: Option<String>,

    /// Element id of the pane that receives row charts
    #[arg(long = "row-pane-id", value_name = "ID")]
    pub row_pane_id: Option<String>,

    /// Element id of the pane that receives column charts
    #[arg(long = "col-pane-id", value_name = "ID")]
    pub col_pane_id: Option<String>,

    /// Activate the first row header and the first column header on load
    #[arg(long = "auto-load", action)]
    pub auto_load: bool,

    /// Activate the row header at this index (0-based) after load
    #[arg(long = "row", value_name = "N")]
    pub row: Option<usize>,

    /// Activate the column header at this index (0-based) after load
    #[arg(long = "col", value_name = "N")]
    pub col: Option<usize>,

    /// Title of the row axis (default: Row)
    #[arg(long = "rows-title", value_name = "TITLE")]
    pub rows_title: Option<String>,

    /// Title of the column axis (default: Column)
    #[arg(long = "cols-title", value_name = "TITLE")]
    pub cols_title: Option<String>,

    /// Chart width, in px (default: 400px)
    #[arg(long = "width", value_name = "PX")]
    pub width: Option<String>,

    /// Chart height, in px (default: 320px)
    #[arg(long = "height", value_name = "PX")]
    pub height: Option<String>,

    /// Render a single pane from a chart fragment (e.g. "#rows=...&title=...") instead of a page
    #[arg(long = "fragment", value_name = "FRAGMENT", conflicts_with = "page")]
    pub fragment: Option<String>,

    /// Directory that receives the linked page and the rendered charts (default: current directory)
    #[arg(long = "out-dir", value_name = "DIR")]
    pub out_dir: Option<PathBuf>,

    /// Chart output format (svg, png)
    #[arg(long = "format", value_enum)]
    pub format: Option<ChartFormat>,

    /// Enable debug logging
    #[arg(long = "debug", action)]
    pub debug: bool,

    /// Generate default configuration file at ~/.config/doublechart/config.toml
    #[arg(long = "generate-config", action)]
    pub generate_config: bool,

    /// Force overwrite existing config file when using --generate-config
    #[arg(long = "force", requires = "generate_config", action)]
    pub force: bool,
}

/// Escape `|` and newlines for use in markdown table cells.
fn escape_table_cell(s: &str) -> String {
    s.replace('|', "\\|").replace(['\n', '\r'], " ")
}

fn value_placeholder(arg: &clap::Arg) -> String {
    arg.get_value_names()
        .map(|names| {
            names
                .iter()
                .map(|n: &clap::builder::Str| format!("<{}>", n.as_ref() as &str))
                .collect::<Vec<_>>()
                .join(" ")
        })
        .unwrap_or_default()
}

/// Render command-line options as markdown.
///
/// Used by the gen_docs binary, which prints it to stdout.
pub fn render_options_markdown() -> String {
    let mut cmd = Args::command();
    cmd.build();

    let mut out = String::from("# Command Line Options\n\n");

    out.push_str("## Usage\n\n```\n");
    let usage = cmd.render_usage();
    out.push_str(&usage.to_string());
    out.push_str("\n```\n\n");

    out.push_str("## Options\n\n");
    out.push_str("| Option | Description |\n");
    out.push_str("|--------|-------------|\n");

    for arg in cmd.get_arguments() {
        let id = arg.get_id().as_ref().to_string();
        if id == "help" || id == "version" {
            continue;
        }

        let option_str = if arg.is_positional() {
            let placeholder = value_placeholder(arg);
            if arg.is_required_set() {
                placeholder
            } else {
                format!("[{placeholder}]")
            }
        } else {
            let mut parts = Vec::new();
            if let Some(s) = arg.get_short() {
                parts.push(format!("-{s}"));
            }
            if let Some(l) = arg.get_long() {
                parts.push(format!("--{l}"));
            }
            let op = parts.join(", ");
            let placeholder = if arg.get_action().takes_values() {
                value_placeholder(arg)
            } else {
                String::new()
            };
            if placeholder.is_empty() {
                op
            } else {
                format!("{op} {placeholder}")
            }
        };

        let help = arg
            .get_help()
            .map(|h| escape_table_cell(&h.to_string()))
            .unwrap_or_else(|| "-".to_string());

        out.push_str(&format!("| `{option_str}` | {help} |\n"));
    }

    out
}
