use clap::Parser;
use color_eyre::Result;
use doublechart::config::parse_px;
use doublechart::error_display::user_message_from_report;
use doublechart::panel::render_frame;
use doublechart::renderer::{ChartRenderer, RenderStyle};
use doublechart::{
    chart_export::PlottersLineChart, link_page, write_chart, AppConfig, Args, Axis, ChartFormat,
    ChartOptions, ConfigManager, APP_NAME,
};
use std::path::{Path, PathBuf};
use tracing::Level;

fn log_level(args: &Args, config: &AppConfig) -> Level {
    if args.debug || config.debug.enabled {
        return Level::DEBUG;
    }
    match config.debug.log_level.as_str() {
        "error" => Level::ERROR,
        "warn" => Level::WARN,
        "debug" => Level::DEBUG,
        "trace" => Level::TRACE,
        _ => Level::INFO,
    }
}

fn chart_format(args: &Args, config: &AppConfig) -> ChartFormat {
    args.format
        .or_else(|| ChartFormat::from_extension(&config.chart.format))
        .unwrap_or(ChartFormat::Svg)
}

fn render_style(args: &Args, config: &AppConfig) -> Result<RenderStyle> {
    let mut style = RenderStyle::from_config(&config.chart)?;
    if let Some(width) = &args.width {
        style.width = parse_px(width)?;
    }
    if let Some(height) = &args.height {
        style.height = parse_px(height)?;
    }
    Ok(style)
}

/// Headers to activate after load, rows first.
fn clicks(args: &Args) -> Vec<(Axis, usize)> {
    let mut clicks = Vec::new();
    if let Some(row) = args.row {
        clicks.push((Axis::Row, row));
    }
    if let Some(col) = args.col {
        clicks.push((Axis::Column, col));
    }
    clicks
}

fn out_dir(args: &Args) -> Result<PathBuf> {
    let dir = args.out_dir.clone().unwrap_or_else(|| PathBuf::from("."));
    std::fs::create_dir_all(&dir)?;
    Ok(dir)
}

fn run_page(args: &Args, config: &AppConfig, page: &Path) -> Result<()> {
    let markup = std::fs::read_to_string(page)?;
    let options = ChartOptions::from_args_and_config(args, config);
    let (doc, controller) = link_page(&markup, options, &clicks(args))?;
    tracing::debug!(
        table = %controller.config().table_id,
        panel_url = %controller.config().panel_url,
        "linked page"
    );

    let dir = out_dir(args)?;
    let page_path = dir.join("page.html");
    std::fs::write(&page_path, doc.to_html())?;
    println!("{}", page_path.display());

    let style = render_style(args, config)?;
    let format = chart_format(args, config);
    for axis in Axis::ALL {
        let Some(selection) = controller.last_selection(axis) else {
            continue;
        };
        let name = match axis {
            Axis::Row => "row",
            Axis::Column => "col",
        };
        let path = dir.join(format!("{}-chart.{}", name, format.extension()));
        write_chart(&path, &selection.src, &style, format)?;
        println!("{}", path.display());
    }
    Ok(())
}

fn run_fragment(args: &Args, config: &AppConfig, fragment: &str) -> Result<()> {
    let src = if fragment.contains('#') {
        fragment.to_string()
    } else {
        format!("#{}", fragment)
    };
    let style = render_style(args, config)?;
    let dir = out_dir(args)?;

    let mut renderer = ChartRenderer::new(PlottersLineChart);
    let doc = render_frame(&src, &mut renderer, &style)?;
    let panel_path = dir.join("panel.html");
    std::fs::write(&panel_path, doc.to_html())?;
    println!("{}", panel_path.display());

    if chart_format(args, config) == ChartFormat::Png {
        let path = dir.join("chart.png");
        write_chart(&path, &src, &style, ChartFormat::Png)?;
        println!("{}", path.display());
    }
    Ok(())
}

fn handle_early_exit_flags(args: &Args) -> Result<Option<()>> {
    if args.generate_config {
        let manager = ConfigManager::new(APP_NAME)?;
        match manager.write_default_config(args.force) {
            Ok(path) => {
                println!("Wrote default configuration to {}", path.display());
                return Ok(Some(()));
            }
            Err(e) => {
                eprintln!("Error writing configuration: {}", e);
                std::process::exit(1);
            }
        }
    }

    Ok(None)
}

fn main() -> Result<()> {
    let args = Args::parse();

    if let Some(()) = handle_early_exit_flags(&args)? {
        return Ok(());
    }

    let config = match AppConfig::load(APP_NAME) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Error loading configuration: {}", e);
            std::process::exit(1);
        }
    };

    tracing_subscriber::fmt()
        .with_max_level(log_level(&args, &config))
        .with_writer(std::io::stderr)
        .init();
    color_eyre::install()?;

    let result = match (&args.fragment, &args.page) {
        (Some(fragment), _) => run_fragment(&args, &config, fragment),
        (None, Some(page)) => run_page(&args, &config, page),
        (None, None) => Ok(()),
    };
    if let Err(e) = result {
        eprintln!("Error: {}", user_message_from_report(&e, args.page.as_deref()));
        std::process::exit(1);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clicks_from_args() {
        let args = Args::parse_from(["doublechart", "page.html", "--row", "2", "--col", "0"]);
        assert_eq!(clicks(&args), vec![(Axis::Row, 2), (Axis::Column, 0)]);

        let args = Args::parse_from(["doublechart", "page.html"]);
        assert!(clicks(&args).is_empty());
    }

    #[test]
    fn test_format_flag_overrides_config() {
        let mut config = AppConfig::default();
        config.chart.format = "png".to_string();

        let args = Args::parse_from(["doublechart", "page.html"]);
        assert_eq!(chart_format(&args, &config), ChartFormat::Png);

        let args = Args::parse_from(["doublechart", "page.html", "--format", "svg"]);
        assert_eq!(chart_format(&args, &config), ChartFormat::Svg);
    }

    #[test]
    fn test_debug_flag_raises_log_level() {
        let config = AppConfig::default();
        let args = Args::parse_from(["doublechart", "page.html"]);
        assert_eq!(log_level(&args, &config), Level::INFO);
        let args = Args::parse_from(["doublechart", "page.html", "--debug"]);
        assert_eq!(log_level(&args, &config), Level::DEBUG);
    }

    #[test]
    fn test_size_flags_override_config() {
        let args = Args::parse_from(["doublechart", "page.html", "--width", "640px"]);
        let style = render_style(&args, &AppConfig::default()).unwrap();
        assert_eq!((style.width, style.height), (640, 320));
    }
}
