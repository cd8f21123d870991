use doublechart::config::{AppConfig, ChartOptions, ConfigManager};
use doublechart::renderer::{ColumnType, RenderStyle};
use doublechart::Args;
use clap::Parser;
use std::fs;
use tempfile::TempDir;

// Helper to create a temporary config directory for testing
fn setup_test_config_dir() -> (TempDir, ConfigManager) {
    let temp_dir = TempDir::new().expect("Failed to create temp dir");
    let config_manager = ConfigManager::with_dir(temp_dir.path().to_path_buf());
    (temp_dir, config_manager)
}

#[test]
fn test_default_config() {
    let config = AppConfig::default();

    assert_eq!(config.version, "0.1");

    assert_eq!(config.chart.width, "400px");
    assert_eq!(config.chart.height, "320px");
    assert_eq!(config.chart.background, "#ffffff");
    assert_eq!(config.chart.x_type, "number");
    assert_eq!(config.chart.panel_url, "iframe.html");
    assert_eq!(config.chart.format, "svg");

    assert!(!config.selection.auto_load);
    assert_eq!(config.selection.rows_title, "Row");
    assert_eq!(config.selection.cols_title, "Column");
    assert_eq!(config.selection.row_class, "doublechart-row-selected");
    assert_eq!(config.selection.col_class, "doublechart-col-selected");

    assert!(!config.debug.enabled);
    assert_eq!(config.debug.log_level, "info");
}

#[test]
fn test_default_template_matches_defaults() {
    let (_temp_dir, config_manager) = setup_test_config_dir();
    let template = config_manager.generate_default_config();

    assert!(template.contains("[chart]"));
    assert!(template.contains("[selection]"));
    assert!(template.contains("[debug]"));
    assert!(template.contains("version = \"0.1\""));

    let parsed: AppConfig = toml::from_str(&template).expect("template parses");
    assert_eq!(parsed.chart.width, AppConfig::default().chart.width);
    assert_eq!(parsed.selection.row_class, AppConfig::default().selection.row_class);
    assert!(parsed.validate().is_ok());
}

#[test]
fn test_write_default_config() {
    let (_temp_dir, config_manager) = setup_test_config_dir();

    let config_path = config_manager
        .write_default_config(false)
        .expect("Failed to write config");

    assert!(config_path.exists());
    let content = fs::read_to_string(&config_path).expect("Failed to read config");
    assert!(content.contains("[chart]"));
}

#[test]
fn test_write_config_without_force_fails_if_exists() {
    let (_temp_dir, config_manager) = setup_test_config_dir();

    config_manager
        .write_default_config(false)
        .expect("First write should succeed");

    let result = config_manager.write_default_config(false);
    assert!(result.is_err());
    assert!(result.unwrap_err().to_string().contains("already exists"));

    config_manager
        .write_default_config(true)
        .expect("Write with force should succeed");
}

#[test]
fn test_load_config_with_no_file() {
    let (_temp_dir, config_manager) = setup_test_config_dir();
    let config = config_manager.load_config().expect("Should load default config");
    assert_eq!(config.version, "0.1");
    assert_eq!(config.chart.width, "400px");
}

#[test]
fn test_load_partial_config_keeps_defaults() {
    let (_temp_dir, config_manager) = setup_test_config_dir();
    config_manager
        .ensure_config_dir()
        .expect("Failed to create config dir");

    let partial = r#"
version = "0.1"

[chart]
height = "240px"
x_type = "string"

[selection]
auto_load = true
rows_title = "Month"
"#;
    fs::write(config_manager.config_path("config.toml"), partial).expect("write config");

    let config = config_manager.load_config().expect("Failed to load config");
    assert_eq!(config.chart.height, "240px");
    assert_eq!(config.chart.width, "400px"); // Default
    assert_eq!(config.chart.x_type, "string");
    assert!(config.selection.auto_load);
    assert_eq!(config.selection.rows_title, "Month");
    assert_eq!(config.selection.cols_title, "Column"); // Default

    let style = RenderStyle::from_config(&config.chart).expect("style");
    assert_eq!(style.height, 240);
    assert_eq!(style.x_type, ColumnType::String);
    assert_eq!(style.y_type, ColumnType::Number);
}

#[test]
fn test_load_rejects_invalid_values() {
    let (_temp_dir, config_manager) = setup_test_config_dir();
    config_manager
        .ensure_config_dir()
        .expect("Failed to create config dir");
    let path = config_manager.config_path("config.toml");

    for bad in [
        "[chart]\nwidth = \"wide\"\n",
        "[chart]\nbackground = \"red\"\n",
        "[chart]\ny_type = \"date\"\n",
        "[chart]\nformat = \"eps\"\n",
        "[selection]\nrow_class = \"two classes\"\n",
        "[debug]\nlog_level = \"loud\"\n",
        "version = \"2.0\"\n",
    ] {
        fs::write(&path, bad).expect("write config");
        assert!(config_manager.load_config().is_err(), "accepted: {}", bad);
    }

    fs::write(&path, "[chart\nwidth = ").expect("write config");
    let err = config_manager.load_config().unwrap_err();
    assert!(err.to_string().contains("Failed to parse config file"));
}

#[test]
fn test_merge_configs() {
    let mut base = AppConfig::default();
    let mut override_config = AppConfig::default();
    override_config.chart.background = "#000000".to_string();
    override_config.selection.col_class = "picked".to_string();
    override_config.debug.enabled = true;

    base.merge(override_config);

    assert_eq!(base.chart.background, "#000000");
    assert_eq!(base.selection.col_class, "picked");
    assert!(base.debug.enabled);
    assert_eq!(base.chart.width, "400px"); // Still default
}

#[test]
fn test_cli_flags_override_config() {
    let mut config = AppConfig::default();
    config.selection.rows_title = "Month".to_string();
    config.selection.cols_title = "Measure".to_string();
    config.chart.width = "500px".to_string();

    let args = Args::parse_from([
        "doublechart",
        "page.html",
        "--table-id",
        "pivot",
        "--row-pane-id",
        "rows",
        "--col-pane-id",
        "cols",
        "--rows-title",
        "Quarter",
        "--height",
        "200px",
    ]);
    let chart = ChartOptions::from_args_and_config(&args, &config)
        .build()
        .expect("options build");

    assert_eq!(chart.table_id, "pivot");
    assert_eq!(chart.rows_title, "Quarter");
    assert_eq!(chart.cols_title, "Measure");
    assert_eq!(chart.chart_width, "500px");
    assert_eq!(chart.chart_height, "200px");
    assert!(!chart.auto_load);
}

#[test]
fn test_missing_ids_fail_construction() {
    let args = Args::parse_from(["doublechart", "page.html", "--table-id", "pivot"]);
    let err = ChartOptions::from_args_and_config(&args, &AppConfig::default())
        .build()
        .unwrap_err();
    assert!(err.to_string().contains("rowPaneId"));
}
