use color_eyre::eyre::eyre;
use color_eyre::Result;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::error::DoubleChartError;
use crate::renderer::ColumnType;
use crate::Args;

pub const DEFAULT_ROWS_TITLE: &str = "Row";
pub const DEFAULT_COLS_TITLE: &str = "Column";
pub const DEFAULT_ROW_CLASS: &str = "doublechart-row-selected";
pub const DEFAULT_COL_CLASS: &str = "doublechart-col-selected";
pub const DEFAULT_CHART_WIDTH: &str = "400px";
pub const DEFAULT_CHART_HEIGHT: &str = "320px";
pub const DEFAULT_PANEL_URL: &str = "iframe.html";

/// Manages config directory and config file operations
#[derive(Clone)]
pub struct ConfigManager {
    pub(crate) config_dir: PathBuf,
}

impl ConfigManager {
    /// Create a ConfigManager with a custom config directory (primarily for testing)
    pub fn with_dir(config_dir: PathBuf) -> Self {
        Self { config_dir }
    }

    /// Create a new ConfigManager for the given app name
    pub fn new(app_name: &str) -> Result<Self> {
        let config_dir = dirs::config_dir()
            .ok_or_else(|| eyre!("Could not determine config directory"))?
            .join(app_name);

        Ok(Self { config_dir })
    }

    /// Get the config directory path
    pub fn config_dir(&self) -> &Path {
        &self.config_dir
    }

    /// Get path to a specific config file or subdirectory
    pub fn config_path(&self, path: &str) -> PathBuf {
        self.config_dir.join(path)
    }

    /// Ensure the config directory exists
    pub fn ensure_config_dir(&self) -> Result<()> {
        if !self.config_dir.exists() {
            std::fs::create_dir_all(&self.config_dir)?;
        }
        Ok(())
    }

    /// Generate default configuration template as a string
    pub fn generate_default_config(&self) -> String {
        DEFAULT_CONFIG_TEMPLATE.to_string()
    }

    /// Write default configuration to config file
    pub fn write_default_config(&self, force: bool) -> Result<PathBuf> {
        let config_path = self.config_path("config.toml");

        if config_path.exists() && !force {
            return Err(eyre!(
                "Config file already exists at {}. Use --force to overwrite.",
                config_path.display()
            ));
        }

        self.ensure_config_dir()?;
        std::fs::write(&config_path, DEFAULT_CONFIG_TEMPLATE)?;

        Ok(config_path)
    }

    /// Load the config file in this directory over the defaults.
    pub fn load_config(&self) -> Result<AppConfig> {
        let mut config = AppConfig::default();
        let config_path = self.config_path("config.toml");
        if config_path.exists() {
            let content = std::fs::read_to_string(&config_path).map_err(|e| {
                eyre!(
                    "Failed to read config file at {}: {}",
                    config_path.display(),
                    e
                )
            })?;
            let user: AppConfig = toml::from_str(&content).map_err(|e| {
                eyre!(
                    "Failed to parse config file at {}: {}",
                    config_path.display(),
                    e
                )
            })?;
            config.merge(user);
        }
        config.validate()?;
        Ok(config)
    }
}

/// Complete application configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// Configuration format version (for future compatibility)
    pub version: String,
    pub chart: ChartSection,
    pub selection: SelectionSection,
    pub debug: DebugConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ChartSection {
    pub width: String,
    pub height: String,
    pub background: String,
    pub x_type: String,
    pub y_type: String,
    pub panel_url: String,
    pub format: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SelectionSection {
    pub auto_load: bool,
    pub rows_title: String,
    pub cols_title: String,
    pub row_class: String,
    pub col_class: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DebugConfig {
    pub enabled: bool,
    pub log_level: String,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            version: "0.1".to_string(),
            chart: ChartSection::default(),
            selection: SelectionSection::default(),
            debug: DebugConfig::default(),
        }
    }
}

impl Default for ChartSection {
    fn default() -> Self {
        Self {
            width: DEFAULT_CHART_WIDTH.to_string(),
            height: DEFAULT_CHART_HEIGHT.to_string(),
            background: crate::channel::DEFAULT_BACKGROUND_COLOR.to_string(),
            x_type: "number".to_string(),
            y_type: "number".to_string(),
            panel_url: DEFAULT_PANEL_URL.to_string(),
            format: "svg".to_string(),
        }
    }
}

impl Default for SelectionSection {
    fn default() -> Self {
        Self {
            auto_load: false,
            rows_title: DEFAULT_ROWS_TITLE.to_string(),
            cols_title: DEFAULT_COLS_TITLE.to_string(),
            row_class: DEFAULT_ROW_CLASS.to_string(),
            col_class: DEFAULT_COL_CLASS.to_string(),
        }
    }
}

impl Default for DebugConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            log_level: "info".to_string(),
        }
    }
}

// Configuration loading and merging
impl AppConfig {
    /// Load configuration from all layers (default → user)
    pub fn load(app_name: &str) -> Result<Self> {
        match ConfigManager::new(app_name) {
            Ok(manager) => manager.load_config(),
            Err(_) => {
                let config = AppConfig::default();
                config.validate()?;
                Ok(config)
            }
        }
    }

    /// Merge another config into this one (other takes precedence)
    pub fn merge(&mut self, other: AppConfig) {
        if other.version != AppConfig::default().version {
            self.version = other.version;
        }
        self.chart.merge(other.chart);
        self.selection.merge(other.selection);
        self.debug.merge(other.debug);
    }

    /// Validate configuration values
    pub fn validate(&self) -> Result<()> {
        if !self.version.starts_with("0.1") {
            return Err(eyre!(
                "Unsupported config version: {}. Expected 0.1.x",
                self.version
            ));
        }

        parse_px(&self.chart.width)?;
        parse_px(&self.chart.height)?;
        parse_hex(&self.chart.background)?;
        ColumnType::parse(&self.chart.x_type)
            .ok_or_else(|| eyre!("Invalid x_type: {}. Must be 'number' or 'string'", self.chart.x_type))?;
        ColumnType::parse(&self.chart.y_type)
            .ok_or_else(|| eyre!("Invalid y_type: {}. Must be 'number' or 'string'", self.chart.y_type))?;

        match self.chart.format.as_str() {
            "svg" | "png" => {}
            _ => {
                return Err(eyre!(
                    "Invalid format: {}. Must be 'svg' or 'png'",
                    self.chart.format
                ))
            }
        }

        if self.selection.row_class.split_whitespace().count() != 1 {
            return Err(eyre!("row_class must be a single class name"));
        }
        if self.selection.col_class.split_whitespace().count() != 1 {
            return Err(eyre!("col_class must be a single class name"));
        }

        match self.debug.log_level.as_str() {
            "error" | "warn" | "info" | "debug" | "trace" => {}
            _ => {
                return Err(eyre!(
                    "Invalid log_level: {}. Must be one of error, warn, info, debug, trace",
                    self.debug.log_level
                ))
            }
        }

        Ok(())
    }
}

// Merge implementations for each config section
impl ChartSection {
    pub fn merge(&mut self, other: Self) {
        let default = ChartSection::default();
        if other.width != default.width {
            self.width = other.width;
        }
        if other.height != default.height {
            self.height = other.height;
        }
        if other.background != default.background {
            self.background = other.background;
        }
        if other.x_type != default.x_type {
            self.x_type = other.x_type;
        }
        if other.y_type != default.y_type {
            self.y_type = other.y_type;
        }
        if other.panel_url != default.panel_url {
            self.panel_url = other.panel_url;
        }
        if other.format != default.format {
            self.format = other.format;
        }
    }
}

impl SelectionSection {
    pub fn merge(&mut self, other: Self) {
        let default = SelectionSection::default();
        if other.auto_load != default.auto_load {
            self.auto_load = other.auto_load;
        }
        if other.rows_title != default.rows_title {
            self.rows_title = other.rows_title;
        }
        if other.cols_title != default.cols_title {
            self.cols_title = other.cols_title;
        }
        if other.row_class != default.row_class {
            self.row_class = other.row_class;
        }
        if other.col_class != default.col_class {
            self.col_class = other.col_class;
        }
    }
}

impl DebugConfig {
    pub fn merge(&mut self, other: Self) {
        let default = DebugConfig::default();
        if other.enabled != default.enabled {
            self.enabled = other.enabled;
        }
        if other.log_level != default.log_level {
            self.log_level = other.log_level;
        }
    }
}

/// Options the pivot view is constructed from. Field names follow the page-side config
/// object (`rowPaneId`, `autoLoad`, ...), so a JSON config can be deserialized directly.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ChartOptions {
    pub row_pane_id: Option<String>,
    pub col_pane_id: Option<String>,
    pub table_id: Option<String>,
    pub auto_load: Option<bool>,
    pub rows_title: Option<String>,
    pub cols_title: Option<String>,
    pub selected_row_class_name: Option<String>,
    pub selected_col_class_name: Option<String>,
    pub chart_width: Option<String>,
    pub chart_height: Option<String>,
    pub panel_url: Option<String>,
}

/// Validated construction options.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChartConfig {
    pub row_pane_id: String,
    pub col_pane_id: String,
    pub table_id: String,
    pub auto_load: bool,
    pub rows_title: String,
    pub cols_title: String,
    pub selected_row_class_name: String,
    pub selected_col_class_name: String,
    pub chart_width: String,
    pub chart_height: String,
    pub panel_url: String,
}

fn required(value: Option<String>, key: &'static str) -> Result<String> {
    value.ok_or_else(|| DoubleChartError::MissingOption(key).into())
}

impl ChartOptions {
    /// Options from the command line, falling back to the config file.
    pub fn from_args_and_config(args: &Args, config: &AppConfig) -> Self {
        Self {
            row_pane_id: args.row_pane_id.clone(),
            col_pane_id: args.col_pane_id.clone(),
            table_id: args.table_id.clone(),
            auto_load: Some(args.auto_load || config.selection.auto_load),
            rows_title: Some(
                args.rows_title
                    .clone()
                    .unwrap_or_else(|| config.selection.rows_title.clone()),
            ),
            cols_title: Some(
                args.cols_title
                    .clone()
                    .unwrap_or_else(|| config.selection.cols_title.clone()),
            ),
            selected_row_class_name: Some(config.selection.row_class.clone()),
            selected_col_class_name: Some(config.selection.col_class.clone()),
            chart_width: Some(
                args.width
                    .clone()
                    .unwrap_or_else(|| config.chart.width.clone()),
            ),
            chart_height: Some(
                args.height
                    .clone()
                    .unwrap_or_else(|| config.chart.height.clone()),
            ),
            panel_url: Some(config.chart.panel_url.clone()),
        }
    }

    /// Check required options, fill in defaults.
    pub fn build(self) -> Result<ChartConfig> {
        let config = ChartConfig {
            row_pane_id: required(self.row_pane_id, "rowPaneId")?,
            col_pane_id: required(self.col_pane_id, "colPaneId")?,
            table_id: required(self.table_id, "tableId")?,
            auto_load: self.auto_load.unwrap_or(false),
            rows_title: self
                .rows_title
                .unwrap_or_else(|| DEFAULT_ROWS_TITLE.to_string()),
            cols_title: self
                .cols_title
                .unwrap_or_else(|| DEFAULT_COLS_TITLE.to_string()),
            selected_row_class_name: self
                .selected_row_class_name
                .unwrap_or_else(|| DEFAULT_ROW_CLASS.to_string()),
            selected_col_class_name: self
                .selected_col_class_name
                .unwrap_or_else(|| DEFAULT_COL_CLASS.to_string()),
            chart_width: css_length(
                self.chart_width
                    .unwrap_or_else(|| DEFAULT_CHART_WIDTH.to_string()),
            ),
            chart_height: css_length(
                self.chart_height
                    .unwrap_or_else(|| DEFAULT_CHART_HEIGHT.to_string()),
            ),
            panel_url: self
                .panel_url
                .unwrap_or_else(|| DEFAULT_PANEL_URL.to_string()),
        };
        Ok(config)
    }
}

/// Frame sizes go into a style attribute untouched, except that a bare number gets `px`.
fn css_length(value: String) -> String {
    let trimmed = value.trim();
    if trimmed.parse::<f64>().is_ok_and(f64::is_finite) {
        format!("{trimmed}px")
    } else {
        value
    }
}

/// Parse a pixel length such as `400px` (a bare number is taken as px).
pub fn parse_px(s: &str) -> Result<u32> {
    let trimmed = s.trim();
    let number = trimmed.strip_suffix("px").unwrap_or(trimmed).trim();
    match number.parse::<u32>() {
        Ok(px) if px > 0 => Ok(px),
        _ => Err(DoubleChartError::InvalidDimension(s.to_string()).into()),
    }
}

/// Parse a `#rrggbb` colour.
pub fn parse_hex(s: &str) -> Result<(u8, u8, u8)> {
    let trimmed = s.trim();
    let Some(digits) = trimmed.strip_prefix('#') else {
        return Err(DoubleChartError::InvalidColor(s.to_string()).into());
    };
    if digits.len() != 6 || !digits.chars().all(|c| c.is_ascii_hexdigit()) {
        return Err(DoubleChartError::InvalidColor(s.to_string()).into());
    }

    let component = |range: std::ops::Range<usize>| {
        u8::from_str_radix(&digits[range], 16)
            .map_err(|_| DoubleChartError::InvalidColor(s.to_string()))
    };
    Ok((component(0..2)?, component(2..4)?, component(4..6)?))
}

const DEFAULT_CONFIG_TEMPLATE: &str = include_str!("../config/default.toml");
