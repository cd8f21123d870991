//! Chart painting with plotters: SVG markup for chart surfaces, PNG files for export.

use color_eyre::eyre::eyre;
use color_eyre::Result;
use plotters::coord::Shift;
use plotters::prelude::*;
use std::ops::Range;
use std::path::Path;

use crate::config::parse_hex;
use crate::renderer::{ChartWidget, DataTable, Datum, DrawOptions};

/// Points and x labels extracted from a chart table.
#[derive(Debug, Clone, PartialEq)]
pub struct PlotData {
    pub points: Vec<(f64, f64)>,
    /// Tick labels by x position when the x column is text; empty for numeric x.
    pub x_labels: Vec<String>,
}

impl PlotData {
    /// Text x values are laid out at their row index. Rows whose coordinates are not finite
    /// numbers are left out of the line.
    pub fn from_table(table: &DataTable) -> Self {
        let categorical = table.rows.iter().any(|(x, _)| matches!(x, Datum::Text(_)));
        let mut points = Vec::with_capacity(table.rows.len());
        let mut x_labels = Vec::new();
        for (i, (x, y)) in table.rows.iter().enumerate() {
            let x = if categorical {
                x_labels.push(x.label());
                Some(i as f64)
            } else {
                x.as_f64()
            };
            match (x, y.as_f64()) {
                (Some(x), Some(y)) if x.is_finite() && y.is_finite() => points.push((x, y)),
                _ => {}
            }
        }
        let skipped = table.rows.len() - points.len();
        if skipped > 0 {
            tracing::debug!(skipped, "rows without numeric coordinates left out of the chart");
        }
        Self { points, x_labels }
    }

    /// Axis ranges covering every point, padded so flat or single-point series stay visible.
    pub fn bounds(&self) -> (Range<f64>, Range<f64>) {
        let (mut x_min, mut x_max) = (f64::INFINITY, f64::NEG_INFINITY);
        let (mut y_min, mut y_max) = (f64::INFINITY, f64::NEG_INFINITY);
        for &(x, y) in &self.points {
            x_min = x_min.min(x);
            x_max = x_max.max(x);
            y_min = y_min.min(y);
            y_max = y_max.max(y);
        }
        if self.points.is_empty() {
            return (0.0..1.0, 0.0..1.0);
        }
        (pad(x_min, x_max), pad(y_min, y_max))
    }
}

fn pad(min: f64, max: f64) -> Range<f64> {
    if max > min {
        let margin = (max - min) / 20.0;
        (min - margin)..(max + margin)
    } else {
        (min - 1.0)..(max + 1.0)
    }
}

fn background_color(background: &str) -> RGBColor {
    match parse_hex(background) {
        Ok((r, g, b)) => RGBColor(r, g, b),
        Err(_) => {
            tracing::warn!(%background, "unsupported background colour, using white");
            WHITE
        }
    }
}

fn draw_line_chart<DB>(
    root: &DrawingArea<DB, Shift>,
    table: &DataTable,
    options: &DrawOptions,
) -> Result<()>
where
    DB: DrawingBackend,
    DB::ErrorType: 'static,
{
    let data = PlotData::from_table(table);
    let (x_range, y_range) = data.bounds();

    root.fill(&background_color(&options.background))
        .map_err(|e| eyre!("chart fill failed: {e}"))?;

    let mut chart = ChartBuilder::on(root)
        .caption(options.title.as_str(), ("sans-serif", 18))
        .margin(20)
        .x_label_area_size(40)
        .y_label_area_size(50)
        .build_cartesian_2d(x_range, y_range)
        .map_err(|e| eyre!("chart layout failed: {e}"))?;

    let labels = &data.x_labels;
    let x_label = |x: &f64| {
        if labels.is_empty() {
            format!("{x}")
        } else {
            let i = x.round();
            if (x - i).abs() < 1e-9 && i >= 0.0 {
                labels.get(i as usize).cloned().unwrap_or_default()
            } else {
                String::new()
            }
        }
    };

    chart
        .configure_mesh()
        .x_desc(options.h_axis_title.as_str())
        .y_desc(options.v_axis_title.as_str())
        .x_label_formatter(&x_label)
        .draw()
        .map_err(|e| eyre!("chart axes failed: {e}"))?;

    chart
        .draw_series(LineSeries::new(data.points.iter().copied(), BLUE))
        .map_err(|e| eyre!("chart series failed: {e}"))?;

    root.present()
        .map_err(|e| eyre!("chart output failed: {e}"))?;
    Ok(())
}

/// Line chart widget producing inline SVG.
#[derive(Debug, Default, Clone, Copy)]
pub struct PlottersLineChart;

impl ChartWidget for PlottersLineChart {
    fn draw(
        &mut self,
        size: (u32, u32),
        table: &DataTable,
        options: &DrawOptions,
    ) -> Result<String> {
        let mut svg = String::new();
        {
            let root = SVGBackend::with_string(&mut svg, size).into_drawing_area();
            draw_line_chart(&root, table, options)?;
        }
        Ok(svg)
    }
}

/// Write chart to PNG using plotters bitmap backend.
pub fn write_chart_png(
    path: &Path,
    table: &DataTable,
    options: &DrawOptions,
    size: (u32, u32),
) -> Result<()> {
    let root = BitMapBackend::new(path, size).into_drawing_area();
    draw_line_chart(&root, table, options)?;
    tracing::info!(path = %path.display(), "wrote chart");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::renderer::{Column, ColumnType};

    fn table(rows: Vec<(Datum, Datum)>, x: ColumnType) -> DataTable {
        DataTable {
            x: Column {
                ty: x,
                label: "X".to_string(),
            },
            y: Column {
                ty: ColumnType::Number,
                label: "Value".to_string(),
            },
            rows,
        }
    }

    #[test]
    fn numeric_rows_become_points() {
        let data = PlotData::from_table(&table(
            vec![
                (Datum::Number(1.0), Datum::Number(10.0)),
                (Datum::Number(f64::NAN), Datum::Number(20.0)),
                (Datum::Number(3.0), Datum::Number(30.0)),
            ],
            ColumnType::Number,
        ));
        assert_eq!(data.points, vec![(1.0, 10.0), (3.0, 30.0)]);
        assert!(data.x_labels.is_empty());
    }

    #[test]
    fn text_x_uses_row_positions() {
        let data = PlotData::from_table(&table(
            vec![
                (Datum::Text("Sales".to_string()), Datum::Number(100.0)),
                (Datum::Text("Costs".to_string()), Datum::Number(40.0)),
            ],
            ColumnType::String,
        ));
        assert_eq!(data.points, vec![(0.0, 100.0), (1.0, 40.0)]);
        assert_eq!(data.x_labels, vec!["Sales", "Costs"]);
    }

    #[test]
    fn bounds_are_padded() {
        let data = PlotData {
            points: vec![(0.0, 5.0)],
            x_labels: Vec::new(),
        };
        assert_eq!(data.bounds(), (-1.0..1.0, 4.0..6.0));

        let data = PlotData {
            points: vec![(0.0, 0.0), (10.0, 100.0)],
            x_labels: Vec::new(),
        };
        let (x, y) = data.bounds();
        assert_eq!(x, -0.5..10.5);
        assert_eq!(y, -5.0..105.0);

        let empty = PlotData {
            points: Vec::new(),
            x_labels: Vec::new(),
        };
        assert_eq!(empty.bounds(), (0.0..1.0, 0.0..1.0));
    }

    #[test]
    fn invalid_background_falls_back_to_white() {
        let black = background_color("#000000");
        assert_eq!((black.0, black.1, black.2), (0, 0, 0));
        let fallback = background_color("transparent");
        assert_eq!((fallback.0, fallback.1, fallback.2), (255, 255, 255));
    }
}
