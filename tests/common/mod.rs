#![allow(dead_code)]

use color_eyre::Result;
use doublechart::renderer::{ChartWidget, DataTable, DrawOptions};
use doublechart::ChartOptions;

/// Three months by two measures, with a pane for each axis.
pub const SALES_PAGE: &str = r#"<!DOCTYPE html>
<html>
<head><title>Sales</title></head>
<body>
<table id="pivot">
  <tr><th>Month</th><th>Sales</th><th>Costs</th></tr>
  <tr><th>Jan</th><td>100</td><td>40</td></tr>
  <tr><th>Feb</th><td>120</td><td>45</td></tr>
  <tr><th>Mar</th><td>90</td><td>50</td></tr>
</table>
<div id="row-pane" style="display: none"></div>
<div id="col-pane" style="display: none"></div>
</body>
</html>
"#;

/// Header row longer than the value rows.
pub const RAGGED_PAGE: &str = r#"<table id="pivot">
<tr><td></td><td>A</td><td>B</td><td>C</td></tr>
<tr><td>r1</td><td>1</td><td>2</td></tr>
</table>
<div id="row-pane"></div><div id="col-pane"></div>"#;

/// Headers carrying markup and characters that need escaping in a fragment.
pub const MARKUP_PAGE: &str = r#"<table id="pivot">
<tr><td>&nbsp;</td><td><b>Q1</b></td><td>Q2 &amp; Q3</td></tr>
<tr><td><i>North</i></td><td>1.5</td><td>n/a</td></tr>
</table>
<div id="row-pane"></div><div id="col-pane"></div>"#;

pub fn options() -> ChartOptions {
    ChartOptions {
        row_pane_id: Some("row-pane".to_string()),
        col_pane_id: Some("col-pane".to_string()),
        table_id: Some("pivot".to_string()),
        ..Default::default()
    }
}

/// Chart widget double that records every draw request.
#[derive(Default)]
pub struct RecordingWidget {
    pub calls: Vec<((u32, u32), DataTable, DrawOptions)>,
}

impl ChartWidget for RecordingWidget {
    fn draw(
        &mut self,
        size: (u32, u32),
        table: &DataTable,
        options: &DrawOptions,
    ) -> Result<String> {
        self.calls.push((size, table.clone(), options.clone()));
        Ok(format!("<svg data-points=\"{}\"></svg>", table.rows.len()))
    }
}
