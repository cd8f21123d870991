//! Row keys, column keys and value cells of a rendered pivot table.
//!
//! The layout is the conventional one: the first row holds the column keys (after a corner
//! label cell), the first cell of every following row holds that row's key, and the rest of
//! the row holds its values.

use crate::document::{DocumentPort, NodeId};

/// A table cell and the markup it displayed when the table was parsed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CellRef {
    pub node: NodeId,
    pub text: String,
}

/// Logical view of a pivot table. Built once, read-only afterwards.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GridModel {
    column_keys: Vec<CellRef>,
    row_keys: Vec<CellRef>,
    cells: Vec<Vec<CellRef>>,
}

fn cell_ref<D: DocumentPort + ?Sized>(doc: &D, node: NodeId) -> CellRef {
    CellRef {
        node,
        text: doc.inner_html(node),
    }
}

fn cells_with_tag<D: DocumentPort + ?Sized>(doc: &D, tr: NodeId, tags: &[&str]) -> Vec<NodeId> {
    doc.children(tr)
        .into_iter()
        .filter(|&c| tags.contains(&doc.tag_name(c).as_str()))
        .collect()
}

impl GridModel {
    /// Parse the table element `table`. An empty table yields an empty model.
    pub fn parse<D: DocumentPort + ?Sized>(doc: &D, table: NodeId) -> Self {
        let rows = doc.descendants_by_tag(table, "tr");
        let Some((&header, body)) = rows.split_first() else {
            tracing::debug!(%table, "table has no rows");
            return Self::default();
        };

        let mut header_cells = cells_with_tag(doc, header, &["td"]);
        if header_cells.is_empty() {
            header_cells = cells_with_tag(doc, header, &["th"]);
        }
        let column_keys: Vec<CellRef> = header_cells
            .into_iter()
            .skip(1)
            .map(|n| cell_ref(doc, n))
            .collect();

        let mut row_keys = Vec::with_capacity(body.len());
        let mut cells = Vec::with_capacity(body.len());
        for &tr in body {
            let row_cells = cells_with_tag(doc, tr, &["td", "th"]);
            let Some((&key, values)) = row_cells.split_first() else {
                continue;
            };
            row_keys.push(cell_ref(doc, key));
            cells.push(values.iter().map(|&n| cell_ref(doc, n)).collect::<Vec<_>>());
        }

        let model = Self {
            column_keys,
            row_keys,
            cells,
        };
        if !model.is_rectangular() {
            tracing::warn!(
                columns = model.column_keys.len(),
                "table rows do not all have one value per column key"
            );
        }
        tracing::debug!(
            rows = model.num_rows(),
            cols = model.num_cols(),
            "parsed pivot table"
        );
        model
    }

    pub fn num_rows(&self) -> usize {
        self.cells.len()
    }

    /// Width of the first value row; 0 when the table has no value rows.
    pub fn num_cols(&self) -> usize {
        self.cells.first().map_or(0, Vec::len)
    }

    pub fn row_key_at(&self, index: usize) -> Option<&CellRef> {
        self.row_keys.get(index)
    }

    pub fn col_key_at(&self, index: usize) -> Option<&CellRef> {
        self.column_keys.get(index)
    }

    pub fn row_keys(&self) -> &[CellRef] {
        &self.row_keys
    }

    pub fn col_keys(&self) -> &[CellRef] {
        &self.column_keys
    }

    /// Value cell at the row and column whose key texts match. Linear in the key counts.
    pub fn cell_at(&self, row_text: &str, col_text: &str) -> Option<&CellRef> {
        let r = self.row_keys.iter().position(|k| k.text == row_text)?;
        let c = self.column_keys.iter().position(|k| k.text == col_text)?;
        self.cells.get(r)?.get(c)
    }

    /// The whole row, ordered by column index.
    pub fn row_values_at(&self, index: usize) -> &[CellRef] {
        self.cells.get(index).map_or(&[], Vec::as_slice)
    }

    /// The whole column, one cell per row that reaches `index`.
    pub fn col_values_at(&self, index: usize) -> Vec<&CellRef> {
        self.cells.iter().filter_map(|row| row.get(index)).collect()
    }

    /// Every row has exactly one value per column key.
    pub fn is_rectangular(&self) -> bool {
        self.cells.iter().all(|row| row.len() == self.column_keys.len())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::html::HtmlDocument;

    fn parse(markup: &str) -> (HtmlDocument, GridModel) {
        let doc = HtmlDocument::parse(markup);
        let table = doc.query_by_tag("table")[0];
        let grid = GridModel::parse(&doc, table);
        (doc, grid)
    }

    const SALES: &str = "<table>\
        <tr><th></th><th>Sales</th><th>Costs</th></tr>\
        <tr><td>Jan</td><td>100</td><td>40</td></tr>\
        <tr><td>Feb</td><td>120</td><td>45</td></tr>\
        <tr><td>Mar</td><td>90</td><td>50</td></tr>\
        </table>";

    #[test]
    fn dimensions_and_keys() {
        let (_, grid) = parse(SALES);
        assert_eq!(grid.num_rows(), 3);
        assert_eq!(grid.num_cols(), 2);
        assert_eq!(grid.row_key_at(0).map(|k| k.text.as_str()), Some("Jan"));
        assert_eq!(grid.col_key_at(1).map(|k| k.text.as_str()), Some("Costs"));
        assert!(grid.row_key_at(3).is_none());
        assert!(grid.is_rectangular());
    }

    #[test]
    fn row_values_agree_with_cell_lookup() {
        let (_, grid) = parse(SALES);
        for i in 0..grid.num_rows() {
            for j in 0..grid.num_cols() {
                let row_key = &grid.row_key_at(i).unwrap().text;
                let col_key = &grid.col_key_at(j).unwrap().text;
                assert_eq!(
                    Some(&grid.row_values_at(i)[j]),
                    grid.cell_at(row_key, col_key)
                );
            }
        }
    }

    #[test]
    fn column_values_follow_row_order() {
        let (_, grid) = parse(SALES);
        let texts: Vec<&str> = grid
            .col_values_at(0)
            .iter()
            .map(|c| c.text.as_str())
            .collect();
        assert_eq!(texts, vec!["100", "120", "90"]);
        assert!(grid.col_values_at(5).is_empty());
    }

    #[test]
    fn header_row_prefers_data_cells() {
        let (_, grid) = parse(
            "<table><tr><th>ignored</th><td>corner</td><td>A</td></tr>\
             <tr><td>r</td><td>1</td></tr></table>",
        );
        assert_eq!(grid.col_keys().len(), 1);
        assert_eq!(grid.col_key_at(0).unwrap().text, "A");
    }

    #[test]
    fn row_header_cells_may_be_th() {
        let (_, grid) = parse(
            "<table><thead><tr><th></th><th>X</th></tr></thead>\
             <tbody><tr><th>r1</th><td>5</td></tr></tbody></table>",
        );
        assert_eq!(grid.row_key_at(0).unwrap().text, "r1");
        assert_eq!(grid.row_values_at(0)[0].text, "5");
    }

    #[test]
    fn empty_table_reports_zero() {
        let (_, grid) = parse("<table></table>");
        assert_eq!(grid.num_rows(), 0);
        assert_eq!(grid.num_cols(), 0);
        assert!(grid.row_values_at(0).is_empty());
        assert!(grid.cell_at("a", "b").is_none());
    }

    #[test]
    fn header_only_table_has_keys_but_no_values() {
        let (_, grid) = parse("<table><tr><th></th><th>A</th><th>B</th></tr></table>");
        assert_eq!(grid.col_keys().len(), 2);
        assert_eq!(grid.num_rows(), 0);
        assert_eq!(grid.num_cols(), 0);
    }

    #[test]
    fn ragged_rows_are_kept() {
        let (_, grid) = parse(
            "<table><tr><th></th><th>A</th><th>B</th></tr>\
             <tr><td>r1</td><td>1</td><td>2</td></tr>\
             <tr><td>r2</td><td>3</td></tr></table>",
        );
        assert!(!grid.is_rectangular());
        assert_eq!(grid.row_values_at(1).len(), 1);
        assert_eq!(grid.col_values_at(1).len(), 1);
    }

    #[test]
    fn cell_text_is_inner_markup() {
        let (_, grid) = parse(
            "<table><tr><th></th><th><b>A</b></th></tr><tr><td>r</td><td> 7 </td></tr></table>",
        );
        assert_eq!(grid.col_key_at(0).unwrap().text, "<b>A</b>");
        assert_eq!(grid.cell_at("r", "<b>A</b>").unwrap().text, " 7 ");
    }
}
