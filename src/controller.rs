//! Wires every row and column header of the pivot table to a chart pane.
//!
//! Each header gets a [`HeaderLink`]: the opposite axis's key texts, the value cells of its
//! row or column, and the pane the chart goes to. Activating a link checks that the two
//! sequences line up, points a fresh frame in the pane at the encoded request, and moves the
//! axis highlight to the header and its cells.

use color_eyre::Result;
use std::fmt;

use crate::channel::{self, SelectionRequest};
use crate::config::{ChartConfig, ChartOptions};
use crate::document::{DocumentPort, NodeId};
use crate::error::DoubleChartError;
use crate::grid::{CellRef, GridModel};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Axis {
    Row,
    Column,
}

impl Axis {
    pub const ALL: [Self; 2] = [Self::Row, Self::Column];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Row => "row",
            Self::Column => "column",
        }
    }
}

impl fmt::Display for Axis {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Everything a header's click needs, captured when the link is installed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HeaderLink {
    pub axis: Axis,
    pub index: usize,
    /// The header cell; it carries the highlight.
    pub header: NodeId,
    /// The `<a>` installed inside the header.
    pub proxy: NodeId,
    /// Key texts of the opposite axis, in that axis's order.
    pub key_texts: Vec<String>,
    /// Cells of this header's row or column, in the opposite axis's order.
    pub value_refs: Vec<CellRef>,
    /// Pane the chart frame is placed in.
    pub target: NodeId,
    pub x_axis_title: String,
    pub y_axis_title: String,
    pub title: String,
    /// Opaque link address (`href` of the proxy, first fragment segment of the frame).
    pub token: String,
}

/// Result of one activation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Selection {
    pub axis: Axis,
    pub index: usize,
    pub request: SelectionRequest,
    /// `src` of the frame placed in the pane.
    pub src: String,
    pub frame: NodeId,
}

/// Highlight state of one axis.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SelectionState {
    class_name: String,
    active: Vec<NodeId>,
    selected: Option<usize>,
}

impl SelectionState {
    pub fn new(class_name: impl Into<String>) -> Self {
        Self {
            class_name: class_name.into(),
            active: Vec::new(),
            selected: None,
        }
    }

    pub fn class_name(&self) -> &str {
        &self.class_name
    }

    /// Header and value cells currently highlighted.
    pub fn active_elements(&self) -> &[NodeId] {
        &self.active
    }

    /// Index of the selected header; `None` before the first activation.
    pub fn selected(&self) -> Option<usize> {
        self.selected
    }

    /// Remove the axis class from the tracked elements and from every table cell that
    /// still carries it.
    pub fn clear<D: DocumentPort + ?Sized>(&mut self, doc: &mut D) {
        for node in self.active.drain(..) {
            doc.remove_class(node, &self.class_name);
        }
        for tag in ["td", "th"] {
            for node in doc.query_by_tag(tag) {
                doc.remove_class(node, &self.class_name);
            }
        }
        self.selected = None;
    }

    /// Replace the selection with `header` and `values`.
    pub fn select<D: DocumentPort + ?Sized>(
        &mut self,
        doc: &mut D,
        index: usize,
        header: NodeId,
        values: &[NodeId],
    ) {
        self.clear(doc);
        doc.add_class(header, &self.class_name);
        self.active.push(header);
        for &node in values {
            doc.add_class(node, &self.class_name);
            if !self.active.contains(&node) {
                self.active.push(node);
            }
        }
        self.selected = Some(index);
    }
}

pub struct LinkController {
    config: ChartConfig,
    grid: GridModel,
    row_links: Vec<HeaderLink>,
    col_links: Vec<HeaderLink>,
    row_state: SelectionState,
    col_state: SelectionState,
    last_row: Option<Selection>,
    last_col: Option<Selection>,
}

impl LinkController {
    pub fn new(config: ChartConfig) -> Self {
        let row_state = SelectionState::new(config.selected_row_class_name.clone());
        let col_state = SelectionState::new(config.selected_col_class_name.clone());
        Self {
            config,
            grid: GridModel::default(),
            row_links: Vec::new(),
            col_links: Vec::new(),
            row_state,
            col_state,
            last_row: None,
            last_col: None,
        }
    }

    /// Validate `options` and construct. Fails when a required option is missing.
    pub fn from_options(options: ChartOptions) -> Result<Self> {
        Ok(Self::new(options.build()?))
    }

    pub fn config(&self) -> &ChartConfig {
        &self.config
    }

    pub fn grid(&self) -> &GridModel {
        &self.grid
    }

    pub fn links(&self, axis: Axis) -> &[HeaderLink] {
        match axis {
            Axis::Row => &self.row_links,
            Axis::Column => &self.col_links,
        }
    }

    pub fn selection(&self, axis: Axis) -> &SelectionState {
        match axis {
            Axis::Row => &self.row_state,
            Axis::Column => &self.col_state,
        }
    }

    pub fn last_selection(&self, axis: Axis) -> Option<&Selection> {
        match axis {
            Axis::Row => self.last_row.as_ref(),
            Axis::Column => self.last_col.as_ref(),
        }
    }

    fn element<D: DocumentPort + ?Sized>(doc: &D, id: &str) -> Result<NodeId> {
        doc.get_by_id(id)
            .ok_or_else(|| DoubleChartError::ElementNotFound(id.to_string()).into())
    }

    /// Parse the table, install a link on every header and, with auto-load, activate the
    /// first header of each axis.
    pub fn load<D: DocumentPort + ?Sized>(&mut self, doc: &mut D) -> Result<()> {
        let table = Self::element(&*doc, &self.config.table_id)?;
        let row_pane = Self::element(&*doc, &self.config.row_pane_id)?;
        let col_pane = Self::element(&*doc, &self.config.col_pane_id)?;

        self.grid = GridModel::parse(&*doc, table);
        let row_key_strings: Vec<String> =
            self.grid.col_keys().iter().map(|k| k.text.clone()).collect();
        let col_key_strings: Vec<String> =
            self.grid.row_keys().iter().map(|k| k.text.clone()).collect();

        let mut row_links = Vec::with_capacity(self.grid.row_keys().len());
        for (i, key) in self.grid.row_keys().iter().enumerate() {
            let link = HeaderLink::install(
                doc,
                Axis::Row,
                i,
                key,
                row_key_strings.clone(),
                self.grid.row_values_at(i).to_vec(),
                row_pane,
                &self.config.cols_title,
                &self.config.rows_title,
            );
            row_links.push(link);
        }

        let mut col_links = Vec::with_capacity(self.grid.col_keys().len());
        for (j, key) in self.grid.col_keys().iter().enumerate() {
            let link = HeaderLink::install(
                doc,
                Axis::Column,
                j,
                key,
                col_key_strings.clone(),
                self.grid.col_values_at(j).into_iter().cloned().collect(),
                col_pane,
                &self.config.rows_title,
                &self.config.cols_title,
            );
            col_links.push(link);
        }

        tracing::info!(
            rows = row_links.len(),
            cols = col_links.len(),
            table = %self.config.table_id,
            "installed chart links"
        );
        self.row_links = row_links;
        self.col_links = col_links;

        if self.config.auto_load {
            for axis in Axis::ALL {
                if !self.links(axis).is_empty() {
                    self.click(doc, axis, 0)?;
                }
            }
        }
        Ok(())
    }

    /// Activate the header at `index` on `axis`.
    pub fn click<D: DocumentPort + ?Sized>(
        &mut self,
        doc: &mut D,
        axis: Axis,
        index: usize,
    ) -> Result<Selection> {
        let link = self
            .links(axis)
            .get(index)
            .cloned()
            .ok_or(DoubleChartError::UnknownHeader { axis, index })?;
        self.activate(doc, &link)
    }

    /// Activate the link whose header or proxy is `node`.
    pub fn click_node<D: DocumentPort + ?Sized>(
        &mut self,
        doc: &mut D,
        node: NodeId,
    ) -> Result<Option<Selection>> {
        let found = Axis::ALL.into_iter().find_map(|axis| {
            self.links(axis)
                .iter()
                .find(|l| l.header == node || l.proxy == node)
                .cloned()
        });
        match found {
            Some(link) => self.activate(doc, &link).map(Some),
            None => Ok(None),
        }
    }

    /// Build the request for `link`, send it to the pane and move the highlight.
    pub fn activate<D: DocumentPort + ?Sized>(
        &mut self,
        doc: &mut D,
        link: &HeaderLink,
    ) -> Result<Selection> {
        if link.key_texts.len() != link.value_refs.len() {
            tracing::error!(
                axis = %link.axis,
                index = link.index,
                keys = link.key_texts.len(),
                values = link.value_refs.len(),
                "header keys and values do not line up"
            );
            return Err(DoubleChartError::LengthMismatch {
                keys: link.key_texts.len(),
                values: link.value_refs.len(),
            }
            .into());
        }

        let request = SelectionRequest {
            rows: link
                .key_texts
                .iter()
                .zip(&link.value_refs)
                .map(|(key, value)| (key.clone(), value.text.clone()))
                .collect(),
            x_axis_title: link.x_axis_title.clone(),
            y_axis_title: link.y_axis_title.clone(),
            title: link.title.clone(),
        };
        let src = channel::frame_url(&self.config.panel_url, &link.token, &request);

        doc.remove_children(link.target);
        let frame = doc.create_element("iframe");
        doc.set_attribute(frame, "src", &src);
        doc.set_style(frame, "width", Some(self.config.chart_width.as_str()));
        doc.set_style(frame, "height", Some(self.config.chart_height.as_str()));
        doc.set_style(frame, "border", Some("0"));
        doc.set_style(link.target, "display", None);
        doc.append_child(link.target, frame);

        let values: Vec<NodeId> = link.value_refs.iter().map(|c| c.node).collect();
        let state = match link.axis {
            Axis::Row => &mut self.row_state,
            Axis::Column => &mut self.col_state,
        };
        state.select(doc, link.index, link.header, &values);

        tracing::info!(axis = %link.axis, index = link.index, title = %link.title, "selected");
        let selection = Selection {
            axis: link.axis,
            index: link.index,
            request,
            src,
            frame,
        };
        match link.axis {
            Axis::Row => self.last_row = Some(selection.clone()),
            Axis::Column => self.last_col = Some(selection.clone()),
        }
        Ok(selection)
    }
}

impl HeaderLink {
    /// Describe the header and replace its content with a proxy link showing the same markup.
    #[allow(clippy::too_many_arguments)]
    fn install<D: DocumentPort + ?Sized>(
        doc: &mut D,
        axis: Axis,
        index: usize,
        key: &CellRef,
        key_texts: Vec<String>,
        value_refs: Vec<CellRef>,
        target: NodeId,
        x_axis_title: &str,
        y_axis_title: &str,
    ) -> Self {
        let values: Vec<String> = value_refs.iter().map(|c| c.text.clone()).collect();
        let token = channel::link_token(&key_texts, &values);

        let proxy = doc.create_element("a");
        doc.set_attribute(proxy, "href", &format!("#{token}"));
        let markup = doc.inner_html(key.node);
        doc.remove_children(key.node);
        doc.append_markup(proxy, &markup);
        doc.append_child(key.node, proxy);
        tracing::debug!(%axis, index, header = %key.text, "installed link");

        Self {
            axis,
            index,
            header: key.node,
            proxy,
            key_texts,
            value_refs,
            target,
            x_axis_title: x_axis_title.to_string(),
            y_axis_title: y_axis_title.to_string(),
            title: format!("{} = {}", y_axis_title, key.text),
            token,
        }
    }
}
