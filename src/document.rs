//! The document capabilities the pivot view needs from its host page.
//!
//! The controller and the renderer never reach for a global document. They are handed
//! something implementing [`DocumentPort`], which keeps them testable without a browser.
//! [`crate::html::HtmlDocument`] is the in-memory implementation.

use std::fmt;

/// Handle to an element owned by a [`DocumentPort`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(pub usize);

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

pub trait DocumentPort {
    /// Element lookup by `id` attribute.
    fn get_by_id(&self, id: &str) -> Option<NodeId>;

    /// Every element with `tag` in the document, in document order.
    fn query_by_tag(&self, tag: &str) -> Vec<NodeId>;

    /// Every element with `tag` below `root` (excluding `root`), in document order.
    fn descendants_by_tag(&self, root: NodeId, tag: &str) -> Vec<NodeId>;

    /// Direct child elements of `node`.
    fn children(&self, node: NodeId) -> Vec<NodeId>;

    /// Lowercase tag name.
    fn tag_name(&self, node: NodeId) -> String;

    /// Markup of the node's content.
    fn inner_html(&self, node: NodeId) -> String;

    fn attribute(&self, node: NodeId, name: &str) -> Option<String>;

    fn set_attribute(&mut self, node: NodeId, name: &str, value: &str);

    /// Sets (`Some`) or removes (`None`) one inline style property.
    fn set_style(&mut self, node: NodeId, property: &str, value: Option<&str>);

    fn style(&self, node: NodeId, property: &str) -> Option<String>;

    fn class_names(&self, node: NodeId) -> Vec<String>;

    fn add_class(&mut self, node: NodeId, class: &str);

    fn remove_class(&mut self, node: NodeId, class: &str);

    /// Creates a detached element.
    fn create_element(&mut self, tag: &str) -> NodeId;

    /// Appends `child` to `parent`, detaching it from its previous parent first.
    fn append_child(&mut self, parent: NodeId, child: NodeId);

    /// Detaches every child node (elements and text) of `node`.
    fn remove_children(&mut self, node: NodeId);

    /// Parses `markup` (e.g. an SVG document) and appends the result as content of `node`.
    fn append_markup(&mut self, node: NodeId, markup: &str);

    fn has_class(&self, node: NodeId, class: &str) -> bool {
        self.class_names(node).iter().any(|c| c == class)
    }
}
