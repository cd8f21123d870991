//! In-memory HTML element tree implementing [`DocumentPort`].
//!
//! The parser is lenient in the way pages are: unknown tags are kept, stray end tags are
//! dropped, and the implied end tags of table markup (`<td>`, `<tr>`, `<tbody>` left open)
//! are honoured. Text is kept verbatim so `inner_html` returns what the page author wrote.

use regex::{Captures, Regex};
use std::sync::OnceLock;

use crate::document::{DocumentPort, NodeId};

const VOID_ELEMENTS: [&str; 13] = [
    "area", "base", "br", "col", "embed", "hr", "img", "input", "link", "meta", "source",
    "track", "wbr",
];

const RAW_TEXT_ELEMENTS: [&str; 2] = ["script", "style"];

fn tag_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(
            r#"(?s)(?P<comment><!--.*?-->)|(?P<decl><![^>]*>|<\?[^>]*>)|</(?P<close>[A-Za-z][A-Za-z0-9:-]*)\s*>|<(?P<open>[A-Za-z][A-Za-z0-9:-]*)(?P<attrs>(?:\s+[^\s"'>/=]+(?:\s*=\s*(?:"[^"]*"|'[^']*'|[^\s"'=<>`]+))?)*)\s*(?P<selfclose>/?)>"#,
        )
        .expect("tag pattern is valid")
    })
}

fn attr_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r#"([^\s"'>/=]+)(?:\s*=\s*(?:"([^"]*)"|'([^']*)'|([^\s"'=<>`]+)))?"#)
            .expect("attribute pattern is valid")
    })
}

#[derive(Debug, Clone)]
enum NodeKind {
    Document,
    Element {
        tag: String,
        attrs: Vec<(String, String)>,
    },
    Text(String),
    /// Comments and doctypes, serialized untouched.
    Raw(String),
}

#[derive(Debug, Clone)]
struct Node {
    kind: NodeKind,
    parent: Option<usize>,
    children: Vec<usize>,
}

/// A parsed HTML page.
///
/// Nodes live in an arena indexed by [`NodeId`]. Slots are never reused, so a stale handle
/// can't alias a newer node; subtrees dropped by `remove_children` give up their content and
/// keep only an empty slot.
#[derive(Debug, Clone)]
pub struct HtmlDocument {
    nodes: Vec<Node>,
}

impl Default for HtmlDocument {
    fn default() -> Self {
        Self {
            nodes: vec![Node {
                kind: NodeKind::Document,
                parent: None,
                children: Vec::new(),
            }],
        }
    }
}

impl HtmlDocument {
    const ROOT: usize = 0;

    /// Parse a page (or fragment) of markup.
    pub fn parse(markup: &str) -> Self {
        let mut doc = Self::default();
        let mut stack: Vec<usize> = vec![Self::ROOT];
        let mut pos = 0;

        // Each search restarts at `pos`, which skips past script and style bodies.
        while let Some(caps) = tag_regex().captures_at(markup, pos) {
            let Some(whole) = caps.get(0) else { break };
            if whole.start() > pos {
                let parent = *stack.last().unwrap_or(&Self::ROOT);
                doc.push_node(parent, NodeKind::Text(markup[pos..whole.start()].to_string()));
            }
            pos = whole.end();

            if let Some(raw) = caps.name("comment").or_else(|| caps.name("decl")) {
                let parent = *stack.last().unwrap_or(&Self::ROOT);
                doc.push_node(parent, NodeKind::Raw(raw.as_str().to_string()));
            } else if let Some(close) = caps.name("close") {
                doc.close_element(&mut stack, &close.as_str().to_ascii_lowercase());
            } else if let Some(open) = caps.name("open") {
                let tag = open.as_str().to_ascii_lowercase();
                pos = doc.open_element(&mut stack, &tag, &caps, markup, pos);
            }
        }

        if pos < markup.len() {
            let parent = *stack.last().unwrap_or(&Self::ROOT);
            doc.push_node(parent, NodeKind::Text(markup[pos..].to_string()));
        }
        tracing::debug!(nodes = doc.nodes.len(), "parsed html document");
        doc
    }

    /// Handles one start tag and returns the position parsing resumes from.
    fn open_element(
        &mut self,
        stack: &mut Vec<usize>,
        tag: &str,
        caps: &Captures<'_>,
        markup: &str,
        pos: usize,
    ) -> usize {
        self.close_implied(stack, tag);
        let attrs = caps
            .name("attrs")
            .map(|a| parse_attributes(a.as_str()))
            .unwrap_or_default();
        let parent = *stack.last().unwrap_or(&Self::ROOT);
        let id = self.push_node(
            parent,
            NodeKind::Element {
                tag: tag.to_string(),
                attrs,
            },
        );

        let self_closing = caps.name("selfclose").is_some_and(|m| !m.as_str().is_empty());
        if RAW_TEXT_ELEMENTS.contains(&tag) && !self_closing {
            let end_tag = format!("</{tag}");
            let rest = markup[pos..].to_ascii_lowercase();
            let (body_end, resume) = match rest.find(&end_tag) {
                Some(offset) => {
                    let body_end = pos + offset;
                    let resume = markup[body_end..]
                        .find('>')
                        .map(|gt| body_end + gt + 1)
                        .unwrap_or(markup.len());
                    (body_end, resume)
                }
                None => (markup.len(), markup.len()),
            };
            if body_end > pos {
                self.push_node(id, NodeKind::Text(markup[pos..body_end].to_string()));
            }
            return resume;
        }

        if !self_closing && !VOID_ELEMENTS.contains(&tag) {
            stack.push(id);
        }
        pos
    }

    /// Table markup lets cells, rows and row groups close implicitly.
    fn close_implied(&self, stack: &mut Vec<usize>, tag: &str) {
        let closes: &[&str] = match tag {
            "td" | "th" => &["td", "th"],
            "tr" => &["td", "th", "tr"],
            "thead" | "tbody" | "tfoot" => &["td", "th", "tr", "thead", "tbody", "tfoot"],
            "li" => &["li"],
            _ => return,
        };
        while let Some(&top) = stack.last() {
            if top == Self::ROOT {
                break;
            }
            match self.element_tag(top) {
                Some(t) if closes.contains(&t) => {
                    stack.pop();
                }
                _ => break,
            }
        }
    }

    fn close_element(&self, stack: &mut Vec<usize>, tag: &str) {
        let open = stack
            .iter()
            .rposition(|&n| n != Self::ROOT && self.element_tag(n) == Some(tag));
        match open {
            Some(index) => stack.truncate(index),
            None => tracing::debug!(tag, "dropping end tag without matching start tag"),
        }
    }

    fn push_node(&mut self, parent: usize, kind: NodeKind) -> usize {
        let id = self.nodes.len();
        self.nodes.push(Node {
            kind,
            parent: Some(parent),
            children: Vec::new(),
        });
        self.nodes[parent].children.push(id);
        id
    }

    fn element_tag(&self, node: usize) -> Option<&str> {
        match &self.nodes.get(node)?.kind {
            NodeKind::Element { tag, .. } => Some(tag.as_str()),
            _ => None,
        }
    }

    fn attrs_mut(&mut self, node: NodeId) -> Option<&mut Vec<(String, String)>> {
        match &mut self.nodes.get_mut(node.0)?.kind {
            NodeKind::Element { attrs, .. } => Some(attrs),
            _ => None,
        }
    }

    fn detach(&mut self, node: usize) {
        if let Some(parent) = self.nodes[node].parent.take() {
            self.nodes[parent].children.retain(|&c| c != node);
        }
    }

    /// Drop the content of a detached subtree.
    fn release(&mut self, node: usize) {
        let mut pending = vec![node];
        while let Some(n) = pending.pop() {
            let slot = &mut self.nodes[n];
            slot.kind = NodeKind::Raw(String::new());
            pending.append(&mut slot.children);
        }
    }

    /// Copy the children of `from` in `source` below `parent`.
    fn graft(&mut self, source: &HtmlDocument, from: usize, parent: usize) {
        for &child in &source.nodes[from].children {
            let id = self.push_node(parent, source.nodes[child].kind.clone());
            self.graft(source, child, id);
        }
    }

    fn collect_descendants(&self, root: usize, tag: &str, out: &mut Vec<NodeId>) {
        for &child in &self.nodes[root].children {
            if self.element_tag(child) == Some(tag) {
                out.push(NodeId(child));
            }
            self.collect_descendants(child, tag, out);
        }
    }

    fn serialize_into(&self, node: usize, out: &mut String) {
        match &self.nodes[node].kind {
            NodeKind::Document => self.serialize_children(node, out),
            NodeKind::Text(text) | NodeKind::Raw(text) => out.push_str(text),
            NodeKind::Element { tag, attrs } => {
                out.push('<');
                out.push_str(tag);
                for (name, value) in attrs {
                    out.push(' ');
                    out.push_str(name);
                    out.push_str("=\"");
                    out.push_str(&escape_attribute(value));
                    out.push('"');
                }
                out.push('>');
                if VOID_ELEMENTS.contains(&tag.as_str()) {
                    return;
                }
                self.serialize_children(node, out);
                out.push_str("</");
                out.push_str(tag);
                out.push('>');
            }
        }
    }

    fn serialize_children(&self, node: usize, out: &mut String) {
        for &child in &self.nodes[node].children {
            self.serialize_into(child, out);
        }
    }

    /// Serialize the whole document back to markup.
    pub fn to_html(&self) -> String {
        let mut out = String::new();
        self.serialize_into(Self::ROOT, &mut out);
        out
    }

    /// Concatenated text below `node`, tags stripped.
    pub fn text_content(&self, node: NodeId) -> String {
        let mut out = String::new();
        self.collect_text(node.0, &mut out);
        out
    }

    fn collect_text(&self, node: usize, out: &mut String) {
        let Some(n) = self.nodes.get(node) else { return };
        match &n.kind {
            NodeKind::Text(text) => out.push_str(text),
            NodeKind::Raw(_) => {}
            _ => {
                for &child in &n.children {
                    self.collect_text(child, out);
                }
            }
        }
    }
}

fn parse_attributes(source: &str) -> Vec<(String, String)> {
    attr_regex()
        .captures_iter(source)
        .filter_map(|caps| {
            let name = caps.get(1)?.as_str().to_ascii_lowercase();
            let value = caps
                .get(2)
                .or_else(|| caps.get(3))
                .or_else(|| caps.get(4))
                .map(|m| unescape_attribute(m.as_str()))
                .unwrap_or_default();
            Some((name, value))
        })
        .collect()
}

fn unescape_attribute(value: &str) -> String {
    value
        .replace("&quot;", "\"")
        .replace("&#39;", "'")
        .replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&amp;", "&")
}

fn escape_attribute(value: &str) -> String {
    value.replace('&', "&amp;").replace('"', "&quot;")
}

fn parse_style(style: &str) -> Vec<(String, String)> {
    style
        .split(';')
        .filter_map(|decl| {
            let (prop, value) = decl.split_once(':')?;
            let prop = prop.trim();
            if prop.is_empty() {
                return None;
            }
            Some((prop.to_ascii_lowercase(), value.trim().to_string()))
        })
        .collect()
}

impl DocumentPort for HtmlDocument {
    fn get_by_id(&self, id: &str) -> Option<NodeId> {
        let mut stack = vec![Self::ROOT];
        while let Some(node) = stack.pop() {
            if let NodeKind::Element { attrs, .. } = &self.nodes[node].kind {
                if attrs.iter().any(|(k, v)| k == "id" && v == id) {
                    return Some(NodeId(node));
                }
            }
            stack.extend(self.nodes[node].children.iter().rev());
        }
        None
    }

    fn query_by_tag(&self, tag: &str) -> Vec<NodeId> {
        let mut out = Vec::new();
        self.collect_descendants(Self::ROOT, &tag.to_ascii_lowercase(), &mut out);
        out
    }

    fn descendants_by_tag(&self, root: NodeId, tag: &str) -> Vec<NodeId> {
        let mut out = Vec::new();
        if root.0 < self.nodes.len() {
            self.collect_descendants(root.0, &tag.to_ascii_lowercase(), &mut out);
        }
        out
    }

    fn children(&self, node: NodeId) -> Vec<NodeId> {
        self.nodes
            .get(node.0)
            .map(|n| {
                n.children
                    .iter()
                    .filter(|&&c| self.element_tag(c).is_some())
                    .map(|&c| NodeId(c))
                    .collect()
            })
            .unwrap_or_default()
    }

    fn tag_name(&self, node: NodeId) -> String {
        self.element_tag(node.0).unwrap_or_default().to_string()
    }

    fn inner_html(&self, node: NodeId) -> String {
        let mut out = String::new();
        if node.0 < self.nodes.len() {
            self.serialize_children(node.0, &mut out);
        }
        out
    }

    fn attribute(&self, node: NodeId, name: &str) -> Option<String> {
        match &self.nodes.get(node.0)?.kind {
            NodeKind::Element { attrs, .. } => attrs
                .iter()
                .find(|(k, _)| k == name)
                .map(|(_, v)| v.clone()),
            _ => None,
        }
    }

    fn set_attribute(&mut self, node: NodeId, name: &str, value: &str) {
        let Some(attrs) = self.attrs_mut(node) else { return };
        match attrs.iter_mut().find(|(k, _)| k == name) {
            Some(slot) => slot.1 = value.to_string(),
            None => attrs.push((name.to_string(), value.to_string())),
        }
    }

    fn set_style(&mut self, node: NodeId, property: &str, value: Option<&str>) {
        let property = property.to_ascii_lowercase();
        let mut decls = parse_style(&self.attribute(node, "style").unwrap_or_default());
        decls.retain(|(p, _)| *p != property);
        if let Some(value) = value {
            decls.push((property, value.to_string()));
        }
        let style = decls
            .iter()
            .map(|(p, v)| format!("{p}: {v}"))
            .collect::<Vec<_>>()
            .join("; ");
        if !style.is_empty() {
            self.set_attribute(node, "style", &style);
        } else if let Some(attrs) = self.attrs_mut(node) {
            attrs.retain(|(k, _)| k != "style");
        }
    }

    fn style(&self, node: NodeId, property: &str) -> Option<String> {
        let property = property.to_ascii_lowercase();
        parse_style(&self.attribute(node, "style")?)
            .into_iter()
            .find(|(p, _)| *p == property)
            .map(|(_, v)| v)
    }

    fn class_names(&self, node: NodeId) -> Vec<String> {
        self.attribute(node, "class")
            .map(|c| c.split_whitespace().map(str::to_string).collect())
            .unwrap_or_default()
    }

    fn add_class(&mut self, node: NodeId, class: &str) {
        let mut classes = self.class_names(node);
        if classes.iter().any(|c| c == class) {
            return;
        }
        classes.push(class.to_string());
        self.set_attribute(node, "class", &classes.join(" "));
    }

    fn remove_class(&mut self, node: NodeId, class: &str) {
        let classes = self.class_names(node);
        if !classes.iter().any(|c| c == class) {
            return;
        }
        let kept: Vec<String> = classes.into_iter().filter(|c| c != class).collect();
        self.set_attribute(node, "class", &kept.join(" "));
    }

    fn create_element(&mut self, tag: &str) -> NodeId {
        let id = self.nodes.len();
        self.nodes.push(Node {
            kind: NodeKind::Element {
                tag: tag.to_ascii_lowercase(),
                attrs: Vec::new(),
            },
            parent: None,
            children: Vec::new(),
        });
        NodeId(id)
    }

    fn append_child(&mut self, parent: NodeId, child: NodeId) {
        if parent.0 >= self.nodes.len() || child.0 >= self.nodes.len() || parent == child {
            return;
        }
        self.detach(child.0);
        self.nodes[child.0].parent = Some(parent.0);
        self.nodes[parent.0].children.push(child.0);
    }

    fn remove_children(&mut self, node: NodeId) {
        let Some(n) = self.nodes.get_mut(node.0) else { return };
        let children = std::mem::take(&mut n.children);
        for child in children {
            self.nodes[child].parent = None;
            self.release(child);
        }
    }

    fn append_markup(&mut self, node: NodeId, markup: &str) {
        if node.0 < self.nodes.len() {
            let fragment = HtmlDocument::parse(markup);
            self.graft(&fragment, Self::ROOT, node.0);
        }
    }
}
