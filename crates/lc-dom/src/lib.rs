//! DOM tree data structures.
//!
//! Nodes live in an arena owned by [`Document`] and are addressed by
//! [`NodeId`]. Detaching a node unlinks it from its parent but keeps it in the
//! arena, so ids held elsewhere stay valid (just disconnected).

/// ID used to address nodes in the DOM arena.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(usize);

impl NodeId {
    pub fn index(self) -> usize {
        self.0
    }
}

/// Element payload: tag, ordered attributes and the `<style>` sheet state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ElementData {
    tag: String,
    attrs: Vec<(String, String)>,
    sheet_disabled: bool,
}

impl ElementData {
    fn new(tag: &str) -> Self {
        Self {
            tag: tag.to_ascii_lowercase(),
            attrs: Vec::new(),
            sheet_disabled: false,
        }
    }

    pub fn tag(&self) -> &str {
        &self.tag
    }

    pub fn attrs(&self) -> &[(String, String)] {
        &self.attrs
    }

    pub fn attribute(&self, name: &str) -> Option<&str> {
        self.attrs
            .iter()
            .find(|(key, _)| key.eq_ignore_ascii_case(name))
            .map(|(_, value)| value.as_str())
    }

    pub fn has_class(&self, class: &str) -> bool {
        self.attribute("class")
            .is_some_and(|value| value.split_ascii_whitespace().any(|item| item == class))
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NodeData {
    Element(ElementData),
    Text(String),
}

#[derive(Debug, Clone)]
struct Node {
    parent: Option<NodeId>,
    children: Vec<NodeId>,
    data: NodeData,
}

/// Document arena rooted at `<html>` with `<head>` and `<body>` always present.
#[derive(Debug, Clone)]
pub struct Document {
    pub title: String,
    nodes: Vec<Node>,
    root: NodeId,
    head: NodeId,
    body: NodeId,
}

impl Default for Document {
    fn default() -> Self {
        Self::new()
    }
}

impl Document {
    pub fn new() -> Self {
        let mut doc = Self {
            title: String::new(),
            nodes: Vec::new(),
            root: NodeId(0),
            head: NodeId(0),
            body: NodeId(0),
        };

        doc.root = doc.create_element("html");
        doc.head = doc.create_element("head");
        doc.body = doc.create_element("body");
        doc.append_child(doc.root, doc.head);
        doc.append_child(doc.root, doc.body);
        doc
    }

    pub fn root(&self) -> NodeId {
        self.root
    }

    pub fn head(&self) -> NodeId {
        self.head
    }

    pub fn body(&self) -> NodeId {
        self.body
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    pub fn create_element(&mut self, tag: &str) -> NodeId {
        self.push_node(NodeData::Element(ElementData::new(tag)))
    }

    pub fn create_text(&mut self, text: impl Into<String>) -> NodeId {
        self.push_node(NodeData::Text(text.into()))
    }

    fn push_node(&mut self, data: NodeData) -> NodeId {
        let id = NodeId(self.nodes.len());
        self.nodes.push(Node {
            parent: None,
            children: Vec::new(),
            data,
        });
        id
    }

    /// Appends `child` as the last child of `parent`, moving it if it was
    /// already attached elsewhere.
    pub fn append_child(&mut self, parent: NodeId, child: NodeId) -> bool {
        let index = self.children(parent).len();
        self.insert_child(parent, index, child)
    }

    /// Inserts `child` at `index` (clamped) among `parent`'s children.
    ///
    /// Refuses text parents, unknown ids and insertions that would create a
    /// cycle.
    pub fn insert_child(&mut self, parent: NodeId, index: usize, child: NodeId) -> bool {
        if !self.is_element(parent) || self.node(child).is_none() {
            return false;
        }
        if self.is_inclusive_ancestor(child, parent) {
            return false;
        }

        self.detach(child);

        let Some(parent_node) = self.nodes.get_mut(parent.0) else {
            return false;
        };
        let index = index.min(parent_node.children.len());
        parent_node.children.insert(index, child);

        if let Some(child_node) = self.nodes.get_mut(child.0) {
            child_node.parent = Some(parent);
        }
        true
    }

    /// Unlinks `node` from its parent. Returns whether it was attached.
    pub fn detach(&mut self, node: NodeId) -> bool {
        let Some(parent) = self.parent(node) else {
            return false;
        };

        if let Some(parent_node) = self.nodes.get_mut(parent.0) {
            parent_node.children.retain(|candidate| *candidate != node);
        }
        if let Some(child_node) = self.nodes.get_mut(node.0) {
            child_node.parent = None;
        }
        true
    }

    fn node(&self, id: NodeId) -> Option<&Node> {
        self.nodes.get(id.0)
    }

    fn is_inclusive_ancestor(&self, ancestor: NodeId, node: NodeId) -> bool {
        let mut current = Some(node);
        while let Some(id) = current {
            if id == ancestor {
                return true;
            }
            current = self.parent(id);
        }
        false
    }

    pub fn parent(&self, node: NodeId) -> Option<NodeId> {
        self.node(node).and_then(|node| node.parent)
    }

    /// Parent, as long as it is an element. Only elements hold children, so
    /// this only differs from [`Document::parent`] for unknown ids.
    pub fn parent_element(&self, node: NodeId) -> Option<NodeId> {
        self.parent(node).filter(|parent| self.is_element(*parent))
    }

    pub fn children(&self, node: NodeId) -> &[NodeId] {
        self.node(node)
            .map(|node| node.children.as_slice())
            .unwrap_or_default()
    }

    pub fn element_children(&self, node: NodeId) -> Vec<NodeId> {
        self.children(node)
            .iter()
            .copied()
            .filter(|child| self.is_element(*child))
            .collect()
    }

    pub fn element(&self, node: NodeId) -> Option<&ElementData> {
        match &self.node(node)?.data {
            NodeData::Element(element) => Some(element),
            NodeData::Text(_) => None,
        }
    }

    fn element_mut(&mut self, node: NodeId) -> Option<&mut ElementData> {
        match &mut self.nodes.get_mut(node.0)?.data {
            NodeData::Element(element) => Some(element),
            NodeData::Text(_) => None,
        }
    }

    pub fn is_element(&self, node: NodeId) -> bool {
        self.element(node).is_some()
    }

    pub fn tag_name(&self, node: NodeId) -> Option<&str> {
        self.element(node).map(ElementData::tag)
    }

    pub fn text(&self, node: NodeId) -> Option<&str> {
        match &self.node(node)?.data {
            NodeData::Text(text) => Some(text),
            NodeData::Element(_) => None,
        }
    }

    /// Concatenated text of every text node under `node`.
    pub fn text_content(&self, node: NodeId) -> String {
        let mut out = String::new();
        self.collect_text(node, &mut out);
        out
    }

    fn collect_text(&self, node: NodeId, out: &mut String) {
        if let Some(text) = self.text(node) {
            out.push_str(text);
            return;
        }
        for child in self.children(node) {
            self.collect_text(*child, out);
        }
    }

    /// True when `node` is reachable from the document root.
    pub fn is_connected(&self, node: NodeId) -> bool {
        self.node(node).is_some() && self.is_inclusive_ancestor(self.root, node)
    }

    pub fn attribute(&self, node: NodeId, name: &str) -> Option<&str> {
        self.element(node)?.attribute(name)
    }

    pub fn has_attribute(&self, node: NodeId, name: &str) -> bool {
        self.attribute(node, name).is_some()
    }

    pub fn set_attribute(&mut self, node: NodeId, name: &str, value: impl Into<String>) -> bool {
        let Some(element) = self.element_mut(node) else {
            return false;
        };

        let value = value.into();
        match element
            .attrs
            .iter_mut()
            .find(|(key, _)| key.eq_ignore_ascii_case(name))
        {
            Some((_, current)) => *current = value,
            None => element.attrs.push((name.to_ascii_lowercase(), value)),
        }
        true
    }

    /// Removes an attribute, returning its previous value.
    pub fn remove_attribute(&mut self, node: NodeId, name: &str) -> Option<String> {
        let element = self.element_mut(node)?;
        let index = element
            .attrs
            .iter()
            .position(|(key, _)| key.eq_ignore_ascii_case(name))?;
        Some(element.attrs.remove(index).1)
    }

    pub fn has_class(&self, node: NodeId, class: &str) -> bool {
        self.element(node)
            .is_some_and(|element| element.has_class(class))
    }

    /// Adds `class` to the element's class list. Returns `true` only when the
    /// class was not already present.
    pub fn add_class(&mut self, node: NodeId, class: &str) -> bool {
        if !self.is_element(node) || self.has_class(node, class) {
            return false;
        }

        let mut classes = self.attribute(node, "class").unwrap_or_default().to_owned();
        if !classes.trim().is_empty() {
            classes = classes.trim_end().to_owned();
            classes.push(' ');
        } else {
            classes.clear();
        }
        classes.push_str(class);
        self.set_attribute(node, "class", classes)
    }

    /// Removes every occurrence of `class`, dropping the attribute once it is
    /// empty. Returns whether it was present.
    pub fn remove_class(&mut self, node: NodeId, class: &str) -> bool {
        if !self.has_class(node, class) {
            return false;
        }

        let remaining = self
            .attribute(node, "class")
            .unwrap_or_default()
            .split_ascii_whitespace()
            .filter(|item| *item != class)
            .collect::<Vec<_>>()
            .join(" ");
        if remaining.is_empty() {
            return self.remove_attribute(node, "class").is_some();
        }
        self.set_attribute(node, "class", remaining)
    }

    /// Sets or clears `class` depending on `enabled`.
    pub fn toggle_class(&mut self, node: NodeId, class: &str, enabled: bool) {
        if enabled {
            self.add_class(node, class);
        } else {
            self.remove_class(node, class);
        }
    }

    /// Sets one declaration inside the inline `style` attribute, replacing an
    /// existing declaration for the same property.
    pub fn set_style_property(&mut self, node: NodeId, property: &str, value: &str) -> bool {
        if !self.is_element(node) {
            return false;
        }

        let mut declarations = self
            .attribute(node, "style")
            .unwrap_or_default()
            .split(';')
            .filter_map(|declaration| {
                let (name, value) = declaration.split_once(':')?;
                let name = name.trim();
                (!name.is_empty() && name != property)
                    .then(|| format!("{name}: {}", value.trim()))
            })
            .collect::<Vec<_>>();
        declarations.push(format!("{property}: {value}"));
        self.set_attribute(node, "style", format!("{};", declarations.join("; ")))
    }

    /// Whether a `<style>` element's sheet is disabled. Always `false` for
    /// other nodes.
    pub fn is_sheet_disabled(&self, node: NodeId) -> bool {
        self.element(node)
            .is_some_and(|element| element.tag == "style" && element.sheet_disabled)
    }

    /// Toggles the sheet of a `<style>` element. Returns `false` for any other
    /// node.
    pub fn set_sheet_disabled(&mut self, node: NodeId, disabled: bool) -> bool {
        match self.element_mut(node) {
            Some(element) if element.tag == "style" => {
                element.sheet_disabled = disabled;
                true
            }
            _ => false,
        }
    }

    /// Every element under `root`, `root` included, in document order.
    pub fn elements_inclusive(&self, root: NodeId) -> Vec<NodeId> {
        let mut out = Vec::new();
        let mut stack = vec![root];
        while let Some(id) = stack.pop() {
            if !self.is_element(id) {
                continue;
            }
            out.push(id);
            stack.extend(self.children(id).iter().rev().copied());
        }
        out
    }

    /// Every element strictly below `root` matching `predicate`, in document
    /// order.
    pub fn find_all(&self, root: NodeId, predicate: impl Fn(&ElementData) -> bool) -> Vec<NodeId> {
        self.elements_inclusive(root)
            .into_iter()
            .skip(1)
            .filter(|id| self.element(*id).is_some_and(&predicate))
            .collect()
    }

    /// First element strictly below `root` matching `predicate`.
    pub fn find_descendant(
        &self,
        root: NodeId,
        predicate: impl Fn(&ElementData) -> bool,
    ) -> Option<NodeId> {
        self.elements_inclusive(root)
            .into_iter()
            .skip(1)
            .find(|id| self.element(*id).is_some_and(&predicate))
    }

    /// Nearest inclusive ancestor matching `predicate`, like `Element.closest`.
    pub fn closest(&self, node: NodeId, predicate: impl Fn(&ElementData) -> bool) -> Option<NodeId> {
        let mut current = Some(node);
        while let Some(id) = current {
            if self.element(id).is_some_and(&predicate) {
                return Some(id);
            }
            current = self.parent_element(id);
        }
        None
    }

    /// Serializes `node` and its subtree back to markup.
    pub fn to_html(&self, node: NodeId) -> String {
        let mut out = String::new();
        self.write_html(node, false, &mut out);
        out
    }

    fn write_html(&self, node: NodeId, raw_text: bool, out: &mut String) {
        let Some(data) = self.node(node).map(|node| &node.data) else {
            return;
        };

        match data {
            NodeData::Text(text) if raw_text => out.push_str(text),
            NodeData::Text(text) => escape_text(text, out),
            NodeData::Element(element) => {
                out.push('<');
                out.push_str(&element.tag);
                for (name, value) in &element.attrs {
                    out.push(' ');
                    out.push_str(name);
                    out.push_str("=\"");
                    escape_attribute(value, out);
                    out.push('"');
                }
                out.push('>');

                if is_void(&element.tag) {
                    return;
                }

                let raw = matches!(element.tag.as_str(), "script" | "style");
                for child in self.children(node) {
                    self.write_html(*child, raw, out);
                }

                out.push_str("</");
                out.push_str(&element.tag);
                out.push('>');
            }
        }
    }
}

/// Elements that never take children.
pub fn is_void(tag: &str) -> bool {
    matches!(
        tag,
        "area"
            | "base"
            | "br"
            | "col"
            | "embed"
            | "hr"
            | "img"
            | "input"
            | "link"
            | "meta"
            | "param"
            | "source"
            | "track"
            | "wbr"
    )
}

fn escape_text(text: &str, out: &mut String) {
    for ch in text.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            _ => out.push(ch),
        }
    }
}

fn escape_attribute(value: &str, out: &mut String) {
    for ch in value.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '"' => out.push_str("&quot;"),
            _ => out.push(ch),
        }
    }
}
