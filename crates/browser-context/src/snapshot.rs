//! The [`BrowserState`] data model: an immutable view of one tab at one
//! instant, plus the [`DOMElementNode`] tree it's built from.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

/// One node in the DOM abstraction. `highlight_index` is only present when
/// the node was judged interactive and in-viewport at snapshot time; it is
/// only stable within this one snapshot.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct DOMElementNode {
    pub tag_name: String,
    pub attributes: HashMap<String, String>,
    pub xpath: String,
    pub is_interactive: bool,
    pub is_visible: bool,
    pub is_top_element: bool,
    pub highlight_index: Option<u32>,
    pub text: String,
    pub children: Vec<DOMElementNode>,
}

impl DOMElementNode {
    pub fn leaf(tag_name: impl Into<String>, xpath: impl Into<String>) -> Self {
        Self {
            tag_name: tag_name.into(),
            attributes: HashMap::new(),
            xpath: xpath.into(),
            is_interactive: false,
            is_visible: true,
            is_top_element: false,
            highlight_index: None,
            text: String::new(),
            children: Vec::new(),
        }
    }

    pub fn with_attr(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.attributes.insert(key.into(), value.into());
        self
    }

    pub fn with_text(mut self, text: impl Into<String>) -> Self {
        self.text = text.into();
        self
    }

    pub fn interactive(mut self, highlight_index: u32) -> Self {
        self.is_interactive = true;
        self.is_top_element = true;
        self.highlight_index = Some(highlight_index);
        self
    }

    pub fn with_children(mut self, children: Vec<DOMElementNode>) -> Self {
        self.children = children;
        self
    }

    /// Visible text of this element, stopping descent at the next
    /// interactive descendant (the text a click on this node would "mean").
    pub fn own_clickable_text(&self) -> String {
        let mut out = self.text.clone();
        for child in &self.children {
            if child.highlight_index.is_some() {
                continue;
            }
            let child_text = child.own_clickable_text();
            if !child_text.is_empty() {
                if !out.is_empty() {
                    out.push(' ');
                }
                out.push_str(&child_text);
            }
        }
        out
    }

    /// Depth-first walk yielding every node, used to build the selector map.
    pub fn walk<'a>(&'a self, out: &mut Vec<&'a DOMElementNode>) {
        out.push(self);
        for child in &self.children {
            child.walk(out);
        }
    }
}

/// Page scroll position, used by waiting/scrolling actions.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct ScrollPosition {
    pub pixels_from_top: f64,
    pub total_height: f64,
    pub viewport_height: f64,
}

impl ScrollPosition {
    pub fn percent(&self) -> f64 {
        let scrollable = (self.total_height - self.viewport_height).max(1.0);
        ((self.pixels_from_top / scrollable) * 100.0).clamp(0.0, 100.0)
    }

    pub fn is_at_bottom(&self) -> bool {
        self.percent() >= 95.0
    }
}

/// Immutable snapshot of one tab. `selector_map` keys (`highlight_index`)
/// are dense within this snapshot only; never compare them across
/// snapshots without re-resolving through the element finder.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct BrowserState {
    pub url: String,
    pub title: String,
    pub tab_id: String,
    pub element_tree: DOMElementNode,
    pub selector_map: HashMap<u32, DOMElementNode>,
    pub path_hashes: Vec<String>,
    pub scroll: ScrollPosition,
    pub open_tab_ids: Vec<String>,
}

impl BrowserState {
    pub fn empty(url: impl Into<String>, title: impl Into<String>, tab_id: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            title: title.into(),
            tab_id: tab_id.into(),
            element_tree: DOMElementNode::leaf("body", "/html/body"),
            selector_map: HashMap::new(),
            path_hashes: Vec::new(),
            scroll: ScrollPosition::default(),
            open_tab_ids: Vec::new(),
        }
    }

    /// Builds a state from an already-assembled element tree, deriving
    /// `selector_map` and `path_hashes` from it.
    pub fn from_tree(
        url: impl Into<String>,
        title: impl Into<String>,
        tab_id: impl Into<String>,
        element_tree: DOMElementNode,
    ) -> Self {
        let mut nodes = Vec::new();
        element_tree.walk(&mut nodes);
        let mut selector_map = HashMap::new();
        let mut path_hashes = Vec::new();
        for node in nodes {
            path_hashes.push(node.xpath.clone());
            if let Some(idx) = node.highlight_index {
                selector_map.insert(idx, node.clone());
            }
        }
        Self {
            url: url.into(),
            title: title.into(),
            tab_id: tab_id.into(),
            element_tree,
            selector_map,
            path_hashes,
            scroll: ScrollPosition::default(),
            open_tab_ids: Vec::new(),
        }
    }

    pub fn element_at(&self, index: u32) -> Option<&DOMElementNode> {
        self.selector_map.get(&index)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn selector_map_is_derived_from_tree() {
        let tree = DOMElementNode::leaf("body", "/html/body").with_children(vec![DOMElementNode::leaf(
            "button",
            "/html/body/button",
        )
        .with_text("Login")
        .interactive(0)]);
        let state = BrowserState::from_tree("https://x", "X", "tab-1", tree);
        assert_eq!(state.selector_map.len(), 1);
        assert_eq!(state.element_at(0).unwrap().text, "Login");
    }

    #[test]
    fn own_clickable_text_stops_at_nested_interactive() {
        let inner = DOMElementNode::leaf("span", "/x/span").with_text("inner").interactive(1);
        let outer = DOMElementNode::leaf("div", "/x")
            .with_text("outer")
            .with_children(vec![inner]);
        assert_eq!(outer.own_clickable_text(), "outer");
    }
}
