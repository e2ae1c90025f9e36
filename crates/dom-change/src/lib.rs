//! DOM-change classification after an action (§4.6).
//!
//! [`classify`] compares the `BrowserState` before and after an action and
//! returns the first matching category in priority order: `Blocking` >
//! `Interactive` > `Minor` > `Navigation` > `None`.

use std::collections::HashSet;

use agentcore_browser_context::{BrowserState, DOMElementNode};
use serde::{Deserialize, Serialize};

/// The action kind that just ran, used to bias `Interactive` detection
/// (autocomplete popups are especially likely right after `input_text`).
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum LastActionKind {
    Click,
    Input,
    Scroll,
    Navigation,
    Wait,
    Other,
}

#[derive(Clone, Copy, Debug, Eq, PartialEq, Ord, PartialOrd, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChangeType {
    None,
    Minor,
    Navigation,
    Interactive,
    Blocking,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct DomChange {
    pub change_type: ChangeType,
    pub description: String,
    pub new_elements: Vec<String>,
    pub recommendations: Vec<String>,
}

impl DomChange {
    /// §4.6: Navigator switches from batch to single-step mode.
    pub fn should_switch_to_single_step(&self) -> bool {
        matches!(self.change_type, ChangeType::Interactive | ChangeType::Blocking)
    }

    /// §4.6: Executor forces a Planner run at the next step boundary.
    pub fn needs_full_replanning(&self) -> bool {
        matches!(self.change_type, ChangeType::Navigation)
    }
}

const MODAL_ROLES: [&str; 2] = ["alertdialog", "dialog"];
const MODAL_CLASS_HINTS: [&str; 4] = ["modal", "overlay-dialog", "lightbox", "backdrop-modal"];
const INTERACTIVE_ROLES: [&str; 3] = ["listbox", "menu", "combobox"];
const INTERACTIVE_CLASS_HINTS: [&str; 4] = ["autocomplete", "dropdown", "suggestions", "typeahead"];
const LOADING_CLASS_HINTS: [&str; 3] = ["loading", "spinner", "skeleton"];
const ERROR_CLASS_HINTS: [&str; 2] = ["error", "invalid-feedback"];

fn class_contains(node: &DOMElementNode, hints: &[&str]) -> bool {
    let class = node.attributes.get("class").map(|c| c.to_lowercase()).unwrap_or_default();
    hints.iter().any(|h| class.contains(h))
}

fn is_blocking_node(node: &DOMElementNode) -> bool {
    if let Some(role) = node.attributes.get("role") {
        let role = role.to_lowercase();
        if MODAL_ROLES.contains(&role.as_str()) {
            if role == "dialog" {
                let modal = node
                    .attributes
                    .get("aria-modal")
                    .map(|v| v == "true")
                    .unwrap_or(false);
                if modal {
                    return true;
                }
            } else {
                return true;
            }
        }
    }
    class_contains(node, &MODAL_CLASS_HINTS)
}

fn is_interactive_popup_node(node: &DOMElementNode) -> bool {
    if let Some(role) = node.attributes.get("role") {
        if INTERACTIVE_ROLES.contains(&role.to_lowercase().as_str()) {
            return true;
        }
    }
    class_contains(node, &INTERACTIVE_CLASS_HINTS)
}

fn is_validation_error_node(node: &DOMElementNode) -> bool {
    class_contains(node, &ERROR_CLASS_HINTS) && !node.text.trim().is_empty()
}

fn is_loading_node(node: &DOMElementNode) -> bool {
    class_contains(node, &LOADING_CLASS_HINTS)
}

fn all_nodes(state: &BrowserState) -> Vec<&DOMElementNode> {
    let mut out = Vec::new();
    state.element_tree.walk(&mut out);
    out
}

/// Classifies the delta between `old` and `new`, biasing toward
/// `Interactive` when `last_action` was an `input_text`.
pub fn classify(old: &BrowserState, new: &BrowserState, last_action: LastActionKind) -> DomChange {
    let old_paths: HashSet<&str> = old.path_hashes.iter().map(|s| s.as_str()).collect();
    let new_nodes = all_nodes(new);
    let new_elements: Vec<&DOMElementNode> = new_nodes
        .into_iter()
        .filter(|n| !old_paths.contains(n.xpath.as_str()))
        .collect();
    let new_element_paths: Vec<String> = new_elements.iter().map(|n| n.xpath.clone()).collect();

    if let Some(blocker) = new_elements.iter().find(|n| is_blocking_node(n)) {
        return DomChange {
            change_type: ChangeType::Blocking,
            description: format!("blocking overlay appeared: <{}>", blocker.tag_name),
            new_elements: new_element_paths,
            recommendations: vec!["dismiss or handle the dialog before continuing".into()],
        };
    }

    let popup = new_elements.iter().find(|n| is_interactive_popup_node(n));
    let error_node = new_elements.iter().find(|n| is_validation_error_node(n));
    if popup.is_some() || error_node.is_some() || (last_action == LastActionKind::Input && !new_elements.is_empty())
    {
        let description = if let Some(p) = popup {
            format!("interactive popup appeared: <{}>", p.tag_name)
        } else if let Some(e) = error_node {
            format!("validation error appeared: {}", e.text)
        } else {
            "new content appeared after input_text".to_string()
        };
        return DomChange {
            change_type: ChangeType::Interactive,
            description,
            new_elements: new_element_paths,
            recommendations: vec!["re-observe before issuing further actions in this batch".into()],
        };
    }

    if new_elements.iter().any(|n| is_loading_node(n)) || (!new_elements.is_empty() && new_elements.len() <= 3) {
        return DomChange {
            change_type: ChangeType::Minor,
            description: format!("{} minor element(s) appeared", new_elements.len()),
            new_elements: new_element_paths,
            recommendations: vec!["continue; no replanning needed".into()],
        };
    }

    if old.url != new.url {
        return DomChange {
            change_type: ChangeType::Navigation,
            description: format!("navigated from {} to {}", old.url, new.url),
            new_elements: new_element_paths,
            recommendations: vec!["force a planner run at the next step boundary".into()],
        };
    }

    DomChange {
        change_type: ChangeType::None,
        description: "no significant change".to_string(),
        new_elements: new_element_paths,
        recommendations: Vec::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use agentcore_browser_context::DOMElementNode;

    fn state(url: &str, nodes: Vec<DOMElementNode>) -> BrowserState {
        let tree = DOMElementNode::leaf("body", "/html/body").with_children(nodes);
        BrowserState::from_tree(url, "T", "t1", tree)
    }

    #[test]
    fn priority_blocking_beats_navigation() {
        let old = state("https://a", vec![]);
        let modal = DOMElementNode::leaf("div", "/html/body/div")
            .with_attr("role", "alertdialog")
            .interactive(0);
        let new = state("https://b", vec![modal]);
        let change = classify(&old, &new, LastActionKind::Click);
        assert_eq!(change.change_type, ChangeType::Blocking);
        assert!(change.should_switch_to_single_step());
    }

    #[test]
    fn navigation_detected_when_nothing_else_matches() {
        let old = state("https://a", vec![]);
        let new = state("https://b", vec![]);
        let change = classify(&old, &new, LastActionKind::Click);
        assert_eq!(change.change_type, ChangeType::Navigation);
        assert!(change.needs_full_replanning());
    }

    #[test]
    fn input_bias_makes_new_content_interactive() {
        let old = state("https://a", vec![]);
        let suggestion = DOMElementNode::leaf("li", "/html/body/li").with_text("Paris").interactive(0);
        let new = state("https://a", vec![suggestion]);
        let change = classify(&old, &new, LastActionKind::Input);
        assert_eq!(change.change_type, ChangeType::Interactive);
    }

    #[test]
    fn no_change_when_states_identical() {
        let s = state("https://a", vec![]);
        let change = classify(&s.clone(), &s, LastActionKind::Click);
        assert_eq!(change.change_type, ChangeType::None);
    }
}
