//! Renders a [`BrowserState`] into the indexed element-tree text the
//! Navigator puts in front of the chat LLM (§4.7 step 1).

use agentcore_browser_context::{BrowserState, DOMElementNode};

/// One line per interactive node, in document order, prefixed with its
/// `highlight_index`. Non-interactive ancestry is not repeated verbatim —
/// only its own clickable text is folded in, mirroring the spec's
/// "ancestry preserved for text extraction" requirement on `elementTree`.
pub fn format_element_tree(state: &BrowserState, max_elements: usize, include_attributes: bool) -> String {
    let mut nodes = Vec::new();
    state.element_tree.walk(&mut nodes);

    let mut lines = Vec::new();
    for node in nodes.into_iter().filter(|n| n.highlight_index.is_some()) {
        if lines.len() >= max_elements {
            break;
        }
        lines.push(format_node_line(node, include_attributes));
    }
    lines.join("\n")
}

fn format_node_line(node: &DOMElementNode, include_attributes: bool) -> String {
    let idx = node.highlight_index.unwrap_or_default();
    let text = node.own_clickable_text();
    let attrs = if include_attributes && !node.attributes.is_empty() {
        let mut pairs: Vec<String> = node
            .attributes
            .iter()
            .map(|(k, v)| format!("{k}=\"{v}\""))
            .collect();
        pairs.sort();
        format!(" {}", pairs.join(" "))
    } else {
        String::new()
    };
    format!("[{idx}]<{}{attrs}>{text}</{}>", node.tag_name, node.tag_name)
}

/// Short, human-oriented state summary used in Planner/Validator prompts
/// where the full indexed element tree would be wasteful.
pub fn format_state_summary(state: &BrowserState) -> String {
    format!(
        "url: {}\ntitle: {}\ninteractive elements: {}\nopen tabs: {}",
        state.url,
        state.title,
        state.selector_map.len(),
        state.open_tab_ids.len().max(1)
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn renders_one_line_per_interactive_element_with_index() {
        let button = DOMElementNode::leaf("button", "/html/body/button")
            .with_text("Submit")
            .interactive(0);
        let tree = DOMElementNode::leaf("body", "/html/body").with_children(vec![button]);
        let state = BrowserState::from_tree("https://a", "A", "t1", tree);

        let rendered = format_element_tree(&state, 500, false);
        assert_eq!(rendered, "[0]<button>Submit</button>");
    }

    #[test]
    fn respects_max_elements_cap() {
        let nodes: Vec<_> = (0..5)
            .map(|i| DOMElementNode::leaf("a", format!("/x/a[{i}]")).with_text(format!("link{i}")).interactive(i))
            .collect();
        let tree = DOMElementNode::leaf("body", "/html/body").with_children(nodes);
        let state = BrowserState::from_tree("https://a", "A", "t1", tree);

        let rendered = format_element_tree(&state, 2, false);
        assert_eq!(rendered.lines().count(), 2);
    }
}
