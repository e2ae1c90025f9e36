//! Enhanced Element Finder (§4.3): resolves a [`TargetingStrategy`] against
//! a `BrowserState` using a strict, confidence-ranked priority chain with
//! fallthrough on semantic mismatch.

pub mod types;

pub use types::{FinderDebugInfo, FoundElement, MatchedBy, TargetingStrategy};

use agentcore_browser_context::{BrowserState, DOMElementNode};

fn lower(s: &str) -> String {
    s.trim().to_lowercase()
}

fn words_ge3(s: &str) -> std::collections::HashSet<String> {
    s.split(|c: char| !c.is_alphanumeric())
        .map(|w| w.to_lowercase())
        .filter(|w| w.len() >= 3)
        .collect()
}

fn shares_word(a: &str, b: &str) -> bool {
    let wa = words_ge3(a);
    if wa.is_empty() {
        return false;
    }
    let wb = words_ge3(b);
    wa.intersection(&wb).next().is_some()
}

fn semantic_attrs(node: &DOMElementNode) -> Vec<String> {
    let mut out = Vec::new();
    for key in ["aria-label", "aria-labelledby", "title", "placeholder", "name", "id"] {
        if let Some(v) = node.attributes.get(key) {
            out.push(v.clone());
        }
    }
    out
}

fn is_form_field(node: &DOMElementNode) -> bool {
    let tag = node.tag_name.to_lowercase();
    tag == "input"
        || tag == "textarea"
        || node
            .attributes
            .get("contenteditable")
            .map(|v| v != "false")
            .unwrap_or(false)
}

/// §4.3 semantic-validation rule: after a non-`aria` match where the caller
/// also supplied an `aria` target and the matched element is a form field,
/// reject unless the element's own semantics share a ≥3-char word with the
/// target aria string.
fn passes_semantic_validation(node: &DOMElementNode, target_aria: Option<&str>) -> bool {
    let Some(target_aria) = target_aria else {
        return true;
    };
    if !is_form_field(node) {
        return true;
    }
    let attrs = semantic_attrs(node);
    if attrs.is_empty() {
        // No semantics to contradict the target; accept (mirrors the index
        // branch's "no semantic attributes at all -> accept" rule).
        return true;
    }
    attrs.iter().any(|a| shares_word(a, target_aria))
}

struct ParsedSelector {
    tag: Option<String>,
    id: Option<String>,
    classes: Vec<String>,
    attr: Option<(String, String)>,
}

/// Parses a simple CSS-like selector: one optional tag, one optional `#id`,
/// any number of `.class`, and at most one `[attr="value"]`. Compound
/// selectors like `button.primary#go` are supported; combinators are not.
fn parse_selector(selector: &str) -> ParsedSelector {
    let mut tag = None;
    let mut id = None;
    let mut classes = Vec::new();
    let mut attr = None;

    let mut rest = selector.trim();
    if let Some(start) = rest.find('[') {
        if let Some(end) = rest.find(']') {
            if end > start {
                let inner = &rest[start + 1..end];
                if let Some((k, v)) = inner.split_once('=') {
                    let k = k.trim().to_string();
                    let v = v.trim().trim_matches(['"', '\'']).to_string();
                    attr = Some((k, v));
                }
            }
            rest = &rest[..start];
        }
    }

    let mut current = String::new();
    let mut mode = ' '; // ' ' = tag, '#' = id, '.' = class
    let flush = |mode: char, current: &str, id: &mut Option<String>, classes: &mut Vec<String>, tag: &mut Option<String>| {
        if current.is_empty() {
            return;
        }
        match mode {
            '#' => *id = Some(current.to_string()),
            '.' => classes.push(current.to_string()),
            _ => *tag = Some(current.to_string()),
        }
    };

    for ch in rest.chars() {
        if ch == '#' || ch == '.' {
            flush(mode, &current, &mut id, &mut classes, &mut tag);
            current.clear();
            mode = ch;
        } else {
            current.push(ch);
        }
    }
    flush(mode, &current, &mut id, &mut classes, &mut tag);

    ParsedSelector {
        tag,
        id,
        classes,
        attr,
    }
}

fn selector_matches(node: &DOMElementNode, parsed: &ParsedSelector) -> bool {
    if let Some(tag) = &parsed.tag {
        if node.tag_name.to_lowercase() != tag.to_lowercase() {
            return false;
        }
    }
    if let Some(id) = &parsed.id {
        if node.attributes.get("id").map(|v| v.as_str()) != Some(id.as_str()) {
            return false;
        }
    }
    if !parsed.classes.is_empty() {
        let class_attr = node.attributes.get("class").cloned().unwrap_or_default();
        let node_classes: std::collections::HashSet<&str> = class_attr.split_whitespace().collect();
        if !parsed.classes.iter().all(|c| node_classes.contains(c.as_str())) {
            return false;
        }
    }
    if let Some((k, v)) = &parsed.attr {
        if node.attributes.get(k).map(|a| a.as_str()) != Some(v.as_str()) {
            return false;
        }
    }
    parsed.tag.is_some() || parsed.id.is_some() || !parsed.classes.is_empty() || parsed.attr.is_some()
}

/// Resolves `strategy` against `state`, returning the first match found by
/// walking the priority chain in §4.3 order. Returns `None` (with `debug`
/// populated) if every applicable branch is exhausted.
pub fn find_element(
    state: &BrowserState,
    strategy: &TargetingStrategy,
    debug: &mut FinderDebugInfo,
) -> Option<FoundElement> {
    // 1. index, with aria/placeholder cross-check.
    if let Some(index) = strategy.index {
        if let Some(node) = state.element_at(index) {
            let semantic_target = strategy.aria.as_deref().or(strategy.placeholder.as_deref());
            let attrs = semantic_attrs(node);
            let accept = match semantic_target {
                None => true,
                Some(target) => {
                    if attrs.is_empty() {
                        true
                    } else {
                        attrs.iter().any(|a| shares_word(a, target))
                    }
                }
            };
            if accept {
                debug.note(format!("index {index}: matched"));
                return Some(FoundElement {
                    highlight_index: index,
                    matched_by: MatchedBy::Index,
                    confidence: MatchedBy::Index.base_confidence(),
                });
            }
            debug.note(format!(
                "index {index}: rejected, no semantic overlap with target"
            ));
        } else {
            debug.note(format!("index {index}: not found in selector map"));
        }
    }

    // 2. aria — exact, lower-cased match on aria-label / aria-labelledby / title.
    if let Some(target) = &strategy.aria {
        let target_lower = lower(target);
        let hit = state.selector_map.iter().find(|(_, node)| {
            ["aria-label", "aria-labelledby", "title"]
                .iter()
                .any(|k| node.attributes.get(*k).map(|v| lower(v)) == Some(target_lower.clone()))
        });
        if let Some((idx, _node)) = hit {
            // No semantic-validation re-check here: §4.3's rule applies
            // "after a non-aria match" against a separately supplied aria
            // target. This branch *is* the aria match; validating it
            // against itself would self-reject short aria-labels (e.g.
            // "OK") whose words are all below the 3-char threshold.
            debug.note("aria: matched");
            return Some(FoundElement {
                highlight_index: *idx,
                matched_by: MatchedBy::Aria,
                confidence: MatchedBy::Aria.base_confidence(),
            });
        }
        debug.note("aria: no match");
    }

    // 3. placeholder — exact, lower-cased.
    if let Some(target) = &strategy.placeholder {
        let target_lower = lower(target);
        let hit = state.selector_map.iter().find(|(_, node)| {
            node.attributes.get("placeholder").map(|v| lower(v)) == Some(target_lower.clone())
        });
        if let Some((idx, node)) = hit {
            if passes_semantic_validation(node, strategy.aria.as_deref()) {
                debug.note("placeholder: matched");
                return Some(FoundElement {
                    highlight_index: *idx,
                    matched_by: MatchedBy::Placeholder,
                    confidence: MatchedBy::Placeholder.base_confidence(),
                });
            }
        }
        debug.note("placeholder: no match");
    }

    // 4. attributes — all provided pairs must match.
    if let Some(pairs) = &strategy.attributes {
        if !pairs.is_empty() {
            let hit = state.selector_map.iter().find(|(_, node)| {
                pairs.iter().all(|(k, v)| node.attributes.get(k) == Some(v))
            });
            if let Some((idx, node)) = hit {
                if passes_semantic_validation(node, strategy.aria.as_deref()) {
                    debug.note("attributes: matched");
                    return Some(FoundElement {
                        highlight_index: *idx,
                        matched_by: MatchedBy::Attributes,
                        confidence: MatchedBy::Attributes.base_confidence(),
                    });
                }
            }
            debug.note("attributes: no match");
        }
    }

    // 5. text — exact (0.95) or substring either direction (0.8).
    if let Some(target) = &strategy.text {
        let target_lower = lower(target);
        let mut best: Option<(u32, &DOMElementNode, f64)> = None;
        for (idx, node) in state.selector_map.iter() {
            let own_text = lower(&node.own_clickable_text());
            if own_text.is_empty() {
                continue;
            }
            let score = if own_text == target_lower {
                0.95
            } else if own_text.contains(&target_lower) || target_lower.contains(&own_text) {
                0.8
            } else {
                continue;
            };
            if best.map(|(_, _, s)| score > s).unwrap_or(true) {
                best = Some((*idx, node, score));
            }
        }
        if let Some((idx, node, score)) = best {
            if passes_semantic_validation(node, strategy.aria.as_deref()) {
                debug.note("text: matched");
                return Some(FoundElement {
                    highlight_index: idx,
                    matched_by: MatchedBy::Text,
                    confidence: score,
                });
            }
        }
        debug.note("text: no match");
    }

    // 6. selector — simple class / id / tag / [attr="value"].
    if let Some(selector) = &strategy.selector {
        let parsed = parse_selector(selector);
        let hit = state
            .selector_map
            .iter()
            .find(|(_, node)| selector_matches(node, &parsed));
        if let Some((idx, node)) = hit {
            if passes_semantic_validation(node, strategy.aria.as_deref()) {
                debug.note("selector: matched");
                return Some(FoundElement {
                    highlight_index: *idx,
                    matched_by: MatchedBy::Selector,
                    confidence: MatchedBy::Selector.base_confidence(),
                });
            }
        }
        debug.note("selector: no match");
    }

    // 7. xpath — reserved; stubbed out per the open-question decision in
    // DESIGN.md. Always falls through so callers keep relying on the
    // fallback chain rather than a half-implemented evaluator.
    if strategy.xpath.is_some() {
        debug.note("xpath: skipped (stubbed, see DESIGN.md)");
    }

    None
}

/// Convenience wrapper discarding the debug trail.
pub fn find_element_simple(state: &BrowserState, strategy: &TargetingStrategy) -> Option<FoundElement> {
    let mut debug = FinderDebugInfo::default();
    find_element(state, strategy, &mut debug)
}

#[cfg(test)]
mod tests {
    use super::*;
    use agentcore_browser_context::DOMElementNode;

    fn state_with(nodes: Vec<DOMElementNode>) -> BrowserState {
        let tree = DOMElementNode::leaf("body", "/html/body").with_children(nodes);
        BrowserState::from_tree("https://x", "X", "t1", tree)
    }

    #[test]
    fn index_is_tried_first_and_wins_with_no_semantics() {
        let state = state_with(vec![DOMElementNode::leaf("button", "/b")
            .with_text("Go")
            .interactive(0)]);
        let found = find_element_simple(&state, &TargetingStrategy::by_index(0)).unwrap();
        assert_eq!(found.matched_by, MatchedBy::Index);
        assert_eq!(found.confidence, 1.0);
    }

    #[test]
    fn index_rejected_on_semantic_mismatch_falls_back_to_aria() {
        let login = DOMElementNode::leaf("button", "/b1")
            .with_attr("aria-label", "Cancel order")
            .interactive(0);
        let target = DOMElementNode::leaf("button", "/b2")
            .with_attr("aria-label", "Login")
            .interactive(1);
        let state = state_with(vec![login, target]);

        let strategy = TargetingStrategy::by_index(0).with_aria("Login");
        let found = find_element_simple(&state, &strategy).unwrap();
        assert_eq!(found.matched_by, MatchedBy::Aria);
        assert_eq!(found.highlight_index, 1);
    }

    #[test]
    fn text_exact_beats_substring() {
        let exact = DOMElementNode::leaf("a", "/a1").with_text("Submit").interactive(0);
        let partial = DOMElementNode::leaf("a", "/a2")
            .with_text("Submit order now")
            .interactive(1);
        let state = state_with(vec![partial, exact]);

        let found = find_element_simple(&state, &TargetingStrategy::default().with_text("Submit")).unwrap();
        assert_eq!(found.highlight_index, 0);
        assert_eq!(found.confidence, 0.95);
    }

    #[test]
    fn selector_matches_class_and_tag() {
        let node = DOMElementNode::leaf("input", "/i1")
            .with_attr("class", "search primary")
            .interactive(0);
        let state = state_with(vec![node]);
        let found =
            find_element_simple(&state, &TargetingStrategy::default().with_selector("input.search")).unwrap();
        assert_eq!(found.matched_by, MatchedBy::Selector);
    }

    #[test]
    fn xpath_only_strategy_never_matches() {
        let state = state_with(vec![DOMElementNode::leaf("div", "/d").interactive(0)]);
        let strategy = TargetingStrategy {
            xpath: Some("/html/body/div".to_string()),
            ..TargetingStrategy::default()
        };
        assert!(find_element_simple(&state, &strategy).is_none());
    }

    #[test]
    fn semantic_validation_rejects_mismatched_placeholder_form_field() {
        let email = DOMElementNode::leaf("input", "/i1")
            .with_attr("placeholder", "Email address")
            .interactive(0);
        let state = state_with(vec![email]);
        let strategy = TargetingStrategy::default()
            .with_selector("input")
            .with_aria("Password");
        // aria target shares no >=3 char word with "Email address" placeholder.
        assert!(find_element_simple(&state, &strategy).is_none());
    }
}
