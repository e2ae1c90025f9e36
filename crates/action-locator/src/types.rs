//! Data model for the enhanced element finder (§3, §4.3).

use serde::{Deserialize, Serialize};

/// The union of identifiers an LLM (or a recovery strategy) can supply to
/// locate a DOM element. At least one field must be set.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct TargetingStrategy {
    pub index: Option<u32>,
    pub xpath: Option<String>,
    pub selector: Option<String>,
    pub text: Option<String>,
    pub aria: Option<String>,
    pub placeholder: Option<String>,
    pub attributes: Option<std::collections::HashMap<String, String>>,
}

impl TargetingStrategy {
    pub fn by_index(index: u32) -> Self {
        Self {
            index: Some(index),
            ..Self::default()
        }
    }

    pub fn is_empty(&self) -> bool {
        self.index.is_none()
            && self.xpath.is_none()
            && self.selector.is_none()
            && self.text.is_none()
            && self.aria.is_none()
            && self.placeholder.is_none()
            && self.attributes.as_ref().map(|m| m.is_empty()).unwrap_or(true)
    }

    pub fn with_aria(mut self, aria: impl Into<String>) -> Self {
        self.aria = Some(aria.into());
        self
    }

    pub fn with_text(mut self, text: impl Into<String>) -> Self {
        self.text = Some(text.into());
        self
    }

    pub fn with_selector(mut self, selector: impl Into<String>) -> Self {
        self.selector = Some(selector.into());
        self
    }
}

/// Branch of the priority chain that produced a match, in the order §4.3
/// tries them.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MatchedBy {
    Index,
    Aria,
    Placeholder,
    Attributes,
    Text,
    Selector,
    Xpath,
}

impl MatchedBy {
    pub fn base_confidence(self) -> f64 {
        match self {
            MatchedBy::Index => 1.0,
            MatchedBy::Aria => 0.9,
            MatchedBy::Placeholder => 0.9,
            MatchedBy::Attributes => 0.85,
            MatchedBy::Text => 0.95,
            MatchedBy::Selector => 0.9,
            MatchedBy::Xpath => 0.0,
        }
    }
}

/// A resolved element plus the strategy branch and confidence that found
/// it.
#[derive(Clone, Debug)]
pub struct FoundElement {
    pub highlight_index: u32,
    pub matched_by: MatchedBy,
    pub confidence: f64,
}

/// Debug trail of every strategy branch attempted during one resolution,
/// for inclusion in recovery-strategy `details` and ActionResult diagnostics.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct FinderDebugInfo {
    pub attempted: Vec<String>,
}

impl FinderDebugInfo {
    pub fn note(&mut self, message: impl Into<String>) {
        self.attempted.push(message.into());
    }
}
