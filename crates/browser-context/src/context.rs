//! The external interface the core consumes from the surrounding browser
//! runtime. No transport is implemented here; wiring a real tab to this
//! trait is the embedding host's job.

use async_trait::async_trait;

use agentcore_core_types::TaskId;

use crate::errors::BrowserContextError;
use crate::snapshot::{BrowserState, DOMElementNode};

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum ScrollDirection {
    Up,
    Down,
    Left,
    Right,
}

#[derive(Clone, Debug, PartialEq)]
pub enum ScrollTarget {
    Percent(f64),
    NextPage,
    PreviousPage,
    Text { text: String, nth: u32 },
}

/// One open browser tab. Every method mutates the live page as a side
/// effect; callers must call [`BrowserContext::get_state`] again afterward
/// rather than reuse a cached snapshot.
#[async_trait]
pub trait Page: Send + Sync {
    async fn navigate_to(&self, url: &str) -> Result<(), BrowserContextError>;
    async fn go_back(&self) -> Result<(), BrowserContextError>;
    async fn go_forward(&self) -> Result<(), BrowserContextError>;
    async fn refresh(&self) -> Result<(), BrowserContextError>;

    async fn click_element_node(&self, node: &DOMElementNode) -> Result<(), BrowserContextError>;
    async fn input_text_element_node(
        &self,
        node: &DOMElementNode,
        text: &str,
    ) -> Result<(), BrowserContextError>;
    async fn send_keys(&self, keys: &str) -> Result<(), BrowserContextError>;

    async fn scroll(&self, target: ScrollTarget) -> Result<(), BrowserContextError>;

    async fn get_dropdown_options(
        &self,
        node: &DOMElementNode,
    ) -> Result<Vec<String>, BrowserContextError>;
    async fn select_dropdown_option(
        &self,
        node: &DOMElementNode,
        text: &str,
    ) -> Result<(), BrowserContextError>;

    async fn get_all_tab_ids(&self) -> Result<Vec<String>, BrowserContextError>;
    async fn switch_tab(&self, tab_id: &str) -> Result<(), BrowserContextError>;
    async fn open_tab(&self, url: Option<&str>) -> Result<String, BrowserContextError>;
    async fn close_tab(&self, tab_id: &str) -> Result<(), BrowserContextError>;

    async fn is_file_uploader(&self, node: &DOMElementNode) -> Result<bool, BrowserContextError>;

    /// Evaluates a named, pre-registered in-page script. There is no
    /// arbitrary script injection surface on this trait; conditions and
    /// waits are expressed as capabilities, not raw JS strings.
    async fn evaluate(&self, capability: &str) -> Result<serde_json::Value, BrowserContextError>;
}

/// Adapter over one browser session. Implementations may cache
/// [`BrowserState`] but must invalidate the cache on navigation, a
/// significant DOM mutation, or a tab switch.
#[async_trait]
pub trait BrowserContext: Send + Sync {
    async fn get_state(&self, force_refresh: bool) -> Result<BrowserState, BrowserContextError>;
    async fn current_page(&self) -> Result<std::sync::Arc<dyn Page>, BrowserContextError>;
    async fn set_current_task_id(&self, task_id: TaskId, task: &str);
    async fn cleanup(&self);
}
