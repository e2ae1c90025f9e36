//! An in-memory [`BrowserContext`]/[`Page`] double for tests: scripted state
//! sequences and canned page-operation failures, no real browser involved.

use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::Mutex;

use agentcore_core_types::TaskId;

use crate::context::{BrowserContext, Page, ScrollTarget};
use crate::errors::BrowserContextError;
use crate::snapshot::{BrowserState, DOMElementNode};

#[derive(Clone, Debug, PartialEq)]
pub enum RecordedCall {
    NavigateTo(String),
    GoBack,
    GoForward,
    Refresh,
    Click(String),
    InputText(String, String),
    SendKeys(String),
    Scroll(String),
    GetDropdownOptions(String),
    SelectDropdownOption(String, String),
    SwitchTab(String),
    OpenTab(Option<String>),
    CloseTab(String),
}

struct FakeInner {
    states: Vec<BrowserState>,
    cursor: usize,
    calls: Vec<RecordedCall>,
    next_click_error: Option<BrowserContextError>,
    open_tab_ids: Vec<String>,
}

/// Scriptable [`BrowserContext`] double. Construct with an initial list of
/// states; `get_state(true)` advances through the script until exhausted,
/// after which it repeats the last state.
pub struct FakeBrowserContext {
    inner: Arc<Mutex<FakeInner>>,
}

impl FakeBrowserContext {
    pub fn new(states: Vec<BrowserState>) -> Arc<Self> {
        let open_tab_ids = states
            .first()
            .map(|s| vec![s.tab_id.clone()])
            .unwrap_or_default();
        Arc::new(Self {
            inner: Arc::new(Mutex::new(FakeInner {
                states,
                cursor: 0,
                calls: Vec::new(),
                next_click_error: None,
                open_tab_ids,
            })),
        })
    }

    pub async fn calls(&self) -> Vec<RecordedCall> {
        self.inner.lock().await.calls.clone()
    }

    /// Makes the next `click_element_node` call fail once with `error`.
    pub async fn fail_next_click(&self, error: BrowserContextError) {
        self.inner.lock().await.next_click_error = Some(error);
    }
}

#[async_trait]
impl BrowserContext for FakeBrowserContext {
    async fn get_state(&self, _force_refresh: bool) -> Result<BrowserState, BrowserContextError> {
        let mut guard = self.inner.lock().await;
        let idx = guard.cursor.min(guard.states.len().saturating_sub(1));
        let state = guard
            .states
            .get(idx)
            .cloned()
            .ok_or_else(|| BrowserContextError::Internal("no scripted states".into()))?;
        if guard.cursor + 1 < guard.states.len() {
            guard.cursor += 1;
        }
        Ok(state)
    }

    async fn current_page(&self) -> Result<Arc<dyn Page>, BrowserContextError> {
        Ok(Arc::new(FakePage { inner: Arc::clone(&self.inner) }))
    }

    async fn set_current_task_id(&self, _task_id: TaskId, _task: &str) {}

    async fn cleanup(&self) {}
}

struct FakePage {
    inner: Arc<Mutex<FakeInner>>,
}

#[async_trait]
impl Page for FakePage {
    async fn navigate_to(&self, url: &str) -> Result<(), BrowserContextError> {
        self.inner.lock().await.calls.push(RecordedCall::NavigateTo(url.to_string()));
        Ok(())
    }
    async fn go_back(&self) -> Result<(), BrowserContextError> {
        self.inner.lock().await.calls.push(RecordedCall::GoBack);
        Ok(())
    }
    async fn go_forward(&self) -> Result<(), BrowserContextError> {
        self.inner.lock().await.calls.push(RecordedCall::GoForward);
        Ok(())
    }
    async fn refresh(&self) -> Result<(), BrowserContextError> {
        self.inner.lock().await.calls.push(RecordedCall::Refresh);
        Ok(())
    }
    async fn click_element_node(&self, node: &DOMElementNode) -> Result<(), BrowserContextError> {
        let mut guard = self.inner.lock().await;
        guard.calls.push(RecordedCall::Click(node.xpath.clone()));
        if let Some(err) = guard.next_click_error.take() {
            return Err(err);
        }
        Ok(())
    }
    async fn input_text_element_node(
        &self,
        node: &DOMElementNode,
        text: &str,
    ) -> Result<(), BrowserContextError> {
        self.inner
            .lock()
            .await
            .calls
            .push(RecordedCall::InputText(node.xpath.clone(), text.to_string()));
        Ok(())
    }
    async fn send_keys(&self, keys: &str) -> Result<(), BrowserContextError> {
        self.inner.lock().await.calls.push(RecordedCall::SendKeys(keys.to_string()));
        Ok(())
    }
    async fn scroll(&self, target: ScrollTarget) -> Result<(), BrowserContextError> {
        self.inner.lock().await.calls.push(RecordedCall::Scroll(format!("{target:?}")));
        Ok(())
    }
    async fn get_dropdown_options(
        &self,
        node: &DOMElementNode,
    ) -> Result<Vec<String>, BrowserContextError> {
        self.inner
            .lock()
            .await
            .calls
            .push(RecordedCall::GetDropdownOptions(node.xpath.clone()));
        Ok(Vec::new())
    }
    async fn select_dropdown_option(
        &self,
        node: &DOMElementNode,
        text: &str,
    ) -> Result<(), BrowserContextError> {
        self.inner
            .lock()
            .await
            .calls
            .push(RecordedCall::SelectDropdownOption(node.xpath.clone(), text.to_string()));
        Ok(())
    }
    async fn get_all_tab_ids(&self) -> Result<Vec<String>, BrowserContextError> {
        Ok(self.inner.lock().await.open_tab_ids.clone())
    }
    async fn switch_tab(&self, tab_id: &str) -> Result<(), BrowserContextError> {
        self.inner.lock().await.calls.push(RecordedCall::SwitchTab(tab_id.to_string()));
        Ok(())
    }
    async fn open_tab(&self, url: Option<&str>) -> Result<String, BrowserContextError> {
        let mut guard = self.inner.lock().await;
        guard.calls.push(RecordedCall::OpenTab(url.map(|u| u.to_string())));
        let new_tab = format!("tab-{}", guard.open_tab_ids.len() + 1);
        guard.open_tab_ids.push(new_tab.clone());
        Ok(new_tab)
    }
    async fn close_tab(&self, tab_id: &str) -> Result<(), BrowserContextError> {
        let mut guard = self.inner.lock().await;
        guard.calls.push(RecordedCall::CloseTab(tab_id.to_string()));
        guard.open_tab_ids.retain(|t| t != tab_id);
        Ok(())
    }
    async fn is_file_uploader(&self, _node: &DOMElementNode) -> Result<bool, BrowserContextError> {
        Ok(false)
    }
    async fn evaluate(&self, _capability: &str) -> Result<serde_json::Value, BrowserContextError> {
        Ok(serde_json::Value::Null)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn scripted_states_advance_then_hold() {
        let ctx = FakeBrowserContext::new(vec![
            BrowserState::empty("https://a", "A", "t1"),
            BrowserState::empty("https://b", "B", "t1"),
        ]);
        let first = ctx.get_state(true).await.unwrap();
        let second = ctx.get_state(true).await.unwrap();
        let third = ctx.get_state(true).await.unwrap();
        assert_eq!(first.url, "https://a");
        assert_eq!(second.url, "https://b");
        assert_eq!(third.url, "https://b");
    }
}
