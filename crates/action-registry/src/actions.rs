//! The mandatory action catalog (§4.2): one `Action` impl per entry.
//!
//! Actions that touch a live DOM element (`click_element`, `input_text`,
//! the dropdown pair) resolve their target through `action_locator` and run
//! the actual page operation through `agentcore-error-recovery`, so a
//! stale index or a slow-to-render element gets a retry chain instead of an
//! immediate hard failure.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use action_locator::{find_element_simple, TargetingStrategy};
use agentcore_browser_context::{BrowserContext, DOMElementNode, Page, ScrollTarget};
use agentcore_core_types::{wrap_untrusted, ActionResult};
use agentcore_error_recovery::{default_catalog, execute_with_recovery, ActionKind, RecoveryContext, RecoveryRunResult};
use agentcore_intelligent_waiting::{wait_for, WaitOptions, WaitPreset};
use async_trait::async_trait;
use serde_json::Value;
use tokio_util::sync::CancellationToken;

use crate::types::{obj_schema, Action, ActionError, ActionExecCtx};

fn str_arg<'a>(input: &'a Value, key: &str) -> Option<&'a str> {
    input.get(key).and_then(Value::as_str)
}

fn num_arg(input: &Value, key: &str) -> Option<f64> {
    input.get(key).and_then(Value::as_f64)
}

fn bool_arg(input: &Value, key: &str, default: bool) -> bool {
    input.get(key).and_then(Value::as_bool).unwrap_or(default)
}

fn require_str<'a>(input: &'a Value, key: &str) -> Result<&'a str, ActionError> {
    str_arg(input, key).ok_or_else(|| ActionError::InvalidInput(format!("missing required field `{key}`")))
}

/// Minimal `application/x-www-form-urlencoded` query encoder; the action
/// catalog never injects a raw script or URL, so this only needs to be
/// correct for search-query text.
fn percent_encode_query(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    for b in raw.bytes() {
        match b {
            b'A'..=b'Z' | b'a'..=b'z' | b'0'..=b'9' | b'-' | b'_' | b'.' | b'~' => out.push(b as char),
            b' ' => out.push('+'),
            _ => out.push_str(&format!("%{:02X}", b)),
        }
    }
    out
}

async fn current_tab_ids(browser: &Arc<dyn BrowserContext>) -> Vec<String> {
    match browser.current_page().await {
        Ok(page) => page.get_all_tab_ids().await.unwrap_or_default(),
        Err(_) => Vec::new(),
    }
}

fn targeting_strategy_from(input: &Value, index: u32) -> TargetingStrategy {
    let mut strategy = TargetingStrategy::by_index(index);
    if let Some(aria) = str_arg(input, "aria") {
        strategy = strategy.with_aria(aria);
    }
    if let Some(text) = str_arg(input, "text") {
        strategy = strategy.with_text(text);
    }
    strategy
}

/// Resolves `strategy` against the browser's latest state and runs `op` on
/// the matched node, retrying through the recovery catalog on failure.
/// Returns the resolved `highlight_index` alongside the op's result, since
/// a retry may have re-targeted to an index different from the one the
/// caller originally asked for.
async fn with_element<F, Fut, T>(
    browser: &Arc<dyn BrowserContext>,
    kind: ActionKind,
    strategy: TargetingStrategy,
    cancel: &CancellationToken,
    op: F,
) -> RecoveryRunResult<(T, u32)>
where
    F: Fn(Arc<dyn Page>, DOMElementNode) -> Fut,
    Fut: Future<Output = Result<T, String>>,
{
    let recovery_ctx = RecoveryContext::new(kind, Some(strategy)).with_cancel_token(cancel.clone());
    execute_with_recovery(
        |maybe_strategy| async {
            let strat = maybe_strategy.ok_or_else(|| "missing targeting strategy".to_string())?;
            let state = browser.get_state(true).await.map_err(|e| e.to_string())?;
            let found = find_element_simple(&state, &strat).ok_or_else(|| "element not found".to_string())?;
            let node = state
                .element_at(found.highlight_index)
                .cloned()
                .ok_or_else(|| "element not found".to_string())?;
            let page = browser.current_page().await.map_err(|e| e.to_string())?;
            let value = op(page, node).await?;
            Ok((value, found.highlight_index))
        },
        recovery_ctx,
        browser.as_ref(),
        &default_catalog(),
    )
    .await
}

fn graceful(action_name: &str, message: String) -> ActionResult {
    tracing::debug!(action = action_name, %message, "recovery exhausted, continuing gracefully");
    ActionResult::graceful_continuation(action_name)
}

// ---------------------------------------------------------------------
// Terminal
// ---------------------------------------------------------------------

pub struct Done;

#[async_trait]
impl Action for Done {
    fn name(&self) -> &'static str {
        "done"
    }
    fn schema(&self) -> Value {
        obj_schema(&[("success", "boolean"), ("text", "string")], &["text"])
    }
    fn describe(&self, input: &Value) -> String {
        format!("done(success={})", bool_arg(input, "success", true))
    }
    async fn call(&self, input: Value, _ctx: &ActionExecCtx) -> Result<ActionResult, ActionError> {
        let success = bool_arg(&input, "success", true);
        let text = require_str(&input, "text")?.to_string();
        if success {
            Ok(ActionResult::done(text))
        } else {
            Ok(ActionResult {
                is_done: Some(true),
                extracted_content: None,
                error: Some(text),
                include_in_memory: true,
            })
        }
    }
}

// ---------------------------------------------------------------------
// Navigation
// ---------------------------------------------------------------------

pub struct SearchGoogle;

#[async_trait]
impl Action for SearchGoogle {
    fn name(&self) -> &'static str {
        "search_google"
    }
    fn schema(&self) -> Value {
        obj_schema(&[("query", "string")], &["query"])
    }
    fn describe(&self, input: &Value) -> String {
        format!("search_google(query={:?})", str_arg(input, "query").unwrap_or(""))
    }
    async fn call(&self, input: Value, ctx: &ActionExecCtx) -> Result<ActionResult, ActionError> {
        let query = require_str(&input, "query")?;
        let url = format!("https://www.google.com/search?q={}", percent_encode_query(query));
        let page = ctx.browser.current_page().await.map_err(|e| ActionError::Failed(e.to_string()))?;
        page.navigate_to(&url).await.map_err(|e| ActionError::Failed(e.to_string()))?;
        Ok(ActionResult::ok(format!("searched Google for \"{query}\"")))
    }
}

pub struct GoToUrl;

#[async_trait]
impl Action for GoToUrl {
    fn name(&self) -> &'static str {
        "go_to_url"
    }
    fn schema(&self) -> Value {
        obj_schema(&[("url", "string")], &["url"])
    }
    fn describe(&self, input: &Value) -> String {
        format!("go_to_url(url={:?})", str_arg(input, "url").unwrap_or(""))
    }
    async fn call(&self, input: Value, ctx: &ActionExecCtx) -> Result<ActionResult, ActionError> {
        let url = require_str(&input, "url")?;
        let page = ctx.browser.current_page().await.map_err(|e| ActionError::Failed(e.to_string()))?;
        page.navigate_to(url).await.map_err(|e| ActionError::Failed(e.to_string()))?;
        Ok(ActionResult::ok(format!("navigated to {url}")))
    }
}

macro_rules! no_arg_page_action {
    ($struct_name:ident, $action_name:literal, $method:ident, $summary:literal) => {
        pub struct $struct_name;

        #[async_trait]
        impl Action for $struct_name {
            fn name(&self) -> &'static str {
                $action_name
            }
            async fn call(&self, _input: Value, ctx: &ActionExecCtx) -> Result<ActionResult, ActionError> {
                let page = ctx.browser.current_page().await.map_err(|e| ActionError::Failed(e.to_string()))?;
                page.$method().await.map_err(|e| ActionError::Failed(e.to_string()))?;
                Ok(ActionResult::ok($summary))
            }
        }
    };
}

no_arg_page_action!(GoBack, "go_back", go_back, "went back");
no_arg_page_action!(GoForward, "go_forward", go_forward, "went forward");
no_arg_page_action!(Refresh, "refresh", refresh, "refreshed the page");

// ---------------------------------------------------------------------
// Waiting
// ---------------------------------------------------------------------

pub struct Wait;

#[async_trait]
impl Action for Wait {
    fn name(&self) -> &'static str {
        "wait"
    }
    fn schema(&self) -> Value {
        obj_schema(&[("seconds", "number")], &["seconds"])
    }
    fn describe(&self, input: &Value) -> String {
        format!("wait(seconds={})", num_arg(input, "seconds").unwrap_or(0.0))
    }
    async fn call(&self, input: Value, ctx: &ActionExecCtx) -> Result<ActionResult, ActionError> {
        let seconds = num_arg(&input, "seconds").ok_or_else(|| ActionError::InvalidInput("missing required field `seconds`".into()))?;
        let max_wait = Duration::from_millis((seconds * 1000.0).max(0.0) as u64);
        let min_wait = std::cmp::min(max_wait / 5, Duration::from_millis(500));
        let page = ctx.browser.current_page().await.map_err(|e| ActionError::Failed(e.to_string()))?;
        let result = wait_for(
            page.as_ref(),
            WaitOptions::preset(WaitPreset::Stable).with_max_wait(max_wait).with_min_wait(min_wait),
            &ctx.cancel,
        )
        .await;
        Ok(ActionResult::ok(format!("waited {:.1}s (stable={})", seconds, result.success)))
    }
}

// ---------------------------------------------------------------------
// Element interaction
// ---------------------------------------------------------------------

pub struct ClickElement;

#[async_trait]
impl Action for ClickElement {
    fn name(&self) -> &'static str {
        "click_element"
    }
    fn has_index(&self) -> bool {
        true
    }
    fn schema(&self) -> Value {
        obj_schema(&[("index", "integer"), ("aria", "string"), ("text", "string")], &["index"])
    }
    fn describe(&self, input: &Value) -> String {
        format!("click_element(index={})", crate::types::get_index_arg(input).unwrap_or(0))
    }
    async fn call(&self, mut input: Value, ctx: &ActionExecCtx) -> Result<ActionResult, ActionError> {
        let index = crate::types::get_index_arg(&input).ok_or_else(|| ActionError::InvalidInput("missing required field `index`".into()))?;
        let strategy = targeting_strategy_from(&input, index);
        let tabs_before = current_tab_ids(&ctx.browser).await;

        let result = with_element(&ctx.browser, ActionKind::Click, strategy, &ctx.cancel, |page, node| async move {
            page.click_element_node(&node).await.map_err(|e| e.to_string())
        })
        .await;

        match result {
            RecoveryRunResult::Success(((), resolved_index)) => {
                crate::types::set_index_arg(&mut input, resolved_index);
                let tabs_after = current_tab_ids(&ctx.browser).await;
                let summary = if tabs_after.len() > tabs_before.len() {
                    format!("clicked element {resolved_index}; a new tab opened")
                } else if resolved_index != index {
                    format!("clicked element {resolved_index} (re-targeted from {index})")
                } else {
                    format!("clicked element {resolved_index}")
                };
                Ok(ActionResult::ok(summary))
            }
            RecoveryRunResult::GracefulContinue { message, .. } => Ok(graceful(self.name(), message)),
            RecoveryRunResult::Failed { error, .. } => Err(ActionError::Failed(error)),
        }
    }
}

pub struct InputText;

#[async_trait]
impl Action for InputText {
    fn name(&self) -> &'static str {
        "input_text"
    }
    fn has_index(&self) -> bool {
        true
    }
    fn schema(&self) -> Value {
        obj_schema(&[("index", "integer"), ("text", "string"), ("aria", "string")], &["index", "text"])
    }
    fn describe(&self, input: &Value) -> String {
        format!(
            "input_text(index={}, text={:?})",
            crate::types::get_index_arg(input).unwrap_or(0),
            str_arg(input, "text").unwrap_or("")
        )
    }
    async fn call(&self, mut input: Value, ctx: &ActionExecCtx) -> Result<ActionResult, ActionError> {
        let index = crate::types::get_index_arg(&input).ok_or_else(|| ActionError::InvalidInput("missing required field `index`".into()))?;
        let text = require_str(&input, "text")?.to_string();
        let strategy = targeting_strategy_from(&input, index);

        let result = with_element(&ctx.browser, ActionKind::Input, strategy, &ctx.cancel, move |page, node| {
            let text = text.clone();
            async move { page.input_text_element_node(&node, &text).await.map_err(|e| e.to_string()) }
        })
        .await;

        match result {
            RecoveryRunResult::Success(((), resolved_index)) => {
                crate::types::set_index_arg(&mut input, resolved_index);
                Ok(ActionResult::ok(format!("entered text into element {resolved_index}")))
            }
            RecoveryRunResult::GracefulContinue { message, .. } => Ok(graceful(self.name(), message)),
            RecoveryRunResult::Failed { error, .. } => Err(ActionError::Failed(error)),
        }
    }
}

pub struct GetDropdownOptions;

#[async_trait]
impl Action for GetDropdownOptions {
    fn name(&self) -> &'static str {
        "get_dropdown_options"
    }
    fn has_index(&self) -> bool {
        true
    }
    fn schema(&self) -> Value {
        obj_schema(&[("index", "integer")], &["index"])
    }
    fn describe(&self, input: &Value) -> String {
        format!("get_dropdown_options(index={})", crate::types::get_index_arg(input).unwrap_or(0))
    }
    async fn call(&self, mut input: Value, ctx: &ActionExecCtx) -> Result<ActionResult, ActionError> {
        let index = crate::types::get_index_arg(&input).ok_or_else(|| ActionError::InvalidInput("missing required field `index`".into()))?;
        let strategy = targeting_strategy_from(&input, index);

        let result = with_element(&ctx.browser, ActionKind::Input, strategy, &ctx.cancel, |page, node| async move {
            page.get_dropdown_options(&node).await.map_err(|e| e.to_string())
        })
        .await;

        match result {
            RecoveryRunResult::Success((options, resolved_index)) => {
                crate::types::set_index_arg(&mut input, resolved_index);
                let rendered = serde_json::to_string(&options).unwrap_or_default();
                Ok(ActionResult::ok(rendered))
            }
            RecoveryRunResult::GracefulContinue { message, .. } => Ok(graceful(self.name(), message)),
            RecoveryRunResult::Failed { error, .. } => Err(ActionError::Failed(error)),
        }
    }
}

pub struct SelectDropdownOption;

#[async_trait]
impl Action for SelectDropdownOption {
    fn name(&self) -> &'static str {
        "select_dropdown_option"
    }
    fn has_index(&self) -> bool {
        true
    }
    fn schema(&self) -> Value {
        obj_schema(&[("index", "integer"), ("text", "string")], &["index", "text"])
    }
    fn describe(&self, input: &Value) -> String {
        format!(
            "select_dropdown_option(index={}, text={:?})",
            crate::types::get_index_arg(input).unwrap_or(0),
            str_arg(input, "text").unwrap_or("")
        )
    }
    async fn call(&self, mut input: Value, ctx: &ActionExecCtx) -> Result<ActionResult, ActionError> {
        let index = crate::types::get_index_arg(&input).ok_or_else(|| ActionError::InvalidInput("missing required field `index`".into()))?;
        let text = require_str(&input, "text")?.to_string();
        let text_for_message = text.clone();
        let strategy = targeting_strategy_from(&input, index);

        let result = with_element(&ctx.browser, ActionKind::Input, strategy, &ctx.cancel, move |page, node| {
            let text = text.clone();
            async move { page.select_dropdown_option(&node, &text).await.map_err(|e| e.to_string()) }
        })
        .await;

        match result {
            RecoveryRunResult::Success(((), resolved_index)) => {
                crate::types::set_index_arg(&mut input, resolved_index);
                Ok(ActionResult::ok(format!("selected {text_for_message:?} in element {resolved_index}")))
            }
            RecoveryRunResult::GracefulContinue { message, .. } => Ok(graceful(self.name(), message)),
            RecoveryRunResult::Failed { error, .. } => Err(ActionError::Failed(error)),
        }
    }
}

// ---------------------------------------------------------------------
// Tabs
// ---------------------------------------------------------------------

pub struct SwitchTab;

#[async_trait]
impl Action for SwitchTab {
    fn name(&self) -> &'static str {
        "switch_tab"
    }
    fn schema(&self) -> Value {
        obj_schema(&[("tab_id", "string")], &["tab_id"])
    }
    fn describe(&self, input: &Value) -> String {
        format!("switch_tab(tab_id={:?})", str_arg(input, "tab_id").unwrap_or(""))
    }
    async fn call(&self, input: Value, ctx: &ActionExecCtx) -> Result<ActionResult, ActionError> {
        let tab_id = require_str(&input, "tab_id")?;
        let page = ctx.browser.current_page().await.map_err(|e| ActionError::Failed(e.to_string()))?;
        page.switch_tab(tab_id).await.map_err(|e| ActionError::Failed(e.to_string()))?;
        Ok(ActionResult::ok(format!("switched to tab {tab_id}")))
    }
}

pub struct OpenTab;

#[async_trait]
impl Action for OpenTab {
    fn name(&self) -> &'static str {
        "open_tab"
    }
    fn schema(&self) -> Value {
        obj_schema(&[("url", "string")], &[])
    }
    fn describe(&self, input: &Value) -> String {
        format!("open_tab(url={:?})", str_arg(input, "url"))
    }
    async fn call(&self, input: Value, ctx: &ActionExecCtx) -> Result<ActionResult, ActionError> {
        let url = str_arg(&input, "url");
        let page = ctx.browser.current_page().await.map_err(|e| ActionError::Failed(e.to_string()))?;
        let new_tab = page.open_tab(url).await.map_err(|e| ActionError::Failed(e.to_string()))?;
        Ok(ActionResult::ok(format!("opened tab {new_tab}")))
    }
}

pub struct CloseTab;

#[async_trait]
impl Action for CloseTab {
    fn name(&self) -> &'static str {
        "close_tab"
    }
    fn schema(&self) -> Value {
        obj_schema(&[("tab_id", "string")], &["tab_id"])
    }
    fn describe(&self, input: &Value) -> String {
        format!("close_tab(tab_id={:?})", str_arg(input, "tab_id").unwrap_or(""))
    }
    async fn call(&self, input: Value, ctx: &ActionExecCtx) -> Result<ActionResult, ActionError> {
        let tab_id = require_str(&input, "tab_id")?;
        let page = ctx.browser.current_page().await.map_err(|e| ActionError::Failed(e.to_string()))?;
        page.close_tab(tab_id).await.map_err(|e| ActionError::Failed(e.to_string()))?;
        Ok(ActionResult::ok(format!("closed tab {tab_id}")))
    }
}

// ---------------------------------------------------------------------
// Memory
// ---------------------------------------------------------------------

pub struct CacheContent;

#[async_trait]
impl Action for CacheContent {
    fn name(&self) -> &'static str {
        "cache_content"
    }
    fn schema(&self) -> Value {
        obj_schema(&[("content", "string")], &["content"])
    }
    fn describe(&self, _input: &Value) -> String {
        "cache_content(...)".to_string()
    }
    async fn call(&self, input: Value, _ctx: &ActionExecCtx) -> Result<ActionResult, ActionError> {
        let content = require_str(&input, "content")?;
        Ok(ActionResult::ok(wrap_untrusted(content)).with_memory(true))
    }
}

// ---------------------------------------------------------------------
// Scrolling
// ---------------------------------------------------------------------

pub struct ScrollToPercent;

#[async_trait]
impl Action for ScrollToPercent {
    fn name(&self) -> &'static str {
        "scroll_to_percent"
    }
    fn schema(&self) -> Value {
        obj_schema(&[("percent", "number")], &["percent"])
    }
    fn describe(&self, input: &Value) -> String {
        format!("scroll_to_percent(percent={})", num_arg(input, "percent").unwrap_or(0.0))
    }
    async fn call(&self, input: Value, ctx: &ActionExecCtx) -> Result<ActionResult, ActionError> {
        let percent = num_arg(&input, "percent").ok_or_else(|| ActionError::InvalidInput("missing required field `percent`".into()))?;
        let page = ctx.browser.current_page().await.map_err(|e| ActionError::Failed(e.to_string()))?;
        page.scroll(ScrollTarget::Percent(percent.clamp(0.0, 100.0)))
            .await
            .map_err(|e| ActionError::Failed(e.to_string()))?;
        Ok(ActionResult::ok(format!("scrolled to {percent:.0}%")))
    }
}

macro_rules! scroll_percent_action {
    ($struct_name:ident, $action_name:literal, $percent:literal, $summary:literal) => {
        pub struct $struct_name;

        #[async_trait]
        impl Action for $struct_name {
            fn name(&self) -> &'static str {
                $action_name
            }
            async fn call(&self, _input: Value, ctx: &ActionExecCtx) -> Result<ActionResult, ActionError> {
                let page = ctx.browser.current_page().await.map_err(|e| ActionError::Failed(e.to_string()))?;
                page.scroll(ScrollTarget::Percent($percent)).await.map_err(|e| ActionError::Failed(e.to_string()))?;
                Ok(ActionResult::ok($summary))
            }
        }
    };
}

scroll_percent_action!(ScrollToTop, "scroll_to_top", 0.0, "scrolled to top");
scroll_percent_action!(ScrollToBottom, "scroll_to_bottom", 100.0, "scrolled to bottom");

macro_rules! scroll_page_action {
    ($struct_name:ident, $action_name:literal, $target:expr, $summary:literal) => {
        pub struct $struct_name;

        #[async_trait]
        impl Action for $struct_name {
            fn name(&self) -> &'static str {
                $action_name
            }
            async fn call(&self, _input: Value, ctx: &ActionExecCtx) -> Result<ActionResult, ActionError> {
                let page = ctx.browser.current_page().await.map_err(|e| ActionError::Failed(e.to_string()))?;
                page.scroll($target).await.map_err(|e| ActionError::Failed(e.to_string()))?;
                Ok(ActionResult::ok($summary))
            }
        }
    };
}

scroll_page_action!(PreviousPage, "previous_page", ScrollTarget::PreviousPage, "scrolled up one page");
scroll_page_action!(NextPage, "next_page", ScrollTarget::NextPage, "scrolled down one page");

pub struct ScrollToText;

#[async_trait]
impl Action for ScrollToText {
    fn name(&self) -> &'static str {
        "scroll_to_text"
    }
    fn schema(&self) -> Value {
        obj_schema(&[("text", "string"), ("nth", "integer")], &["text"])
    }
    fn describe(&self, input: &Value) -> String {
        format!("scroll_to_text(text={:?})", str_arg(input, "text").unwrap_or(""))
    }
    async fn call(&self, input: Value, ctx: &ActionExecCtx) -> Result<ActionResult, ActionError> {
        let text = require_str(&input, "text")?.to_string();
        let nth = input.get("nth").and_then(Value::as_u64).unwrap_or(1) as u32;
        let page = ctx.browser.current_page().await.map_err(|e| ActionError::Failed(e.to_string()))?;
        page.scroll(ScrollTarget::Text { text: text.clone(), nth })
            .await
            .map_err(|e| ActionError::Failed(e.to_string()))?;
        Ok(ActionResult::ok(format!("scrolled to text {text:?}")))
    }
}

// ---------------------------------------------------------------------
// Keyboard
// ---------------------------------------------------------------------

pub struct SendKeys;

#[async_trait]
impl Action for SendKeys {
    fn name(&self) -> &'static str {
        "send_keys"
    }
    fn schema(&self) -> Value {
        obj_schema(&[("keys", "string")], &["keys"])
    }
    fn describe(&self, input: &Value) -> String {
        format!("send_keys(keys={:?})", str_arg(input, "keys").unwrap_or(""))
    }
    async fn call(&self, input: Value, ctx: &ActionExecCtx) -> Result<ActionResult, ActionError> {
        let keys = require_str(&input, "keys")?;
        let page = ctx.browser.current_page().await.map_err(|e| ActionError::Failed(e.to_string()))?;
        page.send_keys(keys).await.map_err(|e| ActionError::Failed(e.to_string()))?;
        Ok(ActionResult::ok(format!("sent keys {keys:?}")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use agentcore_browser_context::fake::FakeBrowserContext;
    use agentcore_browser_context::snapshot::BrowserState;
    use agentcore_core_types::TaskId;
    use agentcore_event_bus::new_event_manager;

    fn ctx_with(states: Vec<BrowserState>) -> ActionExecCtx {
        ActionExecCtx::new(TaskId::new(), FakeBrowserContext::new(states), new_event_manager(16))
    }

    #[tokio::test]
    async fn done_marks_is_done_and_keeps_text() {
        let ctx = ctx_with(vec![BrowserState::empty("https://a", "A", "t1")]);
        let result = Done
            .call(serde_json::json!({"text": "finished"}), &ctx)
            .await
            .unwrap();
        assert_eq!(result.is_done, Some(true));
        assert_eq!(result.extracted_content.as_deref(), Some("finished"));
    }

    #[tokio::test]
    async fn click_element_fails_clean_when_index_out_of_range() {
        let ctx = ctx_with(vec![BrowserState::empty("https://a", "A", "t1")]);
        let err = ClickElement.call(serde_json::json!({"index": 9}), &ctx).await.unwrap_err();
        assert!(matches!(err, ActionError::Failed(_)));
    }

    #[tokio::test]
    async fn click_element_succeeds_against_a_real_index() {
        let tree = DOMElementNode::leaf("body", "/html/body")
            .with_children(vec![DOMElementNode::leaf("button", "/html/body/button").with_text("Go").interactive(0)]);
        let state = BrowserState::from_tree("https://a", "A", "t1", tree);
        let ctx = ctx_with(vec![state]);
        let result = ClickElement.call(serde_json::json!({"index": 0}), &ctx).await.unwrap();
        assert!(!result.is_error());
    }

    #[tokio::test]
    async fn click_element_reflects_the_recovery_retargeted_index() {
        let tree = DOMElementNode::leaf("body", "/html/body")
            .with_children(vec![DOMElementNode::leaf("button", "/html/body/button").with_text("Go").interactive(0)]);
        let state = BrowserState::from_tree("https://a", "A", "t1", tree.clone());
        let ctx = ctx_with(vec![state.clone(), state]);
        // index 5 is stale; element_research's generic-selector fallback
        // should find the one real button at index 0 and retry there.
        let result = ClickElement.call(serde_json::json!({"index": 5}), &ctx).await.unwrap();
        assert!(!result.is_error());
        let summary = result.extracted_content.unwrap();
        assert!(summary.contains("element 0"), "expected resolved index 0 in {summary:?}");
        assert!(summary.contains("re-targeted from 5"), "expected re-targeting note in {summary:?}");
    }

    #[tokio::test]
    async fn cache_content_wraps_untrusted_and_marks_memory() {
        let ctx = ctx_with(vec![BrowserState::empty("https://a", "A", "t1")]);
        let result = CacheContent.call(serde_json::json!({"content": "page says hi"}), &ctx).await.unwrap();
        assert!(result.include_in_memory);
        assert!(result.extracted_content.unwrap().contains("untrusted_content"));
    }

    #[tokio::test]
    async fn wait_reports_elapsed_duration() {
        let ctx = ctx_with(vec![BrowserState::empty("https://a", "A", "t1")]);
        let result = Wait.call(serde_json::json!({"seconds": 0.05}), &ctx).await.unwrap();
        assert!(result.extracted_content.unwrap().starts_with("waited"));
    }
}
