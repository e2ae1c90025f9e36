//! The recovery strategy catalog (§4.4), priority-ordered.

use std::time::Duration;

use action_locator::{find_element_simple, FoundElement, TargetingStrategy};
use agentcore_browser_context::{BrowserContext, ScrollTarget};
use agentcore_intelligent_waiting::{wait_for, WaitOptions, WaitPreset};
use async_trait::async_trait;

use crate::types::{ActionKind, RecoveryContext, RecoveryOutcome};

#[async_trait]
pub trait RecoveryStrategy: Send + Sync {
    fn name(&self) -> &'static str;
    fn priority(&self) -> u32;
    fn is_applicable(&self, ctx: &RecoveryContext) -> bool;
    async fn attempt(&self, ctx: &mut RecoveryContext, browser: &dyn BrowserContext) -> RecoveryOutcome;
}

fn error_mentions(ctx: &RecoveryContext, needles: &[&str]) -> bool {
    let err = ctx.original_error.to_lowercase();
    needles.iter().any(|n| err.contains(n))
}

fn element_touching(ctx: &RecoveryContext) -> bool {
    matches!(ctx.action_type, ActionKind::Click | ActionKind::Input)
}

/// Default catalog in priority order (callers may sort again; the ordering
/// here already matches §4.4).
pub fn default_catalog() -> Vec<Box<dyn RecoveryStrategy>> {
    vec![
        Box::new(PageRefreshStrategy),
        Box::new(ScrollAndWaitStrategy),
        Box::new(ElementResearchStrategy),
        Box::new(PageStabilizationStrategy),
        Box::new(AlternativeTargetingStrategy),
        Box::new(TimeoutExtensionStrategy),
        Box::new(GracefulContinuationStrategy),
    ]
}

/// Priority 80. Forces a fresh state fetch and a short settle wait;
/// applicable to click/input failures.
pub struct PageRefreshStrategy;

#[async_trait]
impl RecoveryStrategy for PageRefreshStrategy {
    fn name(&self) -> &'static str {
        "page_refresh"
    }
    fn priority(&self) -> u32 {
        80
    }
    fn is_applicable(&self, ctx: &RecoveryContext) -> bool {
        element_touching(ctx)
    }
    async fn attempt(&self, ctx: &mut RecoveryContext, browser: &dyn BrowserContext) -> RecoveryOutcome {
        match browser.get_state(true).await {
            Ok(_) => {
                if let Ok(page) = browser.current_page().await {
                    let _ = wait_for(
                        page.as_ref(),
                        WaitOptions::preset(WaitPreset::Fast).with_max_wait(Duration::from_millis(500)),
                        &ctx.cancel_token,
                    )
                    .await;
                }
                RecoveryOutcome::retry("refreshed browser state")
            }
            Err(e) => RecoveryOutcome::inapplicable(format!("refresh failed: {e}")),
        }
    }
}

/// Priority 75. Scrolls to the target text (if known) or a bounded amount,
/// then waits briefly. Applicable to "not found" errors on click/input.
pub struct ScrollAndWaitStrategy;

#[async_trait]
impl RecoveryStrategy for ScrollAndWaitStrategy {
    fn name(&self) -> &'static str {
        "scroll_and_wait"
    }
    fn priority(&self) -> u32 {
        75
    }
    fn is_applicable(&self, ctx: &RecoveryContext) -> bool {
        element_touching(ctx) && error_mentions(ctx, &["not found", "no element"])
    }
    async fn attempt(&self, ctx: &mut RecoveryContext, browser: &dyn BrowserContext) -> RecoveryOutcome {
        let Ok(page) = browser.current_page().await else {
            return RecoveryOutcome::inapplicable("no current page to scroll");
        };
        let target = match ctx.targeting_strategy.as_ref().and_then(|s| s.text.clone()) {
            Some(text) => ScrollTarget::Text { text, nth: 1 },
            None => ScrollTarget::NextPage,
        };
        match page.scroll(target).await {
            Ok(()) => {
                let _ = wait_for(
                    page.as_ref(),
                    WaitOptions::preset(WaitPreset::Fast).with_max_wait(Duration::from_millis(500)),
                    &ctx.cancel_token,
                )
                .await;
                RecoveryOutcome::retry("scrolled toward target")
            }
            Err(e) => RecoveryOutcome::inapplicable(format!("scroll failed: {e}")),
        }
    }
}

/// Priority 70. Re-runs the finder on an expanded strategy (first word of
/// text, a generic selector) to discover a substitute node.
pub struct ElementResearchStrategy;

#[async_trait]
impl RecoveryStrategy for ElementResearchStrategy {
    fn name(&self) -> &'static str {
        "element_research"
    }
    fn priority(&self) -> u32 {
        70
    }
    fn is_applicable(&self, ctx: &RecoveryContext) -> bool {
        element_touching(ctx) && ctx.targeting_strategy.is_some()
    }
    async fn attempt(&self, ctx: &mut RecoveryContext, browser: &dyn BrowserContext) -> RecoveryOutcome {
        let Some(original) = ctx.targeting_strategy.clone() else {
            return RecoveryOutcome::inapplicable("no targeting strategy to expand");
        };
        let Ok(state) = browser.get_state(true).await else {
            return RecoveryOutcome::inapplicable("could not fetch state for research");
        };

        let mut expanded = original.clone();
        expanded.index = None;
        if let Some(text) = &original.text {
            expanded.text = text.split_whitespace().next().map(|w| w.to_string());
        }
        if expanded.selector.is_none() {
            expanded.selector = Some("button, a, input".to_string());
        }

        match find_element_simple(&state, &expanded) {
            Some(FoundElement { highlight_index, .. }) => {
                let mut modified = original;
                modified.index = Some(highlight_index);
                RecoveryOutcome::retry_with(
                    format!("re-targeted to index {highlight_index} via expanded strategy"),
                    modified,
                )
            }
            None => RecoveryOutcome::inapplicable("expanded strategy found nothing"),
        }
    }
}

/// Priority 60. Waits for page-load stability; applicable to "not found",
/// "no longer available", or explicit wait failures.
pub struct PageStabilizationStrategy;

#[async_trait]
impl RecoveryStrategy for PageStabilizationStrategy {
    fn name(&self) -> &'static str {
        "page_stabilization"
    }
    fn priority(&self) -> u32 {
        60
    }
    fn is_applicable(&self, ctx: &RecoveryContext) -> bool {
        error_mentions(ctx, &["not found", "no longer available"]) || ctx.action_type == ActionKind::Wait
    }
    async fn attempt(&self, ctx: &mut RecoveryContext, browser: &dyn BrowserContext) -> RecoveryOutcome {
        let Ok(page) = browser.current_page().await else {
            return RecoveryOutcome::inapplicable("no current page");
        };
        let result = wait_for(
            page.as_ref(),
            WaitOptions::preset(WaitPreset::PageLoad)
                .with_min_wait(Duration::from_secs(1))
                .with_max_wait(Duration::from_secs(5)),
            &ctx.cancel_token,
        )
        .await;
        if result.success {
            RecoveryOutcome::retry("page stabilized")
        } else {
            RecoveryOutcome::inapplicable("page did not stabilize in time")
        }
    }
}

/// Priority 50. Iterates single-attribute variants of the strategy.
pub struct AlternativeTargetingStrategy;

#[async_trait]
impl RecoveryStrategy for AlternativeTargetingStrategy {
    fn name(&self) -> &'static str {
        "alternative_targeting"
    }
    fn priority(&self) -> u32 {
        50
    }
    fn is_applicable(&self, ctx: &RecoveryContext) -> bool {
        element_touching(ctx) && ctx.targeting_strategy.is_some()
    }
    async fn attempt(&self, ctx: &mut RecoveryContext, browser: &dyn BrowserContext) -> RecoveryOutcome {
        let Some(original) = ctx.targeting_strategy.clone() else {
            return RecoveryOutcome::inapplicable("no targeting strategy");
        };
        let Ok(state) = browser.get_state(true).await else {
            return RecoveryOutcome::inapplicable("could not fetch state");
        };

        let variants: Vec<TargetingStrategy> = [
            original.text.clone().map(|t| TargetingStrategy::default().with_text(t)),
            original.aria.clone().map(|a| TargetingStrategy::default().with_aria(a)),
            original.selector.clone().map(|s| TargetingStrategy::default().with_selector(s)),
        ]
        .into_iter()
        .flatten()
        .collect();

        for variant in variants {
            if let Some(found) = find_element_simple(&state, &variant) {
                let mut modified = original;
                modified.index = Some(found.highlight_index);
                return RecoveryOutcome::retry_with(
                    format!("single-attribute variant matched via {:?}", found.matched_by),
                    modified,
                );
            }
        }
        RecoveryOutcome::inapplicable("no single-attribute variant matched")
    }
}

/// Priority 40. Extends the wait budget for timeouts.
pub struct TimeoutExtensionStrategy;

#[async_trait]
impl RecoveryStrategy for TimeoutExtensionStrategy {
    fn name(&self) -> &'static str {
        "timeout_extension"
    }
    fn priority(&self) -> u32 {
        40
    }
    fn is_applicable(&self, ctx: &RecoveryContext) -> bool {
        error_mentions(ctx, &["timeout", "timed out"])
    }
    async fn attempt(&self, ctx: &mut RecoveryContext, browser: &dyn BrowserContext) -> RecoveryOutcome {
        let Ok(page) = browser.current_page().await else {
            return RecoveryOutcome::inapplicable("no current page");
        };
        let result = wait_for(
            page.as_ref(),
            WaitOptions::preset(WaitPreset::Stable).with_max_wait(Duration::from_secs(10)),
            &ctx.cancel_token,
        )
        .await;
        if result.success {
            RecoveryOutcome::retry("extended timeout budget satisfied")
        } else {
            RecoveryOutcome::inapplicable("still unstable after extended timeout")
        }
    }
}

/// Priority 10. Always applicable; last resort.
pub struct GracefulContinuationStrategy;

#[async_trait]
impl RecoveryStrategy for GracefulContinuationStrategy {
    fn name(&self) -> &'static str {
        "graceful_continuation"
    }
    fn priority(&self) -> u32 {
        10
    }
    fn is_applicable(&self, _ctx: &RecoveryContext) -> bool {
        true
    }
    async fn attempt(&self, ctx: &mut RecoveryContext, _browser: &dyn BrowserContext) -> RecoveryOutcome {
        RecoveryOutcome::graceful_continue(format!(
            "could not recover from: {}; continuing task execution",
            ctx.original_error
        ))
    }
}
