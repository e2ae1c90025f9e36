#![allow(dead_code)]
//! Condition-based wait primitive (§4.5 of the execution core).
//!
//! [`wait_for`] resolves a preset or an explicit set of [`WaitCondition`]s,
//! sleeps the minimum wait, then polls every condition in parallel on a
//! fixed interval until either all of them succeed in the same round or the
//! maximum wait elapses.

use std::time::{Duration, Instant};

use agentcore_browser_context::Page;
use serde::{Deserialize, Serialize};
use tokio_util::sync::CancellationToken;

/// Named bundles of conditions recognised by the waiter. Mirrors the preset
/// names the action registry and error-recovery strategies refer to.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WaitPreset {
    PageLoad,
    NetworkIdle,
    ElementVisible,
    AnimationsComplete,
    Fast,
    Stable,
}

/// One condition evaluated against the page via a named capability. The
/// capability string is resolved by the `Page::evaluate` implementation;
/// the core never injects raw script.
#[derive(Clone, Debug)]
pub struct WaitCondition {
    pub description: String,
    pub capability: String,
    pub weight: f64,
}

impl WaitCondition {
    pub fn new(description: impl Into<String>, capability: impl Into<String>, weight: f64) -> Self {
        Self {
            description: description.into(),
            capability: capability.into(),
            weight,
        }
    }
}

/// Options controlling one [`wait_for`] call.
#[derive(Clone, Debug)]
pub struct WaitOptions {
    pub max_wait: Duration,
    pub min_wait: Duration,
    pub check_interval: Duration,
    pub preset: Option<WaitPreset>,
    pub conditions: Option<Vec<WaitCondition>>,
    /// Highlight index the element-visible preset should check.
    pub target_index: Option<u32>,
}

impl Default for WaitOptions {
    fn default() -> Self {
        Self {
            max_wait: Duration::from_secs(10),
            min_wait: Duration::from_millis(250),
            check_interval: Duration::from_millis(100),
            preset: None,
            conditions: None,
            target_index: None,
        }
    }
}

impl WaitOptions {
    pub fn preset(preset: WaitPreset) -> Self {
        Self {
            preset: Some(preset),
            ..Self::default()
        }
    }

    pub fn with_max_wait(mut self, d: Duration) -> Self {
        self.max_wait = d;
        self
    }

    pub fn with_min_wait(mut self, d: Duration) -> Self {
        self.min_wait = d;
        self
    }

    pub fn with_target_index(mut self, index: u32) -> Self {
        self.target_index = Some(index);
        self
    }
}

#[derive(Clone, Copy, Debug, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WaitReason {
    Completed,
    Timeout,
    MinWaitReached,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct WaitResult {
    pub success: bool,
    pub duration_ms: u64,
    pub met_conditions: Vec<String>,
    pub unmet_conditions: Vec<String>,
    pub reason: WaitReason,
}

/// Resolves a preset into its condition list. `ElementVisible` requires
/// `target_index`; it degrades to a no-op success if the index is absent
/// since there is nothing to check.
fn resolve_preset(preset: WaitPreset, target_index: Option<u32>) -> Vec<WaitCondition> {
    match preset {
        WaitPreset::PageLoad => vec![
            WaitCondition::new("document ready", "document_ready", 0.6),
            WaitCondition::new("no loading indicators", "no_loading_indicators", 0.4),
        ],
        WaitPreset::NetworkIdle => vec![WaitCondition::new("network idle", "network_idle", 1.0)],
        WaitPreset::ElementVisible => match target_index {
            Some(idx) => vec![WaitCondition::new(
                format!("element {idx} visible"),
                format!("element_visible:{idx}"),
                1.0,
            )],
            None => vec![],
        },
        WaitPreset::AnimationsComplete => vec![WaitCondition::new(
            "animations complete",
            "animations_complete",
            1.0,
        )],
        WaitPreset::Fast => vec![WaitCondition::new("document ready", "document_ready", 1.0)],
        WaitPreset::Stable => vec![WaitCondition::new(
            "dom stable for 500ms",
            "dom_stable",
            1.0,
        )],
    }
}

async fn evaluate_condition(page: &dyn Page, condition: &WaitCondition) -> bool {
    match page.evaluate(&condition.capability).await {
        Ok(serde_json::Value::Bool(b)) => b,
        Ok(serde_json::Value::Null) => false,
        Ok(other) => !other.is_null() && other != serde_json::Value::Bool(false),
        Err(_) => false,
    }
}

/// Runs the wait algorithm described in §4.5: resolve conditions, sleep the
/// minimum wait, then poll in parallel until every condition succeeds in
/// the same round or `max_wait` elapses. `cancel` is checked at every sleep
/// so a caller cancelling mid-wait gets back within one `check_interval`
/// instead of waiting out `max_wait`.
pub async fn wait_for(page: &dyn Page, options: WaitOptions, cancel: &CancellationToken) -> WaitResult {
    let started = Instant::now();

    let conditions = match (&options.conditions, options.preset) {
        (Some(explicit), _) => explicit.clone(),
        (None, Some(preset)) => resolve_preset(preset, options.target_index),
        (None, None) => resolve_preset(WaitPreset::Fast, None),
    };

    tokio::select! {
        _ = tokio::time::sleep(options.min_wait) => {}
        _ = cancel.cancelled() => {
            return WaitResult {
                success: false,
                duration_ms: started.elapsed().as_millis() as u64,
                met_conditions: Vec::new(),
                unmet_conditions: Vec::new(),
                reason: WaitReason::Timeout,
            };
        }
    }

    if conditions.is_empty() {
        return WaitResult {
            success: true,
            duration_ms: started.elapsed().as_millis() as u64,
            met_conditions: Vec::new(),
            unmet_conditions: Vec::new(),
            reason: WaitReason::MinWaitReached,
        };
    }

    loop {
        let checks = conditions
            .iter()
            .map(|c| async { (c.description.clone(), evaluate_condition(page, c).await) });
        let results = futures::future::join_all(checks).await;

        let met: Vec<String> = results
            .iter()
            .filter(|(_, ok)| *ok)
            .map(|(desc, _)| desc.clone())
            .collect();
        let unmet: Vec<String> = results
            .iter()
            .filter(|(_, ok)| !*ok)
            .map(|(desc, _)| desc.clone())
            .collect();

        if unmet.is_empty() {
            return WaitResult {
                success: true,
                duration_ms: started.elapsed().as_millis() as u64,
                met_conditions: met,
                unmet_conditions: unmet,
                reason: WaitReason::Completed,
            };
        }

        if started.elapsed() >= options.max_wait {
            return WaitResult {
                success: false,
                duration_ms: started.elapsed().as_millis() as u64,
                met_conditions: met,
                unmet_conditions: unmet,
                reason: WaitReason::Timeout,
            };
        }

        tokio::select! {
            _ = tokio::time::sleep(options.check_interval) => {}
            _ = cancel.cancelled() => {
                return WaitResult {
                    success: false,
                    duration_ms: started.elapsed().as_millis() as u64,
                    met_conditions: met,
                    unmet_conditions: unmet,
                    reason: WaitReason::Timeout,
                };
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use agentcore_browser_context::fake::FakeBrowserContext;
    use agentcore_browser_context::snapshot::BrowserState;
    use agentcore_browser_context::BrowserContext;

    #[tokio::test]
    async fn fast_preset_times_out_against_fake_page() {
        let ctx = FakeBrowserContext::new(vec![BrowserState::empty("https://a", "A", "t1")]);
        let page = ctx.current_page().await.unwrap();
        let result = wait_for(
            page.as_ref(),
            WaitOptions::preset(WaitPreset::Fast)
                .with_max_wait(Duration::from_millis(250))
                .with_min_wait(Duration::from_millis(10)),
            &CancellationToken::new(),
        )
        .await;
        // FakePage::evaluate always returns Null -> condition never met.
        assert!(!result.success);
        assert_eq!(result.reason, WaitReason::Timeout);
    }

    #[tokio::test]
    async fn cancelling_mid_poll_returns_before_max_wait() {
        let ctx = FakeBrowserContext::new(vec![BrowserState::empty("https://a", "A", "t1")]);
        let page = ctx.current_page().await.unwrap();
        let cancel = CancellationToken::new();
        let cancel_for_task = cancel.clone();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(30)).await;
            cancel_for_task.cancel();
        });
        let started = Instant::now();
        let result = wait_for(
            page.as_ref(),
            WaitOptions {
                check_interval: Duration::from_millis(20),
                ..WaitOptions::preset(WaitPreset::Fast)
                    .with_max_wait(Duration::from_secs(30))
                    .with_min_wait(Duration::from_millis(10))
            },
            &cancel,
        )
        .await;
        assert!(!result.success);
        assert_eq!(result.reason, WaitReason::Timeout);
        assert!(started.elapsed() < Duration::from_secs(1));
    }

    #[tokio::test]
    async fn empty_conditions_return_immediately_after_min_wait() {
        let ctx = FakeBrowserContext::new(vec![BrowserState::empty("https://a", "A", "t1")]);
        let page = ctx.current_page().await.unwrap();
        let result = wait_for(
            page.as_ref(),
            WaitOptions {
                conditions: Some(Vec::new()),
                min_wait: Duration::from_millis(5),
                ..WaitOptions::default()
            },
            &CancellationToken::new(),
        )
        .await;
        assert!(result.success);
        assert_eq!(result.reason, WaitReason::MinWaitReached);
    }
}
