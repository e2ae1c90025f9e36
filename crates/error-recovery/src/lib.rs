//! Error recovery (§4.4): wraps any core-facing, element-touching action
//! with a prioritized, time-bounded set of recovery strategies.

pub mod strategies;
pub mod types;

pub use strategies::{default_catalog, RecoveryStrategy};
pub use types::{ActionKind, AttemptLog, RecoveryContext, RecoveryOutcome, RecoveryRunResult};

use std::future::Future;
use std::time::{Duration, Instant};

use agentcore_browser_context::BrowserContext;

const STRATEGY_TIMEOUT: Duration = Duration::from_secs(5);

/// Runs `action` and, on failure, tries applicable strategies from
/// `catalog` in descending priority order, re-invoking `action` whenever a
/// strategy returns `should_retry`. Strategies run at most
/// `ctx.max_attempts` times across the whole call (default 3); each
/// strategy is raced against a 5s timeout.
pub async fn execute_with_recovery<F, Fut, T>(
    mut action: F,
    mut ctx: RecoveryContext,
    browser: &dyn BrowserContext,
    catalog: &[Box<dyn RecoveryStrategy>],
) -> RecoveryRunResult<T>
where
    F: FnMut(Option<action_locator::TargetingStrategy>) -> Fut,
    Fut: Future<Output = Result<T, String>>,
{
    match action(ctx.targeting_strategy.clone()).await {
        Ok(v) => return RecoveryRunResult::Success(v),
        Err(e) => ctx.original_error = e,
    }

    let mut applicable: Vec<&Box<dyn RecoveryStrategy>> =
        catalog.iter().filter(|s| s.is_applicable(&ctx)).collect();
    applicable.sort_by(|a, b| b.priority().cmp(&a.priority()));

    let mut attempts: Vec<AttemptLog> = Vec::new();

    if applicable.is_empty() {
        return RecoveryRunResult::Failed {
            error: ctx.original_error,
            attempts,
        };
    }

    let mut strategy_idx = 0usize;
    while ctx.attempt_count < ctx.max_attempts && strategy_idx < applicable.len() {
        if ctx.cancel_token.is_cancelled() {
            return RecoveryRunResult::Failed {
                error: "cancelled".to_string(),
                attempts,
            };
        }

        let strategy = applicable[strategy_idx];
        strategy_idx += 1;
        ctx.attempt_count += 1;

        let started = Instant::now();
        let outcome = match tokio::time::timeout(STRATEGY_TIMEOUT, strategy.attempt(&mut ctx, browser)).await {
            Ok(o) => o,
            Err(_) => RecoveryOutcome::timed_out(strategy.name()),
        };
        attempts.push(AttemptLog {
            strategy: strategy.name().to_string(),
            message: outcome.message.clone(),
            duration_ms: started.elapsed().as_millis() as u64,
        });

        if outcome.should_continue && !outcome.should_retry {
            return RecoveryRunResult::GracefulContinue {
                message: outcome.message,
                attempts,
            };
        }

        if outcome.should_retry && outcome.success {
            if let Some(modified) = outcome.modified_strategy {
                ctx.targeting_strategy = Some(modified);
            }
            match action(ctx.targeting_strategy.clone()).await {
                Ok(v) => return RecoveryRunResult::Success(v),
                Err(e) => {
                    ctx.original_error = e;
                    continue;
                }
            }
        }
    }

    RecoveryRunResult::Failed {
        error: ctx.original_error,
        attempts,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use action_locator::TargetingStrategy;
    use agentcore_browser_context::fake::FakeBrowserContext;
    use agentcore_browser_context::snapshot::BrowserState;
    use std::sync::atomic::{AtomicU32, Ordering};

    #[tokio::test]
    async fn succeeds_without_recovery_when_first_try_works() {
        let ctx_browser = FakeBrowserContext::new(vec![BrowserState::empty("https://a", "A", "t1")]);
        let recovery_ctx = RecoveryContext::new(ActionKind::Click, None);
        let result = execute_with_recovery(
            |_s| async { Ok::<_, String>(42) },
            recovery_ctx,
            ctx_browser.as_ref(),
            &default_catalog(),
        )
        .await;
        match result {
            RecoveryRunResult::Success(v) => assert_eq!(v, 42),
            _ => panic!("expected success"),
        }
    }

    #[tokio::test]
    async fn exhausting_strategies_ends_in_graceful_continue() {
        let ctx_browser = FakeBrowserContext::new(vec![BrowserState::empty("https://a", "A", "t1")]);
        let recovery_ctx = RecoveryContext::new(ActionKind::Other, None).with_max_attempts(1);
        let calls = AtomicU32::new(0);
        let result = execute_with_recovery(
            |_s| {
                calls.fetch_add(1, Ordering::SeqCst);
                async { Err::<i32, _>("boom".to_string()) }
            },
            recovery_ctx,
            ctx_browser.as_ref(),
            &default_catalog(),
        )
        .await;
        // Only graceful_continuation is applicable to ActionKind::Other, and
        // max_attempts=1 means exactly one strategy runs.
        match result {
            RecoveryRunResult::GracefulContinue { attempts, .. } => {
                assert_eq!(attempts.len(), 1);
                assert_eq!(attempts[0].strategy, "graceful_continuation");
            }
            _ => panic!("expected graceful continue"),
        }
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn element_research_retargets_after_refresh() {
        let ctx_browser = FakeBrowserContext::new(vec![BrowserState::empty("https://a", "A", "t1")]);
        let strategy = TargetingStrategy::by_index(3).with_text("Login");
        let recovery_ctx = RecoveryContext::new(ActionKind::Click, Some(strategy));
        let attempt = AtomicU32::new(0);
        let result = execute_with_recovery(
            |_s| {
                let n = attempt.fetch_add(1, Ordering::SeqCst);
                async move {
                    if n == 0 {
                        Err("element not found".to_string())
                    } else {
                        Ok(())
                    }
                }
            },
            recovery_ctx,
            ctx_browser.as_ref(),
            &default_catalog(),
        )
        .await;
        assert!(matches!(result, RecoveryRunResult::Success(())));
    }
}
