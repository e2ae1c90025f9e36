//! Configuration surface (§6) recognized by the Executor and its agent trio.

use serde::{Deserialize, Serialize};

/// Options an embedding host may set on a task. Field names and defaults
/// follow the configuration surface contract verbatim.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AgentOptions {
    /// Absolute loop bound. Default: 50.
    pub max_steps: u32,

    /// LLM hard-capped to this many actions per Navigator step. Default: 10.
    pub max_actions_per_step: u32,

    /// Navigation failure cutoff. Default: 3.
    pub max_failures: u32,

    /// Validator cutoff. Default: 3.
    pub max_validator_failures: u32,

    /// Plan every N steps; 0 means "plan only at step 0" (§9 Open
    /// Questions — picked consistently rather than rejected at parse time).
    /// Default: 5.
    pub planning_interval: u32,

    /// Navigator may request screenshot capability.
    pub use_vision: bool,

    /// Whether Validator is consulted on the `done` path.
    pub validate_output: bool,

    /// IntelligentWaiting lower bound for navigation, in milliseconds.
    pub min_wait_page_load_ms: u64,

    /// Target token budget for message-history compaction.
    pub max_input_tokens: u32,

    /// Whether the Executor persists step history for replay.
    pub replay_historical_tasks: bool,
}

impl Default for AgentOptions {
    fn default() -> Self {
        Self {
            max_steps: 50,
            max_actions_per_step: 10,
            max_failures: 3,
            max_validator_failures: 3,
            planning_interval: 5,
            use_vision: false,
            validate_output: false,
            min_wait_page_load_ms: 1_000,
            max_input_tokens: 8_000,
            replay_historical_tasks: false,
        }
    }
}

impl AgentOptions {
    pub fn new() -> Self {
        Self::default()
    }

    /// A tight configuration useful for tests and examples: few steps, no
    /// planner cadence beyond step 0, no validator round-trip.
    pub fn minimal() -> Self {
        Self {
            max_steps: 10,
            max_actions_per_step: 3,
            max_failures: 2,
            max_validator_failures: 1,
            planning_interval: 0,
            use_vision: false,
            validate_output: false,
            min_wait_page_load_ms: 250,
            max_input_tokens: 2_000,
            replay_historical_tasks: false,
        }
    }

    /// A configuration with output validation and vision both enabled.
    pub fn thorough() -> Self {
        Self {
            use_vision: true,
            validate_output: true,
            ..Self::default()
        }
    }

    pub fn max_steps(mut self, steps: u32) -> Self {
        self.max_steps = steps;
        self
    }

    pub fn vision(mut self, enabled: bool) -> Self {
        self.use_vision = enabled;
        self
    }

    pub fn validate_output(mut self, enabled: bool) -> Self {
        self.validate_output = enabled;
        self
    }

    pub fn planning_interval(mut self, steps: u32) -> Self {
        self.planning_interval = steps;
        self
    }

    pub fn replay_historical_tasks(mut self, enabled: bool) -> Self {
        self.replay_historical_tasks = enabled;
        self
    }

    /// §9 Open Questions: `planningInterval=0` is treated as "plan only at
    /// step 0" rather than rejected — so a plan is due exactly when
    /// `n_steps == 0`, or, for a nonzero interval, every `planning_interval`
    /// steps.
    pub fn plan_due(&self, n_steps: u32) -> bool {
        if self.planning_interval == 0 {
            n_steps == 0
        } else {
            n_steps % self.planning_interval == 0
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_configuration_surface() {
        let opts = AgentOptions::default();
        assert_eq!(opts.max_steps, 50);
        assert_eq!(opts.max_actions_per_step, 10);
        assert_eq!(opts.max_failures, 3);
        assert_eq!(opts.max_validator_failures, 3);
        assert_eq!(opts.planning_interval, 5);
    }

    #[test]
    fn builder_chains() {
        let opts = AgentOptions::new().max_steps(20).vision(true).validate_output(true);
        assert_eq!(opts.max_steps, 20);
        assert!(opts.use_vision);
        assert!(opts.validate_output);
    }

    #[test]
    fn zero_planning_interval_plans_only_at_step_zero() {
        let opts = AgentOptions::new().planning_interval(0);
        assert!(opts.plan_due(0));
        assert!(!opts.plan_due(1));
        assert!(!opts.plan_due(5));
    }

    #[test]
    fn nonzero_planning_interval_plans_periodically() {
        let opts = AgentOptions::default();
        assert!(opts.plan_due(0));
        assert!(!opts.plan_due(3));
        assert!(opts.plan_due(5));
        assert!(opts.plan_due(10));
    }
}
