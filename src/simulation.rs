//! Injectable source of every simulated outcome: scores, jitter, rule checks,
//! stage and tool results, command delays.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Mutex;
use std::time::Duration;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use crate::commands::CommandType;
use crate::config::SimulationConfig;
use crate::pipeline::state::StageName;

/// Jitter factors are drawn from `1.0 ± JITTER_SPREAD`.
pub const JITTER_SPREAD: f64 = 0.25;

pub trait SimulationPolicy: Send + Sync {
    /// Fresh performance score for an agent. Callers clamp to [0, 100].
    fn performance_score(&self, agent_id: &str) -> f64;

    /// Multiplicative jitter within `[1 - JITTER_SPREAD, 1 + JITTER_SPREAD]`.
    fn jitter(&self) -> f64;

    fn rule_passes(&self, rule_id: &str) -> bool;

    fn stage_succeeds(&self, stage: StageName) -> bool;

    fn tool_succeeds(&self, tool_id: &str) -> bool;

    /// Simulated duration of a command executor run, before time scaling.
    fn command_delay_ms(&self, command_type: CommandType) -> u64;
}

/// Production policy backed by a seedable RNG.
pub struct RandomPolicy {
    rng: Mutex<StdRng>,
    rule_pass_rate: f64,
    stage_failure_rate: f64,
    tool_failure_rate: f64,
}

impl RandomPolicy {
    pub fn from_config(config: &SimulationConfig) -> Self {
        let rng = match config.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        Self {
            rng: Mutex::new(rng),
            rule_pass_rate: config.rule_pass_rate,
            stage_failure_rate: config.stage_failure_rate,
            tool_failure_rate: config.tool_failure_rate,
        }
    }

    fn with_rng<T>(&self, f: impl FnOnce(&mut StdRng) -> T) -> T {
        let mut guard = self.rng.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
        f(&mut guard)
    }
}

impl SimulationPolicy for RandomPolicy {
    fn performance_score(&self, _agent_id: &str) -> f64 {
        self.with_rng(|rng| rng.gen_range(40.0..=100.0))
    }

    fn jitter(&self) -> f64 {
        self.with_rng(|rng| rng.gen_range((1.0 - JITTER_SPREAD)..=(1.0 + JITTER_SPREAD)))
    }

    fn rule_passes(&self, _rule_id: &str) -> bool {
        self.with_rng(|rng| rng.gen_bool(self.rule_pass_rate))
    }

    fn stage_succeeds(&self, _stage: StageName) -> bool {
        self.with_rng(|rng| !rng.gen_bool(self.stage_failure_rate))
    }

    fn tool_succeeds(&self, _tool_id: &str) -> bool {
        self.with_rng(|rng| !rng.gen_bool(self.tool_failure_rate))
    }

    fn command_delay_ms(&self, command_type: CommandType) -> u64 {
        let (lo, hi) = match command_type {
            CommandType::Parallel => (500, 1500),
            CommandType::Recursive => (1000, 3000),
            CommandType::Persistent => (300, 800),
        };
        self.with_rng(|rng| rng.gen_range(lo..=hi))
    }
}

/// Deterministic policy with fixed outcomes.
///
/// Rule checks are counted globally; with `rule_failure_every = Some(n)` every
/// n-th check fails, so `k` checks produce exactly `k / n` violations.
pub struct ScriptedPolicy {
    pub default_score: f64,
    pub scores: HashMap<String, f64>,
    pub jitter: f64,
    pub rule_failure_every: Option<u64>,
    pub failing_stage: Option<StageName>,
    pub failing_tools: Vec<String>,
    pub command_delay_ms: u64,
    rule_checks: AtomicU64,
}

impl ScriptedPolicy {
    /// Everything succeeds, scores are 80, no jitter, no delay.
    pub fn passing() -> Self {
        Self {
            default_score: 80.0,
            scores: HashMap::new(),
            jitter: 1.0,
            rule_failure_every: None,
            failing_stage: None,
            failing_tools: Vec::new(),
            command_delay_ms: 0,
            rule_checks: AtomicU64::new(0),
        }
    }

    pub fn with_score(mut self, agent_id: &str, score: f64) -> Self {
        self.scores.insert(agent_id.to_string(), score);
        self
    }

    pub fn with_rule_failure_every(mut self, n: u64) -> Self {
        self.rule_failure_every = Some(n.max(1));
        self
    }

    pub fn with_failing_stage(mut self, stage: StageName) -> Self {
        self.failing_stage = Some(stage);
        self
    }

    pub fn with_failing_tool(mut self, tool_id: &str) -> Self {
        self.failing_tools.push(tool_id.to_string());
        self
    }

    pub fn rule_checks(&self) -> u64 {
        self.rule_checks.load(Ordering::SeqCst)
    }
}

impl Default for ScriptedPolicy {
    fn default() -> Self {
        Self::passing()
    }
}

impl SimulationPolicy for ScriptedPolicy {
    fn performance_score(&self, agent_id: &str) -> f64 {
        self.scores.get(agent_id).copied().unwrap_or(self.default_score)
    }

    fn jitter(&self) -> f64 {
        self.jitter
    }

    fn rule_passes(&self, _rule_id: &str) -> bool {
        let n = self.rule_checks.fetch_add(1, Ordering::SeqCst) + 1;
        match self.rule_failure_every {
            Some(every) => n % every != 0,
            None => true,
        }
    }

    fn stage_succeeds(&self, stage: StageName) -> bool {
        self.failing_stage != Some(stage)
    }

    fn tool_succeeds(&self, tool_id: &str) -> bool {
        !self.failing_tools.iter().any(|t| t == tool_id)
    }

    fn command_delay_ms(&self, _command_type: CommandType) -> u64 {
        self.command_delay_ms
    }
}

/// Upper bound for one scaled simulated wait.
pub const MAX_SCALED: Duration = Duration::from_secs(24 * 60 * 60);

/// Scale a simulated duration by the configured time scale.
///
/// Non-positive or NaN scales yield zero; anything unrepresentable or larger
/// than [`MAX_SCALED`] is clamped to it.
pub fn scaled(duration_ms: u64, time_scale: f64) -> Duration {
    if time_scale.is_nan() || time_scale <= 0.0 || duration_ms == 0 {
        return Duration::ZERO;
    }
    Duration::try_from_secs_f64(duration_ms as f64 * time_scale / 1000.0)
        .map_or(MAX_SCALED, |d| d.min(MAX_SCALED))
}

/// Sleep for a simulated duration; returns immediately at time scale zero.
pub async fn simulate_work(duration_ms: u64, time_scale: f64) {
    let d = scaled(duration_ms, time_scale);
    if !d.is_zero() {
        tokio::time::sleep(d).await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_seeded_policy_is_reproducible() {
        let config = SimulationConfig { seed: Some(7), ..Default::default() };
        let a = RandomPolicy::from_config(&config);
        let b = RandomPolicy::from_config(&config);
        for _ in 0..10 {
            assert_eq!(a.jitter(), b.jitter());
        }
    }

    #[test]
    fn test_jitter_within_spread() {
        let policy = RandomPolicy::from_config(&SimulationConfig::default());
        for _ in 0..200 {
            let j = policy.jitter();
            assert!((0.75..=1.25).contains(&j));
        }
    }

    #[test]
    fn test_zero_failure_rates_always_succeed() {
        let policy = RandomPolicy::from_config(&SimulationConfig {
            rule_pass_rate: 1.0,
            ..Default::default()
        });
        for _ in 0..100 {
            assert!(policy.rule_passes("parallel-x"));
            assert!(policy.stage_succeeds(StageName::Build));
            assert!(policy.tool_succeeds("tool-001"));
        }
    }

    #[test]
    fn test_scripted_rule_failures_are_exact() {
        let policy = ScriptedPolicy::passing().with_rule_failure_every(10);
        let failures = (0..120).filter(|_| !policy.rule_passes("parallel-x")).count();
        assert_eq!(failures, 12);
        assert_eq!(policy.rule_checks(), 120);
    }

    #[test]
    fn test_scripted_failing_stage() {
        let policy = ScriptedPolicy::passing().with_failing_stage(StageName::Build);
        assert!(policy.stage_succeeds(StageName::Validate));
        assert!(!policy.stage_succeeds(StageName::Build));
    }

    #[test]
    fn test_scaled_duration() {
        assert_eq!(scaled(1000, 0.0), Duration::ZERO);
        assert_eq!(scaled(1000, 1.0), Duration::from_secs(1));
        assert_eq!(scaled(2000, 0.5), Duration::from_secs(1));
    }

    #[test]
    fn test_scaled_never_panics_on_odd_scales() {
        assert_eq!(scaled(1000, f64::NAN), Duration::ZERO);
        assert_eq!(scaled(1000, -2.0), Duration::ZERO);
        assert_eq!(scaled(1000, f64::INFINITY), MAX_SCALED);
        assert_eq!(scaled(u64::MAX, 1e300), MAX_SCALED);
    }
}
