use std::fmt;
use crate::{
    analysis::HitRates,
    cache::{CacheConfig, ReplacementPolicy, replay},
    error::SimError,
    trace::TraceFile,
};

#[derive(Clone)]
pub struct ScenarioConfig {
    pub label: String, // Label to be printed for the Result
    pub config: CacheConfig,
}

pub struct ScenarioResult {
    pub label: String, // Label to be printed for the Result
    pub trace_results: Vec<TraceResult>,
}

pub struct TraceResult {
    pub trace_name: String,
    pub rates: Result<HitRates, SimError>,
}

impl fmt::Display for ScenarioResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "{}", self.label)?;
        for result in &self.trace_results {
            match &result.rates {
                Ok(rates) => writeln!(
                    f,
                    "  {:<16} hit-rate: {:>5.1}% optimal: {:>5.1}%",
                    result.trace_name,
                    rates.achieved(),
                    rates.optimal()
                )?,
                Err(err) => writeln!(f, "  {:<16} {err}", result.trace_name)?,
            }
        }
        Ok(())
    }
}

pub fn run_scenarios(traces: &[TraceFile], scenarios: &[ScenarioConfig]) -> Vec<ScenarioResult> {
    let mut results = Vec::new();
    for scenario in scenarios {
        let geometry = scenario.config.geometry();
        let mut per_trace = Vec::new();
        for trace in traces {
            let rates = geometry
                .clone()
                .and_then(|geometry| replay(geometry, scenario.config.policy, &trace.entries))
                .map_err(SimError::from)
                .and_then(|sim| HitRates::compute(&sim.accesses));
            per_trace.push(TraceResult {
                trace_name: trace.name.clone(),
                rates,
            });
        }
        results.push(ScenarioResult {
            label: scenario.label.clone(),
            trace_results: per_trace,
        });
    }
    results
}

/// Every power-of-two associativity the cache can hold, from direct mapped
/// up to fully associative, under both replacement policies.
pub fn associativity_sweep(base: &CacheConfig) -> Vec<ScenarioConfig> {
    let lines = base.cache_size / base.line_size.max(1);
    let ways = std::iter::successors(Some(1u64), |w| w.checked_mul(2)).take_while(|w| *w <= lines);
    let mut scenarios = Vec::new();
    for assoc in ways {
        for policy in [ReplacementPolicy::Lru, ReplacementPolicy::Fifo] {
            let mut cfg = base.clone();
            cfg.associativity = assoc;
            cfg.policy = policy;
            let label = match assoc {
                1 => format!("Direct-Mapped {policy}"),
                n if n == lines => format!("Fully-Associative {policy}"),
                n => format!("{n}-way SA {policy}"),
            };
            scenarios.push(ScenarioConfig { label, config: cfg });
        }
    }
    scenarios
}
