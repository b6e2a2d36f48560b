use std::collections::HashSet;

use crate::{
    cache::{Access, Outcome},
    error::SimError,
    trace::AccessKind,
};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HitRates {
    pub accesses: u64,
    pub reads: u64,
    pub writes: u64,
    pub hits: u64,
    /// Accesses whose block was referenced at least once before.
    pub reuse_hits: u64,
}

impl HitRates {
    pub fn compute(accesses: &[Access]) -> Result<Self, SimError> {
        if accesses.is_empty() {
            return Err(SimError::EmptyTrace);
        }
        let mut rates = Self {
            accesses: accesses.len() as u64,
            reads: 0,
            writes: 0,
            hits: 0,
            reuse_hits: 0,
        };
        let mut seen = HashSet::new();
        for access in accesses {
            match access.kind {
                AccessKind::Read => rates.reads += 1,
                AccessKind::Write => rates.writes += 1,
            }
            if access.outcome == Outcome::Hit {
                rates.hits += 1;
            }
            if !seen.insert(access.block) {
                rates.reuse_hits += 1;
            }
        }
        Ok(rates)
    }

    /// Achieved hit rate, in percent.
    pub fn achieved(&self) -> f64 {
        self.hits as f64 / self.accesses as f64 * 100.0
    }

    /// Best hit rate any cache could reach on this trace, in percent.
    pub fn optimal(&self) -> f64 {
        self.reuse_hits as f64 / self.accesses as f64 * 100.0
    }
}
