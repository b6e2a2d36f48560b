use std::{collections::HashMap, fmt, ops::Range, str::FromStr};

use crate::{
    error::ConfigError,
    geometry::{Geometry, Tag},
    trace::{AccessKind, TraceAccess},
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReplacementPolicy {
    Lru,
    Fifo,
}

impl FromStr for ReplacementPolicy {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "l" | "lru" => Ok(Self::Lru),
            "f" | "fifo" => Ok(Self::Fifo),
            _ => Err(ConfigError::UnknownPolicy(s.to_string())),
        }
    }
}

impl fmt::Display for ReplacementPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ReplacementPolicy::Lru => write!(f, "LRU"),
            ReplacementPolicy::Fifo => write!(f, "FIFO"),
        }
    }
}

impl ReplacementPolicy {
    /// Picks the offset within `set` to overwrite on a miss.
    ///
    /// An unwritten line always wins, lowest offset first. Otherwise LRU
    /// evicts the line whose block was referenced longest ago and FIFO the
    /// line whose block first appeared earliest in the trace, even if that
    /// block has since been evicted and reloaded. A line with no recorded
    /// reference counts as older than any other.
    fn select_victim(&self, set: &[CacheLine]) -> usize {
        if let Some(empty) = set.iter().position(|line| !line.valid) {
            return empty;
        }
        let victim = match self {
            ReplacementPolicy::Lru => set
                .iter()
                .enumerate()
                .min_by_key(|(_, line)| line.last_used),
            ReplacementPolicy::Fifo => set
                .iter()
                .enumerate()
                .min_by_key(|(_, line)| line.first_referenced),
        };
        victim.map(|(idx, _)| idx).unwrap_or(0)
    }
}

#[derive(Debug, Clone)]
pub struct CacheConfig {
    pub memory_size: u64,   // in Bytes
    pub cache_size: u64,    // in Bytes
    pub line_size: u64,     // in Bytes
    pub associativity: u64, // set to 1 for Direct-Mapped
    pub policy: ReplacementPolicy,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            memory_size: 64 * 1024,
            cache_size: 1024,
            line_size: 16,
            associativity: 2,
            policy: ReplacementPolicy::Lru,
        }
    }
}

impl CacheConfig {
    pub fn geometry(&self) -> Result<Geometry, ConfigError> {
        Geometry::new(
            self.memory_size,
            self.cache_size,
            self.line_size,
            self.associativity,
        )
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    Pending,
    Hit,
    Miss,
}

impl fmt::Display for Outcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(match self {
            Outcome::Pending => "pending",
            Outcome::Hit => "hit",
            Outcome::Miss => "miss",
        })
    }
}

/// One trace entry after address decomposition. `outcome` starts out
/// `Pending` and is resolved exactly once during replay.
#[derive(Debug, Clone, Copy)]
pub struct Access {
    pub kind: AccessKind,
    pub address: u64,
    pub block: u64,
    pub set_index: usize,
    pub tag: Tag,
    pub outcome: Outcome,
}

impl Access {
    pub fn decompose(entry: &TraceAccess, geometry: &Geometry) -> Self {
        let parts = geometry.decompose(entry.address);
        Self {
            kind: entry.kind,
            address: entry.address,
            block: parts.block,
            set_index: parts.set_index,
            tag: parts.tag,
            outcome: Outcome::Pending,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CacheLine {
    pub valid: bool,
    pub dirty: bool,
    pub tag: Tag,
    pub block: Option<u64>,
    last_used: Option<u64>,
    first_referenced: Option<u64>,
}

impl CacheLine {
    fn invalid() -> Self {
        Self {
            valid: false,
            dirty: false,
            tag: Tag::default(),
            block: None,
            last_used: None,
            first_referenced: None,
        }
    }
}

/// Every physical line of the cache, stored set after set.
#[derive(Debug, Clone)]
pub struct CacheState {
    lines: Vec<CacheLine>,
    ways: usize,
}

impl CacheState {
    pub fn new(geometry: &Geometry) -> Self {
        Self {
            lines: vec![CacheLine::invalid(); geometry.num_lines as usize],
            ways: geometry.associativity as usize,
        }
    }

    pub fn lines(&self) -> &[CacheLine] {
        &self.lines
    }

    pub fn get_line(&self, set_index: usize, offset: usize) -> &CacheLine {
        assert!(
            offset < self.ways,
            "offset {offset} outside a {}-way set",
            self.ways
        );
        &self.lines[set_index * self.ways + offset]
    }

    pub fn lines_in_set(&self, set_index: usize) -> Range<usize> {
        set_index * self.ways..(set_index + 1) * self.ways
    }

    fn set(&self, set_index: usize) -> &[CacheLine] {
        &self.lines[self.lines_in_set(set_index)]
    }

    fn find_line(&self, set_index: usize, tag: Tag) -> Option<usize> {
        self.set(set_index)
            .iter()
            .position(|line| line.valid && line.tag == tag)
    }

    /// `first_seen` is the trace position where `block` was first referenced.
    pub fn install(
        &mut self,
        line_index: usize,
        tag: Tag,
        block: u64,
        is_write: bool,
        tick: u64,
        first_seen: u64,
    ) {
        let line = &mut self.lines[line_index];
        line.valid = true;
        line.dirty = is_write;
        line.tag = tag;
        line.block = Some(block);
        line.last_used = Some(tick);
        line.first_referenced = Some(first_seen);
    }

    pub fn mark_dirty(&mut self, line_index: usize) {
        self.lines[line_index].dirty = true;
    }

    fn touch(&mut self, line_index: usize, tick: u64) {
        self.lines[line_index].last_used = Some(tick);
    }
}

/// Replays a trace against a single cache, one access at a time.
pub struct Cache {
    geometry: Geometry,
    policy: ReplacementPolicy,
    state: CacheState,
    first_seen: HashMap<u64, u64>,
    tick: u64,
}

impl Cache {
    pub fn new(config: &CacheConfig) -> Result<Self, ConfigError> {
        Ok(Self::with_geometry(config.geometry()?, config.policy))
    }

    pub fn with_geometry(geometry: Geometry, policy: ReplacementPolicy) -> Self {
        Self {
            state: CacheState::new(&geometry),
            geometry,
            policy,
            first_seen: HashMap::new(),
            tick: 0,
        }
    }

    pub fn into_state(self) -> CacheState {
        self.state
    }

    /// Decomposes and replays `trace` in order. Every address is checked
    /// against main memory before the first access is simulated.
    pub fn run_trace(&mut self, trace: &[TraceAccess]) -> Result<Vec<Access>, ConfigError> {
        if let Some(bad) = trace
            .iter()
            .find(|entry| entry.address >= self.geometry.memory_size)
        {
            return Err(ConfigError::AddressOutOfRange {
                address: bad.address,
                memory_size: self.geometry.memory_size,
            });
        }
        let mut accesses: Vec<Access> = trace
            .iter()
            .map(|entry| Access::decompose(entry, &self.geometry))
            .collect();
        for access in &mut accesses {
            self.process_access(access);
        }
        Ok(accesses)
    }

    fn process_access(&mut self, access: &mut Access) {
        debug_assert!((access.set_index as u64) < self.geometry.num_sets);
        let base = self.state.lines_in_set(access.set_index).start;
        let is_write = matches!(access.kind, AccessKind::Write);
        let first_seen = *self.first_seen.entry(access.block).or_insert(self.tick);

        if let Some(offset) = self.state.find_line(access.set_index, access.tag) {
            self.state.touch(base + offset, self.tick);
            if is_write {
                self.state.mark_dirty(base + offset);
            }
            access.outcome = Outcome::Hit;
            tracing::debug!(
                address = access.address,
                block = access.block,
                line = base + offset,
                "hit"
            );
        } else {
            let offset = self.policy.select_victim(self.state.set(access.set_index));
            let line_index = base + offset;
            let evicted = self.state.lines()[line_index].block;
            self.state.install(
                line_index,
                access.tag,
                access.block,
                is_write,
                self.tick,
                first_seen,
            );
            access.outcome = Outcome::Miss;
            tracing::debug!(
                address = access.address,
                block = access.block,
                line = line_index,
                ?evicted,
                "miss"
            );
        }
        self.tick += 1;
    }
}

/// Everything a single run produces.
#[derive(Debug, Clone)]
pub struct Simulation {
    pub geometry: Geometry,
    pub policy: ReplacementPolicy,
    pub accesses: Vec<Access>,
    pub cache: CacheState,
}

pub fn simulate(config: &CacheConfig, trace: &[TraceAccess]) -> Result<Simulation, ConfigError> {
    replay(config.geometry()?, config.policy, trace)
}

/// Same as [`simulate`] for a geometry that has already been derived.
pub fn replay(
    geometry: Geometry,
    policy: ReplacementPolicy,
    trace: &[TraceAccess],
) -> Result<Simulation, ConfigError> {
    let mut cache = Cache::with_geometry(geometry, policy);
    let accesses = cache.run_trace(trace)?;
    Ok(Simulation {
        geometry: cache.geometry,
        policy: cache.policy,
        accesses,
        cache: cache.into_state(),
    })
}
