//! Text tables for a finished simulation.

use std::fmt::{self, Write};

use crate::{
    analysis::HitRates,
    cache::{Access, CacheState, Simulation},
    error::SimError,
    geometry::Geometry,
};

const UNKNOWN: &str = "xxx";

pub fn address_layout(geometry: &Geometry) -> Result<String, fmt::Error> {
    let mut out = String::new();
    writeln!(out, "Total address lines required = {}", geometry.address_bits)?;
    writeln!(out, "Number of bits for offset = {}", geometry.offset_bits)?;
    writeln!(out, "Number of bits for index = {}", geometry.index_bits)?;
    writeln!(out, "Number of bits for tag = {}", geometry.tag_bits)?;
    writeln!(
        out,
        "Total cache size required = {} bytes",
        geometry.total_cache_bytes()
    )?;
    Ok(out)
}

pub fn access_table(cache: &CacheState, accesses: &[Access]) -> Result<String, fmt::Error> {
    let mut out = String::new();
    writeln!(
        out,
        "{:>2} {:>19} {:>10} {:>10} {:>20} {:>9}",
        "op", "main memory address", "mm blk #", "cm set #", "cm blk #", "hit/miss"
    )?;
    writeln!(out, "{}", "-".repeat(75))?;
    for access in accesses {
        writeln!(
            out,
            "{:>2} {:>19} {:>10} {:>10} {:>20} {:>9}",
            access.kind,
            access.address,
            access.block,
            access.set_index,
            candidate_lines(cache, access.set_index),
            access.outcome
        )?;
    }
    Ok(out)
}

/// Lines a block in `set_index` may occupy, e.g. `4 or 5`.
fn candidate_lines(cache: &CacheState, set_index: usize) -> String {
    cache
        .lines_in_set(set_index)
        .map(|line| line.to_string())
        .collect::<Vec<_>>()
        .join(" or ")
}

pub fn cache_table(geometry: &Geometry, cache: &CacheState) -> Result<String, fmt::Error> {
    let mut out = String::new();
    writeln!(
        out,
        "{:>11} {:>9} {:>9} {:>16} {:>10}",
        "cache blk #", "dirty bit", "valid bit", "tag", "data"
    )?;
    writeln!(out, "{}", "-".repeat(59))?;
    for set_index in 0..geometry.num_sets as usize {
        for (offset, idx) in cache.lines_in_set(set_index).enumerate() {
            let line = cache.get_line(set_index, offset);
            let tag = if line.valid {
                line.tag.to_string()
            } else {
                UNKNOWN.to_string()
            };
            let data = match line.block {
                Some(block) => format!("mm blk # {block}"),
                None => UNKNOWN.to_string(),
            };
            writeln!(
                out,
                "{:>11} {:>9} {:>9} {:>16} {:>10}",
                idx, line.dirty as u8, line.valid as u8, tag, data
            )?;
        }
    }
    Ok(out)
}

pub fn hit_rates(rates: &Result<HitRates, SimError>) -> Result<String, fmt::Error> {
    let mut out = String::new();
    match rates {
        Ok(rates) => {
            writeln!(
                out,
                "References = {} ({} reads, {} writes)",
                rates.accesses, rates.reads, rates.writes
            )?;
            writeln!(out, "Highest possible hit rate = {:.1}%", rates.optimal())?;
            writeln!(out, "Actual hit rate = {:.1}%", rates.achieved())?;
        }
        Err(err) => writeln!(out, "Hit rates unavailable: {err}")?,
    }
    Ok(out)
}

/// Full report for one run, in the order it is printed.
pub fn render(sim: &Simulation, show_accesses: bool) -> Result<String, fmt::Error> {
    let mut out = String::new();
    writeln!(out, "Simulator Output:")?;
    out.push_str(&address_layout(&sim.geometry)?);
    writeln!(out, "Replacement policy = {}", sim.policy)?;
    writeln!(out)?;
    out.push_str(&hit_rates(&HitRates::compute(&sim.accesses))?);
    if show_accesses {
        writeln!(out)?;
        out.push_str(&access_table(&sim.cache, &sim.accesses)?);
    }
    writeln!(out, "\nFinal \"status\" of the cache:")?;
    out.push_str(&cache_table(&sim.geometry, &sim.cache)?);
    Ok(out)
}
