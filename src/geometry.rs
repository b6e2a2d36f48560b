//! Address layout of a set-associative cache.
//!
//! A [`Geometry`] is derived once from the four size parameters and then
//! splits every main-memory address into the block it belongs to, the set
//! that block maps to, and the tag that identifies it inside that set.

use std::fmt;

use crate::error::ConfigError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Geometry {
    pub memory_size: u64,
    pub cache_size: u64,
    pub line_size: u64,
    pub associativity: u64,
    pub num_lines: u64,
    pub num_sets: u64,
    pub address_bits: u32,
    pub offset_bits: u32,
    pub index_bits: u32,
    pub tag_bits: u32,
}

impl Geometry {
    pub fn new(
        memory_size: u64,
        cache_size: u64,
        line_size: u64,
        associativity: u64,
    ) -> Result<Self, ConfigError> {
        nonzero("main memory size", memory_size)?;
        nonzero("cache size", cache_size)?;
        nonzero("line size", line_size)?;
        nonzero("associativity", associativity)?;

        power_of_two("main memory size", memory_size)?;
        power_of_two("line size", line_size)?;
        if cache_size % line_size != 0 {
            return Err(ConfigError::UnevenLines {
                cache: cache_size,
                line: line_size,
            });
        }
        let num_lines = cache_size / line_size;
        power_of_two("number of cache lines", num_lines)?;
        power_of_two("associativity", associativity)?;
        if associativity > num_lines {
            return Err(ConfigError::AssociativityExceedsLines {
                ways: associativity,
                lines: num_lines,
            });
        }
        let num_sets = num_lines / associativity;

        // All operands are powers of two, so trailing zeros are exact log2.
        let address_bits = memory_size.trailing_zeros();
        let offset_bits = line_size.trailing_zeros();
        let index_bits = num_sets.trailing_zeros();
        let tag_bits = address_bits
            .checked_sub(offset_bits + index_bits)
            .ok_or(ConfigError::NegativeTagBits {
                memory_bits: address_bits,
                offset_bits,
                index_bits,
            })?;

        let geometry = Self {
            memory_size,
            cache_size,
            line_size,
            associativity,
            num_lines,
            num_sets,
            address_bits,
            offset_bits,
            index_bits,
            tag_bits,
        };
        tracing::info!(
            address_bits,
            offset_bits,
            index_bits,
            tag_bits,
            num_sets,
            "derived cache geometry"
        );
        Ok(geometry)
    }

    /// Splits `address` into block number, set index and tag.
    pub fn decompose(&self, address: u64) -> Decomposed {
        let block = address / self.line_size;
        let set_index = (block % self.num_sets) as usize;
        let shift = self.address_bits - self.tag_bits;
        let mask = match self.tag_bits {
            0 => 0,
            bits => u64::MAX >> (u64::BITS - bits),
        };
        Decomposed {
            block,
            set_index,
            tag: Tag {
                bits: (address >> shift) & mask,
                width: self.tag_bits,
            },
        }
    }

    /// Storage needed for the data array plus a valid bit, a dirty bit and
    /// the tag of every line, rounded down to whole bytes.
    pub fn total_cache_bytes(&self) -> u64 {
        self.num_lines * (2 + self.tag_bits as u64) / 8 + self.cache_size
    }
}

fn nonzero(name: &'static str, value: u64) -> Result<(), ConfigError> {
    if value == 0 {
        Err(ConfigError::Zero { name })
    } else {
        Ok(())
    }
}

fn power_of_two(name: &'static str, value: u64) -> Result<(), ConfigError> {
    if value.is_power_of_two() {
        Ok(())
    } else {
        Err(ConfigError::NotPowerOfTwo { name, value })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Decomposed {
    pub block: u64,
    pub set_index: usize,
    pub tag: Tag,
}

/// Fixed-width tag bits. Two tags are equal only if both the value and the
/// width match, which is the same as comparing their rendered bit strings.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct Tag {
    bits: u64,
    width: u32,
}

impl fmt::Display for Tag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.width == 0 {
            return Ok(());
        }
        write!(f, "{:0width$b}", self.bits, width = self.width as usize)
    }
}
