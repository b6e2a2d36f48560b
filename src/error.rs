use thiserror::Error;

/// A simulator parameter that cannot describe a real cache.
///
/// These are raised before any access is replayed and abort the run for the
/// offending configuration. Nothing is ever substituted for a bad value.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    #[error("{name} must be greater than zero")]
    Zero { name: &'static str },

    #[error("{name} must be a power of two, got {value}")]
    NotPowerOfTwo { name: &'static str, value: u64 },

    #[error("cache size {cache} is not a multiple of the line size {line}")]
    UnevenLines { cache: u64, line: u64 },

    #[error("associativity {ways} exceeds the {lines} lines in the cache")]
    AssociativityExceedsLines { ways: u64, lines: u64 },

    #[error(
        "{memory_bits} address bits cannot hold {offset_bits} offset bits and {index_bits} index bits"
    )]
    NegativeTagBits {
        memory_bits: u32,
        offset_bits: u32,
        index_bits: u32,
    },

    #[error("unknown replacement policy '{0}' (expected L/LRU or F/FIFO)")]
    UnknownPolicy(String),

    #[error("address {address} lies outside the {memory_size}-byte main memory")]
    AddressOutOfRange { address: u64, memory_size: u64 },
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SimError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("trace contains no accesses, hit rates are undefined")]
    EmptyTrace,
}
