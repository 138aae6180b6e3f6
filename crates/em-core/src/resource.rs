//! Memory budget for unblocked matching.
//!
//! Comparing every pair of `n` records needs on the order of `n²` scores.
//! Before running without blocking, the matcher asks a [`ResourcePolicy`]
//! whether that footprint fits; if not it falls back to default blocking.

use std::borrow::Cow;
use std::fs;

use em_model::{FieldValue, Pair};
use tracing::debug;

/// Decides whether an `n × n` grid of items is affordable.
pub trait ResourcePolicy: Send + Sync {
    fn exceeds_budget(&self, record_count: usize, item_size: usize) -> bool;
}

/// Bytes needed for a `record_count × record_count` grid of `item_size` items.
pub fn required_bytes(record_count: usize, item_size: usize) -> u128 {
    let count = record_count as u128;
    count
        .saturating_mul(count)
        .saturating_mul(item_size as u128)
}

/// Bytes held per cell of the `n × n` grid while scoring without blocking:
/// the candidate pair, both sides' values and rendered texts, and one score
/// per field.
pub fn pair_footprint(field_count: usize) -> usize {
    size_of::<Pair>()
        + 2 * size_of::<Option<&FieldValue>>()
        + 2 * size_of::<Cow<'static, str>>()
        + field_count * size_of::<f64>()
}

/// A fixed byte limit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MemoryBudget {
    limit_bytes: u64,
}

impl MemoryBudget {
    /// Limit used when available memory cannot be determined.
    pub const FALLBACK_BYTES: u64 = 4 * 1024 * 1024 * 1024;

    pub fn new(limit_bytes: u64) -> Self {
        Self { limit_bytes }
    }

    /// Currently available system memory, or [`Self::FALLBACK_BYTES`].
    pub fn from_system() -> Self {
        match available_memory() {
            Some(limit_bytes) => Self { limit_bytes },
            None => {
                debug!(
                    fallback_bytes = Self::FALLBACK_BYTES,
                    "available memory unknown, using fallback budget"
                );
                Self::new(Self::FALLBACK_BYTES)
            }
        }
    }

    pub fn limit_bytes(&self) -> u64 {
        self.limit_bytes
    }
}

impl Default for MemoryBudget {
    fn default() -> Self {
        Self::from_system()
    }
}

impl ResourcePolicy for MemoryBudget {
    fn exceeds_budget(&self, record_count: usize, item_size: usize) -> bool {
        required_bytes(record_count, item_size) > u128::from(self.limit_bytes)
    }
}

/// Available system memory, read again on every check.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemMemory;

impl ResourcePolicy for SystemMemory {
    fn exceeds_budget(&self, record_count: usize, item_size: usize) -> bool {
        MemoryBudget::from_system().exceeds_budget(record_count, item_size)
    }
}

fn available_memory() -> Option<u64> {
    let meminfo = fs::read_to_string("/proc/meminfo").ok()?;
    parse_meminfo_available(&meminfo)
}

/// `MemAvailable` from a `/proc/meminfo` dump, in bytes.
fn parse_meminfo_available(meminfo: &str) -> Option<u64> {
    let line = meminfo
        .lines()
        .find(|line| line.starts_with("MemAvailable:"))?;
    let mut parts = line["MemAvailable:".len()..].split_whitespace();
    let amount: u64 = parts.next()?.parse().ok()?;
    let scale = match parts.next() {
        Some("kB") | Some("KB") => 1024,
        Some("MB") => 1024 * 1024,
        Some(_) => return None,
        None => 1,
    };
    amount.checked_mul(scale)
}
