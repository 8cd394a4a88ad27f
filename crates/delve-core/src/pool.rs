//! Weighted sampling with guaranteed counts
//!
//! A `WeightedPool` hands out items from a pre-rolled batch. Each refill first
//! places the guaranteed copies of every item, fills the remaining slots by
//! weighted sampling over the items still under their cap, then shuffles.

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;
use crate::rng::GameRng;

/// Pick an index with probability proportional to its weight
///
/// Returns `None` when every weight is zero.
pub fn weighted_index(weights: &[u32], rng: &mut GameRng) -> Option<usize> {
    let total: u64 = weights.iter().map(|&w| w as u64).sum();
    if total == 0 {
        return None;
    }

    let mut roll = rng.index(total as usize) as u64;
    for (i, &w) in weights.iter().enumerate() {
        let w = w as u64;
        if roll < w {
            return Some(i);
        }
        roll -= w;
    }
    None
}

/// Fractional-weight variant of [`weighted_index`]
pub fn weighted_index_f64(weights: &[f64], rng: &mut GameRng) -> Option<usize> {
    let total: f64 = weights.iter().filter(|w| **w > 0.0).sum();
    if total <= 0.0 {
        return None;
    }

    let mut roll = rng.unit() * total;
    let mut last = None;
    for (i, &w) in weights.iter().enumerate() {
        if w <= 0.0 {
            continue;
        }
        if roll < w {
            return Some(i);
        }
        roll -= w;
        last = Some(i);
    }
    // float rounding can leave a sliver past the last bucket
    last
}

/// Minimum copies per refill batch, optionally capped
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Guarantee {
    min: u32,
    max: Option<u32>,
}

impl Guarantee {
    /// Rejects `min <= 0` and `min > max`
    pub fn new(min: i64, max: Option<u32>) -> Result<Self, ConfigError> {
        if min <= 0 {
            return Err(ConfigError::InvalidGuarantee(min));
        }
        let min = u32::try_from(min).map_err(|_| ConfigError::OutOfRange {
            name: "guarantee.min",
            value: min.to_string(),
        })?;
        if let Some(max) = max
            && min > max
        {
            return Err(ConfigError::GuaranteeAboveCap { min, max });
        }
        Ok(Self { min, max })
    }

    pub fn min(&self) -> u32 {
        self.min
    }

    pub fn max(&self) -> Option<u32> {
        self.max
    }

    fn validate(&self) -> Result<(), ConfigError> {
        Guarantee::new(self.min as i64, self.max).map(|_| ())
    }
}

/// One candidate item of a pool
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PoolEntry<T> {
    pub item: T,
    pub weight: u32,
    #[serde(default)]
    pub guarantee: Option<Guarantee>,
    /// Maximum copies per batch
    #[serde(default)]
    pub max: Option<u32>,
}

impl<T> PoolEntry<T> {
    pub fn new(item: T, weight: u32) -> Self {
        Self {
            item,
            weight,
            guarantee: None,
            max: None,
        }
    }

    pub fn guaranteed(mut self, guarantee: Guarantee) -> Self {
        self.guarantee = Some(guarantee);
        self
    }

    pub fn capped(mut self, max: u32) -> Self {
        self.max = Some(max);
        self
    }

    /// Effective per-batch cap from both the guarantee and the entry
    fn limit(&self) -> Option<u32> {
        match (self.guarantee.and_then(|g| g.max), self.max) {
            (Some(a), Some(b)) => Some(a.min(b)),
            (a, b) => a.or(b),
        }
    }

    fn guaranteed_copies(&self) -> u32 {
        let min = self.guarantee.map_or(0, |g| g.min);
        self.limit().map_or(min, |cap| min.min(cap))
    }
}

/// Batch-refilled weighted sampler
#[derive(Debug, Clone)]
pub struct WeightedPool<T> {
    entries: Vec<PoolEntry<T>>,
    capacity: u32,
    /// Remaining entry indices of the current batch, consumed from the back
    batch: Vec<usize>,
}

impl<T> WeightedPool<T> {
    /// Validate the entries and create an empty pool
    pub fn build(capacity: u32, entries: Vec<PoolEntry<T>>) -> Result<Self, ConfigError> {
        if capacity == 0 {
            return Err(ConfigError::EmptyPool("capacity is zero"));
        }
        if entries.is_empty() {
            return Err(ConfigError::EmptyPool("no entries"));
        }

        let mut needed = 0u32;
        for entry in &entries {
            if let Some(g) = &entry.guarantee {
                g.validate()?;
            }
            needed = needed.saturating_add(entry.guaranteed_copies());
        }
        if needed > capacity {
            return Err(ConfigError::GuaranteesExceedCapacity { needed, capacity });
        }

        Ok(Self {
            entries,
            capacity,
            batch: Vec::new(),
        })
    }

    pub fn capacity(&self) -> u32 {
        self.capacity
    }

    /// Items left before the next refill
    pub fn remaining(&self) -> usize {
        self.batch.len()
    }

    pub fn entries(&self) -> &[PoolEntry<T>] {
        &self.entries
    }

    /// Draw one item, refilling the batch first if it is exhausted
    ///
    /// Returns `None` only when every entry is capped at zero.
    pub fn next(&mut self, rng: &mut GameRng) -> Option<&T> {
        if self.batch.is_empty() {
            self.refill(rng);
        }
        let idx = self.batch.pop()?;
        Some(&self.entries[idx].item)
    }

    fn refill(&mut self, rng: &mut GameRng) {
        let mut batch = Vec::with_capacity(self.capacity as usize);
        let mut counts = vec![0u32; self.entries.len()];

        for (i, entry) in self.entries.iter().enumerate() {
            let copies = entry.guaranteed_copies();
            batch.extend(std::iter::repeat_n(i, copies as usize));
            counts[i] = copies;
        }

        while batch.len() < self.capacity as usize {
            let weights: Vec<u32> = self
                .entries
                .iter()
                .zip(&counts)
                .map(|(e, &n)| match e.limit() {
                    Some(cap) if n >= cap => 0,
                    _ => e.weight,
                })
                .collect();

            match weighted_index(&weights, rng) {
                Some(i) => {
                    batch.push(i);
                    counts[i] += 1;
                }
                None => break,
            }
        }

        rng.shuffle(&mut batch);
        tracing::trace!(size = batch.len(), "weighted pool refilled");
        self.batch = batch;
    }
}
