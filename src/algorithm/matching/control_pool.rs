//! Control pool for the matching algorithm
//!
//! The pool is a struct-of-arrays over every potential control plus an index from
//! matching key to the controls that are still available. It is owned by the
//! sequential matching loop and only ever shrinks: a removed control is gone for
//! the rest of the run.
//!
//! A control's position in the pool is its row index in the potential controls
//! batch.

use crate::algorithm::matching::types::{ExtractedAttributes, MatchKey, MatchValue};
use crate::error::{MatchingError, Result};
use rustc_hash::FxHashMap;
use smallvec::SmallVec;

/// Positions of the controls eligible for one case
pub type EligibleControls = SmallVec<[usize; 32]>;

/// Shrinking pool of potential controls
#[derive(Debug)]
pub struct ControlPool {
    /// Identifier of each control
    ids: Vec<MatchValue>,
    /// Matching key of each control
    keys: Vec<MatchKey>,
    /// Whether each control is still available
    available: Vec<bool>,
    /// Available positions per matching key, in batch order
    buckets: FxHashMap<MatchKey, Vec<usize>>,
    /// Number of available controls
    remaining: usize,
    /// Whether null keys can match
    match_nulls: bool,
}

impl ControlPool {
    /// Create a pool holding every extracted control
    #[must_use]
    pub fn new(attributes: ExtractedAttributes, match_nulls: bool) -> Self {
        let ExtractedAttributes { ids, keys } = attributes;

        let mut buckets: FxHashMap<MatchKey, Vec<usize>> = FxHashMap::default();
        for (position, key) in keys.iter().enumerate() {
            buckets.entry(key.clone()).or_default().push(position);
        }

        let remaining = ids.len();
        Self {
            ids,
            keys,
            available: vec![true; remaining],
            buckets,
            remaining,
            match_nulls,
        }
    }

    /// Number of controls still available
    #[must_use]
    pub const fn len(&self) -> usize {
        self.remaining
    }

    /// Check if every control has been consumed
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.remaining == 0
    }

    /// Number of controls the pool started with
    #[must_use]
    pub fn total(&self) -> usize {
        self.ids.len()
    }

    /// Check whether the control at `position` is still available
    #[must_use]
    pub fn is_available(&self, position: usize) -> bool {
        self.available.get(position).copied().unwrap_or(false)
    }

    /// Identifier of the control at `position`
    #[must_use]
    pub fn id(&self, position: usize) -> &MatchValue {
        &self.ids[position]
    }

    /// Available controls whose key equals `key` on every matching variable
    ///
    /// Positions are returned in batch order.
    #[must_use]
    pub fn eligible(&self, key: &MatchKey) -> EligibleControls {
        if !self.match_nulls && key.has_null() {
            return EligibleControls::new();
        }

        self.buckets
            .get(key)
            .map(|positions| positions.iter().copied().collect())
            .unwrap_or_default()
    }

    /// Same result as [`Self::eligible`], computed by testing every available control
    #[must_use]
    pub fn scan_eligible(&self, key: &MatchKey) -> EligibleControls {
        self.keys
            .iter()
            .enumerate()
            .filter(|(position, control_key)| {
                self.available[*position] && key.matches(control_key, self.match_nulls)
            })
            .map(|(position, _)| position)
            .collect()
    }

    /// Permanently remove controls from the pool
    ///
    /// Removing a control that is unknown or already consumed breaks the
    /// at-most-once guarantee and is reported as an invariant violation.
    pub fn remove(&mut self, positions: &[usize]) -> Result<()> {
        for &position in positions {
            if !self.is_available(position) {
                return Err(MatchingError::invariant(format!(
                    "control at position {position} is not available in the pool"
                )));
            }
            self.available[position] = false;
            self.remaining -= 1;

            let key = &self.keys[position];
            let now_empty = match self.buckets.get_mut(key) {
                Some(bucket) => {
                    bucket.retain(|&candidate| candidate != position);
                    bucket.is_empty()
                }
                None => {
                    return Err(MatchingError::invariant(format!(
                        "control at position {position} has no bucket for its key"
                    )));
                }
            };
            if now_empty {
                self.buckets.remove(key);
            }
        }

        Ok(())
    }
}
