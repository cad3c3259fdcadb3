use crate::error::ConfigError;

pub const DEFAULT_MIN_CHILD: usize = 10;
pub const DEFAULT_MAX_CHILD: usize = 20;
pub const DEFAULT_REINSERT_RATIO: f64 = 0.30;
pub const DEFAULT_CHOOSE_SUBTREE_CANDIDATES: usize = 32;

static_assertions::const_assert!(DEFAULT_MIN_CHILD >= 1);
static_assertions::const_assert!(DEFAULT_MAX_CHILD >= 2 * DEFAULT_MIN_CHILD);

/// Construction parameters of [`RTree`](super::RTree). Fixed for the tree's lifetime.
#[non_exhaustive]
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct TreeParameter {
    /// Maximum number of elements retained. Inserting beyond this evicts the oldest
    /// element, so the tree always holds the `capacity` most recently inserted ones.
    pub capacity: usize,

    /// Minimum fanout of every node except the root. A node dropping below this during
    /// removal is dissolved and its elements are inserted again.
    pub min_child: usize,

    /// Maximum fanout. Must be at least twice `min_child`, otherwise a split cannot
    /// produce two valid halves.
    pub max_child: usize,

    /// Share of an overflowing node's `max_child + 1` children that is evicted and
    /// reinserted on the first overflow of an insertion, instead of splitting.
    pub reinsert_ratio: f64,

    /// Number of least-enlarging candidates examined by the overlap heuristic when
    /// choosing a subtree right above the leaf level.
    pub choose_subtree_candidates: usize,
}

impl TreeParameter {
    pub fn new(capacity: usize) -> Self {
        Self {
            capacity,
            min_child: DEFAULT_MIN_CHILD,
            max_child: DEFAULT_MAX_CHILD,
            reinsert_ratio: DEFAULT_REINSERT_RATIO,
            choose_subtree_candidates: DEFAULT_CHOOSE_SUBTREE_CANDIDATES,
        }
    }

    pub fn with(mut self, visit: impl FnOnce(&mut Self)) -> Self {
        visit(&mut self);
        self
    }

    pub fn fanout(self, min_child: usize, max_child: usize) -> Self {
        self.with(|x| {
            x.min_child = min_child;
            x.max_child = max_child;
        })
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.capacity == 0 {
            return Err(ConfigError::ZeroCapacity);
        }

        if self.min_child == 0 {
            return Err(ConfigError::ZeroMinChild);
        }

        if self.max_child < 2 * self.min_child {
            return Err(ConfigError::FanoutTooNarrow {
                min_child: self.min_child,
                max_child: self.max_child,
            });
        }

        let count = self.reinsert_count();
        let ratio_ok = self.reinsert_ratio > 0. && self.reinsert_ratio < 1.;

        if !ratio_ok || self.max_child + 1 - count < self.min_child {
            return Err(ConfigError::ReinsertRatio {
                ratio: self.reinsert_ratio,
                count,
                max_child: self.max_child,
            });
        }

        if self.choose_subtree_candidates == 0 {
            return Err(ConfigError::ZeroCandidates);
        }

        Ok(())
    }

    /// Number of children moved out of an overflowing node by forced reinsertion.
    pub(crate) fn reinsert_count(&self) -> usize {
        let overflow = (self.max_child + 1) as f64;
        let count = (overflow * self.reinsert_ratio).round();

        // Also maps NaN to 1.
        if count >= 1. {
            (count as usize).min(self.max_child + 1)
        } else {
            1
        }
    }
}

#[cfg(test)]
mod __tests {
    use super::*;

    #[test]
    fn test_validate() {
        assert_eq!(TreeParameter::new(100).validate(), Ok(()));
        assert_eq!(TreeParameter::new(1).fanout(2, 4).validate(), Ok(()));

        assert_eq!(
            TreeParameter::new(0).validate(),
            Err(ConfigError::ZeroCapacity)
        );
        assert_eq!(
            TreeParameter::new(10).fanout(0, 4).validate(),
            Err(ConfigError::ZeroMinChild)
        );
        assert_eq!(
            TreeParameter::new(10).fanout(3, 5).validate(),
            Err(ConfigError::FanoutTooNarrow {
                min_child: 3,
                max_child: 5
            })
        );
        assert!(matches!(
            TreeParameter::new(10)
                .with(|x| x.reinsert_ratio = 0.9)
                .validate(),
            Err(ConfigError::ReinsertRatio { .. })
        ));
        assert!(matches!(
            TreeParameter::new(10)
                .with(|x| x.reinsert_ratio = f64::NAN)
                .validate(),
            Err(ConfigError::ReinsertRatio { .. })
        ));
        assert_eq!(
            TreeParameter::new(10)
                .with(|x| x.choose_subtree_candidates = 0)
                .validate(),
            Err(ConfigError::ZeroCandidates)
        );
    }

    #[test]
    fn test_reinsert_count() {
        // 30% of 21 children
        assert_eq!(TreeParameter::new(1).reinsert_count(), 6);

        // 30% of 5 rounds to 2
        assert_eq!(TreeParameter::new(1).fanout(2, 4).reinsert_count(), 2);

        // Never below one.
        assert_eq!(TreeParameter::new(1).fanout(1, 2).reinsert_count(), 1);
    }
}
