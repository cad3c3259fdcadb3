use thiserror::Error;

/// Rejected [`TreeParameter`](crate::rtree::TreeParameter) values.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ConfigError {
    #[error("capacity must be at least 1")]
    ZeroCapacity,

    #[error("min_child must be at least 1")]
    ZeroMinChild,

    #[error("max_child ({max_child}) must be at least twice min_child ({min_child})")]
    FanoutTooNarrow { min_child: usize, max_child: usize },

    #[error("reinsert ratio {ratio} would move {count} of {max_child} + 1 children")]
    ReinsertRatio {
        ratio: f64,
        count: usize,
        max_child: usize,
    },

    #[error("choose_subtree_candidates must be at least 1")]
    ZeroCandidates,

    #[error("vector type must have at least one axis")]
    ZeroDimension,
}

/// Rejected payloads. Returned before the tree is touched.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum InsertError {
    #[error("radius must be a non-negative number, got {0}")]
    NegativeRadius(f64),

    #[error("circle bound does not fit the coordinate type on axis {axis}")]
    BoundOverflow { axis: usize },

    #[error("element bound is inverted or NaN on axis {axis}")]
    MalformedBound { axis: usize },
}
