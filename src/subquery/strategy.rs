//! Strategy selector for subquery execution.

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubqueryStrategy {
    /// The subquery accepts a relation-input over the correlation
    /// variables; execute it once with a batched relation as a binding.
    Batched,
    /// Parallel execution is enabled and the combination count meets the
    /// threshold.
    Parallel,
    /// Neither of the above.
    Sequential,
}

#[derive(Debug, Clone, Copy)]
pub struct StrategyOptions {
    pub accepts_relation_input: bool,
    pub parallel_enabled: bool,
    pub parallel_threshold: usize,
}

impl Default for StrategyOptions {
    fn default() -> Self {
        StrategyOptions {
            accepts_relation_input: false,
            parallel_enabled: true,
            parallel_threshold: 100,
        }
    }
}

/// Batched takes precedence over parallel even at large input counts.
pub fn select_strategy(combination_count: usize, opts: &StrategyOptions) -> SubqueryStrategy {
    if opts.accepts_relation_input {
        SubqueryStrategy::Batched
    } else if opts.parallel_enabled && combination_count >= opts.parallel_threshold {
        SubqueryStrategy::Parallel
    } else {
        SubqueryStrategy::Sequential
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn batched_wins_even_above_parallel_threshold() {
        let opts = StrategyOptions {
            accepts_relation_input: true,
            parallel_enabled: true,
            parallel_threshold: 10,
        };
        assert_eq!(select_strategy(1000, &opts), SubqueryStrategy::Batched);
    }

    #[test]
    fn parallel_only_above_threshold() {
        let opts = StrategyOptions {
            accepts_relation_input: false,
            parallel_enabled: true,
            parallel_threshold: 100,
        };
        assert_eq!(select_strategy(99, &opts), SubqueryStrategy::Sequential);
        assert_eq!(select_strategy(100, &opts), SubqueryStrategy::Parallel);
    }

    #[test]
    fn sequential_when_parallel_disabled() {
        let opts = StrategyOptions {
            accepts_relation_input: false,
            parallel_enabled: false,
            parallel_threshold: 1,
        };
        assert_eq!(select_strategy(1000, &opts), SubqueryStrategy::Sequential);
    }
}
