//! Aggregation Behaviors
//!
//! An aggregation behavior turns the outputs delivered by a node's
//! predecessors into the node's own output. Inputs arrive in whatever order
//! the predecessors finished, so behaviors that should give the same result
//! for every worker count must be commutative. All of the built-ins are.

/// Maps the values delivered by a node's predecessors to the node's result.
///
/// Implementations must accept an empty slice: nodes without predecessors
/// are evaluated with no inputs.
pub trait Aggregate: Send + Sync {
    /// Compute a result from the arrived inputs.
    fn aggregate(&self, inputs: &[i64]) -> i64;
}

impl<F> Aggregate for F
where
    F: Fn(&[i64]) -> i64 + Send + Sync,
{
    fn aggregate(&self, inputs: &[i64]) -> i64 {
        self(inputs)
    }
}

/// Always yields the wrapped value and ignores every input.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Constant(pub i64);

impl Aggregate for Constant {
    fn aggregate(&self, _inputs: &[i64]) -> i64 {
        self.0
    }
}

/// Sum of the inputs, or zero when there are none.
///
/// Overflow wraps.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Sum;

impl Aggregate for Sum {
    fn aggregate(&self, inputs: &[i64]) -> i64 {
        inputs.iter().fold(0i64, |acc, &input| acc.wrapping_add(input))
    }
}

/// Highest input, seeded with zero.
///
/// An empty input yields zero, and so does an input made only of negative
/// values. This is a floor at zero, not a general maximum.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Max;

impl Aggregate for Max {
    fn aggregate(&self, inputs: &[i64]) -> i64 {
        inputs.iter().copied().fold(0, i64::max)
    }
}

/// Lowest input, or zero when there are none.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Min;

impl Aggregate for Min {
    fn aggregate(&self, inputs: &[i64]) -> i64 {
        inputs.iter().copied().min().unwrap_or(0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_inputs_yield_zero() {
        assert_eq!(Sum.aggregate(&[]), 0);
        assert_eq!(Max.aggregate(&[]), 0);
        assert_eq!(Min.aggregate(&[]), 0);
    }

    #[test]
    fn constant_ignores_inputs() {
        assert_eq!(Constant(7).aggregate(&[]), 7);
        assert_eq!(Constant(7).aggregate(&[1, 2, 3]), 7);
    }

    #[test]
    fn min_is_true_minimum() {
        assert_eq!(Min.aggregate(&[4, 3]), 3);
        assert_eq!(Min.aggregate(&[5, -2, 9]), -2);
    }

    #[test]
    fn max_is_floored_at_zero() {
        assert_eq!(Max.aggregate(&[1, 2]), 2);
        assert_eq!(Max.aggregate(&[-3, -1]), 0);
    }

    #[test]
    fn sum_wraps_on_overflow() {
        assert_eq!(Sum.aggregate(&[2, 3]), 5);
        assert_eq!(Sum.aggregate(&[i64::MAX, 1]), i64::MIN);
    }

    #[test]
    fn closures_are_behaviors() {
        let product = |inputs: &[i64]| inputs.iter().product::<i64>();
        assert_eq!(product.aggregate(&[2, 3, 4]), 24);
    }

    #[test]
    fn builtins_ignore_arrival_order() {
        let forward = [3, 1, 4, 1, 5];
        let backward = [5, 1, 4, 1, 3];
        assert_eq!(Sum.aggregate(&forward), Sum.aggregate(&backward));
        assert_eq!(Max.aggregate(&forward), Max.aggregate(&backward));
        assert_eq!(Min.aggregate(&forward), Min.aggregate(&backward));
    }
}
