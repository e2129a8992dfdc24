//! Vector valued edge costs and their scalarization.
//!
//! Each edge carries a fixed-dimension vector of non-negative metrics
//! (distance, height gain, road unsuitability). A single search direction
//! is picked by scalarizing costs with a convex weight vector.

use std::cmp::Ordering;
use std::ops::{Add, AddAssign, Mul};

/// Number of cost components carried by every edge.
pub const COST_DIMENSION: usize = 3;

/// Global epsilon for float comparisons
pub const EPSILON: f64 = 0.000_001;

fn fuzzy_eq(x: f64, y: f64) -> bool {
    (x - y).abs() <= EPSILON
}
fn fuzzy_leq(x: f64, y: f64) -> bool {
    x - y <= EPSILON
}

/// A fixed-dimension vector of non-negative metric values.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Cost {
    pub values: [f64; COST_DIMENSION],
}

impl Cost {
    pub const ZERO: Cost = Cost {
        values: [0.0; COST_DIMENSION],
    };

    pub fn new(values: [f64; COST_DIMENSION]) -> Cost {
        debug_assert!(values.iter().all(|v| !v.is_nan()));
        Cost { values }
    }

    /// Weak Pareto dominance: no component worse, at least one strictly better.
    pub fn dominates(&self, other: &Cost) -> bool {
        let mut strictly_better = false;
        for (own, others) in self.values.iter().zip(other.values.iter()) {
            if own > others {
                return false;
            }
            if own < others {
                strictly_better = true;
            }
        }
        strictly_better
    }

    /// Fuzzy component-wise `<=` against `other`.
    pub fn fuzzy_leq(&self, other: &Cost) -> bool {
        self.values.iter().zip(other.values.iter()).all(|(own, others)| fuzzy_leq(*own, *others))
    }

    /// Fuzzy component-wise equality.
    pub fn fuzzy_eq(&self, other: &Cost) -> bool {
        self.values.iter().zip(other.values.iter()).all(|(own, others)| fuzzy_eq(*own, *others))
    }
}

impl Add for Cost {
    type Output = Cost;

    fn add(mut self, rhs: Cost) -> Cost {
        self += rhs;
        self
    }
}

impl AddAssign for Cost {
    fn add_assign(&mut self, rhs: Cost) {
        for (own, others) in self.values.iter_mut().zip(rhs.values.iter()) {
            *own += others;
        }
    }
}

/// A convex combination over the cost components.
/// All components are non-negative and sum to one.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Weights {
    pub values: [f64; COST_DIMENSION],
}

impl Weights {
    pub fn new(values: [f64; COST_DIMENSION]) -> Weights {
        assert!(values.iter().all(|v| *v >= -EPSILON), "negative weight component: {:?}", values);
        let sum: f64 = values.iter().sum();
        assert!(fuzzy_eq(sum, 1.0), "weights do not sum to one: {:?}", values);
        Weights { values }
    }

    /// All components equal.
    pub fn balanced() -> Weights {
        Weights {
            values: [1.0 / COST_DIMENSION as f64; COST_DIMENSION],
        }
    }
}

impl Mul<Weights> for Cost {
    type Output = f64;

    fn mul(self, weights: Weights) -> f64 {
        self.values.iter().zip(weights.values.iter()).map(|(c, w)| c * w).sum()
    }
}

/// `f64` wrapper for scalarized costs so they can be used as queue keys.
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd)]
pub struct ScalarCost(f64);

impl ScalarCost {
    pub const INFINITY: Self = ScalarCost(f64::INFINITY);

    pub fn new(value: f64) -> Self {
        debug_assert!(!value.is_nan());
        ScalarCost(value)
    }

    pub const fn zero() -> Self {
        ScalarCost(0.0)
    }

    pub fn value(self) -> f64 {
        self.0
    }

    pub fn is_finite(self) -> bool {
        self.0.is_finite()
    }

    /// Fuzzy comparison (based on `EPSILON`) of two scalarized costs
    pub fn fuzzy_eq(self, other: Self) -> bool {
        fuzzy_eq(self.0, other.0)
    }
}

impl Eq for ScalarCost {}

impl Ord for ScalarCost {
    fn cmp(&self, other: &Self) -> Ordering {
        // Panic on NaN
        self.partial_cmp(other).unwrap()
    }
}

impl Add for ScalarCost {
    type Output = ScalarCost;

    fn add(self, rhs: ScalarCost) -> ScalarCost {
        ScalarCost(self.0 + rhs.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn dominance_needs_one_strict_improvement() {
        let a = Cost::new([1.0, 2.0, 3.0]);
        let b = Cost::new([1.0, 2.0, 4.0]);
        assert!(a.dominates(&b));
        assert!(!b.dominates(&a));
        assert!(!a.dominates(&a));
    }

    #[test]
    fn dominance_fails_on_tradeoff() {
        let a = Cost::new([1.0, 5.0, 0.0]);
        let b = Cost::new([2.0, 1.0, 0.0]);
        assert!(!a.dominates(&b));
        assert!(!b.dominates(&a));
    }

    #[test]
    fn scalarization_is_the_dot_product() {
        let cost = Cost::new([3.0, 0.0, 9.0]);
        let weights = Weights::new([0.5, 0.25, 0.25]);
        assert!((cost * weights - 3.75).abs() <= EPSILON);
    }

    #[test]
    #[should_panic]
    fn weights_must_sum_to_one() {
        Weights::new([0.5, 0.5, 0.5]);
    }

    #[test]
    fn scalar_costs_order_as_floats() {
        assert!(ScalarCost::new(1.0) < ScalarCost::new(2.0));
        assert!(ScalarCost::new(2.0) < ScalarCost::INFINITY);
        assert_eq!(ScalarCost::zero() + ScalarCost::new(1.5), ScalarCost::new(1.5));
    }
}
