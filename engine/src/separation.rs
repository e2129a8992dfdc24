//! Weight vectors separating sets of route costs.
//!
//! Given the cost vectors of already discovered routes, the solver looks for
//! a convex weight vector whose scalarization keeps the largest possible
//! margin `delta` below all of them - the primitive an outer Pareto frontier
//! exploration uses to aim the next scalarized query. Each problem is one
//! small linear program, built, solved and dropped; nothing carries over
//! between problems.
//!
//! Besides the library API there is a line-oriented stream service so the
//! solver can run as a long-lived coprocess: each problem is a blank-line
//! terminated batch of rows with exactly `dim` decimals, answered by `dim`
//! share lines plus a `delta` line, or the literal `Infeasible`.

use crate::datastr::graph::{Cost, Weights, COST_DIMENSION};
use minilp::{ComparisonOp, LinearExpr, OptimizationDirection, Problem, Variable};
use std::error::Error;
use std::fmt::{self, Display};
use std::io::{BufRead, Write};
use std::num::ParseFloatError;

/// One linear program: maximize `delta` subject to the shares forming a
/// convex combination and every cost row scalarizing to at least `delta`.
pub struct SeparationLp {
    problem: Problem,
    shares: Vec<Variable>,
    delta: Variable,
}

/// A solved separation: the shares on the simplex and the margin they keep.
#[derive(Debug, Clone, PartialEq)]
pub struct Separation {
    pub shares: Vec<f64>,
    pub delta: f64,
}

impl SeparationLp {
    pub fn new(dim: usize) -> SeparationLp {
        let mut problem = Problem::new(OptimizationDirection::Maximize);
        let shares: Vec<Variable> = (0..dim).map(|_| problem.add_var(0.0, (0.0, 1.0))).collect();
        let delta = problem.add_var(1.0, (0.0, f64::INFINITY));

        let mut simplex = LinearExpr::empty();
        for &share in &shares {
            simplex.add(share, 1.0);
        }
        problem.add_constraint(simplex, ComparisonOp::Eq, 1.0);

        SeparationLp { problem, shares, delta }
    }

    pub fn dim(&self) -> usize {
        self.shares.len()
    }

    /// Require `coefficients . shares >= delta`.
    /// The row length has to match the problem dimension.
    pub fn add_cost_row(&mut self, coefficients: &[f64]) {
        assert_eq!(coefficients.len(), self.dim(), "cost row does not match the problem dimension");
        let mut row = LinearExpr::empty();
        for (&share, &coefficient) in self.shares.iter().zip(coefficients.iter()) {
            row.add(share, coefficient);
        }
        row.add(self.delta, -1.0);
        self.problem.add_constraint(row, ComparisonOp::Ge, 0.0);
    }

    /// `None` when the program is infeasible or unbounded, both of which the
    /// protocol reports as `Infeasible`.
    pub fn solve(self) -> Option<Separation> {
        match self.problem.solve() {
            Ok(solution) => Some(Separation {
                shares: self.shares.iter().map(|&share| solution[share]).collect(),
                delta: solution[self.delta],
            }),
            Err(_) => None,
        }
    }
}

/// Separate route costs: the returned weights scalarize every cost to at
/// least `delta`, with `delta` maximal.
pub fn separating_weights(costs: &[Cost]) -> Option<(Weights, f64)> {
    let mut lp = SeparationLp::new(COST_DIMENSION);
    for cost in costs {
        lp.add_cost_row(&cost.values);
    }
    lp.solve().map(|separation| {
        let mut values = [0.0; COST_DIMENSION];
        values.copy_from_slice(&separation.shares);
        (Weights::new(values), separation.delta)
    })
}

/// Errors which abort the stream service. All of them are fatal: a malformed
/// row means the driving process and the solver disagree about the protocol.
#[derive(Debug)]
pub enum ServiceError {
    BadRowLength { expected: usize, got: usize },
    BadNumber(ParseFloatError),
    Io(std::io::Error),
}

impl Display for ServiceError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            ServiceError::BadRowLength { expected, got } => {
                write!(f, "incorrect number of coefficients {} (expected {})", got, expected)
            }
            ServiceError::BadNumber(err) => write!(f, "malformed coefficient: {}", err),
            ServiceError::Io(err) => write!(f, "io error: {}", err),
        }
    }
}

impl Error for ServiceError {}

impl From<ParseFloatError> for ServiceError {
    fn from(err: ParseFloatError) -> Self {
        ServiceError::BadNumber(err)
    }
}

impl From<std::io::Error> for ServiceError {
    fn from(err: std::io::Error) -> Self {
        ServiceError::Io(err)
    }
}

/// Run the solver as a stream service until the input ends.
///
/// Output is flushed after every problem so the service can be driven as a
/// coprocess. A trailing end of stream without pending rows ends the service
/// without emitting anything.
pub fn run_service<R: BufRead, W: Write>(dim: usize, input: R, mut output: W) -> Result<(), ServiceError> {
    let mut lines = input.lines();

    loop {
        let mut lp = SeparationLp::new(dim);
        let mut rows = 0usize;
        let mut end_of_stream = false;

        loop {
            match lines.next() {
                Some(line) => {
                    let line = line?;
                    let coefficients = line
                        .split_whitespace()
                        .map(str::parse)
                        .collect::<Result<Vec<f64>, ParseFloatError>>()?;
                    if coefficients.is_empty() {
                        break;
                    }
                    if coefficients.len() != dim {
                        return Err(ServiceError::BadRowLength {
                            expected: dim,
                            got: coefficients.len(),
                        });
                    }
                    lp.add_cost_row(&coefficients);
                    rows += 1;
                }
                None => {
                    end_of_stream = true;
                    break;
                }
            }
        }

        if end_of_stream && rows == 0 {
            return Ok(());
        }

        match lp.solve() {
            Some(separation) => {
                for share in separation.shares {
                    writeln!(output, "{:.17}", share)?;
                }
                writeln!(output, "{:.17}", separation.delta)?;
            }
            None => writeln!(output, "Infeasible")?,
        }
        output.flush()?;

        if end_of_stream {
            return Ok(());
        }
    }
}
