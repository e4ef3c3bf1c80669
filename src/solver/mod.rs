//! Sparse linear algebra for the Poisson blend.
//!
//! Matrices are assembled and multiplied with `faer`. The biconjugate
//! gradient iteration needs only products with `A` and `A^T`; every run
//! reports whether it converged instead of handing back an unchecked iterate.

pub mod sparse;

pub use sparse::{SparseMatrix, Triplet};

use crate::trace::{trace_event, trace_warn};

/// Stopping rules for [`bicg`].
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct SolverConfig {
    /// Stop once `||b - A x|| <= tolerance * ||b||`.
    pub tolerance: f64,
    /// Iteration cap; `None` uses ten times the number of unknowns.
    pub max_iterations: Option<usize>,
}

impl Default for SolverConfig {
    fn default() -> Self {
        Self {
            tolerance: 1e-5,
            max_iterations: None,
        }
    }
}

/// How an iterative solve ended.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SolverStatus {
    /// The residual met the tolerance.
    Converged,
    /// The iteration cap was reached first.
    MaxIterations,
    /// The recurrence broke down or produced non-finite values.
    Diverged,
}

/// Status plus diagnostics of a solve.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct SolverReport {
    /// Termination reason.
    pub status: SolverStatus,
    /// Iterations performed.
    pub iterations: usize,
    /// Final relative residual `||b - A x|| / ||b||`.
    pub residual: f64,
}

impl SolverReport {
    /// Returns `true` if the solve met its tolerance.
    pub fn converged(&self) -> bool {
        self.status == SolverStatus::Converged
    }
}

/// Solves `A x = b` with unpreconditioned BiCG starting from `x = 0`.
///
/// `a` must be square with `a.rows() == b.len()`.
pub fn bicg(a: &SparseMatrix, b: &[f64], cfg: &SolverConfig) -> (Vec<f64>, SolverReport) {
    let n = b.len();
    debug_assert_eq!(a.rows(), n);
    debug_assert_eq!(a.cols(), n);

    let mut x = vec![0.0f64; n];
    let b_norm = norm(b);
    if n == 0 || b_norm == 0.0 {
        return (
            x,
            SolverReport {
                status: SolverStatus::Converged,
                iterations: 0,
                residual: 0.0,
            },
        );
    }

    let max_iterations = cfg.max_iterations.unwrap_or(10 * n);
    let mut r = b.to_vec();
    let mut r_tilde = r.clone();
    let mut p = vec![0.0f64; n];
    let mut p_tilde = vec![0.0f64; n];
    let mut q = vec![0.0f64; n];
    let mut q_tilde = vec![0.0f64; n];
    let mut rho_prev = 1.0f64;
    let mut residual = 1.0f64;

    for iteration in 0..max_iterations {
        let rho = dot(&r_tilde, &r);
        if rho == 0.0 || !rho.is_finite() {
            return finish(x, SolverStatus::Diverged, iteration, residual);
        }
        if iteration == 0 {
            p.copy_from_slice(&r);
            p_tilde.copy_from_slice(&r_tilde);
        } else {
            let beta = rho / rho_prev;
            for i in 0..n {
                p[i] = r[i] + beta * p[i];
                p_tilde[i] = r_tilde[i] + beta * p_tilde[i];
            }
        }

        a.mul_vec(&p, &mut q);
        a.mul_vec_transposed(&p_tilde, &mut q_tilde);
        let denom = dot(&p_tilde, &q);
        if denom == 0.0 || !denom.is_finite() {
            return finish(x, SolverStatus::Diverged, iteration, residual);
        }
        let alpha = rho / denom;
        for i in 0..n {
            x[i] += alpha * p[i];
            r[i] -= alpha * q[i];
            r_tilde[i] -= alpha * q_tilde[i];
        }
        rho_prev = rho;

        residual = norm(&r) / b_norm;
        if !residual.is_finite() {
            return finish(x, SolverStatus::Diverged, iteration + 1, residual);
        }
        if residual <= cfg.tolerance {
            return finish(x, SolverStatus::Converged, iteration + 1, residual);
        }
    }

    finish(x, SolverStatus::MaxIterations, max_iterations, residual)
}

fn finish(x: Vec<f64>, status: SolverStatus, iterations: usize, residual: f64) -> (Vec<f64>, SolverReport) {
    match status {
        SolverStatus::Converged => {
            trace_event!("bicg_converged", iterations = iterations, residual = residual);
        }
        _ => {
            trace_warn!("bicg_not_converged", iterations = iterations, residual = residual);
        }
    }
    (
        x,
        SolverReport {
            status,
            iterations,
            residual,
        },
    )
}

fn dot(a: &[f64], b: &[f64]) -> f64 {
    a.iter().zip(b).map(|(x, y)| x * y).sum()
}

fn norm(v: &[f64]) -> f64 {
    dot(v, v).sqrt()
}
