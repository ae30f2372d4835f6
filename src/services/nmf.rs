//! Non-negative matrix factorization with multiplicative updates.
//!
//! Minimizes `||V - W.H||^2` (Frobenius) subject to `W, H >= 0`. Factors are
//! initialized from a seeded RNG, so identical input and parameters always
//! produce identical factors.

use ndarray::{Array2, Zip};
use rand::{rngs::StdRng, Rng, SeedableRng};
use std::sync::atomic::{AtomicBool, Ordering};

use crate::{
    error::{RecResult, RecommendError},
    services::collaborative::NmfParams,
};

/// Keeps the update ratios finite when a denominator entry is zero
const DIVISION_EPSILON: f64 = 1e-10;

/// Iterations between convergence checks
const CHECK_INTERVAL: usize = 10;

/// Result of a factorization run
#[derive(Debug, Clone)]
pub struct Factorization {
    /// `W`: rows x k
    pub row_factors: Array2<f64>,
    /// `H`: k x columns
    pub column_factors: Array2<f64>,
    pub n_iter: usize,
    pub reconstruction_err: f64,
    pub converged: bool,
}

/// Frobenius norm of `V - W.H`
pub fn reconstruction_error(v: &Array2<f64>, w: &Array2<f64>, h: &Array2<f64>) -> f64 {
    (v - &w.dot(h)).mapv(|x| x * x).sum().sqrt()
}

/// Factorizes `v` into rank-`n_components` non-negative factors
///
/// Stops when the error decrease since the previous check, relative to the
/// initial error, drops below `tolerance`, or after `max_iter` iterations.
/// `cancel` is polled once per iteration.
pub fn factorize(
    v: &Array2<f64>,
    params: &NmfParams,
    cancel: Option<&AtomicBool>,
) -> RecResult<Factorization> {
    let (n_rows, n_cols) = v.dim();
    let k = params.n_components;

    let mean = v.mean().unwrap_or(0.0);
    let scale = (mean / k as f64).sqrt();
    let mut rng = StdRng::seed_from_u64(params.random_state);
    let mut w = Array2::from_shape_fn((n_rows, k), |_| scale * rng.gen::<f64>());
    let mut h = Array2::from_shape_fn((k, n_cols), |_| scale * rng.gen::<f64>());

    let error_at_init = reconstruction_error(v, &w, &h);
    let mut previous_error = error_at_init;
    let mut n_iter = 0;
    let mut converged = error_at_init == 0.0;

    while !converged && n_iter < params.max_iter {
        if cancel.is_some_and(|flag| flag.load(Ordering::Relaxed)) {
            tracing::info!(iteration = n_iter, "Factorization cancelled");
            return Err(RecommendError::Cancelled);
        }

        let numerator = w.t().dot(v);
        let denominator = w.t().dot(&w).dot(&h);
        Zip::from(&mut h)
            .and(&numerator)
            .and(&denominator)
            .for_each(|h, &num, &den| *h *= num / (den + DIVISION_EPSILON));

        let numerator = v.dot(&h.t());
        let denominator = w.dot(&h).dot(&h.t());
        Zip::from(&mut w)
            .and(&numerator)
            .and(&denominator)
            .for_each(|w, &num, &den| *w *= num / (den + DIVISION_EPSILON));

        n_iter += 1;

        if n_iter % CHECK_INTERVAL == 0 {
            let error = reconstruction_error(v, &w, &h);
            tracing::debug!(iteration = n_iter, error, "Factorization progress");
            if (previous_error - error) / error_at_init < params.tolerance {
                converged = true;
            }
            previous_error = error;
        }
    }

    if !converged {
        tracing::warn!(
            max_iter = params.max_iter,
            "Factorization hit the iteration cap before converging"
        );
    }

    let reconstruction_err = reconstruction_error(v, &w, &h);
    Ok(Factorization {
        row_factors: w,
        column_factors: h,
        n_iter,
        reconstruction_err,
        converged,
    })
}
