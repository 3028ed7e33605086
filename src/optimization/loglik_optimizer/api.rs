//! High-level entry point for maximizing a user-provided `LogLikelihood`.
//!
//! This selects an L-BFGS solver with either Hager–Zhang or More–Thuente line
//! search, wraps the model in an `ArgMinAdapter` (which *minimizes* `-ℓ(θ)`),
//! and delegates the run to `run_lbfgs`.
use crate::optimization::{
    errors::OptResult,
    loglik_optimizer::{
        OptimOutcome, Theta,
        adapter::ArgMinAdapter,
        builders::{build_optimizer_hager_zhang, build_optimizer_more_thuente},
        run::run_lbfgs,
        traits::{LineSearcher, LogLikelihood, MLEOptions},
    },
};

/// Maximize an objective `ℓ(θ)` using L-BFGS with the chosen line search.
///
/// # Behavior
/// - Validates the initial guess via `f.check(theta0, data)`.
/// - Wraps `(f, data)` in an `ArgMinAdapter` exposing `c(θ) = -ℓ(θ)`.
/// - Builds an L-BFGS solver per `opts.line_searcher` and runs it.
///
/// # Errors
/// - Propagates any error from `f.check`.
/// - Propagates builder errors from `build_optimizer_*`.
/// - Propagates runtime errors from `run_lbfgs` (e.g., line search failures).
///
/// # Example
/// ```no_run
/// use ndarray::array;
/// use s0l_inference::optimization::{
///     errors::OptResult,
///     loglik_optimizer::{LogLikelihood, MLEOptions, Theta, maximize},
/// };
///
/// struct MyObjective;
/// impl LogLikelihood for MyObjective {
///     type Data = ();
///     fn value(&self, theta: &Theta, _: &()) -> OptResult<f64> {
///         Ok(-theta.dot(theta))
///     }
///     fn check(&self, _: &Theta, _: &()) -> OptResult<()> {
///         Ok(())
///     }
/// }
///
/// let out = maximize(&MyObjective, array![0.1, -0.2, 0.3], &(), &MLEOptions::default())?;
/// println!("θ̂ = {:?}", out.theta_hat);
/// # Ok::<(), s0l_inference::optimization::errors::OptError>(())
/// ```
pub fn maximize<F: LogLikelihood>(
    f: &F, theta0: Theta, data: &F::Data, opts: &MLEOptions,
) -> OptResult<OptimOutcome> {
    f.check(&theta0, data)?;
    let problem = ArgMinAdapter::new(f, data);
    match opts.line_searcher {
        LineSearcher::MoreThuente => {
            let solver = build_optimizer_more_thuente(opts)?;
            run_lbfgs(theta0, opts, problem, solver)
        }
        LineSearcher::HagerZhang => {
            let solver = build_optimizer_hager_zhang(opts)?;
            run_lbfgs(theta0, opts, problem, solver)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::optimization::{
        errors::{OptError, OptResult},
        loglik_optimizer::{Cost, Grad},
    };
    use approx::assert_relative_eq;
    use ndarray::array;

    /// `ℓ(θ) = -Σ (θ_i - i)^2`, maximized at `θ = (0, 1, ..)`.
    struct Shifted;

    impl LogLikelihood for Shifted {
        type Data = ();
        fn value(&self, theta: &Theta, _: &()) -> OptResult<Cost> {
            Ok(-theta.iter().enumerate().map(|(i, t)| (t - i as f64).powi(2)).sum::<f64>())
        }
        fn check(&self, theta: &Theta, _: &()) -> OptResult<()> {
            if theta.len() != 2 {
                return Err(OptError::ThetaLengthMismatch { expected: 2, actual: theta.len() });
            }
            Ok(())
        }
        fn grad(&self, theta: &Theta, _: &()) -> OptResult<Grad> {
            Ok(Grad::from_iter(theta.iter().enumerate().map(|(i, t)| -2.0 * (t - i as f64))))
        }
    }

    #[test]
    // Purpose
    // -------
    // Both line searches drive a concave quadratic to its maximizer and
    // report convergence.
    fn maximize_finds_quadratic_optimum_with_both_line_searches() {
        for line_searcher in [LineSearcher::MoreThuente, LineSearcher::HagerZhang] {
            let opts = MLEOptions { line_searcher, ..MLEOptions::default() };

            let out = maximize(&Shifted, array![3.0, -2.0], &(), &opts).unwrap();

            assert!(out.converged, "status: {}", out.status);
            assert_relative_eq!(out.theta_hat[0], 0.0, epsilon = 1e-6);
            assert_relative_eq!(out.theta_hat[1], 1.0, epsilon = 1e-6);
            assert_relative_eq!(out.value, 0.0, epsilon = 1e-10);
        }
    }

    #[test]
    // Purpose
    // -------
    // `check` runs before the solver and its error is returned unchanged.
    fn maximize_propagates_check_errors() {
        let err = maximize(&Shifted, array![0.0], &(), &MLEOptions::default()).unwrap_err();

        assert_eq!(err, OptError::ThetaLengthMismatch { expected: 2, actual: 1 });
    }
}
