//! Adapter that exposes a user [`LogLikelihood`] as an `argmin` problem.
//!
//! Maximizing an objective `ℓ(θ)` becomes minimizing the cost
//! `c(θ) = -ℓ(θ)`. Analytic gradients are negated accordingly; without one,
//! the **cost** closure is finite-differenced, so that branch needs no sign
//! flip.
use std::cell::RefCell;

use crate::optimization::{
    errors::OptError,
    loglik_optimizer::{
        traits::LogLikelihood,
        types::{Cost, Grad, Theta},
        validation::validate_grad,
    },
};
use argmin::core::{CostFunction, Error, Gradient};
use finitediff::FiniteDiff;

/// Bridges a user `LogLikelihood` to `argmin`'s `CostFunction` and `Gradient`.
///
/// - `CostFunction::cost` returns `-ℓ(θ)`.
/// - `Gradient::gradient` returns `-∇ℓ(θ)` for analytic gradients, or a
///   finite-difference gradient of the cost otherwise.
#[derive(Debug, Clone)]
pub struct ArgMinAdapter<'a, F: LogLikelihood> {
    pub f: &'a F,
    pub data: &'a F::Data,
}

impl<'a, F: LogLikelihood> ArgMinAdapter<'a, F> {
    /// Construct a new adapter over a user `LogLikelihood` and its data.
    pub fn new(f: &'a F, data: &'a F::Data) -> Self {
        Self { f, data }
    }
}

impl<F: LogLikelihood> CostFunction for ArgMinAdapter<'_, F> {
    type Param = Theta;
    type Output = Cost;

    /// Evaluate the cost `c(θ) = -ℓ(θ)`.
    ///
    /// # Errors
    /// Propagates any `OptError` from the user’s `value`, and returns
    /// `NonFiniteCost` when the objective is not finite.
    fn cost(&self, theta: &Self::Param) -> Result<Self::Output, Error> {
        let output = self.f.value(theta, self.data)?;
        if !output.is_finite() {
            return Err((OptError::NonFiniteCost { value: output }).into());
        }
        Ok(-output)
    }
}

impl<F: LogLikelihood> Gradient for ArgMinAdapter<'_, F> {
    type Param = Theta;
    type Gradient = Grad;

    /// Evaluate the gradient of the cost at `θ`.
    ///
    /// With an analytic gradient we validate it and return `-grad`.
    /// Otherwise central differences of the cost are tried first; if any
    /// cost evaluation failed inside the closure, or the result is not
    /// finite, forward differences are used instead.
    ///
    /// The FD closure must return `f64`, so the first error raised inside it
    /// is parked in `closure_err` and `NaN` is returned in its place.
    fn gradient(&self, theta: &Self::Param) -> Result<Self::Gradient, Error> {
        let dim = theta.len();
        match self.f.grad(theta, self.data) {
            Ok(g) => {
                validate_grad(&g, dim)?;
                Ok(-g)
            }
            Err(OptError::GradientNotImplemented) => {
                let closure_err: RefCell<Option<Error>> = RefCell::new(None);
                let cost_func = |theta: &Theta| -> f64 {
                    match self.cost(theta) {
                        Ok(val) => val,
                        Err(e) => {
                            let mut slot = closure_err.borrow_mut();
                            if slot.is_none() {
                                *slot = Some(e);
                            }
                            f64::NAN
                        }
                    }
                };
                let fd_grad = theta.central_diff(&cost_func);
                if closure_err.borrow().is_some() || validate_grad(&fd_grad, dim).is_err() {
                    return run_fd_diff(theta, &cost_func, &closure_err);
                }
                Ok(fd_grad)
            }
            Err(e) => Err(e.into()),
        }
    }
}

/// Forward-difference gradient of `func` at `theta`, with error capture.
///
/// # Errors
/// Returns any error captured during evaluation of `func` inside the FD
/// routine, or a validation error for the resulting gradient.
fn run_fd_diff<G: Fn(&Theta) -> f64>(
    theta: &Theta, func: &G, closure_err: &RefCell<Option<Error>>,
) -> Result<Grad, Error> {
    closure_err.replace(None);
    let fd_grad = theta.forward_diff(func);
    if let Some(err) = closure_err.take() {
        return Err(err);
    }
    validate_grad(&fd_grad, theta.len())?;
    Ok(fd_grad)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::optimization::errors::OptResult;
    use approx::assert_relative_eq;
    use ndarray::array;

    // -------------------------------------------------------------------------
    // Scope
    // -----
    // These tests cover:
    // - Sign conventions of the cost and of analytic gradients.
    // - The finite-difference fallback when no analytic gradient exists.
    //
    // They intentionally DO NOT cover:
    // - Solver execution; see `api` for end-to-end runs.
    // -------------------------------------------------------------------------

    /// Concave quadratic `ℓ(θ) = -(θ - 1)·(θ - 1)`, no analytic gradient.
    struct Quadratic;

    impl LogLikelihood for Quadratic {
        type Data = ();
        fn value(&self, theta: &Theta, _: &()) -> OptResult<Cost> {
            Ok(-theta.mapv(|t| (t - 1.0) * (t - 1.0)).sum())
        }
        fn check(&self, _: &Theta, _: &()) -> OptResult<()> {
            Ok(())
        }
    }

    /// Same objective, with its analytic gradient.
    struct QuadraticWithGrad;

    impl LogLikelihood for QuadraticWithGrad {
        type Data = ();
        fn value(&self, theta: &Theta, data: &()) -> OptResult<Cost> {
            Quadratic.value(theta, data)
        }
        fn check(&self, _: &Theta, _: &()) -> OptResult<()> {
            Ok(())
        }
        fn grad(&self, theta: &Theta, _: &()) -> OptResult<Grad> {
            Ok(theta.mapv(|t| -2.0 * (t - 1.0)))
        }
    }

    #[test]
    // Purpose
    // -------
    // The cost is the negated objective.
    fn cost_is_negated_objective() {
        let adapter = ArgMinAdapter::new(&Quadratic, &());

        let cost = adapter.cost(&array![3.0]).unwrap();

        assert_relative_eq!(cost, 4.0);
    }

    #[test]
    // Purpose
    // -------
    // Without an analytic gradient, the finite-difference gradient of the
    // cost matches `2(θ - 1)`; with one, the adapter returns `-∇ℓ`, which is
    // the same vector.
    fn fd_and_analytic_gradients_agree() {
        let theta = array![0.0, 2.5];
        let fd = ArgMinAdapter::new(&Quadratic, &()).gradient(&theta).unwrap();
        let analytic = ArgMinAdapter::new(&QuadraticWithGrad, &()).gradient(&theta).unwrap();

        for i in 0..2 {
            assert_relative_eq!(fd[i], analytic[i], epsilon = 1e-5);
        }
        assert_relative_eq!(analytic[0], -2.0);
        assert_relative_eq!(analytic[1], 3.0);
    }
}
