//! s0l_inference — stochastic 0L-system inference with Python bindings.
//!
//! Purpose
//! -------
//! Serve as the crate root for Rust callers and as the PyO3 bridge that
//! exposes the inference routines to Python via the `_s0l_inference`
//! extension module when the `python-bindings` feature is enabled.
//!
//! Key behaviors
//! -------------
//! - Re-export the core Rust modules: [`derivation`] (sequences,
//!   enumeration, Q1 and Q2 estimators) and [`optimization`] (the argmin
//!   L-BFGS maximizer and simplex transforms).
//! - Define `#[pyfunction]`s and `#[pyclass]` wrappers for the
//!   `_s0l_inference` module: `enumerate_derivations`,
//!   `select_best_derivation` and `fit_shared_distribution`.
//!
//! Invariants & assumptions
//! ------------------------
//! - All numerical work lives in the inner modules; this file performs only
//!   FFI glue, input conversion and error mapping.
//! - Errors from core Rust code are converted to `ValueError` at the PyO3
//!   boundary; malformed Python inputs raise `TypeError`.
//!
//! Conventions
//! -----------
//! - Derivations cross the boundary as dicts
//!   `{(string_index, char_index): (symbol, rewrite)}` and distributions as
//!   dicts `{(symbol, rewrite): probability}`; fitted probability vectors are
//!   numpy arrays indexed like `productions`.
//!
//! Testing notes
//! -------------
//! - Core behavior is covered by unit tests in the inner modules and by the
//!   integration tests under `tests/`.

pub mod derivation;
pub mod optimization;
pub mod utils;

#[cfg(feature = "python-bindings")]
use numpy::{IntoPyArray, PyArray1};

#[cfg(feature = "python-bindings")]
use pyo3::{exceptions::PyValueError, prelude::*, types::PyAny};

#[cfg(feature = "python-bindings")]
use crate::{
    derivation::{
        core::{enumerate, sequence::Sequence},
        models::{
            best::{self, BestDerivation},
            shared::{FitOptions, SharedFit, SharedGrammar},
        },
    },
    utils::{
        PyDerivation, PyDistribution, derivation_to_py, distribution_to_py, extract_derivation,
        extract_f64_array, extract_mle_opts,
    },
};

/// Every derivation of `seq`, in depth-first order.
#[cfg(feature = "python-bindings")]
#[pyfunction]
#[pyo3(name = "enumerate_derivations", text_signature = "(seq, /)")]
pub fn py_enumerate_derivations(seq: Vec<String>) -> PyResult<Vec<PyDerivation>> {
    let seq = Sequence::new(&seq)?;
    Ok(enumerate::enumerate_derivations(&seq).map(|d| derivation_to_py(&d)).collect())
}

/// Python-facing wrapper for [`BestDerivation`].
#[cfg(feature = "python-bindings")]
#[pyclass(name = "BestDerivation", module = "s0l_inference")]
pub struct PyBestDerivation {
    inner: BestDerivation,
}

#[cfg(feature = "python-bindings")]
#[pymethods]
impl PyBestDerivation {
    #[getter]
    pub fn distribution(&self) -> PyDistribution {
        distribution_to_py(&self.inner.distribution)
    }

    #[getter]
    pub fn derivation(&self) -> PyDerivation {
        derivation_to_py(&self.inner.derivation)
    }

    #[getter]
    pub fn final_probability(&self) -> f64 {
        self.inner.final_probability
    }

    #[getter]
    pub fn concentration_factor(&self) -> f64 {
        self.inner.concentration_factor
    }

    #[getter]
    pub fn derivations_considered(&self) -> usize {
        self.inner.derivations_considered
    }

    fn __repr__(&self) -> String {
        format!(
            "BestDerivation(final_probability={}, productions={}, derivations_considered={})",
            self.inner.final_probability,
            self.inner.distribution.len(),
            self.inner.derivations_considered
        )
    }
}

/// Most concentrated derivation of `seq` and its distribution.
#[cfg(feature = "python-bindings")]
#[pyfunction]
#[pyo3(name = "select_best_derivation", text_signature = "(seq, /)")]
pub fn py_select_best_derivation(seq: Vec<String>) -> PyResult<PyBestDerivation> {
    let seq = Sequence::new(&seq)?;
    Ok(PyBestDerivation { inner: best::select_best_derivation(&seq)? })
}

/// Python-facing wrapper for a (possibly multi-start) [`SharedFit`].
///
/// `attempts` and `converged` are `1` and `0`/`1` for a single fit.
#[cfg(feature = "python-bindings")]
#[pyclass(name = "SharedFit", module = "s0l_inference")]
pub struct PySharedFit {
    inner: SharedFit,
    attempts: usize,
    converged: usize,
}

#[cfg(feature = "python-bindings")]
#[pymethods]
impl PySharedFit {
    #[getter]
    pub fn success(&self) -> bool {
        self.inner.success
    }

    #[getter]
    pub fn objective(&self) -> Option<f64> {
        self.inner.objective
    }

    #[getter]
    pub fn distribution(&self) -> Option<PyDistribution> {
        self.inner.distribution.as_ref().map(distribution_to_py)
    }

    #[getter]
    pub fn probabilities<'py>(&self, py: Python<'py>) -> Option<Bound<'py, PyArray1<f64>>> {
        self.inner.probabilities.as_ref().map(|p| p.clone().into_pyarray(py))
    }

    #[getter]
    pub fn productions(&self) -> Vec<(char, String)> {
        self.inner.productions.iter().map(|p| (p.symbol, p.rewrite.clone())).collect()
    }

    #[getter]
    pub fn status(&self) -> String {
        self.inner.status.clone()
    }

    #[getter]
    pub fn iterations(&self) -> usize {
        self.inner.iterations
    }

    #[getter]
    pub fn attempts(&self) -> usize {
        self.attempts
    }

    #[getter]
    pub fn converged(&self) -> usize {
        self.converged
    }

    fn __repr__(&self) -> String {
        format!(
            "SharedFit(success={}, objective={:?}, attempts={}, converged={})",
            self.inner.success, self.inner.objective, self.attempts, self.converged
        )
    }
}

/// Fit one distribution shared by `derivations`.
///
/// With `n_restarts = 0` a single fit runs from `init_guess` (uniform when
/// `None`). With `n_restarts > 0` the uniform start is followed by
/// `n_restarts` random starts seeded by `seed`, and `init_guess` must be
/// `None`. When no attempt converges the returned fit has
/// `success = False`.
#[cfg(feature = "python-bindings")]
#[pyfunction]
#[pyo3(
    name = "fit_shared_distribution",
    signature = (
        derivations,
        init_guess = None,
        n_restarts = 0,
        seed = None,
        tol_grad = None,
        tol_cost = None,
        max_iter = None,
        line_searcher = None,
        lbfgs_mem = None,
        verbose = false,
    ),
    text_signature = "(derivations, /, init_guess=None, n_restarts=0, seed=None, tol_grad=None, \
                      tol_cost=None, max_iter=None, line_searcher=None, lbfgs_mem=None, \
                      verbose=False)"
)]
pub fn py_fit_shared_distribution<'py>(
    py: Python<'py>, derivations: Vec<Bound<'py, PyAny>>, init_guess: Option<&Bound<'py, PyAny>>,
    n_restarts: usize, seed: Option<u64>, tol_grad: Option<f64>, tol_cost: Option<f64>,
    max_iter: Option<usize>, line_searcher: Option<&str>, lbfgs_mem: Option<usize>,
    verbose: bool,
) -> PyResult<PySharedFit> {
    let derivations =
        derivations.iter().map(|d| extract_derivation(d)).collect::<PyResult<Vec<_>>>()?;
    let mle_opts =
        extract_mle_opts(tol_grad, tol_cost, max_iter, line_searcher, lbfgs_mem, verbose)?;
    let grammar = SharedGrammar::new(&derivations)?;

    if n_restarts == 0 {
        let guess = match init_guess {
            Some(raw) => {
                let arr = extract_f64_array(py, raw)?;
                let slice = arr.as_slice().map_err(|_| {
                    PyValueError::new_err("init_guess must be a 1-D contiguous float64 array")
                })?;
                Some(slice.to_vec())
            }
            None => None,
        };
        let inner = grammar.fit(guess.as_deref(), &mle_opts)?;
        let converged = usize::from(inner.success);
        return Ok(PySharedFit { inner, attempts: 1, converged });
    }

    if init_guess.is_some() {
        return Err(PyValueError::new_err("init_guess cannot be combined with n_restarts > 0"));
    }
    let fit = grammar.fit_with_restarts(&FitOptions::new(mle_opts, n_restarts, seed))?;
    let inner = match fit.best {
        Some(best) => best,
        None => SharedFit {
            success: false,
            objective: None,
            distribution: None,
            probabilities: None,
            productions: fit.productions,
            status: "No attempt converged".to_string(),
            iterations: 0,
        },
    };
    Ok(PySharedFit { inner, attempts: fit.attempts, converged: fit.converged })
}

#[cfg(feature = "python-bindings")]
#[pymodule]
fn _s0l_inference(m: &Bound<'_, PyModule>) -> PyResult<()> {
    m.add_function(wrap_pyfunction!(py_enumerate_derivations, m)?)?;
    m.add_function(wrap_pyfunction!(py_select_best_derivation, m)?)?;
    m.add_function(wrap_pyfunction!(py_fit_shared_distribution, m)?)?;
    m.add_class::<PyBestDerivation>()?;
    m.add_class::<PySharedFit>()?;
    Ok(())
}
