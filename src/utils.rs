//! Python-side conversion helpers for the `_s0l_inference` bindings.
//!
//! Every item here is compiled only with the `python-bindings` feature and
//! turns loosely typed Python inputs (lists, tuples, dicts, numpy arrays)
//! into the validated Rust types of [`crate::derivation`] and
//! [`crate::optimization`].
//!
//! Derivations cross the boundary as dicts
//! `{(string_index, char_index): (symbol, rewrite)}`; distributions as dicts
//! `{(symbol, rewrite): probability}`.
#[cfg(feature = "python-bindings")]
use std::collections::{BTreeMap, HashMap};

#[cfg(feature = "python-bindings")]
use pyo3::{exceptions::PyTypeError, prelude::*, types::PyAny};

#[cfg(feature = "python-bindings")]
use crate::{
    derivation::{
        core::production::{Derivation, Distribution, Position, Production},
        errors::InferenceError,
    },
    optimization::loglik_optimizer::traits::{LineSearcher, MLEOptions, Tolerances},
};

#[cfg(feature = "python-bindings")]
use numpy::{
    IntoPyArray,    // Vec → PyArray
    PyArrayMethods, // .readonly()
    PyReadonlyArray1,
};

/// Python-facing derivation: `{(string_index, char_index): (symbol, rewrite)}`.
#[cfg(feature = "python-bindings")]
pub type PyDerivation = BTreeMap<(usize, usize), (char, String)>;

/// Python-facing distribution: `{(symbol, rewrite): probability}`.
#[cfg(feature = "python-bindings")]
pub type PyDistribution = BTreeMap<(char, String), f64>;

/// Accept a 1-D float64 numpy array, anything with `.to_numpy()`, or a plain
/// sequence of floats.
#[cfg(feature = "python-bindings")]
#[inline]
pub fn extract_f64_array<'py>(
    py: Python<'py>, raw_data: &Bound<'py, PyAny>,
) -> PyResult<PyReadonlyArray1<'py, f64>> {
    if let Ok(arr_ro) = raw_data.extract::<PyReadonlyArray1<f64>>() {
        if arr_ro.as_slice().is_ok() {
            return Ok(arr_ro);
        }
    }

    if let Ok(obj) = raw_data.call_method("to_numpy", (false,), None) {
        if let Ok(series_ro) = obj.extract::<PyReadonlyArray1<f64>>() {
            if series_ro.as_slice().is_ok() {
                return Ok(series_ro);
            }
        }
    }

    let vec: Vec<f64> = raw_data.extract().map_err(|_| {
        PyTypeError::new_err("expected a 1-D numpy.ndarray, pandas.Series, or sequence of float64")
    })?;
    Ok(vec.into_pyarray(py).readonly())
}

/// Build [`MLEOptions`], falling back to the defaults for every argument
/// left as `None`.
#[cfg(feature = "python-bindings")]
pub fn extract_mle_opts(
    tol_grad: Option<f64>, tol_cost: Option<f64>, max_iter: Option<usize>,
    line_searcher: Option<&str>, lbfgs_mem: Option<usize>, verbose: bool,
) -> PyResult<MLEOptions> {
    let defaults = MLEOptions::default();

    let tols = Tolerances::new(
        tol_grad.or(defaults.tols.tol_grad),
        tol_cost.or(defaults.tols.tol_cost),
        max_iter.or(defaults.tols.max_iter),
    )
    .map_err(InferenceError::from)?;

    let ls = match line_searcher {
        Some(name) => name.parse::<LineSearcher>().map_err(InferenceError::from)?,
        None => defaults.line_searcher,
    };

    Ok(MLEOptions::new(tols, ls, verbose, lbfgs_mem).map_err(InferenceError::from)?)
}

/// Convert a Python derivation dict into a [`Derivation`].
#[cfg(feature = "python-bindings")]
pub fn extract_derivation(raw: &Bound<'_, PyAny>) -> PyResult<Derivation> {
    let map: HashMap<(usize, usize), (char, String)> = raw.extract().map_err(|_| {
        PyTypeError::new_err(
            "expected a dict mapping (string_index, char_index) to (symbol, rewrite)",
        )
    })?;
    let steps = map.into_iter().map(|((string_index, char_index), (symbol, rewrite))| {
        (Position::new(string_index, char_index), Production::new(symbol, rewrite))
    });
    Ok(Derivation::from_steps(steps)?)
}

/// Convert a [`Derivation`] into its Python dict form.
#[cfg(feature = "python-bindings")]
pub fn derivation_to_py(derivation: &Derivation) -> PyDerivation {
    derivation
        .steps()
        .iter()
        .map(|step| {
            (
                (step.position.string_index, step.position.char_index),
                (step.production.symbol, step.production.rewrite.clone()),
            )
        })
        .collect()
}

/// Convert a [`Distribution`] into its Python dict form.
#[cfg(feature = "python-bindings")]
pub fn distribution_to_py(distribution: &Distribution) -> PyDistribution {
    distribution.iter().map(|(p, &v)| ((p.symbol, p.rewrite.clone()), v)).collect()
}
