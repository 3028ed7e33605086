//! Q2: one production distribution shared by several derivation samples.
//!
//! Purpose
//! -------
//! Given independent derivations assumed to come from the same unknown
//! stochastic grammar, find the distribution `p` maximizing the joint
//! sum-of-products objective
//!
//! ```text
//! f(p) = Σ_d ∏_j p_j^{c_dj}
//! ```
//!
//! where `c_dj` is the number of times derivation `d` uses production `j`,
//! subject to `Σ_{j ∈ g} p_j = 1` for every symbol group `g` and
//! `0 ≤ p_j ≤ 1`.
//!
//! Key behaviors
//! -------------
//! - Productions are indexed in their canonical sorted order; every vector
//!   in this module (guesses, `θ`, gradients, fitted probabilities) follows
//!   that order.
//! - Constraints hold by construction: the optimizer works on unconstrained
//!   logits `θ` and `p_g = softmax(θ_g)` per symbol group, so the problem
//!   becomes an unconstrained maximization handled by [`maximize`].
//! - Each product is evaluated in log space, `ln P_d = Σ_j c_dj ln p_j`, and
//!   the objective handed to the optimizer is `f(p) / f(p₀)`, which keeps
//!   gradient tolerances meaningful whatever the magnitude of `f`.
//! - The analytic gradient in `θ` is
//!   `∂f/∂θ_j = Σ_d P_d (c_dj − N_{d,g(j)} p_j)`, with `N_{d,g}` the number
//!   of positions of derivation `d` rewriting symbol `g`.
//!
//! Invariants & assumptions
//! ------------------------
//! - Configuration problems (bad guesses, invalid tolerances) are `Err`s.
//!   A solver that stops without converging, or fails at runtime, yields a
//!   [`SharedFit`] with `success = false` and no distribution.
//! - Reported objectives are always the unscaled `f(p̂)`.
//! - The objective is generally non-concave: [`fit_with_restarts`] retries
//!   from seeded random starting points and keeps the best converged fit.
use ndarray::Array1;
use rand::{Rng, SeedableRng, rngs::StdRng};

use crate::{
    derivation::{
        core::{
            production::{Derivation, Distribution, Production},
            stats::production_counts,
        },
        errors::{InferenceError, InferenceResult},
    },
    optimization::{
        errors::OptResult,
        loglik_optimizer::{
            Grad, LogLikelihood, MLEOptions, Theta, Tolerances, maximize,
            validation::validate_theta,
        },
        numerical_stability::transformations::{
            MASS_EPS, grouped_logits, grouped_softmax,
        },
    },
};

/// Production usage of one derivation, restricted to what it uses.
#[derive(Debug, Clone, PartialEq)]
struct SampleCounts {
    /// `(production index, c_dj)`.
    counts: Vec<(usize, f64)>,
    /// `(symbol group index, N_{d,g})`.
    group_totals: Vec<(usize, f64)>,
}

/// Natural log of the value `f(p₀)` that the optimizer's objective is
/// divided by.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LogScale(pub f64);

/// `SharedGrammar` — the joint objective over a set of derivations.
///
/// Fields
/// ------
/// - `productions`: every production used by any derivation, sorted.
/// - `groups`: for each symbol (in sorted order), the indices of its
///   productions; the groups partition `0..productions.len()`.
/// - `samples`: sparse production and symbol counts per derivation.
#[derive(Debug, Clone, PartialEq)]
pub struct SharedGrammar {
    productions: Vec<Production>,
    groups: Vec<Vec<usize>>,
    samples: Vec<SampleCounts>,
}

impl SharedGrammar {
    /// Collect counts and the canonical production index from `derivations`.
    ///
    /// # Errors
    /// - [`InferenceError::NoProductions`] if `derivations` is empty or
    ///   uses no production at all.
    pub fn new(derivations: &[Derivation]) -> InferenceResult<Self> {
        let per_sample: Vec<_> = derivations.iter().map(production_counts).collect();

        let mut productions: Vec<Production> =
            per_sample.iter().flat_map(|c| c.keys().cloned()).collect();
        productions.sort();
        productions.dedup();
        if productions.is_empty() {
            return Err(InferenceError::NoProductions);
        }

        let mut groups: Vec<Vec<usize>> = Vec::new();
        let mut group_of = Vec::with_capacity(productions.len());
        let mut last_symbol = None;
        for (index, production) in productions.iter().enumerate() {
            if last_symbol != Some(production.symbol) {
                groups.push(Vec::new());
                last_symbol = Some(production.symbol);
            }
            let g = groups.len() - 1;
            groups[g].push(index);
            group_of.push(g);
        }

        // Count maps iterate in production order, so a sample's productions
        // of one symbol are contiguous.
        let samples = per_sample
            .iter()
            .map(|sample| {
                let mut counts = Vec::with_capacity(sample.len());
                let mut group_totals: Vec<(usize, f64)> = Vec::new();
                for (production, &count) in sample {
                    let Ok(j) = productions.binary_search(production) else { continue };
                    let g = group_of[j];
                    counts.push((j, count as f64));
                    match group_totals.last_mut() {
                        Some((last, total)) if *last == g => *total += count as f64,
                        _ => group_totals.push((g, count as f64)),
                    }
                }
                SampleCounts { counts, group_totals }
            })
            .collect();

        Ok(SharedGrammar { productions, groups, samples })
    }

    /// Canonically ordered productions; index `j` of every vector refers to
    /// `productions()[j]`.
    pub fn productions(&self) -> &[Production] {
        &self.productions
    }

    /// Production indices of each symbol, symbols in sorted order.
    pub fn symbol_groups(&self) -> &[Vec<usize>] {
        &self.groups
    }

    /// Number of free probabilities (productions).
    pub fn dim(&self) -> usize {
        self.productions.len()
    }

    /// Number of derivation samples.
    pub fn n_samples(&self) -> usize {
        self.samples.len()
    }

    /// Evaluate the joint objective `f(p) = Σ_d ∏_j p_j^{c_dj}`.
    ///
    /// `probabilities` need not be normalized; zero entries make every
    /// product using them vanish.
    ///
    /// # Errors
    /// - [`InferenceError::DimensionMismatch`] if the length is not
    ///   [`Self::dim`].
    pub fn objective(&self, probabilities: &Array1<f64>) -> InferenceResult<f64> {
        if probabilities.len() != self.dim() {
            return Err(InferenceError::DimensionMismatch {
                expected: self.dim(),
                found: probabilities.len(),
            });
        }
        Ok(self.log_products(probabilities).iter().map(|l| l.exp()).sum())
    }

    /// Uniform distribution within every symbol group.
    pub fn uniform_guess(&self) -> Array1<f64> {
        let mut guess = Array1::zeros(self.dim());
        for group in &self.groups {
            let mass = 1.0 / group.len() as f64;
            for &j in group {
                guess[j] = mass;
            }
        }
        guess
    }

    /// Validate an explicit guess and renormalize it per symbol.
    ///
    /// A symbol whose entries sum to at most [`MASS_EPS`] falls back to the
    /// uniform block.
    ///
    /// # Errors
    /// - [`InferenceError::DimensionMismatch`] if `guess.len() != dim()`.
    /// - [`InferenceError::InvalidInitialGuess`] for the first non-finite or
    ///   negative entry.
    pub fn normalize_guess(&self, guess: &[f64]) -> InferenceResult<Array1<f64>> {
        if guess.len() != self.dim() {
            return Err(InferenceError::DimensionMismatch {
                expected: self.dim(),
                found: guess.len(),
            });
        }
        for (index, &value) in guess.iter().enumerate() {
            if !value.is_finite() {
                return Err(InferenceError::InvalidInitialGuess {
                    index,
                    value,
                    reason: "Initial guess entries must be finite.",
                });
            }
            if value < 0.0 {
                return Err(InferenceError::InvalidInitialGuess {
                    index,
                    value,
                    reason: "Initial guess entries must be non-negative.",
                });
            }
        }
        let mut normalized = Array1::from_vec(guess.to_vec());
        for group in &self.groups {
            normalize_block(&mut normalized, group);
        }
        Ok(normalized)
    }

    /// Draw a random starting point: uniform `[0, 1)` values per
    /// production, normalized per symbol.
    pub fn random_guess<R: Rng>(&self, rng: &mut R) -> Array1<f64> {
        let mut guess = Array1::zeros(self.dim());
        for group in &self.groups {
            for &j in group {
                guess[j] = rng.gen::<f64>();
            }
            normalize_block(&mut guess, group);
        }
        guess
    }

    /// Pair every production with its probability.
    pub fn distribution(&self, probabilities: &Array1<f64>) -> Distribution {
        self.productions.iter().cloned().zip(probabilities.iter().copied()).collect()
    }

    /// Fit from the uniform guess, or from `init_guess` when given.
    ///
    /// # Errors
    /// - Guess validation errors from [`Self::normalize_guess`].
    /// - [`InferenceError::Optimizer`] for invalid optimizer options.
    pub fn fit(&self, init_guess: Option<&[f64]>, opts: &MLEOptions) -> InferenceResult<SharedFit> {
        let start = match init_guess {
            Some(guess) => self.normalize_guess(guess)?,
            None => self.uniform_guess(),
        };
        self.fit_from(start, opts)
    }

    /// Run one L-BFGS fit from a normalized starting distribution.
    fn fit_from(&self, start: Array1<f64>, opts: &MLEOptions) -> InferenceResult<SharedFit> {
        validate_options(opts)?;
        let theta0 = grouped_logits(&start);
        let scale = self.log_scale(&theta0);
        self.check(&theta0, &scale)?;

        match maximize(self, theta0, &scale, opts) {
            Ok(outcome) if outcome.converged => {
                let probabilities = grouped_softmax(&outcome.theta_hat, &self.groups);
                let objective = self.objective(&probabilities)?;
                Ok(SharedFit {
                    success: true,
                    objective: Some(objective),
                    distribution: Some(self.distribution(&probabilities)),
                    probabilities: Some(probabilities),
                    productions: self.productions.clone(),
                    status: outcome.status,
                    iterations: outcome.iterations,
                })
            }
            Ok(outcome) => Ok(self.failed_fit(outcome.status, outcome.iterations)),
            Err(err) => Ok(self.failed_fit(err.to_string(), 0)),
        }
    }

    /// Uniform start first, then `opts.n_restarts` seeded random starts;
    /// keep the best converged objective.
    ///
    /// # Errors
    /// - [`InferenceError::Optimizer`] for invalid optimizer options.
    pub fn fit_with_restarts(&self, opts: &FitOptions) -> InferenceResult<MultiStartFit> {
        let mut rng = match opts.random_seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        let attempts = opts.n_restarts + 1;
        let mut best: Option<(f64, SharedFit)> = None;
        let mut converged = 0;

        for attempt in 0..attempts {
            let start =
                if attempt == 0 { self.uniform_guess() } else { self.random_guess(&mut rng) };
            let fit = self.fit_from(start, &opts.mle_opts)?;

            #[cfg(feature = "obs_slog")]
            if opts.mle_opts.verbose {
                eprintln!(
                    "attempt {attempt}/{attempts}: success = {}, objective = {:?}, status = {}",
                    fit.success, fit.objective, fit.status
                );
            }

            let value = match (fit.success, fit.objective) {
                (true, Some(value)) => value,
                _ => continue,
            };
            converged += 1;
            let improves = best.as_ref().map_or(true, |(incumbent, _)| value > *incumbent);
            if improves {
                best = Some((value, fit));
            }
        }

        Ok(MultiStartFit {
            best: best.map(|(_, fit)| fit),
            productions: self.productions.clone(),
            attempts,
            converged,
        })
    }

    /// `ln P_d(p)` for every sample.
    fn log_products(&self, probabilities: &Array1<f64>) -> Vec<f64> {
        self.samples
            .iter()
            .map(|s| s.counts.iter().map(|&(j, c)| c * probabilities[j].ln()).sum())
            .collect()
    }

    fn log_scale(&self, theta0: &Theta) -> LogScale {
        let start = grouped_softmax(theta0, &self.groups);
        let logs = self.log_products(&start);
        let max = logs.iter().copied().fold(f64::NEG_INFINITY, f64::max);
        if !max.is_finite() {
            return LogScale(0.0);
        }
        LogScale(max + logs.iter().map(|l| (l - max).exp()).sum::<f64>().ln())
    }

    fn failed_fit(&self, status: String, iterations: usize) -> SharedFit {
        SharedFit {
            success: false,
            objective: None,
            distribution: None,
            probabilities: None,
            productions: self.productions.clone(),
            status,
            iterations,
        }
    }
}

impl LogLikelihood for SharedGrammar {
    type Data = LogScale;

    /// Scaled objective `f(softmax(θ)) / f(p₀)`.
    fn value(&self, theta: &Theta, scale: &Self::Data) -> OptResult<f64> {
        let probabilities = grouped_softmax(theta, &self.groups);
        Ok(self.log_products(&probabilities).iter().map(|l| (l - scale.0).exp()).sum())
    }

    fn check(&self, theta: &Theta, _scale: &Self::Data) -> OptResult<()> {
        validate_theta(theta, self.dim())
    }

    /// Analytic gradient of the scaled objective with respect to `θ`.
    fn grad(&self, theta: &Theta, scale: &Self::Data) -> OptResult<Grad> {
        let probabilities = grouped_softmax(theta, &self.groups);
        let logs = self.log_products(&probabilities);
        let mut grad = Array1::zeros(self.dim());
        for (sample, log_p) in self.samples.iter().zip(logs) {
            let weight = (log_p - scale.0).exp();
            if weight == 0.0 {
                continue;
            }
            for &(j, c) in &sample.counts {
                grad[j] += weight * c;
            }
            for &(g, n) in &sample.group_totals {
                for &j in &self.groups[g] {
                    grad[j] -= weight * n * probabilities[j];
                }
            }
        }
        Ok(grad)
    }
}

/// Outcome of one shared-distribution fit.
///
/// `objective`, `distribution` and `probabilities` are `Some` exactly when
/// `success` is `true`. `productions` is the canonical index either way.
#[derive(Debug, Clone, PartialEq)]
pub struct SharedFit {
    pub success: bool,
    pub objective: Option<f64>,
    pub distribution: Option<Distribution>,
    pub probabilities: Option<Array1<f64>>,
    pub productions: Vec<Production>,
    pub status: String,
    pub iterations: usize,
}

/// Multi-start configuration.
///
/// - `mle_opts`: optimizer options for every attempt.
/// - `n_restarts`: random restarts after the uniform attempt.
/// - `random_seed`: seed for the restart draws; `None` seeds from entropy.
#[derive(Debug, Clone, PartialEq)]
pub struct FitOptions {
    pub mle_opts: MLEOptions,
    pub n_restarts: usize,
    pub random_seed: Option<u64>,
}

impl FitOptions {
    pub fn new(mle_opts: MLEOptions, n_restarts: usize, random_seed: Option<u64>) -> Self {
        FitOptions { mle_opts, n_restarts, random_seed }
    }
}

impl Default for FitOptions {
    fn default() -> Self {
        FitOptions { mle_opts: MLEOptions::default(), n_restarts: 5, random_seed: None }
    }
}

/// Best of several attempts.
///
/// - `best`: best converged fit, `None` if no attempt converged.
/// - `productions`: canonical production index, kept even without a fit.
/// - `attempts`: `n_restarts + 1`.
/// - `converged`: number of attempts that converged.
#[derive(Debug, Clone, PartialEq)]
pub struct MultiStartFit {
    pub best: Option<SharedFit>,
    pub productions: Vec<Production>,
    pub attempts: usize,
    pub converged: usize,
}

/// Fit one shared distribution to `derivations`.
///
/// # Errors
/// - [`InferenceError::NoProductions`] for an empty input.
/// - Guess and option errors, see [`SharedGrammar::fit`].
///
/// # Examples
/// ```rust
/// # use s0l_inference::derivation::{core::production::{Derivation, Production}, models::shared::fit_shared_distribution};
/// # use s0l_inference::optimization::loglik_optimizer::MLEOptions;
/// let ab = Production::new('A', "AB");
/// let a = Production::new('A', "A");
/// let d = Derivation::from_rows([vec![ab.clone(), ab.clone(), ab.clone(), a.clone()]]);
/// let fit = fit_shared_distribution(&[d], None, &MLEOptions::default()).unwrap();
/// assert!(fit.success);
/// let p = fit.distribution.unwrap();
/// assert!((p[&ab] - 0.75).abs() < 1e-6);
/// ```
pub fn fit_shared_distribution(
    derivations: &[Derivation], init_guess: Option<&[f64]>, opts: &MLEOptions,
) -> InferenceResult<SharedFit> {
    SharedGrammar::new(derivations)?.fit(init_guess, opts)
}

/// Multi-start variant of [`fit_shared_distribution`].
pub fn fit_with_restarts(
    derivations: &[Derivation], opts: &FitOptions,
) -> InferenceResult<MultiStartFit> {
    SharedGrammar::new(derivations)?.fit_with_restarts(opts)
}

fn normalize_block(values: &mut Array1<f64>, group: &[usize]) {
    let total: f64 = group.iter().map(|&j| values[j]).sum();
    if total > MASS_EPS {
        for &j in group {
            values[j] /= total;
        }
    } else {
        let mass = 1.0 / group.len() as f64;
        for &j in group {
            values[j] = mass;
        }
    }
}

fn validate_options(opts: &MLEOptions) -> OptResult<()> {
    let tols = opts.tols;
    Tolerances::new(tols.tol_grad, tols.tol_cost, tols.max_iter)?;
    MLEOptions::new(tols, opts.line_searcher, opts.verbose, opts.lbfgs_mem)?;
    Ok(())
}
