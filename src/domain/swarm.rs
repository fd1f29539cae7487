//! Global-best particle swarm optimizer.
//!
//! Every particle is pulled toward its own best position and the best
//! position seen by the whole swarm:
//!
//! v = w*v + c1*r1*(personal_best - x) + c2*r2*(global_best - x)
//!
//! Velocities are clamped to the bound span per dimension and positions to
//! the bounds. The cost of a whole swarm is evaluated in one batch call.
//! Given a seed, runs are reproducible.

use std::fmt;
use std::str::FromStr;

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use tracing::{debug, info};

use super::error::SwarmtraderError;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SwarmOptions {
    /// Cognitive coefficient.
    pub c1: f64,
    /// Social coefficient.
    pub c2: f64,
    /// Inertia.
    pub w: f64,
}

impl Default for SwarmOptions {
    fn default() -> Self {
        SwarmOptions {
            c1: 0.5,
            c2: 0.3,
            w: 0.9,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SwarmConfig {
    pub n_particles: usize,
    pub iters: usize,
    pub options: SwarmOptions,
    pub seed: u64,
}

pub const DEFAULT_SEED: u64 = 42;

/// Named particle/iteration budgets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SwarmPreset {
    #[default]
    Standard,
    Quick,
}

impl SwarmPreset {
    pub fn config(&self) -> SwarmConfig {
        let (n_particles, iters) = match self {
            SwarmPreset::Standard => (50, 100),
            SwarmPreset::Quick => (20, 30),
        };
        SwarmConfig {
            n_particles,
            iters,
            options: SwarmOptions::default(),
            seed: DEFAULT_SEED,
        }
    }
}

impl FromStr for SwarmPreset {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "standard" => Ok(SwarmPreset::Standard),
            "quick" => Ok(SwarmPreset::Quick),
            other => Err(format!("unknown preset '{}', expected standard or quick", other)),
        }
    }
}

impl fmt::Display for SwarmPreset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SwarmPreset::Standard => f.write_str("standard"),
            SwarmPreset::Quick => f.write_str("quick"),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct OptimizationResult {
    pub best_cost: f64,
    pub best_position: Vec<f64>,
    /// Global best cost after each iteration.
    pub cost_history: Vec<f64>,
}

#[derive(Debug, Clone)]
pub struct GlobalBestPso {
    config: SwarmConfig,
    lower: Vec<f64>,
    upper: Vec<f64>,
}

impl GlobalBestPso {
    pub fn new(
        config: SwarmConfig,
        dimensions: usize,
        bounds: (Vec<f64>, Vec<f64>),
    ) -> Result<Self, SwarmtraderError> {
        let (lower, upper) = bounds;
        if config.n_particles == 0 {
            return Err(SwarmtraderError::invalid("swarm", "n_particles", "must be positive"));
        }
        if config.iters == 0 {
            return Err(SwarmtraderError::invalid("swarm", "iters", "must be positive"));
        }
        if dimensions == 0 || lower.len() != dimensions || upper.len() != dimensions {
            return Err(SwarmtraderError::Candidate {
                reason: format!(
                    "bounds of length {}/{} for {} dimensions",
                    lower.len(),
                    upper.len(),
                    dimensions
                ),
            });
        }
        if let Some(i) = (0..dimensions).find(|&i| !(lower[i] <= upper[i])) {
            return Err(SwarmtraderError::Candidate {
                reason: format!(
                    "lower bound {} above upper bound {} in dimension {}",
                    lower[i], upper[i], i
                ),
            });
        }
        Ok(Self {
            config,
            lower,
            upper,
        })
    }

    pub fn config(&self) -> &SwarmConfig {
        &self.config
    }

    pub fn dimensions(&self) -> usize {
        self.lower.len()
    }

    fn span(&self, d: usize) -> f64 {
        self.upper[d] - self.lower[d]
    }

    /// Minimize `cost` over the bounded space.
    ///
    /// `cost` receives the whole swarm and must return one cost per particle.
    /// NaN costs never become a best.
    pub fn optimize<F>(&self, mut cost: F) -> Result<OptimizationResult, SwarmtraderError>
    where
        F: FnMut(&[Vec<f64>]) -> Result<Vec<f64>, SwarmtraderError>,
    {
        let n = self.config.n_particles;
        let dims = self.dimensions();
        let SwarmOptions { c1, c2, w } = self.config.options;
        let mut rng = StdRng::seed_from_u64(self.config.seed);

        let mut positions: Vec<Vec<f64>> = (0..n)
            .map(|_| {
                (0..dims)
                    .map(|d| self.lower[d] + rng.r#gen::<f64>() * self.span(d))
                    .collect()
            })
            .collect();
        let mut velocities: Vec<Vec<f64>> = (0..n)
            .map(|_| {
                (0..dims)
                    .map(|d| (rng.r#gen::<f64>() * 2.0 - 1.0) * self.span(d) * 0.1)
                    .collect()
            })
            .collect();

        let mut personal_best = positions.clone();
        let mut personal_cost = vec![f64::INFINITY; n];
        let mut global_best = positions[0].clone();
        let mut global_cost = f64::INFINITY;
        let mut cost_history = Vec::with_capacity(self.config.iters);

        info!(
            particles = n,
            dimensions = dims,
            iters = self.config.iters,
            seed = self.config.seed,
            "starting swarm"
        );

        for iter in 0..self.config.iters {
            let costs = cost(&positions)?;
            if costs.len() != n {
                return Err(SwarmtraderError::Candidate {
                    reason: format!(
                        "cost function returned {} costs for {} particles",
                        costs.len(),
                        n
                    ),
                });
            }

            for (i, &c) in costs.iter().enumerate() {
                if c < personal_cost[i] {
                    personal_cost[i] = c;
                    personal_best[i].clone_from(&positions[i]);
                }
                if c < global_cost {
                    global_cost = c;
                    global_best.clone_from(&positions[i]);
                }
            }
            cost_history.push(global_cost);
            debug!(iter, best_cost = global_cost, "swarm iteration");

            for i in 0..n {
                for d in 0..dims {
                    let r1: f64 = rng.r#gen();
                    let r2: f64 = rng.r#gen();
                    let x = positions[i][d];
                    let limit = self.span(d);
                    let v = w * velocities[i][d]
                        + c1 * r1 * (personal_best[i][d] - x)
                        + c2 * r2 * (global_best[d] - x);
                    let v = v.clamp(-limit, limit);
                    velocities[i][d] = v;
                    positions[i][d] = (x + v).clamp(self.lower[d], self.upper[d]);
                }
            }
        }

        info!(best_cost = global_cost, "swarm finished");
        Ok(OptimizationResult {
            best_cost: global_cost,
            best_position: global_best,
            cost_history,
        })
    }
}
