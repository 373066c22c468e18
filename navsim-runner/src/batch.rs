//! Batch execution of independent runs, optionally in parallel.
//!
//! Every job owns its algorithm, so each run gets a private account and
//! calendar. Results come back in job order whatever the execution mode.

use anyhow::{Context, Result};
use navsim_core::data::BarProvider;
use navsim_core::engine::{run_simulation, RunResult};
use navsim_core::Algorithm;
use rayon::prelude::*;
use std::collections::HashMap;
use tracing::{info, warn};

use crate::config::{RunConfig, RunId};
use crate::fingerprint::RunFingerprint;

/// One run: a strategy and the configuration to run it under.
pub struct BatchJob {
    pub config: RunConfig,
    pub algorithm: Box<dyn Algorithm>,
}

impl BatchJob {
    pub fn new(config: RunConfig, algorithm: impl Algorithm + 'static) -> Self {
        Self {
            config,
            algorithm: Box::new(algorithm),
        }
    }
}

/// A completed (possibly halted) run.
#[derive(Debug, Clone)]
pub struct BatchOutcome {
    pub run_id: RunId,
    pub config: RunConfig,
    pub fingerprint: RunFingerprint,
    pub result: RunResult,
}

/// Runs a set of jobs against one bar provider.
pub struct BatchRunner<'p> {
    provider: &'p dyn BarProvider,
    parallel: bool,
}

impl<'p> BatchRunner<'p> {
    pub fn new(provider: &'p dyn BarProvider) -> Self {
        Self {
            provider,
            parallel: true,
        }
    }

    /// Enables or disables parallel execution.
    pub fn with_parallelism(mut self, parallel: bool) -> Self {
        self.parallel = parallel;
        self
    }

    /// Executes every job.
    ///
    /// An invalid config or a run that cannot start fails the whole batch.
    /// A run that halts mid-way is kept; its reason is in `result.halt`.
    pub fn run(&self, jobs: Vec<BatchJob>) -> Result<BatchResults> {
        info!(jobs = jobs.len(), parallel = self.parallel, "starting batch");

        let outcomes: Vec<BatchOutcome> = if self.parallel {
            jobs.into_par_iter()
                .map(|job| self.run_one(job))
                .collect::<Result<Vec<_>>>()?
        } else {
            jobs.into_iter()
                .map(|job| self.run_one(job))
                .collect::<Result<Vec<_>>>()?
        };

        Ok(BatchResults::new(outcomes))
    }

    fn run_one(&self, job: BatchJob) -> Result<BatchOutcome> {
        let BatchJob { config, algorithm } = job;
        config
            .validate()
            .with_context(|| format!("invalid config for run '{}'", config.name))?;
        let run_id = config.run_id()?;

        let mut algorithm = config.apply(algorithm);
        let result = run_simulation(&mut algorithm, self.provider)
            .with_context(|| format!("run '{}' could not start", config.name))?;
        if let Some(reason) = &result.halt {
            warn!(run = %config.name, %reason, "run halted early");
        }

        let fingerprint = RunFingerprint::of(&result)
            .with_context(|| format!("cannot fingerprint run '{}'", config.name))?;
        Ok(BatchOutcome {
            run_id,
            config,
            fingerprint,
            result,
        })
    }
}

/// Outcomes in job order, indexed by `RunId`.
#[derive(Debug, Clone)]
pub struct BatchResults {
    outcomes: Vec<BatchOutcome>,
    by_run_id: HashMap<RunId, usize>,
}

impl BatchResults {
    fn new(outcomes: Vec<BatchOutcome>) -> Self {
        let by_run_id = outcomes
            .iter()
            .enumerate()
            .map(|(i, o)| (o.run_id.clone(), i))
            .collect();
        Self {
            outcomes,
            by_run_id,
        }
    }

    pub fn all(&self) -> &[BatchOutcome] {
        &self.outcomes
    }

    pub fn len(&self) -> usize {
        self.outcomes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.outcomes.is_empty()
    }

    /// Looks up a run; with duplicate configs the last job wins.
    pub fn get(&self, run_id: &str) -> Option<&BatchOutcome> {
        self.by_run_id.get(run_id).map(|&i| &self.outcomes[i])
    }

    /// Runs that stopped before their end date.
    pub fn halted(&self) -> impl Iterator<Item = &BatchOutcome> {
        self.outcomes.iter().filter(|o| !o.result.is_complete())
    }

    /// Highest final NAV.
    pub fn best(&self) -> Option<&BatchOutcome> {
        self.outcomes
            .iter()
            .max_by(|a, b| a.result.final_nav.total_cmp(&b.result.final_nav))
    }
}
