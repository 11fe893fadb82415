//! Run orchestration
//!
//! A run resolves links, announces `Commencing`, then for every step
//! `DoDailyInitialisation` and `EndOfDay`, and finally `Completed`. A failed
//! step either halts the run or is recorded and skipped, depending on
//! [`RunConfig::halt_on_step_error`].

use serde::Serialize;

use crate::core::config::RunConfig;
use crate::core::error::{Result, SimError};
use crate::core::types::{RunId, Step};
use crate::datastore::DataStore;
use crate::lifecycle::{events, EventContext, LifecycleBus};
use crate::links::{resolve_links, LinkReport};
use crate::models::summary::{self, MessageLevel};
use crate::tree::navigator;
use crate::tree::ModelTree;

/// A step that failed while the run continued
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StepFailure {
    pub step: Step,
    pub message: String,
}

/// What a finished run reports
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RunOutcome {
    pub run_id: RunId,
    pub simulation: String,
    pub steps_run: Step,
    pub failed_steps: Vec<StepFailure>,
    #[serde(skip)]
    pub links: LinkReport,
}

/// Owns an assembled tree and drives it through a run
pub struct Runner {
    tree: ModelTree,
    config: RunConfig,
    bus: LifecycleBus,
}

impl Runner {
    /// Take ownership of a fully assembled tree. Model subscriptions are
    /// registered here, so they run before any callback added later.
    pub fn new(tree: ModelTree, config: RunConfig) -> Self {
        let mut bus = LifecycleBus::new();
        bus.subscribe_models(&tree);
        Self { tree, config, bus }
    }

    pub fn tree(&self) -> &ModelTree {
        &self.tree
    }

    pub fn into_tree(self) -> ModelTree {
        self.tree
    }

    pub fn config(&self) -> &RunConfig {
        &self.config
    }

    /// Add an orchestrator callback for `event`
    pub fn subscribe_fn<F>(&mut self, event: &str, label: impl Into<String>, callback: F)
    where
        F: FnMut(&mut EventContext<'_>) -> Result<()> + 'static,
    {
        self.bus.subscribe_fn(event, label, callback);
    }

    /// Execute one run, writing output tables to `store`
    pub fn run(&mut self, store: &mut dyn DataStore) -> Result<RunOutcome> {
        let run_id = RunId::new();
        let simulation = self
            .tree
            .root()
            .map(|root| self.tree.name(root).to_string())
            .unwrap_or_default();
        let span = tracing::info_span!("run", run_id = %run_id, simulation = %simulation);
        let _enter = span.enter();

        self.config.validate().map_err(|message| SimError::Configuration {
            node: simulation.clone(),
            message,
        })?;
        let links = resolve_links(&mut self.tree)?;

        tracing::info!(steps = self.config.steps, "run commencing");
        self.bus
            .dispatch(events::COMMENCING, &mut self.tree, 0, store)?;

        let mut failed_steps = Vec::new();
        for step in 1..=self.config.steps {
            let step_span = tracing::debug_span!("step", step);
            let _step = step_span.enter();

            let result = self
                .bus
                .dispatch(events::DO_DAILY_INITIALISATION, &mut self.tree, step, store)
                .and_then(|_| {
                    self.bus
                        .dispatch(events::END_OF_DAY, &mut self.tree, step, &mut *store)
                });
            let Err(err) = result else {
                continue;
            };
            if self.config.halt_on_step_error {
                tracing::error!(step, error = %err, "step failed, halting run");
                return Err(err);
            }
            tracing::warn!(step, error = %err, "step failed, continuing");
            self.log_failure(step, &err, store)?;
            failed_steps.push(StepFailure {
                step,
                message: err.to_string(),
            });
        }

        self.bus
            .dispatch(events::COMPLETED, &mut self.tree, self.config.steps, store)?;
        tracing::info!(failed = failed_steps.len(), "run completed");

        Ok(RunOutcome {
            run_id,
            simulation,
            steps_run: self.config.steps,
            failed_steps,
            links,
        })
    }

    /// Record a skipped step in the simulation's summary, if it has one
    fn log_failure(&mut self, step: Step, err: &SimError, store: &mut dyn DataStore) -> Result<()> {
        let Some(root) = self.tree.root() else {
            return Ok(());
        };
        let Some(summary) = navigator::nearest_of_kind(&self.tree, root, "Summary") else {
            return Ok(());
        };
        let mut ctx = EventContext {
            tree: &mut self.tree,
            node: root,
            step,
            store,
        };
        summary::write(&mut ctx, summary, MessageLevel::Error, err.to_string())
    }
}
