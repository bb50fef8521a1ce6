//! Scenario definition and orchestration.
//!
//! A scenario is one fixture-setup + operation + expectation triple. The
//! orchestrator runs scenarios in declared order, each against its own
//! fixture subtree: build -> before snapshot -> operation -> after
//! snapshot -> validate -> teardown. Scenarios are isolated: a failure in
//! one is recorded and the rest still run, unless abort-on-first-failure
//! is requested.

use serde::Deserialize;

use harness_git::{CaptureOptions, capture};

use crate::context::RunContext;
use crate::error::{Error, Result};
use crate::fixture::{FixtureBuilder, FixturePair, Side, Topology};
use crate::report::Report;
use crate::runner::{Operation, run};
use crate::validate::{Expectation, Predicate, ValidationResult, validate};

/// One fixture mutation applied between build and the before-snapshot.
#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "action", rename_all = "kebab-case")]
pub enum SetupStep {
    /// Append `count` deterministic commits to one side
    AddCommits { side: Side, count: usize },
    /// Commit one explicit file (used to craft conflicts)
    AddFile {
        side: Side,
        file: String,
        content: String,
        message: String,
    },
}

/// The unit of test execution.
#[derive(Debug, Clone)]
pub struct Scenario {
    /// Unique name; also names the fixture subtree
    pub name: String,
    /// Initial repository shape
    pub topology: Topology,
    /// Mutations applied after the build, before the before-snapshot
    pub setup: Vec<SetupStep>,
    /// The external operation under test
    pub operation: Operation,
    /// Which repository the operation runs in and snapshots are taken of
    pub target: Side,
    /// Predicates that must all hold
    pub expectation: Expectation,
}

impl Scenario {
    /// Create a scenario targeting the enterprise repository.
    pub fn new(name: impl Into<String>, operation: Operation) -> Self {
        Self {
            name: name.into(),
            topology: Topology::default(),
            setup: Vec::new(),
            operation,
            target: Side::Enterprise,
            expectation: Expectation::new(),
        }
    }

    /// Set the fixture topology.
    pub fn topology(mut self, topology: Topology) -> Self {
        self.topology = topology;
        self
    }

    /// Append a setup step.
    pub fn setup(mut self, step: SetupStep) -> Self {
        self.setup.push(step);
        self
    }

    /// Set the targeted side.
    pub fn target(mut self, side: Side) -> Self {
        self.target = side;
        self
    }

    /// Append an expectation predicate.
    pub fn expect(mut self, predicate: Predicate) -> Self {
        self.expectation = self.expectation.with(predicate);
        self
    }

    /// Load a scenario from its TOML definition.
    ///
    /// Predicates are referenced by name under `[[expect]]`; unknown names
    /// fail closed with [`Error::UnknownPredicate`].
    pub fn from_toml(text: &str) -> Result<Self> {
        #[derive(Deserialize)]
        #[serde(deny_unknown_fields, rename_all = "kebab-case")]
        struct RawScenario {
            name: String,
            #[serde(default)]
            topology: Topology,
            #[serde(default)]
            setup: Vec<SetupStep>,
            operation: Operation,
            #[serde(default = "default_target")]
            target: Side,
            #[serde(default)]
            expect: Vec<toml::Value>,
        }
        fn default_target() -> Side {
            Side::Enterprise
        }

        let raw: RawScenario = toml::from_str(text)?;

        let mut expectation = Expectation::new();
        for entry in &raw.expect {
            let name = entry
                .get("predicate")
                .and_then(toml::Value::as_str)
                .ok_or_else(|| Error::scenario("each [[expect]] entry needs a 'predicate' key"))?;
            expectation = expectation.with(Predicate::parse(name, entry)?);
        }

        Ok(Self {
            name: raw.name,
            topology: raw.topology,
            setup: raw.setup,
            operation: raw.operation,
            target: raw.target,
            expectation,
        })
    }
}

/// Orchestration behavior switches.
#[derive(Debug, Clone, Copy, Default)]
pub struct OrchestratorOptions {
    /// Abort after the first scenario that does not pass
    pub fail_fast: bool,
    /// Leave fixture subtrees behind for inspection
    pub keep_fixtures: bool,
}

/// Sequences scenarios and aggregates their results into a [`Report`].
pub struct Orchestrator<'a> {
    ctx: &'a RunContext,
    options: OrchestratorOptions,
}

impl<'a> Orchestrator<'a> {
    /// Create an orchestrator with default options.
    pub fn new(ctx: &'a RunContext) -> Self {
        Self {
            ctx,
            options: OrchestratorOptions::default(),
        }
    }

    /// Override the orchestration options.
    pub fn with_options(mut self, options: OrchestratorOptions) -> Self {
        self.options = options;
        self
    }

    /// Run every scenario in declared order and aggregate the results.
    ///
    /// Lifecycle errors in one scenario are caught and recorded as errored;
    /// remaining scenarios still run unless `fail_fast` is set.
    pub fn run_all(&self, scenarios: &[Scenario]) -> Report {
        let mut report = Report::new();

        for scenario in scenarios {
            tracing::info!(scenario = %scenario.name, "running scenario");
            let outcome = self.run_scenario(scenario);

            if !self.options.keep_fixtures {
                let builder = FixtureBuilder::new(self.ctx);
                if let Err(e) = builder.cleanup(&scenario.name) {
                    tracing::warn!(scenario = %scenario.name, error = %e, "teardown failed");
                }
            }

            let stop = match outcome {
                Ok(validation) => {
                    let passed = validation.passed;
                    report.record_validation(&scenario.name, validation);
                    !passed && self.options.fail_fast
                }
                Err(e) => {
                    tracing::warn!(scenario = %scenario.name, error = %e, "scenario errored");
                    report.record_error(&scenario.name, e.to_string());
                    self.options.fail_fast
                }
            };
            if stop {
                tracing::info!("aborting after first failure");
                break;
            }
        }

        report
    }

    fn run_scenario(&self, scenario: &Scenario) -> Result<ValidationResult> {
        let builder = FixtureBuilder::new(self.ctx);
        let pair = builder.build(&scenario.name, scenario.topology)?;

        self.apply_setup(&builder, &pair, &scenario.setup)?;

        let mut options = CaptureOptions::default().with_window(self.ctx.snapshot_window());
        if scenario.expectation.needs_patch_ids() {
            options = options.with_patch_ids();
        }

        let target = pair.side(scenario.target);
        let before = capture(&target.path, options)?;
        let result = run(target, &scenario.operation)?;
        let after = capture(&target.path, options)?;

        Ok(validate(&before, &after, &result, &scenario.expectation))
    }

    fn apply_setup(
        &self,
        builder: &FixtureBuilder<'_>,
        pair: &FixturePair,
        steps: &[SetupStep],
    ) -> Result<()> {
        for step in steps {
            match step {
                SetupStep::AddCommits { side, count } => {
                    builder.add_commits(pair.side(*side), *count)?;
                }
                SetupStep::AddFile {
                    side,
                    file,
                    content,
                    message,
                } => {
                    builder.add_file_commit(pair.side(*side), file, content, message)?;
                }
            }
        }
        Ok(())
    }
}
