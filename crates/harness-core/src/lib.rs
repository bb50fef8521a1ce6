//! Core of the community-sync validation harness.
//!
//! Validates external history-rewriting scripts (rebase- and squash-style
//! synchronization of an enterprise repository against a community
//! upstream) by building disposable git fixtures, snapshotting repository
//! state around an opaque subprocess invocation, and asserting declared
//! expectations on the before/after pair.
//!
//! # Architecture
//!
//! ```text
//!            harness-cli
//!                 |
//!            harness-core
//!    (fixtures, runner, validator,
//!     scenarios, orchestration)
//!                 |
//!            harness-git
//!      (git subprocess boundary)
//! ```
//!
//! Data flows strictly downward: fixture build -> before snapshot ->
//! operation -> after snapshot -> validation -> report aggregation.

pub mod context;
pub mod error;
pub mod fixture;
pub mod report;
pub mod runner;
pub mod scenario;
pub mod suites;
pub mod validate;

pub use context::RunContext;
pub use error::{Error, Result};
pub use fixture::{FixtureBuilder, FixturePair, RepositoryFixture, Side, Topology, cleanup_path};
pub use report::{Report, ScenarioRecord, ScenarioStatus};
pub use runner::{Operation, OperationResult, run};
pub use scenario::{Orchestrator, OrchestratorOptions, Scenario, SetupStep};
pub use validate::{Expectation, Predicate, PredicateOutcome, ValidationResult, validate};
