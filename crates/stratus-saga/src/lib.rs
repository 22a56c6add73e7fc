//! stratus-saga — deployment saga branching.
//!
//! A saga is a workflow instance with an append-only event log. The workflow
//! engine picks branches by evaluating condition predicates over that log.
//! This crate holds the log model, the predicates, and a small flow builder
//! that resolves which steps a saga will run.
//!
//! # Components
//!
//! - **`saga`** — Saga, events, deploy description, job type
//! - **`predicate`** — `ConditionPredicate` and the service-job predicate
//! - **`flow`** — `SagaFlow` builder and branch resolution

pub mod error;
pub mod flow;
pub mod predicate;
pub mod saga;

pub use error::{SagaError, SagaResult};
pub use flow::SagaFlow;
pub use predicate::{ConditionPredicate, ServiceJobPredicate};
pub use saga::{DeployDescription, JobType, PrepareDeployCommand, Saga, SagaEvent};
