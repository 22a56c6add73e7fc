//! Saga model — event log of a deployment workflow.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::SagaError;

/// Kind of workload a deployment targets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum JobType {
    /// Long-running service.
    Service,
    /// Run-to-completion batch job.
    Batch,
}

impl JobType {
    pub fn as_str(&self) -> &'static str {
        match self {
            JobType::Service => "SERVICE",
            JobType::Batch => "BATCH",
        }
    }
}

impl fmt::Display for JobType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for JobType {
    type Err = SagaError;

    /// Case-insensitive.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.eq_ignore_ascii_case("service") {
            Ok(JobType::Service)
        } else if s.eq_ignore_ascii_case("batch") {
            Ok(JobType::Batch)
        } else {
            Err(SagaError::UnknownJobType(s.to_string()))
        }
    }
}

impl TryFrom<String> for JobType {
    type Error = SagaError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<JobType> for String {
    fn from(value: JobType) -> Self {
        value.as_str().to_string()
    }
}

/// What is being deployed, and where.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeployDescription {
    pub application: String,
    #[serde(default)]
    pub stack: Option<String>,
    #[serde(default)]
    pub detail: Option<String>,
    pub account: String,
    pub region: String,
    pub job_type: JobType,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PrepareDeployCommand {
    pub description: DeployDescription,
}

/// One entry in a saga's event log.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum SagaEvent {
    /// Deploy preparation; carries the deploy description.
    PrepareDeploy(PrepareDeployCommand),
    Command { name: String },
    Log { message: String },
    SagaRollbackStarted,
    SagaCompleted,
}

/// A workflow instance. Events are only ever appended.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Saga {
    pub name: String,
    pub id: String,
    #[serde(default)]
    events: Vec<SagaEvent>,
}

impl Saga {
    pub fn new(name: &str, id: &str) -> Self {
        Self {
            name: name.to_string(),
            id: id.to_string(),
            events: Vec::new(),
        }
    }

    pub fn with_events(name: &str, id: &str, events: Vec<SagaEvent>) -> Self {
        Self {
            name: name.to_string(),
            id: id.to_string(),
            events,
        }
    }

    pub fn push(&mut self, event: SagaEvent) {
        self.events.push(event);
    }

    /// Events in the order they were appended.
    pub fn events(&self) -> &[SagaEvent] {
        &self.events
    }

    /// The earliest deploy preparation in the log.
    pub fn first_prepare_deploy(&self) -> Option<&PrepareDeployCommand> {
        self.events.iter().find_map(|event| match event {
            SagaEvent::PrepareDeploy(command) => Some(command),
            _ => None,
        })
    }
}
