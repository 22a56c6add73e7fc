//! Flow condition predicates.
//!
//! A predicate is a pure function of the saga's event log. The engine calls
//! it at a branch point and follows the `true` or `false` arm.

use tracing::debug;

use crate::error::{SagaError, SagaResult};
use crate::saga::{JobType, Saga};

/// A named branch condition over a saga.
pub trait ConditionPredicate: Send + Sync {
    fn name(&self) -> &str;

    fn test(&self, saga: &Saga) -> SagaResult<bool>;
}

/// True when the saga deploys a long-running service.
///
/// Reads the first deploy preparation in the log. Errors with
/// [`SagaError::JobTypeUndetermined`] if there is none yet; the predicate is
/// only placed after the step that emits it.
#[derive(Debug, Clone, Copy, Default)]
pub struct ServiceJobPredicate;

impl ConditionPredicate for ServiceJobPredicate {
    fn name(&self) -> &str {
        "serviceJobPredicate"
    }

    fn test(&self, saga: &Saga) -> SagaResult<bool> {
        let command = saga
            .first_prepare_deploy()
            .ok_or_else(|| SagaError::JobTypeUndetermined {
                saga: saga.id.clone(),
            })?;
        let job_type = command.description.job_type;
        debug!(saga = %saga.id, %job_type, "service job predicate evaluated");
        Ok(job_type == JobType::Service)
    }
}
