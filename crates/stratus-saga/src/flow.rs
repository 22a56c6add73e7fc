//! Saga flows — ordered steps with predicate-driven branches.
//!
//! A flow does not run anything. [`SagaFlow::resolve`] walks it against a
//! saga and returns the step names the engine would execute, evaluating each
//! condition as it is reached.

use std::fmt;
use std::sync::Arc;

use tracing::debug;

use crate::error::SagaResult;
use crate::predicate::ConditionPredicate;
use crate::saga::Saga;

enum Node {
    Step(String),
    Branch {
        predicate: Arc<dyn ConditionPredicate>,
        then_flow: SagaFlow,
        else_flow: SagaFlow,
    },
}

/// Builder for a flow of named steps and conditional branches.
#[derive(Default)]
pub struct SagaFlow {
    nodes: Vec<Node>,
}

impl SagaFlow {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a step.
    pub fn then(mut self, step: impl Into<String>) -> Self {
        self.nodes.push(Node::Step(step.into()));
        self
    }

    /// Append a branch: `then_flow` if `predicate` holds, else `else_flow`.
    pub fn on(
        mut self,
        predicate: Arc<dyn ConditionPredicate>,
        then_flow: SagaFlow,
        else_flow: SagaFlow,
    ) -> Self {
        self.nodes.push(Node::Branch {
            predicate,
            then_flow,
            else_flow,
        });
        self
    }

    /// Step names in execution order for `saga`. A failing predicate aborts
    /// resolution with its error.
    pub fn resolve(&self, saga: &Saga) -> SagaResult<Vec<String>> {
        let mut steps = Vec::new();
        self.resolve_into(saga, &mut steps)?;
        Ok(steps)
    }

    fn resolve_into(&self, saga: &Saga, steps: &mut Vec<String>) -> SagaResult<()> {
        for node in &self.nodes {
            match node {
                Node::Step(name) => steps.push(name.clone()),
                Node::Branch {
                    predicate,
                    then_flow,
                    else_flow,
                } => {
                    let outcome = predicate.test(saga)?;
                    debug!(saga = %saga.id, predicate = predicate.name(), outcome, "branch selected");
                    if outcome {
                        then_flow.resolve_into(saga, steps)?;
                    } else {
                        else_flow.resolve_into(saga, steps)?;
                    }
                }
            }
        }
        Ok(())
    }
}

impl fmt::Debug for SagaFlow {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut list = f.debug_list();
        for node in &self.nodes {
            match node {
                Node::Step(name) => list.entry(name),
                Node::Branch { predicate, .. } => list.entry(&format_args!("on({})", predicate.name())),
            };
        }
        list.finish()
    }
}
