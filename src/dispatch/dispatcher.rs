//! Tool-call dispatch.
//!
//! Each call is resolved against the registry, its argument checked, and the
//! capability invoked on the operator. A bad call is logged and skipped; it
//! never stops the calls after it.

use std::sync::Arc;

use log::{debug, info, warn};
use thiserror::Error;

use super::drafts::Draft;
use super::operator::{Operator, OperatorError};
use super::registry::CapabilityRegistry;
use crate::parsing::{FieldKind, ToolCall, value_kind};

/// Why a single tool call was skipped
#[derive(Debug, Clone, Error)]
pub enum DispatchError {
    #[error("Unknown tool: {0}")]
    UnknownTool(String),

    #[error("Tool '{tool}' is missing required argument '{parameter}'")]
    MissingArgument { tool: String, parameter: String },

    #[error("Tool '{tool}' argument '{parameter}' should be of type '{expected}', but got '{actual}'")]
    WrongArgumentType {
        tool: String,
        parameter: String,
        expected: FieldKind,
        actual: String,
    },

    #[error("Tool '{tool}' failed: {source}")]
    Operator {
        tool: String,
        #[source]
        source: OperatorError,
    },
}

/// A capability that ran and the draft it produced
#[derive(Debug, Clone, PartialEq)]
pub struct Invocation {
    pub tool: String,
    pub draft: Draft,
}

/// What happened to the tool calls of one response
#[derive(Debug, Clone, Default)]
pub struct DispatchReport {
    pub invoked: Vec<Invocation>,
    pub skipped: Vec<DispatchError>,
}

impl DispatchReport {
    pub fn is_empty(&self) -> bool {
        self.invoked.is_empty() && self.skipped.is_empty()
    }

    pub fn drafts(&self) -> impl Iterator<Item = &Draft> {
        self.invoked.iter().map(|i| &i.draft)
    }
}

/// Routes tool calls to an operator through a capability registry
#[derive(Clone)]
pub struct Dispatcher {
    registry: Arc<CapabilityRegistry>,
    operator: Arc<dyn Operator>,
}

impl Dispatcher {
    pub fn new(registry: CapabilityRegistry, operator: Arc<dyn Operator>) -> Self {
        Self {
            registry: Arc::new(registry),
            operator,
        }
    }

    /// Dispatcher over [`CapabilityRegistry::standard`]
    pub fn standard(operator: Arc<dyn Operator>) -> Self {
        Self::new(CapabilityRegistry::standard(), operator)
    }

    pub fn registry(&self) -> &CapabilityRegistry {
        &self.registry
    }

    /// Resolve, validate, and invoke one call
    pub async fn dispatch(&self, call: &ToolCall) -> Result<Draft, DispatchError> {
        let capability = self
            .registry
            .get(&call.name)
            .ok_or_else(|| DispatchError::UnknownTool(call.name.clone()))?;

        let argument = match call.arguments.get(&capability.parameter) {
            None | Some(serde_json::Value::Null) => {
                return Err(DispatchError::MissingArgument {
                    tool: call.name.clone(),
                    parameter: capability.parameter.clone(),
                });
            }
            Some(value) if !capability.kind.matches(value) => {
                return Err(DispatchError::WrongArgumentType {
                    tool: call.name.clone(),
                    parameter: capability.parameter.clone(),
                    expected: capability.kind,
                    actual: value_kind(value).to_string(),
                });
            }
            Some(value) => value.clone(),
        };

        debug!("Dispatching {} with {}={}", call.name, capability.parameter, argument);
        capability
            .invoke(self.operator.clone(), argument)
            .await
            .map_err(|source| DispatchError::Operator {
                tool: call.name.clone(),
                source,
            })
    }

    /// Dispatch every call in order, skipping the ones that fail
    pub async fn dispatch_all(&self, calls: &[ToolCall]) -> DispatchReport {
        let mut report = DispatchReport::default();

        for call in calls {
            match self.dispatch(call).await {
                Ok(draft) => {
                    info!("Tool {} produced draft {}", call.name, draft.id());
                    report.invoked.push(Invocation {
                        tool: call.name.clone(),
                        draft,
                    });
                }
                Err(e) => {
                    warn!("Skipping tool call: {}", e);
                    report.skipped.push(e);
                }
            }
        }

        report
    }
}
