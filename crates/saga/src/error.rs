//! Saga error types.

use common::OrderId;
use thiserror::Error;

use crate::state::SagaState;

/// Failure of a single call to a downstream service.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ServiceError {
    /// The service answered with a non-success status.
    #[error("rejected with status {status}: {body}")]
    Rejected { status: u16, body: String },

    /// The call could not complete (network, timeout, or undecodable response).
    #[error("transport failure: {0}")]
    Transport(String),
}

impl ServiceError {
    /// Creates a rejection with the given status and body.
    pub fn rejected(status: u16, body: impl Into<String>) -> Self {
        ServiceError::Rejected {
            status,
            body: body.into(),
        }
    }

    /// Creates a transport failure.
    pub fn transport(reason: impl Into<String>) -> Self {
        ServiceError::Transport(reason.into())
    }

    /// Returns true if the call never produced a response.
    pub fn is_transport(&self) -> bool {
        matches!(self, ServiceError::Transport(_))
    }

    /// Returns the HTTP status of a rejection.
    pub fn status(&self) -> Option<u16> {
        match self {
            ServiceError::Rejected { status, .. } => Some(*status),
            ServiceError::Transport(_) => None,
        }
    }
}

/// The state machine reached a state it cannot legally execute.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum OrchestrationFault {
    #[error("illegal transition from {from} to {to}")]
    IllegalTransition { from: SagaState, to: SagaState },

    #[error("{state} requires an order id but none was recorded")]
    MissingOrderId { state: SagaState },

    #[error("order {order_id} was already created for this saga")]
    OrderAlreadyCreated { order_id: OrderId },

    #[error("{state} requires {step} to have completed first")]
    PrerequisiteMissing { state: SagaState, step: &'static str },

    #[error("{state} cannot compensate while {top} is on top of the completed steps")]
    StackOutOfOrder { state: SagaState, top: &'static str },
}
