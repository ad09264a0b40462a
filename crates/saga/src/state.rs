//! Saga state machine.

use serde::{Deserialize, Serialize};

/// The state of an order saga.
///
/// State transitions:
/// ```text
/// CreatingOrder ──► DecreasingStock ──► CreatingPayment ──► Completed
///       │                  │                   │
///       │                  │                   ▼
///       │                  │            IncreasingStock
///       │                  ▼                   │
///       │           CancellingOrder ◄──────────┘
///       │                  │
///       └──────────────────┴──► Completed
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum SagaState {
    /// The order is being created at the order service.
    #[default]
    CreatingOrder,

    /// Stock is being decremented for every line item.
    DecreasingStock,

    /// The payment transaction is being created.
    CreatingPayment,

    /// Compensation: decremented stock is being put back.
    IncreasingStock,

    /// Compensation: the created order is being deleted.
    CancellingOrder,

    /// Terminal state, reached on success and on failure alike.
    Completed,
}

impl SagaState {
    /// Returns true if this is the terminal state.
    pub fn is_terminal(&self) -> bool {
        matches!(self, SagaState::Completed)
    }

    /// Returns true if this state runs a compensating action.
    pub fn is_compensating(&self) -> bool {
        matches!(self, SagaState::IncreasingStock | SagaState::CancellingOrder)
    }

    /// Returns true if the saga may move from `self` to `next`.
    pub fn can_transition_to(&self, next: SagaState) -> bool {
        use SagaState::*;
        matches!(
            (self, next),
            (CreatingOrder, DecreasingStock)
                | (CreatingOrder, Completed)
                | (DecreasingStock, CreatingPayment)
                | (DecreasingStock, CancellingOrder)
                | (CreatingPayment, Completed)
                | (CreatingPayment, IncreasingStock)
                | (IncreasingStock, CancellingOrder)
                | (CancellingOrder, Completed)
        )
    }

    /// Name of the span opened for one loop iteration in this state.
    pub fn span_name(&self) -> &'static str {
        match self {
            SagaState::CreatingOrder => "create_order",
            SagaState::DecreasingStock => "decrease_stock",
            SagaState::CreatingPayment => "create_payment",
            SagaState::IncreasingStock => "rollback_decrease_stock",
            SagaState::CancellingOrder => "rollback_create_order",
            SagaState::Completed => "completed",
        }
    }

    /// Returns the state name as a string.
    pub fn as_str(&self) -> &'static str {
        match self {
            SagaState::CreatingOrder => "CreatingOrder",
            SagaState::DecreasingStock => "DecreasingStock",
            SagaState::CreatingPayment => "CreatingPayment",
            SagaState::IncreasingStock => "IncreasingStock",
            SagaState::CancellingOrder => "CancellingOrder",
            SagaState::Completed => "Completed",
        }
    }
}

impl std::fmt::Display for SagaState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const ALL: [SagaState; 6] = [
        SagaState::CreatingOrder,
        SagaState::DecreasingStock,
        SagaState::CreatingPayment,
        SagaState::IncreasingStock,
        SagaState::CancellingOrder,
        SagaState::Completed,
    ];

    #[test]
    fn test_default_state_is_creating_order() {
        assert_eq!(SagaState::default(), SagaState::CreatingOrder);
    }

    #[test]
    fn test_only_completed_is_terminal() {
        let terminal: Vec<_> = ALL.iter().filter(|s| s.is_terminal()).collect();
        assert_eq!(terminal, vec![&SagaState::Completed]);
    }

    #[test]
    fn test_compensating_states() {
        assert!(SagaState::IncreasingStock.is_compensating());
        assert!(SagaState::CancellingOrder.is_compensating());
        assert!(!SagaState::CreatingPayment.is_compensating());
        assert!(!SagaState::Completed.is_compensating());
    }

    #[test]
    fn test_completed_has_no_successors() {
        assert!(ALL.iter().all(|s| !SagaState::Completed.can_transition_to(*s)));
    }

    #[test]
    fn test_forward_transitions() {
        assert!(SagaState::CreatingOrder.can_transition_to(SagaState::DecreasingStock));
        assert!(SagaState::DecreasingStock.can_transition_to(SagaState::CreatingPayment));
        assert!(SagaState::CreatingPayment.can_transition_to(SagaState::Completed));
    }

    #[test]
    fn test_compensation_transitions() {
        assert!(SagaState::CreatingPayment.can_transition_to(SagaState::IncreasingStock));
        assert!(SagaState::IncreasingStock.can_transition_to(SagaState::CancellingOrder));
        assert!(SagaState::CancellingOrder.can_transition_to(SagaState::Completed));
        assert!(!SagaState::IncreasingStock.can_transition_to(SagaState::Completed));
    }

    #[test]
    fn test_no_state_can_step_backwards() {
        assert!(!SagaState::CreatingPayment.can_transition_to(SagaState::CreatingOrder));
        assert!(!SagaState::DecreasingStock.can_transition_to(SagaState::DecreasingStock));
        assert!(!SagaState::CancellingOrder.can_transition_to(SagaState::IncreasingStock));
    }

    #[test]
    fn test_display() {
        assert_eq!(SagaState::CreatingOrder.to_string(), "CreatingOrder");
        assert_eq!(SagaState::IncreasingStock.to_string(), "IncreasingStock");
        assert_eq!(SagaState::Completed.to_string(), "Completed");
    }

    #[test]
    fn test_span_names() {
        assert_eq!(SagaState::DecreasingStock.span_name(), "decrease_stock");
        assert_eq!(SagaState::CancellingOrder.span_name(), "rollback_create_order");
    }

    #[test]
    fn test_serialization() {
        let state = SagaState::CancellingOrder;
        let json = serde_json::to_string(&state).unwrap();
        let deserialized: SagaState = serde_json::from_str(&json).unwrap();
        assert_eq!(state, deserialized);
    }
}
