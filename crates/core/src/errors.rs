use thiserror::Error;

use crate::domain::session::SessionId;

/// Failures raised by the order aggregation transitions. Every variant is
/// converted to a user-facing fulfillment text at the dispatch boundary;
/// none of them surface as protocol-level failures.
#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum OrderError {
    #[error("received {items} food items but {quantities} quantities")]
    MismatchedQuantities { items: usize, quantities: usize },
    #[error("no active order for session `{0}`")]
    NoActiveOrder(SessionId),
    #[error("storage backend failure: {0}")]
    Backend(String),
}

/// Structural failures in the inbound webhook event. Unlike [`OrderError`],
/// these fail event processing outright: the session id cannot be derived,
/// so no transition may run.
#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum EventError {
    #[error("webhook event carries no output contexts")]
    MissingContext,
    #[error("could not extract a session id from context `{0}`")]
    MalformedContext(String),
}

#[cfg(test)]
mod tests {
    use crate::domain::session::SessionId;

    use super::{EventError, OrderError};

    #[test]
    fn mismatched_quantities_reports_both_counts() {
        let error = OrderError::MismatchedQuantities { items: 2, quantities: 1 };
        assert_eq!(error.to_string(), "received 2 food items but 1 quantities");
    }

    #[test]
    fn no_active_order_names_the_session() {
        let error = OrderError::NoActiveOrder(SessionId::from("abc123"));
        assert_eq!(error.to_string(), "no active order for session `abc123`");
    }

    #[test]
    fn missing_context_is_a_structural_failure() {
        assert_eq!(
            EventError::MissingContext.to_string(),
            "webhook event carries no output contexts"
        );
    }
}
