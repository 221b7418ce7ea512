use async_trait::async_trait;
use tracing::{info, warn};

use tiffin_core::errors::OrderError;
use tiffin_core::SessionId;

use crate::event::IntentEvent;

/// The order transitions an intent can trigger. Resolution is a fixed
/// table keyed on the full intent display name, context qualifier
/// included.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum OrderIntent {
    StartOrder,
    AddItems,
    RemoveItems,
    CompleteOrder,
    TrackOrder,
}

const INTENT_ROUTES: &[(&str, OrderIntent)] = &[
    ("new.order", OrderIntent::StartOrder),
    ("order.add - context: ongoing-order", OrderIntent::AddItems),
    ("order.remove - context: ongoing-order", OrderIntent::RemoveItems),
    ("order.complete - context: ongoing-order", OrderIntent::CompleteOrder),
    ("track.order - context: ongoing-tracking", OrderIntent::TrackOrder),
];

impl OrderIntent {
    pub fn resolve(intent_name: &str) -> Option<Self> {
        INTENT_ROUTES
            .iter()
            .find(|(name, _)| *name == intent_name)
            .map(|(_, intent)| *intent)
    }
}

/// The order-taking transitions, implemented by the server's order agent.
/// Each returns the fulfillment text for the successful path; failures are
/// converted to recovery texts by the dispatcher.
#[async_trait]
pub trait OrderCommandService: Send + Sync {
    async fn start_order(&self, session: &SessionId) -> Result<String, OrderError>;

    async fn add_items(
        &self,
        session: &SessionId,
        items: &[String],
        quantities: &[f64],
    ) -> Result<String, OrderError>;

    async fn remove_items(
        &self,
        session: &SessionId,
        items: &[String],
    ) -> Result<String, OrderError>;

    async fn complete_order(&self, session: &SessionId) -> Result<String, OrderError>;

    async fn track_order(&self, order_id: i64) -> Result<String, OrderError>;
}

/// User-facing text for a failed transition. Every [`OrderError`] maps to
/// a recovery message; nothing propagates past the dispatch boundary.
/// The no-active-order script differs by an article between the remove
/// and complete replies; both agent scripts are kept as written.
pub fn recovery_text(intent: OrderIntent, error: &OrderError) -> String {
    match error {
        OrderError::MismatchedQuantities { .. } => {
            "Sorry I didn't understand. Can you please specify food items and quantities clearly."
                .to_string()
        }
        OrderError::NoActiveOrder(_) if intent == OrderIntent::RemoveItems => {
            "I'm having a trouble finding your order. Sorry! Can you place a new order again?"
                .to_string()
        }
        OrderError::NoActiveOrder(_) => {
            "I'm having trouble finding your order. Sorry! Can you place a new order again?"
                .to_string()
        }
        OrderError::Backend(_) => {
            "Sorry, I couldn't process your order due to a backend error. \
             Please place a new order again."
                .to_string()
        }
    }
}

/// Maps inbound intent events onto the order transitions and shapes the
/// single fulfillment text the NLU platform expects back.
pub struct IntentDispatcher<S> {
    service: S,
}

impl<S> IntentDispatcher<S>
where
    S: OrderCommandService,
{
    pub fn new(service: S) -> Self {
        Self { service }
    }

    pub async fn dispatch(&self, event: &IntentEvent) -> String {
        let Some(intent) = OrderIntent::resolve(&event.intent_name) else {
            warn!(
                event_name = "dialog.intent.unknown",
                intent = %event.intent_name,
                session_id = %event.session_id,
                "no transition registered for intent"
            );
            return format!("Sorry, I don't understand the intent '{}'.", event.intent_name);
        };

        let outcome = match intent {
            OrderIntent::StartOrder => self.service.start_order(&event.session_id).await,
            OrderIntent::AddItems => {
                self.service
                    .add_items(
                        &event.session_id,
                        &event.parameters.food_items,
                        &event.parameters.numbers,
                    )
                    .await
            }
            OrderIntent::RemoveItems => {
                self.service.remove_items(&event.session_id, &event.parameters.food_items).await
            }
            OrderIntent::CompleteOrder => self.service.complete_order(&event.session_id).await,
            OrderIntent::TrackOrder => match event.parameters.numbers.first() {
                Some(number) => self.service.track_order(*number as i64).await,
                None => return "Please provide an order id so I can track it.".to_string(),
            },
        };

        match outcome {
            Ok(text) => text,
            Err(error) => {
                info!(
                    event_name = "dialog.intent.recovered",
                    intent = %event.intent_name,
                    session_id = %event.session_id,
                    error = %error,
                    "transition failed, answering with recovery text"
                );
                recovery_text(intent, &error)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use async_trait::async_trait;

    use tiffin_core::errors::OrderError;
    use tiffin_core::SessionId;

    use crate::event::{IntentEvent, IntentParameters};

    use super::{recovery_text, IntentDispatcher, OrderCommandService, OrderIntent};

    #[derive(Default)]
    struct RecordingService {
        calls: Mutex<Vec<String>>,
        fail_with: Option<OrderError>,
    }

    impl RecordingService {
        fn failing(error: OrderError) -> Self {
            Self { calls: Mutex::default(), fail_with: Some(error) }
        }

        fn record(&self, call: String) -> Result<String, OrderError> {
            self.calls.lock().expect("calls lock").push(call.clone());
            match &self.fail_with {
                Some(error) => Err(error.clone()),
                None => Ok(format!("ok:{call}")),
            }
        }
    }

    #[async_trait]
    impl OrderCommandService for RecordingService {
        async fn start_order(&self, session: &SessionId) -> Result<String, OrderError> {
            self.record(format!("start:{session}"))
        }

        async fn add_items(
            &self,
            session: &SessionId,
            items: &[String],
            quantities: &[f64],
        ) -> Result<String, OrderError> {
            self.record(format!("add:{session}:{}:{}", items.len(), quantities.len()))
        }

        async fn remove_items(
            &self,
            session: &SessionId,
            items: &[String],
        ) -> Result<String, OrderError> {
            self.record(format!("remove:{session}:{}", items.join("+")))
        }

        async fn complete_order(&self, session: &SessionId) -> Result<String, OrderError> {
            self.record(format!("complete:{session}"))
        }

        async fn track_order(&self, order_id: i64) -> Result<String, OrderError> {
            self.record(format!("track:{order_id}"))
        }
    }

    fn event(intent_name: &str, parameters: IntentParameters) -> IntentEvent {
        IntentEvent {
            intent_name: intent_name.to_owned(),
            session_id: SessionId::from("abc123"),
            parameters,
        }
    }

    #[test]
    fn resolution_table_covers_the_known_intents() {
        assert_eq!(OrderIntent::resolve("new.order"), Some(OrderIntent::StartOrder));
        assert_eq!(
            OrderIntent::resolve("order.add - context: ongoing-order"),
            Some(OrderIntent::AddItems)
        );
        assert_eq!(
            OrderIntent::resolve("order.remove - context: ongoing-order"),
            Some(OrderIntent::RemoveItems)
        );
        assert_eq!(
            OrderIntent::resolve("order.complete - context: ongoing-order"),
            Some(OrderIntent::CompleteOrder)
        );
        assert_eq!(
            OrderIntent::resolve("track.order - context: ongoing-tracking"),
            Some(OrderIntent::TrackOrder)
        );
        assert_eq!(OrderIntent::resolve("order.add"), None, "qualifier is part of the name");
    }

    #[tokio::test]
    async fn unknown_intent_answers_with_fallback_and_touches_nothing() {
        let dispatcher = IntentDispatcher::new(RecordingService::default());
        let reply = dispatcher.dispatch(&event("weather.today", IntentParameters::default())).await;

        assert_eq!(reply, "Sorry, I don't understand the intent 'weather.today'.");
        assert!(dispatcher.service.calls.lock().expect("calls lock").is_empty());
    }

    #[tokio::test]
    async fn add_intent_routes_items_and_quantities() {
        let dispatcher = IntentDispatcher::new(RecordingService::default());
        let parameters = IntentParameters {
            food_items: vec!["Pizza".to_owned(), "Samosa".to_owned()],
            numbers: vec![2.0, 1.0],
        };

        let reply =
            dispatcher.dispatch(&event("order.add - context: ongoing-order", parameters)).await;

        assert_eq!(reply, "ok:add:abc123:2:2");
    }

    #[tokio::test]
    async fn transition_errors_become_recovery_texts() {
        let dispatcher = IntentDispatcher::new(RecordingService::failing(
            OrderError::MismatchedQuantities { items: 2, quantities: 1 },
        ));

        let reply = dispatcher
            .dispatch(&event("order.add - context: ongoing-order", IntentParameters::default()))
            .await;

        assert_eq!(
            reply,
            "Sorry I didn't understand. Can you please specify food items and quantities clearly."
        );
    }

    #[tokio::test]
    async fn track_without_an_order_id_prompts_for_one() {
        let dispatcher = IntentDispatcher::new(RecordingService::default());
        let reply = dispatcher
            .dispatch(&event("track.order - context: ongoing-tracking", IntentParameters::default()))
            .await;

        assert_eq!(reply, "Please provide an order id so I can track it.");
        assert!(dispatcher.service.calls.lock().expect("calls lock").is_empty());
    }

    #[tokio::test]
    async fn track_with_an_order_id_reaches_the_service() {
        let dispatcher = IntentDispatcher::new(RecordingService::default());
        let parameters = IntentParameters { food_items: Vec::new(), numbers: vec![41.0] };

        let reply =
            dispatcher.dispatch(&event("track.order - context: ongoing-tracking", parameters)).await;

        assert_eq!(reply, "ok:track:41");
    }

    #[test]
    fn every_order_error_has_a_recovery_text() {
        let errors = [
            OrderError::MismatchedQuantities { items: 1, quantities: 2 },
            OrderError::NoActiveOrder(SessionId::from("abc123")),
            OrderError::Backend("boom".to_owned()),
        ];

        for error in errors {
            assert!(!recovery_text(OrderIntent::CompleteOrder, &error).is_empty());
        }
    }

    #[test]
    fn no_active_order_scripts_differ_between_remove_and_complete() {
        let error = OrderError::NoActiveOrder(SessionId::from("abc123"));

        assert_eq!(
            recovery_text(OrderIntent::RemoveItems, &error),
            "I'm having a trouble finding your order. Sorry! Can you place a new order again?"
        );
        assert_eq!(
            recovery_text(OrderIntent::CompleteOrder, &error),
            "I'm having trouble finding your order. Sorry! Can you place a new order again?"
        );
    }
}
