use std::sync::Arc;

use axum::{extract::State, http::StatusCode, routing::post, Json, Router};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{info, warn};

use tiffin_core::EventError;
use tiffin_dialog::{IntentDispatcher, IntentEvent, OrderCommandService};

/// Inbound webhook payload as the NLU platform posts it. Every field is
/// defaulted so a sparse payload still deserializes; the required pieces
/// are validated when the intent event is assembled.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct WebhookRequest {
    pub query_result: QueryResult,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct QueryResult {
    pub intent: Intent,
    pub parameters: Value,
    pub output_contexts: Vec<OutputContext>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Intent {
    pub display_name: String,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct OutputContext {
    pub name: String,
}

#[derive(Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WebhookResponse {
    pub fulfillment_text: String,
}

#[derive(Debug, PartialEq, Eq, Serialize)]
pub struct WebhookRejection {
    pub error: String,
}

pub struct WebhookState<S> {
    pub dispatcher: Arc<IntentDispatcher<S>>,
}

impl<S> Clone for WebhookState<S> {
    fn clone(&self) -> Self {
        Self { dispatcher: self.dispatcher.clone() }
    }
}

pub fn router<S>(dispatcher: Arc<IntentDispatcher<S>>) -> Router
where
    S: OrderCommandService + 'static,
{
    Router::new().route("/", post(handle::<S>)).with_state(WebhookState { dispatcher })
}

/// Single fulfillment endpoint. A payload that cannot be tied to a
/// session is rejected with 400; everything else, unknown intents
/// included, answers 200 with a fulfillment text.
pub async fn handle<S>(
    State(state): State<WebhookState<S>>,
    Json(request): Json<WebhookRequest>,
) -> Result<Json<WebhookResponse>, (StatusCode, Json<WebhookRejection>)>
where
    S: OrderCommandService,
{
    let context_names: Vec<String> = request
        .query_result
        .output_contexts
        .iter()
        .map(|context| context.name.clone())
        .collect();

    let event = IntentEvent::from_parts(
        request.query_result.intent.display_name,
        &request.query_result.parameters,
        &context_names,
    )
    .map_err(reject)?;

    info!(
        event_name = "webhook.request.received",
        intent = %event.intent_name,
        session_id = %event.session_id,
        "fulfillment request accepted"
    );

    let fulfillment_text = state.dispatcher.dispatch(&event).await;
    Ok(Json(WebhookResponse { fulfillment_text }))
}

fn reject(error: EventError) -> (StatusCode, Json<WebhookRejection>) {
    warn!(
        event_name = "webhook.request.rejected",
        error = %error,
        "fulfillment request could not be tied to a session"
    );
    (StatusCode::BAD_REQUEST, Json(WebhookRejection { error: error.to_string() }))
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use axum::body::Body;
    use axum::http::{header, Request, StatusCode};
    use serde_json::{json, Value};
    use tower::util::ServiceExt;

    use tiffin_db::InMemoryOrderStore;
    use tiffin_dialog::IntentDispatcher;

    use crate::agent::OrderAgent;

    use super::router;

    fn app() -> axum::Router {
        let store = Arc::new(InMemoryOrderStore::new());
        router(Arc::new(IntentDispatcher::new(OrderAgent::new(store))))
    }

    fn payload(intent: &str, parameters: Value, contexts: Vec<&str>) -> Value {
        json!({
            "queryResult": {
                "intent": { "displayName": intent },
                "parameters": parameters,
                "outputContexts": contexts
                    .into_iter()
                    .map(|name| json!({ "name": name }))
                    .collect::<Vec<_>>(),
            }
        })
    }

    async fn post(app: axum::Router, body: Value) -> (StatusCode, Value) {
        let response = app
            .oneshot(
                Request::builder()
                    .method("POST")
                    .uri("/")
                    .header(header::CONTENT_TYPE, "application/json")
                    .body(Body::from(body.to_string()))
                    .expect("request"),
            )
            .await
            .expect("response");

        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.expect("body");
        (status, serde_json::from_slice(&bytes).expect("json body"))
    }

    const CONTEXT: &str = "projects/eatery/agent/sessions/abc123/contexts/ongoing-order";

    #[tokio::test]
    async fn new_order_answers_with_the_menu() {
        let (status, body) =
            post(app(), payload("new.order", json!({}), vec![CONTEXT])).await;

        assert_eq!(status, StatusCode::OK);
        let text = body["fulfillmentText"].as_str().expect("text");
        assert!(text.starts_with("Ok, starting a new order."));
        assert!(text.contains("Pav Bhaji"));
    }

    #[tokio::test]
    async fn add_then_complete_round_trips_through_the_endpoint() {
        let app = app();

        let body = payload(
            "order.add - context: ongoing-order",
            json!({ "food-item": ["Pizza", "Samosa"], "number": [2.0, 3.0] }),
            vec![CONTEXT],
        );
        let (status, reply) = post(app.clone(), body).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(
            reply["fulfillmentText"],
            "So far you have: 2 Pizza, 3 Samosa. Do you need anything else?"
        );

        let body = payload("order.complete - context: ongoing-order", json!({}), vec![CONTEXT]);
        let (status, reply) = post(app, body).await;
        assert_eq!(status, StatusCode::OK);
        let text = reply["fulfillmentText"].as_str().expect("text");
        assert!(text.contains("Here is your order ID: 1."));
        assert!(text.contains("20.00"), "2 * 8.50 + 3 * 1.00, got: {text}");
    }

    #[tokio::test]
    async fn payload_without_contexts_is_a_bad_request() {
        let (status, body) = post(app(), payload("new.order", json!({}), vec![])).await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(body["error"].as_str().expect("error").contains("output context"));
    }

    #[tokio::test]
    async fn malformed_context_name_is_a_bad_request() {
        let (status, _body) =
            post(app(), payload("new.order", json!({}), vec!["not-a-context-path"])).await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn unknown_intent_still_answers_ok_with_fallback_text() {
        let (status, body) =
            post(app(), payload("weather.today", json!({}), vec![CONTEXT])).await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(
            body["fulfillmentText"],
            "Sorry, I don't understand the intent 'weather.today'."
        );
    }
}
