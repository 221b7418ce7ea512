use serde_json::Value;

use tiffin_core::errors::EventError;
use tiffin_core::SessionId;

/// One structured intent event as the NLU platform delivers it, already
/// stripped down to what the order transitions consume.
#[derive(Clone, Debug, PartialEq)]
pub struct IntentEvent {
    pub intent_name: String,
    pub session_id: SessionId,
    pub parameters: IntentParameters,
}

/// Parameters of an intent event. `food-item` is always a sequence of
/// names; `number` may arrive as a scalar, a sequence, or floating text
/// (`"2.0"`), all of which normalize into `numbers`.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct IntentParameters {
    pub food_items: Vec<String>,
    pub numbers: Vec<f64>,
}

impl IntentParameters {
    pub fn from_value(parameters: &Value) -> Self {
        Self {
            food_items: parameters.get("food-item").map(collect_strings).unwrap_or_default(),
            numbers: parameters.get("number").map(collect_numbers).unwrap_or_default(),
        }
    }
}

impl IntentEvent {
    /// Builds an event from the raw webhook pieces. The session id comes
    /// from the context at index 0; an event with zero contexts is a
    /// structural failure, never a silent default.
    pub fn from_parts(
        intent_name: String,
        parameters: &Value,
        context_names: &[String],
    ) -> Result<Self, EventError> {
        let first_context = context_names.first().ok_or(EventError::MissingContext)?;
        let session_id = extract_session_id(first_context)?;

        Ok(Self { intent_name, session_id, parameters: IntentParameters::from_value(parameters) })
    }
}

/// Pulls the session id out of a conversation-context identifier of the
/// form `.../sessions/<id>/contexts/<context>`.
pub fn extract_session_id(context_name: &str) -> Result<SessionId, EventError> {
    let tail = context_name
        .split_once("/sessions/")
        .map(|(_, tail)| tail)
        .ok_or_else(|| EventError::MalformedContext(context_name.to_owned()))?;

    let session_id = tail.split('/').next().unwrap_or_default();
    if session_id.is_empty() {
        return Err(EventError::MalformedContext(context_name.to_owned()));
    }

    Ok(SessionId::from(session_id))
}

fn collect_strings(value: &Value) -> Vec<String> {
    match value {
        Value::Array(values) => {
            values.iter().filter_map(Value::as_str).map(str::to_owned).collect()
        }
        Value::String(single) => vec![single.clone()],
        _ => Vec::new(),
    }
}

fn collect_numbers(value: &Value) -> Vec<f64> {
    match value {
        Value::Array(values) => values.iter().filter_map(value_to_f64).collect(),
        single => value_to_f64(single).into_iter().collect(),
    }
}

fn value_to_f64(value: &Value) -> Option<f64> {
    match value {
        Value::Number(number) => number.as_f64(),
        Value::String(text) => text.trim().parse::<f64>().ok(),
        _ => None,
    }
}
