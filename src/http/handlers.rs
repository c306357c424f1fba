//! Request handlers.

use axum::{extract::State, Extension};
use opentelemetry::baggage::BaggageExt;
use opentelemetry::trace::TraceContextExt;
use opentelemetry::{Context, KeyValue};

use crate::dice;
use crate::http::server::AppState;
use crate::observability::metrics::ROLL_VALUE;

/// Baggage member whose value is attached to the roll event.
const USERNAME: &str = "username";

/// `GET /rolldice`: roll once and return the value followed by a newline.
pub async fn roll_dice(
    State(state): State<AppState>,
    Extension(cx): Extension<Context>,
) -> String {
    let span = cx.span();
    let username = cx
        .baggage()
        .get(USERNAME)
        .map(|v| v.as_str().to_owned())
        .unwrap_or_default();
    span.add_event(
        "handling this...",
        vec![KeyValue::new(USERNAME, username)],
    );

    let roll = dice::roll(&mut rand::thread_rng());

    span.set_attribute(KeyValue::new(ROLL_VALUE, i64::from(roll)));
    state.metrics.record_roll(roll);

    tracing::debug!(roll, "Rolled");
    format!("{roll}\n")
}

/// `GET /liveness`.
pub async fn liveness() -> &'static str {
    "OK"
}
