use std::convert::Infallible;
use axum::{
    extract::State,
    response::sse::{Event, KeepAlive, Sse},
};
use futures::stream::{self, Stream};
use tokio::sync::broadcast::error::RecvError;
use crate::api::AppState;
use tracing::warn;

/// Server-sent stream of every core event, named by its event tag.
pub async fn stream_events(
    State(state): State<AppState>,
) -> Sse<impl Stream<Item = Result<Event, Infallible>>> {
    let rx = state.center.subscribe();

    let events = stream::unfold(rx, |mut rx| async move {
        let sse = match rx.recv().await {
            Ok(event) => Event::default()
                .event(event.name())
                .json_data(&event)
                .unwrap_or_else(|_| Event::default().comment("unserializable event")),
            Err(RecvError::Lagged(skipped)) => {
                warn!(skipped, "Event stream subscriber lagged");
                Event::default().comment(format!("lagged {}", skipped))
            }
            Err(RecvError::Closed) => return None,
        };
        Some((Ok(sse), rx))
    });

    Sse::new(events).keep_alive(KeepAlive::default())
}
