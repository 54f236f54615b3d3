//! Relay of the Home worker's live event feed into a session channel.

use std::time::Duration;

use futures_util::StreamExt;
use gpurouter_core::{BackendError, FrameStream, StreamEvent};
use serde_json::{Map, Value};
use thiserror::Error;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

/// Longest frame prefix echoed into logs.
const LOG_FRAME_LIMIT: usize = 200;

/// Why a relay ended without a final sequence.
///
/// Every variant records how many events already reached the session, which
/// decides whether the router may still fall back to the queue.
#[derive(Debug, Error)]
pub enum RelayError {
    #[error("Event stream ended without a final sequence")]
    MissingFinal { relayed: usize },

    #[error("Event stream stalled: no frame for {idle:?}")]
    Stalled { idle: Duration, relayed: usize },

    #[error("Event stream failed: {source}")]
    Transport {
        #[source]
        source: BackendError,
        relayed: usize,
    },

    #[error("Session went away")]
    SinkClosed { relayed: usize },

    #[error("Stream cancelled")]
    Cancelled { relayed: usize },
}

impl RelayError {
    /// Events delivered to the session before the relay stopped.
    #[must_use]
    pub const fn relayed(&self) -> usize {
        match self {
            Self::MissingFinal { relayed }
            | Self::Stalled { relayed, .. }
            | Self::Transport { relayed, .. }
            | Self::SinkClosed { relayed }
            | Self::Cancelled { relayed } => *relayed,
        }
    }

    /// Whether the Home worker is to blame (as opposed to the session).
    #[must_use]
    pub const fn is_home_failure(&self) -> bool {
        !matches!(self, Self::SinkClosed { .. } | Self::Cancelled { .. })
    }
}

/// Forwards decoded frames to one session, in order, one at a time.
#[derive(Debug, Clone, Copy)]
pub struct StreamRelay {
    idle_timeout: Duration,
}

impl StreamRelay {
    pub const fn new(idle_timeout: Duration) -> Self {
        Self { idle_timeout }
    }

    /// Relay `feed` into `sink` until the first final sequence.
    ///
    /// Frames that fail to decode are logged and skipped. The final event is
    /// forwarded like any other and its payload returned untouched. Each
    /// `send` waits for channel capacity, so a slow session slows the relay
    /// instead of growing a buffer.
    pub async fn relay(
        &self,
        mut feed: FrameStream,
        sink: &mpsc::Sender<StreamEvent>,
        cancel: &CancellationToken,
    ) -> Result<Map<String, Value>, RelayError> {
        let mut relayed = 0usize;

        loop {
            let next = tokio::select! {
                () = cancel.cancelled() => return Err(RelayError::Cancelled { relayed }),
                next = tokio::time::timeout(self.idle_timeout, feed.next()) => next,
            };

            let frame = match next {
                Err(_) => {
                    return Err(RelayError::Stalled {
                        idle: self.idle_timeout,
                        relayed,
                    });
                }
                Ok(None) => return Err(RelayError::MissingFinal { relayed }),
                Ok(Some(Err(source))) => return Err(RelayError::Transport { source, relayed }),
                Ok(Some(Ok(frame))) => frame,
            };

            let event = match StreamEvent::from_frame(&frame) {
                Ok(event) => event,
                Err(e) => {
                    warn!(error = %e, frame = %truncate(&frame), "Skipping malformed stream frame");
                    continue;
                }
            };

            let final_payload = match &event {
                StreamEvent::FinalSequence { payload } => Some(payload.clone()),
                _ => None,
            };

            tokio::select! {
                () = cancel.cancelled() => return Err(RelayError::Cancelled { relayed }),
                sent = sink.send(event) => {
                    if sent.is_err() {
                        return Err(RelayError::SinkClosed { relayed });
                    }
                }
            }
            relayed += 1;

            if let Some(payload) = final_payload {
                debug!(relayed, "Event stream completed");
                return Ok(payload);
            }
        }
    }
}

fn truncate(frame: &str) -> &str {
    match frame.char_indices().nth(LOG_FRAME_LIMIT) {
        Some((idx, _)) => &frame[..idx],
        None => frame,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures_util::stream;
    use serde_json::json;

    fn silent() -> FrameStream {
        Box::pin(stream::pending::<Result<String, BackendError>>())
    }

    fn feed(frames: Vec<Result<&'static str, BackendError>>) -> FrameStream {
        Box::pin(stream::iter(
            frames.into_iter().map(|f| f.map(str::to_string)),
        ))
    }

    async fn drain(mut rx: mpsc::Receiver<StreamEvent>) -> Vec<StreamEvent> {
        let mut out = Vec::new();
        while let Some(event) = rx.recv().await {
            out.push(event);
        }
        out
    }

    #[tokio::test]
    async fn test_relays_in_order_and_returns_final_payload() {
        let (tx, rx) = mpsc::channel(8);
        let relay = StreamRelay::new(Duration::from_secs(5));
        let result = relay
            .relay(
                feed(vec![
                    Ok(r#"{"type":"new_line","start":0,"end":5}"#),
                    Ok("garbage"),
                    Ok(r#"{"type":"progress","current":1,"total":2,"percent":50.0}"#),
                    Ok(r#"{"type":"final_sequence","sequence":[0,5],"score":0.91}"#),
                    Ok(r#"{"type":"new_line","start":5,"end":9}"#),
                ]),
                &tx,
                &CancellationToken::new(),
            )
            .await
            .unwrap();
        drop(tx);

        assert_eq!(result["sequence"], json!([0, 5]));
        assert_eq!(result["score"], json!(0.91));
        assert!(!result.contains_key("type"));

        let events = drain(rx).await;
        let kinds: Vec<_> = events.iter().map(StreamEvent::kind).collect();
        assert_eq!(kinds, vec!["new_line", "progress", "final_sequence"]);
    }

    #[tokio::test]
    async fn test_missing_final_reports_relayed_count() {
        let (tx, _rx) = mpsc::channel(8);
        let err = StreamRelay::new(Duration::from_secs(5))
            .relay(
                feed(vec![Ok(r#"{"type":"new_line","start":0,"end":5}"#)]),
                &tx,
                &CancellationToken::new(),
            )
            .await
            .unwrap_err();

        assert!(matches!(err, RelayError::MissingFinal { relayed: 1 }));
        assert!(err.is_home_failure());
    }

    #[tokio::test]
    async fn test_transport_error_before_any_event() {
        let (tx, _rx) = mpsc::channel(8);
        let err = StreamRelay::new(Duration::from_secs(5))
            .relay(
                feed(vec![Err(BackendError::Transport("reset".to_string()))]),
                &tx,
                &CancellationToken::new(),
            )
            .await
            .unwrap_err();

        assert_eq!(err.relayed(), 0);
        assert!(matches!(err, RelayError::Transport { .. }));
    }

    #[tokio::test(start_paused = true)]
    async fn test_idle_feed_stalls() {
        let (tx, _rx) = mpsc::channel(8);
        let err = StreamRelay::new(Duration::from_secs(120))
            .relay(silent(), &tx, &CancellationToken::new())
            .await
            .unwrap_err();

        assert!(matches!(err, RelayError::Stalled { relayed: 0, .. }));
    }

    #[tokio::test]
    async fn test_closed_sink_is_not_a_home_failure() {
        let (tx, rx) = mpsc::channel(1);
        drop(rx);
        let err = StreamRelay::new(Duration::from_secs(5))
            .relay(
                feed(vec![Ok(r#"{"type":"error","message":"hot"}"#)]),
                &tx,
                &CancellationToken::new(),
            )
            .await
            .unwrap_err();

        assert!(matches!(err, RelayError::SinkClosed { relayed: 0 }));
        assert!(!err.is_home_failure());
    }

    #[tokio::test]
    async fn test_cancelled_relay() {
        let (tx, _rx) = mpsc::channel(1);
        let token = CancellationToken::new();
        token.cancel();
        let err = StreamRelay::new(Duration::from_secs(5))
            .relay(silent(), &tx, &token)
            .await
            .unwrap_err();

        assert!(matches!(err, RelayError::Cancelled { .. }));
    }

    #[test]
    fn test_truncate_respects_char_boundaries() {
        let long = "é".repeat(300);
        assert_eq!(truncate(&long).chars().count(), LOG_FRAME_LIMIT);
        assert_eq!(truncate("short"), "short");
    }
}
