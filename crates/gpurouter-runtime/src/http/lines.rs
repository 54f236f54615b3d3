//! JSON-lines framing for the Home event feed.
//!
//! The worker writes one JSON document per line. Some deployments sit behind
//! an SSE-speaking proxy, so `data:` prefixes and `:` comment lines are
//! tolerated and stripped here; everything else is passed through untouched.

use bytes::{Bytes, BytesMut};
use futures_util::StreamExt;
use futures_util::stream::BoxStream;
use gpurouter_core::{BackendError, FrameStream};
use tracing::warn;

/// Longest line accepted from the worker before the feed is abandoned.
pub const MAX_FRAME_BYTES: usize = 8 * 1024 * 1024;

/// State threaded through the `unfold` stream.
struct FrameState {
    stream: BoxStream<'static, Result<Bytes, BackendError>>,
    buf: BytesMut,
    done: bool,
}

/// Split a byte stream into frames, one per non-empty line.
///
/// A trailing line without a newline is still emitted when the upstream
/// ends. An upstream error is yielded once and ends the feed, as does a line
/// longer than [`MAX_FRAME_BYTES`].
pub fn frames<S, E>(byte_stream: S) -> FrameStream
where
    S: futures_core::Stream<Item = Result<Bytes, E>> + Send + 'static,
    E: std::fmt::Display + Send + 'static,
{
    let state = FrameState {
        stream: byte_stream
            .map(|chunk| chunk.map_err(|e| BackendError::Transport(e.to_string())))
            .boxed(),
        buf: BytesMut::new(),
        done: false,
    };

    Box::pin(futures_util::stream::unfold(state, |mut st| async move {
        loop {
            if let Some(line_end) = find_newline(&st.buf) {
                let line = st.buf.split_to(line_end);
                if let Some(frame) = frame_payload(&line) {
                    return Some((Ok(frame), st));
                }
                continue;
            }

            if st.buf.len() > MAX_FRAME_BYTES {
                warn!(buffered = st.buf.len(), "Home feed line exceeds frame limit");
                st.done = true;
                st.buf.clear();
                return Some((
                    Err(BackendError::Decode(format!(
                        "line exceeds {MAX_FRAME_BYTES} bytes without a newline"
                    ))),
                    st,
                ));
            }

            if st.done {
                if st.buf.is_empty() {
                    return None;
                }
                let rest = st.buf.split();
                return frame_payload(&rest).map(|frame| (Ok(frame), st));
            }

            match st.stream.next().await {
                Some(Ok(chunk)) => st.buf.extend_from_slice(&chunk),
                Some(Err(e)) => {
                    st.done = true;
                    st.buf.clear();
                    return Some((Err(e), st));
                }
                None => st.done = true,
            }
        }
    }))
}

/// Extract the JSON document from one raw line, if it carries one.
fn frame_payload(line: &[u8]) -> Option<String> {
    let text = String::from_utf8_lossy(line);
    let trimmed = text.trim();

    if trimmed.is_empty() || trimmed.starts_with(':') {
        return None;
    }

    let data = match trimmed.strip_prefix("data:") {
        Some(rest) => rest.trim(),
        None if is_sse_field(trimmed) => return None,
        None => trimmed,
    };

    if data.is_empty() || data == "[DONE]" {
        return None;
    }
    Some(data.to_string())
}

fn is_sse_field(line: &str) -> bool {
    ["event:", "id:", "retry:"]
        .iter()
        .any(|prefix| line.starts_with(prefix))
}

/// Find the next newline in the buffer, returning the position after it.
fn find_newline(buf: &BytesMut) -> Option<usize> {
    buf.iter().position(|&b| b == b'\n').map(|pos| pos + 1)
}
