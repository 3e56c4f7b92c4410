use std::pin::Pin;
use std::task::{Context, Poll};

use bytes::Bytes;
use futures::{Stream, StreamExt};
use serde::Deserialize;
use tokio::sync::mpsc;
use tracing::debug;

use super::LlmError;

// ─── CompletionStream ─────────────────────────────────────────────────────

/// An async stream of text deltas from a streaming completion.
///
/// Backed by a Tokio mpsc channel. A background task owns the HTTP body and
/// forwards deltas until `[DONE]`, end of body or an error. Dropping
/// `CompletionStream` closes the receiver; the task observes the closure even
/// while waiting on the network, exits and drops the body, which releases the
/// connection.
pub struct CompletionStream {
    rx: mpsc::Receiver<Result<String, LlmError>>,
}

impl CompletionStream {
    pub(crate) fn from_response(response: reqwest::Response) -> Self {
        Self::from_byte_stream(response.bytes_stream())
    }

    pub(crate) fn from_byte_stream<S>(body: S) -> Self
    where
        S: Stream<Item = Result<Bytes, reqwest::Error>> + Send + 'static,
    {
        let (tx, rx) = mpsc::channel(32);

        tokio::spawn(async move {
            tokio::pin!(body);
            let mut decoder = SseDecoder::default();

            loop {
                let next = tokio::select! {
                    _ = tx.closed() => {
                        debug!("Completion stream dropped by consumer");
                        return;
                    }
                    next = body.next() => next,
                };

                let (events, ended) = match next {
                    None => (decoder.finish(), true),
                    Some(Err(e)) => {
                        let _ = tx.send(Err(LlmError::Http(e))).await;
                        return;
                    }
                    Some(Ok(chunk)) => (decoder.push(&chunk), false),
                };

                for event in events {
                    let item = match event {
                        SseEvent::Done => return,
                        SseEvent::Delta(text) => Ok(text),
                        SseEvent::Malformed(e) => Err(LlmError::InvalidJson(e)),
                    };
                    let is_err = item.is_err();
                    if tx.send(item).await.is_err() || is_err {
                        return;
                    }
                }
                if ended {
                    return;
                }
            }
        });

        Self { rx }
    }

    /// Test-only constructor: wrap a raw mpsc receiver as a `CompletionStream`.
    #[cfg(test)]
    pub(crate) fn from_channel(rx: mpsc::Receiver<Result<String, LlmError>>) -> Self {
        Self { rx }
    }
}

impl Stream for CompletionStream {
    type Item = Result<String, LlmError>;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        self.rx.poll_recv(cx)
    }
}

// ─── SSE decoding ─────────────────────────────────────────────────────────

#[derive(Debug)]
enum SseEvent {
    Delta(String),
    Done,
    Malformed(serde_json::Error),
}

#[derive(Debug, Deserialize)]
struct StreamChunk {
    #[serde(default)]
    choices: Vec<StreamChoice>,
}

#[derive(Debug, Deserialize)]
struct StreamChoice {
    #[serde(default)]
    delta: StreamDelta,
}

#[derive(Debug, Default, Deserialize)]
struct StreamDelta {
    #[serde(default)]
    content: Option<String>,
}

/// Splits a server-sent-event byte stream into `data:` payloads.
/// Network chunks may cut lines (and UTF-8 sequences) anywhere.
#[derive(Debug, Default)]
struct SseDecoder {
    buf: Vec<u8>,
}

impl SseDecoder {
    fn push(&mut self, chunk: &[u8]) -> Vec<SseEvent> {
        self.buf.extend_from_slice(chunk);
        let mut events = Vec::new();

        while let Some(pos) = self.buf.iter().position(|&b| b == b'\n') {
            let line: Vec<u8> = self.buf.drain(..=pos).collect();
            let line = String::from_utf8_lossy(&line);
            let line = line.trim_end_matches(['\n', '\r']);

            let Some(payload) = line.strip_prefix("data:") else {
                continue;
            };
            let payload = payload.trim();
            if payload.is_empty() {
                continue;
            }
            if payload == "[DONE]" {
                events.push(SseEvent::Done);
                break;
            }

            match serde_json::from_str::<StreamChunk>(payload) {
                Ok(chunk) => {
                    let text: String = chunk
                        .choices
                        .into_iter()
                        .filter_map(|c| c.delta.content)
                        .collect();
                    if !text.is_empty() {
                        events.push(SseEvent::Delta(text));
                    }
                }
                Err(e) => events.push(SseEvent::Malformed(e)),
            }
        }

        events
    }

    /// Decodes a final line the body ended without terminating.
    fn finish(&mut self) -> Vec<SseEvent> {
        if self.buf.is_empty() {
            return Vec::new();
        }
        self.push(b"\n")
    }
}

// ─── Tests ────────────────────────────────────────────────────────────────
