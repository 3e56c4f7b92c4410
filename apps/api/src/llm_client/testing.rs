//! Scripted `CompletionBackend` for unit tests. Never touches the network.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use tokio::sync::mpsc;

use super::{
    ChatRequest, ChatResponse, Choice, CompletionBackend, CompletionStream, LlmClient, LlmError,
    ResponseMessage,
};

type FailureFn = Box<dyn Fn() -> LlmError + Send + Sync>;

/// Replays canned replies in order (the last one repeats) or fails every call.
/// Counts calls and records every request it receives.
pub struct ScriptedBackend {
    replies: Mutex<VecDeque<String>>,
    failure: Option<FailureFn>,
    calls: AtomicUsize,
    requests: Mutex<Vec<ChatRequest>>,
}

impl ScriptedBackend {
    pub fn replying<I, S>(replies: I) -> Arc<Self>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Arc::new(Self {
            replies: Mutex::new(replies.into_iter().map(Into::into).collect()),
            failure: None,
            calls: AtomicUsize::new(0),
            requests: Mutex::new(Vec::new()),
        })
    }

    pub fn failing(failure: impl Fn() -> LlmError + Send + Sync + 'static) -> Arc<Self> {
        Arc::new(Self {
            replies: Mutex::new(VecDeque::new()),
            failure: Some(Box::new(failure)),
            calls: AtomicUsize::new(0),
            requests: Mutex::new(Vec::new()),
        })
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn last_request(&self) -> Option<ChatRequest> {
        self.requests.lock().unwrap().last().cloned()
    }

    fn record(&self, request: &ChatRequest) -> Result<(), LlmError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.requests.lock().unwrap().push(request.clone());
        match &self.failure {
            Some(failure) => Err(failure()),
            None => Ok(()),
        }
    }

    fn next_reply(&self) -> Option<String> {
        let mut replies = self.replies.lock().unwrap();
        if replies.len() > 1 {
            replies.pop_front()
        } else {
            replies.front().cloned()
        }
    }
}

#[async_trait]
impl CompletionBackend for ScriptedBackend {
    async fn complete(&self, request: &ChatRequest) -> Result<ChatResponse, LlmError> {
        self.record(request)?;
        Ok(ChatResponse {
            choices: self
                .next_reply()
                .map(|content| Choice {
                    message: ResponseMessage {
                        content: Some(content),
                    },
                })
                .into_iter()
                .collect(),
            usage: None,
        })
    }

    async fn stream(&self, request: &ChatRequest) -> Result<CompletionStream, LlmError> {
        self.record(request)?;
        let chunks: Vec<String> = self.replies.lock().unwrap().drain(..).collect();
        let (tx, rx) = mpsc::channel(chunks.len().max(1));
        for chunk in chunks {
            let _ = tx.try_send(Ok(chunk));
        }
        Ok(CompletionStream::from_channel(rx))
    }
}

/// Shorthand for a client over a scripted backend.
pub fn client(backend: &Arc<ScriptedBackend>) -> LlmClient {
    LlmClient::new(backend.clone())
}
