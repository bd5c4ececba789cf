use crate::provider::GenerationProvider;
use async_trait::async_trait;
use lore_core::LoreResult;
use parking_lot::Mutex;
use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use tokio::sync::mpsc;

/// Deterministic generation provider backed by a queue of canned responses.
///
/// Serves queued responses in order, then falls back to a fixed default.
/// Keeps every pipeline test offline and lets callers assert on provider
/// call counts. Replace with an HTTP backend in production.
pub struct ScriptedGeneration {
    queue: Mutex<VecDeque<String>>,
    default: String,
    calls: AtomicUsize,
}

impl ScriptedGeneration {
    /// Create a provider that always returns `default`.
    pub fn new(default: impl Into<String>) -> Self {
        Self {
            queue: Mutex::new(VecDeque::new()),
            default: default.into(),
            calls: AtomicUsize::new(0),
        }
    }

    /// Queue a one-shot response, served before the default. Chainable.
    pub fn push_response(self, response: impl Into<String>) -> Self {
        self.queue.lock().push_back(response.into());
        self
    }

    /// Queue a one-shot response on a shared provider.
    pub fn enqueue(&self, response: impl Into<String>) {
        self.queue.lock().push_back(response.into());
    }

    /// Number of `invoke`/`stream` calls served so far.
    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    fn next_response(&self) -> String {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.queue
            .lock()
            .pop_front()
            .unwrap_or_else(|| self.default.clone())
    }
}

#[async_trait]
impl GenerationProvider for ScriptedGeneration {
    async fn invoke(&self, _prompt: &str) -> LoreResult<String> {
        Ok(self.next_response())
    }

    async fn stream(&self, _prompt: &str) -> LoreResult<mpsc::Receiver<String>> {
        let full = self.next_response();
        let (tx, rx) = mpsc::channel(8);
        tokio::spawn(async move {
            // Chunk on whitespace to approximate token deltas.
            for word in full.split_inclusive(' ') {
                if tx.send(word.to_string()).await.is_err() {
                    break;
                }
            }
        });
        Ok(rx)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_queued_then_default() {
        let provider = ScriptedGeneration::new("default answer")
            .push_response("first")
            .push_response("second");

        assert_eq!(provider.invoke("p").await.unwrap(), "first");
        assert_eq!(provider.invoke("p").await.unwrap(), "second");
        assert_eq!(provider.invoke("p").await.unwrap(), "default answer");
        assert_eq!(provider.call_count(), 3);
    }

    #[tokio::test]
    async fn test_stream_reassembles_to_full_response() {
        let provider = ScriptedGeneration::new("several words in here");
        let mut rx = provider.stream("p").await.unwrap();
        let mut collected = String::new();
        while let Some(delta) = rx.recv().await {
            collected.push_str(&delta);
        }
        assert_eq!(collected, "several words in here");
        assert_eq!(provider.call_count(), 1);
    }
}
