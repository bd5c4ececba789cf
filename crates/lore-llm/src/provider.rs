use async_trait::async_trait;
use lore_core::LoreResult;
use tokio::sync::mpsc;

/// Trait for text generation backends.
///
/// Implementations must map transport failures to
/// [`lore_core::LoreError::Provider`]; timeouts and retries are the
/// caller's concern, not the provider's.
#[async_trait]
pub trait GenerationProvider: Send + Sync {
    /// Generate a complete response for the prompt.
    async fn invoke(&self, prompt: &str) -> LoreResult<String>;

    /// Generate a response as a sequence of text deltas.
    ///
    /// The default implementation performs a full [`invoke`] and delivers
    /// the result as a single delta; backends with native streaming
    /// override this.
    ///
    /// [`invoke`]: GenerationProvider::invoke
    async fn stream(&self, prompt: &str) -> LoreResult<mpsc::Receiver<String>> {
        let full = self.invoke(prompt).await?;
        let (tx, rx) = mpsc::channel(1);
        // Receiver may already be dropped; that is not an error.
        let _ = tx.send(full).await;
        Ok(rx)
    }
}
