use async_trait::async_trait;
use lore_core::{LoreError, LoreResult};
use std::collections::HashMap;

/// Trait for computing text embeddings.
#[async_trait]
pub trait EmbeddingProvider: Send + Sync {
    /// Embed a single query string.
    async fn embed_query(&self, text: &str) -> LoreResult<Vec<f32>>;

    /// Embed a batch of documents. The default implementation embeds
    /// sequentially; batching backends override this.
    async fn embed_documents(&self, texts: &[String]) -> LoreResult<Vec<Vec<f32>>> {
        let mut results = Vec::with_capacity(texts.len());
        for text in texts {
            results.push(self.embed_query(text).await?);
        }
        Ok(results)
    }

    /// Dimension of the vectors this provider produces.
    fn dimension(&self) -> usize;
}

/// Deterministic local embedding: signed feature hashing over a TF-weighted
/// bag of words, L2-normalized.
///
/// No external API needed, which keeps retrieval tests offline and
/// reproducible. Swap in an HTTP embedding backend for production-quality
/// semantics.
pub struct HashedEmbedding {
    dimension: usize,
}

impl HashedEmbedding {
    /// Create an embedder with the given output dimension.
    pub fn new(dimension: usize) -> Self {
        Self { dimension }
    }
}

impl Default for HashedEmbedding {
    fn default() -> Self {
        Self::new(384)
    }
}

#[async_trait]
impl EmbeddingProvider for HashedEmbedding {
    async fn embed_query(&self, text: &str) -> LoreResult<Vec<f32>> {
        if text.trim().is_empty() {
            return Err(LoreError::Provider("cannot embed empty text".to_string()));
        }

        let mut vector = vec![0.0f32; self.dimension];

        let tokens = lore_core::text::token_set(text);
        let lowered = text.to_lowercase();
        let words: Vec<&str> = lowered
            .split(|c: char| !c.is_alphanumeric())
            .filter(|w| w.len() > 1)
            .collect();
        let total = words.len() as f32;
        if total == 0.0 {
            return Ok(vector);
        }

        let mut freq: HashMap<&str, f32> = HashMap::new();
        for word in &words {
            *freq.entry(word).or_insert(0.0) += 1.0;
        }

        for (word, count) in &freq {
            let tf = count / total;
            let bucket = fnv1a(word.as_bytes());
            // Second hash decides the sign, which halves collision bias.
            let sign = if fnv1a(&[word.as_bytes(), b"#"].concat()) & 1 == 0 {
                1.0
            } else {
                -1.0
            };
            vector[(bucket as usize) % self.dimension] += sign * tf;

            // A coarse bigram-of-set feature nudges related vocabularies
            // closer without a trained model.
            if tokens.len() > 1 {
                let alt = fnv1a(&[b"pair:", word.as_bytes()].concat());
                vector[(alt as usize) % self.dimension] += sign * tf * 0.5;
            }
        }

        let norm: f32 = vector.iter().map(|x| x * x).sum::<f32>().sqrt();
        if norm > 0.0 {
            for v in &mut vector {
                *v /= norm;
            }
        }

        Ok(vector)
    }

    fn dimension(&self) -> usize {
        self.dimension
    }
}

/// FNV-1a 64-bit hash.
fn fnv1a(data: &[u8]) -> u64 {
    let mut hash: u64 = 0xcbf2_9ce4_8422_2325;
    for &byte in data {
        hash ^= u64::from(byte);
        hash = hash.wrapping_mul(0x0000_0100_0000_01b3);
    }
    hash
}

/// OpenAI-compatible HTTP embedding backend (`POST /v1/embeddings`).
#[cfg(feature = "http-embeddings")]
pub mod http {
    use super::EmbeddingProvider;
    use async_trait::async_trait;
    use lore_core::{LoreError, LoreResult};
    use serde::{Deserialize, Serialize};

    /// Configuration for [`HttpEmbedding`].
    #[derive(Debug, Clone, Serialize, Deserialize)]
    pub struct EmbeddingConfig {
        /// Model identifier sent in the request body.
        pub model_id: String,
        /// Bearer token.
        pub api_key: String,
        /// Base URL override; defaults to the OpenAI endpoint.
        pub api_base_url: Option<String>,
        /// Declared output dimension.
        pub dimension: usize,
    }

    impl EmbeddingConfig {
        /// Effective base URL for this backend.
        pub fn base_url(&self) -> &str {
            self.api_base_url
                .as_deref()
                .unwrap_or("https://api.openai.com")
        }
    }

    /// HTTP embedding backend for OpenAI-compatible providers.
    pub struct HttpEmbedding {
        config: EmbeddingConfig,
        http: reqwest::Client,
    }

    impl HttpEmbedding {
        /// Create a backend with a fresh HTTP client.
        pub fn new(config: EmbeddingConfig) -> Self {
            Self {
                config,
                http: reqwest::Client::new(),
            }
        }

        async fn embed_inputs(&self, inputs: &[&str]) -> LoreResult<Vec<Vec<f32>>> {
            let url = format!("{}/v1/embeddings", self.config.base_url());
            let body = serde_json::json!({
                "model": self.config.model_id,
                "input": inputs,
            });

            let resp = self
                .http
                .post(&url)
                .header("Authorization", format!("Bearer {}", self.config.api_key))
                .header("Content-Type", "application/json")
                .json(&body)
                .send()
                .await
                .map_err(|e| LoreError::Provider(e.to_string()))?;

            let status = resp.status();
            let resp_body: serde_json::Value = resp
                .json()
                .await
                .map_err(|e| LoreError::Provider(e.to_string()))?;

            if !status.is_success() {
                return Err(LoreError::Provider(format!(
                    "embedding API error {status}: {resp_body}"
                )));
            }

            let data = resp_body["data"].as_array().ok_or_else(|| {
                LoreError::Provider(format!("malformed embedding response: {resp_body}"))
            })?;

            let mut vectors = Vec::with_capacity(data.len());
            for item in data {
                let values = item["embedding"].as_array().ok_or_else(|| {
                    LoreError::Provider("embedding item missing vector".to_string())
                })?;
                let vector: Vec<f32> = values
                    .iter()
                    .filter_map(|v| v.as_f64().map(|f| f as f32))
                    .collect();
                vectors.push(vector);
            }
            Ok(vectors)
        }
    }

    #[async_trait]
    impl EmbeddingProvider for HttpEmbedding {
        async fn embed_query(&self, text: &str) -> LoreResult<Vec<f32>> {
            let mut vectors = self.embed_inputs(&[text]).await?;
            vectors
                .pop()
                .ok_or_else(|| LoreError::Provider("empty embedding response".to_string()))
        }

        async fn embed_documents(&self, texts: &[String]) -> LoreResult<Vec<Vec<f32>>> {
            if texts.is_empty() {
                return Ok(Vec::new());
            }
            let inputs: Vec<&str> = texts.iter().map(String::as_str).collect();
            self.embed_inputs(&inputs).await
        }

        fn dimension(&self) -> usize {
            self.config.dimension
        }
    }
}
